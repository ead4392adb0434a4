pub mod handlers;
pub mod jobs;
pub mod middleware;
pub mod platforms;
pub mod routes;
pub mod scheduler;
pub mod ws;

pub use routes::create_router;
