//! Result of cancellable work.

use serde::Serialize;

/// How a cancellable operation ended when it did not fail.
///
/// Cancellation is an expected ending, not an error, so it lives here rather
/// than in the error enums of the fetcher and transcoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum Outcome<T> {
    /// The operation ran to completion.
    Finished(T),
    /// The operation observed its cancellation token and stopped early.
    Cancelled,
}

impl<T> Outcome<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns the finished value, if any.
    pub fn finished(self) -> Option<T> {
        match self {
            Self::Finished(value) => Some(value),
            Self::Cancelled => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Finished(value) => Outcome::Finished(f(value)),
            Self::Cancelled => Outcome::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_helpers() {
        let done: Outcome<u32> = Outcome::Finished(2);
        assert!(!done.is_cancelled());
        assert_eq!(done.clone().map(|v| v * 2), Outcome::Finished(4));
        assert_eq!(done.finished(), Some(2));

        let cancelled: Outcome<u32> = Outcome::Cancelled;
        assert!(cancelled.is_cancelled());
        assert_eq!(cancelled.finished(), None);
    }
}
