use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Scheduler has at least one worker and non-zero timings and event buffer
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.scheduler.concurrency == 0 {
        return Err(ConfigError::ValidationError(
            "scheduler.concurrency must be at least 1".to_string(),
        ));
    }

    if config.scheduler.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "scheduler.poll_interval_ms cannot be 0".to_string(),
        ));
    }

    if config.scheduler.shutdown_timeout_ms == 0 {
        return Err(ConfigError::ValidationError(
            "scheduler.shutdown_timeout_ms cannot be 0".to_string(),
        ));
    }

    if config.scheduler.event_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "scheduler.event_capacity cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_zero_concurrency_fails() {
        let mut config = Config::default();
        config.scheduler.concurrency = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("scheduler.concurrency"));
    }

    #[test]
    fn test_validate_zero_poll_interval_fails() {
        let mut config = Config::default();
        config.scheduler.poll_interval_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_shutdown_timeout_fails() {
        let mut config = Config::default();
        config.scheduler.shutdown_timeout_ms = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("scheduler.shutdown_timeout_ms"));
    }
}
