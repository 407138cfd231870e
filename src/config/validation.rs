use crate::config::types::{Config, FetchConfig, InputConfig, OutputConfig, SchedulerConfig};
use crate::ConfigError;

const MAX_WORKERS: usize = 1024;
const MAX_RETRIES: u32 = 10;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_input_config(&config.input)?;
    validate_output_config(&config.output)?;
    validate_fetch_config(&config.fetch)?;
    validate_scheduler_config(&config.scheduler)?;
    Ok(())
}

fn validate_input_config(config: &InputConfig) -> Result<(), ConfigError> {
    if config.domains_file.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "domains_file cannot be empty".to_string(),
        ));
    }

    if config.limit == Some(0) {
        return Err(ConfigError::Validation(
            "limit must be >= 1 when given".to_string(),
        ));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if let Some(log_path) = &config.log_path {
        if log_path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "log_path cannot be empty when given".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if config.retries > MAX_RETRIES {
        return Err(ConfigError::Validation(format!(
            "retries must be at most {}, got {}",
            MAX_RETRIES, config.retries
        )));
    }

    if !config.backoff_factor.is_finite() || config.backoff_factor < 0.0 {
        return Err(ConfigError::Validation(format!(
            "backoff_factor must be a non-negative number, got {}",
            config.backoff_factor
        )));
    }

    Ok(())
}

fn validate_scheduler_config(config: &SchedulerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    if config.task_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "task_timeout_secs must be >= 1, got {}",
            config.task_timeout_secs
        )));
    }

    if config.global_timeout_secs == Some(0) {
        return Err(ConfigError::Validation(
            "global_timeout_secs must be >= 1 when given".to_string(),
        ));
    }

    Ok(())
}
