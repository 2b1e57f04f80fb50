//! Configuration error types and validation traits.

use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error indicating that a configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Error indicating that a resource limit has been exceeded.
    #[error("resource limit exceeded: {message}")]
    ResourceLimitExceeded { message: String },
}

/// A trait for validating configuration parameters.
///
/// Implementors provide [`validate`](ConfigValidator::validate) and
/// [`get_defaults`](ConfigValidator::get_defaults); the remaining methods are
/// reusable checks for common fields.
pub trait ConfigValidator {
    /// Validates the configuration.
    fn validate(&self) -> Result<(), ConfigError>;

    /// Returns the default configuration.
    fn get_defaults() -> Self
    where
        Self: Sized;

    /// Validates that a probability-like threshold lies in `[0, 1]`.
    fn validate_probability(&self, value: f32, field_name: &str) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&value) {
            Err(ConfigError::InvalidConfig {
                message: format!("{} must be between 0.0 and 1.0, got {}", field_name, value),
            })
        } else {
            Ok(())
        }
    }

    /// Validates a positive size such as an input resolution or sequence length.
    fn validate_positive(&self, value: usize, field_name: &str) -> Result<(), ConfigError> {
        if value == 0 {
            Err(ConfigError::InvalidConfig {
                message: format!("{} must be greater than 0", field_name),
            })
        } else {
            Ok(())
        }
    }

    /// Validates thread count.
    fn validate_thread_count(&self, thread_count: usize) -> Result<(), ConfigError> {
        const MAX_REASONABLE_THREADS: usize = 256;

        if thread_count == 0 {
            Err(ConfigError::InvalidConfig {
                message: "Thread count must be greater than 0".to_string(),
            })
        } else if thread_count > MAX_REASONABLE_THREADS {
            Err(ConfigError::ResourceLimitExceeded {
                message: format!(
                    "Thread count {} exceeds reasonable maximum of {}",
                    thread_count, MAX_REASONABLE_THREADS
                ),
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sample;

    impl ConfigValidator for Sample {
        fn validate(&self) -> Result<(), ConfigError> {
            Ok(())
        }

        fn get_defaults() -> Self {
            Sample
        }
    }

    #[test]
    fn test_validate_probability_bounds() {
        assert!(Sample.validate_probability(0.0, "t").is_ok());
        assert!(Sample.validate_probability(1.0, "t").is_ok());
        assert!(Sample.validate_probability(1.01, "t").is_err());
        assert!(Sample.validate_probability(-0.1, "t").is_err());
    }

    #[test]
    fn test_validate_thread_count() {
        assert!(Sample.validate_thread_count(0).is_err());
        assert!(Sample.validate_thread_count(4).is_ok());
        assert!(matches!(
            Sample.validate_thread_count(1000),
            Err(ConfigError::ResourceLimitExceeded { .. })
        ));
    }
}
