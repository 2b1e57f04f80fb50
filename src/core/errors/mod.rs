//! Error types for the ECG cascade.
//!
//! Library code returns [`EcgError`]; the digitizer has its own narrower
//! [`DigitizationError`], which converts into [`EcgError`] with `?`.
//!
//! # Usage
//!
//! ```rust
//! use ecg_cascade::core::errors::EcgError;
//!
//! let config_error = EcgError::config_error("Missing required model path");
//! assert!(config_error.to_string().starts_with("configuration"));
//! ```

pub mod constructors;
pub mod types;

pub use types::{DigitizationError, EcgError, ProcessingStage, SimpleError};

/// Convenient result alias for cascade operations.
pub type EcgResult<T> = Result<T, EcgError>;
