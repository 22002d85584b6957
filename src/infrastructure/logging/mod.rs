//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - Pretty or JSON formatting on stderr
//! - Optional rolling file output (always JSON)

pub mod logger;

pub use crate::domain::models::config::{LogFormat, LoggingConfig, RotationPolicy};
pub use logger::{debug, error, info, instrument, trace, warn, LoggerImpl, LOG_FILE_NAME};
