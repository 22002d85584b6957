//! Domain errors for test discovery.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while discovering the tests of a bundle.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Cooperative cancellation. Never retried.
    #[error("Test discovery was cancelled")]
    Cancelled,

    #[error("Unable to parse test list using {serial}")]
    Timeout { serial: String },

    /// The device rejected the injected annotation listener or the
    /// instrumentation process crashed while loading it.
    #[error(
        "Test annotation producer was not found for {instrumentation_package} ({})",
        test_application.display()
    )]
    AnnotationProducerNotFound {
        instrumentation_package: String,
        test_application: PathBuf,
        logcat: String,
    },

    #[error("Installation failed: {0}")]
    Installation(String),

    #[error("Log collector failed: {0}")]
    LogCollector(String),

    #[error("Instrumentation channel failed: {0}")]
    Channel(String),
}

pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// Retry classification of a [`DiscoveryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Cancellation,
    Timeout,
    Misconfiguration,
    Unclassified,
}

impl DiscoveryError {
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Cancelled => FailureKind::Cancellation,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::AnnotationProducerNotFound { .. } => FailureKind::Misconfiguration,
            Self::Installation(_) | Self::LogCollector(_) | Self::Channel(_) => {
                FailureKind::Unclassified
            }
        }
    }

    pub const fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
