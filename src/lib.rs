//! Remote Test Parser - run-time test discovery for instrumented bundles
//!
//! Instead of inspecting bytecode, the tests of a bundle are discovered by
//! running its instrumentation in listing mode on a connected device and
//! observing the live event stream.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, error taxonomy and port traits
//! - **Service Layer** (`services`): annotation extraction, stream parsing,
//!   per-bundle retry and multi-bundle orchestration
//! - **Adapters** (`adapters`): port implementations (transcript replay)
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use remote_test_parser::adapters::replay::{NoopInstaller, ReplayDevice};
//! use remote_test_parser::domain::models::DiscoveryConfig;
//! use remote_test_parser::services::{RemoteTestParser, TestBundleIdentifier};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let parser = RemoteTestParser::new(
//!     DiscoveryConfig::default(),
//!     Arc::new(NoopInstaller),
//!     Arc::new(TestBundleIdentifier::new()),
//! );
//! let device = ReplayDevice::new("emulator-5554", "transcripts");
//! let tests = parser.extract(&device, &[], &CancellationToken::new()).await?;
//! assert!(tests.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    Annotation, BundleId, Config, DiscoveryConfig, InstrumentationInfo, Test, TestBundle,
    TestCatalog, TestEvent, TestIdentifier, TestParserConfig,
};
pub use domain::ports::{AppInstaller, Device, EventReceiver, LogCollector};
pub use domain::{DiscoveryError, DiscoveryResult, FailureKind};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    AnnotationExtractor, BundleDiscoveryCoordinator, DiscoveryRunState, RemoteTestParser,
    RetryPolicy, TestBundleIdentifier,
};
