//! Domain models for test discovery

pub mod bundle;
pub mod config;
pub mod event;

pub use bundle::{BundleId, InstrumentationInfo, TestBundle};
pub use config::{Config, DiscoveryConfig, LogFormat, LoggingConfig, RotationPolicy, TestParserConfig};
pub use event::{InstrumentOptions, TestEvent, TestIdentifier, TestRunnerRequest};
pub use test::{Annotation, Test, TestCatalog, TestId};
