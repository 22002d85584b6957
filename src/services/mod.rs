//! Discovery services
//!
//! Leaf first: annotation extraction, the per-attempt event stream parser,
//! the per-bundle coordinator with its retry policy, and the multi-bundle
//! orchestrator.

pub mod annotation_extractor;
pub mod bundle_discovery;
pub mod event_stream_parser;
pub mod remote_test_parser;
pub mod retry_policy;
pub mod test_bundle_identifier;

pub use annotation_extractor::{AnnotationExtractor, TEST_ANNOTATION_PRODUCER};
pub use bundle_discovery::{
    instrumentation_overrides, AttemptOutcome, BundleDiscoveryCoordinator, DiscoveryRunState,
};
pub use event_stream_parser::{DiscoveryAttemptState, EventStreamParser, Received, LISTENER_ARGUMENT};
pub use remote_test_parser::RemoteTestParser;
pub use retry_policy::RetryPolicy;
pub use test_bundle_identifier::TestBundleIdentifier;
