use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Opaque bundle identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BundleId(pub String);

impl fmt::Display for BundleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BundleId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Instrumentation metadata read from the test application manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct InstrumentationInfo {
    /// Package of the instrumentation (test) application
    pub instrumentation_package: String,

    /// Package of the application under test; blank for self-instrumenting bundles
    #[serde(default)]
    pub application_package: String,

    /// Fully-qualified test runner class
    pub test_runner_class: String,
}

/// A test bundle to discover tests from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TestBundle {
    pub id: BundleId,

    /// Path to the test application artifact
    pub test_application: PathBuf,

    /// Path to the application under test, if any
    #[serde(default)]
    pub application: Option<PathBuf>,

    pub instrumentation_info: InstrumentationInfo,
}

impl TestBundle {
    pub fn new(
        id: impl Into<String>,
        test_application: impl Into<PathBuf>,
        instrumentation_info: InstrumentationInfo,
    ) -> Self {
        Self {
            id: BundleId(id.into()),
            test_application: test_application.into(),
            application: None,
            instrumentation_info,
        }
    }
}
