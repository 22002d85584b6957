//! Registry of which bundle each discovered test came from.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::models::{TestBundle, TestId};

/// Maps discovered tests to the bundle that reported them.
///
/// Shared behind an `Arc` between discovery and downstream execution.
#[derive(Debug, Default)]
pub struct TestBundleIdentifier {
    bundles: RwLock<HashMap<TestId, TestBundle>>,
}

impl TestBundleIdentifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the owning bundle of a test. A later registration of the same
    /// test replaces the earlier one.
    pub fn put(&self, test: TestId, bundle: &TestBundle) {
        let mut bundles = self
            .bundles
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        bundles.insert(test, bundle.clone());
    }

    pub fn identify(&self, test: &TestId) -> Option<TestBundle> {
        let bundles = self
            .bundles
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        bundles.get(test).cloned()
    }

    pub fn len(&self) -> usize {
        self.bundles
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{InstrumentationInfo, Test};

    fn bundle(id: &str) -> TestBundle {
        TestBundle::new(
            id,
            format!("/apks/{id}.apk"),
            InstrumentationInfo {
                instrumentation_package: format!("com.example.{id}.test"),
                application_package: String::new(),
                test_runner_class: "androidx.test.runner.AndroidJUnitRunner".to_string(),
            },
        )
    }

    #[test]
    fn test_put_and_identify() {
        let registry = TestBundleIdentifier::new();
        let test = Test::new("com.example", "LoginTest", "logsIn").id();

        assert!(registry.identify(&test).is_none());
        registry.put(test.clone(), &bundle("app"));

        assert_eq!(registry.identify(&test).map(|b| b.id.0), Some("app".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_later_registration_wins() {
        let registry = TestBundleIdentifier::new();
        let test = Test::new("com.example", "LoginTest", "logsIn").id();

        registry.put(test.clone(), &bundle("first"));
        registry.put(test.clone(), &bundle("second"));

        assert_eq!(registry.identify(&test).map(|b| b.id.0), Some("second".to_string()));
        assert_eq!(registry.len(), 1);
    }
}
