//! Instrumentation protocol events.
//!
//! The device delivers events in batches over a channel. The set of events
//! is closed: every consumer matches exhaustively, so adding a variant is a
//! compile error until all of them handle it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::test::{Annotation, Test};

/// Test identity as reported by the instrumentation runner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TestIdentifier {
    /// Fully-qualified class name
    pub class_name: String,
    pub test_name: String,
}

impl TestIdentifier {
    pub fn new(class_name: impl Into<String>, test_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            test_name: test_name.into(),
        }
    }

    /// Split the class name at its last `.` into package and simple class name.
    pub fn to_test(&self, annotations: impl IntoIterator<Item = Annotation>) -> Test {
        let (package, class) = match self.class_name.rsplit_once('.') {
            Some((package, class)) => (package, class),
            None => ("", self.class_name.as_str()),
        };
        Test::new(package, class, self.test_name.clone()).with_annotations(annotations)
    }
}

/// A single event of an instrumentation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TestEvent {
    TestRunStarted {
        #[serde(default)]
        test_count: u32,
    },
    TestStarted {
        id: TestIdentifier,
    },
    TestFailed {
        id: TestIdentifier,
        #[serde(default)]
        stack_trace: String,
    },
    TestAssumptionFailed {
        id: TestIdentifier,
        #[serde(default)]
        stack_trace: String,
    },
    TestIgnored {
        id: TestIdentifier,
    },
    TestEnded {
        id: TestIdentifier,
        /// Raw key/value metadata reported when the test finished
        #[serde(default)]
        metrics: BTreeMap<String, String>,
    },
    TestRunFailing {
        error: String,
    },
    TestRunFailed {
        error: String,
    },
    TestRunStopped,
    TestRunEnded,
}

impl TestEvent {
    pub fn ended(class_name: &str, test_name: &str) -> Self {
        Self::TestEnded {
            id: TestIdentifier::new(class_name, test_name),
            metrics: BTreeMap::new(),
        }
    }
}

/// Request to run an instrumentation in listing mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestRunnerRequest {
    pub test_package: String,
    pub runner_class: String,
    pub instrument_options: InstrumentOptions,
    pub supported_features: Vec<String>,
}

/// `am instrument` options relevant to discovery.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InstrumentOptions {
    /// Report tests without executing them
    pub log: bool,

    /// Extra `-e key value` instrumentation arguments
    pub overrides: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_splits_package() {
        let test = TestIdentifier::new("com.example.login.LoginTest", "logsIn").to_test([]);
        assert_eq!(test.package, "com.example.login");
        assert_eq!(test.class, "LoginTest");
        assert_eq!(test.method, "logsIn");
        assert!(test.annotations.is_empty());
    }

    #[test]
    fn test_identifier_without_package() {
        let test = TestIdentifier::new("LoginTest", "logsIn").to_test([]);
        assert_eq!(test.package, "");
        assert_eq!(test.class, "LoginTest");
    }

    #[test]
    fn test_event_json_shape() {
        let line = r#"[
            {"type": "test_run_started", "test_count": 1},
            {"type": "test_ended", "id": {"class_name": "a.B", "test_name": "m"}},
            {"type": "test_run_failing", "error": "boom"},
            {"type": "test_run_ended"}
        ]"#;
        let events: Vec<TestEvent> = serde_json::from_str(line).unwrap();

        assert_eq!(events.len(), 4);
        assert_eq!(events[1], TestEvent::ended("a.B", "m"));
        assert!(matches!(&events[2], TestEvent::TestRunFailing { error } if error == "boom"));
    }
}
