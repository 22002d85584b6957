//! Common test utilities for integration tests
//!
//! Scripted implementations of the device, installer and log collector
//! ports that record every call for later assertions.

#![allow(dead_code)]

use async_trait::async_trait;
use remote_test_parser::domain::models::{
    InstrumentationInfo, TestBundle, TestEvent, TestRunnerRequest,
};
use remote_test_parser::domain::ports::{AppInstaller, Device, EventReceiver, LogCollector};
use remote_test_parser::{DiscoveryError, DiscoveryResult};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Setup test logging
#[allow(dead_code)]
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn bundle(id: &str, package: &str) -> TestBundle {
    TestBundle::new(
        id,
        format!("/apks/{id}-androidTest.apk"),
        InstrumentationInfo {
            instrumentation_package: package.to_string(),
            application_package: String::new(),
            test_runner_class: "androidx.test.runner.AndroidJUnitRunner".to_string(),
        },
    )
}

/// What the device does for one instrumentation run.
#[derive(Debug, Clone)]
pub enum Run {
    /// Deliver these batches, then close the channel
    Events(Vec<Vec<TestEvent>>),
    /// Never deliver anything and never close
    Hang,
    /// Refuse to start the run
    Fail(String),
}

impl Run {
    pub fn ended(tests: &[(&str, &str)]) -> Self {
        let mut batch = vec![TestEvent::TestRunStarted {
            test_count: u32::try_from(tests.len()).unwrap(),
        }];
        batch.extend(tests.iter().map(|(class, method)| TestEvent::ended(class, method)));
        batch.push(TestEvent::TestRunEnded);
        Self::Events(vec![batch])
    }
}

/// Device driven by per-package scripts. Unscripted runs hang.
#[derive(Default)]
pub struct ScriptedDevice {
    runs: Mutex<HashMap<String, VecDeque<Run>>>,
    requests: Mutex<Vec<TestRunnerRequest>>,
    open_senders: Mutex<Vec<mpsc::Sender<Vec<TestEvent>>>>,
    pub collector_calls: Arc<Mutex<Vec<&'static str>>>,
    pub logcat: String,
}

impl ScriptedDevice {
    pub fn new() -> Self {
        Self {
            logcat: "E AndroidRuntime: java.lang.ClassNotFoundException".to_string(),
            ..Default::default()
        }
    }

    pub fn script(self, package: &str, runs: Vec<Run>) -> Self {
        self.runs
            .lock()
            .unwrap()
            .insert(package.to_string(), runs.into());
        self
    }

    pub fn requests(&self) -> Vec<TestRunnerRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn collector_calls(&self) -> Vec<&'static str> {
        self.collector_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Device for ScriptedDevice {
    fn serial_number(&self) -> &str {
        "emulator-5554"
    }

    fn supported_features(&self) -> Vec<String> {
        vec!["abb_exec".to_string()]
    }

    fn log_collector(&self) -> Box<dyn LogCollector> {
        Box::new(RecordingCollector {
            calls: self.collector_calls.clone(),
            text: self.logcat.clone(),
        })
    }

    async fn execute_test_request(&self, request: TestRunnerRequest) -> DiscoveryResult<EventReceiver> {
        let run = self
            .runs
            .lock()
            .unwrap()
            .get_mut(&request.test_package)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Run::Hang);
        self.requests.lock().unwrap().push(request);

        let (tx, rx) = mpsc::channel(16);
        match run {
            Run::Events(batches) => {
                for batch in batches {
                    tx.send(batch).await.unwrap();
                }
            }
            Run::Hang => self.open_senders.lock().unwrap().push(tx),
            Run::Fail(message) => return Err(DiscoveryError::Channel(message)),
        }
        Ok(rx)
    }
}

/// Collector that records its lifecycle calls.
pub struct RecordingCollector {
    calls: Arc<Mutex<Vec<&'static str>>>,
    text: String,
}

#[async_trait]
impl LogCollector for RecordingCollector {
    async fn setup(&mut self) -> DiscoveryResult<()> {
        self.calls.lock().unwrap().push("setup");
        Ok(())
    }

    async fn start(&mut self) -> DiscoveryResult<()> {
        self.calls.lock().unwrap().push("start");
        Ok(())
    }

    async fn stop(&mut self) -> String {
        self.calls.lock().unwrap().push("stop");
        self.text.clone()
    }

    async fn finish(&mut self) {
        self.calls.lock().unwrap().push("finish");
    }
}

/// Installer that counts calls and optionally fails every one of them.
#[derive(Default)]
pub struct CountingInstaller {
    pub calls: AtomicUsize,
    pub fail_with: Option<String>,
}

impl CountingInstaller {
    pub fn failing(message: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_with: Some(message.to_string()),
        }
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AppInstaller for CountingInstaller {
    async fn prepare_partial_installation(
        &self,
        _device: &dyn Device,
        _bundle: &TestBundle,
    ) -> DiscoveryResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(message) => Err(DiscoveryError::Installation(message.clone())),
            None => Ok(()),
        }
    }
}
