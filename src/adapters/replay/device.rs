use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

use super::log_collector::BufferedLogCollector;
use crate::domain::errors::{DiscoveryError, DiscoveryResult};
use crate::domain::models::{TestEvent, TestRunnerRequest};
use crate::domain::ports::{Device, EventReceiver, LogCollector};

const CHANNEL_CAPACITY: usize = 16;

/// Device that replays recorded transcripts instead of running instrumentation.
#[derive(Debug)]
pub struct ReplayDevice {
    serial: String,
    transcripts: PathBuf,
    features: Vec<String>,
    attempts: Mutex<HashMap<String, u32>>,
    requests: Mutex<Vec<TestRunnerRequest>>,
}

impl ReplayDevice {
    pub fn new(serial: impl Into<String>, transcripts: impl Into<PathBuf>) -> Self {
        Self {
            serial: serial.into(),
            transcripts: transcripts.into(),
            features: Vec::new(),
            attempts: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_features(mut self, features: Vec<String>) -> Self {
        self.features = features;
        self
    }

    /// Requests received so far, in order
    pub fn requests(&self) -> Vec<TestRunnerRequest> {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn next_attempt(&self, package: &str) -> u32 {
        let mut attempts = self
            .attempts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let attempt = attempts.entry(package.to_string()).or_insert(0);
        *attempt += 1;
        *attempt
    }

    fn transcript_path(&self, package: &str, attempt: u32) -> PathBuf {
        let per_attempt = self.transcripts.join(format!("{package}.{attempt}.jsonl"));
        if per_attempt.is_file() {
            per_attempt
        } else {
            self.transcripts.join(format!("{package}.jsonl"))
        }
    }
}

/// Parse a transcript: one JSON array of events per non-blank line.
pub fn parse_transcript(path: &Path, contents: &str) -> DiscoveryResult<Vec<Vec<TestEvent>>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str::<Vec<TestEvent>>(line).map_err(|e| {
                DiscoveryError::Channel(format!("{}:{}: {e}", path.display(), index + 1))
            })
        })
        .collect()
}

#[async_trait]
impl Device for ReplayDevice {
    fn serial_number(&self) -> &str {
        &self.serial
    }

    fn supported_features(&self) -> Vec<String> {
        self.features.clone()
    }

    fn log_collector(&self) -> Box<dyn LogCollector> {
        Box::new(BufferedLogCollector::from_file(self.transcripts.join("device.log")))
    }

    async fn execute_test_request(&self, request: TestRunnerRequest) -> DiscoveryResult<EventReceiver> {
        let attempt = self.next_attempt(&request.test_package);
        let path = self.transcript_path(&request.test_package, attempt);
        debug!(
            serial = %self.serial,
            package = %request.test_package,
            attempt,
            overrides = ?request.instrument_options.overrides,
            transcript = %path.display(),
            "replaying instrumentation run"
        );

        let contents = tokio::fs::read_to_string(&path).await.map_err(|e| {
            DiscoveryError::Channel(format!("failed to read transcript {}: {e}", path.display()))
        })?;
        let batches = parse_transcript(&path, &contents)?;

        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(request);

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(async move {
            for batch in batches {
                if tx.send(batch).await.is_err() {
                    break;
                }
            }
        });
        Ok(rx)
    }
}
