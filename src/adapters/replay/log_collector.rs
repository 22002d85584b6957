use async_trait::async_trait;
use std::path::PathBuf;
use tracing::trace;

use crate::domain::errors::{DiscoveryError, DiscoveryResult};
use crate::domain::ports::LogCollector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureState {
    Idle,
    Capturing,
    Stopped,
}

/// Log collector over a fixed text source.
///
/// The source is read when capture starts; `stop` freezes the buffer and can
/// be called any number of times.
#[derive(Debug)]
pub struct BufferedLogCollector {
    source: Option<PathBuf>,
    buffer: String,
    state: CaptureState,
    finished: bool,
}

impl BufferedLogCollector {
    /// Collector that reads `source` on start. A missing file captures nothing.
    pub fn from_file(source: impl Into<PathBuf>) -> Self {
        Self {
            source: Some(source.into()),
            buffer: String::new(),
            state: CaptureState::Idle,
            finished: false,
        }
    }

    /// Collector that captures `text` on start.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            source: None,
            buffer: text.into(),
            state: CaptureState::Idle,
            finished: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_capturing(&self) -> bool {
        self.state == CaptureState::Capturing
    }
}

#[async_trait]
impl LogCollector for BufferedLogCollector {
    async fn setup(&mut self) -> DiscoveryResult<()> {
        if let Some(source) = &self.source {
            if let Some(parent) = source.parent().filter(|p| !p.as_os_str().is_empty()) {
                if !parent.is_dir() {
                    return Err(DiscoveryError::LogCollector(format!(
                        "log directory {} does not exist",
                        parent.display()
                    )));
                }
            }
        }
        Ok(())
    }

    async fn start(&mut self) -> DiscoveryResult<()> {
        if let Some(source) = &self.source {
            self.buffer = match tokio::fs::read_to_string(source).await {
                Ok(text) => text,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
                Err(err) => {
                    return Err(DiscoveryError::LogCollector(format!(
                        "failed to read {}: {err}",
                        source.display()
                    )))
                }
            };
        }
        self.state = CaptureState::Capturing;
        trace!(bytes = self.buffer.len(), "log capture started");
        Ok(())
    }

    async fn stop(&mut self) -> String {
        if self.state == CaptureState::Capturing {
            trace!(bytes = self.buffer.len(), "log capture stopped");
        }
        self.state = CaptureState::Stopped;
        self.buffer.clone()
    }

    async fn finish(&mut self) {
        self.finished = true;
    }
}
