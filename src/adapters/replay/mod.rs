//! Offline adapters that replay recorded instrumentation transcripts.
//!
//! Transcript layout, one directory per device:
//! - `<instrumentation package>.<attempt>.jsonl` or `<instrumentation package>.jsonl`:
//!   one JSON array of events per line, each line delivered as one batch
//! - `device.log`: diagnostic log text returned by the log collector

pub mod device;
pub mod installer;
pub mod log_collector;

pub use device::ReplayDevice;
pub use installer::NoopInstaller;
pub use log_collector::BufferedLogCollector;
