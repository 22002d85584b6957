//! Port trait definitions (Hexagonal Architecture)
//!
//! Discovery talks to the outside world only through these traits:
//! - Device: starts instrumentation runs and hands out log collectors
//! - AppInstaller: partial installation of a bundle before listing
//! - LogCollector: diagnostic log capture around one attempt

pub mod device;
pub mod installer;
pub mod log_collector;

pub use device::{Device, EventReceiver};
pub use installer::AppInstaller;
pub use log_collector::LogCollector;
