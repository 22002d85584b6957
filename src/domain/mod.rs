//! Domain layer for run-time test discovery
//!
//! This module contains the discovery models, the error taxonomy and the
//! port traits implemented by device, installer and log collector adapters.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DiscoveryError, DiscoveryResult, FailureKind};
