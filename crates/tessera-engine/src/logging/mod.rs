//! Logging utilities.
//!
//! Centralizes logger initialization behind the standard `log` facade;
//! subsystems log through `log::debug!`/`log::warn!` and stay
//! backend-agnostic.

mod init;

pub use init::{init, LogOptions};
