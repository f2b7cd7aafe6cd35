//! Linux host adapter for vigild
//!
//! Implements [`vigil_host_api::ActionExecutor`] via the usual desktop power
//! commands, and XDG autostart registration.

pub mod actions;
pub mod autostart;

pub use actions::LinuxActionExecutor;
