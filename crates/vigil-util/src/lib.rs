//! Shared utilities for vigild
//!
//! This crate provides:
//! - ID types (ChallengeId, ClientId)
//! - Time utilities (monotonic time, duration helpers)
//! - Rate limiting helpers
//! - Default paths for config, socket, and log directories

mod ids;
mod paths;
mod rate_limit;
mod time;

pub use ids::*;
pub use paths::*;
pub use rate_limit::*;
pub use time::*;
