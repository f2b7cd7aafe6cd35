//! Core monitoring engine for vigild
//!
//! This crate is the heart of vigild, containing:
//! - The monitor phase machine (Stopped -> Waiting -> Challenging)
//! - The challenge state machine (countdown, low-time escalation, outcome)
//! - Deadline enforcement using monotonic time

mod challenge;
mod engine;
mod events;

pub use challenge::*;
pub use engine::*;
pub use events::*;
