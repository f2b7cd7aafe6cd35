//! Host adapter API for vigild
//!
//! Defines the traits the engine uses to touch the outside world:
//! - [`ActionExecutor`] performs power actions (shutdown, sleep, lock)
//! - [`PromptSurface`] presents challenge prompts and countdown updates
//!
//! Platform adapters live in their own crates (e.g. vigil-host-linux);
//! [`MockExecutor`] and [`MockPrompt`] back the test suites.

mod capabilities;
pub mod mock;
mod traits;

pub use capabilities::*;
pub use mock::{MockExecutor, MockPrompt};
pub use traits::*;
