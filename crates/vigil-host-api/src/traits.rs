//! Host adapter traits

use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::time::Duration;
use thiserror::Error;
use vigil_api::ActionKind;
use vigil_util::ChallengeId;

use crate::ActionCapabilities;

/// Errors from power action execution
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Action '{action}' is not supported on this host")]
    Unsupported { action: ActionKind },

    #[error("All commands for '{action}' failed: {detail}")]
    AllCommandsFailed { action: ActionKind, detail: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ActionResult<T> = Result<T, ActionError>;

/// Errors from the prompt surface
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("No prompt surface available: {0}")]
    Unavailable(String),

    #[error("Unknown challenge")]
    UnknownChallenge,

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type PromptResult<T> = Result<T, PromptError>;

/// Everything the prompt surface needs to show a challenge
#[derive(Debug, Clone)]
pub struct PromptRequest {
    /// Identity of the challenge being presented
    pub challenge_id: ChallengeId,

    /// Full answer window
    pub timeout: Duration,

    /// Wall-clock time at which the action fires
    pub deadline: DateTime<Local>,

    /// Whether the prompt should play an alert sound
    pub sound: bool,
}

/// Executes power actions - implemented by platform-specific adapters
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    /// Get the capabilities of this executor
    fn capabilities(&self) -> &ActionCapabilities;

    /// Perform the given power action
    async fn perform(&self, action: ActionKind) -> ActionResult<()>;
}

/// Presents challenge prompts to the user
#[async_trait]
pub trait PromptSurface: Send + Sync {
    /// Show a new challenge prompt
    async fn show(&self, request: &PromptRequest) -> PromptResult<()>;

    /// Update the countdown on an open prompt
    async fn update(
        &self,
        challenge_id: &ChallengeId,
        remaining_seconds: u64,
        low_time: bool,
    ) -> PromptResult<()>;

    /// Take down a prompt (answered, timed out, or monitoring stopped)
    async fn dismiss(&self, challenge_id: &ChallengeId) -> PromptResult<()>;
}
