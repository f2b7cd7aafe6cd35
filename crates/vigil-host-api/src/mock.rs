//! Mock adapters for testing

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use vigil_api::ActionKind;
use vigil_util::ChallengeId;

use crate::{
    ActionCapabilities, ActionError, ActionExecutor, ActionResult, PromptError, PromptRequest,
    PromptResult, PromptSurface,
};

/// Mock action executor for unit/integration testing
pub struct MockExecutor {
    capabilities: ActionCapabilities,

    /// Actions that were performed, in order
    pub performed: Arc<Mutex<Vec<ActionKind>>>,

    /// Configure perform to fail
    pub fail_perform: Arc<Mutex<bool>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self {
            capabilities: ActionCapabilities::linux_full(),
            performed: Arc::new(Mutex::new(Vec::new())),
            fail_perform: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_capabilities(mut self, caps: ActionCapabilities) -> Self {
        self.capabilities = caps;
        self
    }

    /// Actions performed so far
    pub fn performed_actions(&self) -> Vec<ActionKind> {
        self.performed.lock().unwrap().clone()
    }
}

impl Default for MockExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActionExecutor for MockExecutor {
    fn capabilities(&self) -> &ActionCapabilities {
        &self.capabilities
    }

    async fn perform(&self, action: ActionKind) -> ActionResult<()> {
        if !self.capabilities.supports(action) {
            return Err(ActionError::Unsupported { action });
        }
        if *self.fail_perform.lock().unwrap() {
            return Err(ActionError::AllCommandsFailed {
                action,
                detail: "Mock action failure".into(),
            });
        }
        self.performed.lock().unwrap().push(action);
        Ok(())
    }
}

/// A single countdown update observed by the mock prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockUpdate {
    pub challenge_id: ChallengeId,
    pub remaining_seconds: u64,
    pub low_time: bool,
}

/// Mock prompt surface for unit/integration testing
pub struct MockPrompt {
    /// Prompts shown, in order
    pub shows: Arc<Mutex<Vec<PromptRequest>>>,

    /// Countdown updates received, in order
    pub updates: Arc<Mutex<Vec<MockUpdate>>>,

    /// Prompts dismissed, in order
    pub dismissals: Arc<Mutex<Vec<ChallengeId>>>,

    /// Configure show to fail (simulates a headless host)
    pub fail_show: Arc<Mutex<bool>>,
}

impl MockPrompt {
    pub fn new() -> Self {
        Self {
            shows: Arc::new(Mutex::new(Vec::new())),
            updates: Arc::new(Mutex::new(Vec::new())),
            dismissals: Arc::new(Mutex::new(Vec::new())),
            fail_show: Arc::new(Mutex::new(false)),
        }
    }

    pub fn shown_count(&self) -> usize {
        self.shows.lock().unwrap().len()
    }

    pub fn last_update(&self) -> Option<MockUpdate> {
        self.updates.lock().unwrap().last().cloned()
    }

    pub fn dismissed(&self, challenge_id: &ChallengeId) -> bool {
        self.dismissals.lock().unwrap().contains(challenge_id)
    }
}

impl Default for MockPrompt {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PromptSurface for MockPrompt {
    async fn show(&self, request: &PromptRequest) -> PromptResult<()> {
        if *self.fail_show.lock().unwrap() {
            return Err(PromptError::Unavailable("Mock prompt failure".into()));
        }
        self.shows.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn update(
        &self,
        challenge_id: &ChallengeId,
        remaining_seconds: u64,
        low_time: bool,
    ) -> PromptResult<()> {
        self.updates.lock().unwrap().push(MockUpdate {
            challenge_id: *challenge_id,
            remaining_seconds,
            low_time,
        });
        Ok(())
    }

    async fn dismiss(&self, challenge_id: &ChallengeId) -> PromptResult<()> {
        self.dismissals.lock().unwrap().push(*challenge_id);
        Ok(())
    }
}
