//! IPC-backed prompt surface
//!
//! The graphical challenge dialog is an external shell process subscribed to
//! the event stream. Showing a prompt therefore means broadcasting a
//! `ChallengeOpened` event; with no subscribed client there is nothing that
//! can challenge the user, so `show` fails and the engine stops rather than
//! silently arming a power action nobody can cancel.

use async_trait::async_trait;
use std::sync::Arc;
use vigil_api::{Event, EventPayload};
use vigil_host_api::{PromptError, PromptRequest, PromptResult, PromptSurface};
use vigil_ipc::IpcServer;
use vigil_util::ChallengeId;

pub struct IpcPrompt {
    ipc: Arc<IpcServer>,
}

impl IpcPrompt {
    pub fn new(ipc: Arc<IpcServer>) -> Self {
        Self { ipc }
    }
}

#[async_trait]
impl PromptSurface for IpcPrompt {
    async fn show(&self, request: &PromptRequest) -> PromptResult<()> {
        if self.ipc.subscriber_count().await == 0 {
            return Err(PromptError::Unavailable(
                "no subscribed shell clients".into(),
            ));
        }

        self.ipc.broadcast_event(Event::new(EventPayload::ChallengeOpened {
            challenge_id: request.challenge_id,
            deadline: request.deadline,
            timeout: request.timeout,
            sound: request.sound,
        }));

        Ok(())
    }

    async fn update(
        &self,
        challenge_id: &ChallengeId,
        remaining_seconds: u64,
        low_time: bool,
    ) -> PromptResult<()> {
        self.ipc.broadcast_event(Event::new(EventPayload::ChallengeCountdown {
            challenge_id: *challenge_id,
            remaining_seconds,
            low_time,
        }));
        Ok(())
    }

    async fn dismiss(&self, _challenge_id: &ChallengeId) -> PromptResult<()> {
        // The terminal event (answered, timed out, or stopped) tells the
        // shell to take the dialog down; nothing extra to send here.
        Ok(())
    }
}
