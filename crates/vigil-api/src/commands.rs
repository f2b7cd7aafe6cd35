//! Command types for the vigild protocol

use serde::{Deserialize, Serialize};
use std::time::Duration;
use vigil_util::ClientId;

use crate::{API_VERSION, ClientRole};

/// Request wrapper with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Request ID for correlation
    pub request_id: u64,
    /// API version
    pub api_version: u32,
    /// The command
    pub command: Command,
}

impl Request {
    pub fn new(request_id: u64, command: Command) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            command,
        }
    }
}

/// Response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Corresponding request ID
    pub request_id: u64,
    /// API version
    pub api_version: u32,
    /// Response payload or error
    pub result: ResponseResult,
}

impl Response {
    pub fn success(request_id: u64, payload: ResponsePayload) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            result: ResponseResult::Ok(payload),
        }
    }

    pub fn error(request_id: u64, error: ErrorInfo) -> Self {
        Self {
            request_id,
            api_version: API_VERSION,
            result: ResponseResult::Err(error),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseResult {
    Ok(ResponsePayload),
    Err(ErrorInfo),
}

/// Error information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Error codes for the protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidRequest,
    NotMonitoring,
    NoOpenChallenge,
    PermissionDenied,
    RateLimited,
    ConfigError,
    PromptUnavailable,
    InternalError,
}

/// All possible commands from clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Get current monitor state
    GetState,

    /// Start monitoring (no-op if already running)
    Start,

    /// Stop monitoring, dismissing any open challenge without firing the
    /// configured action
    Stop,

    /// Answer the open challenge ("I'm awake")
    Respond,

    /// Query time remaining until the next check
    TimeUntilNextCheck,

    /// Reload configuration from disk (admin only; applies next cycle)
    ReloadConfig,

    /// Subscribe to events (returns immediately, events stream separately)
    SubscribeEvents,

    /// Unsubscribe from events
    UnsubscribeEvents,

    /// Get health status
    GetHealth,

    /// Ping for keepalive
    Ping,
}

/// Response payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponsePayload {
    State(crate::MonitorSnapshot),
    Started,
    AlreadyRunning,
    Stopped,
    Responded,
    TimeUntilNextCheck {
        /// None outside the Waiting phase
        remaining: Option<Duration>,
    },
    ConfigReloaded,
    Subscribed {
        client_id: ClientId,
    },
    Unsubscribed,
    Health(crate::HealthStatus),
    Pong,
}

/// Client connection info (set by IPC layer)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub client_id: ClientId,
    pub role: ClientRole,
    /// Unix UID if available
    pub uid: Option<u32>,
    /// Process name if available
    pub process_name: Option<String>,
}

impl ClientInfo {
    pub fn new(role: ClientRole) -> Self {
        Self {
            client_id: ClientId::new(),
            role,
            uid: None,
            process_name: None,
        }
    }

    pub fn with_uid(mut self, uid: u32) -> Self {
        self.uid = Some(uid);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ActionKind, MonitorPhase, MonitorSnapshot};

    #[test]
    fn request_serialization() {
        let req = Request::new(1, Command::Respond);
        let json = serde_json::to_string(&req).unwrap();
        let parsed: Request = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.request_id, 1);
        assert!(matches!(parsed.command, Command::Respond));
    }

    #[test]
    fn response_serialization() {
        let resp = Response::success(
            1,
            ResponsePayload::State(MonitorSnapshot {
                api_version: API_VERSION,
                phase: MonitorPhase::Stopped,
                next_check_at: None,
                time_until_next_check: None,
                challenge: None,
                action: ActionKind::Shutdown,
                check_interval: Duration::from_secs(1200),
                response_timeout: Duration::from_secs(30),
            }),
        );

        let json = serde_json::to_string(&resp).unwrap();
        let parsed: Response = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.request_id, 1);
        assert!(matches!(parsed.result, ResponseResult::Ok(_)));
    }

    #[test]
    fn error_response_serialization() {
        let resp = Response::error(7, ErrorInfo::new(ErrorCode::NoOpenChallenge, "No open challenge"));
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("no_open_challenge"));
    }
}
