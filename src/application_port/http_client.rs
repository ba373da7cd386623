use crate::domain_model::{Request, Response, STATUS_FORBIDDEN, STATUS_UNAUTHORIZED};
use crate::domain_port::TransportError;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed with status {}", .0.status)]
    Status(Response),
    #[error("request rejected after credential refresh (status {})", .0.status)]
    Unauthorized(Response),
    #[error("session ended: {0}")]
    SessionEnded(RefreshError),
    /// The refresh failed but the session was kept, so a later request may
    /// succeed.
    #[error("credential refresh failed: {0}")]
    RefreshFailed(RefreshError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ClientError {
    pub fn is_session_ended(&self) -> bool {
        matches!(self, ClientError::SessionEnded(_))
    }
}

/// Outcome of a failed refresh, delivered to every waiter of that refresh.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    #[error("refresh rejected with status {status}")]
    Rejected { status: u16 },
    #[error("refresh failed with status {status}")]
    Status { status: u16 },
    #[error("refresh transport error: {0}")]
    Transport(String),
    #[error("refresh timed out after {0:?}")]
    Timeout(Duration),
    #[error("refresh abandoned before settling")]
    Abandoned,
}

impl RefreshError {
    pub fn from_status(status: u16) -> Self {
        match status {
            STATUS_UNAUTHORIZED | STATUS_FORBIDDEN => RefreshError::Rejected { status },
            _ => RefreshError::Status { status },
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, RefreshError::Rejected { .. })
    }
}

/// Which refresh failures invalidate the local session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshFailurePolicy {
    /// Any failed refresh ends the session.
    #[default]
    EndSession,
    /// Only an explicit 401/403 from the refresh endpoint ends the session;
    /// transport errors and timeouts leave it active.
    EndSessionOnRejection,
}

impl RefreshFailurePolicy {
    pub fn ends_session(&self, error: &RefreshError) -> bool {
        match self {
            RefreshFailurePolicy::EndSession => true,
            RefreshFailurePolicy::EndSessionOnRejection => error.is_rejection(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RefreshConfig {
    pub path: String,
    pub timeout: Duration,
    pub failure_policy: RefreshFailurePolicy,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            path: "/auth/refresh".to_string(),
            timeout: Duration::from_secs(10),
            failure_policy: RefreshFailurePolicy::default(),
        }
    }
}

#[async_trait::async_trait]
pub trait AuthenticatedClient: Send + Sync {
    /// Send a request with the session credential attached.
    ///
    /// A 401 on the first attempt triggers one shared credential refresh and
    /// a single replay; a 401 on the replay is returned as
    /// [`ClientError::Unauthorized`]. Every other failure is returned as-is.
    async fn send(&self, request: Request) -> Result<Response, ClientError>;
}
