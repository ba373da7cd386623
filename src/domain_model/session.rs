use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    /// No login has happened yet in this process.
    Anonymous,
    Active {
        since: DateTime<Utc>,
    },
    Ended {
        reason: SessionEndReason,
        at: DateTime<Utc>,
    },
}

impl SessionState {
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Active { .. })
    }

    pub fn is_ended(&self) -> bool {
        matches!(self, SessionState::Ended { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEndReason {
    RefreshFailed(String),
    LoggedOut,
}

impl fmt::Display for SessionEndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEndReason::RefreshFailed(cause) => write!(f, "refresh failed: {}", cause),
            SessionEndReason::LoggedOut => write!(f, "logged out"),
        }
    }
}
