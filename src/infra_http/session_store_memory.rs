use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use tokio::sync::watch;
use tracing::{info, warn};

pub struct MemorySessionStore {
    tx: watch::Sender<SessionState>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::Anonymous);
        Self { tx }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for MemorySessionStore {
    fn state(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    fn establish(&self) {
        self.tx.send_replace(SessionState::Active { since: Utc::now() });
        info!("session established");
    }

    fn end(&self, reason: SessionEndReason) {
        warn!(%reason, "session ended");
        self.tx.send_replace(SessionState::Ended {
            reason,
            at: Utc::now(),
        });
    }

    fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }
}
