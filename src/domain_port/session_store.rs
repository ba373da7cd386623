use crate::domain_model::{SessionEndReason, SessionState};
use tokio::sync::watch;

/// Local session markers. The credential itself stays in the transport.
pub trait SessionStore: Send + Sync {
    fn state(&self) -> SessionState;
    /// Mark the session active after a successful login.
    fn establish(&self);
    /// Mark the session ended and notify every subscriber.
    fn end(&self, reason: SessionEndReason);
    /// Receive every later session change; the UI uses this to redirect to login.
    fn subscribe(&self) -> watch::Receiver<SessionState>;
}
