use crate::domain_model::{Request, Response};

/// Carries requests to the backend and owns the session credential.
///
/// Implementations attach whatever credential they currently hold to every
/// call and store renewed credentials delivered by responses. Callers never
/// see the credential itself.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Send one request. Any HTTP status is `Ok`; only failures to obtain a
    /// response at all are errors.
    async fn execute(&self, request: &Request) -> Result<Response, TransportError>;

    /// Drop the held credential so later calls go out unauthenticated.
    fn clear_credentials(&self);
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("connection error: {0}")]
    Connect(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("transport error: {0}")]
    Other(String),
}
