use crate::domain_model::*;
use crate::domain_port::*;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// How the fake backend answers the refresh endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeRefresh {
    /// Issue a new credential, provided one is currently held.
    Renew,
    /// Answer 401.
    Reject,
    /// Answer 503.
    Unavailable,
    /// Fail without a response.
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub credential: Option<u64>,
}

#[derive(Debug, Clone, Copy)]
enum FakeOutcome {
    Status(u16),
    Fail,
}

struct FakeState {
    issued: u64,
    held: Option<u64>,
    refresh: FakeRefresh,
    overrides: HashMap<String, FakeOutcome>,
    calls: Vec<RecordedCall>,
}

/// In-memory backend for tests and demos.
///
/// Credentials are generation numbers: the backend accepts a request only when
/// the held credential matches the latest issued one. `expire_credential`
/// bumps the issued generation, so every held credential turns stale until a
/// refresh hands out the new one.
pub struct FakeTransport {
    state: Mutex<FakeState>,
    refresh_path: String,
    refresh_delay: Duration,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                issued: 1,
                held: Some(1),
                refresh: FakeRefresh::Renew,
                overrides: HashMap::new(),
                calls: Vec::new(),
            }),
            refresh_path: "/auth/refresh".to_string(),
            refresh_delay: Duration::from_millis(20),
        }
    }

    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }

    pub fn expire_credential(&self) {
        self.lock().issued += 1;
    }

    pub fn set_refresh(&self, refresh: FakeRefresh) {
        self.lock().refresh = refresh;
    }

    /// Always answer `path` with `status`, whatever the credential.
    pub fn respond_with(&self, path: impl Into<String>, status: u16) {
        self.lock()
            .overrides
            .insert(path.into(), FakeOutcome::Status(status));
    }

    /// Fail every call to `path` without a response.
    pub fn fail_with(&self, path: impl Into<String>) {
        self.lock().overrides.insert(path.into(), FakeOutcome::Fail);
    }

    pub fn held_credential(&self) -> Option<u64> {
        self.lock().held
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.lock().calls.iter().filter(|c| c.path == path).count()
    }

    pub fn refresh_calls(&self) -> usize {
        self.calls_to(&self.refresh_path)
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn refresh(&self) -> Result<Response, TransportError> {
        tokio::time::sleep(self.refresh_delay).await;

        let mut state = self.lock();
        match state.refresh {
            FakeRefresh::Renew => {
                if state.held.is_none() {
                    return Ok(Response::new(STATUS_UNAUTHORIZED, "{}"));
                }
                state.issued += 1;
                state.held = Some(state.issued);
                let mut response = Response::new(200, "{}");
                response.headers.push((
                    "set-cookie".to_string(),
                    format!("session=fake-{}; Path=/; HttpOnly", state.issued),
                ));
                Ok(response)
            }
            FakeRefresh::Reject => Ok(Response::new(STATUS_UNAUTHORIZED, "{}")),
            FakeRefresh::Unavailable => Ok(Response::new(503, "{}")),
            FakeRefresh::Fail => Err(TransportError::Connect("connection refused".to_string())),
        }
    }
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Transport for FakeTransport {
    async fn execute(&self, request: &Request) -> Result<Response, TransportError> {
        {
            let mut state = self.lock();
            let credential = state.held;
            state.calls.push(RecordedCall {
                method: request.method,
                path: request.path.clone(),
                headers: request.headers.clone(),
                credential,
            });
        }

        if request.path == self.refresh_path {
            return self.refresh().await;
        }

        let state = self.lock();
        match state.overrides.get(&request.path) {
            Some(FakeOutcome::Status(status)) => Ok(Response::new(*status, "{}")),
            Some(FakeOutcome::Fail) => {
                Err(TransportError::Connect("connection reset".to_string()))
            }
            None if state.held == Some(state.issued) => {
                let body = serde_json::json!({
                    "path": request.path,
                    "credential": state.issued,
                });
                Ok(Response::new(200, body.to_string()))
            }
            None => Ok(Response::new(STATUS_UNAUTHORIZED, "{}")),
        }
    }

    fn clear_credentials(&self) {
        self.lock().held = None;
    }
}
