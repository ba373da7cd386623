use crate::application_impl::RefreshCoordinator;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct RealAuthenticatedClient {
    transport: Arc<dyn Transport>,
    refresher: RefreshCoordinator,
}

impl RealAuthenticatedClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        session: Arc<dyn SessionStore>,
        config: RefreshConfig,
    ) -> Self {
        let refresher = RefreshCoordinator::new(transport.clone(), session, config);
        Self {
            transport,
            refresher,
        }
    }

    fn recovers(&self, request: &Request) -> bool {
        !request.skip_refresh && request.path != self.refresher.refresh_path()
    }
}

#[async_trait::async_trait]
impl AuthenticatedClient for RealAuthenticatedClient {
    async fn send(&self, request: Request) -> Result<Response, ClientError> {
        let request_id = RequestId::new();
        let mut attempt = Attempt::Initial;

        loop {
            debug!(%request_id, method = %request.method, path = %request.path, ?attempt, "sending request");
            let response = self.transport.execute(&request).await?;

            if response.is_success() {
                return Ok(response);
            }
            if !response.is_unauthorized() || !self.recovers(&request) {
                debug!(%request_id, status = response.status, "request failed");
                return Err(ClientError::Status(response));
            }
            if attempt.is_replay() {
                warn!(%request_id, path = %request.path, "request rejected again after refresh");
                return Err(ClientError::Unauthorized(response));
            }

            if let Err(error) = self.refresher.refresh(request_id).await {
                return Err(if self.refresher.ends_session(&error) {
                    ClientError::SessionEnded(error)
                } else {
                    ClientError::RefreshFailed(error)
                });
            }
            attempt = Attempt::Replay;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_http::*;
    use futures_util::future::join_all;

    struct Fixture {
        transport: Arc<FakeTransport>,
        session: Arc<MemorySessionStore>,
        client: RealAuthenticatedClient,
    }

    fn fixture() -> Fixture {
        let transport = Arc::new(FakeTransport::new());
        let session = Arc::new(MemorySessionStore::new());
        session.establish();
        let client =
            RealAuthenticatedClient::new(transport.clone(), session.clone(), RefreshConfig::default());
        Fixture {
            transport,
            session,
            client,
        }
    }

    #[tokio::test]
    async fn success_passes_through_untouched() {
        let f = fixture();
        let response = f.client.send(Request::get("/rooms")).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(f.transport.calls_to("/rooms"), 1);
        assert_eq!(f.transport.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn concurrent_unauthorized_requests_share_one_refresh_and_replay_once() {
        let f = fixture();
        f.transport.expire_credential();

        let paths: Vec<String> = (0..4).map(|i| format!("/rooms/{}/tenant", i)).collect();
        let results = join_all(paths.iter().map(|p| f.client.send(Request::get(p.clone())))).await;

        for result in &results {
            assert_eq!(result.as_ref().unwrap().status, 200);
        }
        assert_eq!(f.transport.refresh_calls(), 1);
        for path in &paths {
            assert_eq!(f.transport.calls_to(path), 2);
        }
    }

    #[tokio::test]
    async fn queued_waiters_are_all_replayed_with_renewed_credential() {
        let f = fixture();
        f.transport.expire_credential();
        let stale = f.transport.held_credential();

        let requests = ["/w1", "/w2", "/w3"].map(|p| f.client.send(Request::get(p)));
        let results = join_all(requests).await;
        assert!(results.iter().all(|r| r.is_ok()));

        let renewed = f.transport.held_credential();
        assert_ne!(stale, renewed);
        for path in ["/w1", "/w2", "/w3"] {
            let calls: Vec<_> = f
                .transport
                .calls()
                .into_iter()
                .filter(|c| c.path == path)
                .collect();
            assert_eq!(calls.len(), 2);
            assert_eq!(calls[0].credential, stale);
            assert_eq!(calls[1].credential, renewed);
        }
    }

    #[tokio::test]
    async fn replay_keeps_caller_headers() {
        let f = fixture();
        f.transport.expire_credential();

        let request = Request::get("/rooms").header("x-kost-trace", "abc");
        f.client.send(request).await.unwrap();

        let calls: Vec<_> = f
            .transport
            .calls()
            .into_iter()
            .filter(|c| c.path == "/rooms")
            .collect();
        assert_eq!(calls.len(), 2);
        for call in calls {
            assert_eq!(
                call.headers,
                vec![("x-kost-trace".to_string(), "abc".to_string())]
            );
        }
    }

    #[tokio::test]
    async fn second_rejection_after_replay_is_not_retried() {
        let f = fixture();
        f.transport.respond_with("/admin/registrations", 401);

        let err = f
            .client
            .send(Request::get("/admin/registrations"))
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Unauthorized(ref r) if r.status == 401));
        assert_eq!(f.transport.calls_to("/admin/registrations"), 2);
        assert_eq!(f.transport.refresh_calls(), 1);
    }

    #[tokio::test]
    async fn refresh_failure_ends_session_for_every_waiter() {
        let f = fixture();
        f.transport.expire_credential();
        f.transport.set_refresh(FakeRefresh::Reject);
        let mut session_rx = f.session.subscribe();

        let results = join_all(["/rooms", "/profile"].map(|p| f.client.send(Request::get(p)))).await;

        for result in results {
            assert!(result.unwrap_err().is_session_ended());
        }
        assert_eq!(f.transport.refresh_calls(), 1);
        assert_eq!(f.transport.calls_to("/rooms"), 1);
        assert!(session_rx.has_changed().unwrap());
        assert!(session_rx.borrow_and_update().is_ended());

        // Stale credentials are gone: nothing succeeds without a new login.
        f.transport.set_refresh(FakeRefresh::Renew);
        let err = f.client.send(Request::get("/rooms")).await.unwrap_err();
        assert!(err.is_session_ended());
        assert_eq!(f.transport.held_credential(), None);
    }

    #[tokio::test]
    async fn server_error_never_triggers_refresh() {
        let f = fixture();
        f.transport.respond_with("/rooms", 500);

        let err = f.client.send(Request::get("/rooms")).await.unwrap_err();

        assert!(matches!(err, ClientError::Status(ref r) if r.status == 500));
        assert_eq!(f.transport.calls_to("/rooms"), 1);
        assert_eq!(f.transport.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn network_error_never_triggers_refresh() {
        let f = fixture();
        f.transport.fail_with("/rooms");

        let err = f.client.send(Request::get("/rooms")).await.unwrap_err();

        assert!(matches!(err, ClientError::Transport(TransportError::Connect(_))));
        assert_eq!(f.transport.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn skip_refresh_requests_return_401_directly() {
        let f = fixture();
        f.transport.expire_credential();

        let err = f
            .client
            .send(Request::post("/auth/login").skip_refresh())
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Status(ref r) if r.status == 401));
        assert_eq!(f.transport.refresh_calls(), 0);
    }

    #[tokio::test]
    async fn kept_session_reports_refresh_failure_not_session_end() {
        let transport = Arc::new(FakeTransport::new());
        let session = Arc::new(MemorySessionStore::new());
        session.establish();
        let client = RealAuthenticatedClient::new(
            transport.clone(),
            session.clone(),
            RefreshConfig {
                failure_policy: RefreshFailurePolicy::EndSessionOnRejection,
                ..RefreshConfig::default()
            },
        );
        transport.expire_credential();
        transport.set_refresh(FakeRefresh::Fail);

        let err = client.send(Request::get("/rooms")).await.unwrap_err();

        assert!(matches!(err, ClientError::RefreshFailed(RefreshError::Transport(_))));
        assert!(!err.is_session_ended());
        assert!(session.state().is_active());
        assert!(transport.held_credential().is_some());
    }
}
