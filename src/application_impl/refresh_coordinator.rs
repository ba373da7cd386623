use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

pub type RefreshOutcome = Result<(), RefreshError>;

#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    waiters: VecDeque<oneshot::Sender<RefreshOutcome>>,
}

/// Single-flight credential refresh.
///
/// Every caller that needs a refresh joins the waiter queue. The first one to
/// join while nothing is in flight spawns the refresh task; everyone else only
/// waits. The task settles the state and resolves all waiters in join order,
/// so a caller dropping its future cannot leave the refresh stuck in flight.
/// Settling happens on drop, so a panicking transport resolves the waiters
/// with [`RefreshError::Abandoned`] instead.
#[derive(Clone)]
pub struct RefreshCoordinator {
    state: Arc<Mutex<RefreshState>>,
    transport: Arc<dyn Transport>,
    session: Arc<dyn SessionStore>,
    config: Arc<RefreshConfig>,
}

impl RefreshCoordinator {
    pub fn new(
        transport: Arc<dyn Transport>,
        session: Arc<dyn SessionStore>,
        config: RefreshConfig,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(RefreshState::default())),
            transport,
            session,
            config: Arc::new(config),
        }
    }

    pub fn refresh_path(&self) -> &str {
        &self.config.path
    }

    pub fn is_in_flight(&self) -> bool {
        self.lock().in_flight
    }

    /// Whether `error` ended the session under the configured policy.
    pub fn ends_session(&self, error: &RefreshError) -> bool {
        self.config.failure_policy.ends_session(error)
    }

    /// Wait for a refresh to settle, starting one if none is in flight.
    pub async fn refresh(&self, request_id: RequestId) -> RefreshOutcome {
        let (tx, rx) = oneshot::channel();
        let lead = {
            let mut state = self.lock();
            state.waiters.push_back(tx);
            !std::mem::replace(&mut state.in_flight, true)
        };

        if lead {
            info!(%request_id, path = %self.config.path, "credential refresh started");
            let this = self.clone();
            tokio::spawn(async move { this.run().await });
        } else {
            debug!(%request_id, "joined in-flight credential refresh");
        }

        rx.await.unwrap_or(Err(RefreshError::Abandoned))
    }

    async fn run(&self) {
        let mut guard = SettleOnDrop {
            coordinator: self.clone(),
            outcome: None,
        };
        guard.outcome = Some(self.call_refresh_endpoint().await);
    }

    fn settle(&self, outcome: RefreshOutcome) {
        if let Err(error) = &outcome {
            warn!(%error, "credential refresh failed");
            if self.ends_session(error) {
                self.transport.clear_credentials();
                self.session
                    .end(SessionEndReason::RefreshFailed(error.to_string()));
            }
        }

        let waiters = {
            let mut state = self.lock();
            state.in_flight = false;
            std::mem::take(&mut state.waiters)
        };
        info!(
            waiters = waiters.len(),
            renewed = outcome.is_ok(),
            "credential refresh settled"
        );
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
    }

    async fn call_refresh_endpoint(&self) -> RefreshOutcome {
        let request = Request::post(self.config.path.clone()).skip_refresh();
        let call = self.transport.execute(&request);
        match tokio::time::timeout(self.config.timeout, call).await {
            Err(_) => Err(RefreshError::Timeout(self.config.timeout)),
            Ok(Err(e)) => Err(RefreshError::Transport(e.to_string())),
            Ok(Ok(response)) if response.is_success() => Ok(()),
            Ok(Ok(response)) => Err(RefreshError::from_status(response.status)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

struct SettleOnDrop {
    coordinator: RefreshCoordinator,
    outcome: Option<RefreshOutcome>,
}

impl Drop for SettleOnDrop {
    fn drop(&mut self) {
        let outcome = self.outcome.take().unwrap_or(Err(RefreshError::Abandoned));
        self.coordinator.settle(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_http::*;
    use futures_util::future::join_all;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Panics on the first call, answers 200 afterwards.
    struct PanicOnce {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Transport for PanicOnce {
        async fn execute(&self, _request: &Request) -> Result<Response, TransportError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("refresh handler blew up");
            }
            Ok(Response::new(200, "{}"))
        }

        fn clear_credentials(&self) {}
    }

    fn coordinator(
        transport: Arc<FakeTransport>,
        policy: RefreshFailurePolicy,
    ) -> (RefreshCoordinator, Arc<MemorySessionStore>) {
        let session = Arc::new(MemorySessionStore::new());
        session.establish();
        let coordinator = RefreshCoordinator::new(
            transport,
            session.clone(),
            RefreshConfig {
                failure_policy: policy,
                ..RefreshConfig::default()
            },
        );
        (coordinator, session)
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_refresh() {
        let transport = Arc::new(FakeTransport::new());
        let (coordinator, _) = coordinator(transport.clone(), RefreshFailurePolicy::EndSession);

        let outcomes = join_all((0..5).map(|_| coordinator.refresh(RequestId::new()))).await;

        assert!(outcomes.iter().all(|o| o.is_ok()));
        assert_eq!(transport.refresh_calls(), 1);
        assert!(!coordinator.is_in_flight());
    }

    #[tokio::test]
    async fn sequential_refreshes_each_hit_the_endpoint() {
        let transport = Arc::new(FakeTransport::new());
        let (coordinator, _) = coordinator(transport.clone(), RefreshFailurePolicy::EndSession);

        coordinator.refresh(RequestId::new()).await.unwrap();
        coordinator.refresh(RequestId::new()).await.unwrap();

        assert_eq!(transport.refresh_calls(), 2);
    }

    #[tokio::test]
    async fn rejection_ends_session_and_clears_credentials() {
        let transport = Arc::new(FakeTransport::new());
        transport.set_refresh(FakeRefresh::Reject);
        let (coordinator, session) =
            coordinator(transport.clone(), RefreshFailurePolicy::EndSession);

        let outcomes = join_all((0..3).map(|_| coordinator.refresh(RequestId::new()))).await;

        for outcome in outcomes {
            assert_eq!(outcome, Err(RefreshError::Rejected { status: 401 }));
        }
        assert_eq!(transport.refresh_calls(), 1);
        assert!(session.state().is_ended());
        assert_eq!(transport.held_credential(), None);
    }

    #[tokio::test]
    async fn transport_failure_keeps_session_under_rejection_only_policy() {
        let transport = Arc::new(FakeTransport::new());
        transport.set_refresh(FakeRefresh::Fail);
        let (coordinator, session) = coordinator(
            transport.clone(),
            RefreshFailurePolicy::EndSessionOnRejection,
        );

        let outcome = coordinator.refresh(RequestId::new()).await;

        assert!(matches!(outcome, Err(RefreshError::Transport(_))));
        assert!(session.state().is_active());
        assert!(transport.held_credential().is_some());
    }

    #[tokio::test]
    async fn server_error_ends_session_under_default_policy() {
        let transport = Arc::new(FakeTransport::new());
        transport.set_refresh(FakeRefresh::Unavailable);
        let (coordinator, session) =
            coordinator(transport.clone(), RefreshFailurePolicy::EndSession);

        let outcome = coordinator.refresh(RequestId::new()).await;

        assert_eq!(outcome, Err(RefreshError::Status { status: 503 }));
        assert!(session.state().is_ended());
    }

    #[tokio::test]
    async fn slow_refresh_times_out() {
        let transport =
            Arc::new(FakeTransport::new().with_refresh_delay(Duration::from_millis(500)));
        let session = Arc::new(MemorySessionStore::new());
        let coordinator = RefreshCoordinator::new(
            transport.clone(),
            session.clone(),
            RefreshConfig {
                timeout: Duration::from_millis(50),
                ..RefreshConfig::default()
            },
        );

        let outcome = coordinator.refresh(RequestId::new()).await;

        assert_eq!(
            outcome,
            Err(RefreshError::Timeout(Duration::from_millis(50)))
        );
        assert!(!coordinator.is_in_flight());
        assert!(session.state().is_ended());
    }

    #[tokio::test]
    async fn waiters_resolve_in_join_order() {
        let transport =
            Arc::new(FakeTransport::new().with_refresh_delay(Duration::from_millis(50)));
        let (coordinator, _) = coordinator(transport.clone(), RefreshFailurePolicy::EndSession);
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for i in 1..=3 {
            let coordinator = coordinator.clone();
            let order = order.clone();
            handles.push(tokio::spawn(async move {
                coordinator.refresh(RequestId::new()).await.unwrap();
                order.lock().unwrap().push(i);
            }));
            // Let this task join the queue before the next one is spawned.
            tokio::task::yield_now().await;
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*order.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(transport.refresh_calls(), 1);
    }

    #[tokio::test]
    async fn panicking_refresh_still_settles_waiters() {
        let transport = Arc::new(PanicOnce {
            calls: AtomicUsize::new(0),
        });
        let session = Arc::new(MemorySessionStore::new());
        session.establish();
        let coordinator = RefreshCoordinator::new(
            transport.clone(),
            session.clone(),
            RefreshConfig {
                failure_policy: RefreshFailurePolicy::EndSessionOnRejection,
                ..RefreshConfig::default()
            },
        );

        let outcomes = join_all((0..2).map(|_| coordinator.refresh(RequestId::new()))).await;

        for outcome in outcomes {
            assert_eq!(outcome, Err(RefreshError::Abandoned));
        }
        assert!(!coordinator.is_in_flight());
        assert!(session.state().is_active());

        coordinator.refresh(RequestId::new()).await.unwrap();
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }
}
