//! Screen controller: owns the screen state and drives fetch attempts.
//!
//! Every attempt gets a sequence number. Only the outcome of the most recently
//! started attempt is applied; an older attempt that settles late is dropped.

use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    error::{FetchError, ScreenError},
    model::LocationSample,
    provider::LocationProvider,
};

/// What the screen is showing. Exactly one at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenState {
    Loading,
    Error(String),
    Ready(LocationSample),
}

impl ScreenState {
    pub fn is_loading(&self) -> bool {
        matches!(self, ScreenState::Loading)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScreenState::Loading => "loading",
            ScreenState::Error(_) => "error",
            ScreenState::Ready(_) => "ready",
        }
    }
}

impl From<Result<LocationSample, FetchError>> for ScreenState {
    fn from(result: Result<LocationSample, FetchError>) -> Self {
        match result {
            Ok(sample) => ScreenState::Ready(sample),
            Err(err) => ScreenState::Error(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The attempt was still the latest one and its result is on screen.
    Applied(ScreenState),
    /// A newer attempt started first; this result was dropped.
    Superseded { attempt: u64, latest: u64 },
}

#[derive(Debug)]
pub struct ScreenController {
    provider: Box<dyn LocationProvider>,
    state: watch::Sender<ScreenState>,
    latest_attempt: AtomicU64,
}

impl ScreenController {
    /// Controller in `Loading` with no attempt issued yet. Use [`ScreenController::mount`]
    /// to also start the first fetch.
    pub fn new(provider: Box<dyn LocationProvider>) -> Self {
        let (state, _) = watch::channel(ScreenState::Loading);
        Self { provider, state, latest_attempt: AtomicU64::new(0) }
    }

    /// Create the controller and start its first fetch on the runtime.
    ///
    /// The state is already `Loading` for attempt 1 when this returns.
    pub fn mount(provider: Box<dyn LocationProvider>) -> (Arc<Self>, JoinHandle<FetchOutcome>) {
        let controller = Arc::new(Self::new(provider));
        let attempt = controller.begin_attempt();

        let task = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.settle(attempt).await })
        };

        (controller, task)
    }

    pub fn state(&self) -> ScreenState {
        self.state.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    /// Observe every state transition.
    pub fn subscribe(&self) -> watch::Receiver<ScreenState> {
        self.state.subscribe()
    }

    /// Number of the most recently started attempt (0 before the first).
    pub fn latest_attempt(&self) -> u64 {
        self.latest_attempt.load(Ordering::SeqCst)
    }

    /// Start a fetch attempt.
    ///
    /// The state switches to `Loading` immediately, before the returned future is
    /// polled; the future performs the permission and position requests.
    pub fn fetch_location(&self) -> impl Future<Output = FetchOutcome> + Send + '_ {
        let attempt = self.begin_attempt();
        self.settle(attempt)
    }

    /// Fetch again after a failure. Only valid from the error view.
    pub fn retry(&self) -> Result<impl Future<Output = FetchOutcome> + Send + '_, ScreenError> {
        let attempt = self.begin_attempt_from_error()?;
        info!(attempt, "retry requested");
        Ok(self.settle(attempt))
    }

    fn begin_attempt(&self) -> u64 {
        let mut attempt = 0;
        self.state.send_modify(|state| {
            attempt = self.latest_attempt.fetch_add(1, Ordering::SeqCst) + 1;
            *state = ScreenState::Loading;
        });
        info!(attempt, "fetching location");
        attempt
    }

    fn begin_attempt_from_error(&self) -> Result<u64, ScreenError> {
        let mut attempt = None;
        let mut current = "error";
        self.state.send_if_modified(|state| {
            if !matches!(state, ScreenState::Error(_)) {
                current = state.name();
                return false;
            }
            attempt = Some(self.latest_attempt.fetch_add(1, Ordering::SeqCst) + 1);
            *state = ScreenState::Loading;
            true
        });
        attempt.ok_or(ScreenError::RetryUnavailable { state: current })
    }

    async fn settle(&self, attempt: u64) -> FetchOutcome {
        let next = ScreenState::from(self.acquire().await);

        match &next {
            ScreenState::Ready(sample) => info!(
                attempt,
                latitude = sample.coordinates.latitude,
                longitude = sample.coordinates.longitude,
                "location obtained"
            ),
            ScreenState::Error(message) => warn!(attempt, %message, "location fetch failed"),
            ScreenState::Loading => {}
        }

        self.apply(attempt, next)
    }

    /// Permission first, then position. Never both at once.
    async fn acquire(&self) -> Result<LocationSample, FetchError> {
        let permission = self
            .provider
            .request_permission()
            .await
            .map_err(|err| FetchError::position_unavailable(&err))?;

        if !permission.granted {
            debug!(can_ask_again = permission.can_ask_again, "location permission denied");
            return Err(FetchError::PermissionDenied);
        }

        let sample = self
            .provider
            .current_position()
            .await
            .map_err(|err| FetchError::position_unavailable(&err))?;

        if !sample.is_renderable() {
            return Err(FetchError::PositionUnavailable(format!(
                "O provedor retornou coordenadas inválidas ({}, {}).",
                sample.coordinates.latitude, sample.coordinates.longitude
            )));
        }

        Ok(sample)
    }

    fn apply(&self, attempt: u64, next: ScreenState) -> FetchOutcome {
        let mut latest = attempt;
        let applied = self.state.send_if_modified(|state| {
            latest = self.latest_attempt.load(Ordering::SeqCst);
            if latest != attempt {
                return false;
            }
            *state = next.clone();
            true
        });

        if applied {
            FetchOutcome::Applied(next)
        } else {
            debug!(attempt, latest, "dropping outcome of superseded attempt");
            FetchOutcome::Superseded { attempt, latest }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::PERMISSION_DENIED_MESSAGE,
        model::{Coordinates, PermissionResponse},
    };
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::{collections::VecDeque, sync::Mutex};
    use tokio::sync::oneshot;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Call {
        Permission,
        Position,
    }

    type Pending = oneshot::Receiver<anyhow::Result<LocationSample>>;

    /// Plays back queued answers in order and records every call.
    #[derive(Debug, Default)]
    struct ScriptedProvider {
        permissions: Mutex<VecDeque<anyhow::Result<PermissionResponse>>>,
        positions: Mutex<VecDeque<Pending>>,
        calls: Arc<Mutex<Vec<Call>>>,
    }

    impl ScriptedProvider {
        fn permission(self, answer: anyhow::Result<PermissionResponse>) -> Self {
            self.permissions.lock().unwrap().push_back(answer);
            self
        }

        fn position(self, answer: anyhow::Result<LocationSample>) -> Self {
            let (tx, rx) = oneshot::channel();
            tx.send(answer).unwrap();
            self.gated_position(rx)
        }

        fn gated_position(self, rx: Pending) -> Self {
            self.positions.lock().unwrap().push_back(rx);
            self
        }

        fn calls(&self) -> Arc<Mutex<Vec<Call>>> {
            Arc::clone(&self.calls)
        }
    }

    #[async_trait]
    impl LocationProvider for ScriptedProvider {
        async fn request_permission(&self) -> anyhow::Result<PermissionResponse> {
            self.calls.lock().unwrap().push(Call::Permission);
            self.permissions
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow!("no scripted permission answer")))
        }

        async fn current_position(&self) -> anyhow::Result<LocationSample> {
            self.calls.lock().unwrap().push(Call::Position);
            let pending = self.positions.lock().unwrap().pop_front();
            match pending {
                Some(rx) => rx.await.unwrap_or_else(|_| Err(anyhow!("answer dropped"))),
                None => Err(anyhow!("no scripted position answer")),
            }
        }
    }

    fn googleplex() -> LocationSample {
        LocationSample::now(Coordinates::new(37.4219999, -122.0840575))
    }

    fn recorded(calls: &Arc<Mutex<Vec<Call>>>) -> Vec<Call> {
        calls.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn mount_issues_exactly_one_fetch() {
        let provider = ScriptedProvider::default()
            .permission(Ok(PermissionResponse::granted()))
            .position(Ok(googleplex()));
        let calls = provider.calls();

        let (controller, first_fetch) = ScreenController::mount(Box::new(provider));
        assert_eq!(controller.latest_attempt(), 1);

        let outcome = first_fetch.await.unwrap();

        assert!(matches!(outcome, FetchOutcome::Applied(ScreenState::Ready(_))));
        assert_eq!(recorded(&calls), vec![Call::Permission, Call::Position]);
        assert!(!controller.is_loading());
    }

    #[tokio::test]
    async fn permission_denied_never_requests_position() {
        let provider = ScriptedProvider::default().permission(Ok(PermissionResponse::denied()));
        let calls = provider.calls();
        let controller = ScreenController::new(Box::new(provider));

        let outcome = controller.fetch_location().await;

        let expected = ScreenState::Error(PERMISSION_DENIED_MESSAGE.to_string());
        assert_eq!(outcome, FetchOutcome::Applied(expected.clone()));
        assert_eq!(controller.state(), expected);
        assert_eq!(recorded(&calls), vec![Call::Permission]);
        assert!(!controller.is_loading());
    }

    #[tokio::test]
    async fn permission_request_failure_is_position_unavailable() {
        let provider =
            ScriptedProvider::default().permission(Err(anyhow!("permission service crashed")));
        let calls = provider.calls();
        let controller = ScreenController::new(Box::new(provider));

        controller.fetch_location().await;

        assert_eq!(controller.state(), ScreenState::Error("permission service crashed".into()));
        assert_eq!(recorded(&calls), vec![Call::Permission]);
    }

    #[tokio::test]
    async fn granted_position_becomes_ready_with_exact_sample() {
        let sample = googleplex();
        let provider = ScriptedProvider::default()
            .permission(Ok(PermissionResponse::granted()))
            .position(Ok(sample.clone()));
        let controller = ScreenController::new(Box::new(provider));

        controller.fetch_location().await;

        assert_eq!(controller.state(), ScreenState::Ready(sample));
    }

    #[tokio::test]
    async fn position_timeout_shows_its_description() {
        let provider = ScriptedProvider::default()
            .permission(Ok(PermissionResponse::granted()))
            .position(Err(anyhow!("Location request timed out")));
        let controller = ScreenController::new(Box::new(provider));

        controller.fetch_location().await;

        assert_eq!(controller.state(), ScreenState::Error("Location request timed out".into()));
        assert!(!controller.is_loading());
    }

    #[tokio::test]
    async fn non_finite_sample_is_rejected() {
        let provider = ScriptedProvider::default()
            .permission(Ok(PermissionResponse::granted()))
            .position(Ok(LocationSample::now(Coordinates::new(f64::NAN, 10.0))));
        let controller = ScreenController::new(Box::new(provider));

        controller.fetch_location().await;

        match controller.state() {
            ScreenState::Error(message) => assert!(message.contains("coordenadas inválidas")),
            other => panic!("expected error state, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn loading_is_set_before_the_fetch_is_polled() {
        let (tx, rx) = oneshot::channel();
        let provider = ScriptedProvider::default()
            .permission(Ok(PermissionResponse::granted()))
            .gated_position(rx);
        let controller = ScreenController::new(Box::new(provider));

        let fetch = controller.fetch_location();
        assert!(controller.is_loading());

        tx.send(Ok(googleplex())).unwrap();
        fetch.await;
        assert!(!controller.is_loading());
    }

    #[tokio::test]
    async fn retry_is_rejected_outside_the_error_view() {
        let provider = ScriptedProvider::default()
            .permission(Ok(PermissionResponse::granted()))
            .position(Ok(googleplex()));
        let calls = provider.calls();
        let controller = ScreenController::new(Box::new(provider));

        assert_eq!(
            controller.retry().err(),
            Some(ScreenError::RetryUnavailable { state: "loading" })
        );

        controller.fetch_location().await;

        assert_eq!(controller.retry().err(), Some(ScreenError::RetryUnavailable { state: "ready" }));
        assert_eq!(recorded(&calls).len(), 2);
    }

    #[tokio::test]
    async fn retry_after_denial_goes_through_loading_to_ready() {
        let sample = googleplex();
        let provider = ScriptedProvider::default()
            .permission(Ok(PermissionResponse::denied()))
            .permission(Ok(PermissionResponse::granted()))
            .position(Ok(sample.clone()));
        let calls = provider.calls();
        let controller = ScreenController::new(Box::new(provider));
        let mut states = controller.subscribe();

        controller.fetch_location().await;
        assert_eq!(
            *states.borrow_and_update(),
            ScreenState::Error(PERMISSION_DENIED_MESSAGE.to_string())
        );

        let retry = controller.retry().expect("retry must be available from the error view");
        assert!(states.has_changed().unwrap());
        assert_eq!(*states.borrow_and_update(), ScreenState::Loading);

        let outcome = retry.await;

        assert_eq!(outcome, FetchOutcome::Applied(ScreenState::Ready(sample.clone())));
        assert_eq!(*states.borrow_and_update(), ScreenState::Ready(sample));
        assert_eq!(
            recorded(&calls),
            vec![Call::Permission, Call::Permission, Call::Position]
        );
        assert_eq!(controller.latest_attempt(), 2);
    }

    #[tokio::test]
    async fn stale_attempt_cannot_overwrite_newer_result() {
        let (stale_tx, stale_rx) = oneshot::channel();
        let fresh = googleplex();
        let provider = ScriptedProvider::default()
            .permission(Ok(PermissionResponse::granted()))
            .permission(Ok(PermissionResponse::granted()))
            .gated_position(stale_rx)
            .position(Ok(fresh.clone()));
        let controller = ScreenController::new(Box::new(provider));

        let stale = controller.fetch_location();
        let newer = controller.fetch_location();

        let (stale_outcome, newer_outcome) = tokio::join!(stale, async {
            let outcome = newer.await;
            stale_tx.send(Err(anyhow!("timed out"))).unwrap();
            outcome
        });

        assert_eq!(newer_outcome, FetchOutcome::Applied(ScreenState::Ready(fresh.clone())));
        assert_eq!(stale_outcome, FetchOutcome::Superseded { attempt: 1, latest: 2 });
        assert_eq!(controller.state(), ScreenState::Ready(fresh));
    }
}
