use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, error};
use uuid::Uuid;

use crate::{
    adapter,
    attempt::{guarded, AbandonGuard, Attempt},
    error::FlowError,
    gemini::GenerativeService,
    models::{DesignRequest, DesignResult},
    state::{GenerationState, ResultStateMachine},
};

/// What the presentation layer renders for the design flow.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DesignSnapshot {
    pub state: GenerationState,
    pub result: DesignResult,
    pub error: Option<String>,
    pub transitions: Vec<GenerationState>,
    pub attempt_id: Option<Uuid>,
}

#[derive(Default)]
struct Inner {
    machine: ResultStateMachine,
    result: DesignResult,
    attempt: Option<Attempt>,
}

/// Sequential image-then-list workflow. One attempt is live at a time; a new
/// submit cancels the previous attempt and its late results are dropped.
pub struct DesignOrchestrator {
    service: Arc<dyn GenerativeService>,
    timeout: Duration,
    inner: Mutex<Inner>,
}

impl DesignOrchestrator {
    pub fn new(service: Arc<dyn GenerativeService>, timeout: Duration) -> Self {
        Self { service, timeout, inner: Mutex::new(Inner::default()) }
    }

    pub fn snapshot(&self) -> DesignSnapshot {
        let inner = self.inner.lock();
        DesignSnapshot {
            state: inner.machine.state(),
            result: inner.result.clone(),
            error: inner.machine.error().map(str::to_string),
            transitions: inner.machine.log().to_vec(),
            attempt_id: inner.attempt.as_ref().map(|a| a.id),
        }
    }

    /// Any state → Idle. Cancels the live attempt, if any.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        if let Some(attempt) = inner.attempt.take() {
            attempt.token.cancel();
        }
        inner.machine.reset();
        inner.result = DesignResult::default();
        info!("🔄 Design flow reset");
    }

    /// Runs one full generation cycle. The returned error has already been
    /// recorded in the snapshot, except `Superseded`, which leaves state alone.
    pub async fn submit(&self, request: DesignRequest) -> Result<DesignSnapshot, FlowError> {
        let (id, token) = self.begin();
        info!("🚀 Design generation {} started: {} / {}㎡ / {} / {}", id, request.layout, request.area, request.orientation, request.style);

        let guard = AbandonGuard::new(|| self.abandon(id));
        let outcome = self.run(id, &token, &request).await;
        guard.disarm();

        match outcome {
            Ok(()) => {
                info!("✅ Design generation {} completed", id);
                Ok(self.snapshot())
            }
            Err(FlowError::Superseded) => {
                warn!("⏭️ Design generation {} superseded, discarding its results", id);
                Err(FlowError::Superseded)
            }
            Err(e) => {
                error!("❌ Design generation {} failed: {}", id, e);
                self.apply(id, |inner| Ok(inner.machine.fail(&e)?))?;
                Err(e)
            }
        }
    }

    fn begin(&self) -> (Uuid, CancellationToken) {
        let mut inner = self.inner.lock();
        if let Some(previous) = inner.attempt.take() {
            previous.token.cancel();
        }
        let attempt = Attempt::start();
        let handle = (attempt.id, attempt.token.clone());
        inner.attempt = Some(attempt);
        inner.result = DesignResult::default();
        inner.machine.submit();
        handle
    }

    async fn run(&self, id: Uuid, token: &CancellationToken, request: &DesignRequest) -> Result<(), FlowError> {
        let image = guarded(token, self.timeout, adapter::render_design(self.service.as_ref(), request)).await?;
        self.apply(id, |inner| {
            inner.result.settle_image(image);
            Ok(inner.machine.primary_settled()?)
        })?;

        // The list call is only issued once the image step has settled.
        let list = guarded(token, self.timeout, adapter::furniture_list(self.service.as_ref(), request)).await?;
        self.apply(id, |inner| {
            inner.result.settle_furniture(list);
            Ok(inner.machine.secondary_settled()?)
        })
    }

    /// The caller dropped `submit` mid-cycle. A still-live attempt is cancelled
    /// and failed so the flow never stays in a generating state.
    fn abandon(&self, id: Uuid) {
        let mut inner = self.inner.lock();
        if !inner.attempt.as_ref().is_some_and(|a| a.is_live(id)) {
            return;
        }
        if let Some(attempt) = inner.attempt.take() {
            attempt.token.cancel();
        }
        warn!("🛑 Design generation {} abandoned by its caller", id);
        if let Err(e) = inner.machine.fail(&FlowError::Abandoned) {
            warn!("⚠️ Could not fail abandoned design generation {}: {}", id, e);
        }
    }

    /// Mutates shared state only if `id` is still the live attempt.
    fn apply<F>(&self, id: Uuid, f: F) -> Result<(), FlowError>
    where
        F: FnOnce(&mut Inner) -> Result<(), FlowError>,
    {
        let mut inner = self.inner.lock();
        match &inner.attempt {
            Some(attempt) if attempt.is_live(id) => f(&mut inner),
            _ => Err(FlowError::Superseded),
        }
    }
}
