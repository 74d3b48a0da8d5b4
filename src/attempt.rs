use std::{future::Future, time::Duration};

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::FlowError;

/// One generation attempt. Cancelling the token supersedes it.
#[derive(Debug)]
pub(crate) struct Attempt {
    pub id: Uuid,
    pub token: CancellationToken,
}

impl Attempt {
    pub fn start() -> Self {
        Self { id: Uuid::new_v4(), token: CancellationToken::new() }
    }

    pub fn is_live(&self, id: Uuid) -> bool {
        self.id == id && !self.token.is_cancelled()
    }
}

/// Runs `on_abandon` when dropped before `disarm`, which is what happens when
/// the caller stops polling a generation halfway (a client that disconnects).
pub(crate) struct AbandonGuard<F: FnOnce()> {
    on_abandon: Option<F>,
}

impl<F: FnOnce()> AbandonGuard<F> {
    pub fn new(on_abandon: F) -> Self {
        Self { on_abandon: Some(on_abandon) }
    }

    pub fn disarm(mut self) {
        self.on_abandon = None;
    }
}

impl<F: FnOnce()> Drop for AbandonGuard<F> {
    fn drop(&mut self) {
        if let Some(on_abandon) = self.on_abandon.take() {
            on_abandon();
        }
    }
}

/// Races a remote call against supersession and the deadline.
pub(crate) async fn guarded<T, F>(token: &CancellationToken, deadline: Duration, call: F) -> Result<T, FlowError>
where
    F: Future<Output = Result<T, FlowError>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(FlowError::Superseded),
        outcome = tokio::time::timeout(deadline, call) => match outcome {
            Ok(result) => result,
            Err(_) => Err(FlowError::Timeout(deadline)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancelled_token_wins_over_a_ready_call() {
        let attempt = Attempt::start();
        attempt.token.cancel();
        let out = guarded(&attempt.token, Duration::from_secs(1), async { Ok::<_, FlowError>(1) }).await;
        assert!(matches!(out, Err(FlowError::Superseded)));
        assert!(!attempt.is_live(attempt.id));
    }

    #[test]
    fn abandon_guard_fires_only_when_not_disarmed() {
        let fired = std::cell::Cell::new(0);
        drop(AbandonGuard::new(|| fired.set(fired.get() + 1)));
        AbandonGuard::new(|| fired.set(fired.get() + 10)).disarm();
        assert_eq!(fired.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_maps_to_timeout() {
        let token = CancellationToken::new();
        let out: Result<(), FlowError> = guarded(&token, Duration::from_millis(50), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await;
        assert!(matches!(out, Err(FlowError::Timeout(d)) if d == Duration::from_millis(50)));
    }
}
