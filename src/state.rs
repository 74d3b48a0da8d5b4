use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::error::FlowError;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationState {
    Idle,
    GeneratingPrimary,
    GeneratingSecondary,
    Completed,
    Failed,
}

impl GenerationState {
    pub fn is_generating(&self) -> bool {
        matches!(self, GenerationState::GeneratingPrimary | GenerationState::GeneratingSecondary)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("illegal transition {event} from {from:?}")]
pub struct TransitionError {
    pub from: GenerationState,
    pub event: &'static str,
}

/// Two-stage loading state for one flow instance.
#[derive(Debug, Clone)]
pub struct ResultStateMachine {
    state: GenerationState,
    error: Option<String>,
    log: Vec<GenerationState>,
}

impl Default for ResultStateMachine {
    fn default() -> Self {
        Self { state: GenerationState::Idle, error: None, log: vec![GenerationState::Idle] }
    }
}

impl ResultStateMachine {
    pub fn state(&self) -> GenerationState { self.state }

    pub fn error(&self) -> Option<&str> { self.error.as_deref() }

    /// States visited in the current cycle, starting with the state it was submitted from.
    pub fn log(&self) -> &[GenerationState] { &self.log }

    fn enter(&mut self, next: GenerationState) {
        self.state = next;
        self.log.push(next);
    }

    /// Any state → GeneratingPrimary. Starts a fresh cycle.
    pub fn submit(&mut self) {
        self.error = None;
        self.log = vec![self.state];
        self.enter(GenerationState::GeneratingPrimary);
    }

    pub fn primary_settled(&mut self) -> Result<(), TransitionError> {
        if self.state != GenerationState::GeneratingPrimary {
            return Err(TransitionError { from: self.state, event: "primary_settled" });
        }
        self.enter(GenerationState::GeneratingSecondary);
        Ok(())
    }

    pub fn secondary_settled(&mut self) -> Result<(), TransitionError> {
        if self.state != GenerationState::GeneratingSecondary {
            return Err(TransitionError { from: self.state, event: "secondary_settled" });
        }
        self.enter(GenerationState::Completed);
        Ok(())
    }

    /// Only reachable from a generating state; the message is picked from the error kind.
    pub fn fail(&mut self, err: &FlowError) -> Result<(), TransitionError> {
        if !self.state.is_generating() {
            return Err(TransitionError { from: self.state, event: "fail" });
        }
        self.error = Some(err.user_message().to_string());
        self.enter(GenerationState::Failed);
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CONFIG_ERROR_MESSAGE, GENERATION_ERROR_MESSAGE};
    use crate::gemini::GeminiError;
    use pretty_assertions::assert_eq;
    use GenerationState::*;

    #[test]
    fn happy_path_visits_every_stage() {
        let mut sm = ResultStateMachine::default();
        sm.submit();
        sm.primary_settled().unwrap();
        sm.secondary_settled().unwrap();
        assert_eq!(sm.log(), &[Idle, GeneratingPrimary, GeneratingSecondary, Completed]);
        assert_eq!(sm.error(), None);
    }

    #[test]
    fn rejects_out_of_order_events() {
        let mut sm = ResultStateMachine::default();
        assert_eq!(sm.primary_settled(), Err(TransitionError { from: Idle, event: "primary_settled" }));
        sm.submit();
        assert!(sm.secondary_settled().is_err());
        sm.primary_settled().unwrap();
        sm.secondary_settled().unwrap();
        assert!(sm.fail(&FlowError::Superseded).is_err());
    }

    #[test]
    fn failure_message_depends_on_error_kind() {
        let mut sm = ResultStateMachine::default();
        sm.submit();
        sm.fail(&GeminiError::MissingCredential.into()).unwrap();
        assert_eq!(sm.state(), Failed);
        assert_eq!(sm.error(), Some(CONFIG_ERROR_MESSAGE));

        sm.submit();
        assert_eq!(sm.error(), None);
        sm.primary_settled().unwrap();
        sm.fail(&GeminiError::Http("reset".into()).into()).unwrap();
        assert_eq!(sm.error(), Some(GENERATION_ERROR_MESSAGE));
        assert_eq!(sm.log(), &[Failed, GeneratingPrimary, GeneratingSecondary, Failed]);
    }

    #[test]
    fn reset_returns_to_idle_from_anywhere() {
        let mut sm = ResultStateMachine::default();
        sm.submit();
        sm.fail(&FlowError::Timeout(std::time::Duration::from_secs(1))).unwrap();
        sm.reset();
        assert_eq!(sm.state(), Idle);
        assert_eq!(sm.error(), None);
    }
}
