//! Dictation state machine with validated transitions.
//!
//! Enforces the dictation lifecycle:
//! - Idle -> Recording (trigger activated, capture started)
//! - Idle -> Error (capture failed to start)
//! - Recording -> Processing (capture stopped, pipeline running)
//! - Recording -> Error (capture failed to stop)
//! - Recording -> Idle (cancel)
//! - Processing -> Success (pipeline produced text)
//! - Processing -> Error (pipeline failed)
//! - Success/Error -> Recording (re-activation starts a new session)
//! - Success/Error -> Error (re-activation or injection failed)

use std::fmt;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use murmur_core::error::{MurmurError, Result};

/// The single authoritative dictation state observed by the UI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictationState {
    /// No session in progress. Ready to start.
    Idle,
    /// Audio capture is running.
    Recording,
    /// The transcription pipeline is running. Re-activation is ignored.
    Processing,
    /// The pipeline produced text; it has been handed to the injector.
    Success { text: String },
    /// A session failed; the message is user-visible.
    Error { message: String },
}

impl fmt::Display for DictationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DictationState::Idle => write!(f, "Idle"),
            DictationState::Recording => write!(f, "Recording"),
            DictationState::Processing => write!(f, "Processing"),
            DictationState::Success { .. } => write!(f, "Success"),
            DictationState::Error { .. } => write!(f, "Error"),
        }
    }
}

impl DictationState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &DictationState) -> bool {
        use DictationState::*;
        matches!(
            (self, target),
            (Idle, Recording)
                | (Idle, Error { .. })
                | (Recording, Processing)
                | (Recording, Error { .. })
                // Cancel
                | (Recording, Idle)
                | (Processing, Success { .. })
                | (Processing, Error { .. })
                // Terminal display states are also launch points
                | (Success { .. }, Recording)
                | (Error { .. }, Recording)
                // Injection double-failure / repeated start failure
                | (Success { .. }, Error { .. })
                | (Error { .. }, Error { .. })
        )
    }

    /// Whether this is one of the terminal display states.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DictationState::Success { .. } | DictationState::Error { .. }
        )
    }
}

/// Thread-safe owner of the dictation state.
///
/// Transitions are validated before being applied; every applied transition
/// is broadcast on a watch channel for UI observation.
#[derive(Debug, Clone)]
pub struct StateMachine {
    state: Arc<Mutex<DictationState>>,
    tx: watch::Sender<DictationState>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    /// Create a new state machine initialized to `Idle`.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(DictationState::Idle);
        Self {
            state: Arc::new(Mutex::new(DictationState::Idle)),
            tx,
        }
    }

    /// Returns a clone of the current state.
    pub fn current(&self) -> DictationState {
        self.state.lock().expect("state mutex poisoned").clone()
    }

    /// Observe state changes. The receiver immediately holds the current
    /// state.
    pub fn subscribe(&self) -> watch::Receiver<DictationState> {
        self.tx.subscribe()
    }

    /// Attempt to transition to the target state.
    pub fn transition(&self, target: DictationState) -> Result<()> {
        let mut state = self.state.lock().expect("state mutex poisoned");
        if state.can_transition_to(&target) {
            tracing::debug!("Dictation state: {} -> {}", *state, target);
            *state = target.clone();
            let _ = self.tx.send(target);
            Ok(())
        } else {
            Err(MurmurError::Dictation(format!(
                "Invalid state transition: {} -> {}",
                *state, target
            )))
        }
    }

    /// Force the state machine back to Idle (error recovery).
    pub fn reset(&self) {
        let mut state = self.state.lock().expect("state mutex poisoned");
        tracing::warn!("Dictation state machine reset to Idle from {}", *state);
        *state = DictationState::Idle;
        let _ = self.tx.send(DictationState::Idle);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn success() -> DictationState {
        DictationState::Success {
            text: "hello".to_string(),
        }
    }

    fn error() -> DictationState {
        DictationState::Error {
            message: "boom".to_string(),
        }
    }

    #[test]
    fn test_state_display() {
        assert_eq!(DictationState::Idle.to_string(), "Idle");
        assert_eq!(DictationState::Recording.to_string(), "Recording");
        assert_eq!(DictationState::Processing.to_string(), "Processing");
        assert_eq!(success().to_string(), "Success");
        assert_eq!(error().to_string(), "Error");
    }

    #[test]
    fn test_valid_transitions() {
        use DictationState::*;
        assert!(Idle.can_transition_to(&Recording));
        assert!(Idle.can_transition_to(&error()));
        assert!(Recording.can_transition_to(&Processing));
        assert!(Recording.can_transition_to(&error()));
        assert!(Recording.can_transition_to(&Idle));
        assert!(Processing.can_transition_to(&success()));
        assert!(Processing.can_transition_to(&error()));
        assert!(success().can_transition_to(&Recording));
        assert!(error().can_transition_to(&Recording));
        assert!(success().can_transition_to(&error()));
        assert!(error().can_transition_to(&error()));
    }

    #[test]
    fn test_invalid_transitions() {
        use DictationState::*;
        // Cannot skip states
        assert!(!Idle.can_transition_to(&Processing));
        assert!(!Idle.can_transition_to(&success()));
        // A running pipeline cannot be re-activated
        assert!(!Processing.can_transition_to(&Recording));
        assert!(!Processing.can_transition_to(&Idle));
        // Terminal states never go back to Idle or Processing directly
        assert!(!success().can_transition_to(&Idle));
        assert!(!success().can_transition_to(&Processing));
        assert!(!error().can_transition_to(&Processing));
        // No self-transitions outside Error -> Error
        assert!(!Idle.can_transition_to(&Idle));
        assert!(!Recording.can_transition_to(&Recording));
        assert!(!Processing.can_transition_to(&Processing));
    }

    #[test]
    fn test_is_terminal() {
        assert!(success().is_terminal());
        assert!(error().is_terminal());
        assert!(!DictationState::Idle.is_terminal());
        assert!(!DictationState::Processing.is_terminal());
    }

    #[test]
    fn test_happy_path() {
        let sm = StateMachine::new();
        assert_eq!(sm.current(), DictationState::Idle);

        sm.transition(DictationState::Recording).unwrap();
        sm.transition(DictationState::Processing).unwrap();
        sm.transition(success()).unwrap();
        assert_eq!(
            sm.current(),
            DictationState::Success {
                text: "hello".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_transition_keeps_state() {
        let sm = StateMachine::new();
        let result = sm.transition(DictationState::Processing);
        assert!(result.is_err());
        assert_eq!(sm.current(), DictationState::Idle);
    }

    #[test]
    fn test_reentry_from_terminal_states() {
        let sm = StateMachine::new();
        sm.transition(DictationState::Recording).unwrap();
        sm.transition(DictationState::Processing).unwrap();
        sm.transition(error()).unwrap();

        sm.transition(DictationState::Recording).unwrap();
        assert_eq!(sm.current(), DictationState::Recording);
    }

    #[test]
    fn test_cancel_from_recording() {
        let sm = StateMachine::new();
        sm.transition(DictationState::Recording).unwrap();
        sm.transition(DictationState::Idle).unwrap();
        assert_eq!(sm.current(), DictationState::Idle);
    }

    #[test]
    fn test_watch_observes_transitions() {
        let sm = StateMachine::new();
        let rx = sm.subscribe();
        assert_eq!(*rx.borrow(), DictationState::Idle);

        sm.transition(DictationState::Recording).unwrap();
        assert_eq!(*rx.borrow(), DictationState::Recording);
    }

    #[test]
    fn test_clone_is_shared() {
        let sm1 = StateMachine::new();
        let sm2 = sm1.clone();
        sm1.transition(DictationState::Recording).unwrap();
        assert_eq!(sm2.current(), DictationState::Recording);
    }

    #[test]
    fn test_reset() {
        let sm = StateMachine::new();
        sm.transition(DictationState::Recording).unwrap();
        sm.transition(DictationState::Processing).unwrap();
        sm.reset();
        assert_eq!(sm.current(), DictationState::Idle);
    }

    #[test]
    fn test_transition_error_message() {
        let sm = StateMachine::new();
        let result = sm.transition(success());
        match result {
            Err(MurmurError::Dictation(msg)) => {
                assert!(msg.contains("Idle"));
                assert!(msg.contains("Success"));
            }
            _ => panic!("Expected Dictation error variant"),
        }
    }
}
