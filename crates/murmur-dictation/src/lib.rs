//! Dictation orchestration: the authoritative state machine, the text
//! injector, and the top-level controller composing focus tracking, audio
//! capture, transcription, and overlay surfaces.

pub mod controller;
pub mod inject;
pub mod state;

pub use controller::DictationController;
pub use inject::{InjectionDelivery, TextInjector};
pub use state::{DictationState, StateMachine};
