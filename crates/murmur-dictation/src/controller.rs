//! The dictation controller: top-level coordinator for a dictation session.
//!
//! Routes accessibility events into the focus tracker, drives the overlay
//! surfaces, and runs the record -> transcribe -> inject cycle under the
//! state machine's supervision. Activation while a pipeline is running is
//! ignored; every other failure lands in the `Error` display state.

use tracing::{debug, info, warn};

use murmur_audio::{CaptureDevice, RecordingSessionManager};
use murmur_core::events::AccessibilityEvent;
use murmur_focus::FocusTracker;
use murmur_overlay::OverlayController;
use murmur_transcribe::{
    CloudSpeechClient, OnDeviceRecognizer, TextEnhancer, TranscriptionOrchestrator,
    TranscriptionOutcome,
};

use crate::inject::{InjectionDelivery, TextInjector};
use crate::state::{DictationState, StateMachine};

/// Owns every component of the dictation pipeline and sequences one
/// dictation session at a time.
pub struct DictationController<D, C, E, R>
where
    D: CaptureDevice,
    C: CloudSpeechClient,
    E: TextEnhancer,
    R: OnDeviceRecognizer,
{
    state: StateMachine,
    focus: FocusTracker,
    recorder: RecordingSessionManager<D>,
    pipeline: TranscriptionOrchestrator<C, E, R>,
    injector: TextInjector,
    overlay: OverlayController,
}

impl<D, C, E, R> DictationController<D, C, E, R>
where
    D: CaptureDevice,
    C: CloudSpeechClient,
    E: TextEnhancer,
    R: OnDeviceRecognizer,
{
    pub fn new(
        recorder: RecordingSessionManager<D>,
        pipeline: TranscriptionOrchestrator<C, E, R>,
        injector: TextInjector,
        overlay: OverlayController,
    ) -> Self {
        Self {
            state: StateMachine::new(),
            focus: FocusTracker::new(),
            recorder,
            pipeline,
            injector,
            overlay,
        }
    }

    /// Current dictation state.
    pub fn state(&self) -> DictationState {
        self.state.current()
    }

    /// Observe dictation state changes.
    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<DictationState> {
        self.state.subscribe()
    }

    /// The focus tracker fed by `handle_event`.
    pub fn focus(&self) -> &FocusTracker {
        &self.focus
    }

    /// The overlay controller driving the floating surfaces.
    pub fn overlay(&self) -> &OverlayController {
        &self.overlay
    }

    /// Route one accessibility event and update trigger visibility.
    pub fn handle_event(&self, event: AccessibilityEvent) {
        self.focus.handle_event(event);
        self.overlay
            .on_focus_changed(self.focus.has_eligible_target());
    }

    /// Start a dictation session.
    ///
    /// Ignored while recording or while a pipeline is running; a capture
    /// start failure lands in `Error`.
    pub async fn activate(&self) {
        match self.state.current() {
            DictationState::Recording | DictationState::Processing => {
                debug!("Activation ignored, session already in progress");
                return;
            }
            _ => {}
        }

        match self.recorder.start_recording().await {
            Ok(()) => {
                self.apply(DictationState::Recording);
                self.overlay.show_indicator();
                info!("Dictation session started");
            }
            Err(e) => {
                warn!(error = %e, "Could not start dictation session");
                self.fail(e.to_string());
            }
        }
    }

    /// Stop recording and run the transcription pipeline to completion,
    /// injecting the resulting text into the focused element.
    pub async fn deactivate(&self) {
        if self.state.current() != DictationState::Recording {
            debug!("Deactivation ignored, no recording in progress");
            return;
        }

        let Some(artifact) = self.recorder.stop_recording().await else {
            self.fail("Failed to stop recording".to_string());
            self.overlay.hide_indicator();
            return;
        };

        self.apply(DictationState::Processing);
        match self.pipeline.transcribe(artifact).await {
            TranscriptionOutcome::Transcribed { text, confidence } => {
                info!(
                    text_len = text.len(),
                    confidence = confidence.unwrap_or(f32::NAN),
                    "Dictation transcribed"
                );
                self.apply(DictationState::Success { text: text.clone() });

                let delivery = self
                    .focus
                    .with_current(|target| self.injector.insert(&text, target));
                match delivery {
                    Ok(InjectionDelivery::ClipboardOnly) => {
                        warn!("Paste unavailable, dictated text left on clipboard");
                    }
                    Ok(delivery) => debug!(?delivery, "Dictated text injected"),
                    Err(e) => {
                        warn!(error = %e, "Failed to inject dictated text");
                        self.fail(e.to_string());
                    }
                }
            }
            TranscriptionOutcome::Failed { reason } => {
                self.fail(reason);
            }
        }
        self.overlay.hide_indicator();
    }

    /// Cancel the recording session, discarding the audio. Nothing reaches
    /// the pipeline.
    pub async fn cancel(&self) {
        if self.state.current() != DictationState::Recording {
            debug!("Cancel ignored, no recording in progress");
            return;
        }
        self.recorder.cancel_recording().await;
        self.apply(DictationState::Idle);
        self.overlay.hide_indicator();
        info!("Dictation session cancelled");
    }

    fn apply(&self, target: DictationState) {
        if let Err(e) = self.state.transition(target) {
            warn!(error = %e, "Dictation state transition rejected");
        }
    }

    fn fail(&self, message: String) {
        self.apply(DictationState::Error { message });
    }
}

// =============================================================================
// Tests
// =============================================================================
