//! Audio capture for dictation sessions.
//!
//! Owns the capture device resource and the lifecycle of the temporary
//! recording file. Exactly one capture session may be open at a time; a
//! finished session yields an [`AudioArtifact`] whose ownership transfers
//! to the transcription pipeline.

pub mod artifact;
pub mod recorder;

pub use artifact::AudioArtifact;
pub use recorder::{CaptureDevice, MockCaptureDevice, RecorderState, RecordingSessionManager};
