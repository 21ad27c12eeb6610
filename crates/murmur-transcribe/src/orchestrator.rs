//! The cascading transcription pipeline.
//!
//! Strict ordered cascade with three exit points:
//! 1. cloud ASR succeeds and enhancement succeeds -> enhanced text;
//! 2. cloud ASR succeeds and enhancement fails -> raw transcript
//!    (enhancement is cosmetic, it never triggers the fallback);
//! 3. cloud ASR fails -> on-device recognizer on the live microphone,
//!    whose result or error is final.
//! No stage is retried. The consumed artifact is deleted on every path.

use tracing::{debug, info, warn};

use murmur_audio::AudioArtifact;

use crate::{CloudSpeechClient, OnDeviceRecognizer, TextEnhancer, TranscriptionOutcome};

/// Runs the cloud -> enhance -> on-device cascade over one audio artifact.
pub struct TranscriptionOrchestrator<C, E, R>
where
    C: CloudSpeechClient,
    E: TextEnhancer,
    R: OnDeviceRecognizer,
{
    cloud: C,
    enhancer: E,
    fallback: R,
}

impl<C, E, R> TranscriptionOrchestrator<C, E, R>
where
    C: CloudSpeechClient,
    E: TextEnhancer,
    R: OnDeviceRecognizer,
{
    pub fn new(cloud: C, enhancer: E, fallback: R) -> Self {
        Self {
            cloud,
            enhancer,
            fallback,
        }
    }

    /// Run the full cascade, consuming the artifact.
    ///
    /// The artifact file is deleted before returning, whether the pipeline
    /// produced text or not.
    pub async fn transcribe(&self, artifact: AudioArtifact) -> TranscriptionOutcome {
        let outcome = self.run(&artifact).await;
        if let Err(e) = artifact.delete() {
            warn!(error = %e, "Failed to delete consumed audio artifact");
        }
        outcome
    }

    async fn run(&self, artifact: &AudioArtifact) -> TranscriptionOutcome {
        let filename = artifact.file_name();
        let audio = match artifact.read() {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "Recording unreadable, trying on-device recognition");
                return self.listen_on_device().await;
            }
        };

        match self.cloud.transcribe(&audio, &filename).await {
            Ok(transcript) => {
                debug!(
                    text_len = transcript.text.len(),
                    confidence = transcript.confidence,
                    "Cloud transcription succeeded"
                );
                let text = match self.enhancer.enhance(&transcript.text).await {
                    Ok(enhanced) => {
                        info!(text_len = enhanced.len(), "Transcript enhanced");
                        enhanced
                    }
                    Err(e) => {
                        // Cosmetic stage only: keep the raw transcript.
                        warn!(error = %e, "Enhancement failed, using raw transcript");
                        transcript.text
                    }
                };
                TranscriptionOutcome::Transcribed {
                    text,
                    confidence: Some(transcript.confidence),
                }
            }
            Err(e) => {
                warn!(error = %e, "Cloud transcription failed, falling back to on-device");
                self.listen_on_device().await
            }
        }
    }

    async fn listen_on_device(&self) -> TranscriptionOutcome {
        match self.fallback.listen().await {
            Ok(text) => {
                info!(text_len = text.len(), "On-device recognition succeeded");
                TranscriptionOutcome::Transcribed {
                    text,
                    confidence: None,
                }
            }
            Err(e) => {
                warn!(error = %e, "On-device recognition failed");
                TranscriptionOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MockCloudSpeechClient, MockOnDeviceRecognizer, MockTextEnhancer};

    fn artifact_in(dir: &tempfile::TempDir) -> AudioArtifact {
        let path = dir.path().join("recording_test.m4a");
        std::fs::write(&path, b"encoded-audio").unwrap();
        AudioArtifact::from_path(path).unwrap()
    }

    #[tokio::test]
    async fn test_cloud_and_enhancement_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = TranscriptionOrchestrator::new(
            MockCloudSpeechClient::succeeding("um so i think", 0.88),
            MockTextEnhancer::succeeding("I think."),
            MockOnDeviceRecognizer::succeeding("unused"),
        );

        let outcome = orchestrator.transcribe(artifact_in(&dir)).await;
        assert_eq!(
            outcome,
            TranscriptionOutcome::Transcribed {
                text: "I think.".to_string(),
                confidence: Some(0.88),
            }
        );
        assert_eq!(orchestrator.fallback.calls(), 0);
    }

    #[tokio::test]
    async fn test_enhancement_failure_keeps_raw_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = TranscriptionOrchestrator::new(
            MockCloudSpeechClient::succeeding("um so i think", 0.88),
            MockTextEnhancer::failing("model overloaded"),
            MockOnDeviceRecognizer::succeeding("unused"),
        );

        let outcome = orchestrator.transcribe(artifact_in(&dir)).await;
        assert_eq!(
            outcome,
            TranscriptionOutcome::Transcribed {
                text: "um so i think".to_string(),
                confidence: Some(0.88),
            }
        );
        // Enhancement failure never triggers the on-device fallback.
        assert_eq!(orchestrator.fallback.calls(), 0);
    }

    #[tokio::test]
    async fn test_cloud_failure_falls_back_to_on_device() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = TranscriptionOrchestrator::new(
            MockCloudSpeechClient::failing("network unreachable"),
            MockTextEnhancer::succeeding("unused"),
            MockOnDeviceRecognizer::succeeding("hello world"),
        );

        let outcome = orchestrator.transcribe(artifact_in(&dir)).await;
        assert_eq!(
            outcome,
            TranscriptionOutcome::Transcribed {
                text: "hello world".to_string(),
                confidence: None,
            }
        );
        assert_eq!(orchestrator.fallback.calls(), 1);
        // Enhancement is skipped entirely on the fallback path.
        assert_eq!(orchestrator.enhancer.calls(), 0);
    }

    #[tokio::test]
    async fn test_all_stages_fail() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = TranscriptionOrchestrator::new(
            MockCloudSpeechClient::failing("network unreachable"),
            MockTextEnhancer::succeeding("unused"),
            MockOnDeviceRecognizer::failing("recognizer error code 7"),
        );

        let outcome = orchestrator.transcribe(artifact_in(&dir)).await;
        match outcome {
            TranscriptionOutcome::Failed { reason } => {
                assert!(reason.contains("recognizer error code 7"));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_artifact_deleted_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact_in(&dir);
        let path = artifact.path().to_path_buf();

        let orchestrator = TranscriptionOrchestrator::new(
            MockCloudSpeechClient::succeeding("text", 0.9),
            MockTextEnhancer::succeeding("Text."),
            MockOnDeviceRecognizer::succeeding("unused"),
        );
        orchestrator.transcribe(artifact).await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_artifact_deleted_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact_in(&dir);
        let path = artifact.path().to_path_buf();

        let orchestrator = TranscriptionOrchestrator::new(
            MockCloudSpeechClient::failing("down"),
            MockTextEnhancer::succeeding("unused"),
            MockOnDeviceRecognizer::failing("also down"),
        );
        orchestrator.transcribe(artifact).await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_unreadable_artifact_uses_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = artifact_in(&dir);
        // Remove the file behind the artifact's back.
        std::fs::remove_file(artifact.path()).unwrap();

        let orchestrator = TranscriptionOrchestrator::new(
            MockCloudSpeechClient::succeeding("unused", 0.9),
            MockTextEnhancer::succeeding("unused"),
            MockOnDeviceRecognizer::succeeding("spoken live"),
        );
        let outcome = orchestrator.transcribe(artifact).await;
        assert_eq!(
            outcome,
            TranscriptionOutcome::Transcribed {
                text: "spoken live".to_string(),
                confidence: None,
            }
        );
        assert_eq!(orchestrator.cloud.calls(), 0);
    }

    #[tokio::test]
    async fn test_stages_called_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = TranscriptionOrchestrator::new(
            MockCloudSpeechClient::succeeding("raw", 0.8),
            MockTextEnhancer::succeeding("Raw."),
            MockOnDeviceRecognizer::succeeding("unused"),
        );
        orchestrator.transcribe(artifact_in(&dir)).await;
        assert_eq!(orchestrator.cloud.calls(), 1);
        assert_eq!(orchestrator.enhancer.calls(), 1);
        assert_eq!(orchestrator.fallback.calls(), 0);
    }
}
