//! Recording session management.
//!
//! The session manager owns the capture device and enforces the
//! `Idle -> Recording -> Idle` lifecycle: one open session at most, failed
//! starts leave no partial resources behind, and cancellation deletes the
//! output file.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use murmur_core::error::{MurmurError, Result};

use crate::artifact::AudioArtifact;

/// State of the audio capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    /// No capture in progress.
    Idle,
    /// Actively capturing audio to the output file.
    Recording,
}

/// A microphone capture device writing an encoded stream to a file.
///
/// Implementations wrap the platform recorder. All three operations are
/// asynchronous; `abort` discards the stream without producing a playable
/// file.
pub trait CaptureDevice: Send + Sync {
    /// Allocate the device and begin capturing to `output`.
    fn start(&self, output: &Path) -> impl Future<Output = Result<()>> + Send;

    /// Stop capturing and finalize the output file.
    fn finalize(&self) -> impl Future<Output = Result<()>> + Send;

    /// Stop capturing and discard the stream.
    fn abort(&self) -> impl Future<Output = Result<()>> + Send;
}

impl<T: CaptureDevice> CaptureDevice for std::sync::Arc<T> {
    async fn start(&self, output: &Path) -> Result<()> {
        (**self).start(output).await
    }

    async fn finalize(&self) -> Result<()> {
        (**self).finalize().await
    }

    async fn abort(&self) -> Result<()> {
        (**self).abort().await
    }
}

struct SessionInner {
    state: RecorderState,
    output: Option<PathBuf>,
    session_id: Option<Uuid>,
}

/// Owns the capture device and the current recording session.
pub struct RecordingSessionManager<D: CaptureDevice> {
    device: D,
    recordings_dir: PathBuf,
    inner: Mutex<SessionInner>,
}

impl<D: CaptureDevice> RecordingSessionManager<D> {
    pub fn new(device: D, recordings_dir: PathBuf) -> Self {
        Self {
            device,
            recordings_dir,
            inner: Mutex::new(SessionInner {
                state: RecorderState::Idle,
                output: None,
                session_id: None,
            }),
        }
    }

    pub fn state(&self) -> RecorderState {
        self.inner.lock().expect("session mutex poisoned").state
    }

    pub fn is_recording(&self) -> bool {
        self.state() == RecorderState::Recording
    }

    /// Open a capture session.
    ///
    /// Fails if a session is already open, or if the device or output file
    /// cannot be allocated; on failure the state is `Idle` and any partial
    /// output file has been removed.
    pub async fn start_recording(&self) -> Result<()> {
        let (output, session_id) = {
            let mut guard = self.inner.lock().expect("session mutex poisoned");
            if guard.state == RecorderState::Recording {
                return Err(MurmurError::Recording(
                    "A capture session is already open".to_string(),
                ));
            }

            std::fs::create_dir_all(&self.recordings_dir)?;
            let name = format!("recording_{}.m4a", Utc::now().format("%Y%m%d_%H%M%S%3f"));
            let output = self.recordings_dir.join(name);
            let session_id = Uuid::new_v4();

            guard.state = RecorderState::Recording;
            guard.output = Some(output.clone());
            guard.session_id = Some(session_id);
            (output, session_id)
        };

        match self.device.start(&output).await {
            Ok(()) => {
                info!(
                    session_id = %session_id,
                    output = %output.display(),
                    "Recording started"
                );
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to start recording");
                self.reset_to_idle();
                let _ = std::fs::remove_file(&output);
                Err(e)
            }
        }
    }

    /// Close the capture session and return the finished artifact.
    ///
    /// Returns `None` when no session is open or when finalizing the device
    /// fails (the partial file is removed). State is `Idle` afterwards
    /// either way.
    pub async fn stop_recording(&self) -> Option<AudioArtifact> {
        {
            let guard = self.inner.lock().expect("session mutex poisoned");
            if guard.state != RecorderState::Recording {
                debug!("stop_recording called with no open session");
                return None;
            }
        }

        let finalize_result = self.device.finalize().await;

        let (output, session_id) = {
            let mut guard = self.inner.lock().expect("session mutex poisoned");
            guard.state = RecorderState::Idle;
            (guard.output.take(), guard.session_id.take())
        };
        let output = output?;

        match finalize_result {
            Ok(()) => match AudioArtifact::from_path(output.clone()) {
                Ok(artifact) => {
                    info!(
                        session_id = %session_id.unwrap_or_default(),
                        size_bytes = artifact.size_bytes(),
                        "Recording stopped"
                    );
                    Some(artifact)
                }
                Err(e) => {
                    warn!(error = %e, "Recording file missing after finalize");
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, "Failed to finalize recording");
                let _ = std::fs::remove_file(&output);
                None
            }
        }
    }

    /// Abort the capture session and delete its output file.
    ///
    /// Valid from any state; a no-op when no session is open.
    pub async fn cancel_recording(&self) {
        let output = {
            let mut guard = self.inner.lock().expect("session mutex poisoned");
            if guard.state != RecorderState::Recording {
                return;
            }
            guard.state = RecorderState::Idle;
            guard.session_id = None;
            guard.output.take()
        };

        if let Err(e) = self.device.abort().await {
            warn!(error = %e, "Capture device abort failed");
        }
        if let Some(path) = output {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(error = %e, "Failed to delete cancelled recording");
            }
        }
        info!("Recording cancelled");
    }

    fn reset_to_idle(&self) {
        let mut guard = self.inner.lock().expect("session mutex poisoned");
        guard.state = RecorderState::Idle;
        guard.output = None;
        guard.session_id = None;
    }
}

// =============================================================================
// Mock implementation
// =============================================================================

/// Mock capture device for testing.
///
/// Writes a fixed placeholder payload to the output file on `start` so a
/// finished session yields a non-empty artifact. Start and finalize
/// failures can be injected.
#[derive(Debug, Default)]
pub struct MockCaptureDevice {
    active: AtomicBool,
    fail_start: AtomicBool,
    fail_finalize: AtomicBool,
}

impl MockCaptureDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_start(&self) {
        self.fail_start.store(true, Ordering::Relaxed);
    }

    pub fn fail_next_finalize(&self) {
        self.fail_finalize.store(true, Ordering::Relaxed);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }
}

impl CaptureDevice for MockCaptureDevice {
    async fn start(&self, output: &Path) -> Result<()> {
        if self.fail_start.swap(false, Ordering::Relaxed) {
            return Err(MurmurError::Recording("Capture device busy".to_string()));
        }
        std::fs::write(output, b"mock-encoded-audio")?;
        self.active.store(true, Ordering::Relaxed);
        Ok(())
    }

    async fn finalize(&self) -> Result<()> {
        self.active.store(false, Ordering::Relaxed);
        if self.fail_finalize.swap(false, Ordering::Relaxed) {
            return Err(MurmurError::Recording(
                "Device error while finalizing".to_string(),
            ));
        }
        Ok(())
    }

    async fn abort(&self) -> Result<()> {
        self.active.store(false, Ordering::Relaxed);
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn manager_in(dir: &tempfile::TempDir) -> RecordingSessionManager<MockCaptureDevice> {
        RecordingSessionManager::new(MockCaptureDevice::new(), dir.path().to_path_buf())
    }

    fn recording_count(dir: &tempfile::TempDir) -> usize {
        std::fs::read_dir(dir.path()).unwrap().count()
    }

    #[tokio::test]
    async fn test_start_stop_produces_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(&dir);

        manager.start_recording().await.unwrap();
        assert_eq!(manager.state(), RecorderState::Recording);

        let artifact = manager.stop_recording().await.unwrap();
        assert_eq!(manager.state(), RecorderState::Idle);
        assert!(artifact.size_bytes() > 0);
        assert!(artifact.path().exists());
    }

    #[tokio::test]
    async fn test_double_start_fails_with_one_open_session() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(&dir);

        manager.start_recording().await.unwrap();
        let second = manager.start_recording().await;
        assert!(second.is_err());
        assert_eq!(manager.state(), RecorderState::Recording);
        assert_eq!(recording_count(&dir), 1);

        // The open session is still usable.
        assert!(manager.stop_recording().await.is_some());
    }

    #[tokio::test]
    async fn test_start_failure_leaves_idle_and_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(&dir);
        manager.device.fail_next_start();

        let result = manager.start_recording().await;
        assert!(result.is_err());
        assert_eq!(manager.state(), RecorderState::Idle);
        assert_eq!(recording_count(&dir), 0);

        // A later start succeeds.
        manager.start_recording().await.unwrap();
        assert!(manager.is_recording());
    }

    #[tokio::test]
    async fn test_stop_without_start_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(&dir);
        assert!(manager.stop_recording().await.is_none());
        assert_eq!(manager.state(), RecorderState::Idle);
    }

    #[tokio::test]
    async fn test_finalize_failure_returns_none_and_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(&dir);

        manager.start_recording().await.unwrap();
        manager.device.fail_next_finalize();

        assert!(manager.stop_recording().await.is_none());
        assert_eq!(manager.state(), RecorderState::Idle);
        assert_eq!(recording_count(&dir), 0);
    }

    #[tokio::test]
    async fn test_cancel_deletes_file_and_returns_idle() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(&dir);

        manager.start_recording().await.unwrap();
        assert_eq!(recording_count(&dir), 1);

        manager.cancel_recording().await;
        assert_eq!(manager.state(), RecorderState::Idle);
        assert_eq!(recording_count(&dir), 0);
        assert!(!manager.device.is_active());
    }

    #[tokio::test]
    async fn test_cancel_when_idle_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(&dir);
        manager.cancel_recording().await;
        assert_eq!(manager.state(), RecorderState::Idle);
    }

    #[tokio::test]
    async fn test_restart_after_full_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(&dir);

        manager.start_recording().await.unwrap();
        let artifact = manager.stop_recording().await.unwrap();
        artifact.delete().unwrap();

        manager.start_recording().await.unwrap();
        assert!(manager.is_recording());
        manager.cancel_recording().await;
        assert_eq!(recording_count(&dir), 0);
    }

    #[tokio::test]
    async fn test_stop_releases_device() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager_in(&dir);

        manager.start_recording().await.unwrap();
        assert!(manager.device.is_active());
        manager.stop_recording().await.unwrap();
        assert!(!manager.device.is_active());
    }
}
