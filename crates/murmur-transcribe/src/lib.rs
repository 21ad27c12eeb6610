//! Transcription pipeline: cloud ASR, LLM text enhancement, and on-device
//! fallback recognition.
//!
//! Provides trait-based abstractions for the three external recognizers,
//! the cascading orchestrator that combines them, and an HTTP gateway
//! implementation speaking to the cloud backend. Mock implementations are
//! included for testing without network access or a microphone.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use murmur_core::error::{MurmurError, Result};

pub mod orchestrator;
pub mod remote;

pub use orchestrator::TranscriptionOrchestrator;
pub use remote::HttpSpeechGateway;

// =============================================================================
// Result types
// =============================================================================

/// A successful cloud ASR response.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudTranscript {
    /// Raw transcribed text.
    pub text: String,
    /// Service-reported confidence (0.0 to 1.0).
    pub confidence: f32,
}

/// Final result of one pipeline run. Intermediate stage results are not
/// persisted; only this outcome reaches the dictation state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptionOutcome {
    /// The pipeline produced text. `confidence` is the cloud service's
    /// score when the cloud path succeeded, `None` when the on-device
    /// fallback produced the text.
    Transcribed {
        text: String,
        confidence: Option<f32>,
    },
    /// Every stage failed.
    Failed { reason: String },
}

// =============================================================================
// Traits
// =============================================================================

/// Remote automatic-speech-recognition service.
pub trait CloudSpeechClient: Send + Sync {
    /// Transcribe an encoded audio recording.
    fn transcribe(
        &self,
        audio: &[u8],
        filename: &str,
    ) -> impl Future<Output = Result<CloudTranscript>> + Send;
}

/// Language-model cleanup of a raw transcript: filler-word removal,
/// grammar, punctuation, and capitalization, preserving meaning.
pub trait TextEnhancer: Send + Sync {
    fn enhance(&self, raw: &str) -> impl Future<Output = Result<String>> + Send;
}

/// On-device speech recognition on the live microphone.
///
/// The platform recognizer is callback-driven; implementations wrap it into
/// a single completion that resolves with the best-match string or an error.
pub trait OnDeviceRecognizer: Send + Sync {
    fn listen(&self) -> impl Future<Output = Result<String>> + Send;
}

impl<T: CloudSpeechClient> CloudSpeechClient for std::sync::Arc<T> {
    async fn transcribe(&self, audio: &[u8], filename: &str) -> Result<CloudTranscript> {
        (**self).transcribe(audio, filename).await
    }
}

impl<T: TextEnhancer> TextEnhancer for std::sync::Arc<T> {
    async fn enhance(&self, raw: &str) -> Result<String> {
        (**self).enhance(raw).await
    }
}

impl<T: OnDeviceRecognizer> OnDeviceRecognizer for std::sync::Arc<T> {
    async fn listen(&self) -> Result<String> {
        (**self).listen().await
    }
}

// =============================================================================
// Mock implementations
// =============================================================================

enum MockReply {
    Text(String),
    Error(String),
}

/// Mock cloud ASR client with a fixed reply and a call counter.
pub struct MockCloudSpeechClient {
    reply: Mutex<MockReply>,
    confidence: f32,
    calls: AtomicUsize,
}

impl MockCloudSpeechClient {
    pub fn succeeding(text: &str, confidence: f32) -> Self {
        Self {
            reply: Mutex::new(MockReply::Text(text.to_string())),
            confidence,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Mutex::new(MockReply::Error(message.to_string())),
            confidence: 0.0,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl CloudSpeechClient for MockCloudSpeechClient {
    async fn transcribe(&self, audio: &[u8], _filename: &str) -> Result<CloudTranscript> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if audio.is_empty() {
            return Err(MurmurError::Transcription(
                "Empty audio payload".to_string(),
            ));
        }
        match &*self.reply.lock().expect("reply mutex poisoned") {
            MockReply::Text(text) => Ok(CloudTranscript {
                text: text.clone(),
                confidence: self.confidence,
            }),
            MockReply::Error(message) => Err(MurmurError::Transcription(message.clone())),
        }
    }
}

/// Mock text enhancer with a fixed reply and a call counter.
pub struct MockTextEnhancer {
    reply: Mutex<MockReply>,
    calls: AtomicUsize,
}

impl MockTextEnhancer {
    pub fn succeeding(text: &str) -> Self {
        Self {
            reply: Mutex::new(MockReply::Text(text.to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Mutex::new(MockReply::Error(message.to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl TextEnhancer for MockTextEnhancer {
    async fn enhance(&self, _raw: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        match &*self.reply.lock().expect("reply mutex poisoned") {
            MockReply::Text(text) => Ok(text.clone()),
            MockReply::Error(message) => Err(MurmurError::Transcription(message.clone())),
        }
    }
}

/// Mock on-device recognizer with a fixed reply and a call counter.
pub struct MockOnDeviceRecognizer {
    reply: Mutex<MockReply>,
    calls: AtomicUsize,
}

impl MockOnDeviceRecognizer {
    pub fn succeeding(text: &str) -> Self {
        Self {
            reply: Mutex::new(MockReply::Text(text.to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Mutex::new(MockReply::Error(message.to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl OnDeviceRecognizer for MockOnDeviceRecognizer {
    async fn listen(&self) -> Result<String> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        match &*self.reply.lock().expect("reply mutex poisoned") {
            MockReply::Text(text) => Ok(text.clone()),
            MockReply::Error(message) => Err(MurmurError::Transcription(message.clone())),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
