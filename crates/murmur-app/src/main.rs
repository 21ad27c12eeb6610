//! Murmur application binary - composition root.
//!
//! Ties together all Murmur crates into a single executable:
//! 1. Load configuration from TOML
//! 2. Initialize tracing
//! 3. Build the dictation pipeline (focus -> record -> transcribe -> inject)
//! 4. Run a scripted dictation session against the in-memory platform hosts
//!
//! Real platform integration (accessibility tree, microphone, overlay
//! windows) is supplied by the host-specific service that embeds these
//! crates; this binary exercises the full pipeline end to end with the
//! in-memory hosts, using the real HTTP speech gateway when credentials
//! are configured.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use murmur_audio::{CaptureDevice, MockCaptureDevice, RecordingSessionManager};
use murmur_core::config::MurmurConfig;
use murmur_core::events::AccessibilityEvent;
use murmur_core::node::{
    AccessibilityHost, ClipboardService, MockAccessibilityHost, MockClipboard, MockNode,
};
use murmur_dictation::{DictationController, TextInjector};
use murmur_overlay::{MockOverlayHost, OverlayController, OverlayHost};
use murmur_transcribe::{
    CloudSpeechClient, HttpSpeechGateway, MockCloudSpeechClient, MockOnDeviceRecognizer,
    MockTextEnhancer, OnDeviceRecognizer, TextEnhancer, TranscriptionOrchestrator,
};

mod cli;
use cli::CliArgs;

/// Expand ~ to the home directory in a path string.
fn resolve_recordings_dir(recordings_dir: &str) -> PathBuf {
    if let Some(rest) = recordings_dir.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(rest)
    } else {
        PathBuf::from(recordings_dir)
    }
}

/// Drive one scripted dictation session through the controller: focus a
/// text field, start recording, stop, and let the pipeline inject the
/// transcribed text.
async fn run_session<D, C, E, R>(
    controller: &DictationController<D, C, E, R>,
    window: &MockAccessibilityHost,
) where
    D: CaptureDevice,
    C: CloudSpeechClient,
    E: TextEnhancer,
    R: OnDeviceRecognizer,
{
    let field = MockNode::editable("Draft:").with_focused(true);
    window.set_root(Some(MockNode::container().with_child(field.clone())));
    controller.handle_event(AccessibilityEvent::FocusChanged {
        node: field.handle(),
    });

    controller.activate().await;
    tracing::info!(state = %controller.state(), "Session running");

    controller.deactivate().await;
    tracing::info!(
        state = %controller.state(),
        field_text = %field.current_text(),
        "Session finished"
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    if args.init_config {
        MurmurConfig::default().save(&config_file)?;
        println!("Wrote default configuration to {}", config_file.display());
        return Ok(());
    }
    let config = MurmurConfig::load_or_default(&config_file);

    // Tracing. CLI log level wins over the config file.
    let log_level = args
        .resolve_log_level()
        .unwrap_or_else(|| config.general.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    tracing::info!("Starting Murmur v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    let recordings_dir = resolve_recordings_dir(&config.audio.recordings_dir);
    std::fs::create_dir_all(&recordings_dir)?;

    // In-memory platform hosts.
    let window = Arc::new(MockAccessibilityHost::new());
    let recorder = RecordingSessionManager::new(MockCaptureDevice::new(), recordings_dir);
    let injector = TextInjector::new(
        Arc::clone(&window) as Arc<dyn AccessibilityHost>,
        Arc::new(MockClipboard::new()) as Arc<dyn ClipboardService>,
    );
    let overlay = OverlayController::new(
        Arc::new(MockOverlayHost::new()) as Arc<dyn OverlayHost>,
        &config.overlay,
    );
    let fallback = MockOnDeviceRecognizer::succeeding("dictated on device");

    if config.speech.has_credentials() {
        // Real cloud gateway for both the ASR and the enhancement stage.
        tracing::info!(endpoint = %config.speech.api_endpoint, "Using cloud speech gateway");
        let gateway = Arc::new(HttpSpeechGateway::new(&config.speech)?);
        let controller = DictationController::new(
            recorder,
            TranscriptionOrchestrator::new(Arc::clone(&gateway), gateway, fallback),
            injector,
            overlay,
        );
        run_session(&controller, &window).await;
    } else {
        tracing::warn!("No speech gateway credentials configured, using canned transcription");
        let controller = DictationController::new(
            recorder,
            TranscriptionOrchestrator::new(
                MockCloudSpeechClient::succeeding("um hello from murmur", 0.9),
                MockTextEnhancer::succeeding("Hello from Murmur."),
                fallback,
            ),
            injector,
            overlay,
        );
        run_session(&controller, &window).await;
    }

    Ok(())
}
