//! Floating overlay surfaces.
//!
//! Two singleton surfaces drawn above all application content: the trigger
//! control (shown whenever an eligible text field is focused) and the
//! recording indicator (shown while a dictation session is recording or
//! processing). Overlay visibility is best-effort: host refusals are
//! logged and swallowed, never propagated into the dictation state machine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::sync::Mutex;

use tracing::{debug, info, warn};

use murmur_core::config::{AnchorCorner, OverlayConfig};
use murmur_core::error::{MurmurError, Result};

/// The two floating surfaces, each a singleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlaySurface {
    /// Small persistent control the user taps to start/stop dictation.
    Trigger,
    /// Indicator shown while recording or processing.
    RecordingIndicator,
}

impl std::fmt::Display for OverlaySurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverlaySurface::Trigger => write!(f, "trigger"),
            OverlaySurface::RecordingIndicator => write!(f, "recording-indicator"),
        }
    }
}

/// Fixed screen placement for a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub corner: AnchorCorner,
    pub x_offset_px: i32,
    pub y_offset_px: i32,
}

impl From<&OverlayConfig> for Anchor {
    fn from(config: &OverlayConfig) -> Self {
        Self {
            corner: config.corner,
            x_offset_px: config.x_offset_px,
            y_offset_px: config.y_offset_px,
        }
    }
}

/// Window layer of the host platform that can attach floating surfaces.
pub trait OverlayHost: Send + Sync {
    /// Attach `surface` at `anchor`. The host may refuse (e.g. overlay
    /// permission revoked).
    fn attach(&self, surface: OverlaySurface, anchor: &Anchor) -> Result<()>;

    /// Detach `surface` from the screen.
    fn detach(&self, surface: OverlaySurface) -> Result<()>;
}

/// Drives the two overlay surfaces.
///
/// Each surface has at most one attachment at a time; show/hide are
/// idempotent per the singleton invariant.
pub struct OverlayController {
    host: Arc<dyn OverlayHost>,
    anchor: Anchor,
    trigger_shown: AtomicBool,
    indicator_shown: AtomicBool,
}

impl OverlayController {
    pub fn new(host: Arc<dyn OverlayHost>, config: &OverlayConfig) -> Self {
        Self {
            host,
            anchor: Anchor::from(config),
            trigger_shown: AtomicBool::new(false),
            indicator_shown: AtomicBool::new(false),
        }
    }

    /// Show or hide the trigger surface based on focus eligibility.
    pub fn on_focus_changed(&self, eligible: bool) {
        if eligible {
            self.show_trigger();
        } else {
            self.hide_trigger();
        }
    }

    pub fn show_trigger(&self) {
        self.show(OverlaySurface::Trigger, &self.trigger_shown);
    }

    pub fn hide_trigger(&self) {
        self.hide(OverlaySurface::Trigger, &self.trigger_shown);
    }

    pub fn show_indicator(&self) {
        self.show(OverlaySurface::RecordingIndicator, &self.indicator_shown);
    }

    pub fn hide_indicator(&self) {
        self.hide(OverlaySurface::RecordingIndicator, &self.indicator_shown);
    }

    pub fn is_trigger_shown(&self) -> bool {
        self.trigger_shown.load(Ordering::Relaxed)
    }

    pub fn is_indicator_shown(&self) -> bool {
        self.indicator_shown.load(Ordering::Relaxed)
    }

    fn show(&self, surface: OverlaySurface, flag: &AtomicBool) {
        if flag.load(Ordering::Relaxed) {
            debug!(surface = %surface, "Overlay already shown");
            return;
        }
        match self.host.attach(surface, &self.anchor) {
            Ok(()) => {
                flag.store(true, Ordering::Relaxed);
                info!(surface = %surface, "Overlay shown");
            }
            Err(e) => warn!(surface = %surface, error = %e, "Failed to show overlay"),
        }
    }

    fn hide(&self, surface: OverlaySurface, flag: &AtomicBool) {
        if !flag.load(Ordering::Relaxed) {
            return;
        }
        match self.host.detach(surface) {
            Ok(()) => {
                flag.store(false, Ordering::Relaxed);
                info!(surface = %surface, "Overlay hidden");
            }
            Err(e) => {
                // Treat the surface as gone; a stale flag would block re-show.
                flag.store(false, Ordering::Relaxed);
                warn!(surface = %surface, error = %e, "Failed to hide overlay");
            }
        }
    }
}

// =============================================================================
// Mock implementation
// =============================================================================

/// Mock overlay host recording attach/detach calls, with failure injection.
#[derive(Default)]
pub struct MockOverlayHost {
    calls: Mutex<Vec<(String, OverlaySurface)>>,
    fail_attach: AtomicBool,
}

impl MockOverlayHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make all subsequent attach calls fail.
    pub fn refuse_attach(&self) {
        self.fail_attach.store(true, Ordering::Relaxed);
    }

    pub fn allow_attach(&self) {
        self.fail_attach.store(false, Ordering::Relaxed);
    }

    pub fn calls(&self) -> Vec<(String, OverlaySurface)> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }
}

impl OverlayHost for MockOverlayHost {
    fn attach(&self, surface: OverlaySurface, _anchor: &Anchor) -> Result<()> {
        if self.fail_attach.load(Ordering::Relaxed) {
            return Err(MurmurError::Overlay(
                "Overlay permission revoked".to_string(),
            ));
        }
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(("attach".to_string(), surface));
        Ok(())
    }

    fn detach(&self, surface: OverlaySurface) -> Result<()> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(("detach".to_string(), surface));
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> (Arc<MockOverlayHost>, OverlayController) {
        let host = Arc::new(MockOverlayHost::new());
        let controller = OverlayController::new(
            Arc::clone(&host) as Arc<dyn OverlayHost>,
            &OverlayConfig::default(),
        );
        (host, controller)
    }

    #[test]
    fn test_show_hide_trigger() {
        let (host, controller) = controller();
        controller.show_trigger();
        assert!(controller.is_trigger_shown());
        controller.hide_trigger();
        assert!(!controller.is_trigger_shown());
        assert_eq!(
            host.calls(),
            vec![
                ("attach".to_string(), OverlaySurface::Trigger),
                ("detach".to_string(), OverlaySurface::Trigger),
            ]
        );
    }

    #[test]
    fn test_show_is_idempotent() {
        let (host, controller) = controller();
        controller.show_indicator();
        controller.show_indicator();
        controller.show_indicator();
        assert_eq!(host.calls().len(), 1);
    }

    #[test]
    fn test_hide_without_show_is_noop() {
        let (host, controller) = controller();
        controller.hide_indicator();
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_surfaces_are_independent() {
        let (_, controller) = controller();
        controller.show_trigger();
        controller.show_indicator();
        controller.hide_trigger();
        assert!(!controller.is_trigger_shown());
        assert!(controller.is_indicator_shown());
    }

    #[test]
    fn test_attach_refusal_is_swallowed() {
        let (host, controller) = controller();
        host.refuse_attach();
        controller.show_trigger();
        assert!(!controller.is_trigger_shown());

        // Once the host allows overlays again, show works.
        host.allow_attach();
        controller.show_trigger();
        assert!(controller.is_trigger_shown());
    }

    #[test]
    fn test_focus_driven_trigger_visibility() {
        let (_, controller) = controller();
        controller.on_focus_changed(true);
        assert!(controller.is_trigger_shown());
        controller.on_focus_changed(false);
        assert!(!controller.is_trigger_shown());
    }

    #[test]
    fn test_anchor_from_config() {
        let config = OverlayConfig::default();
        let anchor = Anchor::from(&config);
        assert_eq!(anchor.corner, AnchorCorner::BottomCenter);
        assert_eq!(anchor.y_offset_px, 200);
    }
}
