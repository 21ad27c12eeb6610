//! Text injection into the focused editable element.
//!
//! Primary path is the structured set-text action, appending to the field's
//! current content. When set-text is unsupported the injector falls back to
//! the clipboard: set the clip, move the cursor to the end, invoke paste.
//! A failed paste after a successful clipboard set is still a (qualified)
//! success; a failed clipboard set is a hard error.

use std::sync::Arc;

use tracing::{debug, warn};

use murmur_core::error::{MurmurError, Result};
use murmur_core::node::{AccessibilityHost, ClipboardService, UiNode};
use murmur_focus::FocusedElement;

/// Clip label attached to clipboard-fallback clips.
const CLIP_LABEL: &str = "Murmur dictation";

/// How the injected text reached the target field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionDelivery {
    /// Structured set-text action succeeded.
    SetText,
    /// Clipboard set and paste action both succeeded.
    ClipboardPaste,
    /// Clipboard set succeeded but the paste action failed; the text is on
    /// the clipboard for the user to paste manually.
    ClipboardOnly,
}

/// Injects dictated text into the focused editable element, re-resolving
/// the target through the accessibility host when the tracked handle has
/// gone stale.
pub struct TextInjector {
    host: Arc<dyn AccessibilityHost>,
    clipboard: Arc<dyn ClipboardService>,
}

impl TextInjector {
    pub fn new(host: Arc<dyn AccessibilityHost>, clipboard: Arc<dyn ClipboardService>) -> Self {
        Self { host, clipboard }
    }

    /// Insert `text` into the focused editable element.
    ///
    /// Uses `target` when it is still an editable, focused node; otherwise
    /// re-resolves the focused element from the active window.
    pub fn insert(&self, text: &str, target: Option<&FocusedElement>) -> Result<InjectionDelivery> {
        if let Some(element) = target {
            if element.is_editable && element.node().is_focused() {
                return self.perform(element.node(), text);
            }
            debug!("Tracked focus handle is stale, re-resolving from active window");
        }

        let node = self.resolve_focused_editable()?;
        self.perform(node.as_ref(), text)
    }

    /// Find the focused editable element in the active window.
    fn resolve_focused_editable(&self) -> Result<Box<dyn UiNode>> {
        let root = self
            .host
            .active_window_root()
            .ok_or_else(|| MurmurError::Injection("No active window".to_string()))?;

        if let Some(focused) = root.find_input_focus() {
            if focused.is_editable() {
                return Ok(focused);
            }
            // The input-focus pointer can land on a non-editable wrapper;
            // fall through to the manual search.
        }

        if root.is_editable() && root.is_focused() {
            return Ok(root);
        }
        Self::search_focused_editable(root.as_ref()).ok_or_else(|| {
            MurmurError::Injection("No focused editable element found".to_string())
        })
    }

    fn search_focused_editable(node: &dyn UiNode) -> Option<Box<dyn UiNode>> {
        for index in 0..node.child_count() {
            let child = node.child(index)?;
            if child.is_editable() && child.is_focused() {
                return Some(child);
            }
            if let Some(found) = Self::search_focused_editable(child.as_ref()) {
                return Some(found);
            }
        }
        None
    }

    /// Append `text` to the node's current content and deliver it.
    fn perform(&self, node: &dyn UiNode, text: &str) -> Result<InjectionDelivery> {
        let current = node.text().unwrap_or_default();
        let new_text = if current.is_empty() {
            text.to_string()
        } else {
            format!("{current} {text}")
        };

        match node.set_text(&new_text) {
            Ok(()) => {
                debug!(text_len = new_text.len(), "Text injected via set-text");
                Ok(InjectionDelivery::SetText)
            }
            Err(e) => {
                debug!(error = %e, "Set-text unavailable, using clipboard fallback");
                self.clipboard_fallback(node, text)
            }
        }
    }

    /// Clipboard fallback: the clip carries only the dictated text, the
    /// field's existing content stays where it is.
    fn clipboard_fallback(&self, node: &dyn UiNode, text: &str) -> Result<InjectionDelivery> {
        self.clipboard.set_text(CLIP_LABEL, text)?;

        if let Err(e) = node.move_cursor_to_end() {
            debug!(error = %e, "Could not move cursor to end before paste");
        }
        match node.paste() {
            Ok(()) => Ok(InjectionDelivery::ClipboardPaste),
            Err(e) => {
                warn!(error = %e, "Paste action failed, text left on clipboard");
                Ok(InjectionDelivery::ClipboardOnly)
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
