//! Inbound accessibility events.
//!
//! The host platform delivers focus and window notifications through an
//! external transport; the core consumes them as plain values. Events are
//! processed in delivery order with last-write-wins semantics on the held
//! focus target.

use crate::node::UiNode;

/// A focus/window notification from the host accessibility layer.
#[derive(Debug)]
pub enum AccessibilityEvent {
    /// Input focus moved to a new node. The handle is owned by the event
    /// and transferred to whoever consumes it.
    FocusChanged { node: Box<dyn UiNode> },
    /// The text content of the focused node changed.
    TextChanged { text: String },
    /// The foreground window/application changed.
    WindowStateChanged { package_id: String },
    /// The user clicked a node.
    Clicked,
}

impl AccessibilityEvent {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            AccessibilityEvent::FocusChanged { .. } => "focus-changed",
            AccessibilityEvent::TextChanged { .. } => "text-changed",
            AccessibilityEvent::WindowStateChanged { .. } => "window-state-changed",
            AccessibilityEvent::Clicked => "clicked",
        }
    }
}
