//! Focused-element tracking with last-write-wins replacement.

use std::sync::Mutex;

use tracing::{debug, trace, warn};

use murmur_core::events::AccessibilityEvent;
use murmur_core::node::UiNode;

/// Hint vocabulary that marks a field as sensitive. Matched as a
/// case-insensitive substring of hint text, visible text, and
/// accessibility label.
pub const SENSITIVE_HINTS: [&str; 7] = [
    "password",
    "pin",
    "cvv",
    "security code",
    "verification code",
    "2fa",
    "otp",
];

/// The currently focused element: an owned node handle plus attributes
/// cached at focus time. Dropping the element releases the handle's
/// platform resource.
#[derive(Debug)]
pub struct FocusedElement {
    node: Box<dyn UiNode>,
    pub is_editable: bool,
    pub is_focusable: bool,
    pub is_password: bool,
    pub hint_text: Option<String>,
    pub accessibility_label: Option<String>,
    pub current_text: String,
    pub package_id: Option<String>,
}

impl FocusedElement {
    /// Cache the node's attributes and take ownership of the handle.
    pub fn from_node(node: Box<dyn UiNode>) -> Self {
        Self {
            is_editable: node.is_editable(),
            is_focusable: node.is_focusable(),
            is_password: node.is_password(),
            hint_text: node.hint_text(),
            accessibility_label: node.accessibility_label(),
            current_text: node.text().unwrap_or_default(),
            package_id: node.package_id(),
            node,
        }
    }

    /// Borrow the underlying node handle.
    pub fn node(&self) -> &dyn UiNode {
        self.node.as_ref()
    }

    /// Whether dictation may target this element: editable, focusable, not
    /// a password field, and no sensitivity-vocabulary match in its hint,
    /// text, or accessibility label.
    pub fn is_eligible(&self) -> bool {
        self.is_editable && self.is_focusable && !self.is_password && !self.matches_sensitive_hint()
    }

    fn matches_sensitive_hint(&self) -> bool {
        let hint = self.hint_text.as_deref().unwrap_or("").to_lowercase();
        let text = self.current_text.to_lowercase();
        let label = self
            .accessibility_label
            .as_deref()
            .unwrap_or("")
            .to_lowercase();

        SENSITIVE_HINTS
            .iter()
            .any(|h| hint.contains(h) || text.contains(h) || label.contains(h))
    }
}

/// Tracks the focused editable element across focus-change events.
///
/// Holds at most one `FocusedElement` at a time; every focus event replaces
/// it wholesale, dropping (and thereby releasing) the previous handle before
/// the new one is stored.
#[derive(Default)]
pub struct FocusTracker {
    current: Mutex<Option<FocusedElement>>,
}

impl FocusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route one accessibility event.
    pub fn handle_event(&self, event: AccessibilityEvent) {
        match event {
            AccessibilityEvent::FocusChanged { node } => self.on_focus_event(node),
            AccessibilityEvent::TextChanged { text } => self.on_text_changed(&text),
            AccessibilityEvent::WindowStateChanged { package_id } => {
                debug!(package_id = %package_id, "Window state changed");
            }
            AccessibilityEvent::Clicked => trace!("Node clicked"),
        }
    }

    /// Replace the held element with the newly focused node.
    pub fn on_focus_event(&self, node: Box<dyn UiNode>) {
        let element = FocusedElement::from_node(node);
        debug!(
            package_id = element.package_id.as_deref().unwrap_or("<unknown>"),
            editable = element.is_editable,
            password = element.is_password,
            "Focus moved"
        );
        if element.is_password {
            warn!("Password field focused, dictation disabled");
        }

        let mut guard = self.current.lock().expect("focus mutex poisoned");
        // Drop the previous handle before storing the new one.
        *guard = None;
        *guard = Some(element);
    }

    /// Update the cached text of the held element without replacing its
    /// identity. Ignored when nothing is focused.
    pub fn on_text_changed(&self, text: &str) {
        let mut guard = self.current.lock().expect("focus mutex poisoned");
        if let Some(element) = guard.as_mut() {
            element.current_text = text.to_string();
            trace!(text_len = text.len(), "Focused element text changed");
        }
    }

    /// Lend the held element by reference to `f`.
    pub fn with_current<R>(&self, f: impl FnOnce(Option<&FocusedElement>) -> R) -> R {
        let guard = self.current.lock().expect("focus mutex poisoned");
        f(guard.as_ref())
    }

    /// Whether the held element is eligible for dictation.
    pub fn has_eligible_target(&self) -> bool {
        self.with_current(|el| el.map(|e| e.is_eligible()).unwrap_or(false))
    }

    /// Release the held element, if any.
    pub fn clear(&self) {
        *self.current.lock().expect("focus mutex poisoned") = None;
    }
}

// =============================================================================
// Tests
// =============================================================================
