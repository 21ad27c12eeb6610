//! Platform UI-node abstraction.
//!
//! A `UiNode` is an opaque handle to one node in the host platform's
//! accessibility tree. Handles are obtained from events or window queries
//! and own a platform resource that is freed when the handle is dropped.
//! Includes mock implementations for testing without a real platform.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{MurmurError, Result};

/// Handle to a node in the platform accessibility tree.
///
/// Attribute getters read cached platform state; `set_text`, `paste`, and
/// `move_cursor_to_end` invoke platform actions that may be unsupported by
/// the node and report `MurmurError::Injection` in that case. The platform
/// resource behind a handle is released on drop.
pub trait UiNode: std::fmt::Debug + Send + Sync {
    fn is_editable(&self) -> bool;
    fn is_focusable(&self) -> bool;
    fn is_focused(&self) -> bool;
    fn is_password(&self) -> bool;

    /// Visible text content of the node, if any.
    fn text(&self) -> Option<String>;
    /// Placeholder/hint text of the node, if any.
    fn hint_text(&self) -> Option<String>;
    /// Accessibility label (content description), if any.
    fn accessibility_label(&self) -> Option<String>;
    /// Package/application identifier the node belongs to.
    fn package_id(&self) -> Option<String>;

    fn child_count(&self) -> usize;
    /// Obtain a handle to the child at `index`.
    fn child(&self, index: usize) -> Option<Box<dyn UiNode>>;
    /// Follow the platform input-focus pointer within this node's subtree.
    fn find_input_focus(&self) -> Option<Box<dyn UiNode>>;

    /// Replace the node's text content via the structured set-text action.
    fn set_text(&self, text: &str) -> Result<()>;
    /// Move the text cursor to the end of the field.
    fn move_cursor_to_end(&self) -> Result<()>;
    /// Invoke the node's paste action.
    fn paste(&self) -> Result<()>;
}

/// Query surface of the host accessibility layer.
pub trait AccessibilityHost: Send + Sync {
    /// Handle to the root node of the currently active window, if any.
    fn active_window_root(&self) -> Option<Box<dyn UiNode>>;
}

/// System clipboard access, used only as the injection fallback.
pub trait ClipboardService: Send + Sync {
    /// Set the primary clip to plain text.
    fn set_text(&self, label: &str, text: &str) -> Result<()>;
}

// =============================================================================
// Mock implementations
// =============================================================================

#[derive(Debug)]
struct MockNodeInner {
    editable: bool,
    focusable: bool,
    focused: AtomicBool,
    password: bool,
    text: Mutex<String>,
    hint: Option<String>,
    label: Option<String>,
    package: Option<String>,
    supports_set_text: bool,
    supports_paste: bool,
    paste_count: AtomicUsize,
    cursor_to_end_count: AtomicUsize,
    children: Vec<MockNode>,
}

/// In-memory accessibility node for tests.
///
/// Handles created from the same `MockNode` share their text cell, so a
/// `set_text` performed through one handle is observable through another.
/// A release probe can be attached to a handle to assert it was dropped.
#[derive(Debug)]
pub struct MockNode {
    inner: Arc<MockNodeInner>,
    release_probe: Option<Arc<AtomicBool>>,
}

impl Clone for MockNode {
    /// Clones share node state but not the release probe; each clone is an
    /// independent handle.
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            release_probe: None,
        }
    }
}

impl Drop for MockNode {
    fn drop(&mut self) {
        if let Some(probe) = &self.release_probe {
            probe.store(true, Ordering::Relaxed);
        }
    }
}

impl MockNode {
    /// An editable, focusable text field with the given initial text.
    pub fn editable(text: &str) -> Self {
        Self::new(true, true, false, text)
    }

    /// A password field (editable but excluded from dictation).
    pub fn password() -> Self {
        Self::new(true, true, true, "")
    }

    /// A non-editable container node.
    pub fn container() -> Self {
        Self::new(false, false, false, "")
    }

    fn new(editable: bool, focusable: bool, password: bool, text: &str) -> Self {
        Self {
            inner: Arc::new(MockNodeInner {
                editable,
                focusable,
                focused: AtomicBool::new(false),
                password,
                text: Mutex::new(text.to_string()),
                hint: None,
                label: None,
                package: None,
                supports_set_text: true,
                supports_paste: true,
                paste_count: AtomicUsize::new(0),
                cursor_to_end_count: AtomicUsize::new(0),
                children: Vec::new(),
            }),
            release_probe: None,
        }
    }

    fn inner_mut(&mut self) -> &mut MockNodeInner {
        Arc::get_mut(&mut self.inner).expect("mock node already shared")
    }

    pub fn with_focused(mut self, focused: bool) -> Self {
        self.inner_mut().focused = AtomicBool::new(focused);
        self
    }

    pub fn with_hint(mut self, hint: &str) -> Self {
        self.inner_mut().hint = Some(hint.to_string());
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.inner_mut().label = Some(label.to_string());
        self
    }

    pub fn with_package(mut self, package: &str) -> Self {
        self.inner_mut().package = Some(package.to_string());
        self
    }

    pub fn without_set_text(mut self) -> Self {
        self.inner_mut().supports_set_text = false;
        self
    }

    pub fn without_paste(mut self) -> Self {
        self.inner_mut().supports_paste = false;
        self
    }

    pub fn with_child(mut self, child: MockNode) -> Self {
        self.inner_mut().children.push(child);
        self
    }

    /// Attach a probe that flips to `true` when this handle is dropped.
    pub fn with_release_probe(mut self, probe: Arc<AtomicBool>) -> Self {
        self.release_probe = Some(probe);
        self
    }

    pub fn set_focused(&self, focused: bool) {
        self.inner.focused.store(focused, Ordering::Relaxed);
    }

    pub fn current_text(&self) -> String {
        self.inner.text.lock().expect("text mutex poisoned").clone()
    }

    pub fn paste_count(&self) -> usize {
        self.inner.paste_count.load(Ordering::Relaxed)
    }

    pub fn cursor_to_end_count(&self) -> usize {
        self.inner.cursor_to_end_count.load(Ordering::Relaxed)
    }

    /// A fresh boxed handle to this node.
    pub fn handle(&self) -> Box<dyn UiNode> {
        Box::new(self.clone())
    }
}

impl UiNode for MockNode {
    fn is_editable(&self) -> bool {
        self.inner.editable
    }

    fn is_focusable(&self) -> bool {
        self.inner.focusable
    }

    fn is_focused(&self) -> bool {
        self.inner.focused.load(Ordering::Relaxed)
    }

    fn is_password(&self) -> bool {
        self.inner.password
    }

    fn text(&self) -> Option<String> {
        let text = self.inner.text.lock().expect("text mutex poisoned");
        if text.is_empty() {
            None
        } else {
            Some(text.clone())
        }
    }

    fn hint_text(&self) -> Option<String> {
        self.inner.hint.clone()
    }

    fn accessibility_label(&self) -> Option<String> {
        self.inner.label.clone()
    }

    fn package_id(&self) -> Option<String> {
        self.inner.package.clone()
    }

    fn child_count(&self) -> usize {
        self.inner.children.len()
    }

    fn child(&self, index: usize) -> Option<Box<dyn UiNode>> {
        self.inner.children.get(index).map(|c| c.handle())
    }

    fn find_input_focus(&self) -> Option<Box<dyn UiNode>> {
        if self.is_focused() {
            return Some(self.handle());
        }
        for child in &self.inner.children {
            if let Some(found) = child.find_input_focus() {
                return Some(found);
            }
        }
        None
    }

    fn set_text(&self, text: &str) -> Result<()> {
        if !self.inner.supports_set_text {
            return Err(MurmurError::Injection(
                "set-text action not supported by node".to_string(),
            ));
        }
        *self.inner.text.lock().expect("text mutex poisoned") = text.to_string();
        Ok(())
    }

    fn move_cursor_to_end(&self) -> Result<()> {
        self.inner.cursor_to_end_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn paste(&self) -> Result<()> {
        if !self.inner.supports_paste {
            return Err(MurmurError::Injection(
                "paste action not supported by node".to_string(),
            ));
        }
        self.inner.paste_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Mock accessibility host serving a configurable window root.
#[derive(Default)]
pub struct MockAccessibilityHost {
    root: Mutex<Option<MockNode>>,
}

impl MockAccessibilityHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: MockNode) -> Self {
        Self {
            root: Mutex::new(Some(root)),
        }
    }

    pub fn set_root(&self, root: Option<MockNode>) {
        *self.root.lock().expect("root mutex poisoned") = root;
    }
}

impl AccessibilityHost for MockAccessibilityHost {
    fn active_window_root(&self) -> Option<Box<dyn UiNode>> {
        self.root
            .lock()
            .expect("root mutex poisoned")
            .as_ref()
            .map(|r| r.handle())
    }
}

/// Mock clipboard storing the last clip, with optional failure injection.
#[derive(Default)]
pub struct MockClipboard {
    clip: Mutex<Option<(String, String)>>,
    fail: AtomicBool,
}

impl MockClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `set_text` calls fail.
    pub fn fail_next(&self) {
        self.fail.store(true, Ordering::Relaxed);
    }

    /// The text of the last clip set, if any.
    pub fn last_text(&self) -> Option<String> {
        self.clip
            .lock()
            .expect("clip mutex poisoned")
            .as_ref()
            .map(|(_, text)| text.clone())
    }
}

impl ClipboardService for MockClipboard {
    fn set_text(&self, label: &str, text: &str) -> Result<()> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(MurmurError::Injection(
                "clipboard service unavailable".to_string(),
            ));
        }
        *self.clip.lock().expect("clip mutex poisoned") =
            Some((label.to_string(), text.to_string()));
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
