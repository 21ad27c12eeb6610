pub mod config;
pub mod error;
pub mod events;
pub mod node;

pub use config::MurmurConfig;
pub use error::{MurmurError, Result};
pub use events::AccessibilityEvent;
pub use node::{
    AccessibilityHost, ClipboardService, MockAccessibilityHost, MockClipboard, MockNode, UiNode,
};
