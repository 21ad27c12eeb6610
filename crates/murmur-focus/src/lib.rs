//! Focus tracking for the dictation pipeline.
//!
//! Consumes accessibility events from the host platform and maintains the
//! single currently focused editable element, applying a sensitivity filter
//! so dictation never activates on password/PIN/OTP-like fields.

pub mod tracker;

pub use tracker::{FocusTracker, FocusedElement, SENSITIVE_HINTS};
