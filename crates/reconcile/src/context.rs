//! Progress and confirmation hooks
//!
//! These traits keep the orchestrators free of any terminal dependency.
//! The CLI plugs in prompts and spinners; tests use the no-op versions.

use crate::types::{ItemResult, ResourceKind};
use std::io;

/// Progress callback for deploy and destroy runs
pub trait ProgressCallback {
    /// Called before the first item of a kind is processed
    fn on_phase_start(&mut self, kind: ResourceKind, count: usize);

    /// Called before a create, patch or delete call
    fn on_item_start(&mut self, kind: ResourceKind, name: &str, action: &str);

    /// Called once an item has a result
    fn on_item_complete(&mut self, result: &ItemResult);
}

/// Confirmation callback for user interaction
pub trait ConfirmCallback {
    /// Ask the user to confirm an action
    ///
    /// # Returns
    /// `true` if the user confirmed, `false` otherwise
    fn confirm(&mut self, prompt: &str) -> io::Result<bool>;
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_phase_start(&mut self, _kind: ResourceKind, _count: usize) {}
    fn on_item_start(&mut self, _kind: ResourceKind, _name: &str, _action: &str) {}
    fn on_item_complete(&mut self, _result: &ItemResult) {}
}

/// Auto-confirm callback (always returns true)
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> io::Result<bool> {
        Ok(true)
    }
}

/// Auto-decline callback (always returns false)
pub struct AutoDecline;

impl ConfirmCallback for AutoDecline {
    fn confirm(&mut self, _prompt: &str) -> io::Result<bool> {
        Ok(false)
    }
}
