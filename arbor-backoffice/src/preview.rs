//! Preview-session hook invoked after a successful save.

use crate::error::BackofficeResult;
use arbor_types::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;
use tracing::debug;

/// Opaque identifier of an editor's preview session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PreviewToken(String);

impl PreviewToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PreviewToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rebuilds a preview set after `node_id` changed.
pub trait PreviewSession: Send + Sync {
    fn refresh(&self, token: &PreviewToken, node_id: NodeId) -> BackofficeResult<()>;
}

/// Preview support switched off.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPreview;

impl PreviewSession for NoPreview {
    fn refresh(&self, token: &PreviewToken, node_id: NodeId) -> BackofficeResult<()> {
        debug!("Preview disabled, ignoring refresh of {} for {}", node_id, token);
        Ok(())
    }
}

/// Remembers every refresh request. Useful for hosts that rebuild
/// preview sets in batches.
#[derive(Debug, Default)]
pub struct RecordingPreview {
    refreshed: Mutex<Vec<(PreviewToken, NodeId)>>,
}

impl RecordingPreview {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains the recorded refreshes.
    pub fn take(&self) -> Vec<(PreviewToken, NodeId)> {
        let mut guard = self
            .refreshed
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        std::mem::take(&mut *guard)
    }
}

impl PreviewSession for RecordingPreview {
    fn refresh(&self, token: &PreviewToken, node_id: NodeId) -> BackofficeResult<()> {
        self.refreshed
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push((token.clone(), node_id));
        Ok(())
    }
}
