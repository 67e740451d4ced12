use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// Which outbound queue an action travels through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueueKind {
    /// Player commands.
    Command,
    /// Chat messages.
    Chat,
}

impl fmt::Display for QueueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            QueueKind::Command => "command",
            QueueKind::Chat => "chat",
        })
    }
}

/// Outbound half of the game connection.
///
/// Implementations hand the payload to the wire and return without
/// waiting for the server; pacing is the queue's job.
pub trait Transport: Send + Sync + 'static {
    fn send(&self, kind: QueueKind, payload: &str) -> Result<(), TransportError>;
}
