//! Actor Message Definitions
//!
//! ```text
//! FsActor --Change--> PublishActor --ChangeEvent--> Broadcaster
//! ```

use std::path::PathBuf;
use std::time::SystemTime;

/// One closed debounce window.
#[derive(Debug, Clone)]
pub struct ChangeBatch {
    /// Raw write events coalesced into this batch.
    pub events: usize,
    /// Distinct changed paths.
    pub paths: Vec<PathBuf>,
    /// When the window closed.
    pub closed_at: SystemTime,
}

/// Messages to the publish actor.
#[derive(Debug)]
pub enum PublishMsg {
    Change(ChangeBatch),
    Shutdown,
}
