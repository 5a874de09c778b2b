//! Actor System for Live Reload
//!
//! Message-passing concurrency for watch mode:
//!
//! ```text
//! FsActor --> PublishActor --> Broadcaster
//! (watch)     (fan-out)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `fs` - File system watcher with debouncing
//! - `publish` - Change event publishing
//! - `coordinator` - Wires up and runs actors

pub mod coordinator;
mod error;
pub mod fs;
pub mod messages;
pub mod publish;

pub use coordinator::Coordinator;
pub use error::WatchError;
