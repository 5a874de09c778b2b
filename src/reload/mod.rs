//! Live reload over server-sent events.
//!
//! ```text
//! watcher ─► Broadcaster::publish ─► Subscription ─► stream::serve ─► browser
//! ```

pub mod broadcast;
pub mod event;
pub mod stream;

pub use broadcast::Broadcaster;
pub use event::{CHANGE_TOPIC, ChangeEvent};
