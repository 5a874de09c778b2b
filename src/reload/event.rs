//! Change notification and its server-sent-event framing.

use std::fmt::Write as _;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::utils::date::display_timestamp;

/// Event type tag carried by every notification.
pub const CHANGE_EVENT: &str = "Change";

/// Topic the watcher publishes on and the subscription endpoint listens to.
pub const CHANGE_TOPIC: &str = "time";

/// A coalesced "sources changed" signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    id: String,
    data: String,
}

impl ChangeEvent {
    /// Notification for a debounce window that closed at `time`.
    ///
    /// The id is the close time in nanoseconds since the Unix epoch.
    pub fn at(time: SystemTime) -> Self {
        let nanos = time
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        Self {
            id: nanos.to_string(),
            data: display_timestamp(time),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn event(&self) -> &'static str {
        CHANGE_EVENT
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    /// Encode as one `text/event-stream` frame.
    pub fn to_frame(&self) -> String {
        let mut frame = String::with_capacity(self.data.len() + 48);
        let _ = writeln!(frame, "id: {}", self.id);
        let _ = writeln!(frame, "event: {}", self.event());
        for line in self.data.lines() {
            let _ = writeln!(frame, "data: {line}");
        }
        if self.data.is_empty() {
            frame.push_str("data: \n");
        }
        frame.push('\n');
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_event_fields() {
        let time = UNIX_EPOCH + Duration::from_millis(1_718_461_845_042);
        let event = ChangeEvent::at(time);
        assert_eq!(event.id(), "1718461845042000000");
        assert_eq!(event.event(), "Change");
        assert_eq!(event.data(), "2024-06-15 14:30:45.042 UTC");
    }

    #[test]
    fn test_frame_layout() {
        let time = UNIX_EPOCH + Duration::from_secs(1);
        let frame = ChangeEvent::at(time).to_frame();
        assert_eq!(
            frame,
            "id: 1000000000\nevent: Change\ndata: 1970-01-01 00:00:01.000 UTC\n\n"
        );
    }

    #[test]
    fn test_ids_follow_time() {
        let earlier = ChangeEvent::at(UNIX_EPOCH + Duration::from_secs(10));
        let later = ChangeEvent::at(UNIX_EPOCH + Duration::from_secs(11));
        let parse = |e: &ChangeEvent| e.id().parse::<u128>().unwrap();
        assert!(parse(&later) > parse(&earlier));
    }
}
