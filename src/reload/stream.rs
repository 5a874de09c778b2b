//! `text/event-stream` response writer.
//!
//! The HTTP server hands over the raw connection; the head is written by
//! hand and every frame is flushed as soon as it is written so the browser
//! sees it immediately.

use std::io::{self, Write};
use std::time::Duration;

use super::broadcast::{Next, Subscription};
use crate::utils::mime::types::EVENT_STREAM;

/// Idle interval after which a comment line keeps proxies from timing out.
pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

const KEEP_ALIVE_FRAME: &[u8] = b": keep-alive\n\n";

/// Why a stream ended.
#[derive(Debug, PartialEq, Eq)]
pub enum StreamEnd {
    /// Server is shutting down.
    Closed,
    /// Client went away.
    Disconnected,
}

/// Write the response head of an event stream.
pub fn write_head<W: Write>(out: &mut W, allow_origin: Option<&str>) -> io::Result<()> {
    let mut head = format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: {EVENT_STREAM}\r\n\
         Cache-Control: no-cache\r\n\
         Connection: keep-alive\r\n",
    );
    if let Some(origin) = allow_origin {
        head.push_str("Access-Control-Allow-Origin: ");
        head.push_str(origin);
        head.push_str("\r\n");
    }
    head.push_str("\r\n");
    out.write_all(head.as_bytes())?;
    out.flush()
}

/// Forward events from `subscription` to `out` until shutdown or disconnect.
pub fn pump<W: Write>(out: &mut W, subscription: &Subscription, keep_alive: Duration) -> StreamEnd {
    loop {
        let frame = match subscription.next_timeout(keep_alive) {
            Next::Event(event) => event.to_frame().into_bytes(),
            Next::Idle => KEEP_ALIVE_FRAME.to_vec(),
            Next::Closed => return StreamEnd::Closed,
        };
        if out.write_all(&frame).and_then(|()| out.flush()).is_err() {
            return StreamEnd::Disconnected;
        }
    }
}

/// Serve one subscriber on `out`: head, then frames.
///
/// The subscription must already be registered so events published while
/// the head is being written are not lost.
pub fn serve<W: Write>(
    mut out: W,
    subscription: Subscription,
    allow_origin: Option<&str>,
    keep_alive: Duration,
) -> StreamEnd {
    let id = subscription.id();
    if let Err(e) = write_head(&mut out, allow_origin) {
        crate::debug!("sse"; "subscriber {} failed before head: {}", id, e);
        return StreamEnd::Disconnected;
    }
    let end = pump(&mut out, &subscription, keep_alive);
    crate::debug!("sse"; "subscriber {} stream ended: {:?}", id, end);
    end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reload::broadcast::Broadcaster;
    use crate::reload::event::{CHANGE_TOPIC, ChangeEvent};
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::UNIX_EPOCH;

    /// Writer shared with the test thread.
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Fails every write, like a closed socket.
    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_head_with_origin() {
        let mut out = Vec::new();
        write_head(&mut out, Some("*")).unwrap();
        let head = String::from_utf8(out).unwrap();
        assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(head.contains("Content-Type: text/event-stream\r\n"));
        assert!(head.contains("Access-Control-Allow-Origin: *\r\n"));
        assert!(head.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_head_without_origin() {
        let mut out = Vec::new();
        write_head(&mut out, None).unwrap();
        assert!(!String::from_utf8(out).unwrap().contains("Allow-Origin"));
    }

    #[test]
    fn test_events_then_close() {
        let broadcaster = Broadcaster::new();
        let subscription = broadcaster.subscribe(CHANGE_TOPIC);
        let event = ChangeEvent::at(UNIX_EPOCH);
        broadcaster.publish(CHANGE_TOPIC, &event);
        broadcaster.close();

        let buf = SharedBuf::default();
        let end = serve(buf.clone(), subscription, None, Duration::from_secs(5));
        assert_eq!(end, StreamEnd::Closed);
        assert!(buf.text().ends_with(&event.to_frame()));
    }

    #[test]
    fn test_keep_alive_when_idle() {
        let broadcaster = Broadcaster::new();
        let subscription = broadcaster.subscribe(CHANGE_TOPIC);
        let buf = SharedBuf::default();

        let writer = buf.clone();
        let handle = std::thread::spawn(move || {
            serve(writer, subscription, None, Duration::from_millis(20))
        });
        std::thread::sleep(Duration::from_millis(120));
        broadcaster.close();

        assert_eq!(handle.join().unwrap(), StreamEnd::Closed);
        assert!(buf.text().contains(": keep-alive\n\n"));
    }

    #[test]
    fn test_broken_client_ends_stream_and_unsubscribes() {
        let broadcaster = Broadcaster::new();
        let subscription = broadcaster.subscribe(CHANGE_TOPIC);
        assert_eq!(broadcaster.subscriber_count(), 1);

        let end = serve(Broken, subscription, None, Duration::from_secs(5));
        assert_eq!(end, StreamEnd::Disconnected);
        assert_eq!(broadcaster.subscriber_count(), 0);
    }
}
