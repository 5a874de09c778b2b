//! Publish Actor
//!
//! Turns closed debounce windows into change events on the broadcaster.

use std::path::PathBuf;

use tokio::sync::mpsc;

use super::messages::{ChangeBatch, PublishMsg};
use crate::reload::broadcast::Delivery;
use crate::reload::{Broadcaster, CHANGE_TOPIC, ChangeEvent};

pub struct PublishActor {
    rx: mpsc::Receiver<PublishMsg>,
    broadcaster: Broadcaster,
}

impl PublishActor {
    pub fn new(rx: mpsc::Receiver<PublishMsg>, broadcaster: Broadcaster) -> Self {
        Self { rx, broadcaster }
    }

    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                PublishMsg::Change(batch) => {
                    self.publish(batch);
                }
                PublishMsg::Shutdown => break,
            }
        }
        crate::debug!("sse"; "publisher stopped");
    }

    fn publish(&self, batch: ChangeBatch) -> Delivery {
        let event = ChangeEvent::at(batch.closed_at);
        let delivery = self.broadcaster.publish(CHANGE_TOPIC, &event);

        crate::log!(
            "watch";
            "{} changed, notifying {} client{}",
            describe(&batch.paths),
            delivery.delivered,
            if delivery.delivered == 1 { "" } else { "s" }
        );
        crate::debug!(
            "sse";
            "event {} at {} ({} writes coalesced, {} dropped)",
            event.id(),
            event.data(),
            batch.events,
            delivery.dropped
        );
        delivery
    }
}

fn describe(paths: &[PathBuf]) -> String {
    match paths {
        [] => "sources".to_string(),
        [one] => one
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| one.display().to_string()),
        many => format!("{} files", many.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[tokio::test]
    async fn test_batch_published_with_close_time() {
        let broadcaster = Broadcaster::new();
        let subscription = broadcaster.subscribe(CHANGE_TOPIC);
        let closed_at = UNIX_EPOCH + Duration::from_secs(42);

        let (tx, rx) = mpsc::channel(4);
        tx.send(PublishMsg::Change(ChangeBatch {
            events: 3,
            paths: vec![PathBuf::from("/proj/main.go")],
            closed_at,
        }))
        .await
        .unwrap();
        tx.send(PublishMsg::Shutdown).await.unwrap();

        PublishActor::new(rx, broadcaster.clone()).run().await;

        assert_eq!(subscription.try_next(), Some(ChangeEvent::at(closed_at)));
        assert_eq!(subscription.try_next(), None);
    }

    #[tokio::test]
    async fn test_stops_when_senders_drop() {
        let (tx, rx) = mpsc::channel(1);
        drop(tx);
        PublishActor::new(rx, Broadcaster::new()).run().await;
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe(&[]), "sources");
        assert_eq!(describe(&[PathBuf::from("/p/main.go")]), "main.go");
        assert_eq!(
            describe(&[PathBuf::from("/p/a.go"), PathBuf::from("/p/b.go")]),
            "2 files"
        );
    }
}
