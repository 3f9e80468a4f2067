//! Zero-capacity handoff between the decoder task and the renderer.
//!
//! `send` resolves only after the receiver has taken the chunk, so the producer is never more
//! than one chunk ahead of the consumer and network reads are throttled to rendering speed.

use tokio::sync::mpsc;

use super::chunk::Chunk;

/// The receiving side is gone; nothing sent from now on will be observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandoffClosed;

pub fn handoff() -> (HandoffSender, HandoffReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (HandoffSender { tx }, HandoffReceiver { rx })
}

/// Producer half. Dropping it closes the queue; it cannot be cloned, so closure happens once.
#[derive(Debug)]
pub struct HandoffSender {
    tx: mpsc::Sender<Chunk>,
}

impl HandoffSender {
    pub async fn send(&self, chunk: Chunk) -> Result<(), HandoffClosed> {
        self.tx.send(chunk).await.map_err(|_| HandoffClosed)?;
        // The single slot is released when the receiver takes the chunk.
        let permit = self.tx.reserve().await.map_err(|_| HandoffClosed)?;
        drop(permit);
        Ok(())
    }
}

#[derive(Debug)]
pub struct HandoffReceiver {
    rx: mpsc::Receiver<Chunk>,
}

impl HandoffReceiver {
    /// Next chunk in production order, or `None` once the sender is dropped.
    pub async fn recv(&mut self) -> Option<Chunk> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::{handoff, HandoffClosed};
    use crate::stream::Chunk;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn content(chunk: Option<Chunk>) -> String {
        match chunk {
            Some(Chunk::Content(text)) => text,
            other => panic!("expected content, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_waits_for_receiver() {
        let (tx, mut rx) = handoff();
        let sent = Arc::new(AtomicUsize::new(0));
        let producer_sent = Arc::clone(&sent);
        let producer = tokio::spawn(async move {
            for idx in 0..3 {
                tx.send(Chunk::Content(idx.to_string()))
                    .await
                    .expect("receiver alive");
                producer_sent.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sent.load(Ordering::SeqCst), 0);

        assert_eq!(content(rx.recv().await), "0");
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sent.load(Ordering::SeqCst), 1);

        assert_eq!(content(rx.recv().await), "1");
        assert_eq!(content(rx.recv().await), "2");
        producer.await.expect("producer task");
        assert_eq!(sent.load(Ordering::SeqCst), 3);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn dropped_receiver_fails_send() {
        let (tx, rx) = handoff();
        drop(rx);
        let result = tx.send(Chunk::Content("late".to_string())).await;
        assert_eq!(result, Err(HandoffClosed));
    }
}
