use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::watch;

/// Handle for one request in a slot.
#[derive(Debug, Clone)]
pub struct Ticket {
    slot: String,
    generation: u64,
    receiver: watch::Receiver<u64>,
}

impl Ticket {
    pub fn slot(&self) -> &str {
        &self.slot
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// False once a newer request has started in the same slot.
    pub fn is_current(&self) -> bool {
        *self.receiver.borrow() == self.generation
    }

    /// Resolves when a newer request starts in the same slot.
    pub async fn superseded(mut self) {
        loop {
            if *self.receiver.borrow_and_update() != self.generation {
                return;
            }
            if self.receiver.changed().await.is_err() {
                // Gate dropped; nothing can supersede this request any more.
                std::future::pending::<()>().await;
            }
        }
    }
}

/// "Last request wins" per slot. Starting a request supersedes the previous
/// one in that slot: its future is dropped and its output never published.
#[derive(Default)]
pub struct RequestGate {
    slots: DashMap<String, watch::Sender<u64>>,
    generations: AtomicU64,
}

impl RequestGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new request in `slot`, superseding any in flight.
    pub fn begin(&self, slot: &str) -> Ticket {
        let generation = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
        let sender = self
            .slots
            .entry(slot.to_string())
            .or_insert_with(|| watch::channel(0).0);
        sender.send_replace(generation);
        let receiver = sender.subscribe();
        Ticket {
            slot: slot.to_string(),
            generation,
            receiver,
        }
    }

    /// Number of slots with a registered request.
    pub fn active_slots(&self) -> usize {
        self.slots.len()
    }

    /// Forget `slot` unless a newer request has taken it over.
    fn release(&self, slot: &str, generation: u64) {
        self.slots
            .remove_if(slot, |_, sender| *sender.borrow() == generation);
    }

    /// Run `request` in `slot`. Returns `None` if a newer request for the
    /// same slot started before this one finished.
    pub async fn run<F>(&self, slot: &str, request: F) -> Option<F::Output>
    where
        F: Future,
    {
        let ticket = self.begin(slot);
        let generation = ticket.generation();
        let guard = ticket.clone();
        let _release = SlotRelease {
            gate: self,
            slot,
            generation,
        };

        tokio::select! {
            biased;
            _ = ticket.superseded() => {
                tracing::debug!(slot, generation, "request superseded, dropping");
                None
            }
            output = request => guard.is_current().then_some(output),
        }
    }
}

/// Releases the slot when `run` finishes or is dropped.
struct SlotRelease<'a> {
    gate: &'a RequestGate,
    slot: &'a str,
    generation: u64,
}

impl Drop for SlotRelease<'_> {
    fn drop(&mut self) {
        self.gate.release(self.slot, self.generation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[test]
    fn test_begin_supersedes_previous_ticket() {
        let gate = RequestGate::new();
        let first = gate.begin("ticker");
        assert!(first.is_current());
        let second = gate.begin("ticker");
        assert!(!first.is_current());
        assert!(second.is_current());
        assert!(second.generation() > first.generation());

        let other = gate.begin("news");
        assert!(second.is_current());
        assert!(other.is_current());
    }

    #[test]
    fn test_superseded_future_wakes_on_new_request() {
        let gate = RequestGate::new();
        let first = gate.begin("ticker");
        let mut superseded = tokio_test::task::spawn(first.superseded());
        tokio_test::assert_pending!(superseded.poll());

        gate.begin("other-slot");
        tokio_test::assert_pending!(superseded.poll());

        gate.begin("ticker");
        assert!(superseded.is_woken());
        tokio_test::assert_ready!(superseded.poll());
    }

    #[tokio::test]
    async fn test_single_request_publishes() {
        let gate = RequestGate::new();
        assert_eq!(gate.run("ticker", async { 42 }).await, Some(42));
    }

    #[tokio::test]
    async fn test_superseded_request_never_publishes() {
        let gate = Arc::new(RequestGate::new());
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let stale_gate = gate.clone();
        let stale = tokio::spawn(async move {
            stale_gate
                .run("ticker", async move {
                    let _ = release_rx.await;
                    "AAPL"
                })
                .await
        });

        // Let the stale request register before the new one starts.
        tokio::time::sleep(Duration::from_millis(20)).await;
        let fresh = gate.run("ticker", async { "TSLA" }).await;
        let _ = release_tx.send(());

        assert_eq!(fresh, Some("TSLA"));
        assert_eq!(stale.await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_finished_slots_are_released() {
        let gate = RequestGate::new();
        for i in 0..100 {
            let slot = format!("ticker-{i}");
            assert_eq!(gate.run(&slot, async move { i }).await, Some(i));
        }
        assert_eq!(gate.active_slots(), 0);
    }

    #[tokio::test]
    async fn test_stale_finish_keeps_newer_slot() {
        let gate = Arc::new(RequestGate::new());
        let (release_tx, release_rx) = oneshot::channel::<()>();

        let pending_gate = gate.clone();
        let pending = tokio::spawn(async move {
            pending_gate
                .run("ticker", async move {
                    let _ = release_rx.await;
                })
                .await
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        // A ticket taken directly stays registered after an older request ends.
        let stale = gate.begin("ticker");
        let current = gate.begin("ticker");
        gate.release("ticker", stale.generation());
        assert_eq!(gate.active_slots(), 1);
        assert!(current.is_current());

        let _ = release_tx.send(());
        assert_eq!(pending.await.unwrap(), None);
        assert_eq!(gate.active_slots(), 1);
    }

    #[tokio::test]
    async fn test_slots_are_independent() {
        let gate = RequestGate::new();
        let (a, b) = tokio::join!(
            gate.run("chart", async { 1 }),
            gate.run("posts", async { 2 })
        );
        assert_eq!((a, b), (Some(1), Some(2)));
    }
}
