//! Concurrent FIFO of pending log events.
//!
//! Producers enqueue from arbitrary threads; the shipper task is the only
//! consumer and extracts batches from the head. Sequence assignment and
//! insertion happen under a single mutex so no two events can ever share
//! a sequence number, regardless of producer concurrency.
//!
//! The queue is unbounded. Sustained overload with an unreachable
//! endpoint grows it without limit; that is an accepted property of the
//! pipeline's volatile, best-effort durability model.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::event::{LogDraft, LogEvent};

struct QueueInner {
    pending: VecDeque<LogEvent>,
    /// Next sequence number to hand out. Starts at 1.
    next_sequence: u64,
}

/// Multi-producer, single-consumer queue of pending [`LogEvent`]s.
///
/// Created once at subsystem construction and owned by the shipper.
/// Contents are volatile; everything still queued at process exit is
/// lost.
pub struct EventQueue {
    inner: Mutex<QueueInner>,
    origin_label: Arc<str>,
}

impl EventQueue {
    #[must_use]
    pub fn new(origin_label: Arc<str>) -> Self {
        EventQueue {
            inner: Mutex::new(QueueInner {
                pending: VecDeque::new(),
                next_sequence: 1,
            }),
            origin_label,
        }
    }

    /// Stamps the draft with the next sequence number and appends it to
    /// the tail. Never blocks beyond the short critical section and
    /// never fails.
    pub fn enqueue(&self, draft: LogDraft) -> LogEvent {
        #[allow(clippy::expect_used)]
        let mut inner = self.inner.lock().expect("event queue lock poisoned");
        let sequence = inner.next_sequence;
        inner.next_sequence += 1;
        let event = LogEvent::stamp(draft, sequence, Arc::clone(&self.origin_label));
        inner.pending.push_back(event.clone());
        event
    }

    /// Atomically removes and returns up to `n` events from the head, in
    /// FIFO order. Returns an empty vector when the queue is empty.
    pub fn dequeue_up_to(&self, n: usize) -> Vec<LogEvent> {
        #[allow(clippy::expect_used)]
        let mut inner = self.inner.lock().expect("event queue lock poisoned");
        let take = n.min(inner.pending.len());
        inner.pending.drain(..take).collect()
    }

    /// Advisory emptiness check. The result may be stale the instant it
    /// is returned; it is only a hint for the shipper's keep-alive
    /// decision, never a correctness guarantee.
    pub fn is_empty(&self) -> bool {
        #[allow(clippy::expect_used)]
        let inner = self.inner.lock().expect("event queue lock poisoned");
        inner.pending.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        #[allow(clippy::expect_used)]
        let inner = self.inner.lock().expect("event queue lock poisoned");
        inner.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Severity;
    use std::sync::Arc;

    fn test_queue() -> EventQueue {
        EventQueue::new(Arc::from("test-device"))
    }

    fn draft(message: &str) -> LogDraft {
        LogDraft::new(Severity::Info, message)
    }

    #[test]
    fn test_sequences_start_at_one_and_increase() {
        let queue = test_queue();

        let first = queue.enqueue(draft("a"));
        let second = queue.enqueue(draft("b"));
        let third = queue.enqueue(draft("c"));

        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);
        assert_eq!(third.sequence, 3);
    }

    #[test]
    fn test_dequeue_preserves_fifo_order() {
        let queue = test_queue();
        for i in 0..5 {
            queue.enqueue(draft(&format!("msg {i}")));
        }

        let batch = queue.dequeue_up_to(3);
        assert_eq!(batch.len(), 3);
        assert_eq!(batch[0].message, "msg 0");
        assert_eq!(batch[2].message, "msg 2");

        let rest = queue.dequeue_up_to(10);
        assert_eq!(rest.len(), 2);
        assert_eq!(rest[0].message, "msg 3");
    }

    #[test]
    fn test_dequeue_empty_returns_empty_vec() {
        let queue = test_queue();
        assert!(queue.dequeue_up_to(10).is_empty());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_concurrent_enqueue_sequences_are_unique_and_monotonic() {
        let queue = Arc::new(test_queue());
        let mut handles = Vec::new();

        for producer in 0..8 {
            let queue = Arc::clone(&queue);
            handles.push(std::thread::spawn(move || {
                let mut sequences = Vec::with_capacity(100);
                for i in 0..100 {
                    let event = queue.enqueue(draft(&format!("p{producer} m{i}")));
                    sequences.push(event.sequence);
                }
                sequences
            }));
        }

        let mut all: Vec<u64> = Vec::new();
        for handle in handles {
            let sequences = handle.join().expect("producer thread panicked");
            // Each producer observes strictly increasing sequences.
            assert!(sequences.windows(2).all(|w| w[0] < w[1]));
            all.extend(sequences);
        }

        // No duplicates across all producers, exact range 1..=800.
        all.sort_unstable();
        assert_eq!(all, (1..=800).collect::<Vec<u64>>());
        assert_eq!(queue.len(), 800);
    }
}
