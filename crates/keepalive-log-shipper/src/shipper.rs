//! Self-starting, self-terminating background shipping task.
//!
//! # Architecture
//!
//! ```text
//!   Producers (log call sites)
//!        │ enqueue (non-blocking)
//!        v
//!   ┌────────────┐   CAS Idle -> Running
//!   │ EventQueue │ ──────────────────────┐
//!   └────────────┘                       v
//!        ^                      ┌─────────────────┐
//!        │ dequeue_up_to(10)    │   drain task    │
//!        └───────────────────── │  (one at most)  │
//!                               └────────┬────────┘
//!                                        │ up to 5 sends per 1.1 s,
//!                                        │ 100 ms apart, fire-and-forget
//!                                        v
//!                               ┌─────────────────┐
//!                               │    Transport    │
//!                               └─────────────────┘
//! ```
//!
//! A producer that observes no active task starts one; the task runs
//! cycles until it observes an empty queue at cycle end, then terminates
//! itself. The activity flag is only ever flipped with compare-and-swap,
//! so concurrent producers and a terminating task cannot race into two
//! simultaneous drain loops.
//!
//! Delivery order is best effort only: sends are fire-and-forget, and
//! several may be in flight against the endpoint at once. The 100 ms
//! spacing reduces reordering but cannot eliminate it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, error, warn};

use crate::batch::{self, BatchPayload};
use crate::config::ShipperConfig;
use crate::constants;
use crate::event::{LogDraft, LogEvent};
use crate::queue::EventQueue;
use crate::transport::{HttpTransport, Transport};

/// Orchestrator of the remote log shipping pipeline.
///
/// Cheap to clone; clones share the queue, transport, and activity flag.
/// Construct once at subsystem startup, inside a tokio runtime, and hand
/// clones to producers.
#[derive(Clone)]
pub struct Shipper {
    /// Resolved at construction: enabled and structurally valid.
    enabled: bool,
    queue: Arc<EventQueue>,
    transport: Arc<dyn Transport>,
    /// True while a drain task is active. Flipped only via CAS.
    active: Arc<AtomicBool>,
    /// Captured at construction so `enqueue` stays synchronous for
    /// producers on arbitrary threads.
    runtime: tokio::runtime::Handle,
}

impl Shipper {
    /// Creates a shipper with the given transport.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime context.
    #[must_use]
    pub fn new(config: ShipperConfig, transport: Arc<dyn Transport>) -> Self {
        let enabled = config.is_valid();
        if config.enabled && !enabled {
            warn!(
                "Remote log shipping is enabled but the configuration is invalid \
                 (blank token or malformed endpoint URL); shipping is disabled"
            );
        }

        Shipper {
            enabled,
            queue: Arc::new(EventQueue::new(Arc::clone(&config.origin_label))),
            transport,
            active: Arc::new(AtomicBool::new(false)),
            runtime: tokio::runtime::Handle::current(),
        }
    }

    /// Creates a shipper backed by the HTTP transport.
    #[must_use]
    pub fn with_http_transport(config: ShipperConfig) -> Self {
        let transport = Arc::new(HttpTransport::new(&config));
        Shipper::new(config, transport)
    }

    /// Admits one log occurrence into the pipeline.
    ///
    /// Assigns the event's sequence number, appends it to the queue, and
    /// starts a drain task if none is active. Never blocks the caller
    /// beyond the queue's short critical section and never suspends.
    ///
    /// Returns the stamped event, or `None` when shipping is disabled
    /// (in which case nothing is queued and no task is started).
    pub fn enqueue(&self, draft: LogDraft) -> Option<LogEvent> {
        if !self.enabled {
            return None;
        }

        let event = self.queue.enqueue(draft);
        self.ensure_task_running();
        Some(event)
    }

    /// Whether a drain task is currently active. Advisory, for
    /// diagnostics and tests.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Starts the drain task if no task currently holds the activity
    /// flag. The CAS guarantees at most one winner among concurrent
    /// producers.
    fn ensure_task_running(&self) {
        if self
            .active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let shipper = self.clone();
            self.runtime.spawn(async move {
                shipper.run_cycles().await;
            });
        }
    }

    /// Drain loop: runs cycles until the queue is observed empty at
    /// cycle end, then releases the activity flag and returns.
    async fn run_cycles(self) {
        debug!("Shipper task started");

        loop {
            let cycle_started = Instant::now();
            self.run_cycle().await;

            if self.queue.is_empty() {
                self.active.store(false, Ordering::Release);
                // A producer may have enqueued between the emptiness
                // check and the store above, observed the flag still
                // set, and skipped starting a task. Re-check and take
                // the flag back rather than stranding those events.
                if !self.queue.is_empty()
                    && self
                        .active
                        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                {
                    continue;
                }
                debug!("Shipper task terminated: queue drained");
                return;
            }

            // Backlog remains; wait out the rest of the rate-limit
            // window before the next burst of sends.
            sleep_until(cycle_started + constants::CYCLE_PERIOD).await;
        }
    }

    /// One cycle: up to 5 batch sends, 100 ms apart. Returns the number
    /// of sends attempted. Exits immediately when a batch comes back
    /// empty so a drained queue never causes no-op send attempts.
    async fn run_cycle(&self) -> usize {
        let mut sent = 0;

        for _ in 0..constants::MAX_REQUESTS_PER_CYCLE {
            let events = self.queue.dequeue_up_to(constants::MAX_RECORDS_PER_REQUEST);
            let Some(payload) = batch::compose(&events) else {
                break;
            };

            self.dispatch(payload);
            sent += 1;
            sleep(constants::INTER_SEND_DELAY).await;
        }

        sent
    }

    /// Fire-and-forget submission of one payload. The outcome is
    /// consumed by a side-effect-only observer that logs it; it never
    /// feeds back into the cycle loop, and a failed batch is
    /// permanently lost.
    fn dispatch(&self, payload: BatchPayload) {
        let transport = Arc::clone(&self.transport);
        self.runtime.spawn(async move {
            let count = payload.record_count();
            let (first, last) = (payload.first_sequence, payload.last_sequence);
            match transport.send(payload).await {
                Ok(()) => {
                    debug!("Shipped batch of {count} records (seq {first}..={last})");
                }
                Err(e) if e.is_rate_limited() => {
                    error!(
                        "Endpoint rate limit hit shipping batch of {count} records \
                         (seq {first}..={last}); batch dropped, expect a 30 s lockout"
                    );
                }
                Err(e) => {
                    error!(
                        "Failed to ship batch of {count} records (seq {first}..={last}): {e}; \
                         batch dropped"
                    );
                }
            }
        });
    }
}
