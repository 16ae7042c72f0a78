//! Remote log shipping pipeline for the keep-alive watchdog.
//!
//! The watchdog runs unattended on a device for weeks; this crate ships
//! its diagnostic log stream to a remote aggregation endpoint so the
//! app's behavior can be analyzed without physical access. Delivery is
//! best effort: the queue is volatile, failed batches are dropped, and
//! ordering is approximate.
//!
//! # Pipeline
//!
//! ```text
//!    Log call sites ──> EventQueue ──> drain task ──> Transport ──> endpoint
//!    (any thread)       (FIFO +        (self-starting,  (HTTP POST,
//!                        sequencing)    rate limited)    fire-and-forget)
//! ```
//!
//! The endpoint caps traffic at 5 requests per second and 10 records per
//! request; the drain task paces itself to stay inside both limits. See
//! [`shipper`] for the full control flow.
//!
//! # Usage
//!
//! ```rust,ignore
//! use keepalive_log_shipper::{LogDraft, Severity, Shipper, ShipperConfig};
//!
//! let config = ShipperConfig::new(true, token, endpoint_url, device_model);
//! let shipper = Shipper::with_http_transport(config);
//!
//! shipper.enqueue(LogDraft::new(Severity::Info, "watchdog started"));
//! ```
//!
//! Or wire the whole application's `tracing` output through
//! [`layer::ShipperLayer`].

pub mod batch;
pub mod config;
pub mod constants;
pub mod event;
pub mod layer;
pub mod queue;
pub mod shipper;
pub mod transport;

pub use config::ShipperConfig;
pub use event::{LogDraft, LogEvent, Severity};
pub use layer::ShipperLayer;
pub use shipper::Shipper;
pub use transport::{HttpTransport, Transport, TransportError};
