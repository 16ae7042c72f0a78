//! `tracing` integration: forwards application log events into the shipper.
//!
//! Install [`ShipperLayer`] alongside the normal fmt layer so every
//! diagnostic the watchdog emits is also queued for remote delivery:
//!
//! ```rust,ignore
//! use tracing_subscriber::prelude::*;
//!
//! let shipper = Shipper::with_http_transport(config);
//! tracing_subscriber::registry()
//!     .with(tracing_subscriber::fmt::layer())
//!     .with(ShipperLayer::new(shipper.clone()))
//!     .init();
//! ```
//!
//! # Recursion guard
//!
//! The pipeline logs its own outcomes (send failures, task lifecycle)
//! through `tracing`. Shipping those would feed the pipeline with events
//! about itself, amplifying every failure into more traffic. Events
//! whose target originates in this crate or in the HTTP stack are
//! therefore dropped here and only reach the local subscriber layers.

use std::fmt::{self, Write};
use tracing::field::{Field, Visit};
use tracing_core::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::event::{LogDraft, Severity};
use crate::shipper::Shipper;

/// Target prefixes never forwarded to the remote endpoint.
const SUPPRESSED_TARGETS: &[&str] = &[
    "keepalive_log_shipper",
    "reqwest",
    "hyper",
    "h2",
    "rustls",
];

/// Layer that converts `tracing` events into log drafts and enqueues
/// them on the shipper.
pub struct ShipperLayer {
    shipper: Shipper,
}

impl ShipperLayer {
    #[must_use]
    pub fn new(shipper: Shipper) -> Self {
        ShipperLayer { shipper }
    }
}

impl<S: Subscriber> Layer<S> for ShipperLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if is_suppressed(metadata.target()) {
            return;
        }

        let mut visitor = DraftVisitor::default();
        event.record(&mut visitor);

        let message = if visitor.message.is_empty() {
            metadata.name().to_string()
        } else {
            visitor.message
        };

        let mut draft =
            LogDraft::new(Severity::from(metadata.level()), message).with_tag(metadata.target());
        if let Some(detail) = visitor.detail {
            draft = draft.with_detail(detail);
        }

        self.shipper.enqueue(draft);
    }
}

fn is_suppressed(target: &str) -> bool {
    SUPPRESSED_TARGETS.iter().any(|prefix| {
        target == *prefix
            || (target.starts_with(prefix) && target[prefix.len()..].starts_with("::"))
    })
}

/// Collects the `message` field, an optional `error` field, and any
/// remaining fields as `key=value` pairs appended to the message.
#[derive(Default)]
struct DraftVisitor {
    message: String,
    detail: Option<String>,
}

impl Visit for DraftVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message.push_str(value),
            "error" => self.detail = Some(value.to_string()),
            name => {
                let _ = write!(self.message, " {name}={value}");
            }
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => {
                let _ = write!(self.message, "{value:?}");
            }
            "error" => self.detail = Some(format!("{value:?}")),
            name => {
                let _ = write!(self.message, " {name}={value:?}");
            }
        }
    }
}
