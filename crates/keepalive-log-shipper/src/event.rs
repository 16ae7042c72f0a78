//! Log event value types.
//!
//! A producer builds a [`LogDraft`] at the call site; the queue stamps it
//! into an immutable [`LogEvent`] by assigning the sequence number under
//! the queue lock. Once stamped, an event is never mutated.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Severity of a log occurrence, from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    /// Uppercase label used in the composed record text.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl From<&tracing::Level> for Severity {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE => Severity::Trace,
            tracing::Level::DEBUG => Severity::Debug,
            tracing::Level::INFO => Severity::Info,
            tracing::Level::WARN => Severity::Warn,
            // tracing defines exactly five levels; ERROR is the only
            // one left.
            _ => Severity::Error,
        }
    }
}

/// A log occurrence as produced at the call site, before admission.
///
/// Carries everything except the sequence number and origin label, which
/// are assigned by the queue at enqueue time.
#[derive(Debug, Clone)]
pub struct LogDraft {
    pub severity: Severity,
    /// Short label identifying the emitting component, if any.
    pub tag: Option<String>,
    pub message: String,
    /// Secondary text such as an error description.
    pub detail: Option<String>,
}

impl LogDraft {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        LogDraft {
            severity,
            tag: None,
            message: message.into(),
            detail: None,
        }
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// One immutable log occurrence admitted into the pipeline.
///
/// `sequence` is unique per process lifetime and strictly increasing in
/// enqueue order; it exists for diagnostic correlation only and is never
/// used to reorder delivery.
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub severity: Severity,
    pub tag: Option<String>,
    pub message: String,
    pub detail: Option<String>,
    /// Assigned exactly once, under the queue lock, starting at 1.
    pub sequence: u64,
    /// Wall-clock capture time, unix epoch milliseconds.
    pub captured_at_millis: u64,
    /// Static label of the emitting device/process.
    pub origin_label: Arc<str>,
}

impl LogEvent {
    /// Stamps a draft into an immutable event. Called by the queue with
    /// the freshly assigned sequence number.
    pub(crate) fn stamp(draft: LogDraft, sequence: u64, origin_label: Arc<str>) -> Self {
        LogEvent {
            severity: draft.severity,
            tag: draft.tag,
            message: draft.message,
            detail: draft.detail,
            sequence,
            captured_at_millis: unix_millis_now(),
            origin_label,
        }
    }
}

fn unix_millis_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
