//! Batch composition: events into one outbound JSON payload.
//!
//! The endpoint stores each record as a row with two text cells: a
//! device identifier and a multi-line log blob. The blob carries enough
//! context (severity, tag, message, detail, app version, capture time,
//! sequence) to reconstruct ordering and provenance after the fact.
//!
//! # Wire shape
//!
//! ```json
//! {
//!   "records": [
//!     {"fields": {"Device": "pixel-7", "Log": "Severity: INFO\n..."}}
//!   ]
//! }
//! ```
//!
//! Composition never fails: serde_json escapes any characters the
//! messages carry, so malformed input is encoded rather than dropped.

use serde::Serialize;
use std::fmt::Write;

use crate::event::LogEvent;

/// Version of the emitting application, embedded in every record.
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Serialize)]
struct RecordFields {
    /// Cell holding the device/origin identifier. Single line text.
    #[serde(rename = "Device")]
    device: String,
    /// Cell holding the composed log blob. Long text.
    #[serde(rename = "Log")]
    log: String,
}

#[derive(Debug, Serialize)]
struct Record {
    fields: RecordFields,
}

/// One outbound payload of 1..=10 records.
///
/// The sequence range is kept alongside the wire body for diagnostic
/// logging of send outcomes; it is not serialized.
#[derive(Debug, Serialize)]
pub struct BatchPayload {
    records: Vec<Record>,
    #[serde(skip)]
    pub first_sequence: u64,
    #[serde(skip)]
    pub last_sequence: u64,
}

impl BatchPayload {
    /// Number of records in this payload.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Serialized JSON body for the outbound request.
    #[must_use]
    pub fn to_body(&self) -> String {
        // Serialization of plain string fields cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Composes up to one payload from the given events.
///
/// Returns `None` for an empty slice: no request should be made. The
/// caller is responsible for keeping the batch within the per-request
/// record cap; this function encodes whatever it is handed.
#[must_use]
pub fn compose(events: &[LogEvent]) -> Option<BatchPayload> {
    if events.is_empty() {
        return None;
    }

    let records = events
        .iter()
        .map(|event| Record {
            fields: RecordFields {
                device: event.origin_label.to_string(),
                log: render_log_blob(event),
            },
        })
        .collect();

    Some(BatchPayload {
        records,
        first_sequence: events[0].sequence,
        last_sequence: events[events.len() - 1].sequence,
    })
}

/// Renders the multi-line text blob stored in the log cell.
fn render_log_blob(event: &LogEvent) -> String {
    let mut blob = String::new();
    let _ = writeln!(blob, "Severity: {}", event.severity.label());
    if let Some(tag) = &event.tag {
        let _ = writeln!(blob, "Tag: {tag}");
    }
    let _ = writeln!(blob, "Message: {}", event.message);
    if let Some(detail) = &event.detail {
        let _ = writeln!(blob, "Detail: {detail}");
    }
    let _ = writeln!(blob, "App Version: {APP_VERSION}");
    let _ = writeln!(blob, "Log Time: {}", event.captured_at_millis);
    let _ = write!(blob, "Log Sequence: {}", event.sequence);
    blob
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{LogDraft, LogEvent, Severity};
    use std::sync::Arc;

    fn event(sequence: u64, message: &str) -> LogEvent {
        LogEvent::stamp(
            LogDraft::new(Severity::Info, message),
            sequence,
            Arc::from("test-device"),
        )
    }

    #[test]
    fn test_compose_empty_returns_none() {
        assert!(compose(&[]).is_none());
    }

    #[test]
    fn test_compose_single_event() {
        let payload = compose(&[event(1, "hello")]).expect("payload expected");

        assert_eq!(payload.record_count(), 1);
        assert_eq!(payload.first_sequence, 1);
        assert_eq!(payload.last_sequence, 1);

        let body = payload.to_body();
        let parsed: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
        let records = parsed["records"].as_array().expect("records array");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["fields"]["Device"], "test-device");

        let blob = records[0]["fields"]["Log"].as_str().expect("log cell");
        assert!(blob.contains("Severity: INFO"));
        assert!(blob.contains("Message: hello"));
        assert!(blob.contains("Log Sequence: 1"));
        assert!(blob.contains("App Version:"));
    }

    #[test]
    fn test_compose_tracks_sequence_range() {
        let events: Vec<LogEvent> = (5..=9).map(|i| event(i, "m")).collect();
        let payload = compose(&events).expect("payload expected");

        assert_eq!(payload.record_count(), 5);
        assert_eq!(payload.first_sequence, 5);
        assert_eq!(payload.last_sequence, 9);
    }

    #[test]
    fn test_optional_fields_omitted_from_blob() {
        let payload = compose(&[event(1, "plain")]).expect("payload expected");
        let body = payload.to_body();
        assert!(!body.contains("Tag:"));
        assert!(!body.contains("Detail:"));
    }

    #[test]
    fn test_optional_fields_present_in_blob() {
        let stamped = LogEvent::stamp(
            LogDraft::new(Severity::Error, "restart failed")
                .with_tag("AppLauncher")
                .with_detail("activity not found"),
            7,
            Arc::from("test-device"),
        );
        let body = compose(&[stamped]).expect("payload expected").to_body();

        assert!(body.contains("Tag: AppLauncher"));
        assert!(body.contains("Detail: activity not found"));
        assert!(body.contains("Severity: ERROR"));
    }

    #[test]
    fn test_malformed_characters_are_encoded_not_dropped() {
        let payload =
            compose(&[event(1, "quote \" backslash \\ newline \n control \u{1}")])
                .expect("payload expected");
        let body = payload.to_body();

        // Body must remain valid JSON with the message intact.
        let parsed: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
        let blob = parsed["records"][0]["fields"]["Log"]
            .as_str()
            .expect("log cell");
        assert!(blob.contains("quote \" backslash \\ newline \n control \u{1}"));
    }
}
