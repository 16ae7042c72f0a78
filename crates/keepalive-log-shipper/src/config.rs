//! Shipper configuration supplied once at subsystem construction.
//!
//! The surrounding application owns persistence and the settings UI;
//! this crate only consumes the resolved values. An invalid-but-enabled
//! configuration is treated as disabled so a bad URL or blank token can
//! never produce a stream of doomed requests.

use regex::Regex;
use std::sync::{Arc, OnceLock};

/// Basic scheme-plus-host shape check. Intentionally loose; the endpoint
/// itself is the final authority on whether the URL resolves.
const URL_PATTERN: &str = r"^(https?)://[^\s/$.?#].[^\s]*$";

/// Configuration for the remote log shipping pipeline.
///
/// Constructed once by the host application from its persisted settings
/// and shared with the shipper via `Arc`.
#[derive(Debug, Clone)]
pub struct ShipperConfig {
    /// Master switch. When false the whole pipeline is a no-op.
    pub enabled: bool,
    /// Bearer token sent in the `Authorization` header.
    pub auth_token: String,
    /// Full endpoint URL, e.g. `https://api.example.com/v0/appXXXX/Logs`.
    pub endpoint_url: String,
    /// Static label identifying the emitting device/process, stamped on
    /// every record. Captured once here, never per event.
    pub origin_label: Arc<str>,
}

impl ShipperConfig {
    pub fn new(
        enabled: bool,
        auth_token: impl Into<String>,
        endpoint_url: impl Into<String>,
        origin_label: impl AsRef<str>,
    ) -> Self {
        ShipperConfig {
            enabled,
            auth_token: auth_token.into(),
            endpoint_url: endpoint_url.into(),
            origin_label: Arc::from(origin_label.as_ref()),
        }
    }

    /// A configuration that performs no queuing and no network activity.
    #[must_use]
    pub fn disabled() -> Self {
        ShipperConfig::new(false, "", "", "unknown")
    }

    /// Whether the pipeline should actually run: enabled, with a
    /// non-blank token and a well-formed `http(s)://` URL.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.enabled && !self.auth_token.trim().is_empty() && is_valid_url(&self.endpoint_url)
    }
}

/// Validates that the given string is a well-formed `http`/`https` URL.
#[must_use]
pub fn is_valid_url(url: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    let pattern =
        PATTERN.get_or_init(|| Regex::new(URL_PATTERN).expect("URL pattern is a valid regex"));
    pattern.is_match(url)
}
