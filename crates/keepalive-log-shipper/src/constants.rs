//! Remote endpoint limits and pacing intervals.
//!
//! The aggregation endpoint enforces a hard rate limit of 5 requests per
//! second per base; exceeding it returns a 429 and locks the caller out
//! for 30 seconds. The constants here keep the shipper safely inside
//! that envelope.

use std::time::Duration;

/// Maximum number of outbound requests attempted within one shipping cycle.
///
/// Matches the endpoint's 5-requests-per-second cap.
pub const MAX_REQUESTS_PER_CYCLE: usize = 5;

/// Maximum number of log records carried by a single request.
///
/// The endpoint rejects record arrays longer than 10 entries.
pub const MAX_RECORDS_PER_REQUEST: usize = 10;

/// Delay between consecutive sends within one cycle.
///
/// Spacing the fire-and-forget requests reduces, but does not guarantee,
/// in-order arrival at the endpoint.
pub const INTER_SEND_DELAY: Duration = Duration::from_millis(100);

/// Fixed outer period of one shipping cycle.
///
/// Strictly greater than one second so the 5-request burst always lands
/// inside a fresh rate-limit window with margin.
pub const CYCLE_PERIOD: Duration = Duration::from_millis(1_100);

/// Request timeout applied to every outbound send.
///
/// Bounds how long a stuck connection can delay outcome logging; the
/// cycle loop itself never waits on a response.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(10);
