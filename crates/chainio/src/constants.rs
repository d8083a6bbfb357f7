use std::time::Duration;

/// Upper bound on the caller-visible wait for a single remote chain call.
///
/// Node latency varies wildly and some nodes hang outright; every
/// externally observable operation is cut off at this deadline regardless
/// of transport quality.
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(300);

/// Backoff between confirmation polls while waiting for a transaction to
/// reach its required depth and drop below the irreversibility watermark.
pub const CONFIRM_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Default number of rows returned by a contract table query.
pub const DEFAULT_TABLE_ROW_LIMIT: u32 = 10;
