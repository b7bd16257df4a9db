//! Per-request correlation ids.

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Response header carrying the correlation id.
pub const CORRELATION_HEADER: &str = "x-correlation-id";

const CORRELATION_ID_LEN: usize = 8;

/// Generates a short random alphanumeric token.
pub fn new_correlation_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CORRELATION_ID_LEN)
        .map(char::from)
        .collect()
}
