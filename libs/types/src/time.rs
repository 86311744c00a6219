use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in nanoseconds since the UNIX epoch.
///
/// The same value doubles as the price-time priority tiebreaker, so it
/// must be monotone enough that later arrivals do not sort earlier;
/// sub-tick collisions are resolved by order id in the index.
pub fn current_time_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before UNIX epoch")
        .as_nanos() as i64
}
