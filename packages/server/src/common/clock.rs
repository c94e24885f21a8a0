use chrono::{DateTime, SubsecRound, Utc};

/// Current time truncated to microseconds, the precision Postgres stores.
///
/// Records compare equal before and after a database round trip.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
