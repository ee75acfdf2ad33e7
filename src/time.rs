use chrono::Utc;

/// Unix timestamp `secs` from now; used as a router swap deadline.
pub fn deadline_after(secs: u64) -> u64 {
    let now = u64::try_from(Utc::now().timestamp()).unwrap_or(0);
    now.saturating_add(secs)
}
