//! Ids and timestamps stamped onto documents

use chrono::Utc;
use uuid::Uuid;

/// New globally unique document id
pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Current wall-clock time in epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Modification time for an update: the current time, but never earlier than
/// the document's previous `updated` or its creation `timestamp`.
pub fn next_updated(previous: Option<i64>, created: Option<i64>) -> i64 {
    let floor = previous.into_iter().chain(created).max().unwrap_or(i64::MIN);
    now_millis().max(floor)
}
