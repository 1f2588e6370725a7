use crate::store::filter::{store_timestamp, Condition, ScanFilter};
use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use std::time::Duration;

/// Midnight UTC of the day containing `now`.
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::MIN))
}

/// Point in time after which an open visit is not yet considered stale.
pub fn stale_cutoff(now: DateTime<Utc>, stale_after: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(stale_after)
        .ok()
        .and_then(|age| now.checked_sub_signed(age))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub fn visits_since(table: &str, activity_type: &str, since: DateTime<Utc>) -> ScanFilter {
    ScanFilter::new(table)
        .with(Condition::StartTimeAtOrAfter(store_timestamp(since)))
        .with(Condition::ActivityType(activity_type.to_string()))
}

pub fn open_visits_started_by(
    table: &str,
    activity_type: &str,
    started_by: DateTime<Utc>,
) -> ScanFilter {
    ScanFilter::new(table)
        .with(Condition::StartTimeAtOrBefore(store_timestamp(started_by)))
        .with(Condition::EndTimeUnset)
        .with(Condition::ActivityType(activity_type.to_string()))
}

pub fn open_visits(table: &str, activity_type: &str) -> ScanFilter {
    ScanFilter::new(table)
        .with(Condition::EndTimeUnset)
        .with(Condition::ActivityType(activity_type.to_string()))
}
