mod attendance_audit;
mod daily_summary;
mod low_stock_audit;
mod message_alert;

pub use attendance_audit::AttendanceAuditAgent;
pub use daily_summary::DailySummaryAgent;
pub use low_stock_audit::LowStockAuditAgent;
pub use message_alert::MessageAlertAgent;

use super::Agent;
use crate::care_store::FullCareStore;
use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use std::sync::Arc;

/// The four built-in agents, all sharing one store handle.
pub fn builtin_agents(store: Arc<dyn FullCareStore>) -> Vec<Arc<dyn Agent>> {
    vec![
        Arc::new(LowStockAuditAgent::new(Arc::clone(&store))),
        Arc::new(DailySummaryAgent::new(Arc::clone(&store))),
        Arc::new(AttendanceAuditAgent::new(Arc::clone(&store))),
        Arc::new(MessageAlertAgent::new(store)),
    ]
}

/// Local midnight of `now`'s day through the following local midnight, in UTC.
pub fn today_window(now: DateTime<Local>) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.date_naive();
    let tomorrow = today.succ_opt().unwrap_or(today);
    (day_start(&Local, today), day_start(&Local, tomorrow))
}

const MINUTES_PER_DAY: i64 = 24 * 60;

/// First instant of `date` in `tz`. Midnight itself when it exists, otherwise
/// the first local minute after a DST gap. Zone transitions fall on whole
/// minutes.
fn day_start<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    (0..MINUTES_PER_DAY)
        .find_map(|minute| {
            tz.from_local_datetime(&(midnight + TimeDelta::minutes(minute)))
                .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// Formats a unix timestamp as local wall-clock time.
pub(crate) fn format_local_time(timestamp: i64, format: &str) -> String {
    match Local.timestamp_opt(timestamp, 0).earliest() {
        Some(dt) => dt.format(format).to_string(),
        None => timestamp.to_string(),
    }
}

/// Test clock: the current local time plus an instant one hour into its day.
///
/// Fixtures stamped at the returned instant stay inside the window of the
/// returned `now`, even if the wall clock crosses midnight mid-test.
#[cfg(test)]
pub(crate) fn test_day() -> (DateTime<Local>, DateTime<Utc>) {
    let now = Local::now();
    let (start, _) = today_window(now);
    (now, start + TimeDelta::hours(1))
}
