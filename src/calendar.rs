//! Google Calendar deep links for scheduled tasks.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use url::Url;

use crate::error::TrackerError;
use crate::types::Task;

const CALENDAR_RENDER_URL: &str = "https://www.google.com/calendar/render";
const EVENT_COLOR_ID: &str = "11";

/// Which card the link is built from; they differ in event details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Priority,
    NonNegotiable,
}

/// Start and end of the task's slot on `date` in `tz`, as UTC instants.
pub fn event_window(
    task: &Task,
    date: NaiveDate,
    tz: Tz,
) -> Result<(DateTime<Utc>, DateTime<Utc>), TrackerError> {
    let time = crate::util::parse_schedule_time(&task.scheduled_time)
        .ok_or_else(|| TrackerError::InvalidSchedule(task.scheduled_time.clone()))?;
    let local = date.and_time(time);

    // A spring-forward gap has no earliest instant; take the post-transition one.
    let start = tz
        .from_local_datetime(&local)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(local + Duration::hours(1))).earliest())
        .ok_or_else(|| TrackerError::InvalidSchedule(task.scheduled_time.clone()))?
        .with_timezone(&Utc);
    let end = start + Duration::minutes(i64::from(task.duration.minutes()));
    Ok((start, end))
}

fn google_format(instant: DateTime<Utc>) -> String {
    instant.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Build the "add event" link for `task`, scheduled on `date`.
///
/// Fails with [`TrackerError::InvalidSchedule`] unless the task has a valid
/// 24-hour scheduled time.
pub fn calendar_link(task: &Task, date: NaiveDate, tz: Tz, kind: LinkKind) -> Result<Url, TrackerError> {
    let (start, end) = event_window(task, date, tz)?;
    let dates = format!("{}/{}", google_format(start), google_format(end));

    let details = match kind {
        LinkKind::Priority if !task.notes.is_empty() => task.notes.clone(),
        LinkKind::Priority => format!("Completing task: {}", task.text),
        LinkKind::NonNegotiable => {
            format!("Completing daily non-negotiable task: {}", task.text)
        }
    };

    let mut url = Url::parse(CALENDAR_RENDER_URL)
        .map_err(|e| TrackerError::InvalidSchedule(format!("calendar url: {e}")))?;
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("action", "TEMPLATE")
            .append_pair("text", &task.text)
            .append_pair("dates", &dates)
            .append_pair("details", &details);
        if kind == LinkKind::Priority {
            query.append_pair("crm", "BUSY");
        }
        query.append_pair("colorId", EVENT_COLOR_ID);
    }
    log::debug!("Calendar link built for task {}", task.id);
    Ok(url)
}
