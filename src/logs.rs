//! The two daily activity logs: LAPS funnel counts and accountability check-offs.
//!
//! Both are keyed by date with at most one record per day. Edits produce the
//! full replacement log so the caller can persist before swapping it in.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::store::{keys, KeyedStore, StoreError};
use crate::types::{AccountabilityData, Activity, LapsData};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityLogs {
    laps: Vec<LapsData>,
    accountability: Vec<AccountabilityData>,
}

impl ActivityLogs {
    pub fn load<S: KeyedStore>(store: &S) -> Result<Self, StoreError> {
        Ok(Self {
            laps: store.get(keys::LAPS_HISTORY, Vec::new())?,
            accountability: store.get(keys::ACCOUNTABILITY_HISTORY, Vec::new())?,
        })
    }

    pub fn laps(&self) -> &[LapsData] {
        &self.laps
    }

    pub fn accountability(&self) -> &[AccountabilityData] {
        &self.accountability
    }

    pub fn laps_for(&self, date: NaiveDate) -> LapsData {
        self.laps
            .iter()
            .find(|d| d.date == date)
            .cloned()
            .unwrap_or_else(|| LapsData::empty(date))
    }

    /// Missing days read as all-false.
    pub fn accountability_for(&self, date: NaiveDate) -> AccountabilityData {
        self.accountability
            .iter()
            .find(|d| d.date == date)
            .cloned()
            .unwrap_or_else(|| AccountabilityData::empty(date))
    }

    /// Laps log with `entry` upserted on its date.
    pub fn with_laps(&self, entry: LapsData) -> Vec<LapsData> {
        let mut laps = self.laps.clone();
        match laps.iter_mut().find(|d| d.date == entry.date) {
            Some(existing) => *existing = entry,
            None => laps.push(entry),
        }
        laps
    }

    /// Accountability log with one activity set for `date`, creating the
    /// day's record if needed.
    pub fn with_activity(
        &self,
        date: NaiveDate,
        activity: Activity,
        checked: bool,
    ) -> Vec<AccountabilityData> {
        let mut log = self.accountability.clone();
        match log.iter_mut().find(|d| d.date == date) {
            Some(existing) => existing.set(activity, checked),
            None => {
                let mut entry = AccountabilityData::empty(date);
                entry.set(activity, checked);
                log.push(entry);
            }
        }
        log
    }

    pub(crate) fn replace_laps(&mut self, laps: Vec<LapsData>) {
        self.laps = laps;
    }

    pub(crate) fn replace_accountability(&mut self, log: Vec<AccountabilityData>) {
        self.accountability = log;
    }
}

/// Monday-Friday accountability grid for one week.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountabilityWeek {
    pub days: Vec<AccountabilityData>,
    /// Days with each activity done, in [`Activity::ALL`] order.
    pub totals: [u32; 4],
}

impl AccountabilityWeek {
    pub fn total(&self, activity: Activity) -> u32 {
        Activity::ALL
            .iter()
            .position(|a| *a == activity)
            .map(|i| self.totals[i])
            .unwrap_or(0)
    }

    /// "Week of Oct 19 - Oct 23"
    pub fn label(&self) -> String {
        match (self.days.first(), self.days.last()) {
            (Some(first), Some(last)) => format!(
                "Week of {} - {}",
                first.date.format("%b %-d"),
                last.date.format("%b %-d")
            ),
            _ => String::new(),
        }
    }
}

/// The working week `week_offset` weeks away from the one containing `today`.
/// An offset past the calendar's range falls back to the current week.
pub fn accountability_week(
    records: &[AccountabilityData],
    today: NaiveDate,
    week_offset: i64,
) -> AccountabilityWeek {
    let target = Duration::try_weeks(week_offset)
        .and_then(|shift| today.checked_add_signed(shift))
        .unwrap_or(today);
    let monday = crate::util::week_start(target);
    let days: Vec<AccountabilityData> = (0..5)
        .filter_map(|i| monday.checked_add_signed(Duration::days(i)))
        .map(|date| {
            records
                .iter()
                .find(|d| d.date == date)
                .cloned()
                .unwrap_or_else(|| AccountabilityData::empty(date))
        })
        .collect();

    let mut totals = [0u32; 4];
    for (slot, activity) in totals.iter_mut().zip(Activity::ALL) {
        *slot = days.iter().filter(|d| d.get(activity)).count() as u32;
    }

    AccountabilityWeek { days, totals }
}
