//! Performance reports derived from the activity logs.
//!
//! Everything here is a pure function of the log records and a reference
//! date; nothing is cached or written back.

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::types::{AccountabilityData, LapsData};
use crate::util::{add_months, days_in_month, month_start, week_start};

/// Number of monthly buckets in the trend series.
pub const TREND_MONTHS: i32 = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LapsTotals {
    pub leads: u64,
    pub appointments: u64,
    pub presentations: u64,
    pub sales: u64,
}

impl LapsTotals {
    fn add(&mut self, entry: &LapsData) {
        self.leads += u64::from(entry.leads);
        self.appointments += u64::from(entry.appointments);
        self.presentations += u64::from(entry.presentations);
        self.sales += u64::from(entry.sales);
    }

    fn largest(&self) -> u64 {
        self.leads
            .max(self.appointments)
            .max(self.presentations)
            .max(self.sales)
    }
}

fn sum<'a>(entries: impl Iterator<Item = &'a LapsData>) -> LapsTotals {
    let mut totals = LapsTotals::default();
    for entry in entries {
        totals.add(entry);
    }
    totals
}

/// `numerator / denominator` as a percentage rounded to one decimal; 0.0 when
/// the denominator is zero.
pub fn conversion_rate(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    let pct = numerator as f64 / denominator as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyFunnel {
    pub week_start: NaiveDate,
    pub through: NaiveDate,
    pub totals: LapsTotals,
    pub lead_to_appointment: f64,
    pub appointment_to_presentation: f64,
    pub presentation_to_sale: f64,
}

/// Funnel totals and stage conversion rates from Monday through `reference`.
pub fn weekly_funnel(laps: &[LapsData], reference: NaiveDate) -> WeeklyFunnel {
    let start = week_start(reference);
    let totals = sum(laps.iter().filter(|d| d.date >= start && d.date <= reference));

    WeeklyFunnel {
        week_start: start,
        through: reference,
        totals,
        lead_to_appointment: conversion_rate(totals.appointments, totals.leads),
        appointment_to_presentation: conversion_rate(totals.presentations, totals.appointments),
        presentation_to_sale: conversion_rate(totals.sales, totals.presentations),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthBucket {
    /// Abbreviated month and two-digit year, e.g. "Oct 26".
    pub label: String,
    pub month: NaiveDate,
    pub totals: LapsTotals,
}

/// The reference month and the three before it, oldest first. Months with no
/// records still get an all-zero bucket.
pub fn monthly_trend(laps: &[LapsData], reference: NaiveDate) -> Vec<MonthBucket> {
    let current = month_start(reference);
    (0..TREND_MONTHS)
        .rev()
        .map(|back| {
            let month = add_months(current, -back);
            let totals = sum(
                laps.iter()
                    .filter(|d| d.date.year() == month.year() && d.date.month() == month.month()),
            );
            MonthBucket {
                label: month.format("%b %y").to_string(),
                month,
                totals,
            }
        })
        .collect()
}

/// Largest single counter across all buckets, at least 1, for scaling bars.
pub fn trend_max(buckets: &[MonthBucket]) -> u64 {
    buckets
        .iter()
        .map(|b| b.totals.largest())
        .max()
        .unwrap_or(0)
        .max(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeatIntensity {
    Lowest,
    Low,
    Medium,
    High,
    Highest,
}

impl HeatIntensity {
    pub fn from_score(score: u8) -> Self {
        match score {
            0 => Self::Lowest,
            1 => Self::Low,
            2 => Self::Medium,
            3 => Self::High,
            _ => Self::Highest,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapDay {
    pub day: u32,
    pub score: u8,
    pub intensity: HeatIntensity,
}

/// Month grid laid out Monday-first: `None` placeholders pad the first week.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Heatmap {
    pub month: NaiveDate,
    pub cells: Vec<Option<HeatmapDay>>,
}

impl Heatmap {
    pub fn leading_blanks(&self) -> usize {
        self.cells.iter().take_while(|c| c.is_none()).count()
    }

    pub fn days(&self) -> impl Iterator<Item = &HeatmapDay> {
        self.cells.iter().flatten()
    }
}

/// Activity scores for every day of the month containing `reference`.
pub fn accountability_heatmap(records: &[AccountabilityData], reference: NaiveDate) -> Heatmap {
    let first = month_start(reference);
    let blanks = first.weekday().num_days_from_monday() as usize;
    let mut cells: Vec<Option<HeatmapDay>> = vec![None; blanks];

    for offset in 0..days_in_month(first) {
        let date = first + Duration::days(i64::from(offset));
        let score = records
            .iter()
            .find(|r| r.date == date)
            .map(AccountabilityData::score)
            .unwrap_or(0);
        cells.push(Some(HeatmapDay {
            day: date.day(),
            score,
            intensity: HeatIntensity::from_score(score),
        }));
    }

    Heatmap { month: first, cells }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn laps(date: NaiveDate, l: u32, a: u32, p: u32, s: u32) -> LapsData {
        LapsData {
            date,
            leads: l,
            appointments: a,
            presentations: p,
            sales: s,
        }
    }

    #[test]
    fn test_funnel_rates_for_single_day() {
        let today = d(2026, 10, 21);
        let funnel = weekly_funnel(&[laps(today, 10, 5, 2, 1)], today);
        assert_eq!(funnel.lead_to_appointment, 50.0);
        assert_eq!(funnel.appointment_to_presentation, 40.0);
        assert_eq!(funnel.presentation_to_sale, 50.0);
    }

    #[test]
    fn test_funnel_window_is_monday_through_reference() {
        // Wednesday 2026-10-21; week began Monday the 19th
        let records = vec![
            laps(d(2026, 10, 18), 100, 100, 100, 100), // previous Sunday
            laps(d(2026, 10, 19), 3, 1, 0, 0),
            laps(d(2026, 10, 21), 3, 2, 1, 0),
            laps(d(2026, 10, 22), 100, 0, 0, 0), // after reference
        ];
        let funnel = weekly_funnel(&records, d(2026, 10, 21));
        assert_eq!(funnel.week_start, d(2026, 10, 19));
        assert_eq!(
            funnel.totals,
            LapsTotals {
                leads: 6,
                appointments: 3,
                presentations: 1,
                sales: 0
            }
        );
        assert_eq!(funnel.lead_to_appointment, 50.0);
        assert_eq!(funnel.appointment_to_presentation, 33.3);
        assert_eq!(funnel.presentation_to_sale, 0.0);
    }

    #[test]
    fn test_funnel_on_sunday_looks_back_six_days() {
        let sunday = d(2026, 10, 25);
        let records = vec![laps(d(2026, 10, 19), 4, 1, 0, 0)];
        let funnel = weekly_funnel(&records, sunday);
        assert_eq!(funnel.week_start, d(2026, 10, 19));
        assert_eq!(funnel.totals.leads, 4);
        assert_eq!(funnel.lead_to_appointment, 25.0);
    }

    #[test]
    fn test_zero_denominators_yield_zero() {
        let funnel = weekly_funnel(&[], d(2026, 10, 21));
        assert_eq!(funnel.lead_to_appointment, 0.0);
        assert_eq!(funnel.appointment_to_presentation, 0.0);
        assert_eq!(funnel.presentation_to_sale, 0.0);
        assert_eq!(conversion_rate(2, 3), 66.7);
    }

    #[test]
    fn test_monthly_trend_four_buckets_oldest_first() {
        let records = vec![
            laps(d(2026, 10, 2), 5, 1, 0, 0),
            laps(d(2026, 10, 19), 5, 1, 1, 1),
            laps(d(2026, 8, 30), 2, 0, 0, 0),
            laps(d(2026, 6, 30), 99, 0, 0, 0), // outside the window
            laps(d(2025, 10, 5), 99, 0, 0, 0), // same month, last year
        ];
        let trend = monthly_trend(&records, d(2026, 10, 19));
        let labels: Vec<&str> = trend.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Jul 26", "Aug 26", "Sep 26", "Oct 26"]);
        assert_eq!(trend[0].totals, LapsTotals::default());
        assert_eq!(trend[1].totals.leads, 2);
        assert_eq!(trend[2].totals, LapsTotals::default());
        assert_eq!(trend[3].totals.leads, 10);
        assert_eq!(trend[3].totals.sales, 1);
        assert_eq!(trend_max(&trend), 10);
    }

    #[test]
    fn test_monthly_trend_crosses_year_boundary() {
        let trend = monthly_trend(&[], d(2027, 2, 14));
        let labels: Vec<&str> = trend.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Nov 26", "Dec 26", "Jan 27", "Feb 27"]);
        assert_eq!(trend_max(&trend), 1);
    }

    #[test]
    fn test_empty_heatmap_prefix_and_zero_scores() {
        // October 2026 starts on a Thursday: three blanks (Mon, Tue, Wed)
        let map = accountability_heatmap(&[], d(2026, 10, 19));
        assert_eq!(map.leading_blanks(), 3);
        assert_eq!(map.days().count(), 31);
        assert!(map.days().all(|day| day.score == 0 && day.intensity == HeatIntensity::Lowest));
    }

    #[test]
    fn test_heatmap_sunday_start_pads_six() {
        // February 2026 starts on a Sunday
        let map = accountability_heatmap(&[], d(2026, 2, 10));
        assert_eq!(map.leading_blanks(), 6);
        assert_eq!(map.days().count(), 28);
        // June 2026 starts on a Monday
        assert_eq!(accountability_heatmap(&[], d(2026, 6, 1)).leading_blanks(), 0);
    }

    #[test]
    fn test_heatmap_scores_records() {
        let mut busy = AccountabilityData::empty(d(2026, 10, 5));
        busy.appointment = true;
        busy.spoke_to_person = true;
        busy.taught_someone = true;
        busy.made_offer = true;
        let mut light = AccountabilityData::empty(d(2026, 10, 6));
        light.made_offer = true;
        let other_month = AccountabilityData {
            appointment: true,
            ..AccountabilityData::empty(d(2026, 9, 5))
        };

        let map = accountability_heatmap(&[busy, light, other_month], d(2026, 10, 1));
        let days: Vec<&HeatmapDay> = map.days().collect();
        assert_eq!(days[4].day, 5);
        assert_eq!(days[4].score, 4);
        assert_eq!(days[4].intensity, HeatIntensity::Highest);
        assert_eq!(days[5].intensity, HeatIntensity::Low);
        assert_eq!(days.iter().map(|d| u32::from(d.score)).sum::<u32>(), 5);
    }

    #[test]
    fn test_intensity_scale() {
        let scale: Vec<HeatIntensity> = (0..=5).map(HeatIntensity::from_score).collect();
        assert_eq!(
            scale,
            vec![
                HeatIntensity::Lowest,
                HeatIntensity::Low,
                HeatIntensity::Medium,
                HeatIntensity::High,
                HeatIntensity::Highest,
                HeatIntensity::Highest,
            ]
        );
    }
}
