//! Daily Non-Negotiables: a fixed recurring template, fresh each day.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::types::{Task, TaskDuration};

const TEMPLATE: &[(&str, &str, bool)] = &[
    ("nn-prospecting", "Prospecting Min 1 hr", true),
    ("nn-linkedin", "Linkedin Post and commenting Min 1 hr", false),
];

/// Today's starting list. Ids are fixed so each day's copy lines up.
pub fn default_template() -> Vec<Task> {
    TEMPLATE
        .iter()
        .map(|(id, text, income)| Task {
            id: (*id).to_string(),
            text: (*text).to_string(),
            is_completed: false,
            is_income_generating: *income,
            notes: String::new(),
            scheduled_time: String::new(),
            duration: TaskDuration::Min60,
            completed_at: None,
        })
        .collect()
}

/// The section only shows Monday through Friday.
pub fn visible_on(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// True for ids owned by the template rather than the lifecycle collections.
pub fn is_template_id(id: &str) -> bool {
    TEMPLATE.iter().any(|(template_id, _, _)| *template_id == id)
}
