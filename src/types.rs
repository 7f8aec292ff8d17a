use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A single unit of work, stored in exactly one board collection at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub is_income_generating: bool,
    #[serde(default)]
    pub notes: String,
    /// "HH:MM" or empty.
    #[serde(default)]
    pub scheduled_time: String,
    #[serde(default)]
    pub duration: TaskDuration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Build a task with a fresh id and default fields.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            is_completed: false,
            is_income_generating: false,
            notes: String::new(),
            scheduled_time: String::new(),
            duration: TaskDuration::default(),
            completed_at: None,
        }
    }

    /// Same content under a newly minted id.
    pub fn duplicate(&self) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            ..self.clone()
        }
    }
}

/// Allowed task lengths in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum TaskDuration {
    Min15,
    Min30,
    Min45,
    #[default]
    Min60,
    Min90,
    Min120,
}

impl TaskDuration {
    pub const ALL: [TaskDuration; 6] = [
        TaskDuration::Min15,
        TaskDuration::Min30,
        TaskDuration::Min45,
        TaskDuration::Min60,
        TaskDuration::Min90,
        TaskDuration::Min120,
    ];

    pub fn minutes(self) -> u32 {
        match self {
            Self::Min15 => 15,
            Self::Min30 => 30,
            Self::Min45 => 45,
            Self::Min60 => 60,
            Self::Min90 => 90,
            Self::Min120 => 120,
        }
    }

    pub fn from_minutes(minutes: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.minutes() == minutes)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Min15 => "15 mins",
            Self::Min30 => "30 mins",
            Self::Min45 => "45 mins",
            Self::Min60 => "1 hour",
            Self::Min90 => "1.5 hours",
            Self::Min120 => "2 hours",
        }
    }
}

impl TryFrom<u32> for TaskDuration {
    type Error = String;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        Self::from_minutes(minutes)
            .ok_or_else(|| format!("unsupported task duration: {minutes} minutes"))
    }
}

impl From<TaskDuration> for u32 {
    fn from(duration: TaskDuration) -> Self {
        duration.minutes()
    }
}

/// The named task collections on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    BrainDump,
    TopThree,
    CompletedHistory,
    IdeasVault,
    NonNegotiables,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BrainDump => "brain_dump",
            Self::TopThree => "top_three",
            Self::CompletedHistory => "completed_history",
            Self::IdeasVault => "ideas_vault",
            Self::NonNegotiables => "non_negotiables",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which neighbour an Ideas Vault entry swaps with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// A single-attribute edit to a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum TaskUpdate {
    Text(String),
    Completed(bool),
    IncomeGenerating(bool),
    Notes(String),
    ScheduledTime(String),
    Duration(TaskDuration),
}

impl TaskUpdate {
    /// Check the new value against the task schema.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            TaskUpdate::Text(text) if text.trim().is_empty() => {
                Err("task text cannot be empty".to_string())
            }
            TaskUpdate::ScheduledTime(time)
                if !time.is_empty() && !crate::util::is_valid_schedule_time(time) =>
            {
                Err(format!("scheduled time must be HH:MM, got {time:?}"))
            }
            _ => Ok(()),
        }
    }

    /// Apply to a copy of `task`. Completion stamping is the board's job.
    pub fn apply(&self, task: &Task) -> Task {
        let mut next = task.clone();
        match self {
            TaskUpdate::Text(text) => next.text = text.trim().to_string(),
            TaskUpdate::Completed(done) => next.is_completed = *done,
            TaskUpdate::IncomeGenerating(flag) => next.is_income_generating = *flag,
            TaskUpdate::Notes(notes) => next.notes = notes.clone(),
            TaskUpdate::ScheduledTime(time) => next.scheduled_time = time.clone(),
            TaskUpdate::Duration(duration) => next.duration = *duration,
        }
        next
    }
}

/// One day of LAPS funnel counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LapsData {
    pub date: NaiveDate,
    #[serde(default)]
    pub leads: u32,
    #[serde(default)]
    pub appointments: u32,
    #[serde(default)]
    pub presentations: u32,
    #[serde(default)]
    pub sales: u32,
}

impl LapsData {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            leads: 0,
            appointments: 0,
            presentations: 0,
            sales: 0,
        }
    }
}

/// One day of accountability check-offs. A missing day counts as all false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountabilityData {
    pub date: NaiveDate,
    #[serde(default)]
    pub appointment: bool,
    #[serde(default)]
    pub spoke_to_person: bool,
    #[serde(default)]
    pub taught_someone: bool,
    #[serde(default)]
    pub made_offer: bool,
}

impl AccountabilityData {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            appointment: false,
            spoke_to_person: false,
            taught_someone: false,
            made_offer: false,
        }
    }

    pub fn get(&self, activity: Activity) -> bool {
        match activity {
            Activity::Appointment => self.appointment,
            Activity::SpokeToPerson => self.spoke_to_person,
            Activity::TaughtSomeone => self.taught_someone,
            Activity::MadeOffer => self.made_offer,
        }
    }

    pub fn set(&mut self, activity: Activity, checked: bool) {
        match activity {
            Activity::Appointment => self.appointment = checked,
            Activity::SpokeToPerson => self.spoke_to_person = checked,
            Activity::TaughtSomeone => self.taught_someone = checked,
            Activity::MadeOffer => self.made_offer = checked,
        }
    }

    /// Number of activities done that day (0-4).
    pub fn score(&self) -> u8 {
        Activity::ALL.iter().filter(|a| self.get(**a)).count() as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Activity {
    Appointment,
    SpokeToPerson,
    TaughtSomeone,
    MadeOffer,
}

impl Activity {
    pub const ALL: [Activity; 4] = [
        Activity::Appointment,
        Activity::SpokeToPerson,
        Activity::TaughtSomeone,
        Activity::MadeOffer,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Appointment => "Appointment Y/N",
            Self::SpokeToPerson => "Spoke to 1 person Y/N",
            Self::TaughtSomeone => "Taught Someone Y/N",
            Self::MadeOffer => "Made an offer Y/N",
        }
    }
}
