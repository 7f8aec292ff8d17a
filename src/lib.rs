//! Momentum: a personal productivity tracker.
//!
//! Tasks move through a small set of collections (Brain Dump, Top 3,
//! Completed History, Ideas Vault) next to a daily Non-Negotiables checklist.
//! Two activity logs (LAPS funnel counts and accountability check-offs) feed
//! the weekly, monthly and heatmap reports.

pub mod assistant;
pub mod calendar;
pub mod clock;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod logs;
mod migrations;
pub mod non_negotiables;
pub mod reports;
pub mod state;
pub mod store;
pub mod types;
pub mod util;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use error::{ErrorPayload, TrackerError};
pub use lifecycle::{TaskBoard, TOP_THREE_CAPACITY};
pub use state::Tracker;
pub use store::{KeyedStore, MemoryStore, SqliteStore};
pub use types::{
    AccountabilityData, Activity, Collection, Direction, LapsData, Task, TaskDuration, TaskUpdate,
};

/// Install the env_logger backend. `RUST_LOG` overrides the `info` default.
/// Safe to call more than once.
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    if env_logger::Builder::from_env(env).try_init().is_ok() {
        log::debug!("Logging initialized");
    }
}
