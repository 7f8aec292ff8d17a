//! Keyed JSON persistence.
//!
//! Every board collection and both activity logs live under their own key.
//! Values are whole JSON documents, read once at load and rewritten in full
//! on every mutation. Writes that must land together go through
//! [`KeyedStore::set_many`], which implementations commit atomically.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub mod memory;
pub mod sqlite;
pub mod types;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use types::*;

pub trait KeyedStore {
    /// Raw JSON stored at `key`, if any.
    fn get_value(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Write every entry or none of them.
    fn set_many(&mut self, entries: Vec<(String, Value)>) -> Result<(), StoreError>;

    fn remove(&mut self, key: &str) -> Result<(), StoreError>;

    fn keys(&self) -> Result<Vec<String>, StoreError>;

    /// Typed read that falls back to `default` when the key is missing or
    /// its payload no longer parses.
    fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, StoreError>
    where
        Self: Sized,
    {
        match self.get_value(key)? {
            None => Ok(default),
            Some(value) => match serde_json::from_value(value) {
                Ok(parsed) => Ok(parsed),
                Err(e) => {
                    log::warn!("Stored value for {key} is unreadable ({e}); using default");
                    Ok(default)
                }
            },
        }
    }

    fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StoreError>
    where
        Self: Sized,
    {
        let value = serde_json::to_value(value)?;
        self.set_many(vec![(key.to_string(), value)])
    }
}

/// Storage keys. Names match the layout the web client wrote to local storage,
/// so exported data imports unchanged.
pub mod keys {
    use super::NaiveDate;

    pub const BRAIN_DUMP: &str = "timeboxing-brainDump";
    pub const COMPLETED_HISTORY: &str = "timeboxing-completedHistory";
    pub const IDEAS_VAULT: &str = "timeboxing-ideasVault";
    pub const LAPS_HISTORY: &str = "lapsHistory";
    pub const ACCOUNTABILITY_HISTORY: &str = "accountability-history";

    pub const TOP_THREE_PREFIX: &str = "timeboxing-topThree_";
    pub const NON_NEGOTIABLE_PREFIX: &str = "timeboxing-nonNegotiable_";

    pub fn top_three(date: NaiveDate) -> String {
        format!("{}{}", TOP_THREE_PREFIX, date.format("%Y-%m-%d"))
    }

    pub fn non_negotiables(date: NaiveDate) -> String {
        format!("{}{}", NON_NEGOTIABLE_PREFIX, date.format("%Y-%m-%d"))
    }

    /// Date suffix of a day-scoped key, if `key` is one.
    pub fn scoped_date(key: &str) -> Option<NaiveDate> {
        let suffix = key
            .strip_prefix(TOP_THREE_PREFIX)
            .or_else(|| key.strip_prefix(NON_NEGOTIABLE_PREFIX))?;
        NaiveDate::parse_from_str(suffix, "%Y-%m-%d").ok()
    }
}

/// Drop day-scoped slots older than `keep_from`. Returns how many were removed.
pub fn prune_day_scoped<S: KeyedStore>(store: &mut S, keep_from: NaiveDate) -> Result<usize, StoreError> {
    let stale: Vec<String> = store
        .keys()?
        .into_iter()
        .filter(|key| keys::scoped_date(key).is_some_and(|date| date < keep_from))
        .collect();

    for key in &stale {
        store.remove(key)?;
    }
    if !stale.is_empty() {
        log::info!("Pruned {} day-scoped slots older than {}", stale.len(), keep_from);
    }
    Ok(stale.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_day_scoped_keys() {
        assert_eq!(keys::top_three(d(2026, 10, 19)), "timeboxing-topThree_2026-10-19");
        assert_eq!(
            keys::non_negotiables(d(2026, 1, 2)),
            "timeboxing-nonNegotiable_2026-01-02"
        );
        assert_eq!(keys::scoped_date("timeboxing-topThree_2026-10-19"), Some(d(2026, 10, 19)));
        assert_eq!(keys::scoped_date(keys::BRAIN_DUMP), None);
    }

    #[test]
    fn test_get_falls_back_on_unreadable_payload() {
        let mut store = MemoryStore::new();
        store
            .set_many(vec![(keys::BRAIN_DUMP.to_string(), Value::String("garbage".into()))])
            .unwrap();
        let tasks: Vec<crate::types::Task> = store.get(keys::BRAIN_DUMP, Vec::new()).unwrap();
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_prune_keeps_recent_and_unscoped() {
        let mut store = MemoryStore::new();
        store.set(&keys::top_three(d(2026, 10, 1)), &Vec::<u8>::new()).unwrap();
        store.set(&keys::non_negotiables(d(2026, 10, 2)), &Vec::<u8>::new()).unwrap();
        store.set(&keys::top_three(d(2026, 10, 19)), &Vec::<u8>::new()).unwrap();
        store.set(keys::BRAIN_DUMP, &Vec::<u8>::new()).unwrap();

        let removed = prune_day_scoped(&mut store, d(2026, 10, 12)).unwrap();
        assert_eq!(removed, 2);

        let mut remaining = store.keys().unwrap();
        remaining.sort();
        assert_eq!(
            remaining,
            vec![
                keys::BRAIN_DUMP.to_string(),
                keys::top_three(d(2026, 10, 19)),
            ]
        );
    }
}
