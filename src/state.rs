//! Tracker state: the board and activity logs bound to their store.
//!
//! `Tracker` is the only mutation surface the presentation layer sees. Each
//! command plans a change against the in-memory snapshot, persists every
//! touched slot in one `set_many`, and only then swaps the new state in.

use chrono::NaiveDate;
use serde_json::Value;

use crate::calendar::{self, LinkKind};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::TrackerError;
use crate::lifecycle::{TaskBoard, Transition};
use crate::logs::{self, AccountabilityWeek, ActivityLogs};
use crate::reports::{self, Heatmap, MonthBucket, WeeklyFunnel};
use crate::store::{keys, KeyedStore, SqliteStore};
use crate::types::{Activity, Collection, Direction, LapsData, Task, TaskUpdate};

pub struct Tracker<S: KeyedStore, C: Clock> {
    store: S,
    clock: C,
    board: TaskBoard,
    logs: ActivityLogs,
}

impl Tracker<SqliteStore, SystemClock> {
    /// Open the configured SQLite store in the configured timezone.
    pub fn open(config: &Config) -> Result<Self, TrackerError> {
        let store = SqliteStore::open_at(config.resolved_store_path()?)?;
        let clock = SystemClock::new(config.tz()?);
        Self::load(store, clock)
    }
}

impl<S: KeyedStore, C: Clock> Tracker<S, C> {
    pub fn load(store: S, clock: C) -> Result<Self, TrackerError> {
        let today = clock.today();
        let board = TaskBoard::load(&store, today)?;
        let logs = ActivityLogs::load(&store)?;
        log::info!("Tracker loaded for {}", today);
        Ok(Self {
            store,
            clock,
            board,
            logs,
        })
    }

    pub fn board(&self) -> &TaskBoard {
        &self.board
    }

    pub fn logs(&self) -> &ActivityLogs {
        &self.logs
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn commit(&mut self, transition: Option<Transition>, action: &str) -> Result<Option<Task>, TrackerError> {
        let Some(transition) = transition else {
            log::debug!("{action}: nothing to do");
            return Ok(None);
        };
        let entries = transition.entries(self.board.date())?;
        self.store.set_many(entries)?;
        log::info!("{action}: committed {:?}", transition.touched());
        Ok(self.board.apply(transition))
    }

    // =========================================================================
    // Board commands
    // =========================================================================

    /// Add a task to the top of the Brain Dump. Blank text is ignored.
    pub fn create(&mut self, text: &str) -> Result<Option<Task>, TrackerError> {
        let plan = self.board.plan_create(text);
        self.commit(plan, "create")
    }

    /// Edit one field. Non-Negotiable ids are edited in place; everything else
    /// follows the board's completion rules.
    pub fn update(&mut self, id: &str, update: TaskUpdate) -> Result<Option<Task>, TrackerError> {
        if crate::non_negotiables::is_template_id(id) {
            return self.update_non_negotiable(id, update);
        }
        let plan = self.board.plan_update(id, &update, self.clock.now())?;
        self.commit(plan, "update")
    }

    pub fn replace(&mut self, task: Task) -> Result<Option<Task>, TrackerError> {
        let plan = self.board.plan_replace(task, self.clock.now())?;
        self.commit(plan, "replace")
    }

    pub fn update_non_negotiable(&mut self, id: &str, update: TaskUpdate) -> Result<Option<Task>, TrackerError> {
        let plan = self.board.plan_update_non_negotiable(id, &update)?;
        self.commit(plan, "update_non_negotiable")
    }

    pub fn promote(&mut self, id: &str) -> Result<Option<Task>, TrackerError> {
        let plan = self.board.plan_promote(id).inspect_err(|e| {
            log::info!("promote {id} rejected: {e}");
        })?;
        self.commit(plan, "promote")
    }

    pub fn demote(&mut self, id: &str) -> Result<Option<Task>, TrackerError> {
        let plan = self.board.plan_demote(id);
        self.commit(plan, "demote")
    }

    pub fn send_to_vault(&mut self, id: &str) -> Result<Option<Task>, TrackerError> {
        let plan = self.board.plan_send_to_vault(id);
        self.commit(plan, "send_to_vault")
    }

    /// Returns the new Brain Dump copy.
    pub fn copy_from_vault(&mut self, id: &str) -> Result<Option<Task>, TrackerError> {
        let plan = self.board.plan_copy_from_vault(id);
        self.commit(plan, "copy_from_vault")
    }

    pub fn reorder_vault_entry(&mut self, id: &str, direction: Direction) -> Result<Option<Task>, TrackerError> {
        let plan = self.board.plan_reorder_vault(id, direction);
        self.commit(plan, "reorder_vault_entry")
    }

    pub fn restore(&mut self, id: &str) -> Result<Option<Task>, TrackerError> {
        let plan = self.board.plan_restore(id);
        self.commit(plan, "restore")
    }

    /// Irreversible; confirming with the user is the caller's job.
    pub fn delete_permanently(&mut self, id: &str, collection: Collection) -> Result<Option<Task>, TrackerError> {
        let plan = self.board.plan_delete(id, collection);
        self.commit(plan, "delete_permanently")
    }

    /// Close out the current day and open today's day-scoped slots.
    ///
    /// Returns the tasks carried back into the Brain Dump.
    pub fn start_new_day(&mut self) -> Result<Vec<Task>, TrackerError> {
        let carried: Vec<Task> = self
            .board
            .top_three()
            .iter()
            .filter(|t| !t.is_completed)
            .cloned()
            .collect();
        let plan = self.board.plan_start_new_day();
        self.commit(Some(plan), "start_new_day")?;

        let today = self.clock.today();
        if today != self.board.date() {
            log::info!("Rolling board from {} to {}", self.board.date(), today);
        }
        self.board.roll_to(&self.store, today)?;
        Ok(carried)
    }

    /// Remove Top 3 / Non-Negotiables slots from days before `keep_from`.
    pub fn prune_day_slots(&mut self, keep_from: NaiveDate) -> Result<usize, TrackerError> {
        Ok(crate::store::prune_day_scoped(&mut self.store, keep_from)?)
    }

    pub fn non_negotiables_visible(&self) -> bool {
        crate::non_negotiables::visible_on(self.clock.today())
    }

    /// Calendar link for a Brain Dump, Top 3 or Non-Negotiable task on the
    /// board's date. Archived and vaulted tasks have no link.
    pub fn calendar_link(&self, id: &str) -> Result<Option<url::Url>, TrackerError> {
        let date = self.board.date();
        let tz = self.clock.timezone();
        let by_id = |tasks: &[Task]| tasks.iter().find(|t| t.id == id).cloned();
        let found = by_id(self.board.non_negotiables())
            .map(|task| (task, LinkKind::NonNegotiable))
            .or_else(|| by_id(self.board.top_three()).map(|task| (task, LinkKind::Priority)))
            .or_else(|| by_id(self.board.brain_dump()).map(|task| (task, LinkKind::Priority)));
        match found {
            Some((task, kind)) => calendar::calendar_link(&task, date, tz, kind).map(Some),
            None => Ok(None),
        }
    }

    // =========================================================================
    // Activity logs
    // =========================================================================

    pub fn record_laps(&mut self, entry: LapsData) -> Result<(), TrackerError> {
        let laps = self.logs.with_laps(entry);
        self.store.set(keys::LAPS_HISTORY, &laps)?;
        self.logs.replace_laps(laps);
        Ok(())
    }

    pub fn set_accountability(
        &mut self,
        date: NaiveDate,
        activity: Activity,
        checked: bool,
    ) -> Result<(), TrackerError> {
        let log = self.logs.with_activity(date, activity, checked);
        self.store.set(keys::ACCOUNTABILITY_HISTORY, &log)?;
        self.logs.replace_accountability(log);
        Ok(())
    }

    pub fn accountability_week(&self, week_offset: i64) -> AccountabilityWeek {
        logs::accountability_week(self.logs.accountability(), self.clock.today(), week_offset)
    }

    /// Full snapshot of both logs, e.g. for export.
    pub fn export_logs(&self) -> Result<Value, TrackerError> {
        let mut map = serde_json::Map::new();
        map.insert(keys::LAPS_HISTORY.to_string(), serde_json::to_value(self.logs.laps())?);
        map.insert(
            keys::ACCOUNTABILITY_HISTORY.to_string(),
            serde_json::to_value(self.logs.accountability())?,
        );
        Ok(Value::Object(map))
    }

    // =========================================================================
    // Reports
    // =========================================================================

    pub fn weekly_funnel(&self) -> WeeklyFunnel {
        reports::weekly_funnel(self.logs.laps(), self.clock.today())
    }

    pub fn monthly_trend(&self) -> Vec<MonthBucket> {
        reports::monthly_trend(self.logs.laps(), self.clock.today())
    }

    pub fn accountability_heatmap(&self) -> Heatmap {
        reports::accountability_heatmap(self.logs.accountability(), self.clock.today())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::store::sqlite::test_utils::test_store;
    use crate::store::{MemoryStore, StoreError};

    /// Memory store whose writes can be switched off.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_writes: bool,
    }

    impl KeyedStore for FlakyStore {
        fn get_value(&self, key: &str) -> Result<Option<Value>, StoreError> {
            self.inner.get_value(key)
        }

        fn set_many(&mut self, entries: Vec<(String, Value)>) -> Result<(), StoreError> {
            if self.fail_writes {
                return Err(StoreError::HomeDirNotFound);
            }
            self.inner.set_many(entries)
        }

        fn remove(&mut self, key: &str) -> Result<(), StoreError> {
            if self.fail_writes {
                return Err(StoreError::HomeDirNotFound);
            }
            self.inner.remove(key)
        }

        fn keys(&self) -> Result<Vec<String>, StoreError> {
            self.inner.keys()
        }
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn tracker() -> Tracker<MemoryStore, FixedClock> {
        Tracker::load(MemoryStore::new(), FixedClock::at_date(monday())).unwrap()
    }

    #[test]
    fn test_commands_persist_every_touched_slot() {
        let mut t = tracker();
        let task = t.create("follow up with Lee").unwrap().unwrap();
        t.promote(&task.id).unwrap();

        let reloaded = TaskBoard::load(t.store(), monday()).unwrap();
        assert!(reloaded.brain_dump().is_empty());
        assert_eq!(reloaded.top_three()[0].id, task.id);
    }

    #[test]
    fn test_fourth_promotion_rejected_without_writes() {
        let mut t = tracker();
        for i in 0..4 {
            t.create(&format!("task {i}")).unwrap();
        }
        let ids: Vec<String> = t.board().brain_dump().iter().map(|t| t.id.clone()).collect();
        for id in &ids[..3] {
            t.promote(id).unwrap();
        }
        let before = t.board().clone();
        let err = t.promote(&ids[3]).unwrap_err();
        assert!(matches!(err, TrackerError::CapacityExceeded { .. }));
        assert_eq!(t.board(), &before);
        let stored = TaskBoard::load(t.store(), monday()).unwrap();
        assert_eq!(stored.top_three().len(), 3);
        assert_eq!(stored.brain_dump().len(), 1);
    }

    #[test]
    fn test_completion_stamps_clock_time() {
        let mut t = tracker();
        let task = t.create("send invoice").unwrap().unwrap();
        let done = t.update(&task.id, TaskUpdate::Completed(true)).unwrap().unwrap();
        assert_eq!(done.completed_at, Some(t.clock().now()));
        assert_eq!(t.board().completed_history().len(), 1);
    }

    #[test]
    fn test_update_routes_non_negotiables() {
        let mut t = tracker();
        t.update("nn-linkedin", TaskUpdate::ScheduledTime("08:15".into()))
            .unwrap();
        let stored: Vec<Task> = t
            .store()
            .get(&keys::non_negotiables(monday()), Vec::new())
            .unwrap();
        assert_eq!(stored[1].scheduled_time, "08:15");
        assert!(t.calendar_link("nn-linkedin").unwrap().is_some());
    }

    #[test]
    fn test_start_new_day_rolls_scoped_slots() {
        let mut clock = FixedClock::at_date(monday());
        let mut t = Tracker::load(MemoryStore::new(), clock.clone()).unwrap();
        let a = t.create("a").unwrap().unwrap();
        let b = t.create("b").unwrap().unwrap();
        t.promote(&a.id).unwrap();
        t.promote(&b.id).unwrap();
        t.update(&a.id, TaskUpdate::Notes("call first".into())).unwrap();
        t.update(&b.id, TaskUpdate::Completed(true)).unwrap();
        t.update_non_negotiable("nn-prospecting", TaskUpdate::Completed(true))
            .unwrap();

        // Reopen the next morning, then start the day.
        clock.advance(chrono::Duration::days(1));
        let store = t.store().clone();
        let mut next = Tracker::load(store, clock).unwrap();
        assert!(next.board().top_three().is_empty());
        assert!(next.board().non_negotiables().iter().all(|t| !t.is_completed));

        let carried = t.start_new_day().unwrap();
        assert_eq!(carried.len(), 1);
        assert_eq!(carried[0].id, a.id);
        assert_eq!(t.board().brain_dump().last().unwrap().notes, "");
        assert!(t.board().top_three().is_empty());
        assert_eq!(t.board().completed_history()[0].id, b.id);

        // Tuesday's board never saw Monday's priorities.
        assert!(next.start_new_day().unwrap().is_empty());
        assert!(next.board().brain_dump().is_empty());
    }

    #[test]
    fn test_start_new_day_moves_to_clock_date() {
        let mut t = tracker();
        let a = t.create("a").unwrap().unwrap();
        t.promote(&a.id).unwrap();

        t.clock.advance(chrono::Duration::days(1));
        t.start_new_day().unwrap();
        assert_eq!(t.board().date(), monday() + chrono::Duration::days(1));
        assert_eq!(t.board().brain_dump()[0].id, a.id);

        let old: Vec<Task> = t.store().get(&keys::top_three(monday()), vec![]).unwrap();
        assert!(old.is_empty());
        assert_eq!(t.prune_day_slots(monday() + chrono::Duration::days(1)).unwrap(), 1);
    }

    #[test]
    fn test_logs_feed_reports() {
        let mut t = tracker();
        t.record_laps(LapsData {
            date: monday(),
            leads: 10,
            appointments: 5,
            presentations: 2,
            sales: 1,
        })
        .unwrap();
        t.set_accountability(monday(), Activity::Appointment, true).unwrap();
        t.set_accountability(monday(), Activity::MadeOffer, true).unwrap();

        let funnel = t.weekly_funnel();
        assert_eq!(
            (
                funnel.lead_to_appointment,
                funnel.appointment_to_presentation,
                funnel.presentation_to_sale
            ),
            (50.0, 40.0, 50.0)
        );
        assert_eq!(t.monthly_trend().last().unwrap().totals.leads, 10);
        let heatmap = t.accountability_heatmap();
        assert_eq!(heatmap.days().nth(18).unwrap().score, 2);
        assert_eq!(t.accountability_week(0).total(Activity::MadeOffer), 1);

        let reloaded = ActivityLogs::load(t.store()).unwrap();
        assert_eq!(reloaded, *t.logs());
        let export = t.export_logs().unwrap();
        assert_eq!(export["lapsHistory"][0]["leads"], 10);
    }

    #[test]
    fn test_sqlite_backed_tracker_survives_reopen() {
        let store = test_store();
        let mut t = Tracker::load(store, FixedClock::at_date(monday())).unwrap();
        let idea = t.create("podcast idea").unwrap().unwrap();
        t.send_to_vault(&idea.id).unwrap();
        let copy = t.copy_from_vault(&idea.id).unwrap().unwrap();
        t.delete_permanently(&copy.id, Collection::BrainDump).unwrap();

        let board = TaskBoard::load(t.store(), monday()).unwrap();
        assert_eq!(board.ideas_vault().len(), 1);
        assert!(board.brain_dump().is_empty());
    }

    #[test]
    fn test_calendar_link_requires_valid_time() {
        let mut t = tracker();
        let task = t.create("demo").unwrap().unwrap();
        let err = t.calendar_link(&task.id).unwrap_err();
        assert!(matches!(err, TrackerError::InvalidSchedule(_)));
        assert!(t.calendar_link("missing").unwrap().is_none());

        t.update(&task.id, TaskUpdate::ScheduledTime("16:45".into())).unwrap();
        let url = t.calendar_link(&task.id).unwrap().unwrap();
        assert!(url.as_str().contains("20261019T164500Z"));
    }

    #[test]
    fn test_non_negotiables_hidden_on_weekend() {
        let t = tracker();
        assert!(t.non_negotiables_visible());
        let saturday = Tracker::load(
            MemoryStore::new(),
            FixedClock::at_date(monday() + chrono::Duration::days(5)),
        )
        .unwrap();
        assert!(!saturday.non_negotiables_visible());
    }

    #[test]
    fn test_failed_commit_leaves_board_untouched() {
        let mut t = Tracker::load(FlakyStore::default(), FixedClock::at_date(monday())).unwrap();
        let a = t.create("a").unwrap().unwrap();
        let b = t.create("b").unwrap().unwrap();
        let c = t.create("c").unwrap().unwrap();
        t.promote(&a.id).unwrap();
        t.update(&c.id, TaskUpdate::Completed(true)).unwrap();

        t.store.fail_writes = true;
        let before = t.board().clone();

        let err = t.promote(&b.id).unwrap_err();
        assert!(matches!(err, TrackerError::Store(StoreError::HomeDirNotFound)));
        assert_eq!(t.board(), &before);

        assert!(t.restore(&c.id).is_err());
        assert_eq!(t.board(), &before);

        t.clock.advance(chrono::Duration::days(1));
        assert!(t.start_new_day().is_err());
        assert_eq!(t.board(), &before);
        assert_eq!(t.board().date(), monday());

        let stored = TaskBoard::load(t.store(), monday()).unwrap();
        assert_eq!(stored, before);
    }

    #[test]
    fn test_duplicate_stored_ids_do_not_block_commands() {
        let task = Task::new("imported twice");
        let mut store = MemoryStore::new();
        store
            .set(keys::BRAIN_DUMP, &vec![task.clone(), task.clone()])
            .unwrap();

        let mut t = Tracker::load(store, FixedClock::at_date(monday())).unwrap();
        assert_eq!(t.board().duplicate_ids(), vec![task.id.clone()]);

        let created = t.create("y").unwrap().unwrap();
        assert_eq!(t.board().brain_dump().len(), 3);
        assert_eq!(t.board().brain_dump()[0].id, created.id);
        let stored = TaskBoard::load(t.store(), monday()).unwrap();
        assert_eq!(stored.brain_dump(), t.board().brain_dump());
    }

    #[test]
    fn test_calendar_link_skips_archived_and_vaulted_tasks() {
        let mut t = tracker();
        let done = t.create("done").unwrap().unwrap();
        let idea = t.create("idea").unwrap().unwrap();
        for id in [&done.id, &idea.id] {
            t.update(id, TaskUpdate::ScheduledTime("10:00".into())).unwrap();
        }
        t.update(&done.id, TaskUpdate::Completed(true)).unwrap();
        t.send_to_vault(&idea.id).unwrap();

        assert!(t.calendar_link(&done.id).unwrap().is_none());
        assert!(t.calendar_link(&idea.id).unwrap().is_none());

        let top = t.create("top").unwrap().unwrap();
        t.update(&top.id, TaskUpdate::ScheduledTime("11:00".into())).unwrap();
        t.promote(&top.id).unwrap();
        let url = t.calendar_link(&top.id).unwrap().unwrap();
        assert!(url.query_pairs().any(|(k, v)| k == "crm" && v == "BUSY"));
    }
}
