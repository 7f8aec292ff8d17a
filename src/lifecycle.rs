//! Task collection lifecycle.
//!
//! A task id lives in at most one of Brain Dump, Top 3, Completed History and
//! the Ideas Vault. Non-Negotiables are a separate daily template with their
//! own fixed ids and never move between collections.
//!
//! Every operation is planned against the current snapshot and yields a
//! [`Transition`] holding the full replacement list for each collection it
//! touches. The caller persists a transition in one batch and only then
//! [`TaskBoard::apply`]s it, so a move is never half-applied. Operations on
//! ids that are not where the operation expects them plan nothing.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::error::TrackerError;
use crate::store::{keys, KeyedStore, StoreError};
use crate::types::{Collection, Direction, Task, TaskUpdate};

/// Maximum number of tasks in the daily priority slate.
pub const TOP_THREE_CAPACITY: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct TaskBoard {
    date: NaiveDate,
    brain_dump: Vec<Task>,
    top_three: Vec<Task>,
    completed_history: Vec<Task>,
    ideas_vault: Vec<Task>,
    non_negotiables: Vec<Task>,
}

/// Replacement lists for the collections an operation changes.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Transition {
    brain_dump: Option<Vec<Task>>,
    top_three: Option<Vec<Task>>,
    completed_history: Option<Vec<Task>>,
    ideas_vault: Option<Vec<Task>>,
    non_negotiables: Option<Vec<Task>>,
    /// The task the operation created, moved or edited.
    subject: Option<Task>,
}

impl Transition {
    fn set(mut self, collection: Collection, tasks: Vec<Task>) -> Self {
        let slot = match collection {
            Collection::BrainDump => &mut self.brain_dump,
            Collection::TopThree => &mut self.top_three,
            Collection::CompletedHistory => &mut self.completed_history,
            Collection::IdeasVault => &mut self.ideas_vault,
            Collection::NonNegotiables => &mut self.non_negotiables,
        };
        *slot = Some(tasks);
        self
    }

    fn subject(mut self, task: Task) -> Self {
        self.subject = Some(task);
        self
    }

    /// Collections this transition rewrites.
    pub fn touched(&self) -> Vec<Collection> {
        [
            (Collection::BrainDump, self.brain_dump.is_some()),
            (Collection::TopThree, self.top_three.is_some()),
            (Collection::CompletedHistory, self.completed_history.is_some()),
            (Collection::IdeasVault, self.ideas_vault.is_some()),
            (Collection::NonNegotiables, self.non_negotiables.is_some()),
        ]
        .into_iter()
        .filter_map(|(c, touched)| touched.then_some(c))
        .collect()
    }

    /// Store entries for every touched collection, keyed for `date`.
    pub fn entries(&self, date: NaiveDate) -> Result<Vec<(String, Value)>, StoreError> {
        let mut entries = Vec::new();
        let slots = [
            (keys::BRAIN_DUMP.to_string(), &self.brain_dump),
            (keys::top_three(date), &self.top_three),
            (keys::COMPLETED_HISTORY.to_string(), &self.completed_history),
            (keys::IDEAS_VAULT.to_string(), &self.ideas_vault),
            (keys::non_negotiables(date), &self.non_negotiables),
        ];
        for (key, tasks) in slots {
            if let Some(tasks) = tasks {
                entries.push((key, serde_json::to_value(tasks)?));
            }
        }
        Ok(entries)
    }
}

/// Split `id` out of `tasks`, returning it and the remaining list.
fn take(tasks: &[Task], id: &str) -> Option<(Task, Vec<Task>)> {
    let index = tasks.iter().position(|t| t.id == id)?;
    let mut rest = tasks.to_vec();
    let task = rest.remove(index);
    Some((task, rest))
}

fn prepend(task: Task, tasks: &[Task]) -> Vec<Task> {
    let mut out = Vec::with_capacity(tasks.len() + 1);
    out.push(task);
    out.extend_from_slice(tasks);
    out
}

fn replace(tasks: &[Task], task: &Task) -> Vec<Task> {
    tasks
        .iter()
        .map(|t| if t.id == task.id { task.clone() } else { t.clone() })
        .collect()
}

fn validate_task(task: &Task) -> Result<(), TrackerError> {
    TaskUpdate::Text(task.text.clone())
        .validate()
        .and_then(|_| TaskUpdate::ScheduledTime(task.scheduled_time.clone()).validate())
        .map_err(TrackerError::InvalidUpdate)
}

impl TaskBoard {
    /// Empty board for `date` with the default Non-Negotiables template.
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            brain_dump: Vec::new(),
            top_three: Vec::new(),
            completed_history: Vec::new(),
            ideas_vault: Vec::new(),
            non_negotiables: crate::non_negotiables::default_template(),
        }
    }

    /// Read every collection for `date`. Day-scoped slots that were never
    /// written start out empty (Top 3) or from the template (Non-Negotiables).
    pub fn load<S: KeyedStore>(store: &S, date: NaiveDate) -> Result<Self, StoreError> {
        let board = Self {
            date,
            brain_dump: store.get(keys::BRAIN_DUMP, Vec::new())?,
            top_three: store.get(&keys::top_three(date), Vec::new())?,
            completed_history: store.get(keys::COMPLETED_HISTORY, Vec::new())?,
            ideas_vault: store.get(keys::IDEAS_VAULT, Vec::new())?,
            non_negotiables: store.get(
                &keys::non_negotiables(date),
                crate::non_negotiables::default_template(),
            )?,
        };
        let dupes = board.duplicate_ids();
        if !dupes.is_empty() {
            log::warn!("Stored collections share task ids: {:?}", dupes);
        }
        log::debug!(
            "Loaded board for {}: {} brain dump, {} top three, {} completed, {} vault",
            date,
            board.brain_dump.len(),
            board.top_three.len(),
            board.completed_history.len(),
            board.ideas_vault.len()
        );
        Ok(board)
    }

    /// Swap in the day-scoped collections for a new date.
    pub(crate) fn roll_to<S: KeyedStore>(&mut self, store: &S, date: NaiveDate) -> Result<(), StoreError> {
        self.top_three = store.get(&keys::top_three(date), Vec::new())?;
        self.non_negotiables = store.get(
            &keys::non_negotiables(date),
            crate::non_negotiables::default_template(),
        )?;
        self.date = date;
        Ok(())
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn brain_dump(&self) -> &[Task] {
        &self.brain_dump
    }

    pub fn top_three(&self) -> &[Task] {
        &self.top_three
    }

    pub fn completed_history(&self) -> &[Task] {
        &self.completed_history
    }

    pub fn ideas_vault(&self) -> &[Task] {
        &self.ideas_vault
    }

    pub fn non_negotiables(&self) -> &[Task] {
        &self.non_negotiables
    }

    pub fn collection(&self, collection: Collection) -> &[Task] {
        match collection {
            Collection::BrainDump => &self.brain_dump,
            Collection::TopThree => &self.top_three,
            Collection::CompletedHistory => &self.completed_history,
            Collection::IdeasVault => &self.ideas_vault,
            Collection::NonNegotiables => &self.non_negotiables,
        }
    }

    /// Free Top 3 slots.
    pub fn open_slots(&self) -> usize {
        TOP_THREE_CAPACITY.saturating_sub(self.top_three.len())
    }

    /// Locate a task among the lifecycle collections.
    pub fn find(&self, id: &str) -> Option<(Collection, &Task)> {
        [
            Collection::BrainDump,
            Collection::TopThree,
            Collection::CompletedHistory,
            Collection::IdeasVault,
        ]
        .into_iter()
        .find_map(|c| self.collection(c).iter().find(|t| t.id == id).map(|t| (c, t)))
    }

    /// Ids present in more than one lifecycle collection (or twice in one).
    pub fn duplicate_ids(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut dupes = Vec::new();
        let all = self
            .brain_dump
            .iter()
            .chain(&self.top_three)
            .chain(&self.completed_history)
            .chain(&self.ideas_vault);
        for task in all {
            if !seen.insert(task.id.as_str()) {
                dupes.push(task.id.clone());
            }
        }
        dupes
    }

    /// Commit a planned transition to the in-memory snapshot.
    pub fn apply(&mut self, transition: Transition) -> Option<Task> {
        let Transition {
            brain_dump,
            top_three,
            completed_history,
            ideas_vault,
            non_negotiables,
            subject,
        } = transition;

        if let Some(tasks) = brain_dump {
            self.brain_dump = tasks;
        }
        if let Some(tasks) = top_three {
            self.top_three = tasks;
        }
        if let Some(tasks) = completed_history {
            self.completed_history = tasks;
        }
        if let Some(tasks) = ideas_vault {
            self.ideas_vault = tasks;
        }
        if let Some(tasks) = non_negotiables {
            self.non_negotiables = tasks;
        }
        subject
    }

    // =========================================================================
    // Planning
    // =========================================================================

    pub fn plan_create(&self, text: &str) -> Option<Transition> {
        let text = crate::util::normalize_task_text(text)?;
        let task = Task::new(text);
        Some(
            Transition::default()
                .set(Collection::BrainDump, prepend(task.clone(), &self.brain_dump))
                .subject(task),
        )
    }

    /// Single-field edit. Setting `Completed(true)` archives the task.
    pub fn plan_update(
        &self,
        id: &str,
        update: &TaskUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<Transition>, TrackerError> {
        update.validate().map_err(TrackerError::InvalidUpdate)?;
        let current = self
            .brain_dump
            .iter()
            .chain(&self.top_three)
            .find(|t| t.id == id);
        match current {
            Some(task) => Ok(self.plan_replace_checked(update.apply(task), now)),
            None => Ok(None),
        }
    }

    /// Whole-task edit with the same completion semantics as [`plan_update`](Self::plan_update).
    pub fn plan_replace(&self, task: Task, now: DateTime<Utc>) -> Result<Option<Transition>, TrackerError> {
        validate_task(&task)?;
        Ok(self.plan_replace_checked(task, now))
    }

    fn plan_replace_checked(&self, task: Task, now: DateTime<Utc>) -> Option<Transition> {
        let in_brain_dump = self.brain_dump.iter().any(|t| t.id == task.id);
        let in_top_three = self.top_three.iter().any(|t| t.id == task.id);
        if !in_brain_dump && !in_top_three {
            return None;
        }

        if task.is_completed {
            let archived = Task {
                completed_at: Some(now),
                ..task
            };
            let mut transition = Transition::default().set(
                Collection::CompletedHistory,
                prepend(archived.clone(), &self.completed_history),
            );
            if let Some((_, rest)) = take(&self.brain_dump, &archived.id) {
                transition = transition.set(Collection::BrainDump, rest);
            }
            if let Some((_, rest)) = take(&self.top_three, &archived.id) {
                transition = transition.set(Collection::TopThree, rest);
            }
            return Some(transition.subject(archived));
        }

        let edited = Task {
            completed_at: None,
            ..task
        };
        let collection = if in_brain_dump {
            Collection::BrainDump
        } else {
            Collection::TopThree
        };
        Some(
            Transition::default()
                .set(collection, replace(self.collection(collection), &edited))
                .subject(edited),
        )
    }

    pub fn plan_promote(&self, id: &str) -> Result<Option<Transition>, TrackerError> {
        let Some((task, rest)) = take(&self.brain_dump, id) else {
            return Ok(None);
        };
        if self.top_three.len() >= TOP_THREE_CAPACITY {
            return Err(TrackerError::CapacityExceeded {
                limit: TOP_THREE_CAPACITY,
            });
        }
        let mut top_three = self.top_three.clone();
        top_three.push(task.clone());
        Ok(Some(
            Transition::default()
                .set(Collection::BrainDump, rest)
                .set(Collection::TopThree, top_three)
                .subject(task),
        ))
    }

    pub fn plan_demote(&self, id: &str) -> Option<Transition> {
        let (task, rest) = take(&self.top_three, id)?;
        Some(
            Transition::default()
                .set(Collection::TopThree, rest)
                .set(Collection::BrainDump, prepend(task.clone(), &self.brain_dump))
                .subject(task),
        )
    }

    /// Brain Dump only; a Top 3 task has to be demoted first.
    pub fn plan_send_to_vault(&self, id: &str) -> Option<Transition> {
        let (task, rest) = take(&self.brain_dump, id)?;
        Some(
            Transition::default()
                .set(Collection::BrainDump, rest)
                .set(Collection::IdeasVault, prepend(task.clone(), &self.ideas_vault))
                .subject(task),
        )
    }

    /// Vault entries are templates: the copy gets a new id, the entry stays.
    pub fn plan_copy_from_vault(&self, id: &str) -> Option<Transition> {
        let template = self.ideas_vault.iter().find(|t| t.id == id)?;
        let copy = template.duplicate();
        Some(
            Transition::default()
                .set(Collection::BrainDump, prepend(copy.clone(), &self.brain_dump))
                .subject(copy),
        )
    }

    pub fn plan_reorder_vault(&self, id: &str, direction: Direction) -> Option<Transition> {
        let index = self.ideas_vault.iter().position(|t| t.id == id)?;
        let neighbour = match direction {
            Direction::Up => index.checked_sub(1)?,
            Direction::Down if index + 1 < self.ideas_vault.len() => index + 1,
            Direction::Down => return None,
        };
        let mut vault = self.ideas_vault.clone();
        vault.swap(index, neighbour);
        let subject = vault[neighbour].clone();
        Some(
            Transition::default()
                .set(Collection::IdeasVault, vault)
                .subject(subject),
        )
    }

    pub fn plan_restore(&self, id: &str) -> Option<Transition> {
        let (task, rest) = take(&self.completed_history, id)?;
        let restored = Task {
            is_completed: false,
            completed_at: None,
            ..task
        };
        Some(
            Transition::default()
                .set(Collection::CompletedHistory, rest)
                .set(Collection::BrainDump, prepend(restored.clone(), &self.brain_dump))
                .subject(restored),
        )
    }

    pub fn plan_delete(&self, id: &str, collection: Collection) -> Option<Transition> {
        let (task, rest) = take(self.collection(collection), id)?;
        Some(Transition::default().set(collection, rest).subject(task))
    }

    /// Return unfinished priorities to the Brain Dump with their schedule and
    /// notes cleared, and empty today's Top 3.
    pub fn plan_start_new_day(&self) -> Transition {
        let carried: Vec<Task> = self
            .top_three
            .iter()
            .filter(|t| !t.is_completed)
            .map(|t| Task {
                scheduled_time: String::new(),
                notes: String::new(),
                ..t.clone()
            })
            .collect();

        let mut brain_dump = self.brain_dump.clone();
        brain_dump.extend(carried);
        Transition::default()
            .set(Collection::BrainDump, brain_dump)
            .set(Collection::TopThree, Vec::new())
    }

    /// In-place edit of a Non-Negotiable. Completion only ticks the box.
    pub fn plan_update_non_negotiable(
        &self,
        id: &str,
        update: &TaskUpdate,
    ) -> Result<Option<Transition>, TrackerError> {
        update.validate().map_err(TrackerError::InvalidUpdate)?;
        let Some(task) = self.non_negotiables.iter().find(|t| t.id == id) else {
            return Ok(None);
        };
        let edited = update.apply(task);
        Ok(Some(
            Transition::default()
                .set(Collection::NonNegotiables, replace(&self.non_negotiables, &edited))
                .subject(edited),
        ))
    }
}
