use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::chain::{chain_positions, resolve_chain};
use crate::error::{Result, SproutsError};
use crate::models::{NewTask, RecurrencePattern, Task, TaskEdit};
use crate::recurrence::next_due_date;
use crate::schedule::{next_task, Agenda};
use crate::storage::{load_collection, save_collection, BlobStore, TASKS_SLOT};

/// Outcome of completing a task.
#[derive(Debug, Clone)]
pub struct Completion {
    /// The task as it now stands.
    pub completed: Task,
    /// The next occurrence, when the task recurs.
    pub spawned: Option<Task>,
    /// The task was already completed and nothing changed.
    pub already_completed: bool,
}

/// The authoritative set of tasks, mirrored to a durable blob store.
///
/// Every mutation rewrites the whole collection. A failed write is logged and
/// retried by the next mutation; the in-memory state is never rolled back.
pub struct TaskStore<B: BlobStore> {
    tasks: Vec<Task>,
    backend: B,
    pending_write: bool,
}

impl<B: BlobStore> TaskStore<B> {
    /// Loads the task set. Missing data yields an empty store; unreadable or
    /// malformed data is logged and also yields an empty store.
    pub fn load(backend: B) -> Self {
        let tasks = match load_collection::<Task, _>(&backend, TASKS_SLOT) {
            Ok(tasks) => {
                tracing::debug!(count = tasks.len(), "loaded tasks");
                dedup_ids(tasks)
            }
            Err(e) => {
                tracing::error!(error = %e, "could not load tasks, starting with an empty list");
                Vec::new()
            }
        };
        TaskStore { tasks, backend, pending_write: false }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// True while the latest state has not reached the durable store.
    pub fn has_pending_write(&self) -> bool {
        self.pending_write
    }

    /// Resolves a full id, or an unambiguous prefix or suffix of one.
    pub fn resolve_id(&self, id_or_prefix: &str) -> Result<String> {
        let needle = id_or_prefix.trim();
        if needle.is_empty() {
            return Err(SproutsError::Validation("Task id must not be empty.".into()));
        }
        if let Some(t) = self.get(needle) {
            return Ok(t.id.clone());
        }
        let matches: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| t.id.starts_with(needle) || t.id.ends_with(needle))
            .collect();
        match matches.as_slice() {
            [] => Err(SproutsError::task_not_found(needle)),
            [t] => Ok(t.id.clone()),
            _ => Err(SproutsError::Validation(format!(
                "Task id '{}' is ambiguous ({} matches).",
                needle,
                matches.len()
            ))),
        }
    }

    /// Creates a root task.
    pub fn create(&mut self, new: NewTask) -> Result<&Task> {
        let title = required_title(&new.title)?;
        let task = Task {
            id: self.fresh_id(),
            title,
            plant_name: optional_text(new.plant_name),
            description: optional_text(new.description),
            due_date: new.due_date,
            recurrence: new.frequency.map(RecurrencePattern::new),
            completed_date: None,
            created_date: Utc::now(),
            parent_task_id: None,
        };
        tracing::info!(task_id = %task.id, title = %task.title, due = %task.due_date, "task created");
        self.tasks.push(task);
        self.persist();
        Ok(&self.tasks[self.tasks.len() - 1])
    }

    /// Applies `edit` to every member of the task's lineage.
    ///
    /// Due dates, ids, completion state and creation time are left alone.
    /// Turning recurrence off leaves already spawned instances in place as
    /// one-off tasks that still point at their root.
    ///
    /// Returns the number of tasks updated.
    pub fn edit(&mut self, task_id: &str, edit: TaskEdit) -> Result<usize> {
        let title = required_title(&edit.title)?;
        let positions =
            chain_positions(&self.tasks, task_id).ok_or_else(|| SproutsError::task_not_found(task_id))?;

        let plant_name = optional_text(edit.plant_name);
        let description = optional_text(edit.description);
        let recurrence = edit.frequency.map(RecurrencePattern::new);
        for &i in &positions {
            let t = &mut self.tasks[i];
            t.title = title.clone();
            t.plant_name = plant_name.clone();
            t.description = description.clone();
            t.recurrence = recurrence;
        }
        tracing::info!(task_id, updated = positions.len(), "lineage edited");
        self.persist();
        Ok(positions.len())
    }

    /// Marks a task completed and, if it recurs, spawns its next occurrence.
    pub fn complete(&mut self, task_id: &str) -> Result<Completion> {
        let idx = self.position(task_id)?;
        if self.tasks[idx].is_completed() {
            tracing::debug!(task_id, "task already completed");
            return Ok(Completion {
                completed: self.tasks[idx].clone(),
                spawned: None,
                already_completed: true,
            });
        }

        // Compute the follow-up first so an out-of-range date leaves the task untouched.
        let spawned = match self.tasks[idx].recurrence {
            Some(pattern) => {
                let origin = &self.tasks[idx];
                let due_date = next_due_date(origin.due_date, pattern.frequency)?;
                Some(Task {
                    id: self.fresh_id(),
                    title: origin.title.clone(),
                    plant_name: origin.plant_name.clone(),
                    description: origin.description.clone(),
                    due_date,
                    recurrence: Some(pattern),
                    completed_date: None,
                    created_date: Utc::now(),
                    parent_task_id: Some(origin.root_id().to_string()),
                })
            }
            None => None,
        };

        self.tasks[idx].completed_date = Some(Utc::now());
        let completed = self.tasks[idx].clone();
        tracing::info!(task_id, "task completed");

        if let Some(next) = &spawned {
            tracing::info!(
                task_id = %next.id,
                root_id = next.parent_task_id.as_deref().unwrap_or_default(),
                due = %next.due_date,
                "next occurrence scheduled"
            );
            self.tasks.push(next.clone());
        }
        self.persist();

        Ok(Completion { completed, spawned, already_completed: false })
    }

    /// Moves a single instance to a new due date. Other lineage members keep
    /// their schedules.
    pub fn reschedule(&mut self, task_id: &str, due_date: NaiveDate) -> Result<&Task> {
        let idx = self.position(task_id)?;
        self.tasks[idx].due_date = due_date;
        tracing::info!(task_id, due = %due_date, "task rescheduled");
        self.persist();
        Ok(&self.tasks[idx])
    }

    /// Removes exactly one task. Unknown ids are ignored.
    pub fn delete(&mut self, task_id: &str) -> Option<Task> {
        let idx = self.tasks.iter().position(|t| t.id == task_id)?;
        let removed = self.tasks.remove(idx);
        tracing::info!(task_id, "task deleted");
        self.persist();
        Some(removed)
    }

    /// Every task in the same lineage as `task_id`.
    pub fn chain(&self, task_id: &str) -> Option<Vec<&Task>> {
        resolve_chain(&self.tasks, task_id)
    }

    pub fn agenda(&self, today: NaiveDate) -> Agenda<'_> {
        Agenda::build(&self.tasks, today)
    }

    pub fn next_task(&self) -> Option<&Task> {
        next_task(&self.tasks)
    }

    /// Drops every task and clears the durable slot.
    pub fn reset(&mut self) -> Result<()> {
        self.tasks.clear();
        self.backend.clear(TASKS_SLOT)?;
        self.pending_write = false;
        tracing::info!("task list reset");
        Ok(())
    }

    /// Writes the whole collection. Returns whether the write succeeded.
    pub fn persist(&mut self) -> bool {
        match save_collection(&mut self.backend, TASKS_SLOT, &self.tasks) {
            Ok(()) => {
                if self.pending_write {
                    tracing::info!("pending task write recovered");
                }
                self.pending_write = false;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to save tasks, will retry on next change");
                self.pending_write = true;
                false
            }
        }
    }

    fn position(&self, task_id: &str) -> Result<usize> {
        self.tasks
            .iter()
            .position(|t| t.id == task_id)
            .ok_or_else(|| SproutsError::task_not_found(task_id))
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = Uuid::now_v7().to_string();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }
}

/// Keeps the first task for each id; later duplicates are dropped and logged.
fn dedup_ids(tasks: Vec<Task>) -> Vec<Task> {
    let mut seen = HashSet::new();
    tasks
        .into_iter()
        .filter(|t| {
            let fresh = seen.insert(t.id.clone());
            if !fresh {
                tracing::warn!(task_id = %t.id, title = %t.title, "dropping task with duplicate id");
            }
            fresh
        })
        .collect()
}

fn required_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(SproutsError::Validation("Please enter a task title.".into()));
    }
    Ok(title.to_string())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
