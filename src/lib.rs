//! Plant care task tracking.
//!
//! The heart of the crate is the recurring task lifecycle: [`store::TaskStore`]
//! owns the task list, spawns the next occurrence when a recurring task is
//! completed ([`recurrence`]), propagates edits across a series
//! ([`chain`]), and groups tasks for display ([`schedule`]). Persistence and
//! species reference data are pluggable collaborators ([`storage`],
//! [`species`]).

pub mod chain;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod plants;
pub mod recurrence;
pub mod schedule;
pub mod species;
pub mod storage;
pub mod store;
pub mod tui;

pub use error::{Result, SproutsError};
pub use models::{Frequency, NewTask, Plant, RecurrencePattern, Task, TaskEdit};
pub use store::{Completion, TaskStore};
