//! Task records as exchanged with the server and held by the cache.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::id::TaskId;

/// Fold a label or query for case-insensitive comparison.
#[must_use]
pub fn fold_case(value: &str) -> String {
    value.to_lowercase()
}

/// Sub-item of a task with its own completion flag.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Subtask {
    /// Free-text description.
    pub description: String,
    /// Completion flag.
    pub done: bool,
}

impl Subtask {
    /// Create an open subtask.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            done: false,
        }
    }

    /// Mark the subtask as completed.
    #[must_use]
    pub const fn completed(mut self) -> Self {
        self.done = true;
        self
    }
}

/// A task record.
///
/// Equality is structural; the sync engine relies on it to tell whether two
/// snapshots differ.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Task {
    /// Identifier assigned by the server.
    pub id: TaskId,
    /// Completion flag.
    pub done: bool,
    /// Soft-delete flag. Archived tasks never appear in filtered views.
    pub archived: bool,
    /// Optional due date.
    #[serde(default)]
    pub date: Option<Date>,
    /// Free-text description.
    pub description: String,
    /// Case-insensitive labels in insertion order.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Owned sub-items.
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

impl Task {
    /// Create a draft that has not been sent to the server yet.
    pub fn draft(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    /// Set the due date.
    #[must_use]
    pub const fn with_date(mut self, date: Date) -> Self {
        self.date = Some(date);
        self
    }

    /// Add a tag, ignoring case variants of a tag already present.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.add_tag(tag);
        self
    }

    /// Append a subtask.
    #[must_use]
    pub fn with_subtask(mut self, subtask: Subtask) -> Self {
        self.subtasks.push(subtask);
        self
    }

    /// Add a tag unless the task already carries it in any case.
    ///
    /// Returns `true` when the tag was inserted.
    pub fn add_tag(&mut self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        let trimmed = tag.trim();
        if trimmed.is_empty() || self.has_tag(trimmed) {
            return false;
        }
        self.tags.push(trimmed.to_owned());
        true
    }

    /// Whether the task carries `tag`, ignoring case.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        let wanted = fold_case(tag);
        self.tags.iter().any(|own| fold_case(own) == wanted)
    }

    /// Whether the due date lies strictly before `today`.
    ///
    /// Undated tasks are never overdue.
    #[must_use]
    pub fn is_overdue(&self, today: Date) -> bool {
        self.date.is_some_and(|date| date < today)
    }

    /// Fraction of completed subtasks, `None` when there are none.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn completed_subtask_ratio(&self) -> Option<f64> {
        if self.subtasks.is_empty() {
            return None;
        }
        let done = self.subtasks.iter().filter(|subtask| subtask.done).count();
        Some(done as f64 / self.subtasks.len() as f64)
    }
}
