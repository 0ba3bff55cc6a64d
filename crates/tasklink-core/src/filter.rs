//! Predicate pipeline producing task views from a snapshot.

use std::fmt;

use time::{Date, Duration};

use crate::special::SpecialFilter;
use crate::task::fold_case;
use crate::text_matcher::TextMatcher;
use crate::{CompletionFilter, Task};

/// Composed predicates plus an optional special filter.
///
/// Every predicate defaults to "match everything".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Completion-state predicate.
    pub completion: CompletionFilter,
    /// Keep only tasks due before one week from today (overdue included).
    pub due_soon: bool,
    /// Case-folded tags that must all be present (logical AND).
    pub tags: Vec<String>,
    /// Description substring matcher.
    pub text: Option<TextMatcher>,
    /// Selection algorithm applied after the predicates.
    pub special: Option<SpecialFilter>,
}

impl TaskFilter {
    /// Whether no predicate and no special filter is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.completion == CompletionFilter::Any
            && !self.due_soon
            && self.tags.is_empty()
            && self.text.is_none()
            && self.special.is_none()
    }

    /// Evaluate the predicate pipeline for a single task.
    ///
    /// Archived tasks never match. The special filter is not considered here.
    #[must_use]
    pub fn matches(&self, task: &Task, today: Date) -> bool {
        !task.archived
            && self.completion.matches(task)
            && (!self.due_soon || is_due_soon(task, today))
            && self.text.as_ref().is_none_or(|matcher| matcher.matches(task))
            && self.tags.iter().all(|tag| task.has_tag(tag))
    }

    /// Run the full pipeline over `tasks`, preserving their order until the
    /// special filter reorders or truncates.
    ///
    /// `today` is the single date reference every predicate sees.
    #[must_use]
    pub fn apply(&self, tasks: &[Task], today: Date) -> Vec<Task> {
        let filtered: Vec<Task> = tasks
            .iter()
            .filter(|task| self.matches(task, today))
            .cloned()
            .collect();
        match self.special {
            Some(special) => special.apply(filtered, today),
            None => filtered,
        }
    }

    /// Comma-separated tag list as sent to a filtering server.
    #[must_use]
    pub fn tag_query(&self) -> String {
        self.tags.join(",")
    }

    /// Description query as sent to a filtering server.
    #[must_use]
    pub fn text_query(&self) -> &str {
        self.text.as_ref().map_or("", TextMatcher::needle)
    }
}

fn is_due_soon(task: &Task, today: Date) -> bool {
    let limit = today.checked_add(Duration::WEEK);
    task.date
        .is_some_and(|date| limit.is_none_or(|limit| date < limit))
}

/// Split a comma-separated tag query into folded, non-empty tags.
#[must_use]
pub fn parse_tag_query(query: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in query.split(',').map(str::trim).filter(|tag| !tag.is_empty()) {
        let folded = fold_case(tag);
        if !tags.contains(&folded) {
            tags.push(folded);
        }
    }
    tags
}

/// Builder that accepts user-facing strings and normalizes them into [`TaskFilter`] values.
#[derive(Debug, Clone, Default)]
pub struct TaskFilterBuilder {
    filter: TaskFilter,
}

impl TaskFilterBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the completion predicate directly.
    #[must_use]
    pub const fn completion(mut self, completion: CompletionFilter) -> Self {
        self.filter.completion = completion;
        self
    }

    /// Configure the completion predicate from the three UI switches.
    #[must_use]
    pub const fn with_completion_switches(self, not_done: bool, done: bool, all: bool) -> Self {
        self.completion(CompletionFilter::from_switches(not_done, done, all))
    }

    /// Toggle the due-soon predicate.
    #[must_use]
    pub const fn due_soon(mut self, enabled: bool) -> Self {
        self.filter.due_soon = enabled;
        self
    }

    /// Extend the required tags from a comma-separated query.
    #[must_use]
    pub fn with_tags(mut self, query: &str) -> Self {
        for tag in parse_tag_query(query) {
            if !self.filter.tags.contains(&tag) {
                self.filter.tags.push(tag);
            }
        }
        self
    }

    /// Configure the description query (whitespace-only inputs disable it).
    #[must_use]
    pub fn with_text(mut self, text: &str) -> Self {
        self.filter.text = TextMatcher::new(text);
        self
    }

    /// Select the special filter.
    #[must_use]
    pub const fn special(mut self, special: Option<SpecialFilter>) -> Self {
        self.filter.special = special;
        self
    }

    /// Select the special filter by wire index; unknown indexes select none.
    #[must_use]
    pub const fn with_special_index(self, index: i32) -> Self {
        self.special(SpecialFilter::from_index(index))
    }

    /// Build the final [`TaskFilter`].
    #[must_use]
    pub fn build(self) -> TaskFilter {
        self.filter
    }
}

impl fmt::Display for TaskFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskFilter")
            .field("completion", &self.completion.as_str())
            .field("due_soon", &self.due_soon)
            .field("tags", &self.tags)
            .field("text", &self.text_query())
            .field("special", &self.special.map(SpecialFilter::as_str))
            .finish()
    }
}
