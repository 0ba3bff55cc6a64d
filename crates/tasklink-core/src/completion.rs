use serde::{Deserialize, Serialize};

use crate::Task;

/// Completion-state predicate of a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionFilter {
    /// Every task regardless of its done flag.
    #[default]
    Any,
    /// Tasks that are not done yet.
    Open,
    /// Completed tasks.
    Done,
}

impl CompletionFilter {
    /// Resolve the three UI switches. `all` wins over `done`, which wins over `not_done`.
    #[must_use]
    pub const fn from_switches(not_done: bool, done: bool, all: bool) -> Self {
        if all {
            Self::Any
        } else if done {
            Self::Done
        } else if not_done {
            Self::Open
        } else {
            Self::Any
        }
    }

    /// String representation used in logs and the CLI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Open => "open",
            Self::Done => "done",
        }
    }

    /// Whether `task` passes this predicate.
    #[must_use]
    pub const fn matches(self, task: &Task) -> bool {
        match self {
            Self::Any => true,
            Self::Open => !task.done,
            Self::Done => task.done,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_switch_overrides_the_others() {
        assert_eq!(CompletionFilter::from_switches(true, true, true), CompletionFilter::Any);
        assert_eq!(CompletionFilter::from_switches(true, true, false), CompletionFilter::Done);
        assert_eq!(CompletionFilter::from_switches(true, false, false), CompletionFilter::Open);
        assert_eq!(CompletionFilter::from_switches(false, false, false), CompletionFilter::Any);
    }

    #[test]
    fn predicates_follow_done_flag() {
        let mut task = Task::draft("x");
        assert!(CompletionFilter::Open.matches(&task));
        assert!(!CompletionFilter::Done.matches(&task));
        task.done = true;
        assert!(CompletionFilter::Done.matches(&task));
        assert!(CompletionFilter::Any.matches(&task));
    }
}
