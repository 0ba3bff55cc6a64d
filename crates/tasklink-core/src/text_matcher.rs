use crate::Task;
use crate::task::fold_case;

/// Case-insensitive substring matcher for task descriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMatcher {
    needle: String,
}

impl TextMatcher {
    /// Normalize a query string into a matcher. Returns `None` for blank inputs.
    pub fn new(query: &str) -> Option<Self> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self {
            needle: fold_case(trimmed),
        })
    }

    /// Normalized query text.
    #[must_use]
    pub fn needle(&self) -> &str {
        &self.needle
    }

    /// Determine whether the task description contains the query.
    pub fn matches(&self, task: &Task) -> bool {
        fold_case(&task.description).contains(&self.needle)
    }
}
