//! Domain types and the filter engine for tasklink.
//!
//! Nothing in this crate performs I/O: filters take the current date as an
//! argument, obtained from a [`Clock`] by the caller.

/// Calendar clock abstraction.
pub mod clock;
/// Completion-state predicate.
pub mod completion;
/// Predicate pipeline and its builder.
pub mod filter;
/// Identifier types.
pub mod id;
/// Special filter algorithms.
pub mod special;
/// Task records.
pub mod task;
/// Description matcher.
pub mod text_matcher;

pub use clock::{Clock, FixedClock, SystemClock};
pub use completion::CompletionFilter;
pub use filter::{TaskFilter, TaskFilterBuilder, parse_tag_query};
pub use id::TaskId;
pub use special::{ParseSpecialFilterError, SpecialFilter};
pub use task::{Subtask, Task};
pub use text_matcher::TextMatcher;
