//! Ranking and selection algorithms applied after the predicate pipeline.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Date, Month};

use crate::Task;
use crate::task::fold_case;

/// Number of tags ranked by [`SpecialFilter::PopularTagOverdue`].
pub const POPULAR_TAG_COUNT: usize = 3;
/// Result size of [`SpecialFilter::UpcomingTop3`].
pub const UPCOMING_LIMIT: usize = 3;
/// Result size of [`SpecialFilter::TaglessDatedTop4`].
pub const TAGLESS_DATED_LIMIT: usize = 4;

/// One of the fixed selection algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpecialFilter {
    /// Due from today up to one calendar month ahead.
    NearTerm,
    /// At least one subtask and at least half of them completed.
    MajorityComplete,
    /// Overdue tasks carrying one of the most frequent tags.
    PopularTagOverdue,
    /// The three nearest upcoming tasks, soonest first.
    UpcomingTop3,
    /// The four latest-dated tasks without tags, latest first.
    TaglessDatedTop4,
}

/// Error returned when a special filter name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown special filter: {0}")]
pub struct ParseSpecialFilterError(pub String);

impl SpecialFilter {
    /// Every variant in wire-index order.
    pub const ALL: [Self; 5] = [
        Self::NearTerm,
        Self::MajorityComplete,
        Self::PopularTagOverdue,
        Self::UpcomingTop3,
        Self::TaglessDatedTop4,
    ];

    /// Map a wire index to a filter. Any index outside `1..=5` selects none.
    #[must_use]
    pub const fn from_index(index: i32) -> Option<Self> {
        match index {
            1 => Some(Self::NearTerm),
            2 => Some(Self::MajorityComplete),
            3 => Some(Self::PopularTagOverdue),
            4 => Some(Self::UpcomingTop3),
            5 => Some(Self::TaglessDatedTop4),
            _ => None,
        }
    }

    /// Wire index of the filter.
    #[must_use]
    pub const fn index(self) -> i32 {
        match self {
            Self::NearTerm => 1,
            Self::MajorityComplete => 2,
            Self::PopularTagOverdue => 3,
            Self::UpcomingTop3 => 4,
            Self::TaglessDatedTop4 => 5,
        }
    }

    /// Stable name used by the CLI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NearTerm => "near-term",
            Self::MajorityComplete => "majority-complete",
            Self::PopularTagOverdue => "popular-tag-overdue",
            Self::UpcomingTop3 => "upcoming",
            Self::TaglessDatedTop4 => "tagless-dated",
        }
    }

    /// Run the algorithm over an already filtered, order-preserving list.
    #[must_use]
    pub fn apply(self, tasks: Vec<Task>, today: Date) -> Vec<Task> {
        match self {
            Self::NearTerm => near_term(tasks, today),
            Self::MajorityComplete => tasks
                .into_iter()
                .filter(|task| task.completed_subtask_ratio().is_some_and(|ratio| ratio >= 0.5))
                .collect(),
            Self::PopularTagOverdue => popular_tag_overdue(tasks, today),
            Self::UpcomingTop3 => upcoming(tasks, today),
            Self::TaglessDatedTop4 => tagless_dated(tasks),
        }
    }
}

impl fmt::Display for SpecialFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpecialFilter {
    type Err = ParseSpecialFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        if let Ok(index) = normalized.parse::<i32>() {
            return Self::from_index(index).ok_or_else(|| ParseSpecialFilterError(s.to_owned()));
        }
        match normalized.as_str() {
            "near-term" => Ok(Self::NearTerm),
            "majority-complete" => Ok(Self::MajorityComplete),
            "popular-tag-overdue" | "popular-tag" => Ok(Self::PopularTagOverdue),
            "upcoming" | "upcoming-top3" => Ok(Self::UpcomingTop3),
            "tagless-dated" | "tagless-dated-top4" => Ok(Self::TaglessDatedTop4),
            _ => Err(ParseSpecialFilterError(s.to_owned())),
        }
    }
}

/// Add calendar months, clamping the day to the length of the target month.
///
/// Returns `None` when the result leaves the supported date range.
#[must_use]
pub fn add_months(date: Date, months: i32) -> Option<Date> {
    let zero_based = date.year() * 12 + i32::from(u8::from(date.month())) - 1 + months;
    let year = zero_based.div_euclid(12);
    let month_number = u8::try_from(zero_based.rem_euclid(12) + 1).ok()?;
    let month = Month::try_from(month_number).ok()?;
    (1..=date.day())
        .rev()
        .find_map(|day| Date::from_calendar_date(year, month, day).ok())
}

fn near_term(tasks: Vec<Task>, today: Date) -> Vec<Task> {
    let horizon = add_months(today, 1);
    let earliest = today.previous_day();
    tasks
        .into_iter()
        .filter(|task| {
            task.date.is_some_and(|date| {
                horizon.is_none_or(|limit| date < limit) && earliest.is_none_or(|floor| date > floor)
            })
        })
        .collect()
}

/// Rank case-folded tags by frequency. Ties keep first-encounter order.
#[must_use]
pub fn popular_tags(tasks: &[Task], limit: usize) -> Vec<String> {
    let mut order: Vec<(String, usize)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for tag in tasks.iter().flat_map(|task| task.tags.iter()) {
        let folded = fold_case(tag);
        if let Some(&position) = positions.get(&folded) {
            order[position].1 += 1;
        } else {
            positions.insert(folded.clone(), order.len());
            order.push((folded, 1));
        }
    }
    order.sort_by(|a, b| b.1.cmp(&a.1));
    order.into_iter().take(limit).map(|(tag, _)| tag).collect()
}

fn popular_tag_overdue(tasks: Vec<Task>, today: Date) -> Vec<Task> {
    let winners = popular_tags(&tasks, POPULAR_TAG_COUNT);
    tasks
        .into_iter()
        .filter(|task| task.is_overdue(today) && winners.iter().any(|tag| task.has_tag(tag)))
        .collect()
}

fn upcoming(tasks: Vec<Task>, today: Date) -> Vec<Task> {
    let mut dated: Vec<(Date, Task)> = tasks
        .into_iter()
        .filter_map(|task| task.date.filter(|date| *date >= today).map(|date| (date, task)))
        .collect();
    dated.sort_by_key(|(date, _)| *date);
    dated.into_iter().take(UPCOMING_LIMIT).map(|(_, task)| task).collect()
}

fn tagless_dated(tasks: Vec<Task>) -> Vec<Task> {
    let mut dated: Vec<(Date, Task)> = tasks
        .into_iter()
        .filter(|task| task.tags.is_empty())
        .filter_map(|task| task.date.map(|date| (date, task)))
        .collect();
    dated.sort_by(|a, b| b.0.cmp(&a.0));
    dated
        .into_iter()
        .take(TAGLESS_DATED_LIMIT)
        .map(|(_, task)| task)
        .collect()
}
