use serde::{Deserialize, Serialize};
use std::{fmt, num::ParseIntError, str::FromStr};

/// Server-assigned identifier of a task.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub i32);

impl TaskId {
    /// Placeholder carried by drafts until the server assigns a real id.
    pub const UNASSIGNED: Self = Self(0);

    /// Whether the server has assigned this id.
    #[must_use]
    pub const fn is_assigned(self) -> bool {
        self.0 != Self::UNASSIGNED.0
    }

    /// Raw integer used on the wire.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl From<i32> for TaskId {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TaskId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().trim_start_matches('#').parse()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drafts_are_unassigned() {
        assert!(!TaskId::default().is_assigned());
        assert!(TaskId(7).is_assigned());
    }

    #[test]
    fn parses_plain_and_hash_prefixed_ids() {
        let plain: TaskId = "42".parse().unwrap_or_else(|err| panic!("must parse id: {err}"));
        let hashed: TaskId = " #42 ".parse().unwrap_or_else(|err| panic!("must parse id: {err}"));
        assert_eq!(plain, TaskId(42));
        assert_eq!(hashed, plain);
        assert!("forty-two".parse::<TaskId>().is_err());
    }
}
