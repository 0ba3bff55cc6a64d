//! Command tokens that open every exchange.

use std::fmt;
use std::str::FromStr;

use crate::error::ProtocolError;

/// Commands understood by the task server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Fetch the full task snapshot.
    LoadInfo,
    /// Create a task and receive its canonical record.
    AddTask,
    /// Archive a task by id.
    Remove,
    /// Overwrite a task; no reply.
    UpdateTask,
    /// Let the server run a filter.
    Filter,
}

impl Command {
    /// Token written on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LoadInfo => "LOAD_INFO",
            Self::AddTask => "ADD_TASK",
            Self::Remove => "REMOVE",
            Self::UpdateTask => "UPDATE_TASK",
            Self::Filter => "FILTER",
        }
    }

    /// Whether the server answers this command.
    #[must_use]
    pub const fn expects_reply(self) -> bool {
        !matches!(self, Self::UpdateTask)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOAD_INFO" => Ok(Self::LoadInfo),
            "ADD_TASK" => Ok(Self::AddTask),
            "REMOVE" => Ok(Self::Remove),
            "UPDATE_TASK" => Ok(Self::UpdateTask),
            "FILTER" => Ok(Self::Filter),
            other => Err(ProtocolError::UnknownCommand(other.to_owned())),
        }
    }
}
