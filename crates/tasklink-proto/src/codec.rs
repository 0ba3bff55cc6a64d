//! Encoder and decoder adapters over a channel.
//!
//! Both are cheap wrappers built fresh for every exchange; neither keeps
//! buffered bytes between commands.

use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use tasklink_core::{Task, TaskId};
use tracing::trace;

use crate::command::Command;
use crate::error::{ProtocolError, Result};
use crate::frame::{MAX_FRAME_LEN, PayloadKind, decode_body, encode_body};

/// A decoded client request, as seen by a server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// `LOAD_INFO`
    LoadInfo,
    /// `ADD_TASK` with the draft to create.
    AddTask(Task),
    /// `REMOVE` with the id to archive.
    Remove(TaskId),
    /// `UPDATE_TASK` with the new record.
    UpdateTask(Task),
    /// `FILTER` with the server-side query.
    Filter {
        /// Special filter index, `0` for none.
        index: i32,
        /// Comma-separated tags.
        tags: String,
        /// Description query.
        description: String,
    },
}

impl Request {
    /// Command that introduces this request.
    #[must_use]
    pub const fn command(&self) -> Command {
        match self {
            Self::LoadInfo => Command::LoadInfo,
            Self::AddTask(_) => Command::AddTask,
            Self::Remove(_) => Command::Remove,
            Self::UpdateTask(_) => Command::UpdateTask,
            Self::Filter { .. } => Command::Filter,
        }
    }
}

/// Writes commands and payloads to a channel.
pub struct Encoder<W> {
    writer: W,
}

impl<W: Write> Encoder<W> {
    /// Wrap a writer, typically `&mut stream`.
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write a command token and flush it before any payload.
    ///
    /// # Errors
    /// Returns an error when the channel fails.
    pub fn command(&mut self, command: Command) -> Result<()> {
        trace!(%command, "sending command");
        self.text(command.as_str())?;
        self.flush()
    }

    /// Write a full request: command token followed by its payload, then flush.
    ///
    /// # Errors
    /// Returns an error when encoding or the channel fails.
    pub fn request(&mut self, request: &Request) -> Result<()> {
        self.command(request.command())?;
        match request {
            Request::LoadInfo => {}
            Request::AddTask(task) | Request::UpdateTask(task) => self.task(task)?,
            Request::Remove(id) => self.task_id(*id)?,
            Request::Filter {
                index,
                tags,
                description,
            } => {
                self.filter_index(*index)?;
                self.text(tags)?;
                self.text(description)?;
            }
        }
        self.flush()
    }

    /// Write a length-prefixed UTF-8 token (`u16` byte length).
    ///
    /// # Errors
    /// Returns an error when the text exceeds `u16::MAX` bytes or the channel fails.
    pub fn text(&mut self, value: &str) -> Result<()> {
        let len = u16::try_from(value.len()).map_err(|_| ProtocolError::FrameTooLarge(value.len()))?;
        self.writer.write_u16::<BigEndian>(len)?;
        self.writer.write_all(value.as_bytes())?;
        Ok(())
    }

    /// Write a task id as a big-endian `i32`.
    ///
    /// # Errors
    /// Returns an error when the channel fails.
    pub fn task_id(&mut self, id: TaskId) -> Result<()> {
        self.writer.write_i32::<BigEndian>(id.get())?;
        Ok(())
    }

    /// Write a special filter index as a big-endian `i32`.
    ///
    /// # Errors
    /// Returns an error when the channel fails.
    pub fn filter_index(&mut self, index: i32) -> Result<()> {
        self.writer.write_i32::<BigEndian>(index)?;
        Ok(())
    }

    /// Write an acknowledgement byte.
    ///
    /// # Errors
    /// Returns an error when the channel fails.
    pub fn ack(&mut self, acknowledged: bool) -> Result<()> {
        self.writer.write_u8(u8::from(acknowledged))?;
        Ok(())
    }

    /// Write a single task frame.
    ///
    /// # Errors
    /// Returns an error when encoding or the channel fails.
    pub fn task(&mut self, task: &Task) -> Result<()> {
        self.frame(PayloadKind::Task, task)
    }

    /// Write a task sequence frame.
    ///
    /// # Errors
    /// Returns an error when encoding or the channel fails.
    pub fn tasks(&mut self, tasks: &[Task]) -> Result<()> {
        self.frame(PayloadKind::Tasks, &tasks)
    }

    /// Flush the underlying writer.
    ///
    /// # Errors
    /// Returns an error when the channel fails.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn frame<T: serde::Serialize>(&mut self, kind: PayloadKind, data: &T) -> Result<()> {
        let body = encode_body(kind, data)?;
        let len = u32::try_from(body.len()).map_err(|_| ProtocolError::FrameTooLarge(body.len()))?;
        self.writer.write_u32::<BigEndian>(len)?;
        self.writer.write_all(&body)?;
        trace!(%kind, bytes = body.len(), "wrote frame");
        Ok(())
    }
}

/// Reads commands and payloads from a channel.
pub struct Decoder<R> {
    reader: R,
}

impl<R: Read> Decoder<R> {
    /// Wrap a reader, typically `&mut stream`.
    pub const fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Read a command token.
    ///
    /// # Errors
    /// Returns an error for unknown tokens or when the channel fails.
    pub fn command(&mut self) -> Result<Command> {
        self.text()?.parse()
    }

    /// Read a full request: command token and its payload.
    ///
    /// # Errors
    /// Returns an error when decoding or the channel fails.
    pub fn request(&mut self) -> Result<Request> {
        Ok(match self.command()? {
            Command::LoadInfo => Request::LoadInfo,
            Command::AddTask => Request::AddTask(self.task()?),
            Command::Remove => Request::Remove(self.task_id()?),
            Command::UpdateTask => Request::UpdateTask(self.task()?),
            Command::Filter => Request::Filter {
                index: self.filter_index()?,
                tags: self.text()?,
                description: self.text()?,
            },
        })
    }

    /// Read a length-prefixed UTF-8 token.
    ///
    /// # Errors
    /// Returns an error for invalid UTF-8 or when the channel fails.
    pub fn text(&mut self) -> Result<String> {
        let len = usize::from(self.reader.read_u16::<BigEndian>()?);
        let mut buf = vec![0; len];
        self.reader.read_exact(&mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    /// Read a task id.
    ///
    /// # Errors
    /// Returns an error when the channel fails.
    pub fn task_id(&mut self) -> Result<TaskId> {
        Ok(TaskId(self.reader.read_i32::<BigEndian>()?))
    }

    /// Read a special filter index.
    ///
    /// # Errors
    /// Returns an error when the channel fails.
    pub fn filter_index(&mut self) -> Result<i32> {
        Ok(self.reader.read_i32::<BigEndian>()?)
    }

    /// Read an acknowledgement byte; only `0` and `1` are valid.
    ///
    /// # Errors
    /// Returns an error for any other byte or when the channel fails.
    pub fn ack(&mut self) -> Result<bool> {
        match self.reader.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(ProtocolError::InvalidBool(other)),
        }
    }

    /// Read a single task frame.
    ///
    /// # Errors
    /// Returns an error when the frame is not a valid `task` frame or the channel fails.
    pub fn task(&mut self) -> Result<Task> {
        self.frame(PayloadKind::Task)
    }

    /// Read a task sequence frame.
    ///
    /// # Errors
    /// Returns an error when the frame is not a valid `tasks` frame or the channel fails.
    pub fn tasks(&mut self) -> Result<Vec<Task>> {
        self.frame(PayloadKind::Tasks)
    }

    fn frame<T: serde::de::DeserializeOwned>(&mut self, expected: PayloadKind) -> Result<T> {
        let len = usize::try_from(self.reader.read_u32::<BigEndian>()?).unwrap_or(usize::MAX);
        if len > MAX_FRAME_LEN {
            return Err(ProtocolError::FrameTooLarge(len));
        }
        let mut body = vec![0; len];
        self.reader.read_exact(&mut body)?;
        trace!(kind = %expected, bytes = len, "read frame");
        decode_body(&body, expected)
    }
}
