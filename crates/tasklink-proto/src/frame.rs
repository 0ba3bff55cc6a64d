//! Versioned, tagged record frames.
//!
//! A frame is a big-endian `u32` byte length followed by a JSON object
//! `{"version": 1, "kind": "task" | "tasks", "data": ...}`.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, Result};

/// Frame version spoken by this codec.
pub const PROTOCOL_VERSION: u16 = 1;

/// Largest frame body accepted in either direction.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Tag describing what a frame carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    /// A single task record.
    Task,
    /// An ordered task sequence.
    Tasks,
}

impl PayloadKind {
    /// Tag written into the frame.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Tasks => "tasks",
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize)]
struct OutgoingFrame<'a, T> {
    version: u16,
    kind: PayloadKind,
    data: &'a T,
}

#[derive(Deserialize)]
struct IncomingFrame {
    version: u16,
    kind: PayloadKind,
    data: serde_json::Value,
}

/// Serialize `data` into a frame body (without the length prefix).
///
/// # Errors
/// Returns an error when serialization fails or the body exceeds [`MAX_FRAME_LEN`].
pub fn encode_body<T: Serialize>(kind: PayloadKind, data: &T) -> Result<Vec<u8>> {
    let body = serde_json::to_vec(&OutgoingFrame {
        version: PROTOCOL_VERSION,
        kind,
        data,
    })?;
    if body.len() > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(body.len()));
    }
    Ok(body)
}

/// Decode a frame body, checking its version and kind before the data.
///
/// # Errors
/// Returns an error for a foreign version, a different kind than `expected`,
/// or data that does not decode into `T`.
pub fn decode_body<T: DeserializeOwned>(body: &[u8], expected: PayloadKind) -> Result<T> {
    let frame: IncomingFrame = serde_json::from_slice(body)?;
    if frame.version != PROTOCOL_VERSION {
        return Err(ProtocolError::UnsupportedVersion {
            found: frame.version,
            expected: PROTOCOL_VERSION,
        });
    }
    if frame.kind != expected {
        return Err(ProtocolError::UnexpectedPayload {
            expected,
            found: frame.kind,
        });
    }
    Ok(serde_json::from_value(frame.data)?)
}
