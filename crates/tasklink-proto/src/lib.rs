//! Wire codec for the tasklink command protocol.
//!
//! Every exchange starts with a command token (`u16` length + UTF-8, flushed
//! immediately). Scalars follow as fixed-width big-endian values; records and
//! collections travel as versioned, tagged JSON frames.

/// Request and reply encoding over a channel.
pub mod codec;
/// Command tokens.
pub mod command;
/// Codec errors.
pub mod error;
/// Versioned record frames.
pub mod frame;

pub use codec::{Decoder, Encoder, Request};
pub use command::Command;
pub use error::{ProtocolError, Result};
pub use frame::{MAX_FRAME_LEN, PROTOCOL_VERSION, PayloadKind};
