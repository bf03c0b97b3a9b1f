//! Decode errors for Clear module byte streams.

use thiserror::Error;

/// Errors that occur while decoding a module or its wire-level tags.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The constant header ended before a record was complete.
    #[error("truncated constant header at offset {at}")]
    TruncatedHeader { at: usize },

    /// A constant record began with a tag byte that names no constant kind.
    #[error("unknown constant tag {tag:#04x} at offset {at}")]
    UnknownConstantTag { tag: u8, at: usize },

    /// Opcode byte outside the instruction set.
    #[error("unknown opcode: {0:#04x}")]
    UnknownOpcode(u8),

    /// Value tag byte outside the value tag set.
    #[error("unknown value tag: {0:#04x}")]
    UnknownValueTag(u8),

    /// Object tag byte outside the object tag set.
    #[error("unknown object tag: {0:#04x}")]
    UnknownObjectTag(u8),
}
