//! Decode errors for Lingo bytecode streams.

use thiserror::Error;

/// Errors that occur while decoding a handler's bytecode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A multi-byte opcode's argument runs past the end of the stream.
    #[error("truncated argument at offset {offset}: need {width} byte(s), {available} left")]
    TruncatedArgument {
        /// Byte offset of the opcode.
        offset: usize,
        /// Argument width implied by the opcode byte.
        width: usize,
        /// Bytes remaining after the opcode byte.
        available: usize,
    },

    /// A literal table entry names a type code the runtime does not know.
    #[error("unknown literal type code {0}")]
    UnknownLiteralType(u32),
}
