use std::error;
use std::fmt;

/// Everything that can go wrong while unmarshalling a `.pyc`-style stream.
///
/// Kept as a plain enum with a hand-written `Display`, not `thiserror`: the
/// variant set is small and each message needs exactly one format string, so
/// a derive macro buys nothing here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The header's magic number doesn't match any known interpreter revision.
    UnknownMagic { magic: u32, offset: usize },
    /// A bytecode byte has no normalized name under the selected revision.
    UnknownBytecode { byte: u8, offset: usize },
    /// An argument-indexed lookup (`LOAD_CONST`, `LOAD_FAST`, ...) pointed
    /// past the end of the table it indexes.
    InvalidArgument { argument: u32, offset: usize },
    /// A type tag byte didn't match any of the known marshal value types.
    UnexpectedTag { tag: u8, offset: usize },
    /// A string-reference tag (`'R'`) pointed past the end of the intern table.
    StringRefOutOfRange { index: i32, offset: usize },
    /// The data ran out before a value could be fully read.
    UnexpectedEndOfStream { offset: usize },
    /// Recursive code-object nesting exceeded the configured limit.
    RecursionLimitExceeded { offset: usize },
    /// A string wasn't valid UTF-8 where UTF-8 was required.
    InvalidUtf8 { offset: usize },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::UnknownMagic { magic, offset } => {
                write!(f, "unknown magic number {magic} at offset {offset}")
            }
            DecodeError::UnknownBytecode { byte, offset } => {
                write!(f, "byte {byte:#x} at offset {offset} has no known opcode")
            }
            DecodeError::InvalidArgument { argument, offset } => {
                write!(
                    f,
                    "argument {argument} at offset {offset} is out of range"
                )
            }
            DecodeError::UnexpectedTag { tag, offset } => {
                write!(f, "unexpected type tag {:?} at offset {offset}", *tag as char)
            }
            DecodeError::StringRefOutOfRange { index, offset } => {
                write!(f, "string reference {index} at offset {offset} is out of range")
            }
            DecodeError::UnexpectedEndOfStream { offset } => {
                write!(f, "unexpected end of stream at offset {offset}")
            }
            DecodeError::RecursionLimitExceeded { offset } => {
                write!(
                    f,
                    "code object nesting limit exceeded at offset {offset}"
                )
            }
            DecodeError::InvalidUtf8 { offset } => {
                write!(f, "invalid UTF-8 string at offset {offset}")
            }
        }
    }
}

impl error::Error for DecodeError {}
