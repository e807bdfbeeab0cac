//! Decoding of marshalled bytecode modules: the binary container format plus
//! the inline bytecode stream every code object carries.
mod bigint;
mod cursor;
mod error;
mod reader;
mod types;
mod value;

pub use bigint::BigInt;
pub use cursor::Cursor;
pub use error::DecodeError;
pub use reader::{read_module, read_module_with_limits, Limits};
pub use types::{CodeFlags, CodeObject, Module, OpArg, Opcode};
pub use value::Value;
