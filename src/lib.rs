//! Disassembler and partial decompiler for marshalled Python bytecode
//! modules (`.pyc`-style streams): decodes the marshal container, raises
//! the bytecode into a structured IR, reconstructs `if`/`while` control
//! flow, symbolically executes the operand stack into statements, and
//! simplifies the result back into readable source text.

/// The mutable per-decompilation scope-tracking state threaded through
/// lifting and simplification.
pub mod context;
/// The decompiled program tree and the traversal contracts used to walk it.
pub mod ir;
/// Symbolic stack execution: opcodes to structured statements.
pub mod lift;
/// Turns a decoded code object into the initial, flat IR.
pub mod lower;
/// Decoding of marshalled bytecode modules.
pub mod marshal;
/// Per-interpreter-revision opcode tables.
pub mod opcode;
/// The top-level driver tying every stage together.
pub mod pipeline;
/// Renders a simplified IR tree as Python-like source text.
pub mod render;
/// The fixed-point simplification pipeline.
pub mod simplify;

/// Basic-block segmentation, dominator computation, and structured
/// control-flow recovery.
pub mod cfg;

pub use context::Context;
pub use ir::{BinaryOp, Node, UnaryOp};
pub use lift::{lift, LiftError};
pub use marshal::{CodeObject, DecodeError, Module, Opcode, Value};
pub use pipeline::{decompile, decompile_with, disassemble, DisassemblerError, Options};
