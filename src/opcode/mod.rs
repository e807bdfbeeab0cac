//! Per-interpreter-revision opcode tables.
//!
//! CPython's bytecode has never had a stable `(byte value -> name)` mapping:
//! the same byte has meant different instructions across releases, and the
//! same instruction has moved to different bytes. A `.pyc` file only tells
//! us the magic number it was compiled with, so decoding its bytecode means
//! first finding the [`Revision`] whose opcode table applies.
//!
//! The tables below are normalized the same way a from-source generator
//! would normalize them: pseudo-opcodes that never appear in compiled code
//! (`STOP_CODE`, `HAVE_ARGUMENT`, `EXCEPT_HANDLER`) are absent, the four
//! slice opcodes are split into `_0`..`_3` variants, and any opcode whose
//! argument-carrying status differs across revisions is split into a plain
//! name and an `_ARG`-suffixed name so that a given name always has the same
//! argument-carrying behavior everywhere. Building this table from the
//! actual interpreter sources (cloning CPython, grepping `opcode.h` per
//! revision) is the kind of external, stateful data-gathering step this
//! crate doesn't perform at runtime; what's baked in here is the result of
//! that process for a representative sample of revisions, not an
//! exhaustive history of every CPython release.
mod table;

pub use table::{
    decode, has_argument, has_kwonlyargcount, python_version, revision_for_magic, Revision,
};
