//! The top-level driver: reads a marshalled module from disk and runs it
//! through every stage in order, from raw bytes to rendered source text.
//!
//! Each stage gets its own `tracing` span, so a caller with a subscriber
//! installed sees exactly which stage a given decompilation is in (or
//! failed in).
use std::fmt;
use std::fs;
use std::path::Path;

use crate::cfg::{build_graph, reconstruct_control_structures, split_into_basic_blocks};
use crate::context::Context;
use crate::ir::Node;
use crate::lift::{lift, LiftError};
use crate::lower::lower_code_object;
use crate::marshal::{read_module_with_limits, DecodeError, Limits, Module};
use crate::render::render;
use crate::simplify::simplify;

/// Knobs controlling how far a decompilation goes past plain disassembly.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Forwarded to [`crate::marshal::Limits::max_recursion_depth`]: how
    /// deeply nested code objects (functions within functions) are allowed
    /// to be before decoding gives up.
    pub max_recursion_depth: usize,
    /// Whether to recover `if`/`else` and `while` structure from the
    /// control-flow graph before lifting. Disabling this leaves branches
    /// and loops as raw conditional-jump opcodes in the rendered output,
    /// useful for inspecting what the disassembler saw independent of how
    /// well structuring worked.
    pub run_control_flow_reconstruction: bool,
    /// Whether to run `MakeIdentifiersValid` at the end of simplification.
    /// Disabling this leaves the lifter's `$n` temp names in the rendered
    /// output.
    pub legalize_identifiers: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            max_recursion_depth: Limits::default().max_recursion_depth,
            run_control_flow_reconstruction: true,
            legalize_identifiers: true,
        }
    }
}

/// Everything that can go wrong turning a file on disk into a decoded
/// module or rendered source text.
#[derive(Debug)]
pub enum DisassemblerError {
    Io(std::io::Error),
    Decode(DecodeError),
    /// A lifting failure doesn't discard the module: it's reported
    /// alongside the partial tree built before the failure, per
    /// [`crate::lift::lift`]'s partial-result contract. `decompile`/
    /// `decompile_with` still return an error here rather than silently
    /// rendering a half-finished program, but [`disassemble`] callers that
    /// want the partial IR can call [`crate::lift::lift`] directly.
    Lift(LiftError),
}

impl fmt::Display for DisassemblerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisassemblerError::Io(err) => write!(f, "{err}"),
            DisassemblerError::Decode(err) => write!(f, "{err}"),
            DisassemblerError::Lift(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for DisassemblerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DisassemblerError::Io(err) => Some(err),
            DisassemblerError::Decode(err) => Some(err),
            DisassemblerError::Lift(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for DisassemblerError {
    fn from(err: std::io::Error) -> Self {
        DisassemblerError::Io(err)
    }
}

impl From<DecodeError> for DisassemblerError {
    fn from(err: DecodeError) -> Self {
        DisassemblerError::Decode(err)
    }
}

impl From<LiftError> for DisassemblerError {
    fn from(err: LiftError) -> Self {
        DisassemblerError::Lift(err)
    }
}

/// Reads and decodes `path` into a [`Module`], without lifting or
/// rendering it. Useful for inspecting the raw opcode stream, or for
/// tooling that only wants disassembly.
pub fn disassemble(path: impl AsRef<Path>) -> Result<Module, DisassemblerError> {
    disassemble_with_limits(path, Limits::default())
}

fn disassemble_with_limits(
    path: impl AsRef<Path>,
    limits: Limits,
) -> Result<Module, DisassemblerError> {
    let path = path.as_ref();
    let span = tracing::info_span!("decode", path = %path.display());
    let _enter = span.enter();
    let data = fs::read(path)?;
    let module = read_module_with_limits(&data, limits)?;
    Ok(module)
}

/// Decompiles `path` into Python-like source text using [`Options::default`].
pub fn decompile(path: impl AsRef<Path>) -> Result<String, DisassemblerError> {
    decompile_with(path, Options::default())
}

/// Decompiles `path` into Python-like source text, running every stage from
/// decode through render under `options`.
pub fn decompile_with(path: impl AsRef<Path>, options: Options) -> Result<String, DisassemblerError> {
    let limits = Limits {
        max_recursion_depth: options.max_recursion_depth,
    };
    let module = disassemble_with_limits(&path, limits)?;

    let lowered = {
        let span = tracing::info_span!("lower");
        let _enter = span.enter();
        lower_code_object(&module.body)
    };

    let structured = if options.run_control_flow_reconstruction {
        let span = tracing::info_span!("blocks");
        let _enter = span.enter();
        let flat = match lowered {
            Node::Block(nodes) => nodes,
            other => vec![other],
        };
        let blocks = split_into_basic_blocks(flat);
        let graph = build_graph(blocks);
        drop(_enter);

        let span = tracing::info_span!("control_flow");
        let _enter = span.enter();
        reconstruct_control_structures(&graph)
    } else {
        lowered
    };

    let mut ctx = Context::new();
    let lifted = {
        let span = tracing::info_span!("lift");
        let _enter = span.enter();
        let (tree, err) = lift(structured, &mut ctx);
        if let Some(err) = err {
            tracing::warn!(%err, "lifting stopped early; rendering the partial tree built so far");
            return Err(err.into());
        }
        tree
    };

    let simplified = {
        let span = tracing::info_span!("simplify");
        let _enter = span.enter();
        simplify(lifted, &mut ctx, options.legalize_identifiers)
    };

    let span = tracing::info_span!("render");
    let _enter = span.enter();
    Ok(render(&simplified))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_enable_both_reconstruction_passes() {
        let options = Options::default();
        assert!(options.run_control_flow_reconstruction);
        assert!(options.legalize_identifiers);
    }

    #[test]
    fn io_error_reading_a_missing_file_is_wrapped() {
        let err = disassemble("/nonexistent/path/does/not/exist.pyc").unwrap_err();
        assert!(matches!(err, DisassemblerError::Io(_)));
    }
}
