use super::value::Value;

bitflags::bitflags! {
    /// `co_flags`, as defined by `Include/code.h` across the interpreter's
    /// history. Not every flag is meaningful for every revision (coroutine
    /// flags postdate generators, for instance); unrecognized bits are kept
    /// rather than rejected, since a flags word from a newer interpreter
    /// than any table we decode should still round-trip losslessly.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CodeFlags: u32 {
        const OPTIMIZED          = 0x0001;
        const NEWLOCALS          = 0x0002;
        const VARARGS            = 0x0004;
        const VARKEYWORDS        = 0x0008;
        const NESTED             = 0x0010;
        const GENERATOR          = 0x0020;
        const NOFREE             = 0x0040;
        const COROUTINE          = 0x0080;
        const ITERABLE_COROUTINE = 0x0100;
    }
}

/// A single decoded, normalized bytecode instruction.
///
/// `offset` and `size` describe its position and byte length within
/// `CodeObject::code`, which is what lets jump arguments (which are byte
/// offsets or distances) be related back to particular instructions.
#[derive(Debug, Clone, PartialEq)]
pub struct Opcode {
    pub offset: usize,
    pub size: usize,
    pub name: &'static str,
    pub arg: Option<OpArg>,
}

/// The resolved form of an opcode's raw 16-bit argument.
///
/// Resolution happens once, at decode time, against the tables the
/// surrounding `CodeObject` already carries (`consts`, `names`,
/// `varnames`), so later passes never need to re-index into those tables
/// themselves.
#[derive(Debug, Clone, PartialEq)]
pub enum OpArg {
    Const(Value),
    Name(String),
    Raw(u32),
}

impl OpArg {
    pub fn as_raw(&self) -> u32 {
        match self {
            OpArg::Const(_) => 0,
            OpArg::Name(_) => 0,
            OpArg::Raw(raw) => *raw,
        }
    }
}

/// A decoded `TYPE_CODE` value: one function, module, or class body.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeObject {
    pub argcount: i32,
    pub kwonlyargcount: i32,
    pub nlocals: i32,
    pub stacksize: i32,
    pub flags: CodeFlags,
    pub code: Vec<u8>,
    pub consts: Vec<Value>,
    pub names: Vec<String>,
    pub varnames: Vec<String>,
    pub freevars: Vec<String>,
    pub cellvars: Vec<String>,
    pub filename: String,
    pub name: String,
    pub firstlineno: i32,
    pub lnotab: Vec<u8>,
    pub opcodes: Vec<Opcode>,
}

/// The top-level decoded `.pyc`-style stream: header plus the module's code object.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub magic: u32,
    pub timestamp: u32,
    pub interpreter_version: String,
    pub body: CodeObject,
}
