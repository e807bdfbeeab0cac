use super::bigint::BigInt;
use super::types::CodeObject;

/// A decoded marshal value.
///
/// This mirrors the tag set documented in [`super::reader`] one-for-one;
/// there is deliberately no folding of e.g. `Int`/`BigInt` into a single
/// variant, since which tag produced a constant can matter to a renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    True,
    False,
    StopIteration,
    Ellipsis,
    /// The `TYPE_NULL` sentinel; distinct from `None`, never a real constant.
    Null,
    Int(i64),
    BigInt(BigInt),
    Float(f64),
    Complex(f64, f64),
    Bytes(Vec<u8>),
    Str(String),
    Tuple(Vec<Value>),
    List(Vec<Value>),
    Set(Vec<Value>),
    FrozenSet(Vec<Value>),
    Dict(Vec<(Value, Value)>),
    Code(Box<CodeObject>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }
}
