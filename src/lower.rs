//! Turns a decoded [`CodeObject`] into the initial, unstructured [`Node`]
//! tree: one [`Node::Opcode`] per instruction, in a flat [`Node::Block`].
//! Every later pass restructures this tree; none of them read `CodeObject`
//! directly again.
use crate::ir::Node;
use crate::marshal::{CodeObject, OpArg, Opcode, Value};

pub fn lower_code_object(code: &CodeObject) -> Node {
    Node::Block(code.opcodes.iter().map(lower_opcode).collect())
}

fn lower_opcode(op: &Opcode) -> Node {
    Node::Opcode {
        offset: op.offset,
        size: op.size,
        op: op.name,
        arg: op.arg.as_ref().map(|arg| Box::new(lower_arg(arg))),
    }
}

fn lower_arg(arg: &OpArg) -> Node {
    match arg {
        OpArg::Const(value) => lower_const_value(value),
        OpArg::Name(name) => Node::Ident(name.clone()),
        OpArg::Raw(raw) => Node::Const(Value::Int(*raw as i64)),
    }
}

/// Constant collections get wrapped as the expression that would build them
/// rather than opaque blobs: a tuple constant becomes `Node::Tuple`, a set
/// constant becomes a call to `set(...)`, and so on. Everything else stays a
/// plain `Node::Const`.
fn lower_const_value(value: &Value) -> Node {
    match value {
        Value::Tuple(items) => Node::Tuple(items.iter().map(lower_const_value).collect()),
        Value::List(items) => Node::List(items.iter().map(lower_const_value).collect()),
        Value::Set(items) => wrap_as_call("set", items),
        Value::FrozenSet(items) => wrap_as_call("frozenset", items),
        other => Node::Const(other.clone()),
    }
}

fn wrap_as_call(constructor: &str, items: &[Value]) -> Node {
    let elements = items.iter().map(lower_const_value).collect();
    Node::Call {
        func: Box::new(Node::Ident(constructor.to_string())),
        args: Box::new(Node::Tuple(vec![Node::Tuple(elements)])),
        kwargs: Box::new(Node::Dict(vec![])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marshal::{CodeFlags, Opcode};

    fn code_object(opcodes: Vec<Opcode>) -> CodeObject {
        CodeObject {
            argcount: 0,
            kwonlyargcount: 0,
            nlocals: 0,
            stacksize: 0,
            flags: CodeFlags::empty(),
            code: vec![],
            consts: vec![],
            names: vec![],
            varnames: vec![],
            freevars: vec![],
            cellvars: vec![],
            filename: "<test>".into(),
            name: "<module>".into(),
            firstlineno: 1,
            lnotab: vec![],
            opcodes,
        }
    }

    #[test]
    fn flat_opcode_list_becomes_a_block() {
        let code = code_object(vec![Opcode {
            offset: 0,
            size: 1,
            op: "RETURN_VALUE",
            arg: None,
        }]);
        let node = lower_code_object(&code);
        match node {
            Node::Block(nodes) => assert_eq!(nodes.len(), 1),
            other => panic!("expected Block, got {other:?}"),
        }
    }

    #[test]
    fn set_constant_lowers_to_a_set_call() {
        let node = lower_const_value(&Value::Set(vec![Value::Int(1)]));
        match node {
            Node::Call { func, .. } => assert_eq!(func.as_ident(), Some("set")),
            other => panic!("expected Call, got {other:?}"),
        }
    }
}
