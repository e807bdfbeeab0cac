//! Symbolic stack execution: walks the control-flow-structured tree and
//! turns runs of [`Node::Opcode`] instructions into three-address-style
//! statements, binding every stack-producing opcode to a fresh `$n` name
//! with its own `Assign` before pushing a bare `Ident` reference to it.
//!
//! This runs after [`crate::cfg::reconstruct_control_structures`], so
//! `If`/`Loop` nodes are already in place; what's left to do is give them
//! their real condition expressions (the branch opcode left a raw
//! placeholder) and turn their bodies' flat opcode runs into statements.
//! The temp-per-operation explosion this produces is deliberate: it's what
//! [`crate::simplify::InlineVariables`] collapses back into compact
//! expressions afterward, rather than this pass trying to build compact
//! expressions directly.
use std::fmt;

use crate::context::Context;
use crate::ir::{BinaryOp, Node, UnaryOp};
use crate::marshal::Value;

/// Invariant violations during symbolic execution (see spec §7).
///
/// Unlike [`crate::marshal::DecodeError`], a `LiftError` doesn't abort the
/// whole pipeline: [`lift`] returns the partial tree built before the
/// failure alongside the error, so a caller can still render what was
/// recovered.
#[derive(Debug, Clone, PartialEq)]
pub enum LiftError {
    /// An opcode needed more operands than the stack held.
    StackUnderflow { op: &'static str },
    /// An `If`'s two branches left the operand stack at different depths.
    BranchDepthMismatch { then_depth: usize, else_depth: usize },
    /// A branch/loop node needed a condition expression but the preceding
    /// conditional jump left nothing on the stack to supply one: control-flow
    /// recovery placed a structured node where the opcode stream didn't
    /// actually leave a liftable expression behind.
    UnknownOpcodeInLiftPosition { context: &'static str },
}

impl fmt::Display for LiftError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiftError::StackUnderflow { op } => write!(f, "{op} underflowed the operand stack"),
            LiftError::BranchDepthMismatch { then_depth, else_depth } => write!(
                f,
                "if-branches left the stack at different depths ({then_depth} vs {else_depth})"
            ),
            LiftError::UnknownOpcodeInLiftPosition { context } => {
                write!(f, "no liftable condition available for {context}")
            }
        }
    }
}

impl std::error::Error for LiftError {}

/// Mints fresh `$0`, `$1`, ... names, one per value a stack-producing opcode
/// binds.
///
/// A `$`-prefixed name can never collide with a program identifier (`$` is
/// not a legal leading character for one), so unlike [`Context`]'s
/// legalization bookkeeping this doesn't need to consult any existing name
/// set.
struct TempNames {
    next: usize,
}

impl TempNames {
    fn new() -> Self {
        TempNames { next: 0 }
    }

    fn mint(&mut self) -> String {
        let name = format!("${}", self.next);
        self.next += 1;
        name
    }
}

fn bind(output: &mut Vec<Node>, temps: &mut TempNames, value: Node) -> Node {
    let name = temps.mint();
    output.push(Node::Assign {
        left: Box::new(Node::Ident(name.clone())),
        right: Box::new(value),
    });
    Node::Ident(name)
}

/// Lifts an entire control-flow-structured tree, recording every global and
/// local name it sees into `ctx` along the way.
///
/// On success, returns the fully lifted tree. On a [`LiftError`], returns
/// the partially lifted tree built up to the point of failure together with
/// the error, per §7's "preserve the structured IR produced up to that
/// point" contract.
pub fn lift(node: Node, ctx: &mut Context) -> (Node, Option<LiftError>) {
    let mut temps = TempNames::new();
    match node {
        Node::Block(children) => {
            let mut stack: Vec<Node> = Vec::new();
            match lift_statement_list(children, &mut temps, ctx, &mut stack) {
                Ok(stmts) => (Node::Block(stmts), None),
                Err((stmts, err)) => (Node::Block(stmts), Some(err)),
            }
        }
        other => (other, None),
    }
}

fn into_block_nodes(node: Node) -> Vec<Node> {
    match node {
        Node::Block(nodes) => nodes,
        other => vec![other],
    }
}

type PartialResult<T> = Result<T, (Vec<Node>, LiftError)>;

fn lift_statement_list(
    nodes: Vec<Node>,
    temps: &mut TempNames,
    ctx: &mut Context,
    stack: &mut Vec<Node>,
) -> PartialResult<Vec<Node>> {
    let mut output: Vec<Node> = Vec::new();
    let mut pending_cond: Option<Node> = None;

    for node in nodes {
        match node {
            Node::Opcode { op, arg, .. } => {
                if let Err(err) =
                    execute(op, arg.map(|b| *b), stack, &mut output, temps, ctx, &mut pending_cond)
                {
                    return Err((output, err));
                }
            }
            Node::If {
                then_branch,
                else_branch,
                ..
            } => {
                let cond = match pending_cond.take() {
                    Some(cond) => cond,
                    None => {
                        return Err((
                            output,
                            LiftError::UnknownOpcodeInLiftPosition {
                                context: "if-condition",
                            },
                        ))
                    }
                };

                let pre_depth = stack.len();
                let mut then_stack = stack.clone();
                let mut then_nodes =
                    match lift_statement_list(into_block_nodes(*then_branch), temps, ctx, &mut then_stack) {
                        Ok(nodes) => nodes,
                        Err((partial, err)) => {
                            output.push(Node::If {
                                cond: Box::new(cond),
                                then_branch: Box::new(Node::Block(partial)),
                                else_branch: None,
                            });
                            return Err((output, err));
                        }
                    };
                let then_depth = then_stack.len();

                let (mut else_nodes, else_stack, post_depth) = match else_branch {
                    Some(branch) => {
                        let mut else_stack = stack.clone();
                        let nodes =
                            match lift_statement_list(into_block_nodes(*branch), temps, ctx, &mut else_stack) {
                                Ok(nodes) => nodes,
                                Err((partial, err)) => {
                                    output.push(Node::If {
                                        cond: Box::new(cond),
                                        then_branch: Box::new(Node::Block(then_nodes)),
                                        else_branch: Some(Box::new(Node::Block(partial))),
                                    });
                                    return Err((output, err));
                                }
                            };
                        let depth = else_stack.len();
                        (Some(nodes), Some(else_stack), depth)
                    }
                    None => (None, None, pre_depth),
                };

                if then_depth != post_depth {
                    output.push(Node::If {
                        cond: Box::new(cond),
                        then_branch: Box::new(Node::Block(then_nodes)),
                        else_branch: else_nodes.map(|nodes| Box::new(Node::Block(nodes))),
                    });
                    return Err((
                        output,
                        LiftError::BranchDepthMismatch {
                            then_depth,
                            else_depth: post_depth,
                        },
                    ));
                }

                // Every slot a branch left live past `pre_depth` was filled
                // independently by each branch's own `execute()` calls, so
                // the then- and else-branch values at the same slot carry
                // different temp names even though only one of them ever
                // actually runs. Mint one fresh name per live slot and have
                // both branches assign their own tail value to it, so the
                // merged stack (and anything lifted afterwards) refers to a
                // name that's defined on every path, not just the then-path.
                let mut merged_stack = then_stack;
                if let Some(else_stack) = else_stack {
                    for i in pre_depth..then_depth {
                        let merge_name = temps.mint();
                        then_nodes.push(Node::Assign {
                            left: Box::new(Node::Ident(merge_name.clone())),
                            right: Box::new(merged_stack[i].clone()),
                        });
                        if let Some(else_nodes) = else_nodes.as_mut() {
                            else_nodes.push(Node::Assign {
                                left: Box::new(Node::Ident(merge_name.clone())),
                                right: Box::new(else_stack[i].clone()),
                            });
                        }
                        merged_stack[i] = Node::Ident(merge_name);
                    }
                }

                *stack = merged_stack;
                output.push(Node::If {
                    cond: Box::new(cond),
                    then_branch: Box::new(Node::Block(then_nodes)),
                    else_branch: else_nodes.map(|nodes| Box::new(Node::Block(nodes))),
                });
            }
            Node::Loop { body, .. } => {
                let cond = pending_cond.take();
                let mut body_stack = stack.clone();
                let body_nodes = match lift_statement_list(into_block_nodes(*body), temps, ctx, &mut body_stack) {
                    Ok(nodes) => nodes,
                    Err((partial, err)) => {
                        output.push(Node::Loop {
                            cond: cond.map(Box::new),
                            body: Box::new(Node::Block(partial)),
                        });
                        return Err((output, err));
                    }
                };
                output.push(Node::Loop {
                    cond: cond.map(Box::new),
                    body: Box::new(Node::Block(body_nodes)),
                });
            }
            other => output.push(other),
        }
    }
    Ok(output)
}

fn unary_op(name: &str) -> Option<UnaryOp> {
    match name {
        "UNARY_POSITIVE" => Some(UnaryOp::Plus),
        "UNARY_NEGATIVE" => Some(UnaryOp::Minus),
        "UNARY_NOT" => Some(UnaryOp::Not),
        "UNARY_CONVERT" => Some(UnaryOp::Repr),
        "UNARY_INVERT" => Some(UnaryOp::Invert),
        _ => None,
    }
}

fn binary_op(name: &str) -> Option<BinaryOp> {
    match name {
        "BINARY_ADD" | "INPLACE_ADD" => Some(BinaryOp::Add),
        "BINARY_SUBTRACT" | "INPLACE_SUBTRACT" => Some(BinaryOp::Sub),
        "BINARY_MULTIPLY" | "INPLACE_MULTIPLY" => Some(BinaryOp::Mul),
        "BINARY_DIVIDE" | "BINARY_TRUE_DIVIDE" | "INPLACE_DIVIDE" | "INPLACE_TRUE_DIVIDE" => {
            Some(BinaryOp::Div)
        }
        "BINARY_FLOOR_DIVIDE" | "INPLACE_FLOOR_DIVIDE" => Some(BinaryOp::FloorDiv),
        "BINARY_MODULO" | "INPLACE_MODULO" => Some(BinaryOp::Mod),
        "BINARY_POWER" | "INPLACE_POWER" => Some(BinaryOp::Pow),
        "BINARY_AND" | "INPLACE_AND" => Some(BinaryOp::BitAnd),
        "BINARY_OR" | "INPLACE_OR" => Some(BinaryOp::BitOr),
        "BINARY_XOR" | "INPLACE_XOR" => Some(BinaryOp::BitXor),
        "BINARY_LSHIFT" | "INPLACE_LSHIFT" => Some(BinaryOp::Shl),
        "BINARY_RSHIFT" | "INPLACE_RSHIFT" => Some(BinaryOp::Shr),
        "BINARY_SUBSCR" => Some(BinaryOp::Subscript),
        _ => None,
    }
}

/// CPython's `cmp_op` table, indexed by `COMPARE_OP`'s argument.
fn compare_op(index: u32) -> Option<BinaryOp> {
    match index {
        0 => Some(BinaryOp::Lt),
        1 => Some(BinaryOp::Le),
        2 => Some(BinaryOp::Eq),
        3 => Some(BinaryOp::Ne),
        4 => Some(BinaryOp::Gt),
        5 => Some(BinaryOp::Ge),
        6 => Some(BinaryOp::In),
        7 => Some(BinaryOp::NotIn),
        8 => Some(BinaryOp::Is),
        9 => Some(BinaryOp::IsNot),
        _ => None,
    }
}

fn attr_name(arg: Option<Node>) -> Node {
    match arg {
        Some(Node::Ident(name)) => Node::Const(Value::Str(name)),
        Some(other) => other,
        None => Node::Const(Value::Null),
    }
}

fn raw_count(arg: &Option<Node>) -> usize {
    match arg {
        Some(Node::Const(Value::Int(n))) => (*n).max(0) as usize,
        _ => 0,
    }
}

fn pop1(stack: &mut Vec<Node>, op: &'static str) -> Result<Node, LiftError> {
    stack.pop().ok_or(LiftError::StackUnderflow { op })
}

fn pop_n(stack: &mut Vec<Node>, n: usize, op: &'static str) -> Result<Vec<Node>, LiftError> {
    if n > stack.len() {
        return Err(LiftError::StackUnderflow { op });
    }
    let start = stack.len() - n;
    Ok(stack.split_off(start))
}

fn wrap_as_call(constructor: &str, items: Vec<Node>) -> Node {
    Node::Call {
        func: Box::new(Node::Ident(constructor.to_string())),
        args: Box::new(Node::Tuple(vec![Node::Tuple(items)])),
        kwargs: Box::new(Node::Dict(vec![])),
    }
}

/// Records `name`'s scope in `ctx` according to which opcode family touched it.
fn record_scope(ctx: &mut Context, op: &'static str, name: &str) {
    if op.ends_with("_GLOBAL") {
        ctx.record_global(name);
    } else {
        ctx.record_local(name);
    }
}

#[allow(clippy::too_many_arguments)]
fn execute(
    op: &'static str,
    arg: Option<Node>,
    stack: &mut Vec<Node>,
    output: &mut Vec<Node>,
    temps: &mut TempNames,
    ctx: &mut Context,
    pending_cond: &mut Option<Node>,
) -> Result<(), LiftError> {
    // Conditional jumps are consumed here, not emitted: the value they test
    // becomes the `cond` of the sibling If/Loop node the control-flow pass
    // placed right after them.
    if matches!(
        op,
        "POP_JUMP_IF_FALSE"
            | "POP_JUMP_IF_TRUE"
            | "JUMP_IF_FALSE"
            | "JUMP_IF_TRUE"
            | "JUMP_IF_FALSE_OR_POP"
            | "JUMP_IF_TRUE_OR_POP"
    ) {
        *pending_cond = Some(pop1(stack, op)?);
        return Ok(());
    }
    // Purely structural; their meaning was already captured by which
    // branch/loop shape the control-flow pass built.
    if matches!(op, "JUMP_FORWARD" | "JUMP_ABSOLUTE" | "CONTINUE_LOOP") {
        return Ok(());
    }

    if let Some(unary) = unary_op(op) {
        let child = pop1(stack, op)?;
        let bound = bind(
            output,
            temps,
            Node::Unary {
                op: unary,
                child: Box::new(child),
            },
        );
        stack.push(bound);
        return Ok(());
    }
    if let Some(binary) = binary_op(op) {
        let right = pop1(stack, op)?;
        let left = pop1(stack, op)?;
        let bound = bind(
            output,
            temps,
            Node::Binary {
                op: binary,
                left: Box::new(left),
                right: Box::new(right),
            },
        );
        stack.push(bound);
        return Ok(());
    }

    match op {
        "LOAD_CONST" => {
            let value = arg.unwrap_or(Node::Const(Value::None));
            let bound = bind(output, temps, value);
            stack.push(bound);
        }
        "LOAD_FAST" | "LOAD_NAME" | "LOAD_GLOBAL" | "LOAD_DEREF" | "LOAD_CLOSURE" => {
            if let Some(Node::Ident(name)) = &arg {
                record_scope(ctx, op, name);
            }
            let value = arg.unwrap_or(Node::Const(Value::Null));
            let bound = bind(output, temps, value);
            stack.push(bound);
        }
        "STORE_FAST" | "STORE_NAME" | "STORE_GLOBAL" | "STORE_DEREF" => {
            let value = pop1(stack, op)?;
            if let Some(Node::Ident(name)) = &arg {
                record_scope(ctx, op, name);
            }
            output.push(Node::Assign {
                left: Box::new(arg.unwrap_or(Node::Const(Value::Null))),
                right: Box::new(value),
            });
        }
        "DELETE_FAST" | "DELETE_NAME" | "DELETE_GLOBAL" => {
            if let Some(Node::Ident(name)) = &arg {
                record_scope(ctx, op, name);
            }
            output.push(Node::Del(Box::new(arg.unwrap_or(Node::Const(Value::Null)))));
        }
        "LOAD_ATTR" => {
            let base = pop1(stack, op)?;
            let bound = bind(
                output,
                temps,
                Node::Attr {
                    base: Box::new(base),
                    name: Box::new(attr_name(arg)),
                },
            );
            stack.push(bound);
        }
        "STORE_ATTR" => {
            let base = pop1(stack, op)?;
            let value = pop1(stack, op)?;
            output.push(Node::Assign {
                left: Box::new(Node::Attr {
                    base: Box::new(base),
                    name: Box::new(attr_name(arg)),
                }),
                right: Box::new(value),
            });
        }
        "DELETE_ATTR" => {
            let base = pop1(stack, op)?;
            output.push(Node::Del(Box::new(Node::Attr {
                base: Box::new(base),
                name: Box::new(attr_name(arg)),
            })));
        }
        "IMPORT_NAME" => {
            let _fromlist = pop1(stack, op)?;
            let _level = pop1(stack, op)?;
            let bound = bind(output, temps, arg.unwrap_or(Node::Const(Value::Null)));
            stack.push(bound);
        }
        "IMPORT_FROM" => {
            let bound = bind(output, temps, arg.unwrap_or(Node::Const(Value::Null)));
            stack.push(bound);
        }
        "COMPARE_OP" => {
            let index = match &arg {
                Some(Node::Const(Value::Int(n))) => *n as u32,
                _ => u32::MAX,
            };
            let right = pop1(stack, op)?;
            let left = pop1(stack, op)?;
            let cmp = compare_op(index).unwrap_or(BinaryOp::Eq);
            let bound = bind(
                output,
                temps,
                Node::Binary {
                    op: cmp,
                    left: Box::new(left),
                    right: Box::new(right),
                },
            );
            stack.push(bound);
        }
        "BUILD_TUPLE" => {
            let n = raw_count(&arg);
            let items = pop_n(stack, n, op)?;
            let bound = bind(output, temps, Node::Tuple(items));
            stack.push(bound);
        }
        "BUILD_LIST" => {
            let n = raw_count(&arg);
            let items = pop_n(stack, n, op)?;
            let bound = bind(output, temps, Node::List(items));
            stack.push(bound);
        }
        "BUILD_SET" => {
            let n = raw_count(&arg);
            let items = pop_n(stack, n, op)?;
            let bound = bind(output, temps, wrap_as_call("set", items));
            stack.push(bound);
        }
        "BUILD_MAP" => {
            let bound = bind(output, temps, Node::Dict(vec![]));
            stack.push(bound);
        }
        "STORE_MAP" => {
            // The dict itself stays on the stack (CPython leaves TOS2 in
            // place): only the key and value operands are popped.
            let key = pop1(stack, op)?;
            let value = pop1(stack, op)?;
            let dict = stack.last().cloned().ok_or(LiftError::StackUnderflow { op })?;
            output.push(Node::Assign {
                left: Box::new(Node::Binary {
                    op: BinaryOp::Subscript,
                    left: Box::new(dict),
                    right: Box::new(key),
                }),
                right: Box::new(value),
            });
        }
        "BUILD_SLICE" => {
            let n = raw_count(&arg).clamp(2, 3);
            let mut items = pop_n(stack, n, op)?;
            let step = if items.len() == 3 {
                items.pop().unwrap()
            } else {
                Node::Const(Value::None)
            };
            let stop = items.pop().unwrap_or(Node::Const(Value::None));
            let start = items.pop().unwrap_or(Node::Const(Value::None));
            let bound = bind(
                output,
                temps,
                Node::SliceRange {
                    start: Box::new(start),
                    stop: Box::new(stop),
                    step: Box::new(step),
                },
            );
            stack.push(bound);
        }
        "CALL_FUNCTION" => {
            let raw = raw_count(&arg) as u32;
            let kwcount = (raw >> 8) as usize;
            let argcount = (raw & 0xff) as usize;
            let mut kwitems = Vec::with_capacity(kwcount);
            for _ in 0..kwcount {
                let value = pop1(stack, op)?;
                let key = pop1(stack, op)?;
                kwitems.push(Node::DictItem {
                    key: Box::new(key),
                    value: Box::new(value),
                });
            }
            kwitems.reverse();
            // pop_n already returns operands in original left-to-right order.
            let args = pop_n(stack, argcount, op)?;
            let func = pop1(stack, op)?;
            let bound = bind(
                output,
                temps,
                Node::Call {
                    func: Box::new(func),
                    args: Box::new(Node::Tuple(args)),
                    kwargs: Box::new(Node::Dict(kwitems)),
                },
            );
            stack.push(bound);
        }
        "RETURN_VALUE" => {
            let value = pop1(stack, op)?;
            output.push(Node::Return(Some(Box::new(value))));
        }
        "RAISE_VARARGS" => {
            // k != 1 is left untouched: preserves the original's partial
            // support for two- and three-argument raise forms.
            if raw_count(&arg) == 1 {
                let exception = pop1(stack, op)?;
                output.push(Node::Raise(Box::new(exception)));
            } else {
                output.push(Node::Opcode {
                    offset: 0,
                    size: 0,
                    op,
                    arg: arg.map(Box::new),
                });
            }
        }
        "POP_TOP" => {
            pop1(stack, op)?;
        }
        "DUP_TOP" => {
            let top = stack.last().cloned().ok_or(LiftError::StackUnderflow { op })?;
            stack.push(top);
        }
        "DUP_TOPX" => {
            let n = raw_count(&arg);
            let tail = pop_n(stack, n, op)?;
            stack.extend(tail.clone());
            stack.extend(tail);
        }
        "ROT_TWO" => {
            let len = stack.len();
            if len < 2 {
                return Err(LiftError::StackUnderflow { op });
            }
            stack.swap(len - 1, len - 2);
        }
        "ROT_THREE" => {
            let len = stack.len();
            if len < 3 {
                return Err(LiftError::StackUnderflow { op });
            }
            stack[len - 3..].rotate_left(1);
        }
        "PRINT_ITEM" => {
            let value = pop1(stack, op)?;
            output.push(Node::PrintNoNewline(vec![value]));
        }
        "PRINT_NEWLINE" => output.push(Node::Print(vec![])),
        "SET_LINENO" => {}
        "UNPACK_SEQUENCE" => {
            let n = raw_count(&arg);
            let sequence = pop1(stack, op)?;
            let names: Vec<String> = (0..n).map(|_| temps.mint()).collect();
            output.push(Node::Assign {
                left: Box::new(Node::Tuple(
                    names.iter().cloned().map(Node::Ident).collect(),
                )),
                right: Box::new(sequence),
            });
            for name in names.into_iter().rev() {
                stack.push(Node::Ident(name));
            }
        }
        _ => {
            // Unrecognized instruction: surface it unchanged so the
            // renderer can still show *something* for it instead of
            // silently losing an instruction off the stack.
            output.push(Node::Opcode {
                offset: 0,
                size: 0,
                op,
                arg: arg.map(Box::new),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opcode(op: &'static str, arg: Option<Node>) -> Node {
        Node::Opcode {
            offset: 0,
            size: 0,
            op,
            arg: arg.map(Box::new),
        }
    }

    fn assigns<'a>(stmts: &'a [Node]) -> Vec<&'a Node> {
        stmts.iter().filter(|n| matches!(n, Node::Assign { .. })).collect()
    }

    #[test]
    fn load_const_store_fast_becomes_two_assigns() {
        let tree = Node::Block(vec![
            opcode("LOAD_CONST", Some(Node::Const(Value::Int(1)))),
            opcode("STORE_FAST", Some(Node::Ident("a".into()))),
        ]);
        let mut ctx = Context::new();
        let (lifted, err) = lift(tree, &mut ctx);
        assert!(err.is_none());
        match lifted {
            Node::Block(stmts) => {
                assert_eq!(stmts.len(), 2);
                assert!(matches!(&stmts[0], Node::Assign { left, .. } if matches!(**left, Node::Ident(ref n) if n == "$0")));
                assert!(
                    matches!(&stmts[1], Node::Assign { left, right, .. }
                        if matches!(**left, Node::Ident(ref n) if n == "a")
                        && matches!(**right, Node::Ident(ref n) if n == "$0"))
                );
            }
            other => panic!("expected Block, got {other:?}"),
        }
        assert!(ctx.local_vars.contains("a"));
    }

    #[test]
    fn binary_add_combines_two_loads_into_a_temp() {
        let tree = Node::Block(vec![
            opcode("LOAD_FAST", Some(Node::Ident("b".into()))),
            opcode("LOAD_FAST", Some(Node::Ident("c".into()))),
            opcode("BINARY_ADD", None),
            opcode("STORE_FAST", Some(Node::Ident("a".into()))),
        ]);
        let mut ctx = Context::new();
        let (lifted, err) = lift(tree, &mut ctx);
        assert!(err.is_none());
        match lifted {
            Node::Block(stmts) => {
                let adds = assigns(&stmts)
                    .into_iter()
                    .filter(|n| matches!(n, Node::Assign { right, .. } if matches!(**right, Node::Binary { op: BinaryOp::Add, .. })))
                    .count();
                assert_eq!(adds, 1);
            }
            other => panic!("expected Block, got {other:?}"),
        }
    }

    #[test]
    fn store_global_is_tracked_separately_from_locals() {
        let tree = Node::Block(vec![
            opcode("LOAD_CONST", Some(Node::Const(Value::Int(1)))),
            opcode("STORE_GLOBAL", Some(Node::Ident("g".into()))),
        ]);
        let mut ctx = Context::new();
        let (_, err) = lift(tree, &mut ctx);
        assert!(err.is_none());
        assert!(ctx.global_vars.contains("g"));
        assert!(!ctx.local_vars.contains("g"));
    }

    #[test]
    fn print_item_then_newline_becomes_two_print_nodes() {
        let tree = Node::Block(vec![
            opcode("LOAD_FAST", Some(Node::Ident("a".into()))),
            opcode("PRINT_ITEM", None),
            opcode("PRINT_NEWLINE", None),
        ]);
        let mut ctx = Context::new();
        let (lifted, err) = lift(tree, &mut ctx);
        assert!(err.is_none());
        match lifted {
            Node::Block(stmts) => {
                assert!(stmts.iter().any(|n| matches!(n, Node::PrintNoNewline(_))));
                assert!(stmts.iter().any(|n| matches!(n, Node::Print(_))));
            }
            other => panic!("expected Block, got {other:?}"),
        }
    }

    #[test]
    fn unpack_sequence_binds_a_tuple_assign() {
        let tree = Node::Block(vec![
            opcode("LOAD_FAST", Some(Node::Ident("c".into()))),
            opcode("UNPACK_SEQUENCE", Some(Node::Const(Value::Int(2)))),
            opcode("STORE_FAST", Some(Node::Ident("a".into()))),
            opcode("STORE_FAST", Some(Node::Ident("b".into()))),
        ]);
        let mut ctx = Context::new();
        let (lifted, err) = lift(tree, &mut ctx);
        assert!(err.is_none());
        match lifted {
            Node::Block(stmts) => {
                assert!(stmts.iter().any(|n| matches!(n, Node::Assign { left, .. } if matches!(**left, Node::Tuple(ref items) if items.len() == 2))));
                assert!(stmts
                    .iter()
                    .any(|n| matches!(n, Node::Assign { left, .. } if matches!(**left, Node::Ident(ref n) if n == "a"))));
                assert!(stmts
                    .iter()
                    .any(|n| matches!(n, Node::Assign { left, .. } if matches!(**left, Node::Ident(ref n) if n == "b"))));
            }
            other => panic!("expected Block, got {other:?}"),
        }
    }

    #[test]
    fn return_on_empty_stack_is_a_stack_underflow() {
        let tree = Node::Block(vec![opcode("RETURN_VALUE", None)]);
        let mut ctx = Context::new();
        let (lifted, err) = lift(tree, &mut ctx);
        assert_eq!(err, Some(LiftError::StackUnderflow { op: "RETURN_VALUE" }));
        assert_eq!(lifted, Node::Block(vec![]));
    }

    #[test]
    fn if_without_pending_condition_is_reported() {
        let tree = Node::Block(vec![Node::If {
            cond: Box::new(Node::Pass),
            then_branch: Box::new(Node::Block(vec![Node::Pass])),
            else_branch: None,
        }]);
        let mut ctx = Context::new();
        let (_, err) = lift(tree, &mut ctx);
        assert_eq!(
            err,
            Some(LiftError::UnknownOpcodeInLiftPosition {
                context: "if-condition"
            })
        );
    }

    #[test]
    fn if_else_with_balanced_branches_lifts_cleanly() {
        let tree = Node::Block(vec![
            opcode("LOAD_CONST", Some(Node::Const(Value::Int(1)))),
            opcode("POP_JUMP_IF_FALSE", Some(Node::Const(Value::Int(0)))),
            Node::If {
                cond: Box::new(Node::Pass),
                then_branch: Box::new(Node::Block(vec![
                    opcode("LOAD_CONST", Some(Node::Const(Value::Int(1)))),
                    opcode("STORE_FAST", Some(Node::Ident("b".into()))),
                ])),
                else_branch: Some(Box::new(Node::Block(vec![
                    opcode("LOAD_CONST", Some(Node::Const(Value::Int(2)))),
                    opcode("STORE_FAST", Some(Node::Ident("c".into()))),
                ]))),
            },
        ]);
        let mut ctx = Context::new();
        let (lifted, err) = lift(tree, &mut ctx);
        assert!(err.is_none());
        match lifted {
            Node::Block(stmts) => {
                assert_eq!(stmts.len(), 1);
                assert!(matches!(stmts[0], Node::If { .. }));
            }
            other => panic!("expected Block, got {other:?}"),
        }
    }

    #[test]
    fn if_branches_each_leaving_a_live_value_merge_into_one_name() {
        // A ternary-style conditional: both branches leave one value on the
        // stack (no STORE_FAST consumes it), so after the `If` the value
        // actually returned depends on which branch ran. Each branch's own
        // `execute()` mints its own `$n`; the merge step must introduce a
        // name neither branch's tail statement already uses, and have both
        // branches assign their own result to it.
        let tree = Node::Block(vec![
            opcode("LOAD_CONST", Some(Node::Const(Value::Int(9)))),
            opcode("POP_JUMP_IF_FALSE", Some(Node::Const(Value::Int(0)))),
            Node::If {
                cond: Box::new(Node::Pass),
                then_branch: Box::new(Node::Block(vec![opcode(
                    "LOAD_CONST",
                    Some(Node::Const(Value::Int(1))),
                )])),
                else_branch: Some(Box::new(Node::Block(vec![opcode(
                    "LOAD_CONST",
                    Some(Node::Const(Value::Int(2))),
                )]))),
            },
            opcode("RETURN_VALUE", None),
        ]);
        let mut ctx = Context::new();
        let (lifted, err) = lift(tree, &mut ctx);
        assert!(err.is_none(), "{err:?}");
        let stmts = match lifted {
            Node::Block(stmts) => stmts,
            other => panic!("expected Block, got {other:?}"),
        };
        let (then_branch, else_branch, return_value) = match &stmts[..] {
            [Node::If { then_branch, else_branch, .. }, Node::Return(Some(value))] => {
                (then_branch.as_ref(), else_branch.as_ref(), value.as_ref())
            }
            other => panic!("expected [If, Return], got {other:?}"),
        };
        let then_merge_name = match into_block_nodes(then_branch.clone()).last() {
            Some(Node::Assign { left, .. }) => match left.as_ref() {
                Node::Ident(name) => name.clone(),
                other => panic!("expected Ident, got {other:?}"),
            },
            other => panic!("expected a trailing Assign, got {other:?}"),
        };
        let else_merge_name = match into_block_nodes(else_branch.clone().unwrap()).last() {
            Some(Node::Assign { left, .. }) => match left.as_ref() {
                Node::Ident(name) => name.clone(),
                other => panic!("expected Ident, got {other:?}"),
            },
            other => panic!("expected a trailing Assign, got {other:?}"),
        };
        assert_eq!(then_merge_name, else_merge_name);
        assert_eq!(return_value, &Node::Ident(then_merge_name));
    }

    #[test]
    fn if_branches_with_unbalanced_stack_depth_is_reported() {
        let tree = Node::Block(vec![
            opcode("LOAD_CONST", Some(Node::Const(Value::Int(1)))),
            opcode("POP_JUMP_IF_FALSE", Some(Node::Const(Value::Int(0)))),
            Node::If {
                cond: Box::new(Node::Pass),
                then_branch: Box::new(Node::Block(vec![opcode(
                    "LOAD_CONST",
                    Some(Node::Const(Value::Int(1))),
                )])),
                else_branch: Some(Box::new(Node::Block(vec![Node::Pass]))),
            },
        ]);
        let mut ctx = Context::new();
        let (_, err) = lift(tree, &mut ctx);
        assert_eq!(
            err,
            Some(LiftError::BranchDepthMismatch {
                then_depth: 1,
                else_depth: 0
            })
        );
    }

    #[test]
    fn store_map_leaves_the_dict_on_the_stack() {
        let tree = Node::Block(vec![
            opcode("BUILD_MAP", None),
            opcode("LOAD_CONST", Some(Node::Const(Value::Int(2)))),
            opcode("LOAD_CONST", Some(Node::Const(Value::Int(1)))),
            opcode("STORE_MAP", None),
            opcode("STORE_FAST", Some(Node::Ident("a".into()))),
        ]);
        let mut ctx = Context::new();
        let (lifted, err) = lift(tree, &mut ctx);
        assert!(err.is_none());
        match lifted {
            Node::Block(stmts) => {
                assert!(stmts.iter().any(|n| matches!(n, Node::Assign { left, .. } if matches!(**left, Node::Binary { op: BinaryOp::Subscript, .. }))));
            }
            other => panic!("expected Block, got {other:?}"),
        }
    }
}
