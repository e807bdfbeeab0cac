use crate::marshal::Value;

/// A unary operator, normalized from the source interpreter's opcode set.
/// `Repr` corresponds to the Python 2 backtick `` `x` `` operator (`UNARY_CONVERT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Invert,
    Not,
    Repr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    And,
    Or,
    Is,
    IsNot,
    In,
    NotIn,
    Lt,
    Le,
    Eq,
    Ne,
    Gt,
    Ge,
    Subscript,
}

/// A node in the decompiled program tree.
///
/// This is a single sum type rather than a family of unrelated structs:
/// every pass below operates over `Node` through the [`crate::ir::visitor`]
/// contracts, and a single enum is what lets those contracts be one method
/// each instead of one `accept` implementation per node kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Block(Vec<Node>),
    Tuple(Vec<Node>),
    List(Vec<Node>),
    Print(Vec<Node>),
    PrintNoNewline(Vec<Node>),
    Global(Vec<Node>),
    /// Children are always [`Node::DictItem`].
    Dict(Vec<Node>),
    DictItem {
        key: Box<Node>,
        value: Box<Node>,
    },
    /// A residual, un-lifted instruction. Surviving to the rendered output
    /// means the lifter didn't know how to turn it into a structured node.
    Opcode {
        offset: usize,
        size: usize,
        op: &'static str,
        arg: Option<Box<Node>>,
    },
    Const(Value),
    Docstr(String),
    Comment(String),
    Ident(String),
    Del(Box<Node>),
    Pass,
    Return(Option<Box<Node>>),
    If {
        cond: Box<Node>,
        then_branch: Box<Node>,
        else_branch: Option<Box<Node>>,
    },
    Else(Box<Node>),
    /// Not part of the original bytecode's instruction set: a loop header
    /// recovered by control-flow reconstruction from a back edge.
    Loop {
        cond: Option<Box<Node>>,
        body: Box<Node>,
    },
    Unary {
        op: UnaryOp,
        child: Box<Node>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    Slice {
        target: Box<Node>,
        lower: Option<Box<Node>>,
        upper: Option<Box<Node>>,
    },
    Call {
        func: Box<Node>,
        args: Box<Node>,
        kwargs: Box<Node>,
    },
    Raise(Box<Node>),
    SliceRange {
        start: Box<Node>,
        stop: Box<Node>,
        step: Box<Node>,
    },
    Assign {
        left: Box<Node>,
        right: Box<Node>,
    },
    /// `name` is always a [`Node::Const`] wrapping a string, never an
    /// arbitrary expression; attribute names aren't computed.
    Attr {
        base: Box<Node>,
        name: Box<Node>,
    },
    /// Emitted by control-flow recovery, consumed by the same before
    /// anything downstream sees it; not part of the final rendered tree.
    BasicBlock {
        start: usize,
        nodes: Vec<Node>,
    },
}

impl Node {
    /// Every direct child that is itself a node, in evaluation order.
    pub fn children(&self) -> Vec<&Node> {
        use Node::*;
        match self {
            Block(nodes) | Tuple(nodes) | List(nodes) | Print(nodes) | PrintNoNewline(nodes)
            | Global(nodes) | Dict(nodes) => nodes.iter().collect(),
            DictItem { key, value } => vec![key, value],
            Opcode { arg, .. } => arg.iter().map(|b| b.as_ref()).collect(),
            Const(_) | Docstr(_) | Comment(_) | Ident(_) | Pass => vec![],
            Del(child) | Raise(child) => vec![child],
            Return(child) => child.iter().map(|b| b.as_ref()).collect(),
            If {
                cond,
                then_branch,
                else_branch,
            } => {
                let mut out = vec![cond.as_ref(), then_branch.as_ref()];
                out.extend(else_branch.iter().map(|b| b.as_ref()));
                out
            }
            Else(body) => vec![body],
            Loop { cond, body } => {
                let mut out: Vec<&Node> = cond.iter().map(|b| b.as_ref()).collect();
                out.push(body);
                out
            }
            Unary { child, .. } => vec![child],
            Binary { left, right, .. } => vec![left, right],
            Slice {
                target,
                lower,
                upper,
            } => {
                let mut out = vec![target.as_ref()];
                out.extend(lower.iter().map(|b| b.as_ref()));
                out.extend(upper.iter().map(|b| b.as_ref()));
                out
            }
            Call { func, args, kwargs } => vec![func, args, kwargs],
            SliceRange { start, stop, step } => vec![start, stop, step],
            Assign { left, right } => vec![left, right],
            Attr { base, name } => vec![base, name],
            BasicBlock { nodes, .. } => nodes.iter().collect(),
        }
    }

    /// Same as [`Node::children`] but mutable, for in-place rewrites.
    pub fn children_mut(&mut self) -> Vec<&mut Node> {
        use Node::*;
        match self {
            Block(nodes) | Tuple(nodes) | List(nodes) | Print(nodes) | PrintNoNewline(nodes)
            | Global(nodes) | Dict(nodes) => nodes.iter_mut().collect(),
            DictItem { key, value } => vec![key, value],
            Opcode { arg, .. } => arg.iter_mut().map(|b| b.as_mut()).collect(),
            Const(_) | Docstr(_) | Comment(_) | Ident(_) | Pass => vec![],
            Del(child) | Raise(child) => vec![child],
            Return(child) => child.iter_mut().map(|b| b.as_mut()).collect(),
            If {
                cond,
                then_branch,
                else_branch,
            } => {
                let mut out = vec![cond.as_mut(), then_branch.as_mut()];
                out.extend(else_branch.iter_mut().map(|b| b.as_mut()));
                out
            }
            Else(body) => vec![body],
            Loop { cond, body } => {
                let mut out: Vec<&mut Node> = cond.iter_mut().map(|b| b.as_mut()).collect();
                out.push(body);
                out
            }
            Unary { child, .. } => vec![child],
            Binary { left, right, .. } => vec![left, right],
            Slice {
                target,
                lower,
                upper,
            } => {
                let mut out = vec![target.as_mut()];
                out.extend(lower.iter_mut().map(|b| b.as_mut()));
                out.extend(upper.iter_mut().map(|b| b.as_mut()));
                out
            }
            Call { func, args, kwargs } => vec![func, args, kwargs],
            SliceRange { start, stop, step } => vec![start, stop, step],
            Assign { left, right } => vec![left, right],
            Attr { base, name } => vec![base, name],
            BasicBlock { nodes, .. } => nodes.iter_mut().collect(),
        }
    }

    pub fn is_block_like(&self) -> bool {
        matches!(
            self,
            Node::Block(_)
                | Node::Tuple(_)
                | Node::List(_)
                | Node::Print(_)
                | Node::PrintNoNewline(_)
                | Node::Global(_)
                | Node::Dict(_)
        )
    }

    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Node::Ident(name) => Some(name.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_visits_in_evaluation_order() {
        let node = Node::Assign {
            left: Box::new(Node::Ident("a".into())),
            right: Box::new(Node::Const(Value::Int(1))),
        };
        let children = node.children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].as_ident(), Some("a"));
    }

    #[test]
    fn leaf_nodes_have_no_children() {
        assert!(Node::Pass.children().is_empty());
        assert!(Node::Ident("x".into()).children().is_empty());
    }
}
