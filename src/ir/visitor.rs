//! Three traversal contracts over [`Node`], corresponding to the three ways
//! a pass below needs to walk the tree:
//!
//! - [`Visit`]: read-only, for passes that only gather information
//!   (e.g. counting uses of a name).
//! - [`VisitMut`]: in-place rewriting of children, for passes that replace
//!   some subset of nodes but never change the overall shape of the tree
//!   around them.
//! - [`Fold`]: consuming reconstruction, for passes that change the tree's
//!   shape outright (e.g. turning a flat list of opcodes into nested basic
//!   blocks).
//!
//! Each trait has one method with a default body that recurses into every
//! child; a pass overrides only the node kinds it cares about and falls
//! back to the provided `walk`/`walk_mut`/`fold_children` helper for
//! everything else, the same override-only-what-you-need shape as a
//! `NodeVisitor`/`NodeTransformer` pair in other language toolchains.
use super::node::Node;

pub trait Visit {
    fn visit(&mut self, node: &Node) {
        walk(self, node);
    }
}

pub fn walk<V: Visit + ?Sized>(visitor: &mut V, node: &Node) {
    for child in node.children() {
        visitor.visit(child);
    }
}

pub trait VisitMut {
    fn visit_mut(&mut self, node: &mut Node) {
        walk_mut(self, node);
    }
}

pub fn walk_mut<V: VisitMut + ?Sized>(visitor: &mut V, node: &mut Node) {
    for child in node.children_mut() {
        visitor.visit_mut(child);
    }
}

pub trait Fold {
    fn fold(&mut self, node: Node) -> Node {
        fold_children(self, node)
    }
}

/// Rebuilds `node` with every child replaced by `visitor.fold(child)`,
/// preserving the node's own shape. Passes that change shape (e.g.
/// `Block` -> nested `BasicBlock`s) override [`Fold::fold`] directly for
/// the variants they restructure instead of calling this.
pub fn fold_children<V: Fold + ?Sized>(visitor: &mut V, node: Node) -> Node {
    use Node::*;
    match node {
        Block(nodes) => Block(fold_all(visitor, nodes)),
        Tuple(nodes) => Tuple(fold_all(visitor, nodes)),
        List(nodes) => List(fold_all(visitor, nodes)),
        Print(nodes) => Print(fold_all(visitor, nodes)),
        PrintNoNewline(nodes) => PrintNoNewline(fold_all(visitor, nodes)),
        Global(nodes) => Global(fold_all(visitor, nodes)),
        Dict(nodes) => Dict(fold_all(visitor, nodes)),
        DictItem { key, value } => DictItem {
            key: Box::new(visitor.fold(*key)),
            value: Box::new(visitor.fold(*value)),
        },
        Opcode { offset, size, op, arg } => Opcode {
            offset,
            size,
            op,
            arg: arg.map(|a| Box::new(visitor.fold(*a))),
        },
        leaf @ (Const(_) | Docstr(_) | Comment(_) | Ident(_) | Pass) => leaf,
        Del(child) => Del(Box::new(visitor.fold(*child))),
        Raise(child) => Raise(Box::new(visitor.fold(*child))),
        Return(child) => Return(child.map(|c| Box::new(visitor.fold(*c)))),
        If {
            cond,
            then_branch,
            else_branch,
        } => If {
            cond: Box::new(visitor.fold(*cond)),
            then_branch: Box::new(visitor.fold(*then_branch)),
            else_branch: else_branch.map(|b| Box::new(visitor.fold(*b))),
        },
        Else(body) => Else(Box::new(visitor.fold(*body))),
        Loop { cond, body } => Loop {
            cond: cond.map(|c| Box::new(visitor.fold(*c))),
            body: Box::new(visitor.fold(*body)),
        },
        Unary { op, child } => Unary {
            op,
            child: Box::new(visitor.fold(*child)),
        },
        Binary { op, left, right } => Binary {
            op,
            left: Box::new(visitor.fold(*left)),
            right: Box::new(visitor.fold(*right)),
        },
        Slice {
            target,
            lower,
            upper,
        } => Slice {
            target: Box::new(visitor.fold(*target)),
            lower: lower.map(|l| Box::new(visitor.fold(*l))),
            upper: upper.map(|u| Box::new(visitor.fold(*u))),
        },
        Call { func, args, kwargs } => Call {
            func: Box::new(visitor.fold(*func)),
            args: Box::new(visitor.fold(*args)),
            kwargs: Box::new(visitor.fold(*kwargs)),
        },
        SliceRange { start, stop, step } => SliceRange {
            start: Box::new(visitor.fold(*start)),
            stop: Box::new(visitor.fold(*stop)),
            step: Box::new(visitor.fold(*step)),
        },
        Assign { left, right } => Assign {
            left: Box::new(visitor.fold(*left)),
            right: Box::new(visitor.fold(*right)),
        },
        Attr { base, name } => Attr {
            base: Box::new(visitor.fold(*base)),
            name: Box::new(visitor.fold(*name)),
        },
        BasicBlock { start, nodes } => BasicBlock {
            start,
            nodes: fold_all(visitor, nodes),
        },
    }
}

fn fold_all<V: Fold + ?Sized>(visitor: &mut V, nodes: Vec<Node>) -> Vec<Node> {
    nodes.into_iter().map(|n| visitor.fold(n)).collect()
}
