//! The decompiled program tree and the traversal contracts passes use to walk it.
mod node;
mod visitor;

pub use node::{BinaryOp, Node, UnaryOp};
pub use visitor::{fold_children, walk, walk_mut, Fold, Visit, VisitMut};
