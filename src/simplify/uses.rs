//! Pass 1 of the simplification pipeline: read/write counts per identifier.
use std::collections::HashMap;

use crate::ir::{walk, Node, Visit};

/// Read and write counts for every [`Node::Ident`] name appearing in a tree.
///
/// `Assign(Ident(x), rhs)` counts only as a write on `x`; the left-hand
/// identifier is never counted as a read even though it's visited, same for
/// every name in a `Tuple`/`List` unpack target. Everything else an
/// assignment's left side contains (an `Attr` base, a `Binary` subscript's
/// base and key) is read normally, since storing through it still evaluates
/// it.
#[derive(Debug, Default, Clone)]
pub struct Uses {
    pub reads: HashMap<String, usize>,
    pub writes: HashMap<String, usize>,
}

impl Uses {
    pub fn collect(node: &Node) -> Uses {
        let mut finder = FindUses::default();
        finder.visit(node);
        finder.uses
    }

    /// A name is a candidate for [`super::inline::inline_variables`] when it
    /// is written exactly once and read exactly once.
    pub fn is_eligible(&self, name: &str) -> bool {
        self.reads.get(name).copied().unwrap_or(0) == 1 && self.writes.get(name).copied().unwrap_or(0) == 1
    }
}

#[derive(Default)]
struct FindUses {
    uses: Uses,
}

impl FindUses {
    fn visit_write_target(&mut self, node: &Node) {
        match node {
            Node::Ident(name) => {
                *self.uses.writes.entry(name.clone()).or_insert(0) += 1;
            }
            Node::Tuple(items) | Node::List(items) => {
                for item in items {
                    self.visit_write_target(item);
                }
            }
            other => self.visit(other),
        }
    }
}

impl Visit for FindUses {
    fn visit(&mut self, node: &Node) {
        match node {
            Node::Ident(name) => {
                *self.uses.reads.entry(name.clone()).or_insert(0) += 1;
            }
            Node::Assign { left, right } => {
                self.visit_write_target(left);
                self.visit(right);
            }
            _ => walk(self, node),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marshal::Value;

    #[test]
    fn assign_lhs_is_a_write_not_a_read() {
        let tree = Node::Block(vec![Node::Assign {
            left: Box::new(Node::Ident("x".into())),
            right: Box::new(Node::Const(Value::Int(1))),
        }]);
        let uses = Uses::collect(&tree);
        assert_eq!(uses.writes.get("x"), Some(&1));
        assert_eq!(uses.reads.get("x"), None);
    }

    #[test]
    fn tuple_unpack_target_counts_each_name_as_a_write() {
        let tree = Node::Block(vec![Node::Assign {
            left: Box::new(Node::Tuple(vec![Node::Ident("a".into()), Node::Ident("b".into())])),
            right: Box::new(Node::Ident("seq".into())),
        }]);
        let uses = Uses::collect(&tree);
        assert_eq!(uses.writes.get("a"), Some(&1));
        assert_eq!(uses.writes.get("b"), Some(&1));
        assert_eq!(uses.reads.get("seq"), Some(&1));
    }

    #[test]
    fn subscript_assign_target_reads_its_base_and_key() {
        let tree = Node::Block(vec![Node::Assign {
            left: Box::new(Node::Binary {
                op: crate::ir::BinaryOp::Subscript,
                left: Box::new(Node::Ident("d".into())),
                right: Box::new(Node::Ident("k".into())),
            }),
            right: Box::new(Node::Ident("v".into())),
        }]);
        let uses = Uses::collect(&tree);
        assert_eq!(uses.reads.get("d"), Some(&1));
        assert_eq!(uses.reads.get("k"), Some(&1));
        assert_eq!(uses.reads.get("v"), Some(&1));
    }

    #[test]
    fn eligibility_requires_exactly_one_read_and_one_write() {
        let mut uses = Uses::default();
        uses.writes.insert("x".to_string(), 1);
        uses.reads.insert("x".to_string(), 1);
        assert!(uses.is_eligible("x"));
        uses.reads.insert("x".to_string(), 2);
        assert!(!uses.is_eligible("x"));
    }
}
