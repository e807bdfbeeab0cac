//! Pass 3 of the simplification pipeline: folds the triple of statements
//! [`crate::lift::lift`] emits for each `STORE_MAP` back into a single
//! [`Node::DictItem`] on the originating [`Node::Dict`].
use crate::ir::{fold_children, Fold, Node};

use super::uses::Uses;

/// Runs [`ReconstructDictLiterals`] once over `tree`. Like the other passes
/// it's folded into [`super::simplify`]'s fixed-point loop, since inlining
/// a later statement can expose a dict-building run that was previously
/// separated by now-removed temp definitions.
pub fn reconstruct_dict_literals(tree: Node) -> Node {
    let uses = Uses::collect(&tree);
    ReconstructDicts { uses }.fold(tree)
}

struct ReconstructDicts {
    uses: Uses,
}

impl Fold for ReconstructDicts {
    fn fold(&mut self, node: Node) -> Node {
        match node {
            Node::Block(stmts) => Node::Block(self.fold_block(stmts)),
            other => fold_children(self, other),
        }
    }
}

impl ReconstructDicts {
    fn fold_block(&mut self, stmts: Vec<Node>) -> Vec<Node> {
        let stmts: Vec<Node> = stmts.into_iter().map(|s| fold_children(self, s)).collect();

        let mut out = Vec::with_capacity(stmts.len());
        let mut i = 0;
        while i < stmts.len() {
            if let Some((dict_name, items, consumed)) = self.match_dict_run(&stmts, i) {
                out.push(Node::Assign {
                    left: Box::new(Node::Ident(dict_name)),
                    right: Box::new(Node::Dict(items)),
                });
                i += consumed;
                continue;
            }
            out.push(stmts[i].clone());
            i += 1;
        }
        out
    }

    /// Recognizes `Assign(Ident($k), Dict([]))` followed immediately by a
    /// run of `Assign(Subscript(Ident($k), key), value)` statements, one
    /// per entry, and folds the whole run into a single `Dict` literal.
    ///
    /// `InlineVariables` runs before this pass in every round, so by the
    /// time a dict-building run reaches here its per-entry key/value temps
    /// have usually already been substituted directly into the
    /// subscript-assign's key and value positions; this pass doesn't care
    /// either way; it reads whatever expression is there. `$k` only needs
    /// to be written once to be a reconstruction candidate — its read
    /// count is never 1 (it's read once per entry plus once more wherever
    /// the dict is finally consumed), so the usual read==1/write==1
    /// eligibility rule used elsewhere would never match it.
    fn match_dict_run(&self, stmts: &[Node], start: usize) -> Option<(String, Vec<Node>, usize)> {
        let Node::Assign { left, right } = &stmts[start] else {
            return None;
        };
        let Node::Ident(dict_name) = left.as_ref() else {
            return None;
        };
        if !matches!(right.as_ref(), Node::Dict(items) if items.is_empty()) {
            return None;
        }
        if self.uses.writes.get(dict_name.as_str()).copied().unwrap_or(0) != 1 {
            return None;
        }

        let mut items = Vec::new();
        let mut i = start + 1;
        while i < stmts.len() {
            let Node::Assign {
                left: entry_left,
                right: entry_right,
            } = &stmts[i]
            else {
                break;
            };
            let Node::Binary {
                op: crate::ir::BinaryOp::Subscript,
                left: subscript_base,
                right: subscript_key,
            } = entry_left.as_ref()
            else {
                break;
            };
            if !matches!(subscript_base.as_ref(), Node::Ident(n) if n == dict_name) {
                break;
            }

            items.push(Node::DictItem {
                key: subscript_key.clone(),
                value: entry_right.clone(),
            });
            i += 1;
        }

        if items.is_empty() {
            None
        } else {
            Some((dict_name.clone(), items, i - start))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marshal::Value;

    fn ident(name: &str) -> Node {
        Node::Ident(name.to_string())
    }

    fn assign(left: Node, right: Node) -> Node {
        Node::Assign {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[test]
    fn single_entry_subscript_assign_becomes_a_dict_literal() {
        let tree = Node::Block(vec![
            assign(ident("$d"), Node::Dict(vec![])),
            assign(
                Node::Binary {
                    op: crate::ir::BinaryOp::Subscript,
                    left: Box::new(ident("$d")),
                    right: Box::new(Node::Const(Value::Int(1))),
                },
                Node::Const(Value::Int(2)),
            ),
        ]);
        let result = reconstruct_dict_literals(tree);
        match result {
            Node::Block(stmts) => {
                assert_eq!(stmts.len(), 1);
                match &stmts[0] {
                    Node::Assign { left, right } => {
                        assert!(matches!(left.as_ref(), Node::Ident(n) if n == "$d"));
                        match right.as_ref() {
                            Node::Dict(items) => assert_eq!(items.len(), 1),
                            other => panic!("expected Dict, got {other:?}"),
                        }
                    }
                    other => panic!("expected Assign, got {other:?}"),
                }
            }
            other => panic!("expected Block, got {other:?}"),
        }
    }

    #[test]
    fn two_entries_fold_into_one_dict_with_two_items() {
        let tree = Node::Block(vec![
            assign(ident("$d"), Node::Dict(vec![])),
            assign(
                Node::Binary {
                    op: crate::ir::BinaryOp::Subscript,
                    left: Box::new(ident("$d")),
                    right: Box::new(Node::Const(Value::Int(1))),
                },
                Node::Const(Value::Int(2)),
            ),
            assign(
                Node::Binary {
                    op: crate::ir::BinaryOp::Subscript,
                    left: Box::new(ident("$d")),
                    right: Box::new(Node::Const(Value::Int(3))),
                },
                Node::Const(Value::Int(4)),
            ),
        ]);
        let result = reconstruct_dict_literals(tree);
        match result {
            Node::Block(stmts) => {
                assert_eq!(stmts.len(), 1);
                match &stmts[0] {
                    Node::Assign { right, .. } => match right.as_ref() {
                        Node::Dict(items) => assert_eq!(items.len(), 2),
                        other => panic!("expected Dict, got {other:?}"),
                    },
                    other => panic!("expected Assign, got {other:?}"),
                }
            }
            other => panic!("expected Block, got {other:?}"),
        }
    }
}
