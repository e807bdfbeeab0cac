//! Pass 4 of the simplification pipeline: merges the adjacent
//! `PrintNoNewline`/`Print` nodes the lifter emits for `PRINT_ITEM`,
//! `PRINT_ITEM_TO`, and `PRINT_NEWLINE` back into the single Python `print`
//! statement they came from.
use crate::ir::{fold_children, Fold, Node};

/// Runs [`CombinePrintStatements`] once over `tree`.
pub fn combine_print_statements(tree: Node) -> Node {
    CombinePrints.fold(tree)
}

struct CombinePrints;

impl Fold for CombinePrints {
    fn fold(&mut self, node: Node) -> Node {
        match node {
            Node::Block(stmts) => Node::Block(self.combine_in_list(stmts)),
            other => fold_children(self, other),
        }
    }
}

impl CombinePrints {
    fn combine_in_list(&mut self, stmts: Vec<Node>) -> Vec<Node> {
        let mut out: Vec<Node> = Vec::with_capacity(stmts.len());
        for stmt in stmts {
            let folded = fold_children(self, stmt);
            match (out.pop(), folded) {
                (Some(Node::PrintNoNewline(mut items)), Node::Print(more)) => {
                    items.extend(more);
                    out.push(Node::Print(items));
                }
                (Some(Node::PrintNoNewline(mut items)), Node::PrintNoNewline(more)) => {
                    items.extend(more);
                    out.push(Node::PrintNoNewline(items));
                }
                (prev, folded) => {
                    out.extend(prev);
                    out.push(folded);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marshal::Value;

    fn c(n: i64) -> Node {
        Node::Const(Value::Int(n))
    }

    #[test]
    fn print_item_then_newline_merges_into_one_print() {
        let tree = Node::Block(vec![Node::PrintNoNewline(vec![c(1)]), Node::Print(vec![])]);
        let result = combine_print_statements(tree);
        match result {
            Node::Block(stmts) => {
                assert_eq!(stmts.len(), 1);
                assert!(matches!(&stmts[0], Node::Print(items) if items.len() == 1));
            }
            other => panic!("expected Block, got {other:?}"),
        }
    }

    #[test]
    fn two_print_items_in_a_row_merge_without_a_newline() {
        let tree = Node::Block(vec![
            Node::PrintNoNewline(vec![c(1)]),
            Node::PrintNoNewline(vec![c(2)]),
        ]);
        let result = combine_print_statements(tree);
        match result {
            Node::Block(stmts) => {
                assert_eq!(stmts.len(), 1);
                assert!(matches!(&stmts[0], Node::PrintNoNewline(items) if items.len() == 2));
            }
            other => panic!("expected Block, got {other:?}"),
        }
    }

    #[test]
    fn unrelated_statements_are_left_alone() {
        let tree = Node::Block(vec![Node::Pass, Node::Pass]);
        let result = combine_print_statements(tree);
        assert_eq!(result, Node::Block(vec![Node::Pass, Node::Pass]));
    }

    proptest::proptest! {
        /// §8 property 9: running the pass twice is the same as running it
        /// once, for any sequence of prints and pass statements.
        #[test]
        fn combine_print_statements_is_idempotent(kinds in proptest::collection::vec(0u8..3, 0..12)) {
            let stmts: Vec<Node> = kinds
                .into_iter()
                .enumerate()
                .map(|(i, kind)| match kind {
                    0 => Node::Print(vec![c(i as i64)]),
                    1 => Node::PrintNoNewline(vec![c(i as i64)]),
                    _ => Node::Pass,
                })
                .collect();
            let tree = Node::Block(stmts);
            let once = combine_print_statements(tree);
            let twice = combine_print_statements(once.clone());
            proptest::prop_assert_eq!(once, twice);
        }
    }
}
