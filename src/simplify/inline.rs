//! Pass 2 of the simplification pipeline: collapses every name written
//! exactly once and read exactly once back into the expression that
//! produced it, undoing the temp-per-operation explosion
//! [`crate::lift::lift`] deliberately introduces.
use std::collections::HashSet;

use crate::ir::{fold_children, Fold, Node};
use crate::marshal::Value;

use super::uses::Uses;

/// Runs [`InlineVariables`] and its parallel-assign fusion step to a local
/// fixed point over `tree`.
pub fn inline_variables(tree: Node) -> Node {
    let uses = Uses::collect(&tree);
    let mut pass = InlinePass { uses };
    pass.fold(tree)
}

struct InlinePass {
    uses: Uses,
}

impl Fold for InlinePass {
    fn fold(&mut self, node: Node) -> Node {
        match node {
            Node::Block(stmts) => Node::Block(self.inline_block(stmts)),
            other => fold_children(self, other),
        }
    }
}

impl InlinePass {
    fn inline_block(&mut self, stmts: Vec<Node>) -> Vec<Node> {
        // Nested statement lists (If/Loop bodies) are simplified bottom-up first.
        let mut stmts: Vec<Node> = stmts.into_iter().map(|s| fold_children(self, s)).collect();

        loop {
            let substituted = self.substitute_once(&stmts);
            let (fused, fusion_changed) = fuse_parallel_unpack(substituted.0, &self.uses);
            stmts = fused;
            if !substituted.1 && !fusion_changed {
                break;
            }
        }
        stmts
    }

    /// Finds the first eligible definition with a unique later consumer and
    /// substitutes it in, returning the new list and whether a substitution
    /// happened.
    fn substitute_once(&self, stmts: &[Node]) -> (Vec<Node>, bool) {
        for i in 0..stmts.len() {
            let Node::Assign { left, right } = &stmts[i] else {
                continue;
            };
            let Node::Ident(name) = left.as_ref() else {
                continue;
            };
            if !self.uses.is_eligible(name) {
                continue;
            }
            let Some(j) = (i + 1..stmts.len()).find(|&j| contains_read(&stmts[j], name)) else {
                continue;
            };

            let before = collect_leaf_run(&stmts[i..=j], name);
            let mut candidate: Vec<Node> = stmts.to_vec();
            candidate[j] = substitute_ident(candidate[j].clone(), name, right);
            candidate.remove(i);

            let after = collect_leaf_run(&candidate[i..j], name);
            if before != after {
                // Substitution would reorder an observable read or constant;
                // leave this definition in place rather than risk changing
                // behavior.
                continue;
            }
            return (candidate, true);
        }
        (stmts.to_vec(), false)
    }
}

/// Whether `name` is read anywhere in `node`, excluding pure name write
/// targets (`Assign`'s left side, or any `Ident` nested inside a
/// `Tuple`/`List` acting as an unpack target).
fn contains_read(node: &Node, name: &str) -> bool {
    match node {
        Node::Ident(n) => n == name,
        Node::Assign { left, right } => write_target_reads(left, name) || contains_read(right, name),
        other => other.children().iter().any(|child| contains_read(child, name)),
    }
}

fn write_target_reads(node: &Node, name: &str) -> bool {
    match node {
        Node::Ident(_) => false,
        Node::Tuple(items) | Node::List(items) => items.iter().any(|item| write_target_reads(item, name)),
        other => contains_read(other, name),
    }
}

/// Replaces every read occurrence of `name` with `replacement`, leaving
/// write targets (the left side of an `Assign`) untouched.
fn substitute_ident(node: Node, name: &str, replacement: &Node) -> Node {
    Substitute { name, replacement }.fold(node)
}

struct Substitute<'a> {
    name: &'a str,
    replacement: &'a Node,
}

impl Fold for Substitute<'_> {
    fn fold(&mut self, node: Node) -> Node {
        match node {
            Node::Ident(ref n) if n == self.name => self.replacement.clone(),
            Node::Assign { left, right } => Node::Assign {
                left: Box::new(self.fold_write_target(*left)),
                right: Box::new(self.fold(*right)),
            },
            other => fold_children(self, other),
        }
    }
}

impl Substitute<'_> {
    fn fold_write_target(&mut self, node: Node) -> Node {
        match node {
            ident @ Node::Ident(_) => ident,
            Node::Tuple(items) => {
                Node::Tuple(items.into_iter().map(|i| self.fold_write_target(i)).collect())
            }
            Node::List(items) => Node::List(items.into_iter().map(|i| self.fold_write_target(i)).collect()),
            other => self.fold(other),
        }
    }
}

/// A single comparable leaf value: either a non-excluded identifier or a
/// constant, in the evaluation order `collect_leaf_run` visits them.
#[derive(Debug, Clone, PartialEq)]
enum Leaf {
    Ident(String),
    Const(Value),
}

/// Collects the ordered leaf sequence of a span of statements, skipping
/// occurrences of `excluded` (the identifier about to be inlined away). An
/// `Assign` visits its right side before its left, mirroring evaluation
/// order.
fn collect_leaf_run(nodes: &[Node], excluded: &str) -> Vec<Leaf> {
    let mut out = Vec::new();
    for node in nodes {
        collect_leaves(node, excluded, &mut out);
    }
    out
}

fn collect_leaves(node: &Node, excluded: &str, out: &mut Vec<Leaf>) {
    match node {
        Node::Ident(n) if n == excluded => {}
        Node::Ident(n) => out.push(Leaf::Ident(n.clone())),
        Node::Const(v) => out.push(Leaf::Const(v.clone())),
        Node::Assign { left, right } => {
            collect_leaves(right, excluded, out);
            collect_leaves(left, excluded, out);
        }
        other => {
            for child in other.children() {
                collect_leaves(child, excluded, out);
            }
        }
    }
}

/// Recognizes the shape the lifter emits for a multi-target unpack: a
/// `Assign(Tuple(temps), src)` immediately followed by one
/// `Assign(Ident(lhs_k), Ident(temp_k))` per temp, each temp read and
/// written exactly once. Fuses the whole run into
/// `Assign(Tuple(lhs...), src)`, i.e. `a, b = c, d` rather than three
/// separate statements.
fn fuse_parallel_unpack(stmts: Vec<Node>, uses: &Uses) -> (Vec<Node>, bool) {
    let mut out = Vec::with_capacity(stmts.len());
    let mut changed = false;
    let mut i = 0;
    while i < stmts.len() {
        if let Some((lhs_names, src, consumed)) = match_unpack_group(&stmts, i, uses) {
            out.push(Node::Assign {
                left: Box::new(Node::Tuple(lhs_names.into_iter().map(Node::Ident).collect())),
                right: Box::new(src),
            });
            i += consumed;
            changed = true;
            continue;
        }
        if let Some((lhs_names, rhs_exprs, consumed)) = match_independent_def_run(&stmts, i, uses) {
            out.push(Node::Assign {
                left: Box::new(Node::Tuple(lhs_names.into_iter().map(Node::Ident).collect())),
                right: Box::new(Node::Tuple(rhs_exprs)),
            });
            i += consumed;
            changed = true;
            continue;
        }
        out.push(stmts[i].clone());
        i += 1;
    }
    (out, changed)
}

/// Recognizes the shape `ROT_TWO`/`ROT_THREE`-compiled parallel assignment
/// lowers to: a run of independent single-name defs (`$0 = c; $1 = d; ...`,
/// each temp read exactly once) immediately followed by one store per temp
/// (`a = $0; b = $1; ...`), each store consuming a distinct temp from the
/// run. Unlike [`match_unpack_group`], the defs here are unrelated
/// single-var assigns rather than one `Assign(Tuple(temps), src)` — this is
/// `a, b = c, d`, not `a, b = some_iterable`.
///
/// The defs run is scanned once for its maximal eligible length, then
/// shrunk from that length down to 2 until the immediately following
/// statements form a complete, bijective store run — so a trailing def not
/// actually consumed by the next statements doesn't block fusing the ones
/// that are. Because the store statements are plain name-to-name copies
/// with no side effects of their own, and the defs keep their original
/// left-to-right evaluation order inside the fused `Tuple` right side, this
/// batch fusion needs no separate evaluation-order check: it can't reorder
/// anything observable.
fn match_independent_def_run(stmts: &[Node], start: usize, uses: &Uses) -> Option<(Vec<String>, Vec<Node>, usize)> {
    let mut defs: Vec<(&str, &Node)> = Vec::new();
    let mut seen = HashSet::new();
    let mut i = start;
    while i < stmts.len() {
        let Node::Assign { left, right } = &stmts[i] else {
            break;
        };
        let Node::Ident(name) = left.as_ref() else {
            break;
        };
        if !uses.is_eligible(name) || !seen.insert(name.as_str()) {
            break;
        }
        defs.push((name.as_str(), right.as_ref()));
        i += 1;
    }

    for run_len in (2..=defs.len()).rev() {
        let candidate_defs = &defs[..run_len];
        let store_start = start + run_len;
        if store_start + run_len > stmts.len() {
            continue;
        }
        let mut remaining: HashSet<&str> = candidate_defs.iter().map(|(name, _)| *name).collect();
        let mut lhs_in_order = Vec::with_capacity(run_len);
        let mut ok = true;
        for store in &stmts[store_start..store_start + run_len] {
            let Node::Assign { left, right } = store else {
                ok = false;
                break;
            };
            match (left.as_ref(), right.as_ref()) {
                (Node::Ident(lhs), Node::Ident(rhs)) if remaining.remove(rhs.as_str()) => {
                    lhs_in_order.push(lhs.clone());
                }
                _ => {
                    ok = false;
                    break;
                }
            }
        }
        if ok && remaining.is_empty() {
            let rhs_exprs = candidate_defs.iter().map(|(_, rhs)| (*rhs).clone()).collect();
            return Some((lhs_in_order, rhs_exprs, run_len + run_len));
        }
    }
    None
}

fn match_unpack_group(stmts: &[Node], start: usize, uses: &Uses) -> Option<(Vec<String>, Node, usize)> {
    let Node::Assign { left, right } = &stmts[start] else {
        return None;
    };
    let Node::Tuple(items) = left.as_ref() else {
        return None;
    };
    if items.is_empty() {
        return None;
    }
    let temps: Vec<&str> = items
        .iter()
        .map(|item| match item {
            Node::Ident(name) => Some(name.as_str()),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    if !temps.iter().all(|t| uses.is_eligible(t)) {
        return None;
    }
    if start + temps.len() >= stmts.len() {
        return None;
    }
    let mut lhs_names = Vec::with_capacity(temps.len());
    for (k, temp) in temps.iter().enumerate() {
        match &stmts[start + 1 + k] {
            Node::Assign { left, right } => match (left.as_ref(), right.as_ref()) {
                (Node::Ident(lhs), Node::Ident(rhs)) if rhs == temp => lhs_names.push(lhs.clone()),
                _ => return None,
            },
            _ => return None,
        }
    }
    Some((lhs_names, (**right).clone(), 1 + temps.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn single_use_temp_is_inlined_into_its_consumer() {
        let tree = Node::Block(vec![
            assign(ident("$0"), Node::Const(Value::Int(1))),
            assign(ident("a"), ident("$0")),
        ]);
        let result = inline_variables(tree);
        match result {
            Node::Block(stmts) => {
                assert_eq!(stmts.len(), 1);
                assert!(matches!(&stmts[0], Node::Assign { left, right }
                    if matches!(**left, Node::Ident(ref n) if n == "a")
                    && matches!(**right, Node::Const(Value::Int(1)))));
            }
            other => panic!("expected Block, got {other:?}"),
        }
    }

    #[test]
    fn multiply_used_temp_is_not_inlined() {
        let tree = Node::Block(vec![
            assign(ident("$0"), Node::Const(Value::Int(1))),
            assign(ident("a"), ident("$0")),
            assign(ident("b"), ident("$0")),
        ]);
        let result = inline_variables(tree);
        match result {
            Node::Block(stmts) => assert_eq!(stmts.len(), 3),
            other => panic!("expected Block, got {other:?}"),
        }
    }

    #[test]
    fn independent_temp_defs_each_read_once_fuse_into_parallel_assign() {
        // ROT_TWO-compiled `a, b = c, d`: two unrelated single-var temp
        // defs, each consumed by exactly one later store, with no
        // intervening tuple-unpack statement for `match_unpack_group` to
        // anchor on.
        let tree = Node::Block(vec![
            assign(ident("$0"), ident("c")),
            assign(ident("$1"), ident("d")),
            assign(ident("a"), ident("$0")),
            assign(ident("b"), ident("$1")),
        ]);
        let result = inline_variables(tree);
        match result {
            Node::Block(stmts) => {
                assert_eq!(stmts.len(), 1);
                match &stmts[0] {
                    Node::Assign { left, right } => {
                        let Node::Tuple(lhs) = left.as_ref() else {
                            panic!("expected Tuple lhs, got {left:?}")
                        };
                        assert_eq!(lhs, &[ident("a"), ident("b")]);
                        let Node::Tuple(rhs) = right.as_ref() else {
                            panic!("expected Tuple rhs, got {right:?}")
                        };
                        assert_eq!(rhs, &[ident("c"), ident("d")]);
                    }
                    other => panic!("expected Assign, got {other:?}"),
                }
            }
            other => panic!("expected Block, got {other:?}"),
        }
    }

    #[test]
    fn parallel_unpack_group_fuses_into_one_tuple_assign() {
        let tree = Node::Block(vec![
            assign(Node::Tuple(vec![ident("$0"), ident("$1")]), ident("seq")),
            assign(ident("a"), ident("$0")),
            assign(ident("b"), ident("$1")),
        ]);
        let result = inline_variables(tree);
        match result {
            Node::Block(stmts) => {
                assert_eq!(stmts.len(), 1);
                match &stmts[0] {
                    Node::Assign { left, right } => {
                        assert!(matches!(**left, Node::Tuple(ref items) if items.len() == 2));
                        assert!(matches!(**right, Node::Ident(ref n) if n == "seq"));
                    }
                    other => panic!("expected Assign, got {other:?}"),
                }
            }
            other => panic!("expected Block, got {other:?}"),
        }
    }
}
