use std::collections::{HashMap, HashSet, VecDeque};

use super::blocks::BlockGraph;
use super::dominators::{compute_dominators, compute_post_dominators};
use crate::ir::Node;

/// Recovers `if`/`else` and `while` structure from an already-dominator-
/// analyzed block graph.
///
/// The recognized shapes are deliberately narrow:
///
/// - **if / if-else**: a block ending in a two-way conditional branch whose
///   taken and fallthrough paths either merge back together (an `if`) or
///   merge after each running its own straight-line region (an `if`/`else`).
/// - **while**: a back edge (an edge to a block that dominates its source)
///   whose header block ends in a conditional branch that exits the loop.
///
/// Anything else - irregular merges, `try`/`except`, multi-level breaks -
/// is left as a flat sequence of its blocks' instructions; this pass never
/// fails, it just declines to structure what it doesn't recognize.
pub fn reconstruct_control_structures(graph: &BlockGraph) -> Node {
    if graph.blocks.is_empty() {
        return Node::Block(vec![]);
    }
    let idom = compute_dominators(graph, 0);
    let post_idom = compute_post_dominators(graph);
    let mut structurer = Structurer { graph, idom, post_idom };
    Node::Block(structurer.structure_region(0, None))
}

struct Structurer<'g> {
    graph: &'g BlockGraph,
    idom: HashMap<usize, usize>,
    post_idom: HashMap<usize, usize>,
}

impl<'g> Structurer<'g> {
    /// Emits the statements for the region starting at `start`, stopping
    /// (without including) `stop` if given.
    fn structure_region(&mut self, start: usize, stop: Option<usize>) -> Vec<Node> {
        let mut statements = Vec::new();
        let mut current = Some(start);
        while let Some(index) = current {
            if Some(index) == stop {
                break;
            }
            let block = &self.graph.blocks[index];

            if let Some(header_cond) = self.loop_header_condition(index) {
                let (body, after) = self.loop_body_and_exit(index);
                statements.extend(block.nodes.iter().cloned());
                statements.push(Node::Loop {
                    cond: header_cond.map(Box::new),
                    body: Box::new(Node::Block(body)),
                });
                current = after;
                continue;
            }

            match block.successors.as_slice() {
                [taken, fallthrough] => {
                    let merge = self.merge_point(index, *taken, *fallthrough);
                    let then_nodes = self.structure_region(*fallthrough, merge.or(Some(*taken)));
                    let else_nodes = if merge.is_some() && *taken != merge.unwrap() {
                        Some(self.structure_region(*taken, merge))
                    } else {
                        None
                    };
                    statements.extend(block.nodes.iter().cloned());
                    statements.push(Node::If {
                        cond: Box::new(last_expression(block)),
                        then_branch: Box::new(Node::Block(then_nodes)),
                        else_branch: else_nodes.map(|nodes| Box::new(Node::Block(nodes))),
                    });
                    current = merge;
                }
                [single] => {
                    statements.extend(block.nodes.iter().cloned());
                    current = Some(*single);
                }
                _ => {
                    statements.extend(block.nodes.iter().cloned());
                    current = None;
                }
            }
        }
        statements
    }

    /// A back edge `index -> target` exists when `target` dominates `index`
    /// (the classic definition of a natural loop header).
    fn loop_header_condition(&self, index: usize) -> Option<Option<Node>> {
        let block = &self.graph.blocks[index];
        let has_back_edge = block
            .successors
            .iter()
            .any(|&succ| self.dominates(succ, index));
        if !has_back_edge {
            return None;
        }
        Some(match block.successors.as_slice() {
            [_, _] => Some(last_expression(block)),
            _ => None,
        })
    }

    fn loop_body_and_exit(&mut self, header: usize) -> (Vec<Node>, Option<usize>) {
        let block = &self.graph.blocks[header];
        match block.successors.as_slice() {
            [back_edge_target, exit] if self.dominates(*back_edge_target, header) => {
                let body = self.structure_region(*back_edge_target, Some(header));
                (body, Some(*exit))
            }
            [exit, back_edge_target] if self.dominates(*back_edge_target, header) => {
                let body = self.structure_region(*back_edge_target, Some(header));
                (body, Some(*exit))
            }
            _ => (vec![], None),
        }
    }

    fn dominates(&self, maybe_dominator: usize, node: usize) -> bool {
        if maybe_dominator == node {
            return true;
        }
        let mut current = node;
        while let Some(&next) = self.idom.get(&current) {
            if next == maybe_dominator {
                return true;
            }
            current = next;
        }
        false
    }

    /// The block both arms of the two-way split at `branch` converge on, or
    /// `None` if this split isn't a structurable if/else. Requires `branch`
    /// to be the immediate dominator of both `taken` and `fallthrough` — if
    /// either arm is also reachable some other way (an irreducible or
    /// partially-dominated join), this isn't a clean if/else and the region
    /// is left unstructured. Given that, the merge point is found by asking
    /// whether one arm reaches the other arm's immediate post-dominator;
    /// that post-dominator is the first point every path out of `branch`
    /// is guaranteed to pass through.
    fn merge_point(&self, branch: usize, taken: usize, fallthrough: usize) -> Option<usize> {
        if taken == fallthrough {
            return Some(taken);
        }
        if self.idom.get(&taken) != Some(&branch) || self.idom.get(&fallthrough) != Some(&branch) {
            return None;
        }
        if let Some(&post) = self.post_idom.get(&fallthrough) {
            if post == taken || self.reachable(taken).contains(&post) {
                return Some(post);
            }
        }
        if let Some(&post) = self.post_idom.get(&taken) {
            if post == fallthrough || self.reachable(fallthrough).contains(&post) {
                return Some(post);
            }
        }
        None
    }

    fn reachable(&self, start: usize) -> HashSet<usize> {
        let mut visited: HashSet<usize> = [start].into();
        let mut queue = VecDeque::from([start]);
        while let Some(node) = queue.pop_front() {
            for &succ in &self.graph.blocks[node].successors {
                if visited.insert(succ) {
                    queue.push_back(succ);
                }
            }
        }
        visited
    }
}

/// The condition value a branch tests is whatever expression the symbolic
/// stack executor would have left on top of the stack at the branch point;
/// control-flow recovery runs before that executor does, so it stands in a
/// placeholder built from the branch instruction itself, which the lifter
/// (`crate::lift`) replaces with the real expression afterward.
fn last_expression(block: &super::blocks::BasicBlockData) -> Node {
    block
        .nodes
        .last()
        .cloned()
        .unwrap_or(Node::Const(crate::marshal::Value::None))
}
