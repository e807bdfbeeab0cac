use std::collections::{HashMap, HashSet};

use super::blocks::{BasicBlockData, BlockGraph};

/// Computes each block's dominator set by iterating
/// `dom[n] = {n} ∪ ⋂ dom[p] for p in preds(n)` to a fixed point, then derives
/// each block's unique immediate dominator from those sets.
///
/// Returns a map from block index to its immediate dominator's index; the
/// entry block has no entry (nothing strictly dominates it).
pub fn compute_dominators(graph: &BlockGraph, entry: usize) -> HashMap<usize, usize> {
    let n = graph.blocks.len();
    let all: HashSet<usize> = (0..n).collect();

    let mut dom: Vec<HashSet<usize>> = (0..n)
        .map(|i| if i == entry { [entry].into() } else { all.clone() })
        .collect();

    let mut changed = true;
    while changed {
        changed = false;
        for node in 0..n {
            if node == entry {
                continue;
            }
            let preds = graph.predecessors(node);
            if preds.is_empty() {
                continue;
            }
            let mut new_dom = preds
                .iter()
                .map(|&p| dom[p].clone())
                .reduce(|a, b| a.intersection(&b).copied().collect())
                .unwrap_or_default();
            new_dom.insert(node);
            if new_dom != dom[node] {
                dom[node] = new_dom;
                changed = true;
            }
        }
    }

    let mut idom = HashMap::new();
    for node in 0..n {
        if node == entry {
            continue;
        }
        let candidates: HashSet<usize> = dom[node].iter().copied().filter(|&d| d != node).collect();
        for &candidate in &candidates {
            // The immediate dominator is the strict dominator every other
            // strict dominator also dominates — the one closest to `node`
            // on the (totally ordered) chain of dominators from the entry.
            let dominated_by_every_other_candidate = candidates
                .iter()
                .all(|&other| other == candidate || dom[candidate].contains(&other));
            if dominated_by_every_other_candidate {
                idom.insert(node, candidate);
                break;
            }
        }
    }
    idom
}

/// Computes each block's immediate post-dominator: the immediate dominator
/// of `node` in the graph with every edge reversed and a single virtual
/// exit node (index `graph.blocks.len()`) added as the entry, connected
/// from every block with no successors. Reuses [`compute_dominators`]
/// rather than a second bespoke fixed-point loop, since post-dominance is
/// exactly dominance over the reverse graph.
pub fn compute_post_dominators(graph: &BlockGraph) -> HashMap<usize, usize> {
    let n = graph.blocks.len();
    let exit = n;
    let mut reversed_successors: Vec<Vec<usize>> = vec![Vec::new(); n + 1];
    for (i, block) in graph.blocks.iter().enumerate() {
        for &succ in &block.successors {
            reversed_successors[succ].push(i);
        }
        if block.successors.is_empty() {
            reversed_successors[exit].push(i);
        }
    }

    let reversed_graph = BlockGraph {
        blocks: reversed_successors
            .into_iter()
            .map(|successors| BasicBlockData {
                start: 0,
                nodes: Vec::new(),
                successors,
            })
            .collect(),
    };

    compute_dominators(&reversed_graph, exit)
}
