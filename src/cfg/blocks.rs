use std::collections::{BTreeSet, HashMap};

use crate::ir::Node;
use crate::marshal::Value;

enum TargetKind {
    Relative,
    Absolute,
}

enum JumpShape {
    /// Jumps unconditionally; the block has no fallthrough successor.
    Unconditional,
    /// May fall through; the block has both a taken and a fallthrough successor.
    Conditional,
}

struct JumpInfo {
    target_kind: TargetKind,
    shape: JumpShape,
}

/// Every opcode name that can redirect control flow, grounded on the source
/// interpreter's jump classification: which ones carry an absolute target
/// versus one relative to the instruction after them, and which ones always
/// take the branch versus may fall through.
fn jump_info(name: &str) -> Option<JumpInfo> {
    use JumpShape::*;
    use TargetKind::*;
    match name {
        "JUMP_FORWARD" => Some(JumpInfo {
            target_kind: Relative,
            shape: Unconditional,
        }),
        "JUMP_ABSOLUTE" => Some(JumpInfo {
            target_kind: Absolute,
            shape: Unconditional,
        }),
        "JUMP_IF_FALSE" | "JUMP_IF_TRUE" => Some(JumpInfo {
            target_kind: Relative,
            shape: Conditional,
        }),
        "JUMP_IF_FALSE_OR_POP" | "JUMP_IF_TRUE_OR_POP" | "POP_JUMP_IF_FALSE"
        | "POP_JUMP_IF_TRUE" => Some(JumpInfo {
            target_kind: Absolute,
            shape: Conditional,
        }),
        _ => None,
    }
}

fn raw_arg(node: &Node) -> Option<u32> {
    match node {
        Node::Const(Value::Int(n)) => Some(*n as u32),
        _ => None,
    }
}

fn opcode_fields(node: &Node) -> Option<(usize, usize, &'static str, Option<&Node>)> {
    match node {
        Node::Opcode {
            offset,
            size,
            op,
            arg,
        } => Some((*offset, *size, op, arg.as_deref())),
        _ => None,
    }
}

fn resolve_target(info: &JumpInfo, offset: usize, size: usize, arg: u32) -> usize {
    match info.target_kind {
        TargetKind::Relative => offset + size + arg as usize,
        TargetKind::Absolute => arg as usize,
    }
}

/// Every offset at which a new basic block must start: the first
/// instruction, and both the fallthrough and taken-branch target of every
/// jumping instruction, whether or not that particular jump is conditional.
/// (An unconditional jump's fallthrough is usually unreachable, but marking
/// it as a block boundary anyway is harmless and keeps this one rule
/// uniform across every jump kind.)
fn jump_targets(nodes: &[Node]) -> BTreeSet<usize> {
    let mut targets = BTreeSet::new();
    if let Some(first) = nodes.first().and_then(opcode_fields) {
        targets.insert(first.0);
    }
    for node in nodes {
        let Some((offset, size, op, arg)) = opcode_fields(node) else {
            continue;
        };
        let Some(info) = jump_info(op) else { continue };
        targets.insert(offset + size);
        if let Some(raw) = arg.and_then(raw_arg) {
            targets.insert(resolve_target(&info, offset, size, raw));
        }
    }
    targets
}

/// Splits a flat instruction list into basic blocks at every jump target.
pub fn split_into_basic_blocks(nodes: Vec<Node>) -> Vec<(usize, Vec<Node>)> {
    let targets = jump_targets(&nodes);
    let mut blocks = Vec::new();
    let mut current: Vec<Node> = Vec::new();
    let mut current_start = 0usize;
    for node in nodes {
        let offset = opcode_fields(&node).map(|f| f.0).unwrap_or(current_start);
        if targets.contains(&offset) && !current.is_empty() {
            blocks.push((current_start, std::mem::take(&mut current)));
            current_start = offset;
        } else if current.is_empty() {
            current_start = offset;
        }
        current.push(node);
    }
    if !current.is_empty() {
        blocks.push((current_start, current));
    }
    blocks
}

#[derive(Debug, Clone)]
pub struct BasicBlockData {
    pub start: usize,
    pub nodes: Vec<Node>,
    /// Taken branch first, then fallthrough, matching the evaluation-order
    /// convention used everywhere else a branch and a fallthrough compete.
    pub successors: Vec<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct BlockGraph {
    pub blocks: Vec<BasicBlockData>,
}

impl BlockGraph {
    pub fn predecessors(&self, index: usize) -> Vec<usize> {
        self.blocks
            .iter()
            .enumerate()
            .filter(|(_, b)| b.successors.contains(&index))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Wires up successor edges between basic blocks produced by
/// [`split_into_basic_blocks`], forming the arena-indexed graph later passes
/// (dominators, control-structure recovery) operate over. Blocks are
/// referenced by index into `graph.blocks`, not by pointer, so back edges
/// and cycles are just ordinary integers.
pub fn build_graph(blocks: Vec<(usize, Vec<Node>)>) -> BlockGraph {
    let start_to_index: HashMap<usize, usize> = blocks
        .iter()
        .enumerate()
        .map(|(i, (start, _))| (*start, i))
        .collect();

    let mut graph = BlockGraph {
        blocks: Vec::with_capacity(blocks.len()),
    };

    for (start, nodes) in blocks.iter() {
        let last = nodes.last().and_then(opcode_fields);
        let block_end = last.map(|(offset, size, _, _)| offset + size);
        let fallthrough = block_end.and_then(|end| start_to_index.get(&end)).copied();
        let mut successors = Vec::new();

        if let Some((offset, size, op, arg)) = last {
            if let Some(info) = jump_info(op) {
                if let Some(target) = arg
                    .and_then(raw_arg)
                    .map(|raw| resolve_target(&info, offset, size, raw))
                    .and_then(|target| start_to_index.get(&target))
                {
                    successors.push(*target);
                }
                if matches!(info.shape, JumpShape::Conditional) {
                    successors.extend(fallthrough);
                }
            } else {
                successors.extend(fallthrough);
            }
        } else {
            successors.extend(fallthrough);
        }

        graph.blocks.push(BasicBlockData {
            start: *start,
            nodes: nodes.clone(),
            successors,
        });
    }

    graph
}
