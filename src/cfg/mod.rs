//! Basic-block segmentation, successor wiring, dominator computation, and
//! structured control-flow recovery.
mod blocks;
mod control;
mod dominators;

pub use blocks::{build_graph, split_into_basic_blocks, BasicBlockData, BlockGraph};
pub use control::reconstruct_control_structures;
pub use dominators::{compute_dominators, compute_post_dominators};
