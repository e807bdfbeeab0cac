//! The simplification pipeline that turns the lifter's three-address-code
//! output back into compact, readable source: a fixed-point loop over
//! variable inlining, dict-literal reconstruction, and print-statement
//! combining, followed by a single optional identifier-legalization pass
//! and a `global` declaration if the code object touches any globals.
mod dict_literals;
mod identifiers;
mod inline;
mod print_statements;
mod uses;

use crate::context::Context;
use crate::ir::Node;

pub use identifiers::is_valid_identifier;
pub use uses::Uses;

/// Upper bound on fixed-point iterations of the inline/dict/print loop, a
/// backstop against a pass bug that would otherwise spin forever on a
/// tree that never stabilizes; no real decompilation should ever come
/// close to it.
const MAX_ITERATIONS: usize = 64;

/// Runs the full simplification pipeline over `tree`.
///
/// `legalize` corresponds to [`crate::pipeline::Options::legalize_identifiers`]:
/// when false, `MakeIdentifiersValid` is skipped and the lifter's raw `$n`
/// temp names survive into the rendered output, which is useful for
/// snapshotting the lifter's output on its own.
pub fn simplify(tree: Node, ctx: &mut Context, legalize: bool) -> Node {
    let mut tree = tree;
    for _ in 0..MAX_ITERATIONS {
        let before = tree.clone();
        tree = inline::inline_variables(tree);
        tree = dict_literals::reconstruct_dict_literals(tree);
        tree = print_statements::combine_print_statements(tree);
        if tree == before {
            break;
        }
    }

    if legalize {
        tree = identifiers::make_identifiers_valid(tree, ctx);
    }

    if !ctx.global_vars.is_empty() {
        let names = ctx
            .global_vars
            .iter()
            .cloned()
            .map(Node::Ident)
            .collect::<Vec<_>>();
        tree = match tree {
            Node::Block(mut stmts) => {
                stmts.insert(0, Node::Global(names));
                Node::Block(stmts)
            }
            other => Node::Block(vec![Node::Global(names), other]),
        };
    }

    tree
}
