//! Pass 5 of the simplification pipeline: renames the lifter's synthetic
//! `$n` temps (and any other name that isn't a valid Python identifier)
//! into a stable sequence of short, legal names.
use std::collections::HashMap;

use crate::context::Context;
use crate::ir::{fold_children, Fold, Node};

/// Whether `name` could appear as a Python identifier: a leading
/// alphabetic-or-underscore character followed by any number of
/// alphanumeric-or-underscore characters. Deliberately ASCII-only; the
/// source bytecode's name table is itself ASCII-only for every input this
/// crate decodes.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Hands out `a, b, ..., z, var1, var2, ...`, skipping anything already
/// known to `ctx` (a real global, a real local, or a name a previous
/// legalization in this `Context`'s lifetime already produced).
struct NameGenerator<'a> {
    ctx: &'a mut Context,
    next_letter: u32,
    next_number: u32,
}

impl<'a> NameGenerator<'a> {
    fn new(ctx: &'a mut Context) -> Self {
        NameGenerator {
            ctx,
            next_letter: 0,
            next_number: 1,
        }
    }

    fn next(&mut self) -> String {
        loop {
            let candidate = if self.next_letter < 26 {
                let letter = (b'a' + self.next_letter as u8) as char;
                self.next_letter += 1;
                letter.to_string()
            } else {
                let name = format!("var{}", self.next_number);
                self.next_number += 1;
                name
            };
            if !self.ctx.is_known(&candidate) {
                self.ctx.generated.insert(candidate.clone());
                return candidate;
            }
        }
    }
}

/// Runs [`MakeIdentifiersValid`] once over `tree`, renaming every
/// identifier that isn't already a valid Python name to a freshly minted
/// one. The same source name always maps to the same new name within one
/// run.
pub fn make_identifiers_valid(tree: Node, ctx: &mut Context) -> Node {
    let mut pass = LegalizePass {
        ctx,
        renames: HashMap::new(),
    };
    pass.fold(tree)
}

struct LegalizePass<'a> {
    ctx: &'a mut Context,
    renames: HashMap<String, String>,
}

impl Fold for LegalizePass<'_> {
    fn fold(&mut self, node: Node) -> Node {
        match node {
            Node::Ident(name) => Node::Ident(self.legalize(name)),
            other => fold_children(self, other),
        }
    }
}

impl LegalizePass<'_> {
    fn legalize(&mut self, name: String) -> String {
        if is_valid_identifier(&name) {
            return name;
        }
        if let Some(existing) = self.renames.get(&name) {
            return existing.clone();
        }
        let mut generator = NameGenerator::new(self.ctx);
        let fresh = generator.next();
        self.renames.insert(name, fresh.clone());
        fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dollar_prefixed_temp_is_not_a_valid_identifier() {
        assert!(!is_valid_identifier("$0"));
        assert!(is_valid_identifier("_foo"));
        assert!(is_valid_identifier("foo2"));
        assert!(!is_valid_identifier("2foo"));
        assert!(!is_valid_identifier(""));
    }

    #[test]
    fn same_temp_always_maps_to_the_same_fresh_name() {
        let mut ctx = Context::new();
        let tree = Node::Block(vec![
            Node::Assign {
                left: Box::new(Node::Ident("$0".into())),
                right: Box::new(Node::Ident("$0".into())),
            },
        ]);
        let result = make_identifiers_valid(tree, &mut ctx);
        match result {
            Node::Block(stmts) => match &stmts[0] {
                Node::Assign { left, right } => assert_eq!(left, right),
                other => panic!("expected Assign, got {other:?}"),
            },
            other => panic!("expected Block, got {other:?}"),
        }
    }

    #[test]
    fn generator_skips_names_already_known_to_the_context() {
        let mut ctx = Context::new();
        ctx.record_local("a");
        let tree = Node::Ident("$0".into());
        let result = make_identifiers_valid(tree, &mut ctx);
        assert_eq!(result, Node::Ident("b".into()));
    }

    proptest::proptest! {
        /// §8 property 7: every `Ident.name` left in the tree after this
        /// pass is a valid identifier, no matter how the input names were
        /// spelled.
        #[test]
        fn every_identifier_is_valid_after_legalization(names in proptest::collection::vec("[^a-zA-Z_]{0,3}[a-zA-Z0-9_]{0,4}", 0..8)) {
            let mut ctx = Context::new();
            let tree = Node::Block(
                names.into_iter().map(|n| Node::Assign {
                    left: Box::new(Node::Ident(n.clone())),
                    right: Box::new(Node::Ident(n)),
                }).collect(),
            );
            let result = make_identifiers_valid(tree, &mut ctx);
            let mut collector = IdentCollector(Vec::new());
            crate::ir::Visit::visit(&mut collector, &result);
            for name in collector.0 {
                proptest::prop_assert!(is_valid_identifier(&name));
            }
        }
    }

    struct IdentCollector(Vec<String>);

    impl crate::ir::Visit for IdentCollector {
        fn visit(&mut self, node: &Node) {
            if let Node::Ident(name) = node {
                self.0.push(name.clone());
            }
            crate::ir::walk(self, node);
        }
    }
}
