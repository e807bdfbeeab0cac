//! The mutable state shared between the symbolic stack executor and the
//! simplification passes that run after it: which names are globals, which
//! are locals, and which names (of any origin) are already spoken for when
//! a later pass needs to mint a fresh one.
use std::collections::BTreeSet;

/// Per-decompilation scratch state. One `Context` is created per top-level
/// [`crate::lift::lift`] call and threaded through every simplification
/// pass that follows; its lifetime is exactly one decompilation, same as
/// the per-decoder string table in [`crate::marshal`] is scoped to one
/// `read_module` call.
#[derive(Debug, Default, Clone)]
pub struct Context {
    /// Names stored with `STORE_GLOBAL`/loaded with `LOAD_GLOBAL`/deleted
    /// with `DELETE_GLOBAL`. Non-empty at the end of a decompilation means
    /// the rendered module needs a leading `global ...` statement.
    pub global_vars: BTreeSet<String>,
    /// Names touched through the `_FAST`/`_NAME` opcode families.
    pub local_vars: BTreeSet<String>,
    /// Every name MakeIdentifiersValid has already handed out, so repeated
    /// legalization passes (or nested code objects sharing a Context)
    /// never mint a name twice.
    pub generated: BTreeSet<String>,
}

impl Context {
    pub fn new() -> Self {
        Context::default()
    }

    pub fn record_global(&mut self, name: &str) {
        self.global_vars.insert(name.to_string());
    }

    pub fn record_local(&mut self, name: &str) {
        self.local_vars.insert(name.to_string());
    }

    /// Whether `name` is already in use anywhere this Context knows about:
    /// as a global, a local, or a name a previous legalization already
    /// produced.
    pub fn is_known(&self, name: &str) -> bool {
        self.global_vars.contains(name) || self.local_vars.contains(name) || self.generated.contains(name)
    }
}
