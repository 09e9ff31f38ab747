//! Per-variable unique table for decision-diagram nodes.
//!
//! The engine keeps one subtable per variable:
//!
//! ```text
//! subtables[0] → nodes labelled with variable 0
//! subtables[1] → nodes labelled with variable 1
//! ...
//! ```
//!
//! Since all nodes in a subtable share the variable, the key is just the
//! `(then, else)` pair of children. Keeping nodes grouped by variable makes
//! an adjacent-level swap touch exactly the two subtables involved.

use std::collections::HashMap;

use crate::literal::Lit;
use crate::types::Var;

/// Unique table for all nodes labelled with one variable.
#[derive(Debug, Clone)]
pub struct Subtable {
    pub variable: Var,
    nodes: HashMap<(Lit, Lit), u32>,
}

impl Subtable {
    pub fn new(variable: Var) -> Self {
        Self {
            variable,
            nodes: HashMap::new(),
        }
    }

    /// Look up a node by its children.
    pub fn find(&self, then: Lit, els: Lit) -> Option<u32> {
        self.nodes.get(&(then, els)).copied()
    }

    pub fn insert(&mut self, then: Lit, els: Lit, index: u32) {
        let prev = self.nodes.insert((then, els), index);
        debug_assert!(prev.is_none(), "Duplicate node ({}, {}) in subtable of {}", then, els, self.variable);
    }

    pub fn remove(&mut self, then: Lit, els: Lit) -> Option<u32> {
        self.nodes.remove(&(then, els))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all node indices in this subtable.
    pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.nodes.values().copied()
    }

    /// Removes every entry whose node index fails the predicate.
    pub fn retain(&mut self, mut keep: impl FnMut(u32) -> bool) {
        self.nodes.retain(|_, idx| keep(*idx));
    }
}
