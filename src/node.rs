use crate::literal::Lit;

/// Decision-diagram node: `var ? then : els`.
///
/// The `els` child of a stored node is never complemented.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Node {
    pub var: u32,
    pub then: Lit,
    pub els: Lit,
}

impl Node {
    /// Variable label of slots on the free list and of the constant node.
    pub const NO_VAR: u32 = u32::MAX;

    pub const fn new(var: u32, then: Lit, els: Lit) -> Self {
        Self { var, then, els }
    }

    pub const fn free() -> Self {
        Self {
            var: Self::NO_VAR,
            then: Lit::ZERO,
            els: Lit::ZERO,
        }
    }

    pub const fn is_free(&self) -> bool {
        self.var == Self::NO_VAR
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::free()
    }
}
