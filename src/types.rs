//! Variable identifiers, stable across reordering.
use std::fmt;

/// A primary variable (0-indexed).
///
/// Only the level of a variable changes when the order changes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Var(u32);

impl Var {
    pub const fn new(id: u32) -> Self {
        Var(id)
    }

    pub const fn id(self) -> u32 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var() {
        let v = Var::new(3);
        assert_eq!(v.id(), 3);
        assert_eq!(v.index(), 3);
        assert!(Var::new(1) < v);
        assert_eq!(v.to_string(), "x3");
    }
}
