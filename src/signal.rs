use std::fmt::{Debug, Display, Formatter};
use std::ops::Not;

/// Polarity-tagged reference to a node of a gate network.
///
/// Encoded as `2 * node + negated`. Node 0 is the constant, so
/// [`Signal::zero`] and [`Signal::one`] are the two constant signals.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Signal(u32);

// Constructors
impl Signal {
    pub const fn zero() -> Self {
        Self(0)
    }

    pub const fn one() -> Self {
        Self(1)
    }

    pub const fn from_node(node: usize) -> Self {
        Self((node as u32) << 1)
    }

    pub const fn new(node: usize, negated: bool) -> Self {
        Self(((node as u32) << 1) | negated as u32)
    }
}

// Getters
impl Signal {
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns 0 for the constants.
    pub const fn node(self) -> usize {
        (self.0 >> 1) as usize
    }

    pub const fn regular(self) -> Self {
        Self(self.0 & !1)
    }

    pub const fn not_cond(self, c: bool) -> Self {
        Self(self.0 ^ c as u32)
    }
}

// Checks
impl Signal {
    pub const fn is_const(self) -> bool {
        self.node() == 0
    }

    pub const fn is_negated(self) -> bool {
        // True for complement and for one.
        self.0 & 1 != 0
    }
}

impl From<bool> for Signal {
    fn from(b: bool) -> Self {
        if b {
            Self::one()
        } else {
            Self::zero()
        }
    }
}

impl Not for Signal {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self(self.0 ^ 1)
    }
}

impl Not for &Signal {
    type Output = Signal;

    fn not(self) -> Self::Output {
        Signal(self.0 ^ 1)
    }
}

impl Display for Signal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_const() {
            write!(f, "{}", self.0 & 1)
        } else {
            if self.is_negated() {
                write!(f, "!")?;
            }
            write!(f, "n{}", self.node())
        }
    }
}

impl Debug for Signal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_const() {
        let zero = Signal::zero();
        let one = Signal::one();

        assert!(zero.is_const());
        assert!(one.is_const());

        assert_eq!(zero, !one);
        assert_eq!(one, !zero);

        assert!(!zero.is_negated());
        assert!(one.is_negated());
    }

    #[test]
    fn test_node() {
        let s = Signal::new(7, true);
        assert_eq!(s.node(), 7);
        assert!(s.is_negated());
        assert_eq!(s.regular(), Signal::from_node(7));
        assert_eq!(!s, Signal::from_node(7));
        assert_eq!(s.not_cond(true), Signal::from_node(7));
        assert_eq!(format!("{}", s), "!n7");
    }
}
