use std::fmt::{Debug, Display, Formatter};
use std::ops::Not;

/// Reference to a Boolean function inside an [`Engine`][crate::engine::Engine].
///
/// Encoded as `2 * index + polarity`. Index 0 is the constant node, so
/// [`Lit::ZERO`] and [`Lit::ONE`] are the two constant functions.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Lit(u32);

impl Lit {
    pub const ZERO: Lit = Lit(0);
    pub const ONE: Lit = Lit(1);

    pub const fn new(index: u32, complemented: bool) -> Self {
        Self((index << 1) | complemented as u32)
    }

    /// Return the internal representation of the literal.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Return the node index of the literal.
    pub const fn index(self) -> u32 {
        self.0 >> 1
    }

    pub const fn is_complemented(self) -> bool {
        self.0 & 1 != 0
    }

    pub const fn is_const(self) -> bool {
        self.index() == 0
    }

    /// The same literal with the polarity bit cleared.
    pub const fn regular(self) -> Self {
        Self(self.0 & !1)
    }

    pub const fn not_cond(self, c: bool) -> Self {
        Self(self.0 ^ c as u32)
    }
}

impl Not for Lit {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self(self.0 ^ 1)
    }
}

impl From<bool> for Lit {
    fn from(b: bool) -> Self {
        if b {
            Lit::ONE
        } else {
            Lit::ZERO
        }
    }
}

impl Display for Lit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_const() {
            write!(f, "{}", self.0 & 1)
        } else {
            write!(f, "{}@{}", if self.is_complemented() { "~" } else { "" }, self.index())
        }
    }
}

impl Debug for Lit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}
