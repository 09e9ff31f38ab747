use crate::literal::Lit;

/// [Szudzik pairing function][szudzik-pairing].
///
/// ```text
/// (a, b) -> if (a<b) then (b^2 + a) else (a^2 + a + b)
/// ```
///
/// [szudzik-pairing]: http://szudzik.com/ElegantPairing.pdf
pub fn pairing2(a: u64, b: u64) -> u64 {
    if a < b {
        b.wrapping_mul(b).wrapping_add(a)
    } else {
        a.wrapping_mul(a).wrapping_add(a).wrapping_add(b)
    }
}

/// Bit mixer applied on top of pairing, so that nearby pairs spread over the slots
/// of a power-of-two table instead of clustering in the low bits.
pub fn mix64(mut x: u64) -> u64 {
    x ^= x >> 33;
    x = x.wrapping_mul(0xff51_afd7_ed55_8ccd);
    x ^= x >> 33;
    x = x.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    x ^ (x >> 33)
}

pub trait MyHash {
    /// Hash function used to pick a cache slot.
    fn hash(&self) -> u64;
}

impl MyHash for (u64, u64) {
    fn hash(&self) -> u64 {
        mix64(pairing2(self.0, self.1))
    }
}

impl MyHash for Lit {
    fn hash(&self) -> u64 {
        mix64(self.raw() as u64)
    }
}

impl MyHash for (Lit, Lit) {
    fn hash(&self) -> u64 {
        mix64(pairing2(self.0.raw() as u64, self.1.raw() as u64))
    }
}
