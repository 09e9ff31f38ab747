//! Level and slack tracking.
//!
//! The level of a gate with more than two fanins is the level it would get
//! after balanced decomposition. It is computed with a binary counter over
//! fanin levels: adding a fanin of level `l` increments the counter at bit
//! `l`. The counter length minus one is the level when only the top bit is
//! set, the length otherwise.

use super::Transduction;
use crate::engine::Engine;

/// Increments the counter `a` at bit `i`.
pub(super) fn add(a: &mut Vec<bool>, i: usize) {
    if a.len() <= i {
        a.resize(i + 1, false);
        a[i] = true;
        return;
    }
    let mut i = i;
    while i < a.len() && a[i] {
        a[i] = false;
        i += 1;
    }
    if i == a.len() {
        a.push(false);
    }
    a[i] = true;
}

/// All bits below the top one are clear.
pub(super) fn balanced(a: &[bool]) -> bool {
    match a.split_last() {
        Some((_, rest)) => rest.iter().all(|&b| !b),
        None => true,
    }
}

/// Whether a fanin of level `i` still fits into the counter `a`.
pub(super) fn noexcess(a: &[bool], i: usize) -> bool {
    if a.len() <= i {
        return false;
    }
    if a[i..].iter().any(|&b| !b) {
        return true;
    }
    a[..i].iter().all(|&b| !b)
}

impl<E: Engine> Transduction<E> {
    pub(super) fn count_levels(&self) -> isize {
        self.pos
            .iter()
            .map(|&po| self.levels[self.fanins[po][0].node()])
            .max()
            .unwrap_or(0)
    }

    /// Recomputes levels forward, then slacks backward against the level budget.
    ///
    /// The budget is fixed the first time this runs.
    pub(super) fn compute_level(&mut self) {
        for idx in 0..self.objs.len() {
            let i = self.objs[idx];
            let fanins = &self.fanins[i];
            let level = if fanins.len() == 2 {
                self.levels[fanins[0].node()].max(self.levels[fanins[1].node()]) + 1
            } else {
                let mut lev = Vec::new();
                for f in fanins {
                    add(&mut lev, self.levels[f.node()] as usize);
                }
                if balanced(&lev) {
                    lev.len() as isize - 1
                } else {
                    lev.len() as isize
                }
            };
            self.levels[i] = level;
        }
        let max_levels = match self.max_levels {
            Some(l) => l,
            None => {
                let l = self.count_levels();
                self.max_levels = Some(l);
                l
            }
        };
        for &po in &self.pos {
            let slack = max_levels - self.levels[self.fanins[po][0].node()];
            self.fi_slacks[po] = vec![slack];
        }
        for idx in (0..self.objs.len()).rev() {
            let i = self.objs[idx];
            let mut slack = max_levels;
            for &k in &self.fanouts[i] {
                let l = self
                    .find_fanin(k, i)
                    .unwrap_or_else(|| panic!("Gate {} is not a fanin of {}", i, k));
                slack = slack.min(self.fi_slacks[k][l]);
            }
            self.slacks[i] = slack;
            let level = self.levels[i];
            let fi_slacks = self.fanins[i]
                .iter()
                .map(|f| slack + level - 1 - self.levels[f.node()])
                .collect();
            self.fi_slacks[i] = fi_slacks;
        }
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::aig::Aig;
    use crate::bdd::Bdd;
    use crate::config::Params;

    fn counter(levels: &[usize]) -> Vec<bool> {
        let mut a = Vec::new();
        for &l in levels {
            add(&mut a, l);
        }
        a
    }

    #[test]
    fn test_add_carries() {
        assert_eq!(counter(&[0]), vec![true]);
        assert_eq!(counter(&[0, 0]), vec![false, true]);
        assert_eq!(counter(&[0, 0, 0]), vec![true, true]);
        assert_eq!(counter(&[0, 0, 0, 0]), vec![false, false, true]);
        assert_eq!(counter(&[2, 0]), vec![true, false, true]);
        assert_eq!(counter(&[1, 1, 2]), vec![false, false, false, true]);
    }

    #[test]
    fn test_balanced_level() {
        // Four fanins of level 0 fit in a tree of depth 2.
        let a = counter(&[0, 0, 0, 0]);
        assert!(balanced(&a));
        assert_eq!(a.len() - 1, 2);
        // Three fanins of level 0 need depth 2 as well.
        let b = counter(&[0, 0, 0]);
        assert!(!balanced(&b));
        assert_eq!(b.len(), 2);
        assert!(balanced(&[]));
    }

    #[test]
    fn test_noexcess() {
        let a = vec![false, true, false];
        assert!(noexcess(&a, 0));
        assert!(noexcess(&a, 2));
        assert!(!noexcess(&a, 3));
        // Only a set bit below `i` counts as excess once bits from `i` up are all set.
        let full = vec![true, true];
        assert!(noexcess(&full, 0));
        assert!(!noexcess(&full, 1));
        let top = vec![false, true];
        assert!(noexcess(&top, 0));
        assert!(noexcess(&top, 1));
        assert!(!noexcess(&top, 2));
    }

    #[test]
    fn test_levels_and_slacks() {
        // g1 = a & b (level 1), g2 = g1 & c (level 2), g3 = a & c (level 1)
        let mut aig = Aig::new(3);
        let (a, b, c) = (aig.input(0), aig.input(1), aig.input(2));
        let g1 = aig.add_and(a, b);
        let g2 = aig.add_and(g1, c);
        let g3 = aig.add_and(a, c);
        aig.add_output(g2);
        aig.add_output(g3);
        let params = Params::default().with_level_aware(true);
        let t = Transduction::<Bdd>::new(&aig, None, &params).unwrap();
        let (g1, g2, g3) = (4, 5, 6);
        assert_eq!(t.levels[g1], 1);
        assert_eq!(t.levels[g2], 2);
        assert_eq!(t.levels[g3], 1);
        assert_eq!(t.count_levels(), 2);
        assert_eq!(t.slacks[g2], 0);
        assert_eq!(t.slacks[g1], 0);
        assert_eq!(t.slacks[g3], 1);
        assert_eq!(t.fi_slacks[g2], vec![0, 1]);
    }
}
