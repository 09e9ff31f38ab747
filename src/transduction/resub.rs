//! Resubstitution and the repeated optimization schedules built on it.
//!
//! Resubstitution adds wires into a gate that do not change its function
//! outside of its permissible function, then lets a CSPF or MSPF pass remove
//! whatever became redundant. Changes that do not pay off are rolled back.

use log::debug;

use super::level::{add, noexcess};
use super::{Snapshot, Transduction};
use crate::engine::Engine;
use crate::signal::Signal;

impl<E: Engine> Transduction<E> {
    fn pf_pass(&mut self, mspf: bool) -> isize {
        if mspf {
            self.mspf()
        } else {
            self.cspf()
        }
    }

    /// Reduces gate `i` after new fanins were wired into it, keeping the
    /// wire from `block_fanin`. Returns the change of the wire count.
    fn reduce_connected(&mut self, i: usize, block_fanin: Option<usize>, mspf: bool) -> isize {
        if mspf {
            self.build(true);
            self.mspf_with(true, Some(i), block_fanin)
        } else {
            self.pf_updates[i] = true;
            self.cspf_with(true, Some(i), block_fanin)
        }
    }

    /// Lets the rest of the network react to the reduction of `i`.
    fn refresh_after(&mut self, i: usize, mspf: bool) {
        if !self.fanouts[i].is_empty() {
            self.pf_updates[i] = true;
            self.pf_pass(mspf);
        }
    }

    /// Wires `i0`, complemented if `c0`, into `i` if it is not there yet and
    /// cannot change `i` outside of its permissible function.
    pub(super) fn try_connect(&mut self, i: usize, i0: usize, c0: bool) -> bool {
        let f = Signal::from_node(i0).not_cond(c0);
        if self.fanins[i].contains(&f) {
            return false;
        }
        let x = self.func(i).not().or(&self.perm(i));
        if x.or(&self.signal_func(f)).is_const1() {
            self.connect(i, f, true, true, None);
            return true;
        }
        false
    }

    fn try_connect_either(&mut self, i: usize, i0: usize) -> bool {
        self.try_connect(i, i0, false) || self.try_connect(i, i0, true)
    }

    /// Splits gate `i` after resubstitution, balanced when levels are tracked.
    fn decompose_after_resub(&mut self, i: usize, mspf: bool) {
        let idx = self
            .objs
            .iter()
            .position(|&x| x == i)
            .unwrap_or_else(|| panic!("Gate {} is not in the network", i));
        let mut pos = self.fanins.len();
        if self.level_aware {
            self.balanced_decompose_one(idx, &mut pos);
            self.pf_pass(mspf);
        } else {
            self.trivial_decompose_one(idx, &mut pos);
        }
    }

    /// Resubstitution with every candidate gate at once.
    ///
    /// For each gate, last to first: merge it with its single-fanout fanins,
    /// wire in every gate outside its fanout cone that fits, reduce, and roll
    /// back if the node count grew.
    pub fn resub(&mut self, mspf: bool) -> isize {
        let before = self.wire_count() as isize;
        self.pf_pass(mspf);
        let mut nodes = self.node_count();
        let mut backup = self.snapshot();
        let targets = self.objs.clone();
        for (n, &i) in targets.iter().rev().enumerate() {
            if self.verbosity >= 2 {
                debug!("resub gate {} ({}/{})", i, n + 1, targets.len());
            }
            if self.fanouts[i].is_empty() {
                continue;
            }
            self.trivial_merge_one(i);
            let mut lev = Vec::new();
            let budget = (self.levels[i] + self.slacks[i]).max(0) as usize;
            if self.level_aware {
                for f in &self.fanins[i] {
                    add(&mut lev, self.levels[f.node()] as usize);
                }
                if lev.len() > budget {
                    self.restore(&backup);
                    continue;
                }
                lev.resize(budget, false);
            }
            let mut connected = false;
            let marks = self.fanout_cone(i);
            let candidates = self.objs.clone();
            for &i2 in &candidates {
                if self.level_aware && lev.len() > budget {
                    break;
                }
                if marks[i2] || self.fanouts[i2].is_empty() {
                    continue;
                }
                if self.level_aware && !noexcess(&lev, self.levels[i2] as usize) {
                    continue;
                }
                if self.try_connect_either(i, i2) {
                    connected = true;
                    if self.level_aware {
                        add(&mut lev, self.levels[i2] as usize);
                    }
                }
            }
            if connected {
                self.reduce_connected(i, None, mspf);
                self.refresh_after(i, mspf);
            }
            if nodes < self.node_count() {
                if self.verbosity >= 3 {
                    debug!("roll back gate {}", i);
                }
                self.restore(&backup);
                continue;
            }
            if !self.fanouts[i].is_empty() && self.fanins[i].len() > 2 {
                self.decompose_after_resub(i, mspf);
            }
            nodes = self.node_count();
            backup = self.snapshot();
        }
        if self.verbosity >= 1 {
            self.log_stats("Resub");
        }
        self.wire_count() as isize - before
    }

    /// Connects `i0` into `i` and keeps the result only if the reduction
    /// pass removes something without exceeding the level budget.
    fn resub_mono_one(&mut self, i: usize, i0: usize, mspf: bool, backup: &mut Snapshot<E>) {
        if !self.try_connect_either(i, i0) {
            return;
        }
        if self.reduce_connected(i, Some(i0), mspf) == 0 {
            self.restore(backup);
            return;
        }
        self.refresh_after(i, mspf);
        if self.level_aware && self.count_levels() > self.max_levels.unwrap_or(isize::MAX) {
            self.restore(backup);
        } else {
            *backup = self.snapshot();
        }
    }

    /// Resubstitution trying one candidate at a time: primary inputs first,
    /// then gates outside the fanout cone.
    pub fn resub_mono(&mut self, mspf: bool) -> isize {
        let before = self.wire_count() as isize;
        self.pf_pass(mspf);
        let targets = self.objs.clone();
        for (n, &i) in targets.iter().rev().enumerate() {
            if self.verbosity >= 2 {
                debug!("resub mono gate {} ({}/{})", i, n + 1, targets.len());
            }
            if self.fanouts[i].is_empty() {
                continue;
            }
            self.trivial_merge_one(i);
            let mut backup = self.snapshot();
            for k in 0..self.pis.len() {
                if self.fanouts[i].is_empty() {
                    break;
                }
                let pi = self.pis[k];
                self.resub_mono_one(i, pi, mspf, &mut backup);
            }
            if self.fanouts[i].is_empty() {
                continue;
            }
            let marks = self.fanout_cone(i);
            let candidates = self.objs.clone();
            for &i2 in &candidates {
                if self.fanouts[i].is_empty() {
                    break;
                }
                if !marks[i2] && !self.fanouts[i2].is_empty() {
                    self.resub_mono_one(i, i2, mspf, &mut backup);
                }
            }
            if !self.fanouts[i].is_empty() && self.fanins[i].len() > 2 {
                self.decompose_after_resub(i, mspf);
            }
        }
        if self.verbosity >= 1 {
            self.log_stats("ResubMono");
        }
        self.wire_count() as isize - before
    }

    /// Resubstitution that wires in every fitting candidate without
    /// rollback, then extracts shared fanin sets with [`Transduction::decompose`].
    pub fn resub_shared(&mut self, mspf: bool) -> isize {
        let before = self.wire_count() as isize;
        self.pf_pass(mspf);
        let targets = self.objs.clone();
        for (n, &i) in targets.iter().rev().enumerate() {
            if self.verbosity >= 2 {
                debug!("resub shared gate {} ({}/{})", i, n + 1, targets.len());
            }
            if self.fanouts[i].is_empty() {
                continue;
            }
            self.trivial_merge_one(i);
            let mut connected = false;
            for k in 0..self.pis.len() {
                let pi = self.pis[k];
                connected |= self.try_connect_either(i, pi);
            }
            let marks = self.fanout_cone(i);
            for &i2 in &targets {
                if !marks[i2] && !self.fanouts[i2].is_empty() {
                    connected |= self.try_connect_either(i, i2);
                }
            }
            if connected {
                self.reduce_connected(i, None, mspf);
                self.refresh_after(i, mspf);
            }
        }
        self.decompose();
        if self.verbosity >= 1 {
            self.log_stats("ResubShared");
        }
        self.wire_count() as isize - before
    }

    /// Repeats [`Transduction::resub_mono`] or [`Transduction::resub`] until nothing changes.
    pub fn repeat_resub(&mut self, mono: bool, mspf: bool) -> isize {
        self.measured(|t| loop {
            let diff = if mono { t.resub_mono(mspf) } else { t.resub(mspf) };
            if diff == 0 {
                break;
            }
        })
    }

    /// Alternates both resubstitution flavors, once unless `inner` asks for a fixpoint.
    pub fn repeat_inner(&mut self, mspf: bool, inner: bool) -> isize {
        self.measured(|t| loop {
            let diff = t.repeat_resub(true, mspf) + t.repeat_resub(false, mspf);
            if diff == 0 || !inner {
                break;
            }
        })
    }

    /// Runs [`Transduction::repeat_inner`] with CSPF, followed by MSPF when
    /// `mspf` is set, once unless `outer` asks for a fixpoint.
    pub fn repeat_outer(&mut self, mspf: bool, inner: bool, outer: bool) -> isize {
        self.measured(|t| loop {
            let diff = if mspf {
                t.repeat_inner(false, inner) + t.repeat_inner(true, inner)
            } else {
                t.repeat_inner(false, inner)
            };
            if diff == 0 || !outer {
                break;
            }
        })
    }

    /// Interleaves shared resubstitution with [`Transduction::repeat_outer`]
    /// while the wire count keeps dropping, and ends on the best network seen.
    pub fn repeat_all(&mut self, first_merge: bool, mspf_merge: bool, mspf_resub: bool, inner: bool, outer: bool) -> isize {
        let before = self.wire_count() as isize;
        let mut backup = self.snapshot();
        let mut diff = 0;
        if first_merge {
            diff = self.resub_shared(mspf_merge);
        }
        diff += self.repeat_outer(mspf_resub, inner, outer);
        if diff < 0 {
            backup = self.snapshot();
            diff = 0;
        }
        loop {
            diff += self.resub_shared(mspf_merge) + self.repeat_outer(mspf_resub, inner, outer);
            if diff < 0 {
                backup = self.snapshot();
                diff = 0;
            } else {
                self.restore(&backup);
                break;
            }
        }
        if self.verbosity >= 1 {
            self.log_stats("RepeatAll");
        }
        self.wire_count() as isize - before
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::aig::Aig;
    use crate::bdd::Bdd;
    use crate::config::Params;
    use crate::transduction::tests::{assert_equivalent, redundant_chain, shared_pair};
    use crate::truth_table::TruthTable;

    /// `y = a & b` whose value only matters when `c` holds.
    fn guarded_and() -> (Aig, Aig) {
        let mut aig = Aig::new(3);
        let (a, b) = (aig.input(0), aig.input(1));
        let y = aig.add_and(a, b);
        aig.add_output(y);
        let mut dc = Aig::new(3);
        let c = dc.input(2);
        dc.add_output(!c);
        (aig, dc)
    }

    #[test]
    fn test_resub_mono_rolls_back_useless_wire() {
        let (aig, dc) = guarded_and();
        let mut t = Transduction::<Bdd>::new(&aig, Some(&dc), &Params::default()).unwrap();
        t.cspf();
        let before = t.snapshot();
        let mut backup = t.snapshot();
        // `c` fits into the gate thanks to the don't-care, but removes nothing.
        t.resub_mono_one(4, 3, false, &mut backup);
        assert!(t.snapshot() == before);
        assert_eq!(t.fanins[4].len(), 2);
        assert!(!t.fanins[4].iter().any(|f| f.node() == 3));
    }

    #[test]
    fn test_resub_keeps_guarded_gate() {
        let (aig, dc) = guarded_and();
        for mspf in [false, true] {
            let mut t = Transduction::<Bdd>::new(&aig, Some(&dc), &Params::default()).unwrap();
            t.cspf();
            let fanins = t.fanins[4].clone();
            assert_eq!(t.resub(mspf), 0);
            assert_eq!(t.fanins[4], fanins);
            assert_eq!(t.resub_mono(mspf), 0);
            assert_eq!(t.fanins[4], fanins);
            assert_eq!(t.gate_count(), 1);
            assert!(t.verify());
        }
    }

    #[test]
    fn test_try_connect() {
        let aig = shared_pair();
        let mut t = Transduction::<Bdd>::new(&aig, None, &Params::default()).unwrap();
        t.cspf();
        // g3 = (a & c) & b is implied by g1 = a & b.
        assert!(t.try_connect(6, 4, false));
        assert!(t.fanins[6].contains(&Signal::from_node(4)));
        assert!(!t.try_connect(6, 4, false));
        // !g1 would change g3.
        assert!(!t.try_connect(6, 4, true));
        t.build(false);
        assert!(t.verify());
    }

    #[test]
    fn test_resub_shares_gate() {
        let aig = shared_pair();
        let mut t = Transduction::<Bdd>::new(&aig, None, &Params::default()).unwrap();
        let delta = t.resub(false);
        assert_eq!(delta, -2);
        assert_eq!(t.gate_count(), 2);
        assert_eq!(t.wire_count(), 4);
        assert!(t.fanins[6].contains(&Signal::from_node(4)));
        assert!(t.verify());
        assert_equivalent(&t.to_aig(), &aig);
    }

    #[test]
    fn test_resub_mono_shares_gate() {
        let aig = shared_pair();
        let mut t = Transduction::<TruthTable>::new(&aig, None, &Params::default()).unwrap();
        let delta = t.resub_mono(false);
        assert_eq!(delta, -2);
        assert_eq!(t.node_count(), 2);
        assert!(t.verify());
        assert_equivalent(&t.to_aig(), &aig);
    }

    #[test]
    fn test_resub_mspf() {
        let aig = shared_pair();
        let mut t = Transduction::<Bdd>::new(&aig, None, &Params::default()).unwrap();
        let nodes = t.node_count();
        t.resub(true);
        assert!(t.node_count() <= nodes);
        assert_eq!(t.state(), crate::transduction::PfState::Mspf);
        assert!(t.verify());
        assert_equivalent(&t.to_aig(), &aig);
    }

    #[test]
    fn test_resub_shared_keeps_function() {
        for mspf in [false, true] {
            let aig = shared_pair();
            let mut t = Transduction::<Bdd>::new(&aig, None, &Params::default()).unwrap();
            t.resub_shared(mspf);
            assert!(t.node_count() <= 3);
            assert!(t.objs.iter().all(|&i| t.fanins[i].len() == 2));
            assert!(t.verify());
            assert_equivalent(&t.to_aig(), &aig);
        }
    }

    #[test]
    fn test_resub_level_aware_keeps_budget() {
        let aig = shared_pair();
        let params = Params::default().with_level_aware(true);
        let mut t = Transduction::<Bdd>::new(&aig, None, &params).unwrap();
        let budget = t.level_budget().unwrap();
        t.resub(false);
        assert!(t.max_level().unwrap() <= budget);
        t.resub_mono(true);
        assert!(t.max_level().unwrap() <= budget);
        assert!(t.verify());
        assert_equivalent(&t.to_aig(), &aig);
    }

    #[test]
    fn test_repeat_resub_reaches_fixpoint() {
        let aig = shared_pair();
        let mut t = Transduction::<Bdd>::new(&aig, None, &Params::default()).unwrap();
        assert_eq!(t.repeat_resub(false, false), -2);
        assert_eq!(t.resub(false), 0);
    }

    #[test]
    fn test_repeat_all_never_worse() {
        let mut aig = Aig::new(4);
        let xs: Vec<Signal> = (0..4).map(|k| aig.input(k)).collect();
        let g1 = aig.add_and(xs[0], xs[1]);
        let g2 = aig.add_and(xs[2], g1);
        let g3 = aig.add_and(xs[0], xs[2]);
        let g4 = aig.add_and(g3, !xs[3]);
        let g5 = aig.add_and(!g2, !g4);
        let g6 = aig.add_and(g3, xs[1]);
        aig.add_output(!g5);
        aig.add_output(g6);
        let mut t = Transduction::<Bdd>::new(&aig, None, &Params::default()).unwrap();
        let wires = t.wire_count() as isize;
        let delta = t.repeat_all(true, true, true, true, true);
        assert!(delta <= 0);
        assert_eq!(t.wire_count() as isize, wires + delta);
        assert!(t.verify());
        assert_equivalent(&t.to_aig(), &aig);
    }

    #[test]
    fn test_repeat_schedules_on_chain() {
        let aig = redundant_chain();
        let mut t = Transduction::<TruthTable>::new(&aig, None, &Params::default()).unwrap();
        assert_eq!(t.repeat_outer(true, true, true), -2);
        assert_eq!(t.repeat_inner(false, false), 0);
        assert_equivalent(&t.to_aig(), &aig);
    }
}
