//! Permissible functions.
//!
//! The permissible function `G` of a gate is the set of input assignments
//! under which its value does not matter to any primary output. Every wire
//! carries a condition: the assignments under which that wire does not
//! matter to the gate it feeds.
//!
//! CSPF (compatible sets) computes conditions locally in one reverse sweep,
//! so they stay valid when several wires are removed at once. MSPF (maximum
//! sets) computes the exact observability of gates whose fanout cones
//! reconverge by complementing the gate and simulating the outputs, which
//! finds more redundancy but is invalidated by every change.

use log::debug;

use super::{PfState, Transduction};
use crate::engine::{Engine, Func};

impl<E: Engine> Transduction<E> {
    /// Conjunction of the fanins of `i` selected by `keep`.
    fn fanins_and(&self, i: usize, keep: impl Fn(usize) -> bool) -> Func<E> {
        let mut x = Func::one(&self.engine);
        for jj in (0..self.fanins[i].len()).filter(|&jj| keep(jj)) {
            x = x.and(&self.fanin_func(i, jj));
        }
        x
    }

    /// Removes fanins of `i` from position `start` on that are implied by the
    /// other fanins outside the permissible function. The fanin `block` is kept.
    pub(super) fn remove_redundant_fanins(&mut self, i: usize, block: Option<usize>, start: usize) -> usize {
        let mut count = 0;
        let mut j = start;
        while j < self.fanins[i].len() {
            if Some(self.fanins[i][j].node()) == block {
                j += 1;
                continue;
            }
            let x = self.fanins_and(i, |jj| jj != j);
            let x = x.not().or(&self.perm(i)).or(&self.fanin_func(i, j));
            if x.is_const1() {
                if self.verbosity >= 3 {
                    debug!("remove redundant wire {} -> {}", self.fanins[i][j], i);
                }
                self.disconnect(i, j, true, true);
                count += 1;
            } else {
                j += 1;
            }
        }
        count
    }

    /// `G` of `i` as the conjunction of the conditions on its fanout wires.
    pub(super) fn calc_g(&mut self, i: usize) {
        let mut g = Func::one(&self.engine);
        for &k in &self.fanouts[i] {
            let l = self
                .find_fanin(k, i)
                .unwrap_or_else(|| panic!("Gate {} is not a fanin of {}", i, k));
            g = g.and(&self.cond(k, l));
        }
        self.perms[i] = Some(g);
    }

    /// Compatible conditions of the fanin wires of `i`, each one taking only
    /// the fanins after it into account. Wires whose condition covers
    /// everything are removed. Returns the number of removed wires.
    pub(super) fn calc_c(&mut self, i: usize) -> usize {
        let mut count = 0;
        let mut j = 0;
        while j < self.fanins[i].len() {
            let x = self.fanins_and(i, |jj| jj > j);
            let x = x.not().or(&self.perm(i));
            let i0 = self.fanins[i][j].node();
            if x.or(&self.fanin_func(i, j)).is_const1() {
                if self.verbosity >= 3 {
                    debug!("remove wire {} -> {} by its condition", self.fanins[i][j], i);
                }
                self.disconnect(i, j, true, true);
                count += 1;
                continue;
            }
            if self.conds[i][j].as_ref() != Some(&x) {
                self.conds[i][j] = Some(x);
                self.pf_updates[i0] = true;
            }
            j += 1;
        }
        count
    }

    /// One CSPF sweep over the flagged gates, last to first.
    ///
    /// With `sort_remove`, fanins are sorted and redundant ones removed
    /// before conditions are computed. Gate `block` is neither sorted nor
    /// reduced, except that with `block_fanin` its other fanins may go.
    pub(super) fn cspf_with(&mut self, sort_remove: bool, block: Option<usize>, block_fanin: Option<usize>) -> isize {
        let before = self.wire_count() as isize;
        if self.state != PfState::Cspf {
            for &i in &self.objs {
                self.pf_updates[i] = true;
            }
        }
        self.state = PfState::Cspf;
        let mut idx = self.objs.len();
        while idx > 0 {
            idx -= 1;
            let i = self.objs[idx];
            if self.fanouts[i].is_empty() {
                self.remove(i, true);
                self.objs.remove(idx);
                continue;
            }
            if !self.pf_updates[i] {
                continue;
            }
            if self.verbosity >= 3 {
                debug!("cspf gate {}", i);
            }
            self.calc_g(i);
            if sort_remove {
                if block != Some(i) {
                    self.sort_fanins(i);
                    self.remove_redundant_fanins(i, None, 0);
                } else if block_fanin.is_some() {
                    self.remove_redundant_fanins(i, block_fanin, 0);
                }
            }
            self.calc_c(i);
            self.pf_updates[i] = false;
            match self.fanins[i].len() {
                0 => {
                    self.replace_by_const(i, true);
                    self.objs.remove(idx);
                    idx = self.objs.len();
                }
                1 => {
                    let f = self.fanins[i][0];
                    self.replace(i, f, true);
                    self.objs.remove(idx);
                }
                _ => {}
            }
        }
        self.build(false);
        if self.level_aware {
            self.compute_level();
        }
        let delta = self.wire_count() as isize - before;
        if self.verbosity >= 2 {
            debug!("cspf: {} wires", delta);
        }
        delta
    }

    /// Exact `G` of `i` from the outputs with `i` complemented. Returns whether it changed.
    pub(super) fn mspf_calc_g(&mut self, i: usize) -> bool {
        let compl = self.build_fo_cone_compl(i);
        let mut g = Func::one(&self.engine);
        for (j, &po) in self.pos.iter().enumerate() {
            let x = self.po_funcs[j].xor(&compl[j]).not().or(&self.cond(po, 0));
            g = g.and(&x);
        }
        let changed = self.perms[i].as_ref() != Some(&g);
        self.perms[i] = Some(g);
        changed
    }

    /// Maximum conditions of the fanin wires of `i`, each one against all
    /// other fanins. Stops at the first removable wire, then removes every
    /// other redundant one after it. Returns the number of removed wires.
    pub(super) fn mspf_calc_c(&mut self, i: usize, block: Option<usize>) -> usize {
        for j in 0..self.fanins[i].len() {
            let x = self.fanins_and(i, |jj| jj != j);
            let x = x.not().or(&self.perm(i));
            let i0 = self.fanins[i][j].node();
            if Some(i0) != block && x.or(&self.fanin_func(i, j)).is_const1() {
                if self.verbosity >= 3 {
                    debug!("remove wire {} -> {} by its condition", self.fanins[i][j], i);
                }
                self.disconnect(i, j, true, true);
                return self.remove_redundant_fanins(i, block, j) + 1;
            }
            if self.conds[i][j].as_ref() != Some(&x) {
                self.conds[i][j] = Some(x);
                self.pf_updates[i0] = true;
            }
        }
        0
    }

    /// MSPF sweep, last to first, restarting after every structural change.
    ///
    /// Gates whose fanout cone does not reconverge use the cheaper
    /// conjunction of their fanout conditions. `block` and `block_fanin`
    /// are as in [`Transduction::cspf_with`].
    pub(super) fn mspf_with(&mut self, sort: bool, block: Option<usize>, block_fanin: Option<usize>) -> isize {
        let before = self.wire_count() as isize;
        if self.state != PfState::Mspf {
            for &i in &self.objs {
                self.pf_updates[i] = true;
            }
        }
        self.state = PfState::Mspf;
        let mut restarts = 0usize;
        let mut idx = self.objs.len();
        while idx > 0 {
            idx -= 1;
            let i = self.objs[idx];
            if self.fanouts[i].is_empty() {
                self.remove(i, true);
                self.objs.remove(idx);
                continue;
            }
            let unshared = self.fanouts[i].len() == 1 || !self.is_fanout_cone_shared(i);
            if !self.fo_cone_shared[i] && !self.pf_updates[i] && unshared {
                continue;
            }
            if self.verbosity >= 3 {
                debug!("mspf gate {}", i);
            }
            if unshared {
                if self.fo_cone_shared[i] {
                    self.fo_cone_shared[i] = false;
                    let old = self.perms[i].clone();
                    self.calc_g(i);
                    if old == self.perms[i] && !self.pf_updates[i] {
                        continue;
                    }
                } else {
                    self.calc_g(i);
                }
            } else {
                self.fo_cone_shared[i] = true;
                if !self.mspf_calc_g(i) && !self.pf_updates[i] {
                    continue;
                }
                let f = self.func(i).clone();
                let g = self.perm(i);
                let value = if g.or(&f).is_const1() {
                    Some(true)
                } else if g.or(&f.not()).is_const1() {
                    Some(false)
                } else {
                    None
                };
                if let Some(value) = value {
                    self.replace_by_const(i, value);
                    self.objs.remove(idx);
                    self.build(true);
                    idx = self.objs.len();
                    restarts += 1;
                    continue;
                }
            }
            if sort && block != Some(i) {
                self.sort_fanins(i);
            }
            let removed = if block == Some(i) {
                self.mspf_calc_c(i, block_fanin)
            } else {
                self.mspf_calc_c(i, None)
            };
            if removed > 0 {
                match self.fanins[i].len() {
                    0 => {
                        self.replace_by_const(i, true);
                        self.objs.remove(idx);
                    }
                    1 => {
                        let f = self.fanins[i][0];
                        self.replace(i, f, true);
                        self.objs.remove(idx);
                    }
                    _ => {}
                }
                self.build(true);
                idx = self.objs.len();
                restarts += 1;
                continue;
            }
            self.pf_updates[i] = false;
        }
        if self.level_aware {
            self.compute_level();
        }
        let delta = self.wire_count() as isize - before;
        if self.verbosity >= 2 {
            debug!("mspf: {} wires, {} restarts", delta, restarts);
        }
        delta
    }
}
