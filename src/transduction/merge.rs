//! Merging gates into their single fanout and splitting wide gates.

use std::collections::{BTreeSet, VecDeque};

use log::debug;

use super::{PfState, Transduction};
use crate::engine::{Engine, Func};
use crate::signal::Signal;

impl<E: Engine> Transduction<E> {
    /// Absorbs into `i` every non-negated fanin gate whose only fanout is `i`, repeatedly.
    ///
    /// Absorbed wires keep their conditions. A wire that would duplicate an
    /// existing fanin of `i` is dropped and `i` is flagged instead.
    pub(super) fn trivial_merge_one(&mut self, i: usize) {
        if self.verbosity >= 3 {
            debug!("merge into gate {}", i);
        }
        let fanins = std::mem::take(&mut self.fanins[i]);
        let conds = std::mem::take(&mut self.conds[i]);
        let mut queue: VecDeque<(Signal, Option<Func<E>>)> = fanins.into_iter().zip(conds).collect();
        while let Some((f, c)) = queue.pop_front() {
            let i0 = f.node();
            if self.fanins[i0].is_empty() || self.fanouts[i0].len() > 1 || f.is_negated() {
                self.fanins[i].push(f);
                self.conds[i].push(c);
                continue;
            }
            self.pf_updates[i] |= self.pf_updates[i0];
            self.fanouts[i0].clear();
            let inner: Vec<(Signal, Option<Func<E>>)> = self.fanins[i0]
                .iter()
                .copied()
                .zip(self.conds[i0].iter().cloned())
                .collect();
            for (g, gc) in inner.into_iter().rev() {
                if self.fanins[i].contains(&g) || queue.iter().any(|(x, _)| *x == g) {
                    self.pf_updates[i] = true;
                    continue;
                }
                self.fanouts[g.node()].push(i);
                queue.push_front((g, gc));
            }
            self.remove(i0, false);
            if let Some(p) = self.objs.iter().position(|&x| x == i0) {
                self.objs.remove(p);
            }
        }
    }

    /// Merges every gate into its fanouts where possible.
    pub fn trivial_merge(&mut self) -> isize {
        let delta = self.measured(|t| {
            let targets = t.objs.clone();
            for &i in targets.iter().rev() {
                if t.fanins[i].is_empty() {
                    continue;
                }
                t.trivial_merge_one(i);
            }
            if t.level_aware {
                t.compute_level();
            }
        });
        if self.verbosity >= 1 {
            self.log_stats("Merge");
        }
        delta
    }

    /// Splits the gate at `objs[idx]` into a chain of two-input gates placed
    /// in front of it. Returns the new position of the gate.
    ///
    /// When the gate's permissible function is current, the new gates get one as well.
    pub(super) fn trivial_decompose_one(&mut self, mut idx: usize, pos: &mut usize) -> usize {
        let i = self.objs[idx];
        if self.verbosity >= 3 {
            debug!("decompose gate {}", i);
        }
        while self.fanins[i].len() > 2 {
            let (f0, c0) = self.pop_fanin(i);
            let (f1, c1) = self.pop_fanin(i);
            self.new_gate(pos);
            let p = *pos;
            self.connect(p, f1, false, false, c1);
            self.connect(p, f0, false, false, c0);
            if !self.pf_updates[i] {
                match self.state {
                    PfState::Cspf => self.perms[p] = self.perms[i].clone(),
                    PfState::Mspf => {
                        let mut x = Func::one(&self.engine);
                        for j in 0..self.fanins[i].len() {
                            x = x.and(&self.fanin_func(i, j));
                        }
                        self.perms[p] = Some(x.not().or(&self.perm(i)));
                    }
                    PfState::None => {}
                }
            }
            let c = self.perms[p].clone();
            self.connect(i, Signal::from_node(p), false, false, c);
            self.objs.insert(idx, p);
            idx += 1;
            self.build_one(p);
        }
        idx
    }

    /// Disconnects the last fanin of `i`, returning it with its condition.
    fn pop_fanin(&mut self, i: usize) -> (Signal, Option<Func<E>>) {
        let j = self.fanins[i].len() - 1;
        let f = self.fanins[i][j];
        let c = self.conds[i][j].take();
        self.disconnect(i, j, false, false);
        (f, c)
    }

    /// Splits the gate at `objs[idx]` into a tree of two-input gates pairing
    /// the shallowest fanins first. Returns the new position of the gate.
    pub(super) fn balanced_decompose_one(&mut self, mut idx: usize, pos: &mut usize) -> usize {
        let i = self.objs[idx];
        if self.verbosity >= 3 {
            debug!("balanced decompose gate {}", i);
        }
        for p in 1..self.fanins[i].len() {
            let level = self.levels[self.fanins[i][p].node()];
            let mut q = p;
            while q > 0 && level > self.levels[self.fanins[i][q - 1].node()] {
                q -= 1;
            }
            self.fanins[i][q..=p].rotate_right(1);
            self.conds[i][q..=p].rotate_right(1);
        }
        while self.fanins[i].len() > 2 {
            let (f0, c0) = self.pop_fanin(i);
            let (f1, c1) = self.pop_fanin(i);
            self.new_gate(pos);
            let p = *pos;
            self.connect(p, f1, false, false, c1);
            self.connect(p, f0, false, false, c0);
            self.connect(i, Signal::from_node(p), false, false, None);
            self.build_one(p);
            self.levels[p] = self.levels[f0.node()].max(self.levels[f1.node()]) + 1;
            self.objs.insert(idx, p);
            idx += 1;
            let last = self.fanins[i].len() - 1;
            let mut q = last;
            while q > 0 && self.levels[p] > self.levels[self.fanins[i][q - 1].node()] {
                q -= 1;
            }
            self.fanins[i][q..=last].rotate_right(1);
            self.conds[i][q..=last].rotate_right(1);
        }
        self.pf_updates[i] = true;
        idx
    }

    /// Splits every gate with more than two fanins into a chain.
    pub fn trivial_decompose(&mut self) -> isize {
        let delta = self.measured(|t| {
            let mut pos = t.pis.len() + 1;
            let mut idx = 0;
            while idx < t.objs.len() {
                if t.fanins[t.objs[idx]].len() > 2 {
                    idx = t.trivial_decompose_one(idx, &mut pos);
                }
                idx += 1;
            }
            if t.level_aware {
                t.compute_level();
            }
        });
        if self.verbosity >= 1 {
            self.log_stats("Decompose");
        }
        delta
    }

    /// Extracts fanin sets shared between gates into common gates, then splits
    /// what remains into two-input chains.
    ///
    /// Gates with identical fanins are merged. A gate whose fanins contain
    /// another gate's fanins reuses that gate. Two gates sharing at least two
    /// fanins get a new gate for the shared part.
    pub fn decompose(&mut self) -> isize {
        let delta = self.measured(|t| {
            let mut pos = t.pis.len() + 1;
            let mut a = 0;
            while a < t.objs.len() {
                let mut s1: BTreeSet<Signal> = t.fanins[t.objs[a]].iter().copied().collect();
                let mut b = a + 1;
                while b < t.objs.len() {
                    let i = t.objs[a];
                    let i2 = t.objs[b];
                    let s2: BTreeSet<Signal> = t.fanins[i2].iter().copied().collect();
                    let s: BTreeSet<Signal> = s1.intersection(&s2).copied().collect();
                    if s.len() <= 1 {
                        b += 1;
                        continue;
                    }
                    if s == s1 {
                        if s == s2 {
                            if t.verbosity >= 3 {
                                debug!("replace gate {} by gate {}", i2, i);
                            }
                            t.replace(i2, Signal::from_node(i), false);
                            t.objs.remove(b);
                        } else {
                            if t.verbosity >= 3 {
                                debug!("decompose gate {} by gate {}", i2, i);
                            }
                            for f in &s {
                                let j = t.fanins[i2]
                                    .iter()
                                    .position(|x| x == f)
                                    .unwrap_or_else(|| panic!("Wire {} -> {} is missing", f, i2));
                                t.disconnect(i2, j, false, true);
                            }
                            let fi = Signal::from_node(i);
                            if !t.fanins[i2].contains(&fi) {
                                t.connect(i2, fi, false, false, None);
                            }
                            t.pf_updates[i2] = true;
                            b += 1;
                        }
                        continue;
                    }
                    if s == s2 {
                        t.objs.remove(b);
                        t.objs.insert(a, i2);
                    } else {
                        t.new_gate(&mut pos);
                        let p = pos;
                        if t.verbosity >= 3 {
                            debug!("decompose gates {} and {} by new gate {}", i, i2, p);
                        }
                        for &f in &s {
                            t.connect(p, f, false, false, None);
                        }
                        t.objs.insert(a, p);
                        t.build_one(p);
                        t.pf_updates[p] = true;
                    }
                    s1 = s;
                    b = a + 1;
                }
                if t.fanins[t.objs[a]].len() > 2 {
                    a = t.trivial_decompose_one(a, &mut pos);
                }
                a += 1;
            }
            if t.level_aware {
                t.compute_level();
            }
        });
        if self.verbosity >= 1 {
            self.log_stats("Decompose");
        }
        delta
    }
}
