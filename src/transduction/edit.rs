//! Structural edits of the gate network.
//!
//! None of these rebuild functions; they only flag the affected objects in
//! `updates` (function must be rebuilt) and `pf_updates` (permissible
//! function must be recomputed).

use log::debug;

use super::Transduction;
use crate::engine::{Engine, Func};
use crate::signal::Signal;

fn remove_first(v: &mut Vec<usize>, x: usize) {
    let k = v.iter().position(|&y| y == x).unwrap_or_else(|| panic!("{} is not in {:?}", x, v));
    v.remove(k);
}

impl<E: Engine> Transduction<E> {
    /// Adds the wire `f -> i` with condition `c`.
    ///
    /// With `sort`, the fanin gate is moved in front of `i` in the
    /// topological order if needed, together with its own fanin cone.
    pub(super) fn connect(&mut self, i: usize, f: Signal, sort: bool, update: bool, c: Option<Func<E>>) {
        let i0 = f.node();
        if self.verbosity >= 4 {
            debug!("add wire {} -> {}", f, i);
        }
        assert!(!self.fanins[i].contains(&f), "Wire {} -> {} already exists", f, i);
        self.fanins[i].push(f);
        self.fanouts[i0].push(i);
        if update {
            self.updates[i] = true;
        }
        self.conds[i].push(c);
        if sort && !self.fanouts[i].is_empty() && !self.fanins[i0].is_empty() {
            let Some(p) = self.objs.iter().position(|&x| x == i) else {
                return;
            };
            if let Some(off) = self.objs[p..].iter().position(|&x| x == i0) {
                self.objs.remove(p + off);
                self.objs.insert(p, i0);
                self.sort_objs_rec(p);
            }
        }
    }

    /// Moves fanin gates found after position `p` in front of it, recursively.
    /// Returns the new position of the object that was at `p`.
    fn sort_objs_rec(&mut self, mut p: usize) -> usize {
        let i = self.objs[p];
        for j in 0..self.fanins[i].len() {
            let i0 = self.fanins[i][j].node();
            if self.fanins[i0].is_empty() {
                continue;
            }
            if let Some(off) = self.objs[p..].iter().position(|&x| x == i0) {
                self.objs.remove(p + off);
                self.objs.insert(p, i0);
                p = self.sort_objs_rec(p) + 1;
            }
        }
        p
    }

    /// Removes the `j`-th fanin wire of `i`.
    pub(super) fn disconnect(&mut self, i: usize, j: usize, update: bool, pf_update: bool) {
        let f = self.fanins[i][j];
        let i0 = f.node();
        if self.verbosity >= 4 {
            debug!("remove wire {} -> {}", f, i);
        }
        remove_first(&mut self.fanouts[i0], i);
        self.fanins[i].remove(j);
        self.conds[i].remove(j);
        if update {
            self.updates[i] = true;
        }
        if pf_update {
            self.pf_updates[i0] = true;
        }
    }

    /// Detaches gate `i` from its fanins and drops its functions.
    /// Returns the number of removed wires.
    ///
    /// The gate must not have fanouts. It stays in `objs`; callers erase it.
    pub(super) fn remove(&mut self, i: usize, pf_update: bool) -> usize {
        assert!(self.fanouts[i].is_empty(), "Removing gate {} which still has fanouts", i);
        if self.verbosity >= 4 {
            debug!("remove gate {}", i);
        }
        let fanins = std::mem::take(&mut self.fanins[i]);
        for f in &fanins {
            remove_first(&mut self.fanouts[f.node()], i);
            if pf_update {
                self.pf_updates[f.node()] = true;
            }
        }
        self.funcs[i] = None;
        self.perms[i] = None;
        self.conds[i].clear();
        self.updates[i] = false;
        self.pf_updates[i] = false;
        self.fo_cone_shared[i] = false;
        fanins.len()
    }

    pub(super) fn find_fanin(&self, i: usize, i0: usize) -> Option<usize> {
        self.fanins[i].iter().position(|f| f.node() == i0)
    }

    /// Redirects every fanout of gate `i` to `f` and removes `i`.
    ///
    /// A fanout that already has `f` with the matching polarity just loses the wire.
    pub(super) fn replace(&mut self, i: usize, f: Signal, update: bool) {
        if self.verbosity >= 4 {
            debug!("replace gate {} by {}", i, f);
        }
        assert_ne!(i, f.node(), "Replacing gate {} by itself", i);
        let fanouts = std::mem::take(&mut self.fanouts[i]);
        for &k in &fanouts {
            let l = self
                .find_fanin(k, i)
                .unwrap_or_else(|| panic!("Gate {} is not a fanin of {}", i, k));
            let fc = f.not_cond(self.fanins[k][l].is_negated());
            if self.fanins[k].contains(&fc) {
                self.fanins[k].remove(l);
                self.conds[k].remove(l);
            } else {
                self.fanins[k][l] = fc;
                self.fanouts[f.node()].push(k);
            }
            if update {
                self.updates[k] = true;
            }
        }
        self.pf_updates[f.node()] = true;
        self.remove(i, true);
    }

    /// Replaces gate `i` by the constant `c`, propagating into its fanouts.
    ///
    /// Gates that collapse on the way are detached but stay in `objs`
    /// with no fanins and no fanouts until the next sweep drops them.
    pub(super) fn replace_by_const(&mut self, i: usize, c: bool) {
        if self.verbosity >= 4 {
            debug!("replace gate {} by const {}", i, c as u8);
        }
        let fanouts = self.fanouts[i].clone();
        for k in fanouts {
            let Some(l) = self.find_fanin(k, i) else {
                continue;
            };
            let fc = c ^ self.fanins[k][l].is_negated();
            if self.pos.contains(&k) {
                let cond = self.conds[k][l].take();
                self.disconnect(k, l, false, false);
                self.connect(k, Signal::from(fc), false, false, cond);
                continue;
            }
            self.disconnect(k, l, true, false);
            if fc {
                match self.fanins[k].len() {
                    0 => self.replace_by_const(k, true),
                    1 => {
                        let f = self.fanins[k][0];
                        self.replace(k, f, true);
                    }
                    _ => {}
                }
            } else {
                self.replace_by_const(k, false);
            }
        }
        self.remove(i, true);
    }

    /// Finds an unused object slot at or after `pos`, allocating one if needed.
    pub(super) fn new_gate(&mut self, pos: &mut usize) {
        while *pos < self.fanins.len() && (!self.fanins[*pos].is_empty() || !self.fanouts[*pos].is_empty()) {
            *pos += 1;
        }
        if *pos == self.fanins.len() {
            self.alloc_object();
        }
        if self.verbosity >= 4 {
            debug!("create gate {}", *pos);
        }
    }

    /// Marks every object reachable from `i` through fanouts, `i` included.
    pub(super) fn fanout_cone(&self, i: usize) -> Vec<bool> {
        let mut marks = vec![false; self.fanins.len()];
        let mut stack = vec![i];
        while let Some(x) = stack.pop() {
            if marks[x] {
                continue;
            }
            marks[x] = true;
            stack.extend(self.fanouts[x].iter().copied().filter(|&k| !marks[k]));
        }
        marks
    }

    fn is_fanout_cone_shared_rec(&self, visits: &mut [usize], i: usize, visitor: usize) -> bool {
        if visits[i] == visitor {
            return false;
        }
        if visits[i] != 0 {
            return true;
        }
        visits[i] = visitor;
        self.fanouts[i]
            .iter()
            .any(|&k| self.is_fanout_cone_shared_rec(visits, k, visitor))
    }

    /// Whether the cones of two different fanouts of `i` reconverge.
    pub(super) fn is_fanout_cone_shared(&self, i: usize) -> bool {
        let mut visits = vec![0; self.fanins.len()];
        self.fanouts[i]
            .iter()
            .enumerate()
            .any(|(j, &k)| self.is_fanout_cone_shared_rec(&mut visits, k, j + 1))
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::aig::Aig;
    use crate::bdd::Bdd;
    use crate::config::Params;
    use crate::transduction::tests::{assert_equivalent, shared_pair};

    fn chain3() -> Aig {
        // g1 = a & b, g2 = g1 & c, outputs g2 and !g1
        let mut aig = Aig::new(3);
        let (a, b, c) = (aig.input(0), aig.input(1), aig.input(2));
        let g1 = aig.add_and(a, b);
        let g2 = aig.add_and(g1, c);
        aig.add_output(g2);
        aig.add_output(!g1);
        aig
    }

    #[test]
    fn test_connect_disconnect_bookkeeping() {
        let aig = chain3();
        let mut t = Transduction::<Bdd>::new(&aig, None, &Params::default()).unwrap();
        let (g1, g2) = (4, 5);
        assert_eq!(t.fanouts[g1].len(), 2);
        t.connect(g2, Signal::from_node(1), false, true, None);
        assert!(t.updates[g2]);
        assert_eq!(t.fanins[g2].len(), 3);
        assert_eq!(t.conds[g2].len(), 3);
        assert!(t.fanouts[1].contains(&g2));
        t.disconnect(g2, 2, true, true);
        assert!(t.pf_updates[1]);
        assert!(!t.fanouts[1].contains(&g2));
        assert_eq!(t.fanins[g2].len(), 2);
        t.build(false);
        assert!(t.verify());
    }

    #[test]
    #[should_panic(expected = "already exists")]
    fn test_connect_duplicate_panics() {
        let aig = chain3();
        let mut t = Transduction::<Bdd>::new(&aig, None, &Params::default()).unwrap();
        t.connect(5, Signal::from_node(4), false, true, None);
    }

    #[test]
    fn test_connect_sorts_objs() {
        let aig = shared_pair();
        let mut t = Transduction::<Bdd>::new(&aig, None, &Params::default()).unwrap();
        // objs = [g1, g2, g3]; wiring g3 into g1 moves g3 and its cone in front.
        let (g1, g2, g3) = (4, 5, 6);
        assert_eq!(t.objs, vec![g1, g2, g3]);
        t.connect(g1, Signal::from_node(g3), true, true, None);
        assert_eq!(t.objs, vec![g2, g3, g1]);
    }

    #[test]
    fn test_replace_merges_duplicate_wires() {
        // g1 = a & b, g2 = g1 & a: replacing g1 by a leaves g2 with a single fanin.
        let mut aig = Aig::new(2);
        let (a, b) = (aig.input(0), aig.input(1));
        let g1 = aig.add_and(a, b);
        let g2 = aig.add_and(g1, a);
        aig.add_output(g2);
        let mut t = Transduction::<Bdd>::new(&aig, None, &Params::default()).unwrap();
        t.replace(3, Signal::from_node(1), true);
        t.objs.retain(|&x| x != 3);
        assert_eq!(t.fanins[4], vec![Signal::from_node(1)]);
        assert_eq!(t.conds[4].len(), 1);
        assert!(t.fanins[3].is_empty());
        assert!(t.pf_updates[1]);
        assert_eq!(t.fanouts[1], vec![4]);
    }

    #[test]
    fn test_replace_by_const_propagates() {
        let aig = chain3();
        let mut t = Transduction::<Bdd>::new(&aig, None, &Params::default()).unwrap();
        // g1 := 0 makes g2 zero and ties the first output low, the second high.
        t.replace_by_const(4, false);
        t.remove_dangling(true);
        assert_eq!(t.gate_count(), 0);
        let out = t.to_aig();
        assert_eq!(out.outputs(), &[Signal::zero(), Signal::one()]);
    }

    #[test]
    fn test_replace_by_const_one_shrinks_fanout() {
        let aig = chain3();
        let mut t = Transduction::<Bdd>::new(&aig, None, &Params::default()).unwrap();
        // g1 := 1 turns g2 into a buffer of c.
        t.replace_by_const(4, true);
        t.remove_dangling(true);
        t.build(false);
        assert_eq!(t.gate_count(), 0);
        let out = t.to_aig();
        assert_eq!(out.outputs(), &[out.input(2), Signal::zero()]);
    }

    #[test]
    fn test_new_gate_reuses_free_slot() {
        let aig = chain3();
        let mut t = Transduction::<Bdd>::new(&aig, None, &Params::default()).unwrap();
        let mut pos = t.num_inputs() + 1;
        t.new_gate(&mut pos);
        let allocated = t.fanins.len();
        assert_eq!(pos, allocated - 1);
        let mut pos2 = t.num_inputs() + 1;
        t.new_gate(&mut pos2);
        assert_eq!(pos2, pos);
        assert_eq!(t.fanins.len(), allocated);
    }

    #[test]
    fn test_fanout_cone_and_sharing() {
        let aig = shared_pair();
        let t = Transduction::<Bdd>::new(&aig, None, &Params::default()).unwrap();
        let marks = t.fanout_cone(5);
        assert!(marks[5] && marks[6]);
        assert!(!marks[4]);
        // b feeds g1 and g3, which reach different outputs.
        assert!(!t.is_fanout_cone_shared(2));
        // a feeds g1 and g2: disjoint cones as well.
        assert!(!t.is_fanout_cone_shared(1));
        assert_equivalent(&t.to_aig(), &aig);
    }

    #[test]
    fn test_fanout_cone_reconverges() {
        // a feeds g1 and g2, both feed g3.
        let mut aig = Aig::new(3);
        let (a, b, c) = (aig.input(0), aig.input(1), aig.input(2));
        let g1 = aig.add_and(a, b);
        let g2 = aig.add_and(a, c);
        let g3 = aig.add_and(g1, g2);
        aig.add_output(g3);
        let t = Transduction::<Bdd>::new(&aig, None, &Params::default()).unwrap();
        assert!(t.is_fanout_cone_shared(1));
        assert!(!t.is_fanout_cone_shared(2));
    }
}
