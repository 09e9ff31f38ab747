//! Symbolic simulation of the network and fanin ordering.

use std::cmp::Ordering;

use log::trace;

use super::Transduction;
use crate::config::FaninSort;
use crate::engine::{Engine, Func};
use crate::signal::Signal;

impl<E: Engine> Transduction<E> {
    pub(super) fn func(&self, i: usize) -> &Func<E> {
        self.funcs[i]
            .as_ref()
            .unwrap_or_else(|| panic!("Object {} has no function", i))
    }

    /// Function of the signal `f`.
    pub(super) fn signal_func(&self, f: Signal) -> Func<E> {
        self.func(f.node()).not_cond(f.is_negated())
    }

    /// Function of the `j`-th fanin wire of `i`, with its polarity.
    pub(super) fn fanin_func(&self, i: usize, j: usize) -> Func<E> {
        self.signal_func(self.fanins[i][j])
    }

    /// Permissible function of gate `i`. Missing ones are treated as empty.
    pub(super) fn perm(&self, i: usize) -> Func<E> {
        match &self.perms[i] {
            Some(g) => g.clone(),
            None => Func::zero(&self.engine),
        }
    }

    /// Condition of the `j`-th fanin wire of `i`. Missing ones are treated as empty.
    pub(super) fn cond(&self, i: usize, j: usize) -> Func<E> {
        match &self.conds[i][j] {
            Some(c) => c.clone(),
            None => Func::zero(&self.engine),
        }
    }

    /// Conjunction of the fanins of `i` taken from `funcs`.
    fn build_func(&self, i: usize, funcs: &[Option<Func<E>>]) -> Func<E> {
        let mut x = Func::one(&self.engine);
        for f in &self.fanins[i] {
            let fi = match &funcs[f.node()] {
                Some(g) => g.not_cond(f.is_negated()),
                None => panic!("Fanin {} of {} has no function", f, i),
            };
            x = x.and(&fi);
        }
        x
    }

    pub(super) fn build_one(&mut self, i: usize) {
        if self.verbosity >= 5 {
            trace!("build gate {}", i);
        }
        let x = self.build_func(i, &self.funcs);
        self.funcs[i] = Some(x);
    }

    /// Rebuilds flagged gates in topological order, flagging the fanouts of
    /// every gate whose function changed.
    ///
    /// With `pf_update`, every rebuilt gate is also flagged for a permissible
    /// function update.
    pub(super) fn build(&mut self, pf_update: bool) {
        for idx in 0..self.objs.len() {
            let i = self.objs[idx];
            if !self.updates[i] {
                continue;
            }
            let old = self.funcs[i].take();
            self.build_one(i);
            if old != self.funcs[i] {
                for k in 0..self.fanouts[i].len() {
                    let fo = self.fanouts[i][k];
                    self.updates[fo] = true;
                }
            }
        }
        if pf_update {
            for &i in &self.objs {
                self.pf_updates[i] |= self.updates[i];
            }
        }
        self.updates.iter_mut().for_each(|u| *u = false);
    }

    /// Output functions with gate `i` complemented.
    pub(super) fn build_fo_cone_compl(&self, i: usize) -> Vec<Func<E>> {
        let mut funcs = self.funcs.clone();
        funcs[i] = Some(self.func(i).not());
        let mut marks = vec![false; self.fanins.len()];
        for &k in &self.fanouts[i] {
            marks[k] = true;
        }
        for &k in &self.objs {
            if !marks[k] {
                continue;
            }
            let x = self.build_func(k, &funcs);
            if Some(&x) != self.funcs[k].as_ref() {
                for &fo in &self.fanouts[k] {
                    marks[fo] = true;
                }
            }
            funcs[k] = Some(x);
        }
        self.pos
            .iter()
            .map(|&po| {
                let f = self.fanins[po][0];
                match &funcs[f.node()] {
                    Some(g) => g.not_cond(f.is_negated()),
                    None => panic!("Output {} is driven by {} without a function", po, f),
                }
            })
            .collect()
    }

    /// Whether fanin `a` costs more than fanin `b`, so it should come first.
    fn cost_compare(&self, a: Signal, b: Signal) -> bool {
        let (a0, b0) = (a.node(), b.node());
        let (a_gate, b_gate) = (!self.fanins[a0].is_empty(), !self.fanins[b0].is_empty());
        match (a_gate, b_gate) {
            (false, false) => {
                return match self.pis.iter().position(|&x| x == a0) {
                    Some(p) => self.pis[p..].contains(&b0),
                    None => false,
                };
            }
            (false, true) => return false,
            (true, false) => return true,
            (true, true) => {}
        }
        match self.fanouts[a0].len().cmp(&self.fanouts[b0].len()) {
            Ordering::Greater => return false,
            Ordering::Less => return true,
            Ordering::Equal => {}
        }
        match self.fanin_sort {
            FaninSort::None => false,
            FaninSort::Topological => match self.objs.iter().position(|&x| x == a0) {
                Some(p) => !self.objs[p..].contains(&b0),
                None => true,
            },
            FaninSort::OneCountBoth => self.signal_func(a).one_count() < self.signal_func(b).one_count(),
            FaninSort::OneCountSingle => self.func(a0).one_count() < self.func(b0).one_count(),
            FaninSort::PseudoRandom => self.func(a0).not().one_count() < self.func(b0).one_count(),
        }
    }

    /// Insertion-sorts the fanins of `i` by decreasing cost, moving conditions along.
    /// Returns whether anything moved.
    pub(super) fn sort_fanins(&mut self, i: usize) -> bool {
        let mut moved = false;
        for p in 1..self.fanins[i].len() {
            let f = self.fanins[i][p];
            let mut q = p;
            while q > 0 && self.cost_compare(f, self.fanins[i][q - 1]) {
                q -= 1;
            }
            if q != p {
                moved = true;
                self.fanins[i][q..=p].rotate_right(1);
                self.conds[i][q..=p].rotate_right(1);
            }
        }
        if moved && self.verbosity >= 5 {
            trace!("sorted fanins of gate {}: {:?}", i, self.fanins[i]);
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::aig::Aig;
    use crate::bdd::Bdd;
    use crate::config::Params;
    use crate::truth_table::TruthTable;

    /// `y = (a & b) & g` where `g = b & c` also drives an output.
    fn wide() -> Aig {
        let mut aig = Aig::new(3);
        let (a, b, c) = (aig.input(0), aig.input(1), aig.input(2));
        let g = aig.add_and(b, c);
        let x = aig.add_and(a, b);
        let y = aig.add_and(x, g);
        aig.add_output(y);
        aig.add_output(g);
        aig
    }

    #[test]
    fn test_build_propagates_changes() {
        let aig = wide();
        let mut t = Transduction::<Bdd>::new(&aig, None, &Params::default()).unwrap();
        let (g, x, y) = (4, 5, 6);
        // Rewire x = a & b into x = a & c: y is rebuilt, g is untouched.
        t.disconnect(x, 1, true, true);
        t.connect(x, Signal::from_node(3), false, true, None);
        t.build(true);
        assert!(t.pf_updates[x]);
        assert!(t.pf_updates[y]);
        assert!(!t.pf_updates[g]);
        assert!(t.updates.iter().all(|&u| !u));
        let a = Func::var(t.engine(), 0);
        let c = Func::var(t.engine(), 2);
        assert_eq!(*t.func(x), a.and(&c));
        assert!(t.build_debug());
    }

    #[test]
    fn test_fo_cone_compl() {
        let aig = wide();
        let t = Transduction::<Bdd>::new(&aig, None, &Params::default()).unwrap();
        let compl = t.build_fo_cone_compl(5);
        // Output 0 becomes !(a & b) & b & c = !a & b & c, output 1 is unaffected.
        let a = Func::var(t.engine(), 0);
        let b = Func::var(t.engine(), 1);
        let c = Func::var(t.engine(), 2);
        assert_eq!(compl[0], a.not().and(&b).and(&c));
        assert_eq!(compl[1], b.and(&c));
    }

    #[test]
    fn test_sort_topological() {
        let aig = wide();
        let mut t = Transduction::<Bdd>::new(&aig, None, &Params::default()).unwrap();
        let (g, x, y) = (4, 5, 6);
        assert_eq!(t.fanins[y], vec![Signal::from_node(x), Signal::from_node(g)]);
        // g has more fanouts than x, so x stays in front.
        assert!(!t.sort_fanins(y));
        t.connect(y, Signal::from_node(1), false, true, None);
        t.fanins[y].rotate_right(1);
        t.conds[y].rotate_right(1);
        assert!(t.sort_fanins(y));
        assert_eq!(t.fanins[y], vec![Signal::from_node(x), Signal::from_node(g), Signal::from_node(1)]);
    }

    #[test]
    fn test_sort_fanout_count_first() {
        let aig = wide();
        let mut t = Transduction::<Bdd>::new(&aig, None, &Params::default()).unwrap();
        let (g, x, y) = (4, 5, 6);
        // g has two fanouts, x only one: x costs more wherever it starts.
        t.fanins[y].swap(0, 1);
        t.conds[y].swap(0, 1);
        assert!(t.sort_fanins(y));
        assert_eq!(t.fanins[y][0], Signal::from_node(x));
        assert_eq!(t.fanins[y][1], Signal::from_node(g));
    }

    #[test]
    fn test_sort_by_one_count() {
        // y = !z & x with x = a & b and z = a & !c, each with one fanout.
        let mut aig = Aig::new(3);
        let (a, b, c) = (aig.input(0), aig.input(1), aig.input(2));
        let x = aig.add_and(a, b);
        let z = aig.add_and(a, !c);
        let y = aig.add_and(!z, x);
        aig.add_output(y);
        let params = Params::default().with_fanin_sort(FaninSort::OneCountBoth);
        let mut t = Transduction::<TruthTable>::new(&aig, None, &params).unwrap();
        let (x, z, y) = (4, 5, 6);
        assert_eq!(t.fanins[y], vec![!Signal::from_node(z), Signal::from_node(x)]);
        // Counting with polarity: !z has 6 ones, x has 2, so x moves in front.
        assert!(t.sort_fanins(y));
        assert_eq!(t.fanins[y], vec![Signal::from_node(x), !Signal::from_node(z)]);

        let params = Params::default().with_fanin_sort(FaninSort::OneCountSingle);
        let mut t = Transduction::<TruthTable>::new(&aig, None, &params).unwrap();
        // Ignoring polarity: z has 2 ones, x has 2 as well, so nothing moves.
        assert!(!t.sort_fanins(y));
    }
}
