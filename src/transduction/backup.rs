//! Snapshots of the whole network state for rollback.

use super::{PfState, Transduction};
use crate::engine::{Engine, Func};
use crate::signal::Signal;

/// Copy of every per-object table of a [`Transduction`].
///
/// Holding a snapshot keeps the functions it refers to alive in the engine.
pub struct Snapshot<E: Engine> {
    state: PfState,
    objs: Vec<usize>,
    fanins: Vec<Vec<Signal>>,
    fanouts: Vec<Vec<usize>>,
    levels: Vec<isize>,
    slacks: Vec<isize>,
    fi_slacks: Vec<Vec<isize>>,
    funcs: Vec<Option<Func<E>>>,
    perms: Vec<Option<Func<E>>>,
    conds: Vec<Vec<Option<Func<E>>>>,
    updates: Vec<bool>,
    pf_updates: Vec<bool>,
    fo_cone_shared: Vec<bool>,
}

impl<E: Engine> Snapshot<E> {
    pub fn gate_count(&self) -> usize {
        self.objs.len()
    }
}

impl<E: Engine> PartialEq for Snapshot<E> {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state
            && self.objs == other.objs
            && self.fanins == other.fanins
            && self.fanouts == other.fanouts
            && self.levels == other.levels
            && self.slacks == other.slacks
            && self.fi_slacks == other.fi_slacks
            && self.funcs == other.funcs
            && self.perms == other.perms
            && self.conds == other.conds
            && self.updates == other.updates
            && self.pf_updates == other.pf_updates
            && self.fo_cone_shared == other.fo_cone_shared
    }
}

impl<E: Engine> Transduction<E> {
    pub fn snapshot(&self) -> Snapshot<E> {
        Snapshot {
            state: self.state,
            objs: self.objs.clone(),
            fanins: self.fanins.clone(),
            fanouts: self.fanouts.clone(),
            levels: self.levels.clone(),
            slacks: self.slacks.clone(),
            fi_slacks: self.fi_slacks.clone(),
            funcs: self.funcs.clone(),
            perms: self.perms.clone(),
            conds: self.conds.clone(),
            updates: self.updates.clone(),
            pf_updates: self.pf_updates.clone(),
            fo_cone_shared: self.fo_cone_shared.clone(),
        }
    }

    /// Returns to the state captured by `snapshot`.
    ///
    /// Objects allocated after the snapshot was taken are dropped.
    pub fn restore(&mut self, snapshot: &Snapshot<E>) {
        self.state = snapshot.state;
        self.objs.clone_from(&snapshot.objs);
        self.fanins.clone_from(&snapshot.fanins);
        self.fanouts.clone_from(&snapshot.fanouts);
        self.levels.clone_from(&snapshot.levels);
        self.slacks.clone_from(&snapshot.slacks);
        self.fi_slacks.clone_from(&snapshot.fi_slacks);
        self.funcs.clone_from(&snapshot.funcs);
        self.perms.clone_from(&snapshot.perms);
        self.conds.clone_from(&snapshot.conds);
        self.updates.clone_from(&snapshot.updates);
        self.pf_updates.clone_from(&snapshot.pf_updates);
        self.fo_cone_shared.clone_from(&snapshot.fo_cone_shared);
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

    #[test]
    fn test_restore_after_edits() {
        let aig = shared_pair();
        let mut t = Transduction::<Bdd>::new(&aig, None, &Params::default()).unwrap();
        t.cspf();
        let snapshot = t.snapshot();
        let wires = t.wire_count();
        t.trivial_merge();
        t.trivial_decompose();
        t.replace_by_const(4, false);
        assert!(t.snapshot() != snapshot);
        t.restore(&snapshot);
        assert!(t.snapshot() == snapshot);
        assert_eq!(t.wire_count(), wires);
        assert_eq!(snapshot.gate_count(), t.gate_count());
        assert!(t.verify());
        assert_equivalent(&t.to_aig(), &aig);
    }

    #[test]
    fn test_restore_drops_new_objects() {
        let mut aig = Aig::new(4);
        let xs: Vec<Signal> = (0..4).map(|k| aig.input(k)).collect();
        let g1 = aig.add_and(xs[0], xs[1]);
        let g2 = aig.add_and(g1, xs[2]);
        let g3 = aig.add_and(g2, xs[3]);
        aig.add_output(g3);
        let mut t = Transduction::<Bdd>::new(&aig, None, &Params::default()).unwrap();
        t.trivial_merge();
        let snapshot = t.snapshot();
        let objects = t.fanins.len();
        let idx = t.objs.len() - 1;
        let mut pos = t.fanins.len();
        t.trivial_decompose_one(idx, &mut pos);
        assert!(t.fanins.len() > objects);
        t.restore(&snapshot);
        assert_eq!(t.fanins.len(), objects);
        assert_eq!(t.funcs.len(), objects);
        assert_eq!(t.gate_count(), 1);
    }
}
