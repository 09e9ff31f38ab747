//! Don't-care based rewriting of multi-level AND networks.
//!
//! A [`Transduction`] imports an [`Aig`] into a network of multi-input AND
//! gates, keeps the function of every gate as a [`Func`] inside an
//! [`Engine`], and rewrites the network while every primary output keeps its
//! function outside of its external don't-care set.
//!
//! Objects are numbered as follows: object 0 is the constant, objects
//! `1..=n` are the primary inputs, then come the gates, and every primary
//! output is a separate single-fanin object placed after them. Fanins are
//! [`Signal`]s into this numbering. The gates themselves are kept in `objs`
//! in topological order.
//!
//! Every optimization returns the signed change of the wire count (the sum
//! of fanin counts of all gates): negative values are improvements.
//!
//! ```
//! use transduction_rs::aig::Aig;
//! use transduction_rs::config::Params;
//! use transduction_rs::transduction::{transduce, Strategy};
//!
//! let mut aig = Aig::new(2);
//! let (a, b) = (aig.input(0), aig.input(1));
//! let x = aig.and(a, b);
//! let y = aig.and(x, a);
//! aig.add_output(y);
//!
//! let (optimized, delta) = transduce(&aig, None, &Params::default(), Strategy::Cspf).unwrap();
//! assert_eq!(delta, -2);
//! assert_eq!(optimized.num_ands(), 1);
//! ```

mod backup;
mod debug;
mod edit;
mod level;
mod merge;
mod pf;
mod resub;
mod simulate;

pub use backup::Snapshot;

use std::rc::Rc;
use std::time::Instant;

use log::info;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::aig::{Aig, AigNode};
use crate::bdd::Bdd;
use crate::config::{ConfigError, EngineKind, FaninSort, Params};
use crate::engine::{Engine, Func};
use crate::signal::Signal;
use crate::truth_table::TruthTable;

/// Which kind of permissible functions the stored conditions currently describe.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PfState {
    None,
    Cspf,
    Mspf,
}

/// Optimization schedules accepted by [`Transduction::run`] and [`transduce`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Strategy {
    /// Remove redundant wires using compatible permissible functions.
    Cspf,
    /// Remove redundant wires using maximum permissible functions.
    Mspf,
    Resub { mspf: bool },
    ResubMono { mspf: bool },
    ResubShared { mspf: bool },
    RepeatResub { mono: bool, mspf: bool },
    RepeatInner { mspf: bool, inner: bool },
    RepeatOuter { mspf: bool, inner: bool, outer: bool },
    RepeatAll { first_merge: bool, mspf_merge: bool, mspf_resub: bool, inner: bool, outer: bool },
    TrivialMerge,
    TrivialDecompose,
    Decompose,
}

pub struct Transduction<E: Engine> {
    engine: Rc<E>,
    fanin_sort: FaninSort,
    level_aware: bool,
    verbosity: u32,
    state: PfState,
    pis: Vec<usize>,
    pos: Vec<usize>,
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
    po_funcs: Vec<Func<E>>,
    max_levels: Option<isize>,
    start: Instant,
}

impl<E: Engine> Transduction<E> {
    /// Imports `aig` and builds the functions of all gates.
    ///
    /// Output `k` of `dc` (or its only output) is the external don't-care
    /// condition of primary output `k`.
    pub fn new(aig: &Aig, dc: Option<&Aig>, params: &Params) -> Result<Self, ConfigError> {
        params.validate()?;
        if let Some(dc) = dc {
            let outputs_ok = dc.num_outputs() == 1 || dc.num_outputs() == aig.num_outputs();
            if dc.num_inputs() != aig.num_inputs() || !outputs_ok {
                return Err(ConfigError::DontCareMismatch {
                    inputs: (aig.num_inputs(), dc.num_inputs()),
                    outputs: (aig.num_outputs(), dc.num_outputs()),
                });
            }
        }

        let engine = Rc::new(E::new(aig.num_inputs(), &params.engine_config())?);
        engine.turn_on_ref();

        let mut t = Self {
            engine,
            fanin_sort: params.fanin_sort,
            level_aware: params.level_aware,
            verbosity: params.verbosity,
            state: PfState::None,
            pis: Vec::new(),
            pos: Vec::new(),
            objs: Vec::new(),
            fanins: Vec::new(),
            fanouts: Vec::new(),
            levels: Vec::new(),
            slacks: Vec::new(),
            fi_slacks: Vec::new(),
            funcs: Vec::new(),
            perms: Vec::new(),
            conds: Vec::new(),
            updates: Vec::new(),
            pf_updates: Vec::new(),
            fo_cone_shared: Vec::new(),
            po_funcs: Vec::new(),
            max_levels: None,
            start: Instant::now(),
        };

        t.import(aig);
        t.funcs[0] = Some(Func::zero(&t.engine));
        for (k, &pi) in t.pis.iter().enumerate() {
            t.funcs[pi] = Some(Func::var(&t.engine, k));
        }
        t.build(false);
        t.engine.reorder();
        t.engine.turn_off_reorder();

        let dont_cares = match dc {
            Some(dc) => t.import_dont_cares(dc),
            None => vec![Func::zero(&t.engine)],
        };
        for k in 0..t.pos.len() {
            let c = if dont_cares.len() == 1 { &dont_cares[0] } else { &dont_cares[k] };
            let po = t.pos[k];
            t.conds[po][0] = Some(c.clone());
        }
        drop(dont_cares);

        t.remove_const_outputs();
        t.po_funcs = (0..t.pos.len()).map(|k| t.fanin_func(t.pos[k], 0)).collect();
        t.state = PfState::None;
        if let Some(seed) = params.pi_shuffle_seed {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            t.pis.shuffle(&mut rng);
        }
        if t.level_aware {
            t.compute_level();
        }
        if t.verbosity >= 1 {
            t.log_stats("Init");
        }
        Ok(t)
    }

    /// Appends a fresh object slot to every per-object table.
    fn alloc_object(&mut self) -> usize {
        let id = self.fanins.len();
        self.fanins.push(Vec::new());
        self.fanouts.push(Vec::new());
        self.levels.push(0);
        self.slacks.push(0);
        self.fi_slacks.push(Vec::new());
        self.funcs.push(None);
        self.perms.push(None);
        self.conds.push(Vec::new());
        self.updates.push(false);
        self.pf_updates.push(false);
        self.fo_cone_shared.push(false);
        id
    }

    fn import(&mut self, aig: &Aig) {
        let const0 = self.alloc_object();
        debug_assert_eq!(const0, 0);
        let mut map = Vec::with_capacity(aig.num_nodes());
        map.push(Signal::zero());
        for _ in 0..aig.num_inputs() {
            let pi = self.alloc_object();
            self.pis.push(pi);
            map.push(Signal::from_node(pi));
        }
        for index in aig.num_inputs() + 1..aig.num_nodes() {
            let s = match aig.node(index) {
                AigNode::And(a, b) => {
                    let x = map[a.node()].not_cond(a.is_negated());
                    let y = map[b.node()].not_cond(b.is_negated());
                    if x == Signal::zero() || y == Signal::zero() || x == !y {
                        Signal::zero()
                    } else if x == Signal::one() || x == y {
                        y
                    } else if y == Signal::one() {
                        x
                    } else {
                        let id = self.alloc_object();
                        self.connect(id, x, false, true, None);
                        self.connect(id, y, false, true, None);
                        self.objs.push(id);
                        Signal::from_node(id)
                    }
                }
                AigNode::Const => Signal::zero(),
                AigNode::Input(k) => Signal::from_node(k + 1),
            };
            map.push(s);
        }
        for &s in aig.outputs() {
            let id = self.alloc_object();
            self.connect(id, map[s.node()].not_cond(s.is_negated()), false, true, None);
            self.pos.push(id);
        }
    }

    fn import_dont_cares(&self, dc: &Aig) -> Vec<Func<E>> {
        let mut nodes: Vec<Func<E>> = Vec::with_capacity(dc.num_nodes());
        for index in 0..dc.num_nodes() {
            let f = match dc.node(index) {
                AigNode::Const => Func::zero(&self.engine),
                AigNode::Input(k) => Func::var(&self.engine, k),
                AigNode::And(a, b) => {
                    let x = nodes[a.node()].not_cond(a.is_negated());
                    let y = nodes[b.node()].not_cond(b.is_negated());
                    x.and(&y)
                }
            };
            nodes.push(f);
        }
        dc.outputs().iter().map(|s| nodes[s.node()].not_cond(s.is_negated())).collect()
    }

    /// Ties primary outputs that are constant outside their don't-cares to the constant.
    fn remove_const_outputs(&mut self) {
        let mut removed = false;
        for k in 0..self.pos.len() {
            let po = self.pos[k];
            let i0 = self.fanins[po][0].node();
            if i0 == 0 {
                continue;
            }
            let c = self.cond(po, 0);
            let x = self.fanin_func(po, 0);
            let value = if x.or(&c).is_const1() {
                Some(true)
            } else if x.not().or(&c).is_const1() {
                Some(false)
            } else {
                None
            };
            if let Some(value) = value {
                if self.verbosity >= 3 {
                    info!("PO {} is constant {}", k, value as u8);
                }
                self.disconnect(po, 0, false, false);
                self.connect(po, Signal::from(value), false, false, Some(c));
                removed |= self.fanouts[i0].is_empty();
            }
        }
        if removed {
            self.remove_dangling(false);
        }
    }

    /// Removes gates without fanouts, last to first.
    fn remove_dangling(&mut self, pf_update: bool) {
        let mut idx = self.objs.len();
        while idx > 0 {
            idx -= 1;
            let i = self.objs[idx];
            if self.fanouts[i].is_empty() {
                self.remove(i, pf_update);
                self.objs.remove(idx);
            }
        }
    }

    /// Runs `f` and returns the resulting change of the wire count.
    fn measured(&mut self, f: impl FnOnce(&mut Self)) -> isize {
        let before = self.wire_count() as isize;
        f(self);
        self.wire_count() as isize - before
    }

    fn log_stats(&self, prefix: &str) {
        let elapsed = self.start.elapsed().as_secs_f64();
        if self.level_aware {
            info!(
                "{:<11}: #nodes = {:5}, #level = {:5}, elapsed = {:8.2}s",
                prefix,
                self.node_count(),
                self.count_levels(),
                elapsed
            );
        } else {
            info!("{:<11}: #nodes = {:5}, elapsed = {:8.2}s", prefix, self.node_count(), elapsed);
        }
    }
}

// Statistics
impl<E: Engine> Transduction<E> {
    pub fn engine(&self) -> &Rc<E> {
        &self.engine
    }

    pub fn state(&self) -> PfState {
        self.state
    }

    pub fn num_inputs(&self) -> usize {
        self.pis.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.pos.len()
    }

    pub fn gate_count(&self) -> usize {
        self.objs.len()
    }

    /// Sum of the fanin counts of all gates.
    pub fn wire_count(&self) -> usize {
        self.objs.iter().map(|&i| self.fanins[i].len()).sum()
    }

    /// Number of two-input ANDs the network would need: wires minus gates.
    pub fn node_count(&self) -> usize {
        self.wire_count() - self.gate_count()
    }

    /// Deepest primary output level, available when level tracking is on.
    pub fn max_level(&self) -> Option<usize> {
        if self.level_aware {
            Some(self.count_levels() as usize)
        } else {
            None
        }
    }

    /// Level budget fixed by the first level computation.
    pub fn level_budget(&self) -> Option<usize> {
        self.max_levels.map(|l| l as usize)
    }
}

// Optimization entry points
impl<E: Engine> Transduction<E> {
    pub fn run(&mut self, strategy: Strategy) -> isize {
        match strategy {
            Strategy::Cspf => self.cspf(),
            Strategy::Mspf => self.mspf(),
            Strategy::Resub { mspf } => self.resub(mspf),
            Strategy::ResubMono { mspf } => self.resub_mono(mspf),
            Strategy::ResubShared { mspf } => self.resub_shared(mspf),
            Strategy::RepeatResub { mono, mspf } => self.repeat_resub(mono, mspf),
            Strategy::RepeatInner { mspf, inner } => self.repeat_inner(mspf, inner),
            Strategy::RepeatOuter { mspf, inner, outer } => self.repeat_outer(mspf, inner, outer),
            Strategy::RepeatAll {
                first_merge,
                mspf_merge,
                mspf_resub,
                inner,
                outer,
            } => self.repeat_all(first_merge, mspf_merge, mspf_resub, inner, outer),
            Strategy::TrivialMerge => self.trivial_merge(),
            Strategy::TrivialDecompose => self.trivial_decompose(),
            Strategy::Decompose => self.decompose(),
        }
    }

    pub fn cspf(&mut self) -> isize {
        self.cspf_with(true, None, None)
    }

    pub fn mspf(&mut self) -> isize {
        self.mspf_with(true, None, None)
    }

    /// Re-emits the network as an AIG.
    ///
    /// Gates with more than two fanins become chains of ANDs, or balanced
    /// trees when level tracking is on.
    pub fn to_aig(&self) -> Aig {
        let mut aig = Aig::new(self.pis.len());
        let mut values = vec![Signal::zero(); self.fanins.len()];
        for k in 0..self.pis.len() {
            values[k + 1] = aig.input(k);
        }
        for &i in &self.objs {
            assert!(self.fanins[i].len() > 1, "Gate {} has fewer than two fanins", i);
            let mut xs: Vec<Signal> = self.fanins[i]
                .iter()
                .map(|f| values[f.node()].not_cond(f.is_negated()))
                .collect();
            values[i] = if self.level_aware {
                while xs.len() > 1 {
                    let mut next = Vec::with_capacity((xs.len() + 1) / 2);
                    for pair in xs.chunks(2) {
                        next.push(match *pair {
                            [a, b] => aig.and(a, b),
                            [a] => a,
                            _ => unreachable!(),
                        });
                    }
                    xs = next;
                }
                xs[0]
            } else {
                let first = xs[0];
                xs[1..].iter().fold(first, |r, &x| aig.and(r, x))
            };
        }
        for &po in &self.pos {
            let f = self.fanins[po][0];
            aig.add_output(values[f.node()].not_cond(f.is_negated()));
        }
        aig.cleanup()
    }
}

fn optimize<E: Engine>(aig: &Aig, dc: Option<&Aig>, params: &Params, strategy: Strategy) -> Result<(Aig, isize), ConfigError> {
    let mut t = Transduction::<E>::new(aig, dc, params)?;
    let delta = t.run(strategy);
    if t.verbosity >= 1 {
        t.log_stats("End");
    }
    Ok((t.to_aig(), delta))
}

/// Optimizes `aig` with the engine selected in `params`.
///
/// Returns the optimized network and the change of the wire count.
pub fn transduce(aig: &Aig, dc: Option<&Aig>, params: &Params, strategy: Strategy) -> Result<(Aig, isize), ConfigError> {
    match params.engine {
        EngineKind::DecisionDiagram => optimize::<Bdd>(aig, dc, params, strategy),
        EngineKind::WordTable => optimize::<TruthTable>(aig, dc, params, strategy),
    }
}
