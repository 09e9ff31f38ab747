//! Decision-diagram engine.
//!
//! Reduced ordered decision diagrams with complement edges. Every node lives
//! in a flat table and is found through the unique subtable of its variable,
//! so structurally equal functions share one handle. Stored nodes never have
//! a complemented `els` child; [`NodeTable::unique`] pushes the complement up
//! into the returned literal instead.
//!
//! Memory management is a reference count per node plus a mark-and-sweep
//! collector. Collection only runs when the table fills up during an AND,
//! following the configured [`GcMode`]. Reclaimed slots go to a free list.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::fmt::{Debug, Formatter};

use log::{debug, info};
use num_bigint::BigUint;

use crate::bitset::BitSet;
use crate::cache::Cache;
use crate::config::{ConfigError, EngineConfig, GcMode};
use crate::engine::Engine;
use crate::literal::Lit;
use crate::node::Node;
use crate::subtable::Subtable;
use crate::types::Var;

/// Node storage, unique subtables and the variable order.
pub(crate) struct NodeTable {
    pub(crate) nodes: Vec<Node>,
    pub(crate) refs: Vec<u32>,
    pub(crate) free: Vec<u32>,
    pub(crate) subtables: Vec<Subtable>,
    pub(crate) var2level: Vec<usize>,
    pub(crate) level2var: Vec<u32>,
    pub(crate) capacity: usize,
    /// Allocated non-constant nodes.
    pub(crate) live: usize,
}

impl NodeTable {
    fn new(num_vars: usize, capacity: usize) -> Self {
        Self {
            // Slot 0 is the constant node.
            nodes: vec![Node::free()],
            refs: vec![0],
            free: Vec::new(),
            subtables: (0..num_vars as u32).map(|v| Subtable::new(Var::new(v))).collect(),
            var2level: (0..num_vars).collect(),
            level2var: (0..num_vars as u32).collect(),
            capacity,
            live: 0,
        }
    }

    pub(crate) fn num_vars(&self) -> usize {
        self.var2level.len()
    }

    #[inline]
    pub(crate) fn node(&self, index: u32) -> Node {
        self.nodes[index as usize]
    }

    /// Level of the node behind `lit`. The constant sits below every variable.
    #[inline]
    pub(crate) fn level(&self, lit: Lit) -> usize {
        if lit.is_const() {
            self.num_vars()
        } else {
            self.var2level[self.node(lit.index()).var as usize]
        }
    }

    /// Cofactors `(f|var=1, f|var=0)` of `lit` with respect to a variable at or above its level.
    #[inline]
    pub(crate) fn cofactors(&self, lit: Lit, var: u32) -> (Lit, Lit) {
        if lit.is_const() {
            return (lit, lit);
        }
        let node = self.node(lit.index());
        if node.var != var {
            return (lit, lit);
        }
        let c = lit.is_complemented();
        (node.then.not_cond(c), node.els.not_cond(c))
    }

    /// Allocates a fresh node. Returns `None` when the table is full.
    pub(crate) fn alloc(&mut self, var: u32, then: Lit, els: Lit) -> Option<u32> {
        let index = match self.free.pop() {
            Some(i) => i,
            None if self.nodes.len() < self.capacity => {
                self.nodes.push(Node::free());
                self.refs.push(0);
                (self.nodes.len() - 1) as u32
            }
            None => return None,
        };
        self.nodes[index as usize] = Node::new(var, then, els);
        self.subtables[var as usize].insert(then, els, index);
        self.live += 1;
        Some(index)
    }

    /// Finds or creates the canonical node for `var ? then : els`.
    pub(crate) fn unique(&mut self, var: u32, then: Lit, els: Lit) -> Option<Lit> {
        if then == els {
            return Some(then);
        }
        let c = els.is_complemented();
        let (then, els) = (then.not_cond(c), els.not_cond(c));
        let index = match self.subtables[var as usize].find(then, els) {
            Some(i) => i,
            None => self.alloc(var, then, els)?,
        };
        Some(Lit::new(index, c))
    }

    /// Returns a node slot to the free list.
    pub(crate) fn release(&mut self, index: u32) {
        let node = self.node(index);
        debug_assert!(!node.is_free(), "Releasing free slot {}", index);
        self.subtables[node.var as usize].remove(node.then, node.els);
        self.nodes[index as usize] = Node::free();
        self.refs[index as usize] = 0;
        self.free.push(index);
        self.live -= 1;
    }
}

pub struct Bdd {
    pub(crate) table: RefCell<NodeTable>,
    pub(crate) cache: RefCell<Cache<(Lit, Lit), Lit>>,
    pub(crate) max_capacity: usize,
    gc_mode: GcMode,
    count_ones: bool,
    pub(crate) max_growth: f64,
    pub(crate) verbosity: u32,
    refs_enabled: Cell<bool>,
    reorder_threshold: Cell<Option<usize>>,
    gc_runs: Cell<usize>,
}

impl Debug for Bdd {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let table = self.table.borrow();
        f.debug_struct("Bdd")
            .field("num_vars", &table.num_vars())
            .field("capacity", &table.capacity)
            .field("live", &table.live)
            .field("free", &table.free.len())
            .finish()
    }
}

impl Bdd {
    pub fn capacity(&self) -> usize {
        self.table.borrow().capacity
    }

    /// Live-node count that triggers the next automatic reorder.
    pub fn reorder_threshold(&self) -> Option<usize> {
        self.reorder_threshold.get()
    }

    /// Number of garbage collections run so far.
    pub fn gc_runs(&self) -> usize {
        self.gc_runs.get()
    }

    pub fn cache_stats(&self) -> (usize, usize) {
        let cache = self.cache.borrow();
        (cache.hits(), cache.misses())
    }

    /// Current reference count of the node behind `lit`.
    pub fn ref_count(&self, lit: Lit) -> u32 {
        self.table.borrow().refs[lit.index() as usize]
    }

    pub fn var_at_level(&self, level: usize) -> u32 {
        self.table.borrow().level2var[level]
    }

    pub fn level_of_var(&self, var: u32) -> usize {
        self.table.borrow().var2level[var as usize]
    }

    /// Whether the slot behind `lit` is currently allocated.
    pub fn is_allocated(&self, lit: Lit) -> bool {
        let table = self.table.borrow();
        lit.is_const() || table.nodes.get(lit.index() as usize).is_some_and(|n| !n.is_free())
    }

    fn and_rec(&self, x: Lit, y: Lit) -> Option<Lit> {
        if x == Lit::ZERO || y == Lit::ZERO || x == !y {
            return Some(Lit::ZERO);
        }
        if x == Lit::ONE || x == y {
            return Some(y);
        }
        if y == Lit::ONE {
            return Some(x);
        }
        let (x, y) = if x < y { (x, y) } else { (y, x) };

        if let Some(r) = self.cache.borrow_mut().get(&(x, y)) {
            return Some(r);
        }

        let (var, (x1, x0), (y1, y0)) = {
            let table = self.table.borrow();
            let top = table.level(x).min(table.level(y));
            let var = table.level2var[top];
            (var, table.cofactors(x, var), table.cofactors(y, var))
        };
        let then = self.and_rec(x1, y1)?;
        let els = self.and_rec(x0, y0)?;
        let r = self.table.borrow_mut().unique(var, then, els)?;

        self.cache.borrow_mut().insert((x, y), r);
        Some(r)
    }

    fn grow(&self) -> bool {
        let mut table = self.table.borrow_mut();
        if table.capacity >= self.max_capacity {
            return false;
        }
        table.capacity = (table.capacity * 2).min(self.max_capacity);
        let additional = table.capacity - table.nodes.len();
        table.nodes.reserve(additional);
        table.refs.reserve(additional);
        if self.verbosity >= 1 {
            info!("bdd: node table grown to {} ({} live)", table.capacity, table.live);
        }
        true
    }

    /// Makes room in a full node table. Returns whether a collection ran.
    ///
    /// `collected` tells that an earlier refresh for the same operation
    /// already collected. Whatever a collection could free now belongs to the
    /// failed attempt itself, so only growth helps.
    ///
    /// # Panics
    ///
    /// Panics if neither collection nor growth makes room.
    fn refresh(&self, collected: bool) -> bool {
        let can_collect = self.refs_enabled.get();
        let capacity = self.capacity();
        let (made_room, collecting) = if collected || !can_collect {
            (self.grow(), collected)
        } else {
            match self.gc_mode {
                GcMode::OnExhaustion => {
                    if self.grow() {
                        (true, false)
                    } else {
                        (self.collect_garbage() > 0, true)
                    }
                }
                GcMode::BeforeGrowth => {
                    let freed = self.collect_garbage();
                    (freed * 4 >= capacity || self.grow() || freed > 0, true)
                }
                GcMode::Eager => {
                    let freed = self.collect_garbage();
                    (self.grow() || freed > 0, true)
                }
            }
        };
        if !made_room {
            let table = self.table.borrow();
            panic!(
                "Node table is full: {} live nodes in {} slots, maximum capacity {} reached",
                table.live, table.capacity, self.max_capacity
            );
        }

        if let Some(threshold) = self.reorder_threshold.get() {
            let live = self.live_nodes();
            if self.refs_enabled.get() && live > threshold {
                // Sifting collects first.
                self.sift_all_variables();
                self.reorder_threshold.set(Some(2 * self.live_nodes()));
                return true;
            }
        }
        collecting
    }

    /// Checks the hash-consing and canonicity invariants of every allocated node.
    pub fn check_unique(&self) -> bool {
        let table = self.table.borrow();
        let mut seen = HashSet::new();
        let mut count = 0;
        for (i, node) in table.nodes.iter().enumerate().skip(1) {
            if node.is_free() {
                continue;
            }
            count += 1;
            if node.els.is_complemented() || node.then == node.els {
                debug!("node {} is not canonical: {:?}", i, node);
                return false;
            }
            if !seen.insert((node.var, node.then, node.els)) {
                debug!("node {} duplicates {:?}", i, node);
                return false;
            }
            if table.subtables[node.var as usize].find(node.then, node.els) != Some(i as u32) {
                debug!("node {} is missing from its subtable", i);
                return false;
            }
            let level = table.var2level[node.var as usize];
            if table.level(node.then) <= level || table.level(node.els) <= level {
                debug!("node {} has a child above it", i);
                return false;
            }
        }
        let in_subtables: usize = table.subtables.iter().map(|s| s.len()).sum();
        count == table.live && in_subtables == table.live
    }
}

impl Engine for Bdd {
    const NAME: &'static str = "decision-diagram";

    fn new(num_vars: usize, config: &EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let max_capacity = 1usize << config.node_table_max_log;
        if num_vars + 1 > max_capacity {
            return Err(ConfigError::TooManyVariables {
                engine: Self::NAME,
                vars: num_vars,
                max: max_capacity - 1,
            });
        }
        let mut capacity = 1usize << config.node_table_log;
        while capacity < num_vars + 1 {
            capacity *= 2;
        }

        let mut table = NodeTable::new(num_vars, capacity);
        for v in 0..num_vars as u32 {
            let index = table.alloc(v, Lit::ONE, Lit::ZERO);
            debug_assert_eq!(index, Some(v + 1));
        }

        Ok(Self {
            table: RefCell::new(table),
            cache: RefCell::new(Cache::new(config.cache_log, config.cache_max_log)),
            max_capacity,
            gc_mode: config.gc_mode,
            count_ones: config.count_ones,
            max_growth: config.max_growth,
            verbosity: config.verbosity,
            refs_enabled: Cell::new(false),
            reorder_threshold: Cell::new(config.reorder_threshold),
            gc_runs: Cell::new(0),
        })
    }

    fn num_vars(&self) -> usize {
        self.table.borrow().num_vars()
    }

    fn ith_var(&self, v: usize) -> Lit {
        assert!(v < self.num_vars(), "Variable {} out of range", v);
        Lit::new(v as u32 + 1, false)
    }

    fn and(&self, x: Lit, y: Lit) -> Lit {
        let mut collected = false;
        loop {
            if let Some(r) = self.and_rec(x, y) {
                return r;
            }
            debug!("and({}, {}): node table full, refreshing", x, y);
            self.inc_ref(x);
            self.inc_ref(y);
            collected = self.refresh(collected);
            self.dec_ref(x);
            self.dec_ref(y);
        }
    }

    fn lit_is_eq(&self, x: Lit, y: Lit) -> bool {
        x == y
    }

    fn inc_ref(&self, x: Lit) {
        if self.refs_enabled.get() && !x.is_const() {
            self.table.borrow_mut().refs[x.index() as usize] += 1;
        }
    }

    fn dec_ref(&self, x: Lit) {
        if self.refs_enabled.get() && !x.is_const() {
            let mut table = self.table.borrow_mut();
            let r = &mut table.refs[x.index() as usize];
            assert!(*r > 0, "Releasing {} which has no references", x);
            *r -= 1;
        }
    }

    fn turn_on_ref(&self) {
        self.refs_enabled.set(true);
    }

    fn one_count(&self, x: Lit) -> BigUint {
        assert!(self.count_ones, "One counting is not enabled for this engine");

        fn count(table: &NodeTable, index: u32, max: &BigUint, memo: &mut HashMap<u32, BigUint>) -> BigUint {
            if index == 0 {
                return BigUint::from(0u8);
            }
            if let Some(c) = memo.get(&index) {
                return c.clone();
            }
            let node = table.node(index);
            let side = |lit: Lit, memo: &mut HashMap<u32, BigUint>| -> BigUint {
                let c = count(table, lit.index(), max, memo);
                if lit.is_complemented() {
                    max - c
                } else {
                    c
                }
            };
            let c1 = side(node.then, memo);
            let c0 = side(node.els, memo);
            let res: BigUint = (c1 + c0) >> 1u32;
            memo.insert(index, res.clone());
            res
        }

        let table = self.table.borrow();
        let max = BigUint::from(1u8) << table.num_vars();
        let mut memo = HashMap::new();
        let c = count(&table, x.index(), &max, &mut memo);
        if x.is_complemented() {
            max - c
        } else {
            c
        }
    }

    fn reorder(&self) {
        if !self.refs_enabled.get() {
            debug!("reorder skipped: reference counting is off");
            return;
        }
        let stats = self.sift_all_variables();
        if self.verbosity >= 1 {
            info!("bdd: {}", stats);
        }
    }

    fn turn_off_reorder(&self) {
        self.reorder_threshold.set(None);
    }

    fn live_nodes(&self) -> usize {
        self.table.borrow().live
    }

    fn collect_garbage(&self) -> usize {
        if !self.refs_enabled.get() {
            return 0;
        }
        let mut table = self.table.borrow_mut();
        let n = table.nodes.len();

        let mut marks = BitSet::new(n);
        let mut stack: Vec<u32> = (1..=table.num_vars() as u32).collect();
        stack.extend((1..n as u32).filter(|&i| table.refs[i as usize] > 0));
        while let Some(i) = stack.pop() {
            if i == 0 || !marks.insert(i as usize) {
                continue;
            }
            let node = table.node(i);
            stack.push(node.then.index());
            stack.push(node.els.index());
        }

        let mut freed = 0;
        for i in 1..n as u32 {
            if !table.node(i).is_free() && !marks.contains(i as usize) {
                table.release(i);
                freed += 1;
            }
        }
        let live = table.live;
        drop(table);

        self.cache.borrow_mut().clear();
        self.gc_runs.set(self.gc_runs.get() + 1);
        if self.verbosity >= 1 {
            info!("bdd: garbage collection freed {} nodes, {} live", freed, live);
        }
        freed
    }

    fn eval(&self, x: Lit, assignment: &[bool]) -> bool {
        let table = self.table.borrow();
        let mut value = x.is_complemented();
        let mut index = x.index();
        while index != 0 {
            let node = table.node(index);
            let next = if assignment[node.var as usize] { node.then } else { node.els };
            value ^= next.is_complemented();
            index = next.index();
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn new_bdd(num_vars: usize, config: EngineConfig) -> Bdd {
        let bdd = Bdd::new(num_vars, &config).unwrap();
        bdd.turn_on_ref();
        bdd
    }

    fn truth_table(bdd: &Bdd, f: Lit) -> Vec<bool> {
        let n = bdd.num_vars();
        (0..1u32 << n)
            .map(|m| {
                let a: Vec<bool> = (0..n).map(|i| m >> i & 1 != 0).collect();
                bdd.eval(f, &a)
            })
            .collect()
    }

    #[test]
    fn test_vars_and_constants() {
        let bdd = new_bdd(3, EngineConfig::default());
        assert_eq!(bdd.const0(), Lit::ZERO);
        assert_eq!(bdd.const1(), Lit::ONE);
        let x = bdd.ith_var(1);
        assert_eq!(x.index(), 2);
        assert!(bdd.eval(x, &[false, true, false]));
        assert!(!bdd.eval(x, &[true, false, true]));
        assert_eq!(bdd.live_nodes(), 3);
        assert!(bdd.check_unique());
    }

    #[test]
    fn test_and_canonical() {
        let bdd = new_bdd(3, EngineConfig::default());
        let (a, b, c) = (bdd.ith_var(0), bdd.ith_var(1), bdd.ith_var(2));
        let f = bdd.or(bdd.and(a, b), bdd.and(a, c));
        let g = bdd.and(a, bdd.or(b, c));
        assert_eq!(f, g);
        assert_eq!(bdd.and(a, !a), Lit::ZERO);
        assert_eq!(bdd.or(a, !a), Lit::ONE);
        assert_eq!(bdd.xor(a, a), Lit::ZERO);
        assert_eq!(bdd.xor(a, !a), Lit::ONE);
        assert!(bdd.check_unique());
    }

    #[test]
    fn test_and_cache_hits() {
        let bdd = new_bdd(3, EngineConfig::default());
        let (a, b) = (bdd.ith_var(0), bdd.ith_var(1));
        let f = bdd.and(a, b);
        let (hits, misses) = bdd.cache_stats();
        assert_eq!(misses, 1);
        assert_eq!(bdd.and(b, a), f);
        assert_eq!(bdd.cache_stats(), (hits + 1, misses));
    }

    #[test]
    fn test_complement_shares_node() {
        let bdd = new_bdd(2, EngineConfig::default());
        let (a, b) = (bdd.ith_var(0), bdd.ith_var(1));
        let nand = !bdd.and(a, b);
        let or = bdd.or(!a, !b);
        assert_eq!(nand, or);
        assert_eq!(nand.index(), bdd.and(a, b).index());
    }

    #[test]
    fn test_one_count() {
        let config = EngineConfig::default().with_count_ones(true);
        let bdd = new_bdd(4, config);
        let (a, b, c) = (bdd.ith_var(0), bdd.ith_var(1), bdd.ith_var(2));
        assert_eq!(bdd.one_count(Lit::ZERO), BigUint::from(0u32));
        assert_eq!(bdd.one_count(Lit::ONE), BigUint::from(16u32));
        assert_eq!(bdd.one_count(a), BigUint::from(8u32));
        assert_eq!(bdd.one_count(bdd.and(a, b)), BigUint::from(4u32));
        assert_eq!(bdd.one_count(bdd.or(bdd.and(a, b), c)), BigUint::from(10u32));
        assert_eq!(bdd.one_count(!bdd.and(a, !c)), BigUint::from(12u32));
    }

    #[test]
    #[should_panic(expected = "One counting is not enabled")]
    fn test_one_count_disabled() {
        let bdd = new_bdd(2, EngineConfig::default());
        bdd.one_count(bdd.ith_var(0));
    }

    #[test]
    fn test_gc_keeps_referenced() {
        let bdd = new_bdd(4, EngineConfig::default());
        let v: Vec<Lit> = (0..4).map(|i| bdd.ith_var(i)).collect();
        let keep = bdd.or(bdd.and(v[0], v[1]), bdd.and(v[2], v[3]));
        bdd.inc_ref(keep);
        let expected = truth_table(&bdd, keep);

        let garbage = bdd.and(bdd.xor(v[0], v[2]), v[3]);
        assert!(bdd.is_allocated(garbage));

        let freed = bdd.collect_garbage();
        assert!(freed > 0);
        assert!(!bdd.is_allocated(garbage));
        assert!(bdd.is_allocated(keep));
        assert_eq!(truth_table(&bdd, keep), expected);
        assert!(bdd.check_unique());

        // The referenced function is still found by hash-consing.
        let again = bdd.or(bdd.and(v[0], v[1]), bdd.and(v[2], v[3]));
        assert_eq!(again, keep);
    }

    #[test]
    fn test_gc_dead_handle_only_reappears_when_recreated() {
        let bdd = new_bdd(3, EngineConfig::default());
        let (a, b, c) = (bdd.ith_var(0), bdd.ith_var(1), bdd.ith_var(2));
        let dead = bdd.and(bdd.and(a, b), c);
        let keep = bdd.or(a, c);
        bdd.inc_ref(keep);
        bdd.collect_garbage();
        assert!(!bdd.is_allocated(dead));

        // Results built afterwards never point at the reclaimed slot unless they are the same function.
        let other = bdd.and(b, !c);
        assert!(bdd.is_allocated(other));
        assert_eq!(truth_table(&bdd, other), (0..8).map(|m| m & 2 != 0 && m & 4 == 0).collect::<Vec<_>>());
    }

    #[test]
    fn test_growth_when_full() {
        let config = EngineConfig::default().with_node_table_log(3).with_node_table_max_log(12);
        let bdd = new_bdd(6, config);
        assert_eq!(bdd.capacity(), 8);
        let v: Vec<Lit> = (0..6).map(|i| bdd.ith_var(i)).collect();
        let mut f = Lit::ZERO;
        for i in 0..3 {
            f = bdd.or(f, bdd.xor(v[i], v[i + 3]));
            bdd.inc_ref(f);
        }
        assert!(bdd.capacity() > 8);
        assert!(bdd.check_unique());
        assert!(bdd.eval(f, &[true, false, true, false, false, true]));
        assert!(!bdd.eval(f, &[true, false, true, true, false, true]));
        assert!(!bdd.eval(f, &[false; 6]));
    }

    /// Builds `(x0 ^ x3) | (x1 ^ x4) | (x2 ^ x5)` on a tiny table in a separate
    /// thread and returns the final capacity, or `None` if it did not finish.
    fn build_xor_pairs_with_timeout(config: EngineConfig) -> Option<usize> {
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let bdd = new_bdd(6, config);
            let v: Vec<Lit> = (0..6).map(|i| bdd.ith_var(i)).collect();
            let mut f = Lit::ZERO;
            for i in 0..3 {
                f = bdd.or(f, bdd.xor(v[i], v[i + 3]));
                bdd.inc_ref(f);
            }
            for m in 0..64u32 {
                let a: Vec<bool> = (0..6).map(|i| m >> i & 1 != 0).collect();
                let expected = (0..3).any(|i| a[i] != a[i + 3]);
                assert_eq!(bdd.eval(f, &a), expected);
            }
            assert!(bdd.check_unique());
            let _ = tx.send(bdd.capacity());
        });
        rx.recv_timeout(std::time::Duration::from_secs(10)).ok()
    }

    #[test]
    fn test_refresh_makes_progress_in_every_gc_mode() {
        for mode in [GcMode::OnExhaustion, GcMode::BeforeGrowth, GcMode::Eager] {
            let config = EngineConfig::default()
                .with_node_table_log(3)
                .with_node_table_max_log(12)
                .with_gc_mode(mode);
            let capacity = build_xor_pairs_with_timeout(config);
            assert!(capacity.is_some_and(|c| c > 8), "{:?} did not finish: {:?}", mode, capacity);
        }
    }

    #[test]
    fn test_refresh_with_auto_reorder_makes_progress() {
        for mode in [GcMode::OnExhaustion, GcMode::BeforeGrowth, GcMode::Eager] {
            let config = EngineConfig::default()
                .with_node_table_log(4)
                .with_node_table_max_log(12)
                .with_reorder_threshold(Some(8))
                .with_gc_mode(mode);
            assert!(build_xor_pairs_with_timeout(config).is_some(), "{:?} did not finish", mode);
        }
    }

    #[test]
    fn test_gc_on_exhaustion_reuses_slots() {
        let config = EngineConfig::default()
            .with_node_table_log(4)
            .with_node_table_max_log(4)
            .with_gc_mode(GcMode::OnExhaustion);
        let bdd = new_bdd(4, config);
        let v: Vec<Lit> = (0..4).map(|i| bdd.ith_var(i)).collect();
        // Many short-lived functions in a table that cannot grow.
        for round in 0..20 {
            let f = bdd.and(bdd.xor(v[round % 4], v[(round + 1) % 4]), v[(round + 2) % 4]);
            assert_eq!(bdd.eval(f, &[true, false, true, false]), {
                let a = [true, false, true, false];
                (a[round % 4] ^ a[(round + 1) % 4]) && a[(round + 2) % 4]
            });
        }
        assert_eq!(bdd.capacity(), 16);
        assert!(bdd.gc_runs() > 0);
        assert!(bdd.check_unique());
    }

    #[test]
    #[should_panic(expected = "Node table is full")]
    fn test_exhaustion_is_fatal() {
        let config = EngineConfig::default().with_node_table_log(3).with_node_table_max_log(3);
        let bdd = new_bdd(6, config);
        let v: Vec<Lit> = (0..6).map(|i| bdd.ith_var(i)).collect();
        let mut f = Lit::ZERO;
        for i in 0..3 {
            f = bdd.or(f, bdd.and(v[i], v[i + 3]));
            bdd.inc_ref(f);
        }
    }
}
