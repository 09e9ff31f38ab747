//! Dynamic variable reordering for the decision-diagram engine.
//!
//! # Adjacent-level swap
//!
//! Exchanging the variables `x` (level `l`) and `y` (level `l + 1`) only
//! touches nodes labelled `x`:
//!
//! - an `x` node whose children do not test `y` keeps its handle and children,
//!   it simply ends up one level lower;
//! - an `x` node `f = x ? f1 : f0` with a `y` child is rewritten in place into
//!   `f = y ? (x ? f11 : f01) : (x ? f10 : f00)`, where `fij` are the cofactors
//!   of `fi` with respect to `y`.
//!
//! Rewriting in place keeps every handle pointing to the same function, so
//! literals held by callers stay valid across a reorder. Old `y` nodes that
//! lose their last parent are freed immediately. To know when that happens,
//! the sifter keeps an internal reference count per node: parent edges plus
//! external references plus a pin for every variable node.
//!
//! # Sifting
//!
//! Each variable, in decreasing order of the size of its unique subtable, is
//! moved one level at a time towards the closer end of the order, then all
//! the way to the other end, and finally back to the level where the total
//! node count was smallest. The first level reaching the minimum wins. An
//! exploration in one direction stops as soon as the node count exceeds the
//! count at the start of this variable times `max_growth`.
//!
//! The operator cache is cleared after reordering, since freed slots may be
//! reused by later allocations.

use std::cell::RefMut;
use std::fmt::{Display, Formatter};

use log::debug;

use crate::bdd::{Bdd, NodeTable};
use crate::engine::Engine;
use crate::literal::Lit;
use crate::node::Node;

/// Statistics of a sifting run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReorderStats {
    pub swaps: usize,
    pub initial_size: usize,
    pub final_size: usize,
    pub variables_processed: usize,
}

impl Display for ReorderStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "sifting: {} -> {} nodes, {} variables, {} swaps",
            self.initial_size, self.final_size, self.variables_processed, self.swaps
        )
    }
}

struct Sifter<'a> {
    table: RefMut<'a, NodeTable>,
    irefs: Vec<u32>,
    max_capacity: usize,
    swaps: usize,
}

impl<'a> Sifter<'a> {
    fn new(table: RefMut<'a, NodeTable>, max_capacity: usize) -> Self {
        let mut irefs = table.refs.clone();
        for v in 1..=table.num_vars() {
            irefs[v] += 1;
        }
        for i in 1..table.nodes.len() {
            let node = table.nodes[i];
            if node.is_free() {
                continue;
            }
            irefs[node.then.index() as usize] += 1;
            irefs[node.els.index() as usize] += 1;
        }
        // The constant node is never counted.
        irefs[0] = 0;
        Self {
            table,
            irefs,
            max_capacity,
            swaps: 0,
        }
    }

    fn inc(&mut self, lit: Lit) {
        if !lit.is_const() {
            self.irefs[lit.index() as usize] += 1;
        }
    }

    fn dec(&mut self, lit: Lit) {
        if lit.is_const() {
            return;
        }
        let index = lit.index() as usize;
        debug_assert!(self.irefs[index] > 0, "Node {} is already dead", index);
        self.irefs[index] -= 1;
        if self.irefs[index] == 0 {
            let node = self.table.node(index as u32);
            self.table.release(index as u32);
            self.dec(node.then);
            self.dec(node.els);
        }
    }

    fn alloc(&mut self, var: u32, then: Lit, els: Lit) -> u32 {
        loop {
            if let Some(index) = self.table.alloc(var, then, els) {
                if self.irefs.len() < self.table.nodes.len() {
                    self.irefs.resize(self.table.nodes.len(), 0);
                }
                self.irefs[index as usize] = 0;
                return index;
            }
            if self.table.capacity >= self.max_capacity {
                panic!(
                    "Node table is full during reordering: {} live nodes, maximum capacity {} reached",
                    self.table.live, self.max_capacity
                );
            }
            self.table.capacity = (self.table.capacity * 2).min(self.max_capacity);
        }
    }

    /// Like [`NodeTable::unique`], but keeps the internal counts of the children of new nodes.
    fn unique(&mut self, var: u32, then: Lit, els: Lit) -> Lit {
        if then == els {
            return then;
        }
        let c = els.is_complemented();
        let (then, els) = (then.not_cond(c), els.not_cond(c));
        let index = match self.table.subtables[var as usize].find(then, els) {
            Some(i) => i,
            None => {
                let i = self.alloc(var, then, els);
                self.inc(then);
                self.inc(els);
                i
            }
        };
        Lit::new(index, c)
    }

    fn tests_var(&self, lit: Lit, var: u32) -> bool {
        !lit.is_const() && self.table.node(lit.index()).var == var
    }

    /// Exchanges the variables at `level` and `level + 1`.
    fn swap(&mut self, level: usize) {
        let x = self.table.level2var[level];
        let y = self.table.level2var[level + 1];

        let xs: Vec<u32> = self.table.subtables[x as usize].indices().collect();
        for f in xs {
            let Node { then: f1, els: f0, .. } = self.table.node(f);
            if !self.tests_var(f1, y) && !self.tests_var(f0, y) {
                continue;
            }
            self.table.subtables[x as usize].remove(f1, f0);

            let (f11, f10) = self.table.cofactors(f1, y);
            let (f01, f00) = self.table.cofactors(f0, y);
            let g1 = self.unique(x, f11, f01);
            self.inc(g1);
            let g0 = self.unique(x, f10, f00);
            self.inc(g0);
            debug_assert!(!g0.is_complemented());
            debug_assert_ne!(g1, g0);

            self.table.nodes[f as usize] = Node::new(y, g1, g0);
            self.table.subtables[y as usize].insert(g1, g0, f);

            self.dec(f1);
            self.dec(f0);
        }

        self.table.level2var[level] = y;
        self.table.level2var[level + 1] = x;
        self.table.var2level[y as usize] = level;
        self.table.var2level[x as usize] = level + 1;
        self.swaps += 1;
    }

    fn step(&mut self, level: &mut usize, up: bool) {
        if up {
            self.swap(*level - 1);
            *level -= 1;
        } else {
            self.swap(*level);
            *level += 1;
        }
    }

    fn sift(&mut self, var: u32, max_growth: f64) {
        let n = self.table.num_vars();
        let start = self.table.var2level[var as usize];
        let start_size = self.table.live;
        let limit = (start_size as f64 * max_growth) as usize;

        let mut best_size = start_size;
        let mut best_level = start;
        let mut level = start;

        let up_first = start < n - 1 - start;
        let directions = if up_first { [true, false] } else { [false, true] };
        for up in directions {
            while (up && level > 0) || (!up && level < n - 1) {
                self.step(&mut level, up);
                let size = self.table.live;
                if size < best_size {
                    best_size = size;
                    best_level = level;
                }
                if size > limit {
                    break;
                }
            }
        }
        while level > best_level {
            self.step(&mut level, true);
        }
        while level < best_level {
            self.step(&mut level, false);
        }
        debug!(
            "sift: x{} moved from level {} to {}, {} -> {} nodes",
            var, start, best_level, start_size, self.table.live
        );
    }
}

impl Bdd {
    /// Number of distinct non-constant nodes reachable from `roots`.
    pub fn count_nodes(&self, roots: &[Lit]) -> usize {
        let table = self.table.borrow();
        let mut visited = crate::bitset::BitSet::new(table.nodes.len());
        let mut stack: Vec<u32> = roots.iter().map(|r| r.index()).collect();
        while let Some(i) = stack.pop() {
            if i == 0 || !visited.insert(i as usize) {
                continue;
            }
            let node = table.node(i);
            stack.push(node.then.index());
            stack.push(node.els.index());
        }
        visited.len()
    }

    fn sifter(&self) -> Sifter<'_> {
        self.collect_garbage();
        Sifter::new(self.table.borrow_mut(), self.max_capacity)
    }

    /// Exchanges the variables at `level` and `level + 1`.
    ///
    /// Unreferenced nodes are collected first. Every referenced literal keeps its function.
    pub fn swap_levels(&self, level: usize) {
        assert!(level + 1 < self.num_vars(), "Cannot swap level {} with the one below it", level);
        self.sifter().swap(level);
        self.cache.borrow_mut().clear();
    }

    /// Sifts a single variable to its best level.
    pub fn sift_variable(&self, var: u32) {
        if self.num_vars() < 2 {
            return;
        }
        self.sifter().sift(var, self.max_growth);
        self.cache.borrow_mut().clear();
    }

    /// Sifts every variable, largest subtables first.
    pub fn sift_all_variables(&self) -> ReorderStats {
        let mut sifter = self.sifter();
        let initial_size = sifter.table.live;
        let n = sifter.table.num_vars();

        let mut stats = ReorderStats {
            initial_size,
            final_size: initial_size,
            ..Default::default()
        };
        if n >= 2 {
            let mut order: Vec<u32> = (0..n as u32).collect();
            order.sort_by_key(|&v| std::cmp::Reverse(sifter.table.subtables[v as usize].len()));
            for var in order {
                sifter.sift(var, self.max_growth);
                stats.variables_processed += 1;
            }
        }
        stats.swaps = sifter.swaps;
        stats.final_size = sifter.table.live;
        drop(sifter);

        self.cache.borrow_mut().clear();
        debug!("{}", stats);
        stats
    }
}
