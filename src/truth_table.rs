//! Word-table engine.
//!
//! Every function is stored as its full truth table: `max(1, 2^(n-6))` machine
//! words per node, bit `m` holding the value under the assignment whose
//! variable `i` is bit `i` of `m`. There is no hash-consing, so two literals
//! may denote the same function through different nodes and equality is
//! decided by comparing words. There is no variable order to change either,
//! reordering is a no-op.
//!
//! Nodes have no children, so garbage collection simply frees every node
//! without references (except the constant and the variables).

use std::cell::{Cell, RefCell};
use std::fmt::{Debug, Formatter};

use log::{debug, info};
use num_bigint::BigUint;

use crate::config::{ConfigError, EngineConfig, GcMode};
use crate::engine::Engine;
use crate::literal::Lit;

/// Truth tables of the basic variables inside one 64-bit word.
const VAR_WORDS: [u64; 6] = [
    0xAAAA_AAAA_AAAA_AAAA,
    0xCCCC_CCCC_CCCC_CCCC,
    0xF0F0_F0F0_F0F0_F0F0,
    0xFF00_FF00_FF00_FF00,
    0xFFFF_0000_FFFF_0000,
    0xFFFF_FFFF_0000_0000,
];

struct Words {
    data: Vec<u64>,
    refs: Vec<u32>,
    allocated: Vec<bool>,
    free: Vec<u32>,
    capacity: usize,
    live: usize,
}

pub struct TruthTable {
    words: RefCell<Words>,
    num_vars: usize,
    words_per_node: usize,
    mask: u64,
    max_capacity: usize,
    gc_mode: GcMode,
    count_ones: bool,
    verbosity: u32,
    refs_enabled: Cell<bool>,
    gc_runs: Cell<usize>,
}

impl Debug for TruthTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let words = self.words.borrow();
        f.debug_struct("TruthTable")
            .field("num_vars", &self.num_vars)
            .field("words_per_node", &self.words_per_node)
            .field("capacity", &words.capacity)
            .field("live", &words.live)
            .finish()
    }
}

impl TruthTable {
    /// Largest supported number of variables.
    pub const MAX_VARS: usize = 20;

    pub fn words_per_node(&self) -> usize {
        self.words_per_node
    }

    pub fn capacity(&self) -> usize {
        self.words.borrow().capacity
    }

    /// Number of garbage collections run so far.
    pub fn gc_runs(&self) -> usize {
        self.gc_runs.get()
    }

    /// The words of `lit` with its polarity applied.
    pub fn words_of(&self, lit: Lit) -> Vec<u64> {
        let words = self.words.borrow();
        let c = if lit.is_complemented() { self.mask } else { 0 };
        let start = lit.index() as usize * self.words_per_node;
        words.data[start..start + self.words_per_node].iter().map(|w| w ^ c).collect()
    }

    fn alloc(&self, content: &[u64]) -> Option<u32> {
        let mut words = self.words.borrow_mut();
        let index = match words.free.pop() {
            Some(i) => i,
            None if words.allocated.len() < words.capacity => {
                words.allocated.push(false);
                words.refs.push(0);
                let len = words.data.len();
                words.data.resize(len + self.words_per_node, 0);
                (words.allocated.len() - 1) as u32
            }
            None => return None,
        };
        let start = index as usize * self.words_per_node;
        words.data[start..start + self.words_per_node].copy_from_slice(content);
        words.allocated[index as usize] = true;
        words.live += 1;
        Some(index)
    }

    fn grow(&self) -> bool {
        let mut words = self.words.borrow_mut();
        if words.capacity >= self.max_capacity {
            return false;
        }
        words.capacity = (words.capacity * 2).min(self.max_capacity);
        if self.verbosity >= 1 {
            info!("truth table: grown to {} nodes ({} live)", words.capacity, words.live);
        }
        true
    }

    /// Makes room in a full table, same policy as the decision-diagram engine.
    fn refresh(&self) {
        let can_collect = self.refs_enabled.get();
        let capacity = self.capacity();
        let made_room = match self.gc_mode {
            GcMode::OnExhaustion => self.grow() || (can_collect && self.collect_garbage() > 0),
            GcMode::BeforeGrowth => {
                let freed = if can_collect { self.collect_garbage() } else { 0 };
                freed * 4 >= capacity || self.grow() || freed > 0
            }
            GcMode::Eager => {
                let freed = if can_collect { self.collect_garbage() } else { 0 };
                self.grow() || freed > 0
            }
        };
        if !made_room {
            let words = self.words.borrow();
            panic!(
                "Node table is full: {} live truth tables in {} slots, maximum capacity {} reached",
                words.live, words.capacity, self.max_capacity
            );
        }
    }
}

impl Engine for TruthTable {
    const NAME: &'static str = "word-table";

    fn new(num_vars: usize, config: &EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        if num_vars > Self::MAX_VARS {
            return Err(ConfigError::TooManyVariables {
                engine: Self::NAME,
                vars: num_vars,
                max: Self::MAX_VARS,
            });
        }
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
        let words_per_node = if num_vars > 6 { 1 << (num_vars - 6) } else { 1 };
        let mask = if num_vars >= 6 { u64::MAX } else { (1u64 << (1 << num_vars)) - 1 };

        let tt = Self {
            words: RefCell::new(Words {
                data: Vec::new(),
                refs: Vec::new(),
                allocated: Vec::new(),
                free: Vec::new(),
                capacity,
                live: 0,
            }),
            num_vars,
            words_per_node,
            mask,
            max_capacity,
            gc_mode: config.gc_mode,
            count_ones: config.count_ones,
            verbosity: config.verbosity,
            refs_enabled: Cell::new(false),
            gc_runs: Cell::new(0),
        };

        let zero = vec![0u64; words_per_node];
        tt.alloc(&zero);
        {
            // The constant slot is not a live function.
            tt.words.borrow_mut().live = 0;
        }
        for v in 0..num_vars {
            let content: Vec<u64> = (0..words_per_node)
                .map(|w| {
                    if v < 6 {
                        VAR_WORDS[v] & mask
                    } else if (w >> (v - 6)) & 1 != 0 {
                        u64::MAX
                    } else {
                        0
                    }
                })
                .collect();
            tt.alloc(&content);
        }
        debug!("truth table: {} variables, {} words per node", num_vars, words_per_node);
        Ok(tt)
    }

    fn num_vars(&self) -> usize {
        self.num_vars
    }

    fn ith_var(&self, v: usize) -> Lit {
        assert!(v < self.num_vars, "Variable {} out of range", v);
        Lit::new(v as u32 + 1, false)
    }

    fn and(&self, x: Lit, y: Lit) -> Lit {
        if x == Lit::ZERO || y == Lit::ZERO || x == !y {
            return Lit::ZERO;
        }
        if x == Lit::ONE || x == y {
            return y;
        }
        if y == Lit::ONE {
            return x;
        }
        let content: Vec<u64> = {
            let wx = self.words_of(x);
            let wy = self.words_of(y);
            wx.iter().zip(&wy).map(|(a, b)| a & b).collect()
        };
        loop {
            if let Some(index) = self.alloc(&content) {
                return Lit::new(index, false);
            }
            self.inc_ref(x);
            self.inc_ref(y);
            self.refresh();
            self.dec_ref(x);
            self.dec_ref(y);
        }
    }

    fn lit_is_eq(&self, x: Lit, y: Lit) -> bool {
        x == y || self.words_of(x) == self.words_of(y)
    }

    fn inc_ref(&self, x: Lit) {
        if self.refs_enabled.get() && !x.is_const() {
            self.words.borrow_mut().refs[x.index() as usize] += 1;
        }
    }

    fn dec_ref(&self, x: Lit) {
        if self.refs_enabled.get() && !x.is_const() {
            let mut words = self.words.borrow_mut();
            let r = &mut words.refs[x.index() as usize];
            assert!(*r > 0, "Releasing {} which has no references", x);
            *r -= 1;
        }
    }

    fn turn_on_ref(&self) {
        self.refs_enabled.set(true);
    }

    fn one_count(&self, x: Lit) -> BigUint {
        assert!(self.count_ones, "One counting is not enabled for this engine");
        let count: u64 = self.words_of(x).iter().map(|w| w.count_ones() as u64).sum();
        BigUint::from(count)
    }

    fn reorder(&self) {}

    fn turn_off_reorder(&self) {}

    fn live_nodes(&self) -> usize {
        self.words.borrow().live
    }

    fn collect_garbage(&self) -> usize {
        if !self.refs_enabled.get() {
            return 0;
        }
        let mut words = self.words.borrow_mut();
        let mut freed = 0;
        for i in self.num_vars + 1..words.allocated.len() {
            if words.allocated[i] && words.refs[i] == 0 {
                words.allocated[i] = false;
                words.free.push(i as u32);
                words.live -= 1;
                freed += 1;
            }
        }
        let live = words.live;
        drop(words);
        self.gc_runs.set(self.gc_runs.get() + 1);
        if self.verbosity >= 1 {
            info!("truth table: garbage collection freed {} nodes, {} live", freed, live);
        }
        freed
    }

    fn eval(&self, x: Lit, assignment: &[bool]) -> bool {
        let m: usize = assignment[..self.num_vars]
            .iter()
            .enumerate()
            .map(|(i, &b)| (b as usize) << i)
            .sum();
        let words = self.words.borrow();
        let word = words.data[x.index() as usize * self.words_per_node + m / 64];
        ((word >> (m % 64)) & 1 != 0) ^ x.is_complemented()
    }
}
