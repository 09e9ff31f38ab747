//! Configuration of the function engines and of the network optimizer.
//!
//! Both structs follow the same builder style:
//!
//! ```
//! use transduction_rs::config::{EngineConfig, FaninSort, GcMode, Params};
//!
//! let params = Params::default()
//!     .with_fanin_sort(FaninSort::OneCountBoth)
//!     .with_level_aware(true)
//!     .with_engine_config(EngineConfig::default().with_gc_mode(GcMode::Eager).with_cache_log(12));
//! assert!(params.validate().is_ok());
//! assert!(params.engine_config().count_ones);
//! ```

use std::fmt::{Display, Formatter};

/// When the decision-diagram engine reclaims dead nodes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum GcMode {
    /// Only collect once the node table cannot grow any more.
    OnExhaustion,
    /// Collect before every growth; grow only if less than a quarter of the table was freed.
    #[default]
    BeforeGrowth,
    /// Collect on every refresh, before the first growth and after it, and grow every time.
    Eager,
}

impl GcMode {
    /// Maps the numeric mode `0`, `1`, `2` to a variant.
    pub fn from_level(level: u32) -> Option<Self> {
        match level {
            0 => Some(GcMode::OnExhaustion),
            1 => Some(GcMode::BeforeGrowth),
            2 => Some(GcMode::Eager),
            _ => None,
        }
    }
}

/// Construction parameters shared by both [`Engine`][crate::engine::Engine] implementations.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub node_table_log: usize,
    pub node_table_max_log: usize,
    pub gc_mode: GcMode,
    pub cache_log: usize,
    pub cache_max_log: usize,
    /// Live-node count that triggers sifting when the table is refreshed.
    pub reorder_threshold: Option<usize>,
    pub max_growth: f64,
    pub count_ones: bool,
    pub verbosity: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            node_table_log: 10,
            node_table_max_log: 24,
            gc_mode: GcMode::default(),
            cache_log: 15,
            cache_max_log: 20,
            reorder_threshold: None,
            max_growth: 1.2,
            count_ones: false,
            verbosity: 0,
        }
    }
}

impl EngineConfig {
    pub fn with_node_table_log(mut self, log: usize) -> Self {
        self.node_table_log = log;
        self
    }

    pub fn with_node_table_max_log(mut self, log: usize) -> Self {
        self.node_table_max_log = log;
        self
    }

    pub fn with_gc_mode(mut self, mode: GcMode) -> Self {
        self.gc_mode = mode;
        self
    }

    pub fn with_cache_log(mut self, log: usize) -> Self {
        self.cache_log = log;
        self
    }

    pub fn with_cache_max_log(mut self, log: usize) -> Self {
        self.cache_max_log = log;
        self
    }

    pub fn with_reorder_threshold(mut self, threshold: Option<usize>) -> Self {
        self.reorder_threshold = threshold;
        self
    }

    pub fn with_max_growth(mut self, factor: f64) -> Self {
        self.max_growth = factor;
        self
    }

    pub fn with_count_ones(mut self, on: bool) -> Self {
        self.count_ones = on;
        self
    }

    pub fn with_verbosity(mut self, verbosity: u32) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node_table_max_log > 31 {
            return Err(ConfigError::LogTooLarge {
                what: "node table",
                log: self.node_table_max_log,
            });
        }
        if self.node_table_log > self.node_table_max_log {
            return Err(ConfigError::InitialExceedsMax {
                what: "node table",
                initial: self.node_table_log,
                max: self.node_table_max_log,
            });
        }
        if self.cache_max_log > 31 {
            return Err(ConfigError::LogTooLarge {
                what: "cache",
                log: self.cache_max_log,
            });
        }
        if self.cache_log > self.cache_max_log {
            return Err(ConfigError::InitialExceedsMax {
                what: "cache",
                initial: self.cache_log,
                max: self.cache_max_log,
            });
        }
        if !self.max_growth.is_finite() || self.max_growth < 1.0 {
            return Err(ConfigError::InvalidGrowth(self.max_growth));
        }
        Ok(())
    }
}

/// Which function engine backs the optimizer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum EngineKind {
    #[default]
    DecisionDiagram,
    WordTable,
}

/// Order in which the fanins of a gate are kept.
///
/// Fanins considered more expensive are moved to the front, so they are the
/// first candidates for removal during redundancy checks. Gates always cost
/// more than primary inputs, gates with fewer fanouts cost more, and primary
/// inputs follow their (possibly shuffled) order. The variants only break
/// the remaining ties between gates.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum FaninSort {
    /// No tie-breaking.
    None,
    /// Fanins later in the topological order first.
    #[default]
    Topological,
    /// Fanins whose function has fewer satisfying assignments first.
    OneCountSingle,
    /// Like [`FaninSort::OneCountSingle`] but counting the fanin literal with its wire polarity.
    OneCountBoth,
    /// Compares the complement of one fanin against the other, giving a cheap deterministic shuffle.
    PseudoRandom,
}

impl FaninSort {
    pub fn needs_one_count(self) -> bool {
        matches!(self, FaninSort::OneCountSingle | FaninSort::OneCountBoth | FaninSort::PseudoRandom)
    }
}

/// Parameters of a [`Transduction`][crate::transduction::Transduction] run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Params {
    pub engine: EngineKind,
    pub engine_config: EngineConfig,
    pub fanin_sort: FaninSort,
    pub pi_shuffle_seed: Option<u64>,
    pub level_aware: bool,
    pub verbosity: u32,
}

impl Params {
    pub fn with_engine(mut self, engine: EngineKind) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_engine_config(mut self, config: EngineConfig) -> Self {
        self.engine_config = config;
        self
    }

    pub fn with_fanin_sort(mut self, sort: FaninSort) -> Self {
        self.fanin_sort = sort;
        self
    }

    pub fn with_pi_shuffle_seed(mut self, seed: Option<u64>) -> Self {
        self.pi_shuffle_seed = seed;
        self
    }

    pub fn with_level_aware(mut self, on: bool) -> Self {
        self.level_aware = on;
        self
    }

    pub fn with_verbosity(mut self, verbosity: u32) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine_config.validate()
    }

    /// Engine configuration actually used: one counting is switched on when the fanin sort needs it.
    pub fn engine_config(&self) -> EngineConfig {
        let mut config = self.engine_config.clone();
        if self.fanin_sort.needs_one_count() {
            config.count_ones = true;
        }
        config
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    LogTooLarge {
        what: &'static str,
        log: usize,
    },
    InitialExceedsMax {
        what: &'static str,
        initial: usize,
        max: usize,
    },
    InvalidGrowth(f64),
    TooManyVariables {
        engine: &'static str,
        vars: usize,
        max: usize,
    },
    DontCareMismatch {
        inputs: (usize, usize),
        outputs: (usize, usize),
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::LogTooLarge { what, log } => {
                write!(f, "{} size log {} is larger than 31", what, log)
            }
            ConfigError::InitialExceedsMax { what, initial, max } => {
                write!(f, "initial {} size log {} exceeds maximum {}", what, initial, max)
            }
            ConfigError::InvalidGrowth(factor) => {
                write!(f, "reorder growth factor must be a finite number >= 1, got {}", factor)
            }
            ConfigError::TooManyVariables { engine, vars, max } => {
                write!(f, "{} engine supports at most {} variables, got {}", engine, max, vars)
            }
            ConfigError::DontCareMismatch { inputs, outputs } => {
                write!(
                    f,
                    "don't-care network has {} inputs and {} outputs, expected {} and {}",
                    inputs.1, outputs.1, inputs.0, outputs.0
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}
