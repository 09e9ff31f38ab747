//! # transduction-rs: don't-care based optimization of AND networks
//!
//! **`transduction-rs`** minimizes multi-level logic networks given as AND-inverter graphs.
//! It removes and re-adds wires using *permissible functions*: the sets of input assignments
//! under which a gate's value does not matter to any output.
//!
//! ## How it works
//!
//! The network is imported into multi-input AND gates. Every gate keeps its function as a
//! handle into a symbolic engine, which is either a decision diagram manager or a table of
//! packed truth tables. On top of these functions the optimizer computes permissible functions
//! and uses them to:
//!
//! - remove wires whose absence cannot be observed at any output (CSPF and MSPF passes),
//! - add wires from other gates that make existing logic redundant (resubstitution),
//! - merge chains of gates and extract shared fanins into common gates.
//!
//! Every optimization reports the signed change of the wire count.
//!
//! ## Basic Usage
//!
//! ```rust
//! use transduction_rs::aig::Aig;
//! use transduction_rs::config::Params;
//! use transduction_rs::transduction::{transduce, Strategy};
//!
//! // o1 = a & b, o2 = (a & c) & b
//! let mut aig = Aig::new(3);
//! let (a, b, c) = (aig.input(0), aig.input(1), aig.input(2));
//! let g1 = aig.and(a, b);
//! let g2 = aig.and(a, c);
//! let g3 = aig.and(g2, b);
//! aig.add_output(g1);
//! aig.add_output(g3);
//!
//! // o2 can reuse o1: o2 = o1 & c
//! let (optimized, delta) = transduce(&aig, None, &Params::default(), Strategy::Resub { mspf: false }).unwrap();
//! assert_eq!(delta, -2);
//! assert_eq!(optimized.num_ands(), 2);
//! ```
//!
//! ## Core Components
//!
//! - **[`transduction`]**: The optimizer itself, see [`Transduction`][crate::transduction::Transduction].
//! - **[`engine`]**: The [`Engine`][crate::engine::Engine] interface and reference-counted [`Func`][crate::engine::Func] handles.
//! - **[`bdd`]**: Decision diagram engine with complemented edges, garbage collection and sifting.
//! - **[`truth_table`]**: Engine storing every function as a full truth table.
//! - **[`aig`]**: Minimal AND-inverter graph used for input and output.
//! - **[`config`]**: Engine and optimizer parameters.

pub mod aig;
pub mod bdd;
pub mod bitset;
pub mod cache;
pub mod config;
pub mod engine;
pub mod literal;
pub mod node;
pub mod reorder;
pub mod signal;
pub mod subtable;
pub mod transduction;
pub mod truth_table;
pub mod types;
pub mod utils;
