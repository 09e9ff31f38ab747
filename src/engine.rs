//! The Boolean-function engine contract and the reference-owning [`Func`] handle.
//!
//! An [`Engine`] manages a table of Boolean functions over a fixed number of
//! primary variables and hands out [`Lit`] literals into it. Two engines
//! implement the contract: the decision-diagram engine [`Bdd`][crate::bdd::Bdd]
//! and the word-table engine [`TruthTable`][crate::truth_table::TruthTable].
//!
//! Engines use interior mutability, so every operation takes `&self` and an
//! engine can be shared through an [`Rc`] by all the [`Func`] handles pointing
//! into it.
//!
//! ```
//! use std::rc::Rc;
//! use transduction_rs::bdd::Bdd;
//! use transduction_rs::config::EngineConfig;
//! use transduction_rs::engine::{Engine, Func};
//!
//! let bdd = Rc::new(Bdd::new(2, &EngineConfig::default()).unwrap());
//! bdd.turn_on_ref();
//! let a = Func::var(&bdd, 0);
//! let b = Func::var(&bdd, 1);
//! let f = a.and(&b.not());
//! assert!(f.eval(&[true, false]));
//! assert!(!f.eval(&[true, true]));
//! assert_eq!(f.and(&b), Func::zero(&bdd));
//! ```

use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use num_bigint::BigUint;

use crate::config::{ConfigError, EngineConfig};
use crate::literal::Lit;

pub trait Engine: Sized {
    /// Human-readable engine name used in logs and errors.
    const NAME: &'static str;

    fn new(num_vars: usize, config: &EngineConfig) -> Result<Self, ConfigError>;

    fn num_vars(&self) -> usize;

    fn const0(&self) -> Lit {
        Lit::ZERO
    }

    fn const1(&self) -> Lit {
        Lit::ONE
    }

    fn ith_var(&self, v: usize) -> Lit;

    /// Conjunction of two literals.
    ///
    /// # Panics
    ///
    /// Panics when the node table is exhausted and neither garbage collection
    /// nor growth can make room.
    fn and(&self, x: Lit, y: Lit) -> Lit;

    fn or(&self, x: Lit, y: Lit) -> Lit {
        !self.and(!x, !y)
    }

    fn xor(&self, x: Lit, y: Lit) -> Lit {
        let a = self.and(x, !y);
        self.inc_ref(a);
        let b = self.and(!x, y);
        self.inc_ref(b);
        let r = self.or(a, b);
        self.dec_ref(a);
        self.dec_ref(b);
        r
    }

    fn is_const0(&self, x: Lit) -> bool {
        self.lit_is_eq(x, Lit::ZERO)
    }

    fn is_const1(&self, x: Lit) -> bool {
        self.lit_is_eq(x, Lit::ONE)
    }

    /// Functional equality of two literals.
    fn lit_is_eq(&self, x: Lit, y: Lit) -> bool;

    /// No-op until [`Engine::turn_on_ref`] has been called.
    fn inc_ref(&self, x: Lit);

    /// No-op until [`Engine::turn_on_ref`] has been called.
    fn dec_ref(&self, x: Lit);

    /// Enables reference counting. Nodes with zero references become collectable.
    fn turn_on_ref(&self);

    /// Number of satisfying assignments of `x` over all primary variables.
    ///
    /// # Panics
    ///
    /// Panics unless the engine was built with `count_ones` enabled.
    fn one_count(&self, x: Lit) -> BigUint;

    /// Reorders variables to shrink the table. Literal identities are preserved.
    fn reorder(&self);

    /// Disables automatic reordering triggered by table growth.
    fn turn_off_reorder(&self);

    /// Number of allocated non-constant nodes (live or not yet collected).
    fn live_nodes(&self) -> usize;

    /// Runs a garbage collection pass. Returns the number of reclaimed nodes.
    fn collect_garbage(&self) -> usize;

    fn eval(&self, x: Lit, assignment: &[bool]) -> bool;
}

/// Owning handle to a function inside an engine.
///
/// Holds one reference on the underlying node for as long as it lives:
/// cloning increments the count and dropping decrements it.
pub struct Func<E: Engine> {
    engine: Rc<E>,
    lit: Lit,
}

impl<E: Engine> Func<E> {
    pub fn new(engine: &Rc<E>, lit: Lit) -> Self {
        engine.inc_ref(lit);
        Self {
            engine: Rc::clone(engine),
            lit,
        }
    }

    pub fn zero(engine: &Rc<E>) -> Self {
        Self::new(engine, engine.const0())
    }

    pub fn one(engine: &Rc<E>) -> Self {
        Self::new(engine, engine.const1())
    }

    pub fn var(engine: &Rc<E>, v: usize) -> Self {
        Self::new(engine, engine.ith_var(v))
    }

    pub fn lit(&self) -> Lit {
        self.lit
    }

    pub fn engine(&self) -> &Rc<E> {
        &self.engine
    }

    pub fn and(&self, other: &Func<E>) -> Func<E> {
        let r = self.engine.and(self.lit, other.lit);
        Func::new(&self.engine, r)
    }

    pub fn or(&self, other: &Func<E>) -> Func<E> {
        let r = self.engine.or(self.lit, other.lit);
        Func::new(&self.engine, r)
    }

    pub fn xor(&self, other: &Func<E>) -> Func<E> {
        let r = self.engine.xor(self.lit, other.lit);
        Func::new(&self.engine, r)
    }

    pub fn not(&self) -> Func<E> {
        Func::new(&self.engine, !self.lit)
    }

    pub fn not_cond(&self, c: bool) -> Func<E> {
        Func::new(&self.engine, self.lit.not_cond(c))
    }

    pub fn is_const0(&self) -> bool {
        self.engine.is_const0(self.lit)
    }

    pub fn is_const1(&self) -> bool {
        self.engine.is_const1(self.lit)
    }

    pub fn one_count(&self) -> BigUint {
        self.engine.one_count(self.lit)
    }

    pub fn eval(&self, assignment: &[bool]) -> bool {
        self.engine.eval(self.lit, assignment)
    }
}

impl<E: Engine> Clone for Func<E> {
    fn clone(&self) -> Self {
        Func::new(&self.engine, self.lit)
    }
}

impl<E: Engine> Drop for Func<E> {
    fn drop(&mut self) {
        self.engine.dec_ref(self.lit);
    }
}

impl<E: Engine> PartialEq for Func<E> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.engine, &other.engine) && self.engine.lit_is_eq(self.lit, other.lit)
    }
}

impl<E: Engine> Debug for Func<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Func({})", self.lit)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::bdd::Bdd;
    use crate::truth_table::TruthTable;

    fn check_algebra<E: Engine>() {
        let e = Rc::new(E::new(3, &EngineConfig::default()).unwrap());
        e.turn_on_ref();
        let a = Func::var(&e, 0);
        let b = Func::var(&e, 1);
        let c = Func::var(&e, 2);
        let pool = [
            Func::zero(&e),
            Func::one(&e),
            a.clone(),
            b.not(),
            a.and(&b),
            a.or(&c),
            b.xor(&c),
            a.and(&b).or(&c.not()),
        ];
        let one = Func::one(&e);
        let zero = Func::zero(&e);
        for x in &pool {
            assert_eq!(x.and(x), *x);
            assert_eq!(x.and(&x.not()), zero);
            assert_eq!(one.and(x), *x);
            assert_eq!(x.or(&x.not()), one);
            for y in &pool {
                assert_eq!(x.and(y), y.and(x));
                for z in &pool {
                    assert_eq!(x.and(y).and(z), x.and(&y.and(z)));
                }
            }
        }
    }

    #[test]
    fn test_and_algebra_bdd() {
        check_algebra::<Bdd>();
    }

    #[test]
    fn test_and_algebra_truth_table() {
        check_algebra::<TruthTable>();
    }

    #[test]
    fn test_func_refcount() {
        let e = Rc::new(Bdd::new(2, &EngineConfig::default()).unwrap());
        e.turn_on_ref();
        let f = Func::var(&e, 0).and(&Func::var(&e, 1));
        let idx = f.lit().index();
        assert_eq!(e.ref_count(f.lit()), 1);
        let g = f.clone();
        assert_eq!(e.ref_count(f.lit()), 2);
        drop(f);
        assert_eq!(e.ref_count(g.lit()), 1);
        drop(g);
        assert_eq!(e.ref_count(Lit::new(idx, false)), 0);
    }
}
