//! Execution strategies for the batched kernels.
//!
//! Kernels express their work as independent units over an index range and
//! never share mutable state: [`Executor::map`] collects one result per unit
//! in index order, and [`Executor::fold_reduce`] folds units into private
//! accumulators that are then merged pairwise.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub trait Executor: Sync {
    /// Evaluates `f` on every index in `0..len`, returning results in index order.
    fn map<R, F>(&self, len: usize, f: F) -> Vec<R>
    where
        R: Send,
        F: Fn(usize) -> R + Sync + Send;

    /// Folds every index in `0..len` into accumulators created by `identity`
    /// and merges them with `reduce`. The grouping of indices is unspecified.
    fn fold_reduce<A, I, F, G>(&self, len: usize, identity: I, fold: F, reduce: G) -> A
    where
        A: Send,
        I: Fn() -> A + Sync + Send,
        F: Fn(A, usize) -> A + Sync + Send,
        G: Fn(A, A) -> A + Sync + Send;
}

/// Runs every unit on the calling thread, in index order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialExecutor;

impl Executor for SerialExecutor {
    fn map<R, F>(&self, len: usize, f: F) -> Vec<R>
    where
        R: Send,
        F: Fn(usize) -> R + Sync + Send,
    {
        (0..len).map(f).collect()
    }

    fn fold_reduce<A, I, F, G>(&self, len: usize, identity: I, fold: F, _reduce: G) -> A
    where
        A: Send,
        I: Fn() -> A + Sync + Send,
        F: Fn(A, usize) -> A + Sync + Send,
        G: Fn(A, A) -> A + Sync + Send,
    {
        (0..len).fold(identity(), fold)
    }
}

/// Spreads units over the current rayon thread pool.
#[cfg(feature = "parallel")]
#[derive(Debug, Clone, Copy, Default)]
pub struct RayonExecutor;

#[cfg(feature = "parallel")]
impl Executor for RayonExecutor {
    fn map<R, F>(&self, len: usize, f: F) -> Vec<R>
    where
        R: Send,
        F: Fn(usize) -> R + Sync + Send,
    {
        (0..len).into_par_iter().map(f).collect()
    }

    fn fold_reduce<A, I, F, G>(&self, len: usize, identity: I, fold: F, reduce: G) -> A
    where
        A: Send,
        I: Fn() -> A + Sync + Send,
        F: Fn(A, usize) -> A + Sync + Send,
        G: Fn(A, A) -> A + Sync + Send,
    {
        (0..len)
            .into_par_iter()
            .fold(&identity, &fold)
            .reduce(&identity, &reduce)
    }
}

#[cfg(feature = "parallel")]
pub type DefaultExecutor = RayonExecutor;

#[cfg(not(feature = "parallel"))]
pub type DefaultExecutor = SerialExecutor;
