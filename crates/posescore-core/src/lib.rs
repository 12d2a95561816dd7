//! # posescore
//!
//! Batched geometric potentials with hand-derived analytic gradients for
//! stacks of molecular poses.
//!
//! ## Layers
//!
//! - **[`core`]: Pure math.** Geometric primitives with their gradients,
//!   the pairwise potentials (isotropic and anisotropic desolvation,
//!   hydrogen bonding, water placement), global parameter records and the
//!   topology-aware bond-separation selector. Nothing here allocates per
//!   call or knows about batches.
//!
//! - **[`engine`]: Batched dispatch.** Shape-checked `ndarray` views of a
//!   pose stack and its block-type tables, block screening, and the
//!   forward and backward LK-ball passes over independent work units run
//!   by an [`engine::executor::Executor`].
//!
//! - **[`workflows`]: The public entry point.** Ties parameters and
//!   dispatch together into a single scoring call.

pub mod core;
pub mod engine;
pub mod workflows;
