//! # Engine Module
//!
//! Batched evaluation of the LK-ball potential over stacks of poses.
//!
//! ## Overview
//!
//! A batch is described by borrowed `ndarray` views: per-pose geometry and
//! connectivity ([`pose_stack::PoseStackView`]) and per-block-type tables
//! ([`pose_stack::BlockTypeTables`]). Every entry point validates these
//! views before computing anything and reports violations as
//! [`error::DispatchError`].
//!
//! ## Architecture
//!
//! - **Execution** ([`executor`]) - Serial and rayon-backed strategies for independent work units
//! - **Inputs** ([`pose_stack`]) - Batch views, shape and topology validation
//! - **Block screening** ([`neighbors`]) - Bounding spheres and the interacting-pair log
//! - **Dispatch** ([`lk_ball`]) - Forward energies and backward gradient replay
//! - **Error Handling** ([`error`]) - Precondition violations of batched calls
//!
//! ## Concurrency
//!
//! Work units never write shared state. Forward units return partial sums
//! that are combined in a fixed order; backward units fold into private
//! per-pose gradient buffers that are merged pairwise.

pub mod error;
pub mod executor;
pub mod lk_ball;
pub mod neighbors;
pub mod pose_stack;
