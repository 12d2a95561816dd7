//! # Workflows Module
//!
//! High-level entry points that validate a batch, run the dispatchers and
//! package their outputs for callers.
//!
//! ## Overview
//!
//! A workflow takes borrowed inputs plus [`crate::core::params::ScoreParams`]
//! and returns an owned report. Callers that need a specific execution
//! strategy use the `run_with` variants; `run` picks the default executor.
//!
//! - **Scoring Workflow** ([`score`]) - LK-ball energies per pose, the
//!   block-pair log and, on request, coordinate and water gradients.
//! - **Hydrogen Bond Workflow** ([`hbond`]) - scores of explicit
//!   donor-acceptor pairs under the `hbond` globals, with optional gradients.

pub mod hbond;
pub mod score;
