//! # Core Module
//!
//! Stateless building blocks shared by the batched engine: geometric
//! primitives, potential functions, parameter records and topology lookups.
//!
//! ## Overview
//!
//! Nothing in this module knows about pose stacks or batching. Every
//! function works on a handful of points and parameter records and returns
//! its value, or its value together with hand-derived gradients.
//!
//! ## Architecture
//!
//! - **Geometry** ([`geometry`]) - Distances, angles and dihedrals with analytic gradients
//! - **Potentials** ([`potentials`]) - LK isotropic and LK-ball solvation, hydrogen bonds, water placement
//! - **Parameters** ([`params`]) - Per-atom and global coefficients, loadable from TOML
//! - **Score terms** ([`term`]) - The four LK-ball terms as one additive record
//! - **Topology** ([`topology`]) - Bonded-path separation of atom pairs
//!
//! ## Degenerate Geometry
//!
//! Degeneracy is never reported as an error. Coincident points yield zero
//! distance gradients; colinear dihedral frames propagate non-finite values.

pub mod geometry;
pub mod params;
pub mod potentials;
pub mod term;
pub mod topology;
