//! # Topology Module
//!
//! Bonded-path annotation of atom pairs within a pose.
//!
//! ## Overview
//!
//! Potentials that exclude or down-weight closely bonded atoms need the
//! number of bonds separating two atoms. Chemical topology is precomputed
//! upstream into a coarse block-to-block table, an intra-block path-distance
//! matrix per block type, and an exact connection-to-connection tensor. This
//! module combines them into per-atom-pair separations.
//!
//! ## Key Components
//!
//! - [`bond_separation`] - The [`BondSeparation`](bond_separation::BondSeparation) selector
//!   and the crossover constant [`MAX_IMPORTANT_BOND_SEPARATION`](bond_separation::MAX_IMPORTANT_BOND_SEPARATION)

pub mod bond_separation;
