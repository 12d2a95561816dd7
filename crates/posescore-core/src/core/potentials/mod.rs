//! # Potentials Module
//!
//! Pairwise and multi-body potential functions built on the primitives of
//! [`crate::core::geometry`]. Each potential is available as a value-only
//! function and as a `*_with_grad` function returning the value together
//! with analytic gradients on every input point.
//!
//! ## Key Components
//!
//! - [`polynomial`] - Horner polynomials, bounded polynomials and cubic Hermite segments
//! - [`lk_isotropic`] - Lazaridis-Karplus isotropic desolvation with its connectivity weight
//! - [`lk_ball`] - Water-aware LK-ball terms: occlusion fraction, bridging and the four-term pair score
//! - [`hbond`] - Donor-acceptor hydrogen bond geometry score
//! - [`water`] - Placement of water pseudo-atoms on donors and acceptors

pub mod hbond;
pub mod lk_ball;
pub mod lk_isotropic;
pub mod polynomial;
pub mod water;
