//! Donor-acceptor hydrogen bond geometry score.
//!
//! The score is the sum of three bounded-polynomial terms: the
//! acceptor-hydrogen distance, the A-H-D angle, and a base-angle term whose
//! form depends on the acceptor hybridization. Positive sums are clamped to
//! zero and the result is scaled by the pair weights.

use super::polynomial::{ScalarGrad, bound_poly, bound_poly_with_grad};
use crate::core::geometry::{
    PairGrad, Real, TripleGrad, dihedral_angle, dihedral_angle_with_grad, distance,
    distance_with_grad, point_cos_interior_angle, point_cos_interior_angle_with_grad,
    point_interior_angle, point_interior_angle_with_grad, real,
};
use crate::core::params::{AcceptorClass, HBondGlobalParams, HBondPairParams, HBondPolynomial};
use nalgebra::{Point3, Vector3};

impl<T: Real> HBondPolynomial<T> {
    #[inline]
    pub fn eval(&self, x: T) -> T {
        bound_poly(x, &self.coeffs, &self.range, &self.bound)
    }

    #[inline]
    pub fn eval_with_grad(&self, x: T) -> ScalarGrad<T> {
        bound_poly_with_grad(x, &self.coeffs, &self.range, &self.bound)
    }
}

/// The five atoms of a hydrogen bond: donor, hydrogen, acceptor, and the
/// acceptor's base atom `b` with its own base `b0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HBondAtoms<T: Real> {
    pub d: Point3<T>,
    pub h: Point3<T>,
    pub a: Point3<T>,
    pub b: Point3<T>,
    pub b0: Point3<T>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HBondGrad<T: Real> {
    pub value: T,
    pub d_d: Vector3<T>,
    pub d_h: Vector3<T>,
    pub d_a: Vector3<T>,
    pub d_b: Vector3<T>,
    pub d_b0: Vector3<T>,
}

impl<T: Real> HBondGrad<T> {
    fn zero() -> Self {
        Self {
            value: real(0.0),
            d_d: Vector3::zeros(),
            d_h: Vector3::zeros(),
            d_a: Vector3::zeros(),
            d_b: Vector3::zeros(),
            d_b0: Vector3::zeros(),
        }
    }
}

/// Distance term.
#[inline]
pub fn ah_dist<T: Real>(a: &Point3<T>, h: &Point3<T>, poly: &HBondPolynomial<T>) -> T {
    poly.eval(distance(a, h))
}

/// Gradients are with respect to `a` then `h`.
pub fn ah_dist_with_grad<T: Real>(
    a: &Point3<T>,
    h: &Point3<T>,
    poly: &HBondPolynomial<T>,
) -> PairGrad<T> {
    let dist = distance_with_grad(a, h);
    let energy = poly.eval_with_grad(dist.value);
    PairGrad {
        value: energy.value,
        d_a: dist.d_a * energy.d_x,
        d_b: dist.d_b * energy.d_x,
    }
}

/// A-H-D angle term, evaluated on the angle at `h` in radians.
#[inline]
pub fn ahd_angle<T: Real>(
    a: &Point3<T>,
    h: &Point3<T>,
    d: &Point3<T>,
    poly: &HBondPolynomial<T>,
) -> T {
    poly.eval(point_interior_angle(a, h, d))
}

pub fn ahd_angle_with_grad<T: Real>(
    a: &Point3<T>,
    h: &Point3<T>,
    d: &Point3<T>,
    poly: &HBondPolynomial<T>,
) -> TripleGrad<T> {
    let angle = point_interior_angle_with_grad(a, h, d);
    let energy = poly.eval_with_grad(angle.value);
    TripleGrad {
        value: energy.value,
        d_a: angle.d_a * energy.d_x,
        d_b: angle.d_b * energy.d_x,
        d_c: angle.d_c * energy.d_x,
    }
}

/// Value of the sp2 base-angle energy and its partials in the B-A-H angle
/// and the B0-B-A-H torsion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sp2ChiGrad<T: Real> {
    pub value: T,
    pub d_bah: T,
    pub d_chi: T,
}

/// Weight of the in-plane profile at torsion `chi`.
#[inline]
fn sp2_blend<T: Real>(chi: T) -> T {
    let half = real::<T>(0.5);
    (chi * real::<T>(2.0)).cos() * half + half
}

/// Phase of the outer window at `bah`.
#[inline]
fn sp2_outer_phase<T: Real>(bah: T, globals: &HBondGlobalParams<T>) -> T {
    T::pi() - (T::pi() * real::<T>(2.0 / 3.0) - bah) / globals.hb_sp2_outer_width
}

/// In-plane and out-of-plane profiles of the B-A-H angle.
fn sp2_profiles<T: Real>(bah: T, globals: &HBondGlobalParams<T>) -> (T, T) {
    let pi = T::pi();
    let half = real::<T>(0.5);
    let rise = globals.hb_sp2_bah180_rise;
    let span = globals.hb_sp2_range_span;

    if bah > pi * real::<T>(2.0 / 3.0) {
        let phase = (pi - bah) * real::<T>(3.0);
        (rise * half * phase.cos() + rise * half - half, rise - half)
    } else if bah >= pi * (real::<T>(2.0 / 3.0) - globals.hb_sp2_outer_width) {
        let outer_cos = sp2_outer_phase(bah, globals).cos();
        let far = span - rise;
        (
            span * half * outer_cos + span * half - half,
            far * half * outer_cos + far * half + rise - half,
        )
    } else {
        (span - half, span - half)
    }
}

/// Derivatives of [`sp2_profiles`] in `bah`.
fn sp2_profile_slopes<T: Real>(bah: T, globals: &HBondGlobalParams<T>) -> (T, T) {
    let pi = T::pi();
    let half = real::<T>(0.5);
    let rise = globals.hb_sp2_bah180_rise;
    let span = globals.hb_sp2_range_span;
    let outer = globals.hb_sp2_outer_width;

    if bah > pi * real::<T>(2.0 / 3.0) {
        let phase = (pi - bah) * real::<T>(3.0);
        (real::<T>(1.5) * rise * phase.sin(), real(0.0))
    } else if bah >= pi * (real::<T>(2.0 / 3.0) - outer) {
        let d_outer_cos = -sp2_outer_phase(bah, globals).sin() / outer;
        (span * half * d_outer_cos, (span - rise) * half * d_outer_cos)
    } else {
        (real(0.0), real(0.0))
    }
}

/// Base-angle energy of an sp2 acceptor.
///
/// Blends an in-plane (`chi` = 0 or pi) and an out-of-plane profile of the
/// B-A-H angle. Both profiles are flat at `hb_sp2_range_span - 0.5` below the
/// outer window and rise by `hb_sp2_bah180_rise` towards a linear B-A-H.
pub fn sp2chi_energy<T: Real>(bah: T, chi: T, globals: &HBondGlobalParams<T>) -> T {
    let (f, g) = sp2_profiles(bah, globals);
    let blend = sp2_blend(chi);
    blend * f + (real::<T>(1.0) - blend) * g
}

pub fn sp2chi_energy_with_grad<T: Real>(
    bah: T,
    chi: T,
    globals: &HBondGlobalParams<T>,
) -> Sp2ChiGrad<T> {
    let (f, g) = sp2_profiles(bah, globals);
    let (d_f, d_g) = sp2_profile_slopes(bah, globals);
    let blend = sp2_blend(chi);
    let d_blend = -(chi * real::<T>(2.0)).sin();

    Sp2ChiGrad {
        value: blend * f + (real::<T>(1.0) - blend) * g,
        d_bah: blend * d_f + (real::<T>(1.0) - blend) * d_g,
        d_chi: d_blend * (f - g),
    }
}

/// Base-angle term value with gradients on `b`, `b0`, `a` and `h`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BahGrad<T: Real> {
    pub value: T,
    pub d_b: Vector3<T>,
    pub d_b0: Vector3<T>,
    pub d_a: Vector3<T>,
    pub d_h: Vector3<T>,
}

#[inline]
fn cos_bah<T: Real>(base: &Point3<T>, a: &Point3<T>, h: &Point3<T>, poly: &HBondPolynomial<T>) -> T {
    poly.eval(point_cos_interior_angle(base, a, h))
}

fn cos_bah_with_grad<T: Real>(
    base: &Point3<T>,
    a: &Point3<T>,
    h: &Point3<T>,
    poly: &HBondPolynomial<T>,
) -> TripleGrad<T> {
    let cos = point_cos_interior_angle_with_grad(base, a, h);
    let energy = poly.eval_with_grad(cos.value);
    TripleGrad {
        value: energy.value,
        d_a: cos.d_a * energy.d_x,
        d_b: cos.d_b * energy.d_x,
        d_c: cos.d_c * energy.d_x,
    }
}

/// Soft maximum of `u` and `v` with sharpness `fade`.
///
/// Returns the value and the exponentials of both inputs after shifting by
/// the larger one, so the sum cannot overflow.
fn soft_max<T: Real>(u: T, v: T, fade: T) -> (T, T, T) {
    let top = (u * fade).max(v * fade);
    let e_u = (u * fade - top).exp();
    let e_v = (v * fade - top).exp();
    (((e_u + e_v).ln() + top) / fade, e_u, e_v)
}

#[inline]
fn ring_midpoint<T: Real>(b: &Point3<T>, b0: &Point3<T>) -> Point3<T> {
    Point3::from((b.coords + b0.coords) * real::<T>(0.5))
}

pub fn bah_angle<T: Real>(
    b: &Point3<T>,
    b0: &Point3<T>,
    a: &Point3<T>,
    h: &Point3<T>,
    acceptor_class: AcceptorClass,
    cos_bah_poly: &HBondPolynomial<T>,
    globals: &HBondGlobalParams<T>,
) -> T {
    match acceptor_class {
        AcceptorClass::Sp2 => sp2chi_energy(
            point_interior_angle(b, a, h),
            dihedral_angle(b0, b, a, h),
            globals,
        ),
        AcceptorClass::Sp3 => {
            let via_b = cos_bah(b, a, h, cos_bah_poly);
            let via_b0 = cos_bah(b0, a, h, cos_bah_poly);
            soft_max(via_b, via_b0, globals.hb_sp3_softmax_fade).0
        }
        AcceptorClass::Ring => cos_bah(&ring_midpoint(b, b0), a, h, cos_bah_poly),
    }
}

pub fn bah_angle_with_grad<T: Real>(
    b: &Point3<T>,
    b0: &Point3<T>,
    a: &Point3<T>,
    h: &Point3<T>,
    acceptor_class: AcceptorClass,
    cos_bah_poly: &HBondPolynomial<T>,
    globals: &HBondGlobalParams<T>,
) -> BahGrad<T> {
    match acceptor_class {
        AcceptorClass::Sp2 => {
            let angle = point_interior_angle_with_grad(b, a, h);
            let chi = dihedral_angle_with_grad(b0, b, a, h);
            let energy = sp2chi_energy_with_grad(angle.value, chi.value, globals);
            BahGrad {
                value: energy.value,
                d_b: angle.d_a * energy.d_bah + chi.d_j * energy.d_chi,
                d_b0: chi.d_i * energy.d_chi,
                d_a: angle.d_b * energy.d_bah + chi.d_k * energy.d_chi,
                d_h: angle.d_c * energy.d_bah + chi.d_l * energy.d_chi,
            }
        }
        AcceptorClass::Sp3 => {
            let via_b = cos_bah_with_grad(b, a, h, cos_bah_poly);
            let via_b0 = cos_bah_with_grad(b0, a, h, cos_bah_poly);
            let (value, e_b, e_b0) = soft_max(via_b.value, via_b0.value, globals.hb_sp3_softmax_fade);
            let sum = e_b + e_b0;
            let w_b = e_b / sum;
            let w_b0 = e_b0 / sum;

            BahGrad {
                value,
                d_b: via_b.d_a * w_b,
                d_b0: via_b0.d_a * w_b0,
                d_a: via_b.d_b * w_b + via_b0.d_b * w_b0,
                d_h: via_b.d_c * w_b + via_b0.d_c * w_b0,
            }
        }
        AcceptorClass::Ring => {
            let half = real::<T>(0.5);
            let energy = cos_bah_with_grad(&ring_midpoint(b, b0), a, h, cos_bah_poly);
            BahGrad {
                value: energy.value,
                d_b: energy.d_a * half,
                d_b0: energy.d_a * half,
                d_a: energy.d_b,
                d_h: energy.d_c,
            }
        }
    }
}

/// Full hydrogen bond score of one donor-acceptor pair.
///
/// Zero whenever the unweighted sum of the three terms is not negative.
pub fn hbond_score<T: Real>(
    atoms: &HBondAtoms<T>,
    pair: &HBondPairParams<T>,
    globals: &HBondGlobalParams<T>,
) -> T {
    let raw = ah_dist(&atoms.a, &atoms.h, &pair.ah_dist)
        + ahd_angle(&atoms.a, &atoms.h, &atoms.d, &pair.ahd)
        + bah_angle(
            &atoms.b,
            &atoms.b0,
            &atoms.a,
            &atoms.h,
            pair.acceptor_class,
            &pair.cos_bah,
            globals,
        );
    if raw >= real(0.0) {
        return real(0.0);
    }
    raw * (pair.acceptor_weight * pair.donor_weight)
}

/// [`hbond_score`] with gradients on all five atoms; they are zero
/// wherever the score is clamped.
pub fn hbond_score_with_grad<T: Real>(
    atoms: &HBondAtoms<T>,
    pair: &HBondPairParams<T>,
    globals: &HBondGlobalParams<T>,
) -> HBondGrad<T> {
    let dist = ah_dist_with_grad(&atoms.a, &atoms.h, &pair.ah_dist);
    let ahd = ahd_angle_with_grad(&atoms.a, &atoms.h, &atoms.d, &pair.ahd);
    let bah = bah_angle_with_grad(
        &atoms.b,
        &atoms.b0,
        &atoms.a,
        &atoms.h,
        pair.acceptor_class,
        &pair.cos_bah,
        globals,
    );

    let raw = dist.value + ahd.value + bah.value;
    if raw >= real(0.0) {
        return HBondGrad::zero();
    }

    let weight = pair.acceptor_weight * pair.donor_weight;
    HBondGrad {
        value: raw * weight,
        d_d: ahd.d_c * weight,
        d_h: (dist.d_b + ahd.d_b + bah.d_h) * weight,
        d_a: (dist.d_a + ahd.d_a + bah.d_a) * weight,
        d_b: bah.d_b * weight,
        d_b0: bah.d_b0 * weight,
    }
}
