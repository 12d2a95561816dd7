//! Lazaridis-Karplus isotropic desolvation of one atom by another.

use super::polynomial::{
    Knot, ScalarGrad, interpolate, interpolate_to_zero, interpolate_to_zero_with_grad,
    interpolate_with_grad,
};
use crate::core::geometry::{Real, real};
use crate::core::params::{LkBallGlobalParams, LkBallTypeParams};

/// pi^(3/2)
const PI_POW_1P5: f64 = 5.568_327_996_831_708;

/// Bond separation above which a pair is fully non-bonded.
pub const FULL_WEIGHT_SEPARATION: i32 = 4;

/// Down-weighting of bonded pairs by their bond separation.
#[inline]
pub fn connectivity_weight<T: Real>(bonded_path_length: i32) -> T {
    if bonded_path_length > FULL_WEIGHT_SEPARATION {
        real(1.0)
    } else if bonded_path_length == FULL_WEIGHT_SEPARATION {
        real(0.2)
    } else {
        real(0.0)
    }
}

/// Contact distance of an atom pair, shortened for hydrogen-bonding pairs.
pub fn lj_sigma<T: Real>(
    i: &LkBallTypeParams<T>,
    j: &LkBallTypeParams<T>,
    globals: &LkBallGlobalParams<T>,
) -> T {
    let heavy_donor_pair = |d: &LkBallTypeParams<T>, a: &LkBallTypeParams<T>| {
        d.is_donor && !d.is_hydroxyl && a.is_acceptor
    };
    let hydroxyl_donor_pair = |d: &LkBallTypeParams<T>, a: &LkBallTypeParams<T>| {
        d.is_donor && d.is_hydroxyl && a.is_acceptor
    };
    let polar_h_pair =
        |h: &LkBallTypeParams<T>, a: &LkBallTypeParams<T>| h.is_polarh && a.is_acceptor;

    if heavy_donor_pair(i, j) || heavy_donor_pair(j, i) {
        globals.lj_hbond_dis
    } else if hydroxyl_donor_pair(i, j) || hydroxyl_donor_pair(j, i) {
        globals.lj_hbond_oh_donor_dis
    } else if polar_h_pair(i, j) || polar_h_pair(j, i) {
        globals.lj_hbond_hdis
    } else {
        i.lj_radius + j.lj_radius
    }
}

/// Gaussian solvent-exclusion of atom `i` by a volume `lk_volume_j` at `dist`.
pub fn f_desolv<T: Real>(
    dist: T,
    lj_radius_i: T,
    lk_dgfree_i: T,
    lk_lambda_i: T,
    lk_volume_j: T,
) -> T {
    let prefactor = -lk_volume_j * lk_dgfree_i
        / (real::<T>(2.0 * PI_POW_1P5) * lk_lambda_i * dist * dist);
    let scaled = (dist - lj_radius_i) / lk_lambda_i;
    prefactor * (-scaled * scaled).exp()
}

pub fn f_desolv_with_grad<T: Real>(
    dist: T,
    lj_radius_i: T,
    lk_dgfree_i: T,
    lk_lambda_i: T,
    lk_volume_j: T,
) -> ScalarGrad<T> {
    let value = f_desolv(dist, lj_radius_i, lk_dgfree_i, lk_lambda_i, lk_volume_j);
    let d_x = value
        * (real::<T>(-2.0) / dist - real::<T>(2.0) * (dist - lj_radius_i) / (lk_lambda_i * lk_lambda_i));
    ScalarGrad { value, d_x }
}

/// Piece of the isotropic curve a distance falls on.
enum Segment<T: Real> {
    /// Constant inside the contact core.
    Flat(T),
    /// Hermite bridge from the core to the raw curve.
    Bridge(Knot<T>, Knot<T>),
    /// The raw desolvation function.
    Raw,
    /// Fade from the knot to zero at the given distance.
    Fade(Knot<T>, T),
}

struct IsotropicSpline<T: Real> {
    d_min: T,
    close_min: T,
    close_max: T,
    far_min: T,
    max_dis: T,
}

impl<T: Real> IsotropicSpline<T> {
    fn new(sigma: T, globals: &LkBallGlobalParams<T>) -> Self {
        let d_min = sigma * globals.lk_min_dis2sigma;
        let d_min2 = d_min * d_min;
        Self {
            d_min,
            close_min: (d_min2 - real(1.5)).max(real(0.0)).sqrt(),
            close_max: (d_min2 + real(1.0)).sqrt(),
            far_min: globals.far_dmin,
            max_dis: globals.max_dis,
        }
    }

    /// Knot values come from `desolv`; the curve itself is not evaluated.
    fn segment(&self, dist: T, desolv: impl Fn(T) -> ScalarGrad<T>) -> Segment<T> {
        if dist < self.close_min {
            Segment::Flat(desolv(self.d_min).value)
        } else if dist < self.close_max {
            let core = desolv(self.d_min);
            let edge = desolv(self.close_max);
            Segment::Bridge(
                Knot::new(self.close_min, core.value, real(0.0)),
                Knot::new(self.close_max, edge.value, edge.d_x),
            )
        } else if dist < self.far_min {
            Segment::Raw
        } else {
            let far = desolv(self.far_min);
            Segment::Fade(Knot::new(self.far_min, far.value, far.d_x), self.max_dis)
        }
    }
}

/// Weighted isotropic desolvation of polar atom `i` by occluder `j`.
///
/// The raw desolvation function is flattened to a constant inside the
/// contact core, bridged to the raw curve with a Hermite spline, and faded
/// to zero between `far_dmin` and `max_dis`.
pub fn lk_isotropic<T: Real>(
    dist: T,
    bonded_path_length: i32,
    i: &LkBallTypeParams<T>,
    j: &LkBallTypeParams<T>,
    globals: &LkBallGlobalParams<T>,
) -> T {
    let weight: T = connectivity_weight(bonded_path_length);
    if weight == real(0.0) || dist >= globals.max_dis {
        return real(0.0);
    }

    let desolv = |d: T| f_desolv_with_grad(d, i.lj_radius, i.lk_dgfree, i.lk_lambda, j.lk_volume);
    let raw = match IsotropicSpline::new(lj_sigma(i, j, globals), globals).segment(dist, &desolv) {
        Segment::Flat(value) => value,
        Segment::Bridge(lo, hi) => interpolate(dist, &lo, &hi),
        Segment::Raw => f_desolv(dist, i.lj_radius, i.lk_dgfree, i.lk_lambda, j.lk_volume),
        Segment::Fade(lo, x_zero) => interpolate_to_zero(dist, &lo, x_zero),
    };
    weight * raw
}

/// [`lk_isotropic`] with its derivative with respect to the distance.
pub fn lk_isotropic_with_grad<T: Real>(
    dist: T,
    bonded_path_length: i32,
    i: &LkBallTypeParams<T>,
    j: &LkBallTypeParams<T>,
    globals: &LkBallGlobalParams<T>,
) -> ScalarGrad<T> {
    let weight: T = connectivity_weight(bonded_path_length);
    if weight == real(0.0) || dist >= globals.max_dis {
        return ScalarGrad::constant(real(0.0));
    }

    let desolv = |d: T| f_desolv_with_grad(d, i.lj_radius, i.lk_dgfree, i.lk_lambda, j.lk_volume);
    let raw = match IsotropicSpline::new(lj_sigma(i, j, globals), globals).segment(dist, &desolv) {
        Segment::Flat(value) => ScalarGrad::constant(value),
        Segment::Bridge(lo, hi) => interpolate_with_grad(dist, &lo, &hi),
        Segment::Raw => desolv(dist),
        Segment::Fade(lo, x_zero) => interpolate_to_zero_with_grad(dist, &lo, x_zero),
    };

    ScalarGrad {
        value: weight * raw.value,
        d_x: weight * raw.d_x,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn polar_params() -> LkBallTypeParams<f64> {
        LkBallTypeParams {
            lj_radius: 1.6,
            lk_dgfree: -6.0,
            lk_lambda: 3.5,
            lk_volume: 14.0,
            is_donor: true,
            is_acceptor: true,
            is_hydroxyl: true,
            is_polarh: false,
        }
    }

    pub(crate) fn carbon_params() -> LkBallTypeParams<f64> {
        LkBallTypeParams {
            lj_radius: 2.0,
            lk_dgfree: 1.0,
            lk_lambda: 3.5,
            lk_volume: 16.7,
            ..Default::default()
        }
    }

    #[test]
    fn connectivity_weight_follows_bond_separation() {
        assert_eq!(connectivity_weight::<f64>(2), 0.0);
        assert_eq!(connectivity_weight::<f64>(3), 0.0);
        assert_eq!(connectivity_weight::<f64>(4), 0.2);
        assert_eq!(connectivity_weight::<f64>(5), 1.0);
    }

    #[test]
    fn lj_sigma_uses_hbond_distances_for_donor_acceptor_pairs() {
        let globals = LkBallGlobalParams::<f64>::default();
        let mut donor = carbon_params();
        donor.is_donor = true;
        let mut acceptor = carbon_params();
        acceptor.is_acceptor = true;
        assert_eq!(lj_sigma(&donor, &acceptor, &globals), globals.lj_hbond_dis);
        assert_eq!(lj_sigma(&acceptor, &donor, &globals), globals.lj_hbond_dis);

        donor.is_hydroxyl = true;
        assert_eq!(lj_sigma(&donor, &acceptor, &globals), globals.lj_hbond_oh_donor_dis);

        let mut polar_h = carbon_params();
        polar_h.is_polarh = true;
        assert_eq!(lj_sigma(&polar_h, &acceptor, &globals), globals.lj_hbond_hdis);

        let carbon = carbon_params();
        assert_eq!(lj_sigma(&carbon, &carbon, &globals), 4.0);
    }

    #[test]
    fn lk_isotropic_is_zero_for_closely_bonded_pairs() {
        let globals = LkBallGlobalParams::<f64>::default();
        let value = lk_isotropic(3.0, 3, &polar_params(), &carbon_params(), &globals);
        assert_eq!(value, 0.0);
    }

    #[test]
    fn lk_isotropic_is_zero_beyond_max_distance() {
        let globals = LkBallGlobalParams::<f64>::default();
        let grad = lk_isotropic_with_grad(6.5, 6, &polar_params(), &carbon_params(), &globals);
        assert_eq!(grad, ScalarGrad::constant(0.0));
    }

    #[test]
    fn lk_isotropic_is_flat_and_finite_at_zero_distance() {
        let globals = LkBallGlobalParams::<f64>::default();
        let grad = lk_isotropic_with_grad(0.0, 6, &polar_params(), &carbon_params(), &globals);
        assert!(grad.value.is_finite());
        assert!(grad.value > 0.0);
        assert_eq!(grad.d_x, 0.0);
    }

    #[test]
    fn lk_isotropic_is_continuous_across_spline_knots() {
        let globals = LkBallGlobalParams::<f64>::default();
        let (i, j) = (polar_params(), carbon_params());
        let spline = IsotropicSpline::new(lj_sigma(&i, &j, &globals), &globals);
        for knot in [spline.close_min, spline.close_max, spline.far_min] {
            let below = lk_isotropic(knot - 1e-9, 6, &i, &j, &globals);
            let above = lk_isotropic(knot + 1e-9, 6, &i, &j, &globals);
            assert!((below - above).abs() < 1e-6, "discontinuity at {knot}");
        }
    }

    #[test]
    fn lk_isotropic_derivative_matches_finite_differences() {
        let globals = LkBallGlobalParams::<f64>::default();
        let (i, j) = (polar_params(), carbon_params());
        let h = 1e-6;
        for dist in [1.5, 2.7, 3.5, 4.0, 5.0, 5.8] {
            let grad = lk_isotropic_with_grad(dist, 5, &i, &j, &globals);
            let numeric = (lk_isotropic(dist + h, 5, &i, &j, &globals)
                - lk_isotropic(dist - h, 5, &i, &j, &globals))
                / (2.0 * h);
            assert!(
                (grad.d_x - numeric).abs() < 1e-6,
                "at {dist}: {} vs {numeric}",
                grad.d_x
            );
        }
    }

    #[test]
    fn f_desolv_equals_the_gaussian_prefactor_on_contact() {
        let (r, dgfree, lambda, volume): (f64, f64, f64, f64) = (1.6, -6.0, 3.5, 14.0);
        let value = f_desolv(r, r, dgfree, lambda, volume);
        let prefactor = -volume * dgfree / (2.0 * PI_POW_1P5 * lambda * r * r);
        assert!((value - prefactor).abs() < 1e-12);

        let h = 1e-6;
        let grad = f_desolv_with_grad(2.4, r, dgfree, lambda, volume);
        let numeric = (f_desolv(2.4 + h, r, dgfree, lambda, volume)
            - f_desolv(2.4 - h, r, dgfree, lambda, volume))
            / (2.0 * h);
        assert!((grad.d_x - numeric).abs() < 1e-7);
    }

    #[test]
    fn value_only_path_matches_the_gradient_path_on_every_segment() {
        let globals = LkBallGlobalParams::<f64>::default();
        let (i, j) = (polar_params(), carbon_params());
        for dist in [0.0, 1.5, 2.7, 3.5, 4.0, 5.0, 5.8, 6.5] {
            for separation in [3, 4, 6] {
                let value = lk_isotropic(dist, separation, &i, &j, &globals);
                let grad = lk_isotropic_with_grad(dist, separation, &i, &j, &globals);
                assert_eq!(value, grad.value, "at {dist}, separation {separation}");
            }
            if dist > 0.0 {
                assert_eq!(
                    f_desolv(dist, i.lj_radius, i.lk_dgfree, i.lk_lambda, j.lk_volume),
                    f_desolv_with_grad(dist, i.lj_radius, i.lk_dgfree, i.lk_lambda, j.lk_volume).value
                );
            }
        }
    }

    #[test]
    fn partial_weight_scales_value() {
        let globals = LkBallGlobalParams::<f64>::default();
        let (i, j) = (polar_params(), carbon_params());
        let full = lk_isotropic(3.5, 5, &i, &j, &globals);
        let partial = lk_isotropic(3.5, 4, &i, &j, &globals);
        assert!((partial - 0.2 * full).abs() < 1e-12);
    }
}
