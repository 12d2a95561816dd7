//! The LK-ball solvation model.
//!
//! Each polar atom carries up to [`MAX_WATER`] water pseudo-atoms. The
//! isotropic LK desolvation of a polar atom by an occluder is reweighted by
//! how strongly the occluder sits on the polar atom's waters (`ball`), and
//! pairs of polar atoms whose waters overlap are scored for water bridging.

use super::lk_isotropic::{lk_isotropic, lk_isotropic_with_grad};
use super::polynomial::ScalarGrad;
use crate::core::geometry::{PairGrad, Real, distance, distance_with_grad, real};
use crate::core::params::{LkBallGlobalParams, LkBallTypeParams};
use crate::core::term::LkBallTerms;
use nalgebra::{Point3, Vector3};

/// Water slots per polar atom.
pub const MAX_WATER: usize = 4;

/// Water slots of one atom. Slots holding non-finite coordinates are absent.
pub type Waters<T> = [Point3<T>; MAX_WATER];

/// Gradient with respect to each water slot of one atom.
pub type WaterGrads<T> = [Vector3<T>; MAX_WATER];

#[inline]
pub fn is_water_present<T: Real>(water: &Point3<T>) -> bool {
    water.coords.iter().all(|c| c.is_finite())
}

#[inline]
fn zero_water_grads<T: Real>() -> WaterGrads<T> {
    [Vector3::zeros(); MAX_WATER]
}

#[inline]
fn scale_water_grads<T: Real>(grads: &WaterGrads<T>, factor: T) -> WaterGrads<T> {
    grads.map(|g| g * factor)
}

/// `1` below zero, `(1 - (x/width)^2)^2` on `[0, width]`, `0` above.
fn ramp<T: Real>(x: T, width: T) -> T {
    if x < real(0.0) {
        real(1.0)
    } else if x > width {
        real(0.0)
    } else {
        let scaled = x / width;
        let one_minus = real::<T>(1.0) - scaled * scaled;
        one_minus * one_minus
    }
}

fn ramp_with_grad<T: Real>(x: T, width: T) -> ScalarGrad<T> {
    if x < real(0.0) || x > width {
        ScalarGrad::constant(ramp(x, width))
    } else {
        let scaled = x / width;
        let one_minus = real::<T>(1.0) - scaled * scaled;
        ScalarGrad {
            value: one_minus * one_minus,
            d_x: real::<T>(-4.0) * one_minus * scaled / width,
        }
    }
}

/// Soft-minimum weights of the squared distances from `j` to each present
/// water, together with their sum.
fn occlusion_weights<T: Real>(
    waters_i: &Waters<T>,
    j: &Point3<T>,
    lj_radius_j: T,
    globals: &LkBallGlobalParams<T>,
) -> ([T; MAX_WATER], T) {
    let reach = globals.water_radius + lj_radius_j;
    let d2_low = reach * reach - globals.lk_ball_ramp_width_a2;

    let mut sum: T = real(0.0);
    let mut weights: [T; MAX_WATER] = [real(0.0); MAX_WATER];
    for (water, weight) in waters_i.iter().zip(weights.iter_mut()) {
        if is_water_present(water) {
            *weight = (-((j - water).norm_squared() - d2_low)).exp();
            sum += *weight;
        }
    }
    (weights, sum)
}

/// Occlusion of the waters `waters_i` by an atom at `j` with radius `lj_radius_j`.
///
/// The squared water distances are combined with a soft minimum and mapped
/// through the ramp of width `lk_ball_ramp_width_a2`. With no water present
/// the fraction is zero.
pub fn lk_fraction<T: Real>(
    waters_i: &Waters<T>,
    j: &Point3<T>,
    lj_radius_j: T,
    globals: &LkBallGlobalParams<T>,
) -> T {
    let (_, sum) = occlusion_weights(waters_i, j, lj_radius_j, globals);
    if sum == real(0.0) {
        return real(0.0);
    }
    ramp(-sum.ln(), globals.lk_ball_ramp_width_a2)
}

/// Fraction of an atom's waters occluded by `j`, with gradients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractionGrad<T: Real> {
    pub value: T,
    pub d_j: Vector3<T>,
    pub d_waters: WaterGrads<T>,
}

impl<T: Real> FractionGrad<T> {
    fn zero() -> Self {
        Self {
            value: real(0.0),
            d_j: Vector3::zeros(),
            d_waters: zero_water_grads(),
        }
    }
}

pub fn lk_fraction_with_grad<T: Real>(
    waters_i: &Waters<T>,
    j: &Point3<T>,
    lj_radius_j: T,
    globals: &LkBallGlobalParams<T>,
) -> FractionGrad<T> {
    let (weights, sum) = occlusion_weights(waters_i, j, lj_radius_j, globals);
    let mut grad = FractionGrad::zero();
    if sum == real(0.0) {
        return grad;
    }

    let shape = ramp_with_grad(-sum.ln(), globals.lk_ball_ramp_width_a2);
    grad.value = shape.value;
    if shape.d_x == real(0.0) {
        return grad;
    }

    for ((water, &weight), d_water) in waters_i.iter().zip(&weights).zip(grad.d_waters.iter_mut()) {
        if weight == real(0.0) {
            continue;
        }
        let pull = (j - water) * (real::<T>(2.0) * shape.d_x * weight / sum);
        grad.d_j += pull;
        *d_water = -pull;
    }
    grad
}

/// Water-bridging fraction of two polar atoms, with gradients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BridgeGrad<T: Real> {
    pub value: T,
    pub d_i: Vector3<T>,
    pub d_j: Vector3<T>,
    pub d_waters_i: WaterGrads<T>,
    pub d_waters_j: WaterGrads<T>,
}

impl<T: Real> BridgeGrad<T> {
    fn zero() -> Self {
        Self {
            value: real(0.0),
            d_i: Vector3::zeros(),
            d_j: Vector3::zeros(),
            d_waters_i: zero_water_grads(),
            d_waters_j: zero_water_grads(),
        }
    }
}

/// Where an `i`-`j` separation sits relative to the ideal bridged distance.
enum BridgeWindow<T: Real> {
    Disabled,
    Outside,
    /// `x` is the scaled offset from the ideal squared distance.
    Inside { delta: Vector3<T>, x: T, width: T },
}

fn bridge_window<T: Real>(
    i: &Point3<T>,
    j: &Point3<T>,
    globals: &LkBallGlobalParams<T>,
) -> BridgeWindow<T> {
    let widthscale = globals.lk_ball_bridge_angle_widthscale;
    if widthscale <= real(0.0) {
        return BridgeWindow::Disabled;
    }

    let water_dist = globals.lkb_water_dist;
    let target = real::<T>(8.0 / 3.0) * water_dist * water_dist;
    let width = widthscale * target;
    let delta = i - j;
    let x = (delta.norm_squared() - target) / width;
    if x.abs() >= real(1.0) {
        BridgeWindow::Outside
    } else {
        BridgeWindow::Inside { delta, x, width }
    }
}

/// Penalises polar pairs whose separation is far from the ideal bridged
/// distance. Disabled (constant 1) when the width scale is zero.
fn bridge_geometry<T: Real>(i: &Point3<T>, j: &Point3<T>, globals: &LkBallGlobalParams<T>) -> T {
    match bridge_window(i, j, globals) {
        BridgeWindow::Disabled => real(1.0),
        BridgeWindow::Outside => real(0.0),
        BridgeWindow::Inside { x, .. } => {
            let one_minus = real::<T>(1.0) - x * x;
            one_minus * one_minus
        }
    }
}

fn bridge_geometry_with_grad<T: Real>(
    i: &Point3<T>,
    j: &Point3<T>,
    globals: &LkBallGlobalParams<T>,
) -> PairGrad<T> {
    let flat = |value: T| PairGrad {
        value,
        d_a: Vector3::zeros(),
        d_b: Vector3::zeros(),
    };
    match bridge_window(i, j, globals) {
        BridgeWindow::Disabled => flat(real(1.0)),
        BridgeWindow::Outside => flat(real(0.0)),
        BridgeWindow::Inside { delta, x, width } => {
            let one_minus = real::<T>(1.0) - x * x;
            let d_i = delta * (real::<T>(-8.0) * x * one_minus / width);
            PairGrad {
                value: one_minus * one_minus,
                d_a: d_i,
                d_b: -d_i,
            }
        }
    }
}

/// Soft-minimum weights of every water-water squared distance across the
/// pair, together with their sum.
fn overlap_weights<T: Real>(
    waters_i: &Waters<T>,
    waters_j: &Waters<T>,
    globals: &LkBallGlobalParams<T>,
) -> ([[T; MAX_WATER]; MAX_WATER], T) {
    let gap2 = globals.lk_ball_overlap_gap * globals.lk_ball_overlap_gap;

    let mut sum: T = real(0.0);
    let mut weights: [[T; MAX_WATER]; MAX_WATER] = [[real(0.0); MAX_WATER]; MAX_WATER];
    for (wi, row) in waters_i.iter().zip(weights.iter_mut()) {
        if !is_water_present(wi) {
            continue;
        }
        for (wj, weight) in waters_j.iter().zip(row.iter_mut()) {
            if is_water_present(wj) {
                *weight = (-((wi - wj).norm_squared() - gap2)).exp();
                sum += *weight;
            }
        }
    }
    (weights, sum)
}

/// Overlap of the waters of `i` with those of `j`, optionally shaped by the
/// `i`-`j` distance.
pub fn lk_bridge_fraction<T: Real>(
    i: &Point3<T>,
    j: &Point3<T>,
    waters_i: &Waters<T>,
    waters_j: &Waters<T>,
    globals: &LkBallGlobalParams<T>,
) -> T {
    let (_, sum) = overlap_weights(waters_i, waters_j, globals);
    if sum == real(0.0) {
        return real(0.0);
    }
    let overlap = ramp(-sum.ln(), globals.lk_ball_overlap_width_a2);
    if overlap == real(0.0) {
        return real(0.0);
    }
    overlap * bridge_geometry(i, j, globals)
}

pub fn lk_bridge_fraction_with_grad<T: Real>(
    i: &Point3<T>,
    j: &Point3<T>,
    waters_i: &Waters<T>,
    waters_j: &Waters<T>,
    globals: &LkBallGlobalParams<T>,
) -> BridgeGrad<T> {
    let (weights, sum) = overlap_weights(waters_i, waters_j, globals);
    let mut grad = BridgeGrad::zero();
    if sum == real(0.0) {
        return grad;
    }

    let overlap = ramp_with_grad(-sum.ln(), globals.lk_ball_overlap_width_a2);
    if overlap.value == real(0.0) {
        return grad;
    }
    let geometry = bridge_geometry_with_grad(i, j, globals);

    grad.value = overlap.value * geometry.value;
    grad.d_i = geometry.d_a * overlap.value;
    grad.d_j = geometry.d_b * overlap.value;

    let scale = overlap.d_x * geometry.value;
    if scale == real(0.0) {
        return grad;
    }
    for (a, wi) in waters_i.iter().enumerate() {
        for (b, wj) in waters_j.iter().enumerate() {
            let weight = weights[a][b];
            if weight == real(0.0) {
                continue;
            }
            let pull = (wi - wj) * (real::<T>(2.0) * scale * weight / sum);
            grad.d_waters_i[a] += pull;
            grad.d_waters_j[b] -= pull;
        }
    }
    grad
}

/// One side of an LK-ball pair: position, waters and type parameters.
#[derive(Debug, Clone, Copy)]
pub struct LkBallAtom<'a, T: Real> {
    pub coord: &'a Point3<T>,
    pub waters: &'a Waters<T>,
    pub params: &'a LkBallTypeParams<T>,
}

/// Gradient of one LK-ball term with respect to every input point of a pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LkBallPairGrad<T: Real> {
    pub d_i: Vector3<T>,
    pub d_j: Vector3<T>,
    pub d_waters_i: WaterGrads<T>,
    pub d_waters_j: WaterGrads<T>,
}

impl<T: Real> Default for LkBallPairGrad<T> {
    fn default() -> Self {
        Self {
            d_i: Vector3::zeros(),
            d_j: Vector3::zeros(),
            d_waters_i: zero_water_grads(),
            d_waters_j: zero_water_grads(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LkBallScoreGrad<T: Real> {
    pub value: LkBallTerms<T>,
    pub grad: LkBallTerms<LkBallPairGrad<T>>,
}

#[inline]
fn zero_terms<T: Real>() -> LkBallTerms<T> {
    LkBallTerms::new(real(0.0), real(0.0), real(0.0), real(0.0))
}

/// All four LK-ball terms of the polar atom `i` desolvated by `j`.
///
/// The bridging terms are only defined when `j` is polar too. Every ordered
/// polar pair is visited twice, so the uncoupled bridge term carries half
/// the bridging fraction. Pairs at or beyond `max_dis` score zero.
pub fn lk_ball_score<T: Real>(
    i: &LkBallAtom<'_, T>,
    j: &LkBallAtom<'_, T>,
    bonded_path_length: i32,
    globals: &LkBallGlobalParams<T>,
) -> LkBallTerms<T> {
    let mut terms = zero_terms();
    let dist = distance(i.coord, j.coord);
    if dist >= globals.max_dis {
        return terms;
    }

    let iso = lk_isotropic(dist, bonded_path_length, i.params, j.params, globals);
    terms.iso = iso;
    terms.ball = iso * lk_fraction(i.waters, j.coord, j.params.lj_radius, globals);

    if j.params.is_polar() {
        let bridge = lk_bridge_fraction(i.coord, j.coord, i.waters, j.waters, globals);
        terms.bridge = iso * bridge;
        terms.bridge_uncpl = bridge * real::<T>(0.5);
    }
    terms
}

pub fn lk_ball_score_with_grad<T: Real>(
    i: &LkBallAtom<'_, T>,
    j: &LkBallAtom<'_, T>,
    bonded_path_length: i32,
    globals: &LkBallGlobalParams<T>,
) -> LkBallScoreGrad<T> {
    let mut out = LkBallScoreGrad {
        value: zero_terms(),
        grad: LkBallTerms::default(),
    };

    let dist = distance_with_grad(i.coord, j.coord);
    if dist.value >= globals.max_dis {
        return out;
    }

    let iso = lk_isotropic_with_grad(dist.value, bonded_path_length, i.params, j.params, globals);
    let d_iso_i = dist.d_a * iso.d_x;
    let d_iso_j = dist.d_b * iso.d_x;
    out.value.iso = iso.value;
    out.grad.iso.d_i = d_iso_i;
    out.grad.iso.d_j = d_iso_j;

    let frac = lk_fraction_with_grad(i.waters, j.coord, j.params.lj_radius, globals);
    out.value.ball = iso.value * frac.value;
    out.grad.ball = LkBallPairGrad {
        d_i: d_iso_i * frac.value,
        d_j: d_iso_j * frac.value + frac.d_j * iso.value,
        d_waters_i: scale_water_grads(&frac.d_waters, iso.value),
        d_waters_j: zero_water_grads(),
    };

    if j.params.is_polar() {
        let bridge = lk_bridge_fraction_with_grad(i.coord, j.coord, i.waters, j.waters, globals);
        out.value.bridge = iso.value * bridge.value;
        out.grad.bridge = LkBallPairGrad {
            d_i: d_iso_i * bridge.value + bridge.d_i * iso.value,
            d_j: d_iso_j * bridge.value + bridge.d_j * iso.value,
            d_waters_i: scale_water_grads(&bridge.d_waters_i, iso.value),
            d_waters_j: scale_water_grads(&bridge.d_waters_j, iso.value),
        };

        let half = real::<T>(0.5);
        out.value.bridge_uncpl = bridge.value * half;
        out.grad.bridge_uncpl = LkBallPairGrad {
            d_i: bridge.d_i * half,
            d_j: bridge.d_j * half,
            d_waters_i: scale_water_grads(&bridge.d_waters_i, half),
            d_waters_j: scale_water_grads(&bridge.d_waters_j, half),
        };
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::tests::{assert_vec_close, numeric_grad};
    use crate::core::potentials::lk_isotropic::tests::{carbon_params, polar_params};

    const GRAD_TOLERANCE: f64 = 1e-6;

    fn absent() -> Point3<f64> {
        Point3::new(f64::NAN, f64::NAN, f64::NAN)
    }

    fn test_globals() -> LkBallGlobalParams<f64> {
        LkBallGlobalParams {
            lk_ball_bridge_angle_widthscale: 0.5,
            ..Default::default()
        }
    }

    /// A polar pair in the smooth region of every term.
    #[derive(Clone, Copy)]
    struct PairCase {
        i: Point3<f64>,
        j: Point3<f64>,
        waters_i: Waters<f64>,
        waters_j: Waters<f64>,
        params_j: LkBallTypeParams<f64>,
    }

    impl PairCase {
        fn bridged() -> Self {
            Self {
                i: Point3::new(0.0, 0.0, 0.0),
                j: Point3::new(4.2, 0.3, 0.0),
                waters_i: [
                    Point3::new(1.6, 1.9, 0.1),
                    Point3::new(2.0, -1.5, 0.2),
                    absent(),
                    absent(),
                ],
                waters_j: [Point3::new(2.6, 1.8, 0.0), absent(), absent(), absent()],
                params_j: polar_params(),
            }
        }

        fn score(&self, globals: &LkBallGlobalParams<f64>) -> LkBallScoreGrad<f64> {
            let params_i = polar_params();
            let i = LkBallAtom {
                coord: &self.i,
                waters: &self.waters_i,
                params: &params_i,
            };
            let j = LkBallAtom {
                coord: &self.j,
                waters: &self.waters_j,
                params: &self.params_j,
            };
            lk_ball_score_with_grad(&i, &j, 6, globals)
        }

        /// Points addressed as i, j, waters of i, waters of j.
        fn point_mut(&mut self, target: usize) -> &mut Point3<f64> {
            match target {
                0 => &mut self.i,
                1 => &mut self.j,
                2..=5 => &mut self.waters_i[target - 2],
                _ => &mut self.waters_j[target - 6],
            }
        }

        fn point(&self, target: usize) -> Point3<f64> {
            let mut copy = *self;
            *copy.point_mut(target)
        }
    }

    fn grad_of(grad: &LkBallPairGrad<f64>, target: usize) -> Vector3<f64> {
        match target {
            0 => grad.d_i,
            1 => grad.d_j,
            2..=5 => grad.d_waters_i[target - 2],
            _ => grad.d_waters_j[target - 6],
        }
    }

    #[test]
    fn ramp_is_one_below_zero_and_zero_above_width() {
        assert_eq!(ramp_with_grad(-0.5, 2.0), ScalarGrad::constant(1.0));
        assert_eq!(ramp_with_grad(2.5, 2.0), ScalarGrad::constant(0.0));
        assert_eq!(ramp_with_grad(0.0, 2.0).value, 1.0);
        assert!(ramp_with_grad(2.0f64, 2.0).value.abs() < 1e-12);
    }

    #[test]
    fn lk_fraction_is_zero_without_waters() {
        let globals = LkBallGlobalParams::<f64>::default();
        let waters = [absent(); MAX_WATER];
        let grad = lk_fraction_with_grad(&waters, &Point3::new(1.0, 0.0, 0.0), 1.6, &globals);
        assert_eq!(grad.value, 0.0);
        assert_eq!(grad.d_j, Vector3::zeros());
    }

    #[test]
    fn lk_fraction_is_one_when_occluder_sits_on_a_water() {
        let globals = LkBallGlobalParams::<f64>::default();
        let waters = [Point3::new(0.5, 0.3, 0.0), absent(), absent(), absent()];
        let value = lk_fraction(&waters, &Point3::new(0.5, 0.3, 0.0), 1.6, &globals);
        assert_eq!(value, 1.0);
    }

    #[test]
    fn lk_fraction_gradients_match_finite_differences() {
        let globals = LkBallGlobalParams::<f64>::default();
        let waters = [
            Point3::new(0.5, 0.3, 0.0),
            Point3::new(0.9, -0.6, 0.4),
            absent(),
            absent(),
        ];
        let j = Point3::new(3.4, 0.2, 0.1);
        let grad = lk_fraction_with_grad(&waters, &j, 1.6, &globals);
        assert!(grad.value > 0.0 && grad.value < 1.0);

        let numeric_j = numeric_grad(&j, |p| lk_fraction(&waters, p, 1.6, &globals));
        assert_vec_close(&grad.d_j, &numeric_j, GRAD_TOLERANCE);

        for slot in 0..2 {
            let numeric_w = numeric_grad(&waters[slot], |p| {
                let mut moved = waters;
                moved[slot] = *p;
                lk_fraction(&moved, &j, 1.6, &globals)
            });
            assert_vec_close(&grad.d_waters[slot], &numeric_w, GRAD_TOLERANCE);
        }
        assert_eq!(grad.d_waters[2], Vector3::zeros());
    }

    #[test]
    fn lk_bridge_fraction_gradients_match_finite_differences() {
        let globals = test_globals();
        let case = PairCase::bridged();
        let grad = lk_bridge_fraction_with_grad(&case.i, &case.j, &case.waters_i, &case.waters_j, &globals);
        assert!(grad.value > 0.0 && grad.value < 1.0);

        let bridge_at = |target: usize, p: &Point3<f64>| {
            let mut moved = case;
            *moved.point_mut(target) = *p;
            lk_bridge_fraction(&moved.i, &moved.j, &moved.waters_i, &moved.waters_j, &globals)
        };
        let analytic = [
            grad.d_i,
            grad.d_j,
            grad.d_waters_i[0],
            grad.d_waters_i[1],
        ];
        for (target, expected) in [0, 1, 2, 3].into_iter().zip(analytic) {
            let numeric = numeric_grad(&case.point(target), |p| bridge_at(target, p));
            assert_vec_close(&expected, &numeric, GRAD_TOLERANCE);
        }
        let numeric_wj = numeric_grad(&case.waters_j[0], |p| bridge_at(6, p));
        assert_vec_close(&grad.d_waters_j[0], &numeric_wj, GRAD_TOLERANCE);
    }

    #[test]
    fn bridge_geometry_is_disabled_by_zero_widthscale() {
        let globals = LkBallGlobalParams::<f64>::default();
        let case = PairCase::bridged();
        let geometry = bridge_geometry_with_grad(&case.i, &case.j, &globals);
        assert_eq!(geometry.value, 1.0);
        assert_eq!(geometry.d_a, Vector3::zeros());
    }

    #[test]
    fn bridge_geometry_vanishes_far_from_ideal_separation() {
        let globals = test_globals();
        let far = Point3::new(8.0, 0.0, 0.0);
        let geometry = bridge_geometry_with_grad(&Point3::origin(), &far, &globals);
        assert_eq!(geometry.value, 0.0);
    }

    #[test]
    fn lk_ball_score_gradients_match_finite_differences() {
        let globals = test_globals();
        let case = PairCase::bridged();
        let scored = case.score(&globals);
        let values = scored.value.into_array();
        assert!(values.iter().all(|v| *v != 0.0), "{values:?}");

        let grads = scored.grad.into_array();
        for (term, grad) in grads.iter().enumerate() {
            for target in [0, 1, 2, 3, 6] {
                let numeric = numeric_grad(&case.point(target), |p| {
                    let mut moved = case;
                    *moved.point_mut(target) = *p;
                    moved.score(&globals).value.into_array()[term]
                });
                assert_vec_close(&grad_of(grad, target), &numeric, GRAD_TOLERANCE);
            }
        }
    }

    #[test]
    fn value_only_paths_match_the_gradient_paths() {
        for globals in [LkBallGlobalParams::<f64>::default(), test_globals()] {
            for (offset, occluder) in [(0.0, polar_params()), (0.8, polar_params()), (1.5, carbon_params())] {
                let mut case = PairCase::bridged();
                case.j.x += offset;
                case.params_j = occluder;

                let params_i = polar_params();
                let i = LkBallAtom {
                    coord: &case.i,
                    waters: &case.waters_i,
                    params: &params_i,
                };
                let j = LkBallAtom {
                    coord: &case.j,
                    waters: &case.waters_j,
                    params: &case.params_j,
                };
                assert_eq!(lk_ball_score(&i, &j, 6, &globals), case.score(&globals).value);
                assert_eq!(
                    lk_fraction(&case.waters_i, &case.j, 1.6, &globals),
                    lk_fraction_with_grad(&case.waters_i, &case.j, 1.6, &globals).value
                );
                assert_eq!(
                    lk_bridge_fraction(&case.i, &case.j, &case.waters_i, &case.waters_j, &globals),
                    lk_bridge_fraction_with_grad(&case.i, &case.j, &case.waters_i, &case.waters_j, &globals)
                        .value
                );
                assert_eq!(
                    bridge_geometry(&case.i, &case.j, &globals),
                    bridge_geometry_with_grad(&case.i, &case.j, &globals).value
                );
            }
        }
        for x in [-0.5f64, 0.0, 0.7, 2.0, 2.5] {
            assert_eq!(ramp(x, 2.0), ramp_with_grad(x, 2.0).value);
        }
    }

    #[test]
    fn bridge_terms_vanish_for_nonpolar_occluder() {
        let globals = test_globals();
        let mut case = PairCase::bridged();
        case.params_j = carbon_params();
        let scored = case.score(&globals);
        assert!(scored.value.iso != 0.0);
        assert_eq!(scored.value.bridge, 0.0);
        assert_eq!(scored.value.bridge_uncpl, 0.0);
        assert_eq!(scored.grad.bridge, LkBallPairGrad::default());
    }

    #[test]
    fn uncoupled_bridge_is_half_the_bridge_fraction() {
        let globals = test_globals();
        let case = PairCase::bridged();
        let fraction = lk_bridge_fraction(&case.i, &case.j, &case.waters_i, &case.waters_j, &globals);
        assert_eq!(case.score(&globals).value.bridge_uncpl, 0.5 * fraction);
    }

    #[test]
    fn pairs_beyond_max_distance_score_zero() {
        let globals = test_globals();
        let mut case = PairCase::bridged();
        case.j = Point3::new(6.0, 0.0, 0.0);
        let scored = case.score(&globals);
        assert_eq!(scored.value, LkBallTerms::default());
        assert_eq!(scored.grad, LkBallTerms::default());
    }
}
