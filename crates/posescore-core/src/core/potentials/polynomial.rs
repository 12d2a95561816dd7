use crate::core::geometry::{Real, real};

/// Value and first derivative of a scalar function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarGrad<T: Real> {
    pub value: T,
    pub d_x: T,
}

impl<T: Real> ScalarGrad<T> {
    #[inline]
    pub fn constant(value: T) -> Self {
        Self {
            value,
            d_x: real(0.0),
        }
    }
}

/// Horner evaluation; `coeffs[0]` is the highest-degree coefficient.
pub fn poly<T: Real, const N: usize>(x: T, coeffs: &[T; N]) -> T {
    coeffs.iter().fold(real(0.0), |acc, &c| acc * x + c)
}

pub fn poly_with_grad<T: Real, const N: usize>(x: T, coeffs: &[T; N]) -> ScalarGrad<T> {
    let mut value: T = real(0.0);
    let mut d_x: T = real(0.0);
    for &c in coeffs {
        d_x = d_x * x + value;
        value = value * x + c;
    }
    ScalarGrad { value, d_x }
}

/// Polynomial clamped to constant bounds outside `range`.
pub fn bound_poly<T: Real, const N: usize>(
    x: T,
    coeffs: &[T; N],
    range: &[T; 2],
    bound: &[T; 2],
) -> T {
    if x < range[0] {
        bound[0]
    } else if x > range[1] {
        bound[1]
    } else {
        poly(x, coeffs)
    }
}

pub fn bound_poly_with_grad<T: Real, const N: usize>(
    x: T,
    coeffs: &[T; N],
    range: &[T; 2],
    bound: &[T; 2],
) -> ScalarGrad<T> {
    if x < range[0] {
        ScalarGrad::constant(bound[0])
    } else if x > range[1] {
        ScalarGrad::constant(bound[1])
    } else {
        poly_with_grad(x, coeffs)
    }
}

/// One end of a cubic Hermite segment: position, value and slope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Knot<T: Real> {
    pub x: T,
    pub y: T,
    pub dy: T,
}

impl<T: Real> Knot<T> {
    pub fn new(x: T, y: T, dy: T) -> Self {
        Self { x, y, dy }
    }
}

/// Hermite basis weights of `lo.y`, `lo.dy`, `hi.y` and `hi.dy` at `t`.
fn hermite_basis<T: Real>(t: T) -> [T; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    let two = real::<T>(2.0);
    let three = real::<T>(3.0);
    [
        two * t3 - three * t2 + real(1.0),
        t3 - two * t2 + t,
        three * t2 - two * t3,
        t3 - t2,
    ]
}

/// Derivatives of [`hermite_basis`] in `t`.
fn hermite_basis_slope<T: Real>(t: T) -> [T; 4] {
    let t2 = t * t;
    let two = real::<T>(2.0);
    let three = real::<T>(3.0);
    let six = real::<T>(6.0);
    [
        six * t2 - six * t,
        three * t2 - real::<T>(4.0) * t + real(1.0),
        six * t - six * t2,
        three * t2 - two * t,
    ]
}

#[inline]
fn hermite_combine<T: Real>(basis: &[T; 4], width: T, lo: &Knot<T>, hi: &Knot<T>) -> T {
    basis[0] * lo.y + basis[1] * width * lo.dy + basis[2] * hi.y + basis[3] * width * hi.dy
}

/// Cubic Hermite interpolation between two knots.
pub fn interpolate<T: Real>(x: T, lo: &Knot<T>, hi: &Knot<T>) -> T {
    let width = hi.x - lo.x;
    let t = (x - lo.x) / width;
    hermite_combine(&hermite_basis(t), width, lo, hi)
}

pub fn interpolate_with_grad<T: Real>(x: T, lo: &Knot<T>, hi: &Knot<T>) -> ScalarGrad<T> {
    let width = hi.x - lo.x;
    let t = (x - lo.x) / width;
    ScalarGrad {
        value: hermite_combine(&hermite_basis(t), width, lo, hi),
        d_x: hermite_combine(&hermite_basis_slope(t), width, lo, hi) / width,
    }
}

#[inline]
fn zero_knot<T: Real>(x_zero: T) -> Knot<T> {
    Knot::new(x_zero, real(0.0), real(0.0))
}

/// Hermite fade from `lo` to a flat zero at `x_zero`.
pub fn interpolate_to_zero<T: Real>(x: T, lo: &Knot<T>, x_zero: T) -> T {
    interpolate(x, lo, &zero_knot(x_zero))
}

pub fn interpolate_to_zero_with_grad<T: Real>(x: T, lo: &Knot<T>, x_zero: T) -> ScalarGrad<T> {
    interpolate_with_grad(x, lo, &zero_knot(x_zero))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn poly_uses_highest_degree_first() {
        // 2x^2 - 3x + 1
        let coeffs = [2.0, -3.0, 1.0];
        assert!(f64_approx_equal(poly(2.0, &coeffs), 3.0));
    }

    #[test]
    fn poly_with_grad_matches_analytic_derivative() {
        let coeffs = [2.0, -3.0, 1.0];
        let grad = poly_with_grad(2.0, &coeffs);
        assert_eq!(grad.value, poly(2.0, &coeffs));
        assert!(f64_approx_equal(grad.d_x, 5.0));
    }

    #[test]
    fn bound_poly_is_constant_outside_range() {
        let coeffs = [1.0, 0.0];
        let range = [-1.0, 1.0];
        let bound = [-5.0, 5.0];
        assert_eq!(bound_poly(-2.0, &coeffs, &range, &bound), -5.0);
        assert_eq!(bound_poly(2.0, &coeffs, &range, &bound), 5.0);
        assert_eq!(bound_poly(0.5, &coeffs, &range, &bound), 0.5);

        let outside = bound_poly_with_grad(3.0, &coeffs, &range, &bound);
        assert_eq!(outside, ScalarGrad::constant(5.0));
    }

    #[test]
    fn interpolate_hits_both_knots() {
        let lo = Knot::new(1.0, 2.0, -1.0);
        let hi = Knot::new(3.0, 0.5, 0.25);
        let at_lo = interpolate_with_grad(1.0, &lo, &hi);
        let at_hi = interpolate_with_grad(3.0, &lo, &hi);
        assert!(f64_approx_equal(at_lo.value, 2.0));
        assert!(f64_approx_equal(at_lo.d_x, -1.0));
        assert!(f64_approx_equal(at_hi.value, 0.5));
        assert!(f64_approx_equal(at_hi.d_x, 0.25));
    }

    #[test]
    fn interpolate_derivative_matches_finite_differences() {
        let lo = Knot::new(4.5, 0.05, -0.04);
        let hi = Knot::new(6.0, 0.0, 0.0);
        let h = 1e-6;
        for x in [4.7f64, 5.2, 5.9] {
            let grad = interpolate_to_zero_with_grad(x, &lo, 6.0);
            let numeric = (interpolate(x + h, &lo, &hi) - interpolate(x - h, &lo, &hi)) / (2.0 * h);
            assert!((grad.d_x - numeric).abs() < 1e-7);
        }
    }

    #[test]
    fn interpolate_to_zero_fades_flat_into_the_end_knot() {
        let lo = Knot::new(4.5f64, 0.05, -0.04);
        assert!(f64_approx_equal(interpolate_to_zero(4.5, &lo, 6.0), 0.05));
        assert!(f64_approx_equal(interpolate_to_zero(6.0, &lo, 6.0), 0.0));
        assert!(f64_approx_equal(interpolate_to_zero_with_grad(6.0, &lo, 6.0).d_x, 0.0));
    }

    #[test]
    fn value_only_interpolation_matches_the_gradient_path() {
        let lo = Knot::new(1.0f64, 2.0, -1.0);
        let hi = Knot::new(3.0, 0.5, 0.25);
        for x in [1.0, 1.3, 2.0, 2.9, 3.0] {
            assert_eq!(interpolate(x, &lo, &hi), interpolate_with_grad(x, &lo, &hi).value);
            assert_eq!(
                interpolate_to_zero(x, &lo, 3.5),
                interpolate_to_zero_with_grad(x, &lo, 3.5).value
            );
        }
    }
}
