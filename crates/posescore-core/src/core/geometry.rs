//! Closed-form geometric primitives and their analytic gradients.
//!
//! Every primitive comes in two flavours: a value-only function and a
//! `*_with_grad` function returning the value together with the gradient
//! with respect to each input. Gradients are derived by hand; nothing here
//! relies on automatic differentiation.
//!
//! Degenerate geometry is not an error. Coincident points give a zero
//! distance gradient, and colinear bond vectors in a dihedral propagate
//! non-finite values to the caller.

use nalgebra::{Point3, RealField, Vector3};

/// Scalar type accepted by every primitive and potential.
pub trait Real: RealField + Copy {}

impl<T: RealField + Copy> Real for T {}

#[inline]
pub(crate) fn real<T: Real>(x: f64) -> T {
    nalgebra::convert(x)
}

/// Value and gradients of a function of two inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairGrad<T: Real> {
    pub value: T,
    pub d_a: Vector3<T>,
    pub d_b: Vector3<T>,
}

/// Value and gradients of a function of three points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TripleGrad<T: Real> {
    pub value: T,
    pub d_a: Vector3<T>,
    pub d_b: Vector3<T>,
    pub d_c: Vector3<T>,
}

/// Value and gradients of a dihedral angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DihedralGrad<T: Real> {
    pub value: T,
    pub d_i: Vector3<T>,
    pub d_j: Vector3<T>,
    pub d_k: Vector3<T>,
    pub d_l: Vector3<T>,
}

#[inline]
pub fn distance<T: Real>(a: &Point3<T>, b: &Point3<T>) -> T {
    (a - b).norm()
}

/// Euclidean distance with gradients.
///
/// The gradient is discontinuous at `a == b`; both gradients are reported as
/// zero there instead of NaN.
pub fn distance_with_grad<T: Real>(a: &Point3<T>, b: &Point3<T>) -> PairGrad<T> {
    let delta = a - b;
    let value = delta.norm();

    if value != real(0.0) {
        let unit = delta / value;
        PairGrad {
            value,
            d_a: unit,
            d_b: -unit,
        }
    } else {
        PairGrad {
            value,
            d_a: Vector3::zeros(),
            d_b: Vector3::zeros(),
        }
    }
}

#[inline]
fn half_angle_atan2<T: Real>(a: &Vector3<T>, b: &Vector3<T>, cross: &Vector3<T>) -> T {
    real::<T>(2.0) * cross.norm().atan2(a.norm() * b.norm() + a.dot(b))
}

/// Unsigned angle between two vectors, in `[0, pi]`.
///
/// Uses the half-angle `atan2` form, which stays accurate near 0 and pi
/// where `acos` of the cosine loses precision.
pub fn interior_angle<T: Real>(a: &Vector3<T>, b: &Vector3<T>) -> T {
    let cross = a.cross(b);
    half_angle_atan2(a, b, &cross)
}

pub fn interior_angle_with_grad<T: Real>(a: &Vector3<T>, b: &Vector3<T>) -> PairGrad<T> {
    let cross = a.cross(b);
    let z_unit = cross.normalize();

    let a_norm = a.norm();
    let b_norm = b.norm();

    PairGrad {
        value: half_angle_atan2(a, b, &cross),
        d_a: (a / a_norm).cross(&z_unit) / a_norm,
        d_b: -(b / b_norm).cross(&z_unit) / b_norm,
    }
}

/// Angle at vertex `b` formed by the rays `b -> a` and `b -> c`.
pub fn point_interior_angle<T: Real>(a: &Point3<T>, b: &Point3<T>, c: &Point3<T>) -> T {
    interior_angle(&(a - b), &(c - b))
}

pub fn point_interior_angle_with_grad<T: Real>(
    a: &Point3<T>,
    b: &Point3<T>,
    c: &Point3<T>,
) -> TripleGrad<T> {
    let legs = interior_angle_with_grad(&(a - b), &(c - b));
    TripleGrad {
        value: legs.value,
        d_a: legs.d_a,
        d_b: -(legs.d_a + legs.d_b),
        d_c: legs.d_b,
    }
}

pub fn cos_interior_angle<T: Real>(a: &Vector3<T>, b: &Vector3<T>) -> T {
    a.dot(b) / (a.norm() * b.norm())
}

pub fn cos_interior_angle_with_grad<T: Real>(a: &Vector3<T>, b: &Vector3<T>) -> PairGrad<T> {
    let a_norm = a.norm();
    let b_norm = b.norm();
    let ab_norm = a_norm * b_norm;

    let cos_ab = a.dot(b) / ab_norm;

    PairGrad {
        value: cos_ab,
        d_a: b / ab_norm - a * (cos_ab / (a_norm * a_norm)),
        d_b: a / ab_norm - b * (cos_ab / (b_norm * b_norm)),
    }
}

pub fn point_cos_interior_angle<T: Real>(a: &Point3<T>, b: &Point3<T>, c: &Point3<T>) -> T {
    cos_interior_angle(&(a - b), &(c - b))
}

pub fn point_cos_interior_angle_with_grad<T: Real>(
    a: &Point3<T>,
    b: &Point3<T>,
    c: &Point3<T>,
) -> TripleGrad<T> {
    let legs = cos_interior_angle_with_grad(&(a - b), &(c - b));
    TripleGrad {
        value: legs.value,
        d_a: legs.d_a,
        d_b: -(legs.d_a + legs.d_b),
        d_c: legs.d_b,
    }
}

struct TorsionFrame<T: Real> {
    f: Vector3<T>,
    g: Vector3<T>,
    h: Vector3<T>,
    a: Vector3<T>,
    b: Vector3<T>,
}

impl<T: Real> TorsionFrame<T> {
    fn new(i: &Point3<T>, j: &Point3<T>, k: &Point3<T>, l: &Point3<T>) -> Self {
        let f = i - j;
        let g = j - k;
        let h = l - k;
        let a = f.cross(&g);
        let b = h.cross(&g);
        Self { f, g, h, a, b }
    }

    fn angle(&self) -> T {
        let sign: T = if self.g.dot(&self.a.cross(&self.b)) >= real(0.0) {
            real(-1.0)
        } else {
            real(1.0)
        };
        let cos = self.a.dot(&self.b) / (self.a.norm() * self.b.norm());
        sign * cos.max(real(-1.0)).min(real(1.0)).acos()
    }
}

/// Signed dihedral angle about the `j-k` axis.
///
/// Blondel & Karplus, J. Comput. Chem. 17 (1996) 1132-1141. Their
/// derivative expressions stay finite as long as neither `i-j-k` nor
/// `j-k-l` is colinear.
pub fn dihedral_angle<T: Real>(i: &Point3<T>, j: &Point3<T>, k: &Point3<T>, l: &Point3<T>) -> T {
    TorsionFrame::new(i, j, k, l).angle()
}

pub fn dihedral_angle_with_grad<T: Real>(
    i: &Point3<T>,
    j: &Point3<T>,
    k: &Point3<T>,
    l: &Point3<T>,
) -> DihedralGrad<T> {
    let frame = TorsionFrame::new(i, j, k, l);
    let TorsionFrame { f, g, h, a, b } = &frame;

    let g_norm = g.norm();
    let aa = a.dot(a);
    let bb = b.dot(b);
    let fg = f.dot(g) / (aa * g_norm);
    let hg = h.dot(g) / (bb * g_norm);

    DihedralGrad {
        value: frame.angle(),
        d_i: a * (-g_norm / aa),
        d_j: a * (g_norm / aa) + a * fg - b * hg,
        d_k: b * (-g_norm / bb) - a * fg + b * hg,
        d_l: b * (g_norm / bb),
    }
}
