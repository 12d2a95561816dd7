//! Placement of water pseudo-atoms around polar atoms.

use crate::core::geometry::Real;
use nalgebra::Point3;

/// Water on the extension of the donor-hydrogen bond, `dist` from the donor.
pub fn build_donor_water<T: Real>(donor: &Point3<T>, hydrogen: &Point3<T>, dist: T) -> Point3<T> {
    donor + (hydrogen - donor).normalize() * dist
}

/// Water `dist` from acceptor `a`, at `angle` B-A-W and torsion B0-B-A-W.
///
/// Degenerate frames (`b0`, `b` and `a` colinear) yield non-finite
/// coordinates, which downstream scoring treats as an absent water.
pub fn build_acceptor_water<T: Real>(
    a: &Point3<T>,
    b: &Point3<T>,
    b0: &Point3<T>,
    dist: T,
    angle: T,
    torsion: T,
) -> Point3<T> {
    let bond = (a - b).normalize();
    let normal = (b - b0).cross(&bond).normalize();
    let in_plane = normal.cross(&bond);

    let (sin_angle, cos_angle) = angle.sin_cos();
    let (sin_torsion, cos_torsion) = torsion.sin_cos();

    a + bond * (-dist * cos_angle)
        + in_plane * (dist * sin_angle * cos_torsion)
        + normal * (dist * sin_angle * sin_torsion)
}
