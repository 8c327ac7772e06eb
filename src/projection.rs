use nalgebra as na;

use crate::error::TriangulationError;
use crate::types::{Point2D, Point3D, ProjectionMatrix};

/// Relative cutoff on the homogeneous denominator |w| below which a
/// projection is reported as degenerate instead of dividing.
pub const PROJECTION_EPS: f64 = 1e-12;

/// Projects a world point through a 3x4 projection matrix and dehomogenizes
/// to pixel coordinates.
pub fn project(p: &ProjectionMatrix, x: &Point3D) -> Result<Point2D, TriangulationError> {
    let u = p * na::Vector4::new(x.x, x.y, x.z, 1.0);
    let w = u[2];
    if w.abs() <= PROJECTION_EPS * (1.0 + u.norm()) {
        return Err(TriangulationError::DegenerateProjection { denominator: w });
    }
    Ok(Point2D::new(u[0] / w, u[1] / w))
}

/// Same projection for any real scalar type so it can run under the solver's
/// dual numbers. Carries no degeneracy guard: a zero denominator flows
/// through as a non-finite residual, which the solver rejects on its own.
pub(crate) fn project_generic<T: na::RealField>(
    p: &na::SMatrix<T, 3, 4>,
    x: &na::Vector3<T>,
) -> na::Vector2<T> {
    let xh = na::Vector4::new(x.x.clone(), x.y.clone(), x.z.clone(), T::one());
    let u = p * xh;
    na::Vector2::new(u.x.clone() / u.z.clone(), u.y.clone() / u.z.clone())
}
