use log::debug;
use nalgebra as na;
use rayon::prelude::*;

use crate::error::TriangulationError;
use crate::types::{FrameObservations, Point2D, Point3D, ProjectionMatrix};

/// Relative singular-value cutoff below which the 4x4 design matrix is
/// treated as rank deficient (camera centers and point near-collinear).
pub const RANK_RATIO_EPS: f64 = 1e-8;

/// Cutoff on |w| of the homogeneous solution; right singular vectors are
/// unit length, so this is already relative.
pub const HOMOGENEOUS_EPS: f64 = 1e-9;

/// Direct linear transform over exactly two views: each view contributes two
/// rows relating the homogeneous point to its pixel observation, and the
/// solution is the right singular vector of the smallest singular value.
pub fn triangulate_linear(
    p0: &ProjectionMatrix,
    p1: &ProjectionMatrix,
    x0: &Point2D,
    x1: &Point2D,
) -> Result<Point3D, TriangulationError> {
    let a = dlt_design_matrix(p0, p1, x0, x1);
    let svd = a.svd(false, true);
    let sv = svd.singular_values;
    if sv[2] <= RANK_RATIO_EPS * sv[0] {
        debug!(
            "dlt design matrix is rank deficient, sigma2/sigma0 = {:.3e}",
            sv[2] / sv[0]
        );
        return Err(TriangulationError::DegenerateTriangulation {
            reason: "rank-deficient design matrix (near-collinear rays)",
        });
    }
    let vt = svd.v_t.unwrap();
    let h = vt.row(3).transpose();
    if h[3].abs() <= HOMOGENEOUS_EPS {
        debug!("homogeneous solution has w = {:.3e}", h[3]);
        return Err(TriangulationError::DegenerateTriangulation {
            reason: "solution lies at infinity",
        });
    }
    Ok(Point3D::new(h[0] / h[3], h[1] / h[3], h[2] / h[3]))
}

/// Runs the two-view solver over a sequence of time steps. Each frame must
/// carry exactly two cameras. Steps fail independently; the output order
/// matches the input order.
pub fn triangulate_linear_sequence(
    frames: &[FrameObservations],
) -> Vec<Result<Point3D, TriangulationError>> {
    frames
        .par_iter()
        .map(|frame| {
            frame.validate()?;
            let m = frame.camera_count();
            if m != 2 {
                return Err(TriangulationError::CameraCountExact { expected: 2, got: m });
            }
            triangulate_linear(
                &frame.projections[0],
                &frame.projections[1],
                &frame.observations[0],
                &frame.observations[1],
            )
        })
        .collect()
}

fn dlt_design_matrix(
    p0: &ProjectionMatrix,
    p1: &ProjectionMatrix,
    x0: &Point2D,
    x1: &Point2D,
) -> na::Matrix4<f64> {
    let mut a = na::Matrix4::zeros();
    for c in 0..4 {
        a[(0, c)] = x0.x * p0[(2, c)] - p0[(0, c)];
        a[(1, c)] = x0.y * p0[(2, c)] - p0[(1, c)];
        a[(2, c)] = x1.x * p1[(2, c)] - p1[(0, c)];
        a[(3, c)] = x1.y * p1[(2, c)] - p1[(1, c)];
    }
    a
}
