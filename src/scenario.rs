use std::f64::consts::TAU;

use nalgebra as na;

use crate::types::{Point3D, ProjectionMatrix};

/// Builds K * [R|t] for a camera at `eye` looking at `target`, +z forward.
pub fn look_at_projection(
    intrinsics: &na::Matrix3<f64>,
    eye: &na::Point3<f64>,
    target: &na::Point3<f64>,
) -> ProjectionMatrix {
    let view = na::Isometry3::look_at_lh(eye, target, &na::Vector3::y());
    let extrinsic = view.to_homogeneous().fixed_view::<3, 4>(0, 0).into_owned();
    intrinsics * extrinsic
}

/// A lobbed ball: constant horizontal velocity, gravity on the vertical axis.
pub fn ball_trajectory(steps: usize, dt: f64) -> Vec<Point3D> {
    (0..steps)
        .map(|i| {
            let t = i as f64 * dt;
            Point3D::new(-6.0 + 12.0 * t, 1.0 + 9.0 * t - 4.905 * t * t, 0.8 * t)
        })
        .collect()
}

/// A ring of cameras around `target` that keeps drifting along the ring, so
/// every camera has a fresh projection matrix at every time step. Indexed
/// `[step][camera]`.
pub fn orbiting_rig(
    cameras: usize,
    steps: usize,
    radius: f64,
    height: f64,
    target: &Point3D,
    intrinsics: &na::Matrix3<f64>,
) -> Vec<Vec<ProjectionMatrix>> {
    let target = na::Point3::from(*target);
    (0..steps)
        .map(|step| {
            (0..cameras)
                .map(|cam| {
                    let angle = TAU * cam as f64 / cameras as f64 + 0.01 * step as f64;
                    let eye = na::Point3::new(
                        target.x + radius * angle.cos(),
                        target.y + height,
                        target.z + radius * angle.sin(),
                    );
                    look_at_projection(intrinsics, &eye, &target)
                })
                .collect()
        })
        .collect()
}
