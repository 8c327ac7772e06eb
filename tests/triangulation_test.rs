use multiview_triangulation::projection::project;
use multiview_triangulation::scenario::{ball_trajectory, orbiting_rig};
use multiview_triangulation::triangulation::{triangulate_linear, triangulate_linear_sequence};
use multiview_triangulation::types::{FrameObservations, Point3D, ProjectionMatrix};
use nalgebra as na;

fn rt_matrix(r: &na::Rotation3<f64>, t: &na::Vector3<f64>) -> ProjectionMatrix {
    let mut p = ProjectionMatrix::zeros();
    p.fixed_view_mut::<3, 3>(0, 0).copy_from(r.matrix());
    p.fixed_view_mut::<3, 1>(0, 3).copy_from(t);
    p
}

#[test]
fn test_two_view_exact_recovery_identity_intrinsics() {
    // K = I, P0 = [I|0], P1 = [R|t], X = (1, 2, 10).
    let p0 = ProjectionMatrix::identity();
    let r = na::Rotation3::from_euler_angles(0.02, -0.25, 0.05);
    let t = na::Vector3::new(-2.0, 0.1, 0.6);
    let p1 = rt_matrix(&r, &t);
    let x = Point3D::new(1.0, 2.0, 10.0);

    let x0 = project(&p0, &x).unwrap();
    let x1 = project(&p1, &x).unwrap();
    let recovered = triangulate_linear(&p0, &p1, &x0, &x1).unwrap();

    assert!(
        (recovered - x).norm() < 1e-6,
        "expected {x:?}, got {recovered:?}"
    );
}

#[test]
fn test_two_view_pure_translation() {
    let p0 = ProjectionMatrix::identity();
    let p1 = rt_matrix(
        &na::Rotation3::identity(),
        &na::Vector3::new(-1.0, 0.0, 0.0),
    );
    let x = Point3D::new(1.0, 2.0, 10.0);

    let x0 = project(&p0, &x).unwrap();
    let x1 = project(&p1, &x).unwrap();
    let recovered = triangulate_linear(&p0, &p1, &x0, &x1).unwrap();

    assert!((recovered - x).norm() < 1e-6, "got {recovered:?}");
}

#[test]
fn test_moving_camera_sequence() {
    let intrinsics = na::Matrix3::new(800.0, 0.0, 320.0, 0.0, 800.0, 240.0, 0.0, 0.0, 1.0);
    let steps = 20;
    let truth = ball_trajectory(steps, 0.02);
    let target = Point3D::new(0.0, 2.0, 0.0);
    let rig = orbiting_rig(2, steps, 20.0, 6.0, &target, &intrinsics);

    let frames: Vec<FrameObservations> = truth
        .iter()
        .zip(&rig)
        .map(|(point, projections)| {
            let observations = projections
                .iter()
                .map(|p| project(p, point).unwrap())
                .collect();
            FrameObservations::new(projections.clone(), observations)
        })
        .collect();

    let results = triangulate_linear_sequence(&frames);
    assert_eq!(results.len(), steps);
    for (i, (result, gt)) in results.iter().zip(&truth).enumerate() {
        let p = result.as_ref().unwrap();
        assert!(
            (p - gt).norm() < 1e-6,
            "step {i}: expected {gt:?}, got {p:?}"
        );
    }
}

#[test]
fn test_sequence_matches_single_calls() {
    let intrinsics = na::Matrix3::new(600.0, 0.0, 400.0, 0.0, 600.0, 300.0, 0.0, 0.0, 1.0);
    let steps = 6;
    let truth = ball_trajectory(steps, 0.05);
    let target = Point3D::new(0.0, 2.0, 0.0);
    let rig = orbiting_rig(2, steps, 18.0, 5.0, &target, &intrinsics);

    let frames: Vec<FrameObservations> = truth
        .iter()
        .zip(&rig)
        .map(|(point, projections)| {
            let observations = projections
                .iter()
                .map(|p| project(p, point).unwrap())
                .collect();
            FrameObservations::new(projections.clone(), observations)
        })
        .collect();

    let batch = triangulate_linear_sequence(&frames);
    for (frame, batched) in frames.iter().zip(&batch) {
        let single = triangulate_linear(
            &frame.projections[0],
            &frame.projections[1],
            &frame.observations[0],
            &frame.observations[1],
        );
        assert_eq!(single.unwrap(), *batched.as_ref().unwrap());
    }
}
