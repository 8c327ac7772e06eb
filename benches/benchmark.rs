use criterion::{Criterion, black_box, criterion_group, criterion_main};
use multiview_triangulation::projection::project;
use multiview_triangulation::scenario::{look_at_projection, orbiting_rig};
use multiview_triangulation::triangulation::{
    RefineOptions, ResidualMode, reprojection_residuals, triangulate_linear, triangulate_refine,
};
use multiview_triangulation::types::{FrameObservations, Point3D};
use nalgebra as na;

fn test_frame(cameras: usize) -> (FrameObservations, Point3D) {
    let intrinsics = na::Matrix3::new(800.0, 0.0, 320.0, 0.0, 800.0, 240.0, 0.0, 0.0, 1.0);
    let x = Point3D::new(1.0, 2.0, 10.0);
    let target = Point3D::new(0.0, 2.0, 0.0);
    let projections = orbiting_rig(cameras, 1, 25.0, 8.0, &target, &intrinsics)
        .pop()
        .unwrap();
    let observations = projections.iter().map(|p| project(p, &x).unwrap()).collect();
    (FrameObservations::new(projections, observations), x)
}

fn bench_linear_triangulation(c: &mut Criterion) {
    let intrinsics = na::Matrix3::identity();
    let p0 = look_at_projection(
        &intrinsics,
        &na::Point3::new(5.0, 2.0, -10.0),
        &na::Point3::new(0.0, 0.0, 10.0),
    );
    let p1 = look_at_projection(
        &intrinsics,
        &na::Point3::new(-6.0, 3.0, -9.0),
        &na::Point3::new(0.0, 0.0, 10.0),
    );
    let x = Point3D::new(1.0, 2.0, 10.0);
    let x0 = project(&p0, &x).unwrap();
    let x1 = project(&p1, &x).unwrap();

    c.bench_function("triangulate_linear", |b| {
        b.iter(|| triangulate_linear(black_box(&p0), black_box(&p1), black_box(&x0), black_box(&x1)))
    });
}

fn bench_residual_evaluation(c: &mut Criterion) {
    let (frame, x) = test_frame(4);

    c.bench_function("reprojection_residuals", |b| {
        b.iter(|| reprojection_residuals(black_box(&x), black_box(&frame), ResidualMode::Scalar))
    });
}

fn bench_refinement(c: &mut Criterion) {
    let (frame, _) = test_frame(4);
    let opts = RefineOptions::default();

    c.bench_function("triangulate_refine", |b| {
        b.iter(|| triangulate_refine(black_box(&frame), black_box(&opts)))
    });
}

criterion_group!(
    benches,
    bench_linear_triangulation,
    bench_residual_evaluation,
    bench_refinement
);
criterion_main!(benches);
