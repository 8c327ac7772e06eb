use clap::Parser;
use multiview_triangulation::projection::project;
use multiview_triangulation::scenario::{ball_trajectory, orbiting_rig};
use multiview_triangulation::triangulation::{
    InitialGuessStrategy, RefineOptions, ResidualMode, triangulate_linear_sequence,
    triangulate_refine_sequence,
};
use multiview_triangulation::types::{FrameObservations, Point3D};
use nalgebra as na;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::time::Instant;

#[derive(Parser)]
#[command(version, about = "Synthetic moving-camera triangulation demo")]
struct DemoCli {
    /// number of time steps
    #[arg(long, default_value = "100")]
    steps: usize,

    /// number of cameras on the rig (>= 2)
    #[arg(long, default_value = "3")]
    cameras: usize,

    /// uniform pixel noise amplitude added to every observation
    #[arg(long, default_value = "0.0")]
    noise: f64,

    /// seed for the pixel noise
    #[arg(long, default_value = "42")]
    seed: u64,

    /// warm start the refiner from the two-view linear estimate
    #[arg(long)]
    warm_start: bool,

    /// use signed per-axis residuals instead of per-camera scalars
    #[arg(long)]
    signed_residuals: bool,

    /// write the recovered trajectories to this JSON file
    #[arg(long)]
    output: Option<String>,
}

#[derive(Serialize)]
struct TrajectoryExport {
    method: String,
    points: Vec<Option<[f64; 3]>>,
}

fn main() {
    env_logger::init();
    let cli = DemoCli::parse();
    assert!(cli.cameras >= 2, "need at least two cameras");

    let intrinsics = na::Matrix3::new(800.0, 0.0, 320.0, 0.0, 800.0, 240.0, 0.0, 0.0, 1.0);
    let truth = ball_trajectory(cli.steps, 0.02);
    let target = Point3D::new(3.0, 2.0, 1.0);
    let rig = orbiting_rig(cli.cameras, cli.steps, 25.0, 8.0, &target, &intrinsics);

    let mut rng = ChaCha8Rng::seed_from_u64(cli.seed);
    let frames: Vec<FrameObservations> = truth
        .iter()
        .zip(&rig)
        .map(|(point, projections)| {
            let observations = projections
                .iter()
                .map(|p| {
                    let mut obs = project(p, point).expect("synthetic camera is degenerate");
                    if cli.noise > 0.0 {
                        obs.x += rng.random_range(-cli.noise..cli.noise);
                        obs.y += rng.random_range(-cli.noise..cli.noise);
                    }
                    obs
                })
                .collect();
            FrameObservations::new(projections.clone(), observations)
        })
        .collect();

    // Two-view linear pass over the first two cameras of the rig.
    let two_view_frames: Vec<FrameObservations> = frames
        .iter()
        .map(|f| {
            FrameObservations::new(
                f.projections[..2].to_vec(),
                f.observations[..2].to_vec(),
            )
        })
        .collect();
    let now = Instant::now();
    let linear = triangulate_linear_sequence(&two_view_frames);
    println!(
        "linear: {} steps in {:.3} ms",
        linear.len(),
        now.elapsed().as_secs_f64() * 1e3
    );
    report("linear", &linear_points(&linear), &truth);

    let opts = RefineOptions {
        initial_guess: if cli.warm_start {
            InitialGuessStrategy::LinearTwoView
        } else {
            InitialGuessStrategy::Origin
        },
        residual_mode: if cli.signed_residuals {
            ResidualMode::SignedPerAxis
        } else {
            ResidualMode::Scalar
        },
        ..RefineOptions::default()
    };
    let now = Instant::now();
    let refined = triangulate_refine_sequence(&frames, &opts);
    println!(
        "refine: {} steps in {:.3} ms",
        refined.len(),
        now.elapsed().as_secs_f64() * 1e3
    );
    let refined_points: Vec<Option<Point3D>> = refined
        .iter()
        .map(|r| r.as_ref().ok().map(|rp| rp.point))
        .collect();
    report("refine", &refined_points, &truth);
    let unconverged = refined
        .iter()
        .filter(|r| matches!(r, Ok(rp) if !rp.converged))
        .count();
    if unconverged > 0 {
        println!("refine: {unconverged} steps hit the iteration budget");
    }

    if let Some(path) = cli.output {
        let exports = vec![
            export("linear", &linear_points(&linear)),
            export("refine", &refined_points),
        ];
        let json = serde_json::to_string_pretty(&exports).unwrap();
        std::fs::write(&path, json).unwrap();
        println!("wrote {path}");
    }
}

fn linear_points(
    results: &[Result<Point3D, multiview_triangulation::error::TriangulationError>],
) -> Vec<Option<Point3D>> {
    results.iter().map(|r| r.as_ref().ok().copied()).collect()
}

fn report(label: &str, estimates: &[Option<Point3D>], truth: &[Point3D]) {
    let mut sq_sum = 0.0;
    let mut n = 0usize;
    for (estimate, gt) in estimates.iter().zip(truth) {
        if let Some(p) = estimate {
            sq_sum += (p - gt).norm_squared();
            n += 1;
        }
    }
    let failed = estimates.len() - n;
    if n == 0 {
        println!("{label}: all steps failed");
        return;
    }
    println!(
        "{label}: rmse {:.6} over {n} steps ({failed} failed)",
        (sq_sum / n as f64).sqrt()
    );
}

fn export(method: &str, estimates: &[Option<Point3D>]) -> TrajectoryExport {
    TrajectoryExport {
        method: method.to_string(),
        points: estimates
            .iter()
            .map(|p| p.map(|v| [v.x, v.y, v.z]))
            .collect(),
    }
}
