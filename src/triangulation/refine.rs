use std::collections::HashMap;

use log::debug;
use nalgebra as na;
use rayon::prelude::*;
use tiny_solver::LevenbergMarquardtOptimizer;
use tiny_solver::optimizer::{Optimizer, OptimizerOptions};
use tiny_solver::problem::Problem;

use crate::error::TriangulationError;
use crate::triangulation::factors::{ReprojectionFactor, ResidualMode, reprojection_residuals};
use crate::triangulation::linear::triangulate_linear;
use crate::types::{FrameObservations, Point3D, RefinedPoint};

/// Where the refiner starts each time step's solve.
#[derive(Debug, Clone, Copy, Default)]
pub enum InitialGuessStrategy {
    /// The coordinate origin, every step.
    #[default]
    Origin,
    /// A caller-supplied point, every step.
    Fixed(Point3D),
    /// Warm start from the two-view linear solution of the first two
    /// cameras; falls back to the origin when that solve is degenerate.
    LinearTwoView,
}

#[derive(Debug, Clone)]
pub struct RefineOptions {
    pub max_iterations: usize,
    pub residual_mode: ResidualMode,
    pub initial_guess: InitialGuessStrategy,
    /// Final cost at or under this counts as converged outright.
    pub cost_tol: f64,
    /// Otherwise the infinity norm of the cost gradient must fall under
    /// this bound for the solution to count as converged.
    pub gradient_tol: f64,
    pub verbosity: usize,
}

impl Default for RefineOptions {
    fn default() -> Self {
        let defaults = OptimizerOptions::default();
        RefineOptions {
            max_iterations: defaults.max_iteration,
            residual_mode: ResidualMode::default(),
            initial_guess: InitialGuessStrategy::default(),
            cost_tol: 1e-8,
            gradient_tol: 1e-3,
            verbosity: defaults.verbosity_level,
        }
    }
}

/// Levenberg-Marquardt refinement of one time step's point over M >= 2
/// cameras. Running out of iterations is not fatal: the last iterate comes
/// back with `converged == false`.
pub fn triangulate_refine(
    frame: &FrameObservations,
    opts: &RefineOptions,
) -> Result<RefinedPoint, TriangulationError> {
    frame.validate()?;
    let m = frame.camera_count();
    if m < 2 {
        return Err(TriangulationError::CameraCountAtLeast { expected: 2, got: m });
    }

    let factor = ReprojectionFactor::new(frame, opts.residual_mode);
    let mut problem = Problem::new();
    problem.add_residual_block(factor.residual_len(), &["point"], Box::new(factor), None);
    let optimizer = LevenbergMarquardtOptimizer::default();

    let primary = initial_guess(frame, opts.initial_guess);
    let mut point = primary;
    for (attempt, guess) in restart_guesses(frame, primary).into_iter().enumerate() {
        let initial_values = HashMap::from([(
            "point".to_string(),
            na::dvector![guess.x, guess.y, guess.z],
        )]);
        let options = OptimizerOptions {
            max_iteration: opts.max_iterations,
            verbosity_level: opts.verbosity,
            ..OptimizerOptions::default()
        };
        match optimizer.optimize(&problem, &initial_values, Some(options)) {
            Some(result) => {
                let x = result.get("point").unwrap();
                if x.iter().all(|v| v.is_finite()) {
                    point = Point3D::new(x[0], x[1], x[2]);
                    break;
                }
                debug!("attempt {attempt} ended on a non-finite iterate");
            }
            None => debug!("attempt {attempt} made no progress"),
        }
    }

    let final_cost = cost_at(frame, opts.residual_mode, &point);
    let converged = final_cost.is_finite()
        && (final_cost <= opts.cost_tol
            || gradient_inf_norm(frame, opts.residual_mode, &point) <= opts.gradient_tol);
    Ok(RefinedPoint {
        point,
        final_cost,
        converged,
    })
}

/// Refines a whole sequence, one independent solve per time step, in
/// parallel across steps. Output order matches input order and per-step
/// failures do not abort the batch.
pub fn triangulate_refine_sequence(
    frames: &[FrameObservations],
    opts: &RefineOptions,
) -> Vec<Result<RefinedPoint, TriangulationError>> {
    frames
        .par_iter()
        .map(|frame| triangulate_refine(frame, opts))
        .collect()
}

/// Restart ladder for one solve: the configured guess first, then the
/// two-view linear estimate, then a nudged copy of the first guess. Later
/// rungs only run when an attempt yields no finite iterate at all; a solve
/// that merely stalls keeps its last iterate.
fn restart_guesses(frame: &FrameObservations, primary: Point3D) -> Vec<Point3D> {
    let mut guesses = vec![primary];
    if let Ok(linear) = triangulate_linear(
        &frame.projections[0],
        &frame.projections[1],
        &frame.observations[0],
        &frame.observations[1],
    ) {
        if (linear - primary).norm() > 1e-9 {
            guesses.push(linear);
        }
    }
    guesses.push(primary + Point3D::new(1.0, 1.0, 1.0));
    guesses
}

fn initial_guess(frame: &FrameObservations, strategy: InitialGuessStrategy) -> Point3D {
    match strategy {
        InitialGuessStrategy::Origin => Point3D::zeros(),
        InitialGuessStrategy::Fixed(p) => p,
        InitialGuessStrategy::LinearTwoView => match triangulate_linear(
            &frame.projections[0],
            &frame.projections[1],
            &frame.observations[0],
            &frame.observations[1],
        ) {
            Ok(p) => p,
            Err(err) => {
                debug!("linear warm start failed ({err}), falling back to the origin");
                Point3D::zeros()
            }
        },
    }
}

fn cost_at(frame: &FrameObservations, mode: ResidualMode, point: &Point3D) -> f64 {
    match reprojection_residuals(point, frame, mode) {
        Ok(r) => 0.5 * r.iter().map(|v| v * v).sum::<f64>(),
        Err(_) => f64::INFINITY,
    }
}

/// Central-difference gradient of the cost, used only for the convergence
/// marker. A non-finite sample means a degenerate neighborhood and reports
/// as not converged.
fn gradient_inf_norm(frame: &FrameObservations, mode: ResidualMode, point: &Point3D) -> f64 {
    let mut g: f64 = 0.0;
    for i in 0..3 {
        let h = 1e-6 * (1.0 + point[i].abs());
        let mut xp = *point;
        let mut xm = *point;
        xp[i] += h;
        xm[i] -= h;
        let d = (cost_at(frame, mode, &xp) - cost_at(frame, mode, &xm)) / (2.0 * h);
        if !d.is_finite() {
            return f64::INFINITY;
        }
        g = g.max(d.abs());
    }
    g
}
