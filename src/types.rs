use nalgebra as na;

use crate::error::TriangulationError;

/// 3x4 pinhole projection matrix (K * [R|t]) for one camera at one time step.
pub type ProjectionMatrix = na::SMatrix<f64, 3, 4>;

/// Pixel coordinates of the tracked point in one camera.
pub type Point2D = na::Vector2<f64>;

/// World coordinates of the tracked point.
pub type Point3D = na::Vector3<f64>;

/// One time step's input: per-camera projection matrices and the matching
/// pixel observations. Both vectors are indexed by the same camera order,
/// and that order must stay stable across time steps.
#[derive(Debug, Clone)]
pub struct FrameObservations {
    pub projections: Vec<ProjectionMatrix>,
    pub observations: Vec<Point2D>,
}

impl FrameObservations {
    pub fn new(
        projections: Vec<ProjectionMatrix>,
        observations: Vec<Point2D>,
    ) -> FrameObservations {
        FrameObservations {
            projections,
            observations,
        }
    }

    pub fn camera_count(&self) -> usize {
        self.projections.len()
    }

    pub fn validate(&self) -> Result<(), TriangulationError> {
        if self.projections.len() != self.observations.len() {
            return Err(TriangulationError::InputShapeMismatch {
                projections: self.projections.len(),
                observations: self.observations.len(),
            });
        }
        Ok(())
    }
}

/// Output of the nonlinear refiner for one time step.
#[derive(Debug, Clone, Copy)]
pub struct RefinedPoint {
    pub point: Point3D,
    /// Half the squared norm of the final residual vector, in pixels.
    pub final_cost: f64,
    /// False when the solver stopped on its iteration budget instead of its
    /// gradient tolerance. `point` still holds the last iterate.
    pub converged: bool,
}
