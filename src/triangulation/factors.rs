use nalgebra as na;
use tiny_solver::factors::Factor;

use crate::error::TriangulationError;
use crate::projection::{project, project_generic};
use crate::types::{FrameObservations, Point2D, Point3D, ProjectionMatrix};

/// Smoothing term under the scalar residual's square root inside the solver
/// factor; bounds the derivative at zero error. Adds at most sqrt of this to
/// each residual, far below every tolerance in use.
const NORM_SMOOTHING: f64 = 1e-18;

/// How per-camera reprojection errors enter the least-squares solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResidualMode {
    /// One Euclidean-distance scalar per camera. Discards the direction of
    /// each camera's error.
    #[default]
    Scalar,
    /// Two signed components per camera (observed minus projected).
    SignedPerAxis,
}

/// Reprojection residuals of a candidate point against one frame: one entry
/// per camera in `Scalar` mode, two per camera in `SignedPerAxis` mode, in
/// camera order.
pub fn reprojection_residuals(
    point: &Point3D,
    frame: &FrameObservations,
    mode: ResidualMode,
) -> Result<Vec<f64>, TriangulationError> {
    frame.validate()?;
    let mut out = Vec::with_capacity(match mode {
        ResidualMode::Scalar => frame.camera_count(),
        ResidualMode::SignedPerAxis => 2 * frame.camera_count(),
    });
    for (p, obs) in frame.projections.iter().zip(&frame.observations) {
        let projected = project(p, point)?;
        let d = obs - projected;
        match mode {
            ResidualMode::Scalar => out.push(d.norm()),
            ResidualMode::SignedPerAxis => {
                out.push(d.x);
                out.push(d.y);
            }
        }
    }
    Ok(out)
}

/// Least-squares factor over the 3 coordinates of one time step's point.
#[derive(Debug, Clone)]
pub struct ReprojectionFactor {
    projections: Vec<ProjectionMatrix>,
    observations: Vec<Point2D>,
    mode: ResidualMode,
}

impl ReprojectionFactor {
    pub fn new(frame: &FrameObservations, mode: ResidualMode) -> ReprojectionFactor {
        ReprojectionFactor {
            projections: frame.projections.clone(),
            observations: frame.observations.clone(),
            mode,
        }
    }

    pub fn residual_len(&self) -> usize {
        match self.mode {
            ResidualMode::Scalar => self.projections.len(),
            ResidualMode::SignedPerAxis => 2 * self.projections.len(),
        }
    }

    fn residual_generic<T: na::RealField>(&self, point: &na::DVector<T>) -> na::DVector<T> {
        debug_assert_eq!(point.len(), 3, "point block must have 3 params");
        let x = na::Vector3::new(point[0].clone(), point[1].clone(), point[2].clone());
        let mut out = Vec::with_capacity(self.residual_len());
        for (p, obs) in self.projections.iter().zip(&self.observations) {
            let p_t = p.map(|v| T::from_f64(v).unwrap());
            let projected = project_generic(&p_t, &x);
            let du = T::from_f64(obs.x).unwrap() - projected.x.clone();
            let dv = T::from_f64(obs.y).unwrap() - projected.y.clone();
            match self.mode {
                ResidualMode::Scalar => {
                    let eps = T::from_f64(NORM_SMOOTHING).unwrap();
                    out.push((du.clone() * du + dv.clone() * dv + eps).sqrt());
                }
                ResidualMode::SignedPerAxis => {
                    out.push(du);
                    out.push(dv);
                }
            }
        }
        na::DVector::from_vec(out)
    }
}

impl<T: na::RealField> Factor<T> for ReprojectionFactor {
    fn residual_func(&self, params: &[na::DVector<T>]) -> na::DVector<T> {
        debug_assert_eq!(params.len(), 1, "expected a single point parameter block");
        self.residual_generic(&params[0])
    }
}
