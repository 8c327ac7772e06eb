use thiserror::Error;

/// Per-time-step failure taxonomy. Every error is local to one time step;
/// the batch drivers report them per step and keep processing the rest of
/// the sequence.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TriangulationError {
    /// The homogeneous denominator of a projection is numerically zero
    /// (point on the camera's principal plane).
    #[error("degenerate projection: homogeneous denominator {denominator:.3e}")]
    DegenerateProjection { denominator: f64 },

    /// The two-view linear system is ill-conditioned (near-collinear rays
    /// or a solution at infinity).
    #[error("degenerate triangulation: {reason}")]
    DegenerateTriangulation { reason: &'static str },

    /// Projection matrices and observations disagree in length for one
    /// time step.
    #[error("shape mismatch: {projections} projection matrices vs {observations} observations")]
    InputShapeMismatch {
        projections: usize,
        observations: usize,
    },

    /// The two-view linear path takes an exact camera count.
    #[error("expected exactly {expected} cameras, got {got}")]
    CameraCountExact { expected: usize, got: usize },

    /// The refiner takes a minimum camera count.
    #[error("expected at least {expected} cameras, got {got}")]
    CameraCountAtLeast { expected: usize, got: usize },
}
