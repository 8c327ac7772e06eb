use multiview_triangulation::error::TriangulationError;
use multiview_triangulation::types::{FrameObservations, Point2D, ProjectionMatrix};

#[test]
fn test_frame_observations_validate() {
    let frame = FrameObservations::new(
        vec![ProjectionMatrix::identity(), ProjectionMatrix::identity()],
        vec![Point2D::new(0.0, 0.0), Point2D::new(1.0, 1.0)],
    );
    assert_eq!(frame.camera_count(), 2);
    assert!(frame.validate().is_ok());
}

#[test]
fn test_frame_observations_mismatch() {
    let frame = FrameObservations::new(
        vec![ProjectionMatrix::identity(), ProjectionMatrix::identity()],
        vec![Point2D::new(0.0, 0.0)],
    );
    assert_eq!(
        frame.validate(),
        Err(TriangulationError::InputShapeMismatch {
            projections: 2,
            observations: 1,
        })
    );
}

#[test]
fn test_empty_frame_is_consistent() {
    let frame = FrameObservations::new(vec![], vec![]);
    assert_eq!(frame.camera_count(), 0);
    assert!(frame.validate().is_ok());
}
