//! Error type for fallible physics world operations

use super::body::BodyHandle;
use super::joints::JointHandle;
use super::shape::{ShapeHandle, ShapeType};

/// Errors returned by [`PhysicsWorld`](super::PhysicsWorld) operations.
///
/// Programmer errors such as negative sizes or masses are not represented
/// here; those panic at the call site.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PhysicsError {
    #[error("rigid body {0:?} does not exist")]
    UnknownBody(BodyHandle),

    #[error("shape {0:?} does not exist")]
    UnknownShape(ShapeHandle),

    #[error("joint {0:?} does not exist")]
    UnknownJoint(JointHandle),

    #[error("shape is a {actual:?}, expected {expected:?}")]
    ShapeMismatch {
        expected: ShapeType,
        actual: ShapeType,
    },

    #[error("solver produced a non-finite state for rigid body {0:?}")]
    SolverDiverged(BodyHandle),
}
