//! Rigid body physics with contact lifecycle tracking
//!
//! The [`PhysicsWorld`] owns every shape, body and joint. Collision contacts
//! are collected per step into body-level and shape-level pairs that report
//! begin and end exactly once to registered [`PhysicsWorldListener`]s.

pub mod body;
pub mod collision;
pub mod contact_pairs;
pub mod error;
pub mod height_field;
pub mod joints;
pub mod listener;
pub mod shape;
pub mod solver;
pub mod trimesh;
pub mod world;

// Re-export commonly used types
pub use body::{BodyHandle, RigidBody};
pub use collision::{ContactGeom, AABB};
pub use contact_pairs::{ContactEvent, ContactPair};
pub use error::PhysicsError;
pub use height_field::{HeightField, HeightFieldParams, HeightProvider};
pub use joints::JointHandle;
pub use listener::{ContactEndpoint, ListenerId, ListenerRegistry, PhysicsWorldListener};
pub use shape::{Shape, ShapeHandle, ShapeKind, ShapeType};
pub use trimesh::TriMesh;
pub use world::{ContactInfo, PhysicsWorld};
