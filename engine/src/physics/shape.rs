//! Collision shapes owned by the physics world

use super::body::BodyHandle;
use super::error::PhysicsError;
use super::height_field::HeightField;
use super::trimesh::TriMesh;
use glam::{Quat, Vec3};
use hecs::Entity;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Opaque identifier of a shape inside a [`PhysicsWorld`](super::PhysicsWorld)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeHandle(pub(crate) Entity);

impl ShapeHandle {
    /// Stable numeric id, unique among live shapes and bodies of one world
    pub fn id(&self) -> u64 {
        self.0.to_bits().get()
    }
}

/// Shape type identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeType {
    Sphere,
    Box,
    Capsule,
    Cylinder,
    Trimesh,
    Plane,
    Ray,
    HeightField,
}

/// Geometry of a shape.
///
/// Capsules and cylinders are aligned with the local Y axis. `length` is the
/// distance between cap centers for capsules and the full height for
/// cylinders. Planes live in world space and ignore the shape pose.
#[derive(Debug, Clone)]
pub enum ShapeKind {
    Sphere { radius: f32 },
    /// Full edge lengths along the local axes
    Box { size: Vec3 },
    Capsule { radius: f32, length: f32 },
    Cylinder { radius: f32, length: f32 },
    Trimesh(Arc<TriMesh>),
    /// Half-space below `normal · p = offset`
    Plane { normal: Vec3, offset: f32 },
    /// Segment from the shape position along the local `direction`
    Ray { length: f32, direction: Vec3 },
    HeightField(Arc<HeightField>),
}

impl ShapeKind {
    pub fn shape_type(&self) -> ShapeType {
        match self {
            ShapeKind::Sphere { .. } => ShapeType::Sphere,
            ShapeKind::Box { .. } => ShapeType::Box,
            ShapeKind::Capsule { .. } => ShapeType::Capsule,
            ShapeKind::Cylinder { .. } => ShapeType::Cylinder,
            ShapeKind::Trimesh(_) => ShapeType::Trimesh,
            ShapeKind::Plane { .. } => ShapeType::Plane,
            ShapeKind::Ray { .. } => ShapeType::Ray,
            ShapeKind::HeightField(_) => ShapeType::HeightField,
        }
    }
}

pub(crate) fn assert_positive(what: &str, value: f32) {
    assert!(
        value > 0.0 && value.is_finite(),
        "{what} must be positive, got {value}"
    );
}

/// Shape component stored in the world registry
#[derive(Debug, Clone)]
pub struct Shape {
    kind: ShapeKind,
    friction: f32,
    influence_other_bodies: bool,
    pub(crate) body: Option<BodyHandle>,
    pub(crate) position: Vec3,
    pub(crate) rotation: Quat,
    /// Caller owned value, never read by the world
    pub user_data: u64,
}

impl Shape {
    pub(crate) fn new(kind: ShapeKind, friction: f32) -> Self {
        Self {
            kind,
            friction,
            influence_other_bodies: true,
            body: None,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            user_data: 0,
        }
    }

    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    pub fn shape_type(&self) -> ShapeType {
        self.kind.shape_type()
    }

    pub fn friction(&self) -> f32 {
        self.friction
    }

    /// # Panics
    ///
    /// Panics on negative or non-finite friction.
    pub fn set_friction(&mut self, friction: f32) {
        assert!(
            friction >= 0.0 && friction.is_finite(),
            "friction must not be negative, got {friction}"
        );
        self.friction = friction;
    }

    /// Whether contacts with this shape push the other side.
    /// Only consulted when the shape has no body.
    pub fn influence_other_bodies(&self) -> bool {
        self.influence_other_bodies
    }

    pub fn set_influence_other_bodies(&mut self, influence: bool) {
        self.influence_other_bodies = influence;
    }

    /// Owning body, if the shape is attached to one
    pub fn body(&self) -> Option<BodyHandle> {
        self.body
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Place the shape. Attached shapes are moved back onto their body at
    /// the next step.
    pub fn set_position(&mut self, x: f32, y: f32, z: f32) {
        self.position = Vec3::new(x, y, z);
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation.normalize();
    }

    fn mismatch(&self, expected: ShapeType) -> PhysicsError {
        PhysicsError::ShapeMismatch {
            expected,
            actual: self.shape_type(),
        }
    }

    /// Radius of spheres, capsules and cylinders
    pub fn radius(&self) -> Option<f32> {
        match self.kind {
            ShapeKind::Sphere { radius }
            | ShapeKind::Capsule { radius, .. }
            | ShapeKind::Cylinder { radius, .. } => Some(radius),
            _ => None,
        }
    }

    /// The owning body picks up the new inertia at the next step.
    ///
    /// # Panics
    ///
    /// Panics on a non-positive radius.
    pub fn set_radius(&mut self, value: f32) -> Result<(), PhysicsError> {
        assert_positive("radius", value);
        match &mut self.kind {
            ShapeKind::Sphere { radius }
            | ShapeKind::Capsule { radius, .. }
            | ShapeKind::Cylinder { radius, .. } => {
                *radius = value;
                Ok(())
            }
            _ => Err(self.mismatch(ShapeType::Sphere)),
        }
    }

    /// Length of capsules, cylinders and rays
    pub fn length(&self) -> Option<f32> {
        match self.kind {
            ShapeKind::Capsule { length, .. }
            | ShapeKind::Cylinder { length, .. }
            | ShapeKind::Ray { length, .. } => Some(length),
            _ => None,
        }
    }

    /// # Panics
    ///
    /// Panics on a non-positive length.
    pub fn set_length(&mut self, value: f32) -> Result<(), PhysicsError> {
        assert_positive("length", value);
        match &mut self.kind {
            ShapeKind::Capsule { length, .. }
            | ShapeKind::Cylinder { length, .. }
            | ShapeKind::Ray { length, .. } => {
                *length = value;
                Ok(())
            }
            _ => Err(self.mismatch(ShapeType::Capsule)),
        }
    }

    /// Full edge lengths of a box
    pub fn box_size(&self) -> Option<Vec3> {
        match self.kind {
            ShapeKind::Box { size } => Some(size),
            _ => None,
        }
    }

    /// # Panics
    ///
    /// Panics when any edge length is not positive.
    pub fn set_box_size(&mut self, x: f32, y: f32, z: f32) -> Result<(), PhysicsError> {
        assert_positive("box x size", x);
        assert_positive("box y size", y);
        assert_positive("box z size", z);
        match &mut self.kind {
            ShapeKind::Box { size } => {
                *size = Vec3::new(x, y, z);
                Ok(())
            }
            _ => Err(self.mismatch(ShapeType::Box)),
        }
    }

    /// Unit direction of a ray in shape-local space
    pub fn ray_direction(&self) -> Option<Vec3> {
        match self.kind {
            ShapeKind::Ray { direction, .. } => Some(direction),
            _ => None,
        }
    }

    /// # Panics
    ///
    /// Panics on a zero or non-finite direction.
    pub fn set_ray_direction(&mut self, x: f32, y: f32, z: f32) -> Result<(), PhysicsError> {
        let value = Vec3::new(x, y, z);
        assert!(
            value.is_finite() && value.length_squared() > 0.0,
            "ray direction must be a non-zero vector, got {value}"
        );
        match &mut self.kind {
            ShapeKind::Ray { direction, .. } => {
                *direction = value.normalize();
                Ok(())
            }
            _ => Err(self.mismatch(ShapeType::Ray)),
        }
    }

    /// Normal and offset of a plane
    pub fn plane(&self) -> Option<(Vec3, f32)> {
        match self.kind {
            ShapeKind::Plane { normal, offset } => Some((normal, offset)),
            _ => None,
        }
    }

    /// # Panics
    ///
    /// Panics on a zero or non-finite normal.
    pub fn set_plane(&mut self, normal: Vec3, offset: f32) -> Result<(), PhysicsError> {
        assert!(
            normal.is_finite() && normal.length_squared() > 0.0 && offset.is_finite(),
            "plane needs a non-zero normal and a finite offset, got {normal} / {offset}"
        );
        match &mut self.kind {
            ShapeKind::Plane {
                normal: n,
                offset: d,
            } => {
                let length = normal.length();
                *n = normal / length;
                *d = offset / length;
                Ok(())
            }
            _ => Err(self.mismatch(ShapeType::Plane)),
        }
    }

    pub fn trimesh(&self) -> Option<&TriMesh> {
        match &self.kind {
            ShapeKind::Trimesh(mesh) => Some(&**mesh),
            _ => None,
        }
    }

    pub fn height_field(&self) -> Option<&HeightField> {
        match &self.kind {
            ShapeKind::HeightField(field) => Some(&**field),
            _ => None,
        }
    }
}
