//! Collision detection subsystem

pub mod broad_phase;
pub mod mesh;
pub mod narrow_phase;
pub mod raycast;
pub mod shapes;

pub use narrow_phase::collide;

use super::shape::ShapeKind;
use glam::{Quat, Vec3};

/// A single contact point between two shapes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactGeom {
    /// World space contact point
    pub position: Vec3,
    /// Contact normal pointing from A to B
    pub normal: Vec3,
    /// Penetration depth. For rays this is the distance to the hit.
    pub depth: f32,
}

impl ContactGeom {
    pub fn new(position: Vec3, normal: Vec3, depth: f32) -> Self {
        Self {
            position,
            normal,
            depth,
        }
    }

    /// Swap A and B
    pub fn flipped(self) -> Self {
        Self {
            position: self.position,
            normal: -self.normal,
            depth: self.depth,
        }
    }
}

/// Shape geometry with its world pose, detached from the registry so the
/// narrow phase can run on worker threads
#[derive(Debug, Clone)]
pub struct PosedShape {
    pub kind: ShapeKind,
    pub position: Vec3,
    pub rotation: Quat,
}

impl PosedShape {
    pub fn new(kind: ShapeKind, position: Vec3, rotation: Quat) -> Self {
        Self {
            kind,
            position,
            rotation,
        }
    }

    pub fn to_local(&self, point: Vec3) -> Vec3 {
        self.rotation.conjugate() * (point - self.position)
    }

    pub fn to_world(&self, point: Vec3) -> Vec3 {
        self.position + self.rotation * point
    }
}

/// Create an orthonormal basis given a normal vector
pub fn create_tangent_basis(normal: Vec3) -> (Vec3, Vec3) {
    // Choose a vector that's not parallel to the normal
    let up = if normal.y.abs() < 0.9 { Vec3::Y } else { Vec3::X };

    let tangent = up.cross(normal).normalize();
    let bitangent = normal.cross(tangent);

    (tangent, bitangent)
}

/// Axis-aligned bounding box for broad phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    pub min: Vec3,
    pub max: Vec3,
}

impl AABB {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB from a center point and half-extents
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Check if this AABB overlaps with another
    pub fn overlaps(&self, other: &AABB) -> bool {
        self.min.cmple(other.max).all() && self.max.cmpge(other.min).all()
    }

    /// Expand this AABB to include a point
    pub fn expand_to_include(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Merge two AABBs
    pub fn merge(&self, other: &AABB) -> AABB {
        AABB {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Bounds of this box after rotating and translating it
    pub fn transformed(&self, position: Vec3, rotation: Quat) -> AABB {
        let center = position + rotation * self.center();
        let half = self.half_extents();
        let basis = glam::Mat3::from_quat(rotation);
        let extent = basis.x_axis.abs() * half.x + basis.y_axis.abs() * half.y + basis.z_axis.abs() * half.z;
        AABB::from_center_half_extents(center, extent)
    }
}
