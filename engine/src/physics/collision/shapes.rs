//! Bounds, volume and mass properties of shape geometry

use crate::physics::shape::ShapeKind;
use glam::{Mat3, Quat, Vec3};
use std::f32::consts::PI;

use super::AABB;

impl ShapeKind {
    /// Get the AABB for this shape in local space. Planes are unbounded.
    pub fn local_aabb(&self) -> Option<AABB> {
        match self {
            ShapeKind::Sphere { radius } => Some(AABB::from_center_half_extents(
                Vec3::ZERO,
                Vec3::splat(*radius),
            )),
            ShapeKind::Box { size } => Some(AABB::from_center_half_extents(Vec3::ZERO, *size * 0.5)),
            ShapeKind::Capsule { radius, length } => Some(AABB::from_center_half_extents(
                Vec3::ZERO,
                Vec3::new(*radius, length * 0.5 + radius, *radius),
            )),
            ShapeKind::Cylinder { radius, length } => Some(AABB::from_center_half_extents(
                Vec3::ZERO,
                Vec3::new(*radius, length * 0.5, *radius),
            )),
            ShapeKind::Trimesh(mesh) => Some(mesh.local_aabb()),
            ShapeKind::Plane { .. } => None,
            ShapeKind::Ray { length, direction } => {
                let mut aabb = AABB::new(Vec3::ZERO, Vec3::ZERO);
                aabb.expand_to_include(*direction * *length);
                Some(aabb)
            }
            ShapeKind::HeightField(field) => Some(field.local_aabb()),
        }
    }

    /// Get the AABB for this shape transformed by position and rotation.
    /// Planes and tiling height fields are unbounded and return `None`.
    pub fn world_aabb(&self, position: Vec3, rotation: Quat) -> Option<AABB> {
        match self {
            // Spheres are rotation-invariant
            ShapeKind::Sphere { radius } => Some(AABB::from_center_half_extents(
                position,
                Vec3::splat(*radius),
            )),
            ShapeKind::Capsule { radius, length } => {
                let axis = rotation * Vec3::Y * (length * 0.5);
                let top = AABB::from_center_half_extents(position + axis, Vec3::splat(*radius));
                let bottom = AABB::from_center_half_extents(position - axis, Vec3::splat(*radius));
                Some(top.merge(&bottom))
            }
            ShapeKind::Ray { length, direction } => {
                let mut aabb = AABB::new(position, position);
                aabb.expand_to_include(position + rotation * *direction * *length);
                Some(aabb)
            }
            ShapeKind::HeightField(field) if field.is_tiling() => None,
            _ => self
                .local_aabb()
                .map(|aabb| aabb.transformed(position, rotation)),
        }
    }

    /// Get the volume of the shape. Open geometry has no volume.
    pub fn volume(&self) -> f32 {
        match self {
            ShapeKind::Sphere { radius } => (4.0 / 3.0) * PI * radius.powi(3),
            ShapeKind::Box { size } => size.x * size.y * size.z,
            ShapeKind::Capsule { radius, length } => {
                PI * radius.powi(2) * length + (4.0 / 3.0) * PI * radius.powi(3)
            }
            ShapeKind::Cylinder { radius, length } => PI * radius.powi(2) * length,
            ShapeKind::Trimesh(_)
            | ShapeKind::Plane { .. }
            | ShapeKind::Ray { .. }
            | ShapeKind::HeightField(_) => 0.0,
        }
    }

    /// Inertia tensor in shape space for a body of `mass` using this shape.
    /// Meshes use their bounding box; planes and rays a unit sphere.
    pub fn inertia(&self, mass: f32) -> Mat3 {
        match self {
            ShapeKind::Sphere { radius } => solid_sphere_inertia(mass, *radius),
            ShapeKind::Box { size } => solid_box_inertia(mass, *size),
            ShapeKind::Capsule { radius, length } => {
                // Split the mass between the cylinder and the two hemispheres by volume
                let cylinder_volume = PI * radius * radius * length;
                let sphere_volume = (4.0 / 3.0) * PI * radius.powi(3);
                let cylinder_mass = mass * cylinder_volume / (cylinder_volume + sphere_volume);
                let sphere_mass = mass - cylinder_mass;

                let cylinder = solid_cylinder_inertia(cylinder_mass, *radius, *length);
                let sphere_inertia = 0.4 * sphere_mass * radius * radius;
                // Hemisphere centroids sit 3r/8 beyond the cap centers
                let offset = length * 0.5 + 0.375 * radius;
                let transverse = sphere_inertia + sphere_mass * offset * offset;

                cylinder + Mat3::from_diagonal(Vec3::new(transverse, sphere_inertia, transverse))
            }
            ShapeKind::Cylinder { radius, length } => solid_cylinder_inertia(mass, *radius, *length),
            ShapeKind::Trimesh(_) | ShapeKind::HeightField(_) => self
                .local_aabb()
                .map(|aabb| solid_box_inertia(mass, aabb.half_extents() * 2.0))
                .unwrap_or(Mat3::ZERO),
            ShapeKind::Plane { .. } | ShapeKind::Ray { .. } => solid_sphere_inertia(mass, 1.0),
        }
    }

    /// Check if a point is inside the shape (in local space)
    pub fn contains_point(&self, point: Vec3) -> bool {
        match self {
            ShapeKind::Sphere { radius } => point.length() <= *radius,
            ShapeKind::Box { size } => {
                let half = *size * 0.5;
                point.abs().cmple(half).all()
            }
            ShapeKind::Capsule { radius, length } => {
                // Clamp point to the capsule line segment
                let clamped_y = point.y.clamp(-length * 0.5, length * 0.5);
                (point - Vec3::new(0.0, clamped_y, 0.0)).length() <= *radius
            }
            ShapeKind::Cylinder { radius, length } => {
                point.y.abs() <= length * 0.5 && Vec3::new(point.x, 0.0, point.z).length() <= *radius
            }
            ShapeKind::Plane { normal, offset } => normal.dot(point) <= *offset,
            ShapeKind::HeightField(field) => field
                .height_at(point.x, point.z)
                .map(|h| point.y <= h)
                .unwrap_or(false),
            ShapeKind::Trimesh(_) | ShapeKind::Ray { .. } => false,
        }
    }
}

pub fn solid_sphere_inertia(mass: f32, radius: f32) -> Mat3 {
    Mat3::from_diagonal(Vec3::splat(0.4 * mass * radius * radius))
}

pub fn solid_box_inertia(mass: f32, size: Vec3) -> Mat3 {
    let factor = mass / 12.0;
    Mat3::from_diagonal(Vec3::new(
        factor * (size.y * size.y + size.z * size.z),
        factor * (size.x * size.x + size.z * size.z),
        factor * (size.x * size.x + size.y * size.y),
    ))
}

/// Solid cylinder around the local Y axis
pub fn solid_cylinder_inertia(mass: f32, radius: f32, length: f32) -> Mat3 {
    let transverse = mass * (3.0 * radius * radius + length * length) / 12.0;
    Mat3::from_diagonal(Vec3::new(transverse, 0.5 * mass * radius * radius, transverse))
}
