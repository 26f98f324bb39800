//! Ray casts against shape geometry

use super::PosedShape;
use crate::physics::height_field::HeightField;
use crate::physics::shape::ShapeKind;
use crate::physics::trimesh::TriMesh;
use glam::Vec3;

/// Upper bound of samples taken when marching a ray over a height field
const MAX_MARCH_STEPS: usize = 4096;
const BISECTION_STEPS: usize = 12;

/// Raycast result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// Distance along the ray to the hit point
    pub distance: f32,
    /// World space hit point
    pub position: Vec3,
    /// Outward surface normal at the hit point
    pub normal: Vec3,
}

/// Cast a ray of `length` from `origin` along the unit `direction` against a
/// posed shape and return the closest hit.
pub fn cast_ray(origin: Vec3, direction: Vec3, length: f32, target: &PosedShape) -> Option<RaycastHit> {
    if let ShapeKind::Plane { normal, offset } = target.kind {
        // Planes are already in world space
        return ray_plane(origin, direction, normal, offset)
            .filter(|&t| t <= length)
            .map(|t| RaycastHit {
                distance: t,
                position: origin + direction * t,
                normal,
            });
    }

    let local_origin = target.to_local(origin);
    let local_direction = target.rotation.conjugate() * direction;

    let (t, local_normal) = match &target.kind {
        ShapeKind::Sphere { radius } => ray_sphere(local_origin, local_direction, Vec3::ZERO, *radius)?,
        ShapeKind::Box { size } => ray_box(local_origin, local_direction, *size * 0.5)?,
        ShapeKind::Capsule { radius, length } => ray_capsule(local_origin, local_direction, *radius, *length)?,
        ShapeKind::Cylinder { radius, length } => {
            ray_cylinder(local_origin, local_direction, *radius, *length)?
        }
        ShapeKind::Trimesh(mesh) => ray_trimesh(local_origin, local_direction, length, mesh)?,
        ShapeKind::HeightField(field) => ray_height_field(local_origin, local_direction, length, field)?,
        ShapeKind::Plane { .. } | ShapeKind::Ray { .. } => return None,
    };

    (t <= length).then(|| RaycastHit {
        distance: t,
        position: origin + direction * t,
        normal: target.rotation * local_normal,
    })
}

/// Smallest non-negative root pair of `a t² + b t + c`
fn solve_quadratic(a: f32, b: f32, c: f32) -> Option<(f32, f32)> {
    if a.abs() <= f32::EPSILON {
        return None;
    }
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }
    let sqrt_discriminant = discriminant.sqrt();
    let t1 = (-b - sqrt_discriminant) / (2.0 * a);
    let t2 = (-b + sqrt_discriminant) / (2.0 * a);
    Some((t1.min(t2), t1.max(t2)))
}

fn closest_candidate(candidates: impl IntoIterator<Item = (f32, Vec3)>) -> Option<(f32, Vec3)> {
    candidates
        .into_iter()
        .filter(|(t, _)| *t >= 0.0 && t.is_finite())
        .min_by(|a, b| a.0.total_cmp(&b.0))
}

fn ray_plane(origin: Vec3, direction: Vec3, normal: Vec3, offset: f32) -> Option<f32> {
    let denom = normal.dot(direction);
    if denom.abs() <= f32::EPSILON {
        return None;
    }
    let t = (offset - normal.dot(origin)) / denom;
    (t >= 0.0).then_some(t)
}

fn ray_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<(f32, Vec3)> {
    let oc = origin - center;
    let (t1, t2) = solve_quadratic(
        direction.dot(direction),
        2.0 * oc.dot(direction),
        oc.dot(oc) - radius * radius,
    )?;

    // Rays starting inside report the exit point
    let t = if t1 >= 0.0 { t1 } else { t2 };
    if t < 0.0 {
        return None;
    }
    let position = origin + direction * t;
    Some((t, (position - center) / radius))
}

/// Slab test against a box centered on the origin
fn ray_box(origin: Vec3, direction: Vec3, half_extents: Vec3) -> Option<(f32, Vec3)> {
    let inv_dir = direction.recip();
    let t1 = (-half_extents - origin) * inv_dir;
    let t2 = (half_extents - origin) * inv_dir;

    let t_near = t1.min(t2);
    let t_far = t1.max(t2);
    let t_enter = t_near.max_element();
    let t_exit = t_far.min_element();

    if t_enter > t_exit || t_exit < 0.0 {
        return None;
    }

    let (t, slabs, sign) = if t_enter >= 0.0 {
        (t_enter, t_near, -1.0)
    } else {
        (t_exit, t_far, 1.0)
    };

    let axis = (0..3)
        .find(|&i| slabs[i] == t)
        .unwrap_or(0);
    let mut normal = Vec3::ZERO;
    normal[axis] = sign * direction[axis].signum();
    Some((t, normal))
}

/// Ray against the lateral surface of a Y aligned cylinder
fn ray_cylinder_side(origin: Vec3, direction: Vec3, radius: f32, half_length: f32) -> Vec<(f32, Vec3)> {
    let Some((t1, t2)) = solve_quadratic(
        direction.x * direction.x + direction.z * direction.z,
        2.0 * (origin.x * direction.x + origin.z * direction.z),
        origin.x * origin.x + origin.z * origin.z - radius * radius,
    ) else {
        return Vec::new();
    };

    [t1, t2]
        .into_iter()
        .filter_map(|t| {
            let p = origin + direction * t;
            (p.y.abs() <= half_length).then(|| (t, Vec3::new(p.x, 0.0, p.z) / radius))
        })
        .collect()
}

fn ray_capsule(origin: Vec3, direction: Vec3, radius: f32, length: f32) -> Option<(f32, Vec3)> {
    let half_length = length * 0.5;
    let mut candidates = ray_cylinder_side(origin, direction, radius, half_length);

    for cap in [-1.0f32, 1.0] {
        let center = Vec3::Y * (half_length * cap);
        if let Some((t1, t2)) = solve_quadratic(
            direction.dot(direction),
            2.0 * (origin - center).dot(direction),
            (origin - center).length_squared() - radius * radius,
        ) {
            for t in [t1, t2] {
                let p = origin + direction * t;
                // Only the outer hemisphere belongs to the capsule
                if p.y * cap >= half_length {
                    candidates.push((t, (p - center) / radius));
                }
            }
        }
    }

    closest_candidate(candidates)
}

fn ray_cylinder(origin: Vec3, direction: Vec3, radius: f32, length: f32) -> Option<(f32, Vec3)> {
    let half_length = length * 0.5;
    let mut candidates = ray_cylinder_side(origin, direction, radius, half_length);

    for cap in [-1.0f32, 1.0] {
        let normal = Vec3::Y * cap;
        if let Some(t) = ray_plane(origin, direction, normal, half_length) {
            let p = origin + direction * t;
            if p.x * p.x + p.z * p.z <= radius * radius {
                candidates.push((t, normal));
            }
        }
    }

    closest_candidate(candidates)
}

/// Möller–Trumbore against every triangle, two sided
fn ray_trimesh(origin: Vec3, direction: Vec3, length: f32, mesh: &TriMesh) -> Option<(f32, Vec3)> {
    let mut best: Option<(f32, Vec3)> = None;

    for index in 0..mesh.triangle_count() {
        let [a, b, c] = mesh.triangle(index);
        let edge1 = b - a;
        let edge2 = c - a;
        let p = direction.cross(edge2);
        let det = edge1.dot(p);
        if det.abs() <= f32::EPSILON {
            continue;
        }
        let inv_det = 1.0 / det;
        let s = origin - a;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            continue;
        }
        let q = s.cross(edge1);
        let v = direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            continue;
        }
        let t = edge2.dot(q) * inv_det;
        if t < 0.0 || t > length || best.is_some_and(|(closest, _)| t >= closest) {
            continue;
        }

        let mut normal = edge1.cross(edge2).normalize();
        if normal.dot(direction) > 0.0 {
            normal = -normal;
        }
        best = Some((t, normal));
    }

    best
}

/// March along the ray until it passes below the surface, then refine the
/// crossing by bisection
fn ray_height_field(origin: Vec3, direction: Vec3, length: f32, field: &HeightField) -> Option<(f32, Vec3)> {
    let above = |t: f32| -> Option<f32> {
        let p = origin + direction * t;
        field.height_at(p.x, p.z).map(|h| p.y - h)
    };

    let steps = ((length / (field.min_spacing() * 0.5)).ceil() as usize).clamp(1, MAX_MARCH_STEPS);
    let step = length / steps as f32;

    let mut previous: Option<f32> = None;
    for i in 0..=steps {
        let t = step * i as f32;
        let Some(gap) = above(t) else {
            previous = None;
            continue;
        };

        if gap <= 0.0 {
            let hit = match previous {
                // Started below the surface
                None if i == 0 => 0.0,
                Some(previous_t) => {
                    let (mut low, mut high) = (previous_t, t);
                    for _ in 0..BISECTION_STEPS {
                        let mid = (low + high) * 0.5;
                        if above(mid).is_some_and(|g| g > 0.0) {
                            low = mid;
                        } else {
                            high = mid;
                        }
                    }
                    high
                }
                // Entered the field from outside its footprint
                None => t,
            };
            let p = origin + direction * hit;
            return Some((hit, field.normal_at(p.x, p.z)));
        }
        previous = Some(t);
    }

    None
}
