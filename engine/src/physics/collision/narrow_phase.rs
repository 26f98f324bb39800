//! Narrow phase collision detection for generating contact points

use super::{mesh, raycast, ContactGeom, PosedShape};
use crate::physics::shape::ShapeKind;
use glam::{Quat, Vec3};
use std::cmp::Ordering;

/// Spheres sampled along a capsule axis when no exact routine exists
const CAPSULE_SAMPLES: usize = 5;

/// Two contact points closer than this are merged
const MERGE_DISTANCE: f32 = 1e-3;

/// Generate up to `max_contacts` contact points between two posed shapes,
/// deepest first. Normals point from `a` to `b`.
///
/// Ray contacts report the hit distance as depth; unsupported pairs produce
/// no contacts.
pub fn collide(a: &PosedShape, b: &PosedShape, max_contacts: usize) -> Vec<ContactGeom> {
    let mut contacts = match collide_ordered(a, b) {
        Some(contacts) => contacts,
        None => collide_ordered(b, a)
            .map(|contacts| contacts.into_iter().map(ContactGeom::flipped).collect())
            .unwrap_or_default(),
    };

    contacts.sort_by(|x, y| y.depth.partial_cmp(&x.depth).unwrap_or(Ordering::Equal));
    contacts.truncate(max_contacts);
    contacts
}

/// Returns `None` when this ordering of the pair has no routine
fn collide_ordered(a: &PosedShape, b: &PosedShape) -> Option<Vec<ContactGeom>> {
    let contacts = match (&a.kind, &b.kind) {
        (ShapeKind::Ray { .. }, ShapeKind::Ray { .. }) => Vec::new(),
        (ShapeKind::Ray { length, direction }, _) => {
            let direction = a.rotation * *direction;
            raycast::cast_ray(a.position, direction, *length, b)
                .map(|hit| ContactGeom::new(hit.position, -hit.normal, hit.distance))
                .into_iter()
                .collect()
        }

        (ShapeKind::Sphere { radius: ra }, ShapeKind::Sphere { radius: rb }) => {
            sphere_sphere(a.position, *ra, b.position, *rb).into_iter().collect()
        }
        (ShapeKind::Sphere { radius }, ShapeKind::Box { size }) => {
            sphere_box(a.position, *radius, b.position, b.rotation, *size * 0.5)
                .into_iter()
                .collect()
        }
        (ShapeKind::Sphere { radius }, ShapeKind::Capsule { radius: rb, length }) => {
            let (start, end) = segment(b, *length);
            let closest = closest_point_on_segment(a.position, start, end);
            sphere_sphere(a.position, *radius, closest, *rb).into_iter().collect()
        }
        (ShapeKind::Sphere { radius }, ShapeKind::Cylinder { radius: rb, length }) => {
            sphere_cylinder(a.position, *radius, b, *rb, *length)
                .into_iter()
                .collect()
        }
        (ShapeKind::Sphere { radius }, ShapeKind::Plane { normal, offset }) => {
            sphere_plane(a.position, *radius, *normal, *offset)
                .into_iter()
                .collect()
        }
        (ShapeKind::Sphere { radius }, ShapeKind::Trimesh(trimesh)) => {
            mesh::sphere_trimesh(a.position, *radius, trimesh, b)
        }
        (ShapeKind::Sphere { radius }, ShapeKind::HeightField(field)) => {
            mesh::points_height_field(&[a.position], *radius, field, b)
        }

        (ShapeKind::Box { size: sa }, ShapeKind::Box { size: sb }) => box_box(
            a.position,
            a.rotation,
            *sa * 0.5,
            b.position,
            b.rotation,
            *sb * 0.5,
        ),
        (
            ShapeKind::Box { size },
            ShapeKind::Capsule { radius, length } | ShapeKind::Cylinder { radius, length },
        ) => {
            let (start, end) = segment(b, *length);
            sample_segment(start, end)
                .filter_map(|center| {
                    sphere_box(center, *radius, a.position, a.rotation, *size * 0.5)
                })
                .map(ContactGeom::flipped)
                .collect()
        }
        (ShapeKind::Box { size }, ShapeKind::Plane { normal, offset }) => {
            box_corners(a.position, a.rotation, *size * 0.5)
                .into_iter()
                .filter_map(|corner| point_plane(corner, 0.0, *normal, *offset))
                .collect()
        }
        (ShapeKind::Box { size }, ShapeKind::Trimesh(trimesh)) => {
            mesh::box_trimesh(a, *size * 0.5, trimesh, b)
        }
        (ShapeKind::Box { size }, ShapeKind::HeightField(field)) => {
            let corners = box_corners(a.position, a.rotation, *size * 0.5);
            mesh::points_height_field(&corners, 0.0, field, b)
        }

        (ShapeKind::Cylinder { radius, length }, ShapeKind::Plane { normal, offset }) => {
            cylinder_plane(a, *radius, *length, *normal, *offset)
        }
        (ShapeKind::Capsule { radius, length }, ShapeKind::Plane { normal, offset }) => {
            let (start, end) = segment(a, *length);
            [start, end]
                .into_iter()
                .filter_map(|center| sphere_plane(center, *radius, *normal, *offset))
                .collect()
        }
        (
            ShapeKind::Capsule {
                radius: ra,
                length: la,
            }
            | ShapeKind::Cylinder {
                radius: ra,
                length: la,
            },
            ShapeKind::Capsule {
                radius: rb,
                length: lb,
            }
            | ShapeKind::Cylinder {
                radius: rb,
                length: lb,
            },
        ) => capsule_capsule(segment(a, *la), *ra, segment(b, *lb), *rb),
        (
            ShapeKind::Capsule { radius, length } | ShapeKind::Cylinder { radius, length },
            ShapeKind::Trimesh(trimesh),
        ) => {
            let (start, end) = segment(a, *length);
            sample_segment(start, end)
                .flat_map(|center| mesh::sphere_trimesh(center, *radius, trimesh, b))
                .collect()
        }
        (
            ShapeKind::Capsule { radius, length } | ShapeKind::Cylinder { radius, length },
            ShapeKind::HeightField(field),
        ) => {
            let (start, end) = segment(a, *length);
            let centers: Vec<Vec3> = sample_segment(start, end).collect();
            mesh::points_height_field(&centers, *radius, field, b)
        }

        (ShapeKind::Trimesh(trimesh), ShapeKind::Plane { normal, offset }) => {
            mesh::trimesh_plane(trimesh, a, *normal, *offset)
        }

        (ShapeKind::Plane { .. }, ShapeKind::Plane { .. })
        | (ShapeKind::Trimesh(_), ShapeKind::Trimesh(_))
        | (
            ShapeKind::HeightField(_),
            ShapeKind::Plane { .. } | ShapeKind::Trimesh(_) | ShapeKind::HeightField(_),
        ) => Vec::new(),

        _ => return None,
    };
    Some(contacts)
}

/// End points of a Y aligned segment of `length` centered on the shape
fn segment(shape: &PosedShape, length: f32) -> (Vec3, Vec3) {
    let half = shape.rotation * Vec3::Y * (length * 0.5);
    (shape.position - half, shape.position + half)
}

fn sample_segment(start: Vec3, end: Vec3) -> impl Iterator<Item = Vec3> {
    (0..CAPSULE_SAMPLES).map(move |i| start.lerp(end, i as f32 / (CAPSULE_SAMPLES - 1) as f32))
}

pub fn closest_point_on_segment(point: Vec3, start: Vec3, end: Vec3) -> Vec3 {
    let ab = end - start;
    let length_sq = ab.length_squared();
    if length_sq <= f32::EPSILON {
        return start;
    }
    let t = ((point - start).dot(ab) / length_sq).clamp(0.0, 1.0);
    start + ab * t
}

/// Closest points between segments `p1 q1` and `p2 q2`
pub fn closest_points_segments(p1: Vec3, q1: Vec3, p2: Vec3, q2: Vec3) -> (Vec3, Vec3) {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.length_squared();
    let e = d2.length_squared();
    let f = d2.dot(r);

    let (s, t) = if a <= f32::EPSILON && e <= f32::EPSILON {
        (0.0, 0.0)
    } else if a <= f32::EPSILON {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(r);
        if e <= f32::EPSILON {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(d2);
            let denom = a * e - b * b;
            let mut s = if denom > f32::EPSILON {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let mut t = (b * s + f) / e;
            if t < 0.0 {
                t = 0.0;
                s = (-c / a).clamp(0.0, 1.0);
            } else if t > 1.0 {
                t = 1.0;
                s = ((b - c) / a).clamp(0.0, 1.0);
            }
            (s, t)
        }
    };

    (p1 + d1 * s, p2 + d2 * t)
}

/// Test for collision between two spheres
pub fn sphere_sphere(pos_a: Vec3, radius_a: f32, pos_b: Vec3, radius_b: f32) -> Option<ContactGeom> {
    let delta = pos_b - pos_a;
    let distance_sq = delta.length_squared();
    let radius_sum = radius_a + radius_b;

    if distance_sq >= radius_sum * radius_sum {
        return None;
    }

    let distance = distance_sq.sqrt();
    let normal = if distance > f32::EPSILON {
        delta / distance
    } else {
        // Concentric spheres, use arbitrary normal
        Vec3::Y
    };

    let penetration = radius_sum - distance;
    let contact_point = pos_a + normal * (radius_a - penetration * 0.5);

    Some(ContactGeom::new(contact_point, normal, penetration))
}

/// Test collision between a sphere and a box. The normal points from the
/// sphere into the box.
pub fn sphere_box(
    sphere_pos: Vec3,
    sphere_radius: f32,
    box_pos: Vec3,
    box_rot: Quat,
    box_half_extents: Vec3,
) -> Option<ContactGeom> {
    // Transform sphere to box's local space
    let local_sphere_pos = box_rot.conjugate() * (sphere_pos - box_pos);

    // Find closest point on box to sphere center
    let closest = local_sphere_pos.clamp(-box_half_extents, box_half_extents);

    let delta = local_sphere_pos - closest;
    let distance_sq = delta.length_squared();

    if distance_sq >= sphere_radius * sphere_radius {
        return None;
    }

    let distance = distance_sq.sqrt();
    let (outward, penetration) = if distance > f32::EPSILON {
        (delta / distance, sphere_radius - distance)
    } else {
        // Sphere center is inside box, push out through the closest face
        let face_distances = box_half_extents - local_sphere_pos.abs();
        let sign = |v: f32| if v < 0.0 { -1.0 } else { 1.0 };
        if face_distances.x <= face_distances.y && face_distances.x <= face_distances.z {
            (Vec3::X * sign(local_sphere_pos.x), sphere_radius + face_distances.x)
        } else if face_distances.y <= face_distances.z {
            (Vec3::Y * sign(local_sphere_pos.y), sphere_radius + face_distances.y)
        } else {
            (Vec3::Z * sign(local_sphere_pos.z), sphere_radius + face_distances.z)
        }
    };

    let normal = -(box_rot * outward);
    // Contact point on the sphere surface, facing the box
    let contact_point = sphere_pos + normal * sphere_radius;

    Some(ContactGeom::new(contact_point, normal, penetration))
}

/// Sphere against a Y aligned solid cylinder
fn sphere_cylinder(
    sphere_pos: Vec3,
    sphere_radius: f32,
    cylinder: &PosedShape,
    radius: f32,
    length: f32,
) -> Option<ContactGeom> {
    let half_length = length * 0.5;
    let local = cylinder.to_local(sphere_pos);
    let radial = Vec3::new(local.x, 0.0, local.z);
    let radial_length = radial.length();

    let inside = local.y.abs() <= half_length && radial_length <= radius;
    let (outward, penetration) = if inside {
        let side = radius - radial_length;
        let cap = half_length - local.y.abs();
        if side < cap {
            let direction = if radial_length > f32::EPSILON {
                radial / radial_length
            } else {
                Vec3::X
            };
            (direction, sphere_radius + side)
        } else {
            (Vec3::Y * local.y.signum(), sphere_radius + cap)
        }
    } else {
        let clamped_radial = if radial_length > radius {
            radial * (radius / radial_length)
        } else {
            radial
        };
        let closest = clamped_radial + Vec3::Y * local.y.clamp(-half_length, half_length);
        let delta = local - closest;
        let distance = delta.length();
        if distance >= sphere_radius || distance <= f32::EPSILON {
            return None;
        }
        (delta / distance, sphere_radius - distance)
    };

    let normal = -(cylinder.rotation * outward);
    Some(ContactGeom::new(
        sphere_pos + normal * sphere_radius,
        normal,
        penetration,
    ))
}

/// Sphere against the half-space below `normal · p = offset`
fn sphere_plane(center: Vec3, radius: f32, normal: Vec3, offset: f32) -> Option<ContactGeom> {
    point_plane(center, radius, normal, offset)
}

fn point_plane(point: Vec3, radius: f32, normal: Vec3, offset: f32) -> Option<ContactGeom> {
    let distance = normal.dot(point) - offset;
    if distance >= radius {
        return None;
    }
    Some(ContactGeom::new(
        point - normal * radius,
        -normal,
        radius - distance,
    ))
}

fn cylinder_plane(
    cylinder: &PosedShape,
    radius: f32,
    length: f32,
    normal: Vec3,
    offset: f32,
) -> Vec<ContactGeom> {
    let axis = cylinder.rotation * Vec3::Y;
    let u = cylinder.rotation * Vec3::X;
    let v = cylinder.rotation * Vec3::Z;

    // Direction within the cap plane that points furthest below the plane
    let down = -(normal - axis * normal.dot(axis));
    let deepest = (down.length_squared() > 1e-8).then(|| down.normalize() * radius);

    let mut contacts: Vec<ContactGeom> = Vec::new();
    for cap in [-1.0, 1.0] {
        let center = cylinder.position + axis * (length * 0.5 * cap);
        let rim = [u * radius, -u * radius, v * radius, -v * radius];
        for offset_point in deepest.into_iter().chain(rim) {
            let point = center + offset_point;
            if let Some(contact) = point_plane(point, 0.0, normal, offset) {
                push_unique(&mut contacts, contact);
            }
        }
    }
    contacts
}

fn capsule_capsule(
    (start_a, end_a): (Vec3, Vec3),
    radius_a: f32,
    (start_b, end_b): (Vec3, Vec3),
    radius_b: f32,
) -> Vec<ContactGeom> {
    let (closest_a, closest_b) = closest_points_segments(start_a, end_a, start_b, end_b);

    let mut candidates = vec![(closest_a, closest_b)];
    // End points keep parallel capsules from balancing on a single contact
    for point in [start_a, end_a] {
        candidates.push((point, closest_point_on_segment(point, start_b, end_b)));
    }
    for point in [start_b, end_b] {
        candidates.push((closest_point_on_segment(point, start_a, end_a), point));
    }

    let mut contacts = Vec::new();
    for (point_a, point_b) in candidates {
        if let Some(contact) = sphere_sphere(point_a, radius_a, point_b, radius_b) {
            push_unique(&mut contacts, contact);
        }
    }
    contacts
}

fn push_unique(contacts: &mut Vec<ContactGeom>, contact: ContactGeom) {
    let duplicate = contacts
        .iter()
        .any(|existing| existing.position.distance_squared(contact.position) < MERGE_DISTANCE * MERGE_DISTANCE);
    if !duplicate {
        contacts.push(contact);
    }
}

pub(crate) fn box_axes(rotation: Quat) -> [Vec3; 3] {
    [rotation * Vec3::X, rotation * Vec3::Y, rotation * Vec3::Z]
}

pub(crate) fn box_corners(position: Vec3, rotation: Quat, half_extents: Vec3) -> [Vec3; 8] {
    let mut corners = [Vec3::ZERO; 8];
    for (i, corner) in corners.iter_mut().enumerate() {
        let signs = Vec3::new(
            if i & 1 == 0 { -1.0 } else { 1.0 },
            if i & 2 == 0 { -1.0 } else { 1.0 },
            if i & 4 == 0 { -1.0 } else { 1.0 },
        );
        *corner = position + rotation * (half_extents * signs);
    }
    corners
}

/// Half width of a box projected onto `axis`
pub(crate) fn projected_radius(axes: &[Vec3; 3], extents: Vec3, axis: Vec3) -> f32 {
    extents.x * axes[0].dot(axis).abs()
        + extents.y * axes[1].dot(axis).abs()
        + extents.z * axes[2].dot(axis).abs()
}

/// Test collision between two boxes using SAT (Separating Axis Theorem)
fn box_box(
    pos_a: Vec3,
    rot_a: Quat,
    extents_a: Vec3,
    pos_b: Vec3,
    rot_b: Quat,
    extents_b: Vec3,
) -> Vec<ContactGeom> {
    let axes_a = box_axes(rot_a);
    let axes_b = box_axes(rot_b);
    let center_delta = pos_b - pos_a;

    let mut candidate_axes: Vec<Vec3> = axes_a.iter().chain(axes_b.iter()).copied().collect();
    for axis_a in &axes_a {
        for axis_b in &axes_b {
            let axis = axis_a.cross(*axis_b);
            // Parallel edges
            if axis.length_squared() > 1e-6 {
                candidate_axes.push(axis.normalize());
            }
        }
    }

    let mut min_penetration = f32::MAX;
    let mut best_axis = Vec3::ZERO;
    for axis in candidate_axes {
        let Some((penetration, flip)) =
            test_separation_axis(axis, center_delta, extents_a, extents_b, &axes_a, &axes_b)
        else {
            return Vec::new();
        };

        if penetration < min_penetration {
            min_penetration = penetration;
            best_axis = if flip { -axis } else { axis };
        }
    }

    let normal = best_axis;
    let max_a = pos_a.dot(normal) + projected_radius(&axes_a, extents_a, normal);
    let min_b = pos_b.dot(normal) - projected_radius(&axes_b, extents_b, normal);

    let inside = |point: Vec3, center: Vec3, rotation: Quat, extents: Vec3| {
        let local = rotation.conjugate() * (point - center);
        local.abs().cmple(extents + Vec3::splat(MERGE_DISTANCE)).all()
    };

    let mut contacts = Vec::new();
    for corner in box_corners(pos_b, rot_b, extents_b) {
        let depth = max_a - corner.dot(normal);
        if depth > 0.0 && inside(corner, pos_a, rot_a, extents_a) {
            contacts.push(ContactGeom::new(corner, normal, depth.min(min_penetration)));
        }
    }
    for corner in box_corners(pos_a, rot_a, extents_a) {
        let depth = corner.dot(normal) - min_b;
        if depth > 0.0 && inside(corner, pos_b, rot_b, extents_b) {
            contacts.push(ContactGeom::new(corner, normal, depth.min(min_penetration)));
        }
    }

    if contacts.is_empty() {
        // Edge-edge contact, use the midpoint of the deepest support points
        let support_a = get_box_support_point(pos_a, &axes_a, extents_a, normal);
        let support_b = get_box_support_point(pos_b, &axes_b, extents_b, -normal);
        contacts.push(ContactGeom::new(
            (support_a + support_b) * 0.5,
            normal,
            min_penetration,
        ));
    }
    contacts
}

/// Test a separation axis for the SAT algorithm.
/// Returns the overlap and whether B lies on the negative side of `axis`.
fn test_separation_axis(
    axis: Vec3,
    center_delta: Vec3,
    extents_a: Vec3,
    extents_b: Vec3,
    axes_a: &[Vec3; 3],
    axes_b: &[Vec3; 3],
) -> Option<(f32, bool)> {
    let separation = center_delta.dot(axis);
    let penetration = projected_radius(axes_a, extents_a, axis)
        + projected_radius(axes_b, extents_b, axis)
        - separation.abs();

    if penetration < 0.0 {
        None
    } else {
        Some((penetration, separation < 0.0))
    }
}

/// Get the support point of a box in a given direction
pub(crate) fn get_box_support_point(center: Vec3, axes: &[Vec3; 3], extents: Vec3, direction: Vec3) -> Vec3 {
    let mut support = center;
    for (axis, extent) in axes.iter().zip(extents.to_array()) {
        if axis.dot(direction) > 0.0 {
            support += *axis * extent;
        } else {
            support -= *axis * extent;
        }
    }
    support
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn posed(kind: ShapeKind, position: Vec3) -> PosedShape {
        PosedShape::new(kind, position, Quat::IDENTITY)
    }

    fn plane() -> PosedShape {
        posed(
            ShapeKind::Plane {
                normal: Vec3::Y,
                offset: 0.0,
            },
            Vec3::ZERO,
        )
    }

    #[test]
    fn test_sphere_sphere_collision() {
        let contact = sphere_sphere(Vec3::ZERO, 1.0, Vec3::new(1.5, 0.0, 0.0), 1.0).unwrap();
        assert!((contact.depth - 0.5).abs() < 1e-6);
        assert!((contact.normal - Vec3::X).length() < 1e-6);
    }

    #[test]
    fn test_sphere_box_normal_points_into_box() {
        let contact = sphere_box(
            Vec3::new(1.5, 0.0, 0.0),
            1.0,
            Vec3::ZERO,
            Quat::IDENTITY,
            Vec3::ONE,
        )
        .unwrap();
        assert!((contact.depth - 0.5).abs() < 1e-6);
        assert!((contact.normal - Vec3::NEG_X).length() < 1e-6);
    }

    #[test]
    fn test_no_collision() {
        assert!(sphere_sphere(Vec3::ZERO, 1.0, Vec3::new(10.0, 0.0, 0.0), 1.0).is_none());
    }

    #[test]
    fn test_collide_flips_reversed_pairs() {
        let sphere = posed(ShapeKind::Sphere { radius: 1.0 }, Vec3::new(0.0, 0.5, 0.0));
        let ground = plane();

        let forward = collide(&sphere, &ground, 40);
        let reverse = collide(&ground, &sphere, 40);
        assert_eq!(forward.len(), 1);
        assert_eq!(reverse.len(), 1);
        assert!((forward[0].normal - Vec3::NEG_Y).length() < 1e-6);
        assert!((reverse[0].normal - Vec3::Y).length() < 1e-6);
        assert!((forward[0].depth - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_box_resting_on_plane_has_four_contacts() {
        let cube = posed(
            ShapeKind::Box {
                size: Vec3::splat(1.0),
            },
            Vec3::new(0.0, 0.45, 0.0),
        );
        let contacts = collide(&cube, &plane(), 40);
        assert_eq!(contacts.len(), 4);
        for contact in &contacts {
            assert!((contact.depth - 0.05).abs() < 1e-5);
        }
    }

    #[test]
    fn test_max_contacts_truncates() {
        let cube = posed(
            ShapeKind::Box {
                size: Vec3::splat(1.0),
            },
            Vec3::new(0.0, 0.45, 0.0),
        );
        assert_eq!(collide(&cube, &plane(), 2).len(), 2);
    }

    #[test]
    fn test_stacked_boxes_manifold() {
        let lower = posed(
            ShapeKind::Box {
                size: Vec3::splat(2.0),
            },
            Vec3::ZERO,
        );
        let upper = posed(
            ShapeKind::Box {
                size: Vec3::splat(1.0),
            },
            Vec3::new(0.0, 1.4, 0.0),
        );
        let contacts = collide(&lower, &upper, 40);
        assert_eq!(contacts.len(), 4);
        for contact in &contacts {
            assert!((contact.normal - Vec3::Y).length() < 1e-5);
            assert!((contact.depth - 0.1).abs() < 1e-4);
        }
    }

    #[test]
    fn test_separated_boxes() {
        let a = posed(ShapeKind::Box { size: Vec3::ONE }, Vec3::ZERO);
        let b = posed(ShapeKind::Box { size: Vec3::ONE }, Vec3::new(0.0, 0.0, 3.0));
        assert!(collide(&a, &b, 40).is_empty());
    }

    #[test]
    fn test_capsule_lying_on_plane() {
        let capsule = PosedShape::new(
            ShapeKind::Capsule {
                radius: 0.5,
                length: 2.0,
            },
            Vec3::new(0.0, 0.4, 0.0),
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
        );
        let contacts = collide(&capsule, &plane(), 40);
        assert_eq!(contacts.len(), 2);
    }

    #[test]
    fn test_upright_cylinder_on_plane() {
        let cylinder = posed(
            ShapeKind::Cylinder {
                radius: 0.5,
                length: 1.0,
            },
            Vec3::new(0.0, 0.49, 0.0),
        );
        let contacts = collide(&cylinder, &plane(), 40);
        assert_eq!(contacts.len(), 4);
    }

    #[test]
    fn test_sphere_against_cylinder_side() {
        let sphere = posed(ShapeKind::Sphere { radius: 0.5 }, Vec3::new(0.9, 0.0, 0.0));
        let cylinder = posed(
            ShapeKind::Cylinder {
                radius: 0.5,
                length: 2.0,
            },
            Vec3::ZERO,
        );
        let contacts = collide(&sphere, &cylinder, 40);
        assert_eq!(contacts.len(), 1);
        assert!((contacts[0].depth - 0.1).abs() < 1e-5);
        assert!((contacts[0].normal - Vec3::NEG_X).length() < 1e-5);
    }

    #[test]
    fn test_crossed_capsules() {
        let a = PosedShape::new(
            ShapeKind::Capsule {
                radius: 0.5,
                length: 2.0,
            },
            Vec3::ZERO,
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
        );
        let b = PosedShape::new(
            ShapeKind::Capsule {
                radius: 0.5,
                length: 2.0,
            },
            Vec3::new(0.0, 0.8, 0.0),
            Quat::from_rotation_x(std::f32::consts::FRAC_PI_2),
        );
        let contacts = collide(&a, &b, 40);
        assert!(!contacts.is_empty());
        assert!((contacts[0].depth - 0.2).abs() < 1e-4);
        assert!((contacts[0].normal - Vec3::Y).length() < 1e-4);
    }

    #[test]
    fn test_ray_reports_distance() {
        let ray = PosedShape::new(
            ShapeKind::Ray {
                length: 10.0,
                direction: Vec3::NEG_Y,
            },
            Vec3::new(0.0, 5.0, 0.0),
            Quat::IDENTITY,
        );
        let contacts = collide(&plane(), &ray, 40);
        assert_eq!(contacts.len(), 1);
        assert!((contacts[0].depth - 5.0).abs() < 1e-5);
        // Reversed order: normal points from the plane towards the ray
        assert!((contacts[0].normal - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_unsupported_pairs_are_empty() {
        let mesh = Arc::new(crate::physics::trimesh::TriMesh::new(
            &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0],
            &[0, 1, 2],
        ));
        let a = posed(ShapeKind::Trimesh(mesh.clone()), Vec3::ZERO);
        let b = posed(ShapeKind::Trimesh(mesh), Vec3::ZERO);
        assert!(collide(&a, &b, 40).is_empty());
        assert!(collide(&plane(), &plane(), 40).is_empty());
    }
}
