//! Contacts against triangle meshes and height fields

use super::narrow_phase::{box_axes, box_corners, get_box_support_point, projected_radius};
use super::{ContactGeom, PosedShape, AABB};
use crate::physics::height_field::HeightField;
use crate::physics::trimesh::TriMesh;
use glam::Vec3;

/// Closest point to `p` on triangle `abc`
pub fn closest_point_on_triangle(p: Vec3, [a, b, c]: [Vec3; 3]) -> Vec3 {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        return a + ab * (d1 / (d1 - d3));
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        return a + ac * (d2 / (d2 - d6));
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        return b + (c - b) * ((d4 - d3) / ((d4 - d3) + (d5 - d6)));
    }

    let denom = 1.0 / (va + vb + vc);
    a + ab * (vb * denom) + ac * (vc * denom)
}

fn triangle_normal([a, b, c]: [Vec3; 3]) -> Vec3 {
    (b - a).cross(c - a).normalize_or_zero()
}

fn triangle_aabb([a, b, c]: [Vec3; 3]) -> AABB {
    let mut aabb = AABB::new(a, a);
    aabb.expand_to_include(b);
    aabb.expand_to_include(c);
    aabb
}

/// Sphere against a single triangle in the same frame. The normal points
/// from the sphere into the triangle.
fn sphere_triangle(center: Vec3, radius: f32, triangle: [Vec3; 3]) -> Option<ContactGeom> {
    let closest = closest_point_on_triangle(center, triangle);
    let delta = closest - center;
    let distance = delta.length();
    if distance >= radius {
        return None;
    }

    let normal = if distance > f32::EPSILON {
        delta / distance
    } else {
        -triangle_normal(triangle)
    };
    Some(ContactGeom::new(closest, normal, radius - distance))
}

/// Sphere in world space against a posed mesh
pub fn sphere_trimesh(center: Vec3, radius: f32, mesh: &TriMesh, posed: &PosedShape) -> Vec<ContactGeom> {
    let local_center = posed.to_local(center);
    let bounds = AABB::from_center_half_extents(local_center, Vec3::splat(radius));

    (0..mesh.triangle_count())
        .map(|index| mesh.triangle(index))
        .filter(|triangle| triangle_aabb(*triangle).overlaps(&bounds))
        .filter_map(|triangle| sphere_triangle(local_center, radius, triangle))
        .map(|contact| {
            ContactGeom::new(
                posed.to_world(contact.position),
                posed.rotation * contact.normal,
                contact.depth,
            )
        })
        .collect()
}

fn point_in_triangle(point: Vec3, [a, b, c]: [Vec3; 3], normal: Vec3) -> bool {
    let edges = [(a, b), (b, c), (c, a)];
    edges
        .iter()
        .all(|(start, end)| (*end - *start).cross(point - *start).dot(normal) >= -1e-6)
}

/// Oriented box against a posed mesh using per-triangle SAT
pub fn box_trimesh(
    cube: &PosedShape,
    half_extents: Vec3,
    mesh: &TriMesh,
    posed: &PosedShape,
) -> Vec<ContactGeom> {
    // Work in mesh space
    let center = posed.to_local(cube.position);
    let rotation = posed.rotation.conjugate() * cube.rotation;
    let axes = box_axes(rotation);
    let corners = box_corners(center, rotation, half_extents);
    let bounds = AABB::from_center_half_extents(
        center,
        Vec3::new(
            projected_radius(&axes, half_extents, Vec3::X),
            projected_radius(&axes, half_extents, Vec3::Y),
            projected_radius(&axes, half_extents, Vec3::Z),
        ),
    );

    let mut contacts = Vec::new();
    for index in 0..mesh.triangle_count() {
        let triangle = mesh.triangle(index);
        if !triangle_aabb(triangle).overlaps(&bounds) {
            continue;
        }
        let face_normal = triangle_normal(triangle);
        if face_normal == Vec3::ZERO {
            continue;
        }

        let [a, b, c] = triangle;
        let edges = [b - a, c - b, a - c];
        let mut test_axes = vec![face_normal];
        test_axes.extend_from_slice(&axes);
        for axis in &axes {
            for edge in &edges {
                let cross = axis.cross(*edge);
                if cross.length_squared() > 1e-6 {
                    test_axes.push(cross.normalize());
                }
            }
        }

        let triangle_center = (a + b + c) / 3.0;
        let mut best: Option<(f32, Vec3, bool)> = None;
        let mut separated = false;
        for (axis_index, axis) in test_axes.iter().enumerate() {
            let box_center = center.dot(*axis);
            let box_radius = projected_radius(&axes, half_extents, *axis);
            let projections = [a.dot(*axis), b.dot(*axis), c.dot(*axis)];
            let tri_min = projections.iter().copied().fold(f32::MAX, f32::min);
            let tri_max = projections.iter().copied().fold(f32::MIN, f32::max);

            let overlap = (box_center + box_radius - tri_min).min(tri_max - (box_center - box_radius));
            if overlap < 0.0 {
                separated = true;
                break;
            }

            let towards_triangle = if box_center <= triangle_center.dot(*axis) {
                *axis
            } else {
                -*axis
            };
            if best.map_or(true, |(depth, _, _)| overlap < depth) {
                best = Some((overlap, towards_triangle, axis_index == 0));
            }
        }
        if separated {
            continue;
        }
        let Some((depth, normal, is_face_axis)) = best else {
            continue;
        };

        let mut found = false;
        if is_face_axis {
            let plane_offset = face_normal.dot(a);
            for corner in &corners {
                // Corners that crossed the triangle plane along the contact normal
                let behind = (corner.dot(face_normal) - plane_offset) * normal.dot(face_normal);
                if behind > 0.0 && point_in_triangle(*corner, triangle, face_normal) {
                    contacts.push(ContactGeom::new(
                        posed.to_world(*corner),
                        posed.rotation * normal,
                        behind.min(depth),
                    ));
                    found = true;
                }
            }
        }
        if !found {
            let support = get_box_support_point(center, &axes, half_extents, normal);
            contacts.push(ContactGeom::new(
                posed.to_world(support),
                posed.rotation * normal,
                depth,
            ));
        }
    }
    contacts
}

/// Mesh vertices against the half-space below `normal · p = offset`
pub fn trimesh_plane(mesh: &TriMesh, posed: &PosedShape, normal: Vec3, offset: f32) -> Vec<ContactGeom> {
    mesh.vertices()
        .iter()
        .map(|vertex| posed.to_world(*vertex))
        .filter_map(|point| {
            let distance = normal.dot(point) - offset;
            (distance < 0.0).then(|| ContactGeom::new(point, -normal, -distance))
        })
        .collect()
}

/// Spheres of `radius` (points when zero) against a posed height field.
/// Normals point from the spheres into the field.
pub fn points_height_field(
    centers: &[Vec3],
    radius: f32,
    field: &HeightField,
    posed: &PosedShape,
) -> Vec<ContactGeom> {
    let floor = field.min_height() - field.params().thickness - radius;

    centers
        .iter()
        .filter_map(|center| {
            let local = posed.to_local(*center);
            if local.y < floor {
                return None;
            }
            let height = field.height_at(local.x, local.z)?;
            let surface_normal = field.normal_at(local.x, local.z);
            // Distance to the tangent plane through the surface point below
            let distance = (local.y - height) * surface_normal.y;
            if distance >= radius {
                return None;
            }
            Some(ContactGeom::new(
                posed.to_world(Vec3::new(local.x, height, local.z)),
                -(posed.rotation * surface_normal),
                radius - distance,
            ))
        })
        .collect()
}
