//! Triangle mesh data for static collision geometry

use super::collision::AABB;
use glam::Vec3;

/// Indexed triangle mesh in shape-local space
#[derive(Debug, Clone)]
pub struct TriMesh {
    vertices: Vec<Vec3>,
    triangles: Vec<[u32; 3]>,
    aabb: AABB,
}

impl TriMesh {
    /// Build a mesh from flat xyz vertex data and triangle indices.
    ///
    /// # Panics
    ///
    /// Panics when the buffers are not multiples of three, when there are no
    /// triangles, or when an index points past the vertex data.
    pub fn new(vertices: &[f32], indices: &[u32]) -> Self {
        assert!(
            vertices.len() % 3 == 0,
            "trimesh vertex data must hold xyz triples, got {} floats",
            vertices.len()
        );
        assert!(
            !indices.is_empty() && indices.len() % 3 == 0,
            "trimesh index data must hold whole triangles, got {} indices",
            indices.len()
        );

        let points: &[[f32; 3]] = bytemuck::cast_slice(vertices);
        let triangles: &[[u32; 3]] = bytemuck::cast_slice(indices);

        let vertex_count = points.len() as u32;
        if let Some(bad) = indices.iter().find(|&&i| i >= vertex_count) {
            panic!("trimesh index {bad} is out of range for {vertex_count} vertices");
        }

        let vertices: Vec<Vec3> = points.iter().map(|p| Vec3::from_array(*p)).collect();
        let mut aabb = AABB::new(Vec3::splat(f32::MAX), Vec3::splat(f32::MIN));
        for triangle in triangles {
            for &index in triangle {
                aabb.expand_to_include(vertices[index as usize]);
            }
        }

        Self {
            vertices,
            triangles: triangles.to_vec(),
            aabb,
        }
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Corner positions of triangle `index`
    pub fn triangle(&self, index: usize) -> [Vec3; 3] {
        let [a, b, c] = self.triangles[index];
        [
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        ]
    }

    /// Bounds of the referenced vertices in local space
    pub fn local_aabb(&self) -> AABB {
        self.aabb
    }
}
