//! Sampled height field terrain

use super::collision::AABB;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Layout of a height field.
///
/// The field is centered on its shape position, spans `width` along X and
/// `depth` along Z, and its surface faces +Y.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeightFieldParams {
    pub width: f32,
    pub depth: f32,
    pub width_samples: usize,
    pub depth_samples: usize,
    /// Multiplier applied to every provided height
    pub scale: f32,
    /// Added to every scaled height
    pub offset: f32,
    /// Extra solid depth below the lowest sample
    pub thickness: f32,
    /// Repeat the field infinitely along X and Z
    pub tiling: bool,
}

impl Default for HeightFieldParams {
    fn default() -> Self {
        Self {
            width: 1.0,
            depth: 1.0,
            width_samples: 2,
            depth_samples: 2,
            scale: 1.0,
            offset: 0.0,
            thickness: 1.0,
            tiling: false,
        }
    }
}

/// Height of the sample at grid column `x` and row `z`, before scale and offset
pub type HeightProvider<'a> = &'a dyn Fn(usize, usize) -> f32;

/// Height samples evaluated once at construction
#[derive(Debug, Clone)]
pub struct HeightField {
    params: HeightFieldParams,
    heights: Vec<f32>,
    min_height: f32,
    max_height: f32,
}

impl HeightField {
    /// Sample `provider(x, z)` for every grid point. Without a provider the
    /// field is flat at `offset`.
    ///
    /// # Panics
    ///
    /// Panics on non-positive extents, fewer than two samples per axis or a
    /// negative thickness.
    pub fn new(params: HeightFieldParams, provider: Option<HeightProvider<'_>>) -> Self {
        assert!(
            params.width > 0.0 && params.depth > 0.0,
            "height field extents must be positive, got {} x {}",
            params.width,
            params.depth
        );
        assert!(
            params.width_samples >= 2 && params.depth_samples >= 2,
            "height field needs at least 2 samples per axis, got {} x {}",
            params.width_samples,
            params.depth_samples
        );
        assert!(
            params.thickness >= 0.0,
            "height field thickness must not be negative, got {}",
            params.thickness
        );

        let mut heights = Vec::with_capacity(params.width_samples * params.depth_samples);
        for z in 0..params.depth_samples {
            for x in 0..params.width_samples {
                let raw = provider.map(|p| p(x, z)).unwrap_or(0.0);
                heights.push(raw * params.scale + params.offset);
            }
        }

        let min_height = heights.iter().copied().fold(f32::MAX, f32::min);
        let max_height = heights.iter().copied().fold(f32::MIN, f32::max);

        Self {
            params,
            heights,
            min_height,
            max_height,
        }
    }

    pub fn params(&self) -> &HeightFieldParams {
        &self.params
    }

    pub fn is_tiling(&self) -> bool {
        self.params.tiling
    }

    /// Stored height of grid point (x, z)
    pub fn sample(&self, x: usize, z: usize) -> f32 {
        self.heights[z * self.params.width_samples + x]
    }

    fn cell_size(&self) -> (f32, f32) {
        (
            self.params.width / (self.params.width_samples - 1) as f32,
            self.params.depth / (self.params.depth_samples - 1) as f32,
        )
    }

    /// Map a local coordinate onto the grid, wrapping when tiling.
    /// Returns `None` outside a non-tiling field.
    fn grid_coord(&self, value: f32, extent: f32) -> Option<f32> {
        let shifted = value + extent * 0.5;
        if self.params.tiling {
            Some(shifted.rem_euclid(extent))
        } else if (0.0..=extent).contains(&shifted) {
            Some(shifted)
        } else {
            None
        }
    }

    /// Interpolated surface height at local (x, z)
    pub fn height_at(&self, x: f32, z: f32) -> Option<f32> {
        let u = self.grid_coord(x, self.params.width)?;
        let v = self.grid_coord(z, self.params.depth)?;
        Some(self.interpolate(u, v))
    }

    fn interpolate(&self, u: f32, v: f32) -> f32 {
        let (dx, dz) = self.cell_size();
        let max_x = self.params.width_samples - 2;
        let max_z = self.params.depth_samples - 2;

        let cell_x = ((u / dx).floor() as usize).min(max_x);
        let cell_z = ((v / dz).floor() as usize).min(max_z);
        let fx = (u / dx - cell_x as f32).clamp(0.0, 1.0);
        let fz = (v / dz - cell_z as f32).clamp(0.0, 1.0);

        let h00 = self.sample(cell_x, cell_z);
        let h10 = self.sample(cell_x + 1, cell_z);
        let h01 = self.sample(cell_x, cell_z + 1);
        let h11 = self.sample(cell_x + 1, cell_z + 1);

        let near = h00 + (h10 - h00) * fx;
        let far = h01 + (h11 - h01) * fx;
        near + (far - near) * fz
    }

    /// Height at (x, z) with coordinates clamped onto the field
    fn height_clamped(&self, x: f32, z: f32) -> f32 {
        let half_w = self.params.width * 0.5;
        let half_d = self.params.depth * 0.5;
        if self.params.tiling {
            self.height_at(x, z).unwrap_or(self.min_height)
        } else {
            self.interpolate(
                x.clamp(-half_w, half_w) + half_w,
                z.clamp(-half_d, half_d) + half_d,
            )
        }
    }

    /// Surface normal at local (x, z) from central differences
    pub fn normal_at(&self, x: f32, z: f32) -> Vec3 {
        let (dx, dz) = self.cell_size();
        let ex = dx * 0.5;
        let ez = dz * 0.5;
        let slope_x = (self.height_clamped(x + ex, z) - self.height_clamped(x - ex, z)) / (2.0 * ex);
        let slope_z = (self.height_clamped(x, z + ez) - self.height_clamped(x, z - ez)) / (2.0 * ez);
        Vec3::new(-slope_x, 1.0, -slope_z).normalize()
    }

    pub fn min_height(&self) -> f32 {
        self.min_height
    }

    pub fn max_height(&self) -> f32 {
        self.max_height
    }

    /// Local bounds, including the thickness below the lowest sample
    pub fn local_aabb(&self) -> AABB {
        AABB::new(
            Vec3::new(
                -self.params.width * 0.5,
                self.min_height - self.params.thickness,
                -self.params.depth * 0.5,
            ),
            Vec3::new(
                self.params.width * 0.5,
                self.max_height,
                self.params.depth * 0.5,
            ),
        )
    }

    /// Smallest grid spacing, used as the ray marching step
    pub(crate) fn min_spacing(&self) -> f32 {
        let (dx, dz) = self.cell_size();
        dx.min(dz)
    }
}
