//! Broad phase collision detection using sweep and prune or a spatial hash

use super::AABB;
use crate::config::BroadPhaseKind;
use crate::physics::shape::ShapeHandle;
use glam::Vec3;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Entry for broad phase collision detection
#[derive(Debug, Clone, Copy)]
pub struct BroadPhaseEntry {
    pub shape: ShapeHandle,
    pub aabb: AABB,
}

/// Find overlapping entry pairs with the configured algorithm.
/// Pairs are `(low index, high index)`, sorted and unique.
pub fn candidate_pairs(kind: BroadPhaseKind, entries: &[BroadPhaseEntry]) -> Vec<(usize, usize)> {
    match kind {
        BroadPhaseKind::SweepAndPrune => sweep_and_prune(entries),
        BroadPhaseKind::SpatialHash { cell_size } => {
            let mut hash = SpatialHash::new(cell_size);
            for (index, entry) in entries.iter().enumerate() {
                hash.insert(index, &entry.aabb);
            }

            let mut pairs = Vec::new();
            for (index, entry) in entries.iter().enumerate() {
                for other in hash.query(&entry.aabb) {
                    if other > index && entry.aabb.overlaps(&entries[other].aabb) {
                        pairs.push((index, other));
                    }
                }
            }
            pairs.sort_unstable();
            pairs
        }
    }
}

/// Axis for sweep and prune
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
    Z,
}

/// Endpoint for sweep and prune
struct Endpoint {
    value: f32,
    index: usize,
    is_min: bool,
}

/// Perform broad phase collision detection using sweep and prune
pub fn sweep_and_prune(entries: &[BroadPhaseEntry]) -> Vec<(usize, usize)> {
    if entries.len() < 2 {
        return Vec::new();
    }

    let axis = determine_best_axis(entries);

    // Min endpoints sort before max endpoints at equal values so touching boxes pair up
    let mut endpoints = create_endpoints(entries, axis);
    endpoints.sort_by(|a, b| {
        a.value
            .partial_cmp(&b.value)
            .unwrap_or(Ordering::Equal)
            .then(b.is_min.cmp(&a.is_min))
    });

    let mut pairs = Vec::new();
    let mut active: Vec<usize> = Vec::new();

    for endpoint in endpoints {
        if endpoint.is_min {
            for &active_index in &active {
                if entries[active_index].aabb.overlaps(&entries[endpoint.index].aabb) {
                    pairs.push((active_index.min(endpoint.index), active_index.max(endpoint.index)));
                }
            }
            active.push(endpoint.index);
        } else {
            active.retain(|&idx| idx != endpoint.index);
        }
    }

    pairs.sort_unstable();
    pairs.dedup();

    pairs
}

/// Determine the best axis for sweep and prune based on variance
fn determine_best_axis(entries: &[BroadPhaseEntry]) -> Axis {
    let count = entries.len() as f32;
    let mean = entries
        .iter()
        .fold(Vec3::ZERO, |acc, entry| acc + entry.aabb.center())
        / count;
    let variance = entries.iter().fold(Vec3::ZERO, |acc, entry| {
        let diff = entry.aabb.center() - mean;
        acc + diff * diff
    }) / count;

    if variance.x > variance.y && variance.x > variance.z {
        Axis::X
    } else if variance.y > variance.z {
        Axis::Y
    } else {
        Axis::Z
    }
}

fn create_endpoints(entries: &[BroadPhaseEntry], axis: Axis) -> Vec<Endpoint> {
    let mut endpoints = Vec::with_capacity(entries.len() * 2);

    for (index, entry) in entries.iter().enumerate() {
        let (min_val, max_val) = match axis {
            Axis::X => (entry.aabb.min.x, entry.aabb.max.x),
            Axis::Y => (entry.aabb.min.y, entry.aabb.max.y),
            Axis::Z => (entry.aabb.min.z, entry.aabb.max.z),
        };

        endpoints.push(Endpoint {
            value: min_val,
            index,
            is_min: true,
        });
        endpoints.push(Endpoint {
            value: max_val,
            index,
            is_min: false,
        });
    }

    endpoints
}

/// Uniform grid of cubic cells
pub struct SpatialHash {
    cell_size: f32,
    buckets: HashMap<(i32, i32, i32), Vec<usize>>,
}

impl SpatialHash {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            buckets: HashMap::new(),
        }
    }

    pub fn insert(&mut self, index: usize, aabb: &AABB) {
        let min_cell = self.world_to_cell(aabb.min);
        let max_cell = self.world_to_cell(aabb.max);

        for x in min_cell.0..=max_cell.0 {
            for y in min_cell.1..=max_cell.1 {
                for z in min_cell.2..=max_cell.2 {
                    self.buckets.entry((x, y, z)).or_default().push(index);
                }
            }
        }
    }

    /// Indices sharing at least one cell with `aabb`, in insertion order per cell
    pub fn query(&self, aabb: &AABB) -> Vec<usize> {
        let min_cell = self.world_to_cell(aabb.min);
        let max_cell = self.world_to_cell(aabb.max);

        let mut results = Vec::new();
        let mut seen = HashSet::new();

        for x in min_cell.0..=max_cell.0 {
            for y in min_cell.1..=max_cell.1 {
                for z in min_cell.2..=max_cell.2 {
                    if let Some(indices) = self.buckets.get(&(x, y, z)) {
                        for &index in indices {
                            if seen.insert(index) {
                                results.push(index);
                            }
                        }
                    }
                }
            }
        }

        results
    }

    fn world_to_cell(&self, pos: Vec3) -> (i32, i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
            (pos.z / self.cell_size).floor() as i32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<BroadPhaseEntry> {
        let mut world = hecs::World::new();
        let aabbs = [
            AABB::new(Vec3::ZERO, Vec3::ONE),
            AABB::new(Vec3::splat(0.5), Vec3::splat(1.5)),
            AABB::new(Vec3::splat(10.0), Vec3::splat(11.0)),
        ];
        aabbs
            .into_iter()
            .map(|aabb| BroadPhaseEntry {
                shape: ShapeHandle(world.spawn(())),
                aabb,
            })
            .collect()
    }

    #[test]
    fn test_sweep_and_prune() {
        let pairs = sweep_and_prune(&entries());
        assert_eq!(pairs, vec![(0, 1)]);
    }

    #[test]
    fn test_spatial_hash() {
        let mut hash = SpatialHash::new(1.0);

        let aabb1 = AABB::new(Vec3::ZERO, Vec3::ONE);
        let aabb2 = AABB::new(Vec3::splat(0.5), Vec3::splat(1.5));
        let aabb3 = AABB::new(Vec3::splat(10.0), Vec3::splat(11.0));

        hash.insert(0, &aabb1);
        hash.insert(1, &aabb2);
        hash.insert(2, &aabb3);

        let query = hash.query(&aabb1);
        assert!(query.contains(&0));
        assert!(query.contains(&1));
        assert!(!query.contains(&2));
    }

    #[test]
    fn test_algorithms_agree() {
        let entries = entries();
        let sap = candidate_pairs(BroadPhaseKind::SweepAndPrune, &entries);
        let hashed = candidate_pairs(BroadPhaseKind::SpatialHash { cell_size: 2.0 }, &entries);
        assert_eq!(sap, hashed);
    }

    #[test]
    fn test_touching_boxes_pair_up() {
        let mut world = hecs::World::new();
        let entries = vec![
            BroadPhaseEntry {
                shape: ShapeHandle(world.spawn(())),
                aabb: AABB::new(Vec3::ZERO, Vec3::ONE),
            },
            BroadPhaseEntry {
                shape: ShapeHandle(world.spawn(())),
                aabb: AABB::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0)),
            },
        ];
        assert_eq!(sweep_and_prune(&entries), vec![(0, 1)]);
    }
}
