//! Sparse hash grid for entity radius queries

use ahash::AHashMap;
use glam::Vec3;

use crate::core::types::EntityId;

/// Sparse hash grid keyed by horizontal cell coordinates
#[derive(Debug, Clone)]
pub struct SparseHashGrid {
    cell_size: f32,
    cells: AHashMap<(i32, i32), Vec<(EntityId, Vec3)>>,
}

impl SparseHashGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: AHashMap::new(),
        }
    }

    #[inline]
    fn cell_coord(&self, pos: Vec3) -> (i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.z / self.cell_size).floor() as i32,
        )
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn insert(&mut self, entity: EntityId, pos: Vec3) {
        let coord = self.cell_coord(pos);
        self.cells.entry(coord).or_default().push((entity, pos));
    }

    pub fn remove(&mut self, entity: EntityId, pos: Vec3) {
        let coord = self.cell_coord(pos);
        if let Some(cell) = self.cells.get_mut(&coord) {
            cell.retain(|&(e, _)| e != entity);
            if cell.is_empty() {
                self.cells.remove(&coord);
            }
        }
    }

    /// Entities within `radius` on the horizontal plane, visited in a fixed cell order
    pub fn query_radius(&self, center: Vec3, radius: f32) -> Vec<EntityId> {
        let (min_x, min_z) = self.cell_coord(center - Vec3::new(radius, 0.0, radius));
        let (max_x, max_z) = self.cell_coord(center + Vec3::new(radius, 0.0, radius));
        let radius_sq = radius * radius;

        let mut found = Vec::new();
        for cx in min_x..=max_x {
            for cz in min_z..=max_z {
                let Some(cell) = self.cells.get(&(cx, cz)) else {
                    continue;
                };
                found.extend(cell.iter().filter_map(|&(entity, pos)| {
                    let dx = pos.x - center.x;
                    let dz = pos.z - center.z;
                    (dx * dx + dz * dz <= radius_sq).then_some(entity)
                }));
            }
        }
        found
    }

    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radius_query_crosses_cells() {
        let mut grid = SparseHashGrid::new(4.0);
        let near = EntityId::new();
        let edge = EntityId::new();
        let far = EntityId::new();
        grid.insert(near, Vec3::new(1.0, 0.0, 1.0));
        grid.insert(edge, Vec3::new(9.0, 0.0, 1.0));
        grid.insert(far, Vec3::new(30.0, 0.0, 30.0));

        let found = grid.query_radius(Vec3::new(2.0, 0.0, 1.0), 7.0);
        assert!(found.contains(&near));
        assert!(found.contains(&edge));
        assert!(!found.contains(&far));
    }

    #[test]
    fn test_remove() {
        let mut grid = SparseHashGrid::new(4.0);
        let id = EntityId::new();
        grid.insert(id, Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(grid.len(), 1);
        grid.remove(id, Vec3::new(1.0, 0.0, 1.0));
        assert!(grid.is_empty());
        assert!(grid.query_radius(Vec3::ZERO, 10.0).is_empty());
    }
}
