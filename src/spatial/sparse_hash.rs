//! Sparse hash grid for efficient spatial queries

use ahash::AHashMap;
use glam::Vec3;

use crate::core::types::EntityId;

/// Sparse hash grid over the x/z plane
#[derive(Debug, Clone)]
pub struct SparseHashGrid {
    cell_size: f32,
    cells: AHashMap<(i32, i32), Vec<EntityId>>,
}

impl SparseHashGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(0.01),
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
        self.cells.entry(coord).or_default().push(entity);
    }

    pub fn remove(&mut self, entity: EntityId, pos: Vec3) {
        let coord = self.cell_coord(pos);
        if let Some(cell) = self.cells.get_mut(&coord) {
            cell.retain(|&e| e != entity);
            if cell.is_empty() {
                self.cells.remove(&coord);
            }
        }
    }

    /// Move an entity, touching the map only when it changes cell
    pub fn relocate(&mut self, entity: EntityId, from: Vec3, to: Vec3) {
        if self.cell_coord(from) != self.cell_coord(to) {
            self.remove(entity, from);
            self.insert(entity, to);
        }
    }

    /// All entities in cells overlapping the square around `center`
    ///
    /// Candidates only; callers filter by exact distance.
    pub fn query_candidates(&self, center: Vec3, radius: f32) -> impl Iterator<Item = EntityId> + '_ {
        let (min_x, min_z) = self.cell_coord(center - Vec3::new(radius, 0.0, radius));
        let (max_x, max_z) = self.cell_coord(center + Vec3::new(radius, 0.0, radius));

        (min_x..=max_x).flat_map(move |cx| {
            (min_z..=max_z).flat_map(move |cz| {
                self.cells.get(&(cx, cz))
                    .into_iter()
                    .flatten()
                    .copied()
            })
        })
    }

    /// Entities within `radius` of `center` on the x/z plane
    ///
    /// Height is ignored, so airborne bodies stay in range of the ground below.
    pub fn query_radius(
        &self,
        center: Vec3,
        radius: f32,
        position_of: impl Fn(EntityId) -> Option<Vec3>,
    ) -> Vec<EntityId> {
        let radius_sq = radius * radius;
        self.query_candidates(center, radius)
            .filter(|&entity| {
                position_of(entity)
                    .map(|pos| {
                        let (dx, dz) = (pos.x - center.x, pos.z - center.z);
                        dx * dx + dz * dz <= radius_sq
                    })
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Rebuild grid from positions
    pub fn rebuild(&mut self, entities: impl Iterator<Item = (EntityId, Vec3)>) {
        self.clear();
        for (entity, pos) in entities {
            self.insert(entity, pos);
        }
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
    fn test_query_radius_filters_by_distance() {
        let mut grid = SparseHashGrid::new(2.0);
        let near = EntityId::new(0, 0);
        let far = EntityId::new(1, 0);
        let positions = [Vec3::new(1.0, 0.0, 1.0), Vec3::new(9.0, 0.0, 9.0)];
        grid.insert(near, positions[0]);
        grid.insert(far, positions[1]);

        let found = grid.query_radius(Vec3::ZERO, 5.0, |e| positions.get(e.index as usize).copied());
        assert_eq!(found, vec![near]);
    }

    #[test]
    fn test_query_spans_many_cells() {
        let mut grid = SparseHashGrid::new(1.0);
        let id = EntityId::new(0, 0);
        let pos = Vec3::new(-7.5, 0.0, 0.0);
        grid.insert(id, pos);

        let found = grid.query_radius(Vec3::ZERO, 8.0, |_| Some(pos));
        assert_eq!(found, vec![id]);
    }

    #[test]
    fn test_relocate_moves_between_cells() {
        let mut grid = SparseHashGrid::new(1.0);
        let id = EntityId::new(3, 1);
        grid.insert(id, Vec3::ZERO);
        grid.relocate(id, Vec3::ZERO, Vec3::new(5.0, 0.0, 5.0));
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.query_candidates(Vec3::ZERO, 0.5).count(), 0);
        assert_eq!(grid.query_candidates(Vec3::new(5.0, 0.0, 5.0), 0.5).count(), 1);
    }

    #[test]
    fn test_rebuild_replaces_contents() {
        let mut grid = SparseHashGrid::new(4.0);
        grid.insert(EntityId::new(9, 0), Vec3::ZERO);
        grid.rebuild([(EntityId::new(1, 0), Vec3::ONE)].into_iter());
        assert_eq!(grid.len(), 1);
        grid.clear();
        assert!(grid.is_empty());
    }
}
