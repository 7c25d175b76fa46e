use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::shapes::Aabb;
use crate::{core::types::BodyKind, utils::allocator::BodyHandle};

/// Inclusive rectangle of grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRange {
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
}

impl CellRange {
    pub fn contains(&self, x: usize, y: usize) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }

    pub fn cell_count(&self) -> usize {
        (self.max_x - self.min_x + 1) * (self.max_y - self.min_y + 1)
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> {
        let CellRange {
            min_x,
            min_y,
            max_x,
            max_y,
        } = *self;
        (min_y..=max_y).flat_map(move |y| (min_x..=max_x).map(move |x| (x, y)))
    }
}

/// One bucket of the grid, holding a separate list per body kind.
#[derive(Debug, Clone, Default)]
pub struct GridCell {
    lists: [Vec<BodyHandle>; 3],
}

impl GridCell {
    pub fn bodies(&self, kind: BodyKind) -> &[BodyHandle] {
        &self.lists[kind.index()]
    }

    pub fn all(&self) -> impl Iterator<Item = BodyHandle> + '_ {
        self.lists.iter().flatten().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.iter().all(Vec::is_empty)
    }

    fn insert(&mut self, handle: BodyHandle, kind: BodyKind) {
        self.lists[kind.index()].push(handle);
    }

    fn remove(&mut self, handle: BodyHandle, kind: BodyKind) -> bool {
        let list = &mut self.lists[kind.index()];
        match list.iter().position(|h| *h == handle) {
            Some(index) => {
                list.swap_remove(index);
                true
            }
            None => false,
        }
    }
}

/// Fixed-size uniform grid centred on the world origin.
///
/// A point maps to `floor(coord / cell_length) + size / 2` on each axis.
/// The grid never resizes; a body whose bounds leave it is a fatal error.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_length: f32,
    size: usize,
    cells: Vec<GridCell>,
}

impl SpatialGrid {
    pub fn new(cell_length: f32, size: usize) -> Self {
        Self {
            cell_length,
            size,
            cells: vec![GridCell::default(); size * size],
        }
    }

    pub fn cell_length(&self) -> f32 {
        self.cell_length
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Unclamped integer cell coordinates of a world point.
    pub fn cell_coord(&self, point: Vec2) -> (i64, i64) {
        let half = (self.size / 2) as i64;
        (
            (point.x / self.cell_length).floor() as i64 + half,
            (point.y / self.cell_length).floor() as i64 + half,
        )
    }

    fn in_bounds(&self, (x, y): (i64, i64)) -> bool {
        let size = self.size as i64;
        (0..size).contains(&x) && (0..size).contains(&y)
    }

    /// Cells covered by `aabb`.
    ///
    /// # Panics
    /// When the box reaches outside the configured grid.
    pub fn cell_range(&self, aabb: &Aabb) -> CellRange {
        let min = self.cell_coord(aabb.min);
        let max = self.cell_coord(aabb.max);
        assert!(
            self.in_bounds(min) && self.in_bounds(max),
            "bounds {:?}..{:?} fall outside the {}x{} physics grid (cell length {})",
            aabb.min,
            aabb.max,
            self.size,
            self.size,
            self.cell_length
        );
        CellRange {
            min_x: min.0 as usize,
            min_y: min.1 as usize,
            max_x: max.0 as usize,
            max_y: max.1 as usize,
        }
    }

    /// Cells covered by `aabb`, cut to the grid; `None` when nothing overlaps.
    pub fn clamped_range(&self, aabb: &Aabb) -> Option<CellRange> {
        let (min_x, min_y) = self.cell_coord(aabb.min);
        let (max_x, max_y) = self.cell_coord(aabb.max);
        let last = self.size as i64 - 1;
        if max_x < 0 || max_y < 0 || min_x > last || min_y > last {
            return None;
        }
        Some(CellRange {
            min_x: min_x.clamp(0, last) as usize,
            min_y: min_y.clamp(0, last) as usize,
            max_x: max_x.clamp(0, last) as usize,
            max_y: max_y.clamp(0, last) as usize,
        })
    }

    pub fn cell(&self, x: usize, y: usize) -> &GridCell {
        &self.cells[y * self.size + x]
    }

    fn cell_mut(&mut self, x: usize, y: usize) -> &mut GridCell {
        &mut self.cells[y * self.size + x]
    }

    /// World-space bounds of one cell.
    pub fn cell_bounds(&self, x: usize, y: usize) -> Aabb {
        let half = (self.size / 2) as f32;
        let min = Vec2::new(x as f32 - half, y as f32 - half) * self.cell_length;
        Aabb::new(min, min + Vec2::splat(self.cell_length))
    }

    /// Moves `handle` to the cells covered by `aabb`.
    ///
    /// `cached` is the range the body occupied before; it is updated in place.
    /// Returns true when membership changed.
    pub fn update_membership(
        &mut self,
        handle: BodyHandle,
        kind: BodyKind,
        aabb: &Aabb,
        cached: &mut Option<CellRange>,
    ) -> bool {
        let range = self.cell_range(aabb);
        if *cached == Some(range) {
            return false;
        }
        self.remove_body(handle, kind, cached);
        for (x, y) in range.cells() {
            self.cell_mut(x, y).insert(handle, kind);
        }
        *cached = Some(range);
        true
    }

    /// Drops `handle` from every cell of `cached` and clears the cache.
    pub fn remove_body(&mut self, handle: BodyHandle, kind: BodyKind, cached: &mut Option<CellRange>) {
        if let Some(old) = cached.take() {
            for (x, y) in old.cells() {
                let removed = self.cell_mut(x, y).remove(handle, kind);
                debug_assert!(removed, "grid cell ({x}, {y}) lost track of {handle:?}");
            }
        }
    }

    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.lists.iter_mut().for_each(Vec::clear);
        }
    }

    /// Cells in `range` whose lists are not all empty.
    pub fn occupied_cells(&self, range: CellRange) -> impl Iterator<Item = (usize, usize, &GridCell)> + '_ {
        range
            .cells()
            .map(move |(x, y)| (x, y, self.cell(x, y)))
            .filter(|(_, _, cell)| !cell.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::allocator::GenerationalId;

    fn handle(index: usize) -> BodyHandle {
        BodyHandle(GenerationalId::new(index, 0))
    }

    #[test]
    fn origin_maps_to_grid_center() {
        let grid = SpatialGrid::new(64.0, 512);
        assert_eq!(grid.cell_coord(Vec2::ZERO), (256, 256));
        assert_eq!(grid.cell_coord(Vec2::new(-0.5, 63.9)), (255, 256));
        assert_eq!(grid.cell_coord(Vec2::new(64.0, -64.0)), (257, 255));
    }

    #[test]
    fn membership_moves_between_cells() {
        let mut grid = SpatialGrid::new(10.0, 8);
        let body = handle(3);
        let mut cached = None;

        let first = Aabb::new(Vec2::new(1.0, 1.0), Vec2::new(12.0, 2.0));
        assert!(grid.update_membership(body, BodyKind::Dynamic, &first, &mut cached));
        assert_eq!(cached.map(|r| r.cell_count()), Some(2));
        assert_eq!(grid.cell(4, 4).bodies(BodyKind::Dynamic), &[body]);
        assert_eq!(grid.cell(5, 4).bodies(BodyKind::Dynamic), &[body]);

        // Same cells, no work.
        let nudged = Aabb::new(Vec2::new(2.0, 1.0), Vec2::new(13.0, 2.0));
        assert!(!grid.update_membership(body, BodyKind::Dynamic, &nudged, &mut cached));

        let moved = Aabb::new(Vec2::new(-15.0, 1.0), Vec2::new(-12.0, 2.0));
        assert!(grid.update_membership(body, BodyKind::Dynamic, &moved, &mut cached));
        assert!(grid.cell(4, 4).is_empty());
        assert!(grid.cell(5, 4).is_empty());
        assert_eq!(grid.cell(2, 4).bodies(BodyKind::Dynamic), &[body]);
    }

    #[test]
    fn kinds_are_bucketed_separately() {
        let mut grid = SpatialGrid::new(10.0, 4);
        let aabb = Aabb::new(Vec2::splat(1.0), Vec2::splat(2.0));
        let (mut a, mut b) = (None, None);
        grid.update_membership(handle(0), BodyKind::Static, &aabb, &mut a);
        grid.update_membership(handle(1), BodyKind::Trigger, &aabb, &mut b);

        let cell = grid.cell(2, 2);
        assert_eq!(cell.bodies(BodyKind::Static), &[handle(0)]);
        assert_eq!(cell.bodies(BodyKind::Trigger), &[handle(1)]);
        assert!(cell.bodies(BodyKind::Dynamic).is_empty());

        grid.remove_body(handle(0), BodyKind::Static, &mut a);
        assert!(a.is_none());
        assert!(grid.cell(2, 2).bodies(BodyKind::Static).is_empty());
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn leaving_the_grid_is_fatal() {
        let mut grid = SpatialGrid::new(10.0, 4);
        let mut cached = None;
        let far = Aabb::new(Vec2::splat(100.0), Vec2::splat(101.0));
        grid.update_membership(handle(0), BodyKind::Dynamic, &far, &mut cached);
    }

    #[test]
    fn clamped_range_cuts_queries_to_the_grid() {
        let grid = SpatialGrid::new(10.0, 4);
        let range = grid
            .clamped_range(&Aabb::new(Vec2::splat(-100.0), Vec2::splat(5.0)))
            .expect("overlaps the grid");
        assert_eq!((range.min_x, range.min_y, range.max_x, range.max_y), (0, 0, 2, 2));
        assert!(grid
            .clamped_range(&Aabb::new(Vec2::splat(100.0), Vec2::splat(120.0)))
            .is_none());
    }
}
