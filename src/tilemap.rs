use std::sync::Arc;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::{Axis, ObjectId};
use crate::physics_core::Aabb;
use crate::surface::SurfaceSet;

/// Adjacency bits: a neighbouring tile exists on that side (N=1, S=2, E=4, W=8).
pub const ADJACENT_NORTH: u8 = 1;
pub const ADJACENT_SOUTH: u8 = 2;
pub const ADJACENT_EAST: u8 = 4;
pub const ADJACENT_WEST: u8 = 8;

const BOUNDARY_SNAP: f32 = 1.0e-4;

/// Immutable per-type tile tuning, loaded once from content.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileTemplate {
    pub name: String,
    #[serde(default = "default_tile_surfaces")]
    pub surfaces: SurfaceSet,
    #[serde(default)]
    pub height: u32,
    /// Applied to objects overlapping the tile (wind zones, currents).
    #[serde(default)]
    pub acceleration: Vec2,
}

fn default_tile_surfaces() -> SurfaceSet {
    SurfaceSet::solid(0.2)
}

impl TileTemplate {
    pub fn solid(name: impl Into<String>, friction: f32) -> Self {
        Self {
            name: name.into(),
            surfaces: SurfaceSet::solid(friction),
            height: 0,
            acceleration: Vec2::ZERO,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Tile {
    pub template: Arc<TileTemplate>,
    pub x: i32,
    pub y: i32,
    pub surfaces: SurfaceSet,
    pub height: u32,
    pub acceleration: Vec2,
    pub adjacency: u8,
}

/// How a grid is positioned each tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GridMode {
    #[default]
    Static,
    /// Decorative layer that scrolls with an object, scaled by `factor`.
    FollowObject { object: ObjectId, factor: f32 },
}

#[derive(Clone, Debug)]
pub struct TileGrid {
    pub name: String,
    pub tile_size: Vec2,
    pub columns: usize,
    pub rows: usize,
    pub origin: Vec2,
    pub mode: GridMode,
    base_origin: Vec2,
    tiles: Vec<Option<Tile>>,
}

impl TileGrid {
    pub fn new(name: impl Into<String>, columns: usize, rows: usize, tile_size: Vec2) -> Self {
        Self {
            name: name.into(),
            tile_size,
            columns,
            rows,
            origin: Vec2::ZERO,
            mode: GridMode::Static,
            base_origin: Vec2::ZERO,
            tiles: vec![None; columns * rows],
        }
    }

    pub fn with_origin(mut self, origin: Vec2) -> Self {
        self.origin = origin;
        self.base_origin = origin;
        self
    }

    pub fn with_mode(mut self, mode: GridMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.columns && (y as usize) < self.rows
    }

    fn slot(&self, x: i32, y: i32) -> Option<usize> {
        self.in_bounds(x, y)
            .then(|| y as usize * self.columns + x as usize)
    }

    pub fn get(&self, x: i32, y: i32) -> Option<&Tile> {
        self.slot(x, y).and_then(|i| self.tiles[i].as_ref())
    }

    /// Create or replace the tile at a cell. Returns false outside the grid.
    pub fn set_tile(&mut self, x: i32, y: i32, template: Arc<TileTemplate>) -> bool {
        let Some(i) = self.slot(x, y) else {
            return false;
        };
        self.tiles[i] = Some(Tile {
            surfaces: template.surfaces,
            height: template.height,
            acceleration: template.acceleration,
            template,
            x,
            y,
            adjacency: 0,
        });
        self.refresh_neighbourhood(x, y);
        true
    }

    pub fn delete_tile(&mut self, x: i32, y: i32) -> Option<Tile> {
        let i = self.slot(x, y)?;
        let removed = self.tiles[i].take();
        if removed.is_some() {
            self.refresh_neighbourhood(x, y);
        }
        removed
    }

    fn refresh_neighbourhood(&mut self, x: i32, y: i32) {
        for (dx, dy) in [(0, 0), (0, -1), (0, 1), (1, 0), (-1, 0)] {
            self.refresh_adjacency(x + dx, y + dy);
        }
    }

    fn refresh_adjacency(&mut self, x: i32, y: i32) {
        let Some(i) = self.slot(x, y) else {
            return;
        };
        if self.tiles[i].is_none() {
            return;
        }
        let mut mask = 0u8;
        if self.get(x, y - 1).is_some() {
            mask |= ADJACENT_NORTH;
        }
        if self.get(x, y + 1).is_some() {
            mask |= ADJACENT_SOUTH;
        }
        if self.get(x + 1, y).is_some() {
            mask |= ADJACENT_EAST;
        }
        if self.get(x - 1, y).is_some() {
            mask |= ADJACENT_WEST;
        }
        if let Some(tile) = self.tiles[i].as_mut() {
            tile.adjacency = mask;
        }
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.is_some()).count()
    }

    /// Cell index containing `pos` along `axis`.
    ///
    /// A position exactly on a cell boundary belongs to the cell after it,
    /// unless `tend_lowest` is set, in which case the lower index wins. Use
    /// `tend_lowest` for right/bottom edges so a box flush with a boundary is
    /// not counted as occupying the next cell.
    pub fn index(&self, axis: Axis, pos: f32, tend_lowest: bool) -> i32 {
        let size = axis.of(self.tile_size).max(f32::EPSILON);
        let f = (pos - axis.of(self.origin)) / size;
        let nearest = f.round();
        if (f - nearest).abs() < BOUNDARY_SNAP {
            let boundary = nearest as i32;
            if tend_lowest {
                boundary - 1
            } else {
                boundary
            }
        } else {
            f.floor() as i32
        }
    }

    pub fn grid_x_index(&self, x: f32, tend_lowest: bool) -> i32 {
        self.index(Axis::Horizontal, x, tend_lowest)
    }

    pub fn grid_y_index(&self, y: f32, tend_lowest: bool) -> i32 {
        self.index(Axis::Vertical, y, tend_lowest)
    }

    /// World coordinate of the low edge of cell `index` along `axis`.
    pub fn cell_start(&self, axis: Axis, index: i32) -> f32 {
        axis.of(self.origin) + index as f32 * axis.of(self.tile_size)
    }

    pub fn cell_bounds(&self, x: i32, y: i32) -> Aabb {
        Aabb::from_position(
            Vec2::new(
                self.cell_start(Axis::Horizontal, x),
                self.cell_start(Axis::Vertical, y),
            ),
            self.tile_size,
        )
    }

    fn cells_along(&self, axis: Axis) -> i32 {
        match axis {
            Axis::Horizontal => self.columns as i32,
            Axis::Vertical => self.rows as i32,
        }
    }

    /// Inclusive cell range covered by `[low, high]` along `axis`, clipped to
    /// the grid. `None` when the span misses the grid entirely.
    pub fn range(&self, axis: Axis, low: f32, high: f32) -> Option<(i32, i32)> {
        let first = self.index(axis, low, false).max(0);
        let last = self
            .index(axis, high, true)
            .min(self.cells_along(axis) - 1);
        (first <= last).then_some((first, last))
    }

    pub fn x_range(&self, left: f32, right: f32) -> Option<(i32, i32)> {
        self.range(Axis::Horizontal, left, right)
    }

    pub fn y_range(&self, top: f32, bottom: f32) -> Option<(i32, i32)> {
        self.range(Axis::Vertical, top, bottom)
    }

    /// Clamp a raw cell index to one step outside the grid on either side.
    pub fn clamp_index(&self, axis: Axis, index: i32) -> i32 {
        index.clamp(-1, self.cells_along(axis))
    }

    pub fn reset_origin(&mut self) {
        self.origin = self.base_origin;
    }

    /// Scroll a follow-camera layer with its target.
    pub fn follow(&mut self, target: Vec2, factor: f32) {
        self.origin = self.base_origin + target * factor;
    }
}
