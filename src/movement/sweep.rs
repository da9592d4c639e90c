use super::{MoveContext, MovementCore, MovementHooks};
use crate::components::{Axis, ObjectId};
use crate::physics_core::CONTACT_EPSILON;
use crate::surface::{Direction, SurfaceInformation};

enum Hit {
    Tile(SurfaceInformation),
    Obstacle(ObjectId, SurfaceInformation),
}

pub fn move_horizontal(
    core: &mut MovementCore,
    hooks: &mut dyn MovementHooks,
    ctx: &mut MoveContext,
    delta: f32,
) {
    move_axis(core, hooks, ctx, Axis::Horizontal, delta);
}

pub fn move_vertical(
    core: &mut MovementCore,
    hooks: &mut dyn MovementHooks,
    ctx: &mut MoveContext,
    delta: f32,
) {
    move_axis(core, hooks, ctx, Axis::Vertical, delta);
}

fn move_axis(
    core: &mut MovementCore,
    hooks: &mut dyn MovementHooks,
    ctx: &mut MoveContext,
    axis: Axis,
    delta: f32,
) {
    if delta == 0.0 {
        return;
    }
    let leading = Direction::leading(axis, delta);
    let (applied, hit) = if hooks.passes_through_solids() {
        (delta, None)
    } else {
        resolve(core, ctx, axis, delta, leading)
    };

    match axis {
        Axis::Horizontal => hooks.pre_commit_move_x(applied),
        Axis::Vertical => hooks.pre_commit_move_y(applied),
    }
    let current = axis.of(core.position);
    axis.set(&mut core.position, current + applied);

    // An obstacle hit replaces the tile hit on the same axis.
    match hit {
        Some(Hit::Tile(surface)) => hooks.handle_tile_collision(core, ctx, leading, surface),
        Some(Hit::Obstacle(id, surface)) => {
            hooks.handle_obstacle_collision(core, ctx, id, leading, surface)
        }
        None => {}
    }
}

fn resolve(
    core: &MovementCore,
    ctx: &MoveContext,
    axis: Axis,
    delta: f32,
    leading: Direction,
) -> (f32, Option<Hit>) {
    let mut applied = delta;
    let mut hit = None;
    if let Some((limit, surface)) = tile_limit(core, ctx, axis, delta, leading) {
        applied = limit;
        hit = Some(Hit::Tile(surface));
    }
    if let Some((limit, id, surface)) = obstacle_limit(core, ctx, axis, delta, leading) {
        if limit.abs() <= applied.abs() {
            applied = limit;
            hit = Some(Hit::Obstacle(id, surface));
        }
    }
    (applied, hit)
}

fn stops(core: &MovementCore, surface: &SurfaceInformation) -> bool {
    surface.is_solid && (!surface.is_deadly() || core.stop_on_deadly)
}

/// Walk the grid cell by cell from the leading edge toward the target and
/// return the offset to the first blocking tile side.
fn tile_limit(
    core: &MovementCore,
    ctx: &MoveContext,
    axis: Axis,
    delta: f32,
    leading: Direction,
) -> Option<(f32, SurfaceInformation)> {
    let grid = ctx.room.active_grid()?;
    let bounds = core.bounds();
    let cross = axis.other();
    let (cross_first, cross_last) = grid.range(cross, bounds.min(cross), bounds.max(cross))?;
    let facing = leading.opposite();
    let edge = bounds.edge(leading);
    let target = edge + delta;
    let forward = delta > 0.0;

    let (start, end) = if forward {
        (
            grid.index(axis, edge, true) + 1,
            grid.index(axis, target, true),
        )
    } else {
        (
            grid.index(axis, edge, false) - 1,
            grid.index(axis, target, false),
        )
    };
    let (start, end) = (grid.clamp_index(axis, start), grid.clamp_index(axis, end));
    let step = if forward { 1 } else { -1 };

    let mut cell = start;
    while (forward && cell <= end) || (!forward && cell >= end) {
        for c in cross_first..=cross_last {
            let (x, y) = match axis {
                Axis::Horizontal => (cell, c),
                Axis::Vertical => (c, cell),
            };
            let Some(tile) = grid.get(x, y) else {
                continue;
            };
            let surface = tile.surfaces.get(facing);
            if stops(core, &surface) {
                let boundary = if forward {
                    grid.cell_start(axis, cell)
                } else {
                    grid.cell_start(axis, cell + 1)
                };
                return Some((boundary - edge, surface));
            }
        }
        cell += step;
    }
    None
}

/// Nearest obstacle side the move newly crosses. Obstacles the mover was
/// already past before this move are ignored.
fn obstacle_limit(
    core: &MovementCore,
    ctx: &MoveContext,
    axis: Axis,
    delta: f32,
    leading: Direction,
) -> Option<(f32, ObjectId, SurfaceInformation)> {
    let bounds = core.bounds();
    let cross = axis.other();
    let facing = leading.opposite();
    let edge = bounds.edge(leading);
    let forward = delta > 0.0;

    let mut best: Option<(f32, ObjectId, SurfaceInformation)> = None;
    for id in ctx.room.colliders(ctx.owner) {
        let other = &ctx.room.objects[id];
        let surface = other.surfaces.get(facing);
        if !stops(core, &surface) {
            continue;
        }
        let other_bounds = other.last_bounds();
        if bounds.overlap_along(&other_bounds, cross) <= CONTACT_EPSILON {
            continue;
        }
        let limit = other_bounds.edge(facing) - edge;
        let forming = if forward {
            limit >= -CONTACT_EPSILON && limit < delta
        } else {
            limit <= CONTACT_EPSILON && limit > delta
        };
        if !forming {
            continue;
        }
        if best.as_ref().map_or(true, |(l, _, _)| limit.abs() < l.abs()) {
            best = Some((limit, id, surface));
        }
    }
    best
}

pub fn enforce_terrains(
    core: &mut MovementCore,
    hooks: &mut dyn MovementHooks,
    ctx: &mut MoveContext,
) {
    for index in 0..ctx.room.terrains.len() {
        let terrain = ctx.room.terrains[index];
        let mut position = core.position;
        if terrain.constrain(core.size, &mut position) {
            core.position = position;
            hooks.handle_terrain_collision(core, ctx, index, terrain.position);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bevy::prelude::*;

    use super::*;
    use crate::inventory::GameConditionList;
    use crate::obstacle::RoomObject;
    use crate::room::Room;
    use crate::surface::SurfaceSet;
    use crate::terrain::{Terrain, TerrainPosition, TerrainShape};
    use crate::tilemap::{TileGrid, TileTemplate};

    #[derive(Default)]
    struct Recorder {
        tiles: Vec<Direction>,
        obstacles: Vec<(ObjectId, Direction)>,
        terrains: Vec<usize>,
        offsets: Vec<f32>,
    }

    impl MovementHooks for Recorder {
        fn pre_commit_move_x(&mut self, offset: f32) {
            self.offsets.push(offset);
        }

        fn pre_commit_move_y(&mut self, offset: f32) {
            self.offsets.push(offset);
        }

        fn handle_tile_collision(
            &mut self,
            _core: &mut MovementCore,
            _ctx: &mut MoveContext,
            direction: Direction,
            _surface: SurfaceInformation,
        ) {
            self.tiles.push(direction);
        }

        fn handle_obstacle_collision(
            &mut self,
            _core: &mut MovementCore,
            _ctx: &mut MoveContext,
            obstacle: ObjectId,
            direction: Direction,
            _surface: SurfaceInformation,
        ) {
            self.obstacles.push((obstacle, direction));
        }

        fn handle_terrain_collision(
            &mut self,
            _core: &mut MovementCore,
            _ctx: &mut MoveContext,
            terrain: usize,
            _position: TerrainPosition,
        ) {
            self.terrains.push(terrain);
        }
    }

    fn room_with_wall() -> Room {
        let mut room = Room::default();
        let mut grid = TileGrid::new("main", 8, 8, Vec2::splat(16.0));
        let stone = Arc::new(TileTemplate::solid("stone", 0.2));
        for y in 0..8 {
            grid.set_tile(4, y, stone.clone());
        }
        room.grids.push(grid);
        room.active_grid = Some(0);
        room
    }

    fn core_at(position: Vec2, size: Vec2) -> MovementCore {
        let mut core = MovementCore::new(GameConditionList::default(), false);
        core.position = position;
        core.size = size;
        core
    }

    #[test]
    fn stops_flush_against_tile_boundary() {
        let mut room = room_with_wall();
        let mover = room.add_object(RoomObject::new("mover", Vec2::new(48.0, 16.0), Vec2::splat(12.0)));
        let mut core = core_at(Vec2::new(48.0, 16.0), Vec2::splat(12.0));
        let mut hooks = Recorder::default();
        let mut ctx = MoveContext::new(&mut room, mover);

        move_horizontal(&mut core, &mut hooks, &mut ctx, 5.0);
        assert_eq!(core.position.x, 52.0);
        assert_eq!(core.bounds().max_x, 64.0);
        assert_eq!(hooks.tiles, vec![Direction::Right]);
        assert_eq!(hooks.offsets, vec![4.0]);

        // Already flush: no further progress, collision reported again.
        move_horizontal(&mut core, &mut hooks, &mut ctx, 5.0);
        assert_eq!(core.position.x, 52.0);
        assert_eq!(hooks.tiles.len(), 2);
    }

    #[test]
    fn fast_mover_does_not_tunnel() {
        let mut room = room_with_wall();
        let mover = room.add_object(RoomObject::new("mover", Vec2::new(0.0, 16.0), Vec2::splat(12.0)));
        let mut core = core_at(Vec2::new(0.0, 16.0), Vec2::splat(12.0));
        let mut hooks = Recorder::default();
        let mut ctx = MoveContext::new(&mut room, mover);

        move_horizontal(&mut core, &mut hooks, &mut ctx, 200.0);
        assert_eq!(core.bounds().max_x, 64.0);
    }

    #[test]
    fn moving_left_stops_at_tile_right_edge() {
        let mut room = room_with_wall();
        let mover = room.add_object(RoomObject::new("mover", Vec2::new(90.0, 16.0), Vec2::splat(12.0)));
        let mut core = core_at(Vec2::new(90.0, 16.0), Vec2::splat(12.0));
        let mut hooks = Recorder::default();
        let mut ctx = MoveContext::new(&mut room, mover);

        move_horizontal(&mut core, &mut hooks, &mut ctx, -20.0);
        assert_eq!(core.position.x, 80.0);
        assert_eq!(hooks.tiles, vec![Direction::Left]);
    }

    #[test]
    fn obstacle_wins_over_tile_on_the_same_axis() {
        let mut room = room_with_wall();
        let block = room.add_object(
            RoomObject::new("block", Vec2::new(56.0, 0.0), Vec2::new(8.0, 64.0))
                .with_surfaces(SurfaceSet::solid(0.1))
                .collidable(true),
        );
        let mover = room.add_object(RoomObject::new("mover", Vec2::new(40.0, 16.0), Vec2::splat(12.0)));
        let mut core = core_at(Vec2::new(40.0, 16.0), Vec2::splat(12.0));
        let mut hooks = Recorder::default();
        let mut ctx = MoveContext::new(&mut room, mover);

        move_horizontal(&mut core, &mut hooks, &mut ctx, 10.0);
        assert_eq!(core.bounds().max_x, 56.0);
        assert_eq!(hooks.obstacles, vec![(block, Direction::Right)]);
        assert!(hooks.tiles.is_empty());
    }

    #[test]
    fn overlapping_obstacle_is_not_a_new_contact() {
        let mut room = Room::default();
        room.add_object(
            RoomObject::new("block", Vec2::new(10.0, 0.0), Vec2::new(20.0, 20.0))
                .with_surfaces(SurfaceSet::solid(0.1))
                .collidable(true),
        );
        let mover = room.add_object(RoomObject::new("mover", Vec2::new(12.0, 4.0), Vec2::splat(8.0)));
        let mut core = core_at(Vec2::new(12.0, 4.0), Vec2::splat(8.0));
        let mut hooks = Recorder::default();
        let mut ctx = MoveContext::new(&mut room, mover);

        move_horizontal(&mut core, &mut hooks, &mut ctx, 4.0);
        assert_eq!(core.position.x, 16.0);
        assert!(hooks.obstacles.is_empty());
    }

    #[test]
    fn lands_on_floor_and_hits_terrain() {
        let mut room = Room::default();
        let mut grid = TileGrid::new("main", 8, 8, Vec2::splat(16.0));
        grid.set_tile(1, 4, Arc::new(TileTemplate::solid("stone", 0.2)));
        room.grids.push(grid);
        room.active_grid = Some(0);
        room.terrains.push(Terrain::new(
            TerrainPosition::Bottom,
            TerrainShape::Flat { y: 50.0 },
        ));
        let mover = room.add_object(RoomObject::new("mover", Vec2::new(18.0, 40.0), Vec2::splat(12.0)));
        let mut core = core_at(Vec2::new(18.0, 40.0), Vec2::splat(12.0));
        let mut hooks = Recorder::default();
        let mut ctx = MoveContext::new(&mut room, mover);

        move_vertical(&mut core, &mut hooks, &mut ctx, 30.0);
        assert_eq!(core.bounds().max_y, 64.0);
        assert_eq!(hooks.tiles, vec![Direction::Bottom]);

        enforce_terrains(&mut core, &mut hooks, &mut ctx);
        assert_eq!(core.bounds().max_y, 50.0);
        assert_eq!(hooks.terrains, vec![0]);
    }
}
