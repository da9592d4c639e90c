use bevy::prelude::*;

use super::{drifting_action_state, MoveContext, MovementCore, MovementHooks};
use crate::components::ObjectId;
use crate::surface::{Direction, SurfaceInformation};
use crate::terrain::TerrainPosition;

/// Straight-line mover that dies on its first hit.
pub struct LinearProjectileMovementProvider {
    velocity: Vec2,
    death_duration: u32,
    death_ticks: u32,
}

impl LinearProjectileMovementProvider {
    pub fn new(velocity: Vec2, death_duration: u32) -> Self {
        Self {
            velocity,
            death_duration,
            death_ticks: 0,
        }
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Re-aim a pooled projectile before it is fired again.
    pub fn aim(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    fn impact(&mut self, core: &mut MovementCore, ctx: &mut MoveContext) {
        core.velocity = Vec2::ZERO;
        ctx.kill_owner();
    }
}

impl MovementHooks for LinearProjectileMovementProvider {
    fn set_candidate_velocity(&mut self, core: &mut MovementCore, ctx: &mut MoveContext) {
        if ctx.is_owner_alive() {
            core.velocity = self.velocity;
        } else {
            self.death_ticks = self.death_ticks.saturating_add(1);
            core.velocity = Vec2::ZERO;
        }
    }

    fn handle_tile_collision(
        &mut self,
        core: &mut MovementCore,
        ctx: &mut MoveContext,
        _direction: Direction,
        _surface: SurfaceInformation,
    ) {
        self.impact(core, ctx);
    }

    fn handle_obstacle_collision(
        &mut self,
        core: &mut MovementCore,
        ctx: &mut MoveContext,
        obstacle: ObjectId,
        _direction: Direction,
        _surface: SurfaceInformation,
    ) {
        let offense = ctx.owner().offense();
        let target_defense = ctx.room.objects.get(obstacle).map(|o| o.defense());
        if target_defense.is_some_and(|defense| offense > defense) {
            ctx.kill(obstacle);
        }
        self.impact(core, ctx);
    }

    fn handle_terrain_collision(
        &mut self,
        core: &mut MovementCore,
        ctx: &mut MoveContext,
        _terrain: usize,
        _position: TerrainPosition,
    ) {
        self.impact(core, ctx);
    }

    fn update_state(&mut self, core: &mut MovementCore, ctx: &mut MoveContext, _do_interact: &mut bool) {
        let alive = ctx.is_owner_alive();
        if !alive && self.death_ticks >= self.death_duration {
            ctx.finish_dying_owner();
        }
        let heading = if alive { core.velocity } else { self.velocity };
        let (state, facing) = drifting_action_state(alive, heading);
        ctx.set_action_state(state, facing);
    }

    fn do_reset(&mut self, _core: &mut MovementCore) {
        self.death_ticks = 0;
    }

    fn accelerates_from_tiles(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::components::{ActionState, LifeState};
    use crate::inventory::GameConditionList;
    use crate::movement::{MovementProvider, ProviderKind};
    use crate::obstacle::RoomObject;
    use crate::room::Room;
    use crate::surface::SurfaceSet;
    use crate::tilemap::{TileGrid, TileTemplate};

    fn bullet(position: Vec2, velocity: Vec2, death_duration: u32) -> RoomObject {
        let provider = MovementProvider::new(
            ProviderKind::LinearProjectile(LinearProjectileMovementProvider::new(
                velocity,
                death_duration,
            )),
            GameConditionList::default(),
        );
        RoomObject::new("bullet", position, Vec2::new(6.0, 4.0)).with_provider(provider)
    }

    #[test]
    fn flies_straight_then_dies_on_a_wall() {
        let mut room = Room::default();
        let mut grid = TileGrid::new("main", 10, 4, Vec2::splat(16.0));
        grid.set_tile(5, 1, Arc::new(TileTemplate::solid("stone", 0.2)));
        room.grids.push(grid);
        room.active_grid = Some(0);
        let id = room.add_object(bullet(Vec2::new(40.0, 20.0), Vec2::new(8.0, 0.0), 3));

        room.step();
        assert_eq!(room.objects[id].position, Vec2::new(48.0, 20.0));
        assert_eq!(room.objects[id].action_state, ActionState::FlyRight);

        // Right edge goes 54, 62, 70, 78, then stops flush at 80.
        for _ in 0..4 {
            room.step();
        }
        assert_eq!(room.objects[id].bounds().max_x, 80.0);
        assert_eq!(room.objects[id].life, LifeState::Dying);
        assert_eq!(room.objects[id].velocity, Vec2::ZERO);

        let parked = room.objects[id].position;
        for _ in 0..3 {
            room.step();
        }
        assert_eq!(room.objects[id].position, parked);
        assert_eq!(room.objects[id].life, LifeState::Dead);
    }

    #[test]
    fn hit_kills_a_weaker_target() {
        let mut room = Room::default();
        let target = room.add_object(
            RoomObject::new("crate", Vec2::new(60.0, 0.0), Vec2::splat(16.0))
                .with_surfaces(SurfaceSet::solid(0.2))
                .collidable(true),
        );
        let mut shot = bullet(Vec2::new(40.0, 4.0), Vec2::new(8.0, 0.0), 0);
        shot.surfaces = SurfaceSet::uniform(SurfaceInformation {
            offense: 1.0,
            ..SurfaceInformation::empty(Direction::Top)
        });
        let id = room.add_object(shot);

        room.step();
        room.step();
        assert_eq!(room.objects[target].life, LifeState::Dying);
        assert_eq!(room.objects[id].bounds().max_x, 60.0);
        assert_eq!(room.objects[id].life, LifeState::Dead);
    }
}
