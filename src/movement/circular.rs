use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::{drifting_action_state, MoveContext, MovementCore, MovementHooks};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    /// Orbit centre relative to the starting position, in tiles.
    pub center_offset: Vec2,
    /// Radians per tick.
    pub angular_speed: f32,
    /// Clockwise on screen (`+y` down).
    pub clockwise: bool,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            center_offset: Vec2::new(1.0, 0.0),
            angular_speed: 0.05,
            clockwise: true,
        }
    }
}

impl OrbitConfig {
    /// Signed angle advanced in one tick.
    pub fn step(&self, viscosity: f32) -> f32 {
        let magnitude = self.angular_speed.abs() * viscosity;
        if self.clockwise {
            magnitude
        } else {
            -magnitude
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Orbit {
    pub center: Vec2,
    pub radius: f32,
    pub angle: f32,
}

impl Orbit {
    /// Orbit around `center` that passes through `point`.
    pub fn through(point: Vec2, center: Vec2) -> Self {
        let d = point - center;
        Self {
            center,
            radius: d.length(),
            angle: d.y.atan2(d.x),
        }
    }

    pub fn point(&self) -> Vec2 {
        self.center + Vec2::new(self.angle.cos(), self.angle.sin()) * self.radius
    }

    pub fn advance(&mut self, delta: f32) -> Vec2 {
        self.angle += delta;
        self.point()
    }
}

/// Advance `orbit` (created on first use from `position`) and return the
/// velocity that lands exactly on the next orbit point.
pub(crate) fn orbit_velocity(
    orbit: &mut Option<Orbit>,
    config: &OrbitConfig,
    position: Vec2,
    tile_size: Vec2,
    viscosity: f32,
) -> Vec2 {
    let orbit = orbit.get_or_insert_with(|| {
        Orbit::through(position, position + config.center_offset * tile_size)
    });
    let target = orbit.advance(config.step(viscosity));
    if viscosity > 0.0 {
        (target - position) / viscosity
    } else {
        Vec2::ZERO
    }
}

pub struct CircularMovementProvider {
    config: OrbitConfig,
    orbit: Option<Orbit>,
}

impl CircularMovementProvider {
    pub fn new(config: OrbitConfig) -> Self {
        Self { config, orbit: None }
    }

    pub fn orbit(&self) -> Option<&Orbit> {
        self.orbit.as_ref()
    }
}

impl MovementHooks for CircularMovementProvider {
    fn set_candidate_velocity(&mut self, core: &mut MovementCore, ctx: &mut MoveContext) {
        if !ctx.is_owner_alive() {
            core.velocity = Vec2::ZERO;
            return;
        }
        core.velocity = orbit_velocity(
            &mut self.orbit,
            &self.config,
            core.position,
            ctx.room.tile_size(),
            ctx.viscosity(),
        );
    }

    fn update_state(&mut self, core: &mut MovementCore, ctx: &mut MoveContext, _do_interact: &mut bool) {
        if !ctx.is_owner_alive() {
            ctx.finish_dying_owner();
        }
        let (state, facing) = drifting_action_state(ctx.is_owner_alive(), core.velocity);
        ctx.set_action_state(state, facing);
    }

    fn do_reset(&mut self, _core: &mut MovementCore) {
        self.orbit = None;
    }

    fn accelerates_from_tiles(&self) -> bool {
        false
    }

    fn passes_through_solids(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;
    use std::sync::Arc;

    use super::*;
    use crate::inventory::GameConditionList;
    use crate::movement::{MovementProvider, ProviderKind};
    use crate::obstacle::RoomObject;
    use crate::room::Room;
    use crate::tilemap::{TileGrid, TileTemplate};

    fn platform_room(config: OrbitConfig) -> (Room, crate::components::ObjectId) {
        let mut room = Room::default();
        let mut grid = TileGrid::new("main", 20, 20, Vec2::splat(16.0));
        grid.set_tile(6, 5, Arc::new(TileTemplate::solid("stone", 0.2)));
        room.grids.push(grid);
        room.active_grid = Some(0);
        let provider = MovementProvider::new(
            ProviderKind::Circular(CircularMovementProvider::new(config)),
            GameConditionList::default(),
        );
        let id = room.add_object(
            RoomObject::new("platform", Vec2::new(64.0, 80.0), Vec2::new(32.0, 8.0))
                .with_provider(provider),
        );
        (room, id)
    }

    #[test]
    fn orbit_through_start_returns_after_a_full_turn() {
        let (mut room, id) = platform_room(OrbitConfig {
            center_offset: Vec2::new(1.0, 0.0),
            angular_speed: PI / 8.0,
            clockwise: true,
        });
        for _ in 0..8 {
            room.step();
        }
        let half = room.objects[id].position;
        assert!((half - Vec2::new(96.0, 80.0)).length() < 1.0e-3, "{half}");

        for _ in 0..8 {
            room.step();
        }
        let back = room.objects[id].position;
        assert!((back - Vec2::new(64.0, 80.0)).length() < 1.0e-3, "{back}");
    }

    #[test]
    fn clockwise_orbit_swings_up_from_the_left_point() {
        let (mut room, id) = platform_room(OrbitConfig {
            center_offset: Vec2::new(1.0, 0.0),
            angular_speed: 0.1,
            clockwise: true,
        });
        room.step();
        assert!(room.objects[id].position.y < 80.0);

        let (mut room, id) = platform_room(OrbitConfig {
            center_offset: Vec2::new(1.0, 0.0),
            angular_speed: 0.1,
            clockwise: false,
        });
        room.step();
        assert!(room.objects[id].position.y > 80.0);
    }

    #[test]
    fn reset_rebuilds_the_orbit_from_the_start_position() {
        let (mut room, id) = platform_room(OrbitConfig::default());
        room.step();
        room.reset_objects();
        let orbit = room.objects[id].provider().and_then(|p| match &p.kind {
            ProviderKind::Circular(c) => c.orbit().copied(),
            _ => None,
        });
        assert!(orbit.is_none());
        assert_eq!(room.objects[id].position, Vec2::new(64.0, 80.0));
    }
}
