use bevy::prelude::*;

use super::{MoveContext, MovementCore};
use crate::components::{Axis, Orientation};
use crate::physics_core::{Aabb, Contact, CONTACT_EPSILON};
use crate::surface::{Direction, SurfaceSet};

/// Where hole detection samples the ground.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum LookAhead {
    #[default]
    Midpoint,
    /// Just in front of the foot on the side the object faces.
    LeadingFoot(Orientation),
}

const FOOT_REACH: f32 = 0.5;

impl MovementCore {
    /// Rebuild the four-sided contact state without moving.
    ///
    /// Scans the active grid cells around the object (one cell of margin),
    /// then collidable obstacles, then the main character. Overlapping a
    /// lethal source kills the owner; bordering a source composes its facing
    /// side into the matching side of the object.
    pub fn evaluate_surroundings(&mut self, ctx: &mut MoveContext, look_ahead: LookAhead) {
        self.clear_surroundings();
        let bounds = self.bounds();
        let defense = ctx.owner().defense();
        let look_x = match look_ahead {
            LookAhead::Midpoint => bounds.center_x(),
            LookAhead::LeadingFoot(Orientation::Left) => bounds.min_x - FOOT_REACH,
            LookAhead::LeadingFoot(Orientation::Right) => bounds.max_x + FOOT_REACH,
        };
        let mut should_die = false;

        if let Some(grid) = ctx.room.active_grid() {
            let first_x = grid.index(Axis::Horizontal, bounds.min_x.min(look_x), false) - 1;
            let last_x = grid.index(Axis::Horizontal, bounds.max_x.max(look_x), true) + 1;
            let first_y = grid.index(Axis::Vertical, bounds.min_y, false) - 1;
            let last_y = grid.index(Axis::Vertical, bounds.max_y, true) + 1;
            for y in first_y..=last_y {
                for x in first_x..=last_x {
                    let Some(tile) = grid.get(x, y) else {
                        continue;
                    };
                    let cell = grid.cell_bounds(x, y);
                    should_die |=
                        self.absorb(&bounds, &cell, &tile.surfaces, defense, Some(tile.acceleration));
                }
            }

            let foot_x = grid.index(Axis::Horizontal, look_x, false);
            let foot_y = grid.index(Axis::Vertical, bounds.max_y, false);
            if grid
                .get(foot_x, foot_y)
                .is_some_and(|t| t.surfaces.get(Direction::Top).is_solid)
            {
                self.ground_ahead_solid = true;
            }
        }

        for id in ctx.room.surface_sources(ctx.owner) {
            let other = &ctx.room.objects[id];
            let other_bounds = other.last_bounds();
            should_die |= self.absorb(&bounds, &other_bounds, &other.surfaces, defense, None);

            let under_foot = look_x >= other_bounds.min_x
                && look_x <= other_bounds.max_x
                && (bounds.max_y - other_bounds.min_y).abs() <= CONTACT_EPSILON;
            if under_foot && other.surfaces.get(Direction::Top).is_solid {
                self.ground_ahead_solid = true;
            }
        }

        if should_die {
            ctx.kill_owner();
        }
    }

    /// Fold one surface source into the contact state. Returns true when the
    /// overlap is lethal.
    fn absorb(
        &mut self,
        bounds: &Aabb,
        source: &Aabb,
        surfaces: &SurfaceSet,
        defense: f32,
        acceleration: Option<Vec2>,
    ) -> bool {
        match bounds.contact(source) {
            Contact::Overlap => {
                if surfaces.max_offense() > defense || surfaces.is_solid_all() {
                    return true;
                }
                if let Some(a) = acceleration {
                    if a.length_squared() > self.active_tile_acceleration.length_squared() {
                        self.active_tile_acceleration = a;
                    }
                }
            }
            Contact::Border(side) => self.touch(side, surfaces.get(side.opposite())),
            Contact::Apart => {}
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::components::LifeState;
    use crate::inventory::GameConditionList;
    use crate::obstacle::RoomObject;
    use crate::room::Room;
    use crate::surface::SurfaceInformation;
    use crate::tilemap::{TileGrid, TileTemplate};

    fn room() -> Room {
        let mut room = Room::default();
        let mut grid = TileGrid::new("main", 10, 10, Vec2::splat(16.0));
        let stone = Arc::new(TileTemplate::solid("stone", 0.3));
        for x in 0..4 {
            grid.set_tile(x, 5, stone.clone());
        }
        let wind = Arc::new(TileTemplate {
            name: "wind".into(),
            surfaces: SurfaceSet::default(),
            height: 0,
            acceleration: Vec2::new(0.0, -0.4),
        });
        grid.set_tile(8, 2, wind);
        room.grids.push(grid);
        room.active_grid = Some(0);
        room
    }

    fn evaluate(room: &mut Room, position: Vec2, look: LookAhead) -> (MovementCore, bool) {
        let id = room.add_object(RoomObject::new("runner", position, Vec2::splat(12.0)));
        let mut core = MovementCore::new(GameConditionList::default(), false);
        core.position = position;
        core.size = Vec2::splat(12.0);
        let mut ctx = MoveContext::new(room, id);
        core.evaluate_surroundings(&mut ctx, look);
        let alive = ctx.is_owner_alive();
        (core, alive)
    }

    #[test]
    fn standing_on_floor_reports_bottom_contact() {
        let mut room = room();
        let (core, alive) = evaluate(&mut room, Vec2::new(20.0, 68.0), LookAhead::Midpoint);
        assert!(alive);
        assert!(core.touches_solid(Direction::Bottom));
        assert_eq!(core.surface(Direction::Bottom).friction, 0.3);
        assert!(!core.touches_solid(Direction::Left));
        assert!(core.ground_ahead_solid);
    }

    #[test]
    fn leading_foot_sees_the_hole_past_the_ledge() {
        let mut room = room();
        // Right edge flush with the last floor tile.
        let (core, _) = evaluate(
            &mut room,
            Vec2::new(52.0, 68.0),
            LookAhead::LeadingFoot(Orientation::Right),
        );
        assert!(core.touches_solid(Direction::Bottom));
        assert!(!core.ground_ahead_solid);

        let (core, _) = evaluate(
            &mut room,
            Vec2::new(52.0, 68.0),
            LookAhead::LeadingFoot(Orientation::Left),
        );
        assert!(core.ground_ahead_solid);
    }

    #[test]
    fn overlapping_solid_tile_squashes() {
        let mut room = room();
        let (_, alive) = evaluate(&mut room, Vec2::new(20.0, 74.0), LookAhead::Midpoint);
        assert!(!alive);
        assert_eq!(room.objects.iter().last().map(|(_, o)| o.life), Some(LifeState::Dying));
    }

    #[test]
    fn overlapping_soft_tile_records_acceleration() {
        let mut room = room();
        let (core, alive) = evaluate(&mut room, Vec2::new(130.0, 34.0), LookAhead::Midpoint);
        assert!(alive);
        assert_eq!(core.active_tile_acceleration, Vec2::new(0.0, -0.4));
    }

    #[test]
    fn deadly_obstacle_overlap_kills_but_border_only_touches() {
        let mut room = Room::default();
        let spikes = SurfaceSet::uniform(SurfaceInformation {
            offense: 2.0,
            ..SurfaceInformation::empty(Direction::Top)
        });
        room.add_object(
            RoomObject::new("spikes", Vec2::new(100.0, 100.0), Vec2::splat(16.0))
                .with_surfaces(spikes)
                .collidable(true),
        );

        let (core, alive) = evaluate(&mut room, Vec2::new(88.0, 102.0), LookAhead::Midpoint);
        assert!(alive);
        assert!(core.surface(Direction::Right).is_deadly());

        let (_, alive) = evaluate(&mut room, Vec2::new(95.0, 102.0), LookAhead::Midpoint);
        assert!(!alive);
    }
}
