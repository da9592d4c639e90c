use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::circular::{orbit_velocity, Orbit, OrbitConfig};
use super::{drifting_action_state, MoveContext, MovementCore, MovementHooks};
use crate::physics_core::Aabb;

/// Scripted motion broadcast by a director region.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DirectorInstruction {
    Linear { velocity: Vec2 },
    Circular(OrbitConfig),
    Stop,
}

/// Trigger region handing its instruction to directed movers inside it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Director {
    pub position: Vec2,
    pub size: Vec2,
    pub instruction: DirectorInstruction,
}

impl Director {
    pub fn bounds(&self) -> Aabb {
        Aabb::from_position(self.position, self.size)
    }
}

#[derive(Default)]
pub struct DirectedMovementProvider {
    current: Option<DirectorInstruction>,
    orbit: Option<Orbit>,
}

impl DirectedMovementProvider {
    pub fn current(&self) -> Option<DirectorInstruction> {
        self.current
    }

    pub fn orbit(&self) -> Option<&Orbit> {
        self.orbit.as_ref()
    }

    fn adopt(&mut self, instruction: Option<DirectorInstruction>) {
        if instruction == self.current {
            return;
        }
        // Circular to circular keeps centre and phase.
        let seamless = matches!(
            (self.current, instruction),
            (
                Some(DirectorInstruction::Circular(_)),
                Some(DirectorInstruction::Circular(_))
            )
        );
        if !seamless {
            self.orbit = None;
        }
        self.current = instruction;
    }
}

impl MovementHooks for DirectedMovementProvider {
    fn set_candidate_velocity(&mut self, core: &mut MovementCore, ctx: &mut MoveContext) {
        if !ctx.is_owner_alive() {
            core.velocity = Vec2::ZERO;
            return;
        }
        if let Some(instruction) = ctx.room.director_at(&core.bounds()) {
            ctx.owner_mut().director_instruction = Some(instruction);
        }
        self.adopt(ctx.owner().director_instruction);

        core.velocity = match self.current {
            None | Some(DirectorInstruction::Stop) => Vec2::ZERO,
            Some(DirectorInstruction::Linear { velocity }) => velocity,
            Some(DirectorInstruction::Circular(config)) => orbit_velocity(
                &mut self.orbit,
                &config,
                core.position,
                ctx.room.tile_size(),
                ctx.viscosity(),
            ),
        };
    }

    fn update_state(&mut self, core: &mut MovementCore, ctx: &mut MoveContext, _do_interact: &mut bool) {
        if !ctx.is_owner_alive() {
            ctx.finish_dying_owner();
        }
        let (state, facing) = drifting_action_state(ctx.is_owner_alive(), core.velocity);
        ctx.set_action_state(state, facing);
    }

    fn do_reset(&mut self, _core: &mut MovementCore) {
        self.current = None;
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
    use super::*;
    use crate::components::ObjectId;
    use crate::inventory::GameConditionList;
    use crate::movement::{MovementProvider, ProviderKind};
    use crate::obstacle::RoomObject;
    use crate::room::Room;

    fn directed_room() -> (Room, ObjectId) {
        let mut room = Room::default();
        let provider = MovementProvider::new(
            ProviderKind::Directed(DirectedMovementProvider::default()),
            GameConditionList::default(),
        );
        let id = room.add_object(
            RoomObject::new("bat", Vec2::new(10.0, 10.0), Vec2::splat(8.0)).with_provider(provider),
        );
        (room, id)
    }

    fn directed(room: &Room, id: ObjectId) -> &DirectedMovementProvider {
        match room.objects[id].provider().map(|p| &p.kind) {
            Some(ProviderKind::Directed(d)) => d,
            _ => panic!("not a directed mover"),
        }
    }

    #[test]
    fn idle_until_a_director_is_touched() {
        let (mut room, id) = directed_room();
        room.directors.push(Director {
            position: Vec2::new(30.0, 0.0),
            size: Vec2::new(10.0, 40.0),
            instruction: DirectorInstruction::Linear {
                velocity: Vec2::new(0.0, 3.0),
            },
        });
        room.step();
        assert_eq!(room.objects[id].position, Vec2::new(10.0, 10.0));

        room.objects[id].director_instruction = Some(DirectorInstruction::Linear {
            velocity: Vec2::new(8.0, 0.0),
        });
        // 10 -> 18 -> 26, overlapping the region from the third tick on.
        room.step();
        room.step();
        room.step();
        assert_eq!(
            directed(&room, id).current(),
            Some(DirectorInstruction::Linear {
                velocity: Vec2::new(0.0, 3.0)
            })
        );
        assert_eq!(room.objects[id].position, Vec2::new(26.0, 13.0));
    }

    #[test]
    fn circular_switch_keeps_the_orbit_phase() {
        let (mut room, id) = directed_room();
        room.objects[id].director_instruction = Some(DirectorInstruction::Circular(OrbitConfig {
            center_offset: Vec2::new(2.0, 0.0),
            angular_speed: 0.2,
            clockwise: true,
        }));
        room.step();
        room.step();
        let before = *directed(&room, id).orbit().expect("orbit");

        room.objects[id].director_instruction = Some(DirectorInstruction::Circular(OrbitConfig {
            center_offset: Vec2::new(-5.0, 0.0),
            angular_speed: 0.1,
            clockwise: false,
        }));
        room.step();
        let after = *directed(&room, id).orbit().expect("orbit");
        assert_eq!(after.center, before.center);
        assert_eq!(after.radius, before.radius);
        assert!((after.angle - (before.angle - 0.1)).abs() < 1.0e-6);
    }

    #[test]
    fn any_other_switch_reinitializes() {
        let (mut room, id) = directed_room();
        room.objects[id].director_instruction =
            Some(DirectorInstruction::Circular(OrbitConfig::default()));
        room.step();
        assert!(directed(&room, id).orbit().is_some());

        room.objects[id].director_instruction = Some(DirectorInstruction::Stop);
        room.step();
        let parked = room.objects[id].position;
        assert!(directed(&room, id).orbit().is_none());
        room.step();
        assert_eq!(room.objects[id].position, parked);
    }
}
