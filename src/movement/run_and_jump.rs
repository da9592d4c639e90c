use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::surroundings::LookAhead;
use super::{MoveContext, MovementCore, MovementHooks};
use crate::ai::{Intelligence, IntelligenceKind, IntelligenceView, MovementIntelligence};
use crate::components::{ActionState, Axis, MoveIntents, ObjectId, Orientation, VerticalState};
use crate::events::{ON_JUMP, ON_WALL_JUMP};
use crate::surface::{compose, Direction, SurfaceInformation};
use crate::terrain::TerrainPosition;

/// Ticks the shooting pose is held after an interact.
const SHOOT_POSE_TICKS: u32 = 10;

/// Per-template numbers for runners. Speeds are per tick, accelerations per
/// tick squared, heights in world units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerTuning {
    pub gravity: f32,
    pub jump_speed: f32,
    pub default_jump_height: f32,
    pub wall_jump_height: f32,
    pub max_horizontal_speed: f32,
    pub max_vertical_speed: f32,
    pub horizontal_acceleration: f32,
    pub death_duration: u32,
    pub death_kick_speed: f32,
    pub fly_acceleration: f32,
    pub can_fly: bool,
    pub can_wall_jump: bool,
    pub stop_on_deadly_contact: bool,
}

impl Default for RunnerTuning {
    fn default() -> Self {
        Self {
            gravity: 0.5,
            jump_speed: 7.0,
            default_jump_height: 90.0,
            wall_jump_height: 45.0,
            max_horizontal_speed: 5.0,
            max_vertical_speed: 12.0,
            horizontal_acceleration: 0.6,
            death_duration: 60,
            death_kick_speed: 8.0,
            fly_acceleration: 0.9,
            can_fly: false,
            can_wall_jump: true,
            stop_on_deadly_contact: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct ScheduledSpeed {
    axis: Axis,
    speed: f32,
}

/// Standing/jumping/falling runner with wall jumps, flight and a death arc.
pub struct RunAndJumpMovementProvider {
    tuning: RunnerTuning,
    intelligence_kind: IntelligenceKind,
    intelligence: Intelligence,
    vertical: VerticalState,
    orientation: Orientation,
    can_wall_jump: bool,
    wall_jumping: bool,
    remaining_jump: f32,
    scheduled: Option<ScheduledSpeed>,
    death_ticks: u32,
    shoot_ticks: u32,
    intents: MoveIntents,
    /// Landed on terrain last tick; terrain is not part of the surroundings scan.
    grounded: bool,
    flying: bool,
}

impl RunAndJumpMovementProvider {
    pub fn new(tuning: RunnerTuning, intelligence: IntelligenceKind) -> Self {
        Self {
            tuning,
            intelligence: Intelligence::from(&intelligence),
            intelligence_kind: intelligence,
            vertical: VerticalState::Falling,
            orientation: Orientation::Right,
            can_wall_jump: false,
            wall_jumping: false,
            remaining_jump: 0.0,
            scheduled: None,
            death_ticks: 0,
            shoot_ticks: 0,
            intents: MoveIntents::default(),
            grounded: false,
            flying: false,
        }
    }

    pub fn tuning(&self) -> &RunnerTuning {
        &self.tuning
    }

    pub fn vertical_state(&self) -> VerticalState {
        self.vertical
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn remaining_jump(&self) -> f32 {
        self.remaining_jump
    }

    pub fn can_wall_jump(&self) -> bool {
        self.can_wall_jump
    }

    pub fn is_flying(&self) -> bool {
        self.flying
    }

    fn schedule(&mut self, axis: Axis, speed: f32) {
        self.scheduled = Some(ScheduledSpeed { axis, speed });
    }

    fn dying_velocity(&mut self, core: &mut MovementCore, viscosity: f32) {
        self.death_ticks = self.death_ticks.saturating_add(1);
        self.intents = MoveIntents::default();
        self.flying = false;
        if self.death_ticks == 1 {
            core.velocity = Vec2::new(0.0, -self.tuning.death_kick_speed);
        } else {
            core.velocity.y += self.tuning.gravity * viscosity * viscosity;
        }
    }

    fn land(&mut self, core: &mut MovementCore) {
        core.velocity.y = 0.0;
        self.vertical = VerticalState::Standing;
        self.grounded = true;
        self.wall_jumping = false;
    }

    /// Shared reaction to tile and obstacle hits. `direction` is the side of
    /// this object that made contact.
    fn react(&mut self, core: &mut MovementCore, direction: Direction, surface: SurfaceInformation) {
        let ejection = surface.tangent_speed.abs();
        match direction {
            Direction::Left | Direction::Right => {
                core.velocity.x = 0.0;
                if ejection > 0.0 {
                    self.schedule(Axis::Horizontal, -direction.outward() * ejection);
                }
            }
            Direction::Top => {
                core.velocity.y = core.velocity.y.max(0.0);
                self.vertical = VerticalState::Falling;
                self.wall_jumping = false;
                if ejection > 0.0 {
                    self.schedule(Axis::Vertical, ejection);
                }
            }
            Direction::Bottom => {
                if ejection > 0.0 {
                    self.schedule(Axis::Vertical, -ejection);
                    self.vertical = VerticalState::Falling;
                } else {
                    self.land(core);
                }
            }
        }
    }

    fn action_state(&self, alive: bool) -> ActionState {
        let o = self.orientation;
        if !alive {
            return ActionState::Die;
        }
        if self.shoot_ticks > 0 {
            return ActionState::shoot(o);
        }
        if self.wall_jumping && self.vertical == VerticalState::Jumping {
            return ActionState::wall_jump(o);
        }
        if self.flying && self.vertical != VerticalState::Standing {
            return ActionState::fly(o);
        }
        match self.vertical {
            VerticalState::Jumping => ActionState::jump(o),
            VerticalState::Standing if self.intents.horizontal() != 0.0 => ActionState::walk(o),
            VerticalState::Standing => ActionState::stand(o),
            VerticalState::Falling => ActionState::fall(o),
        }
    }
}

impl MovementHooks for RunAndJumpMovementProvider {
    fn set_candidate_velocity(&mut self, core: &mut MovementCore, ctx: &mut MoveContext) {
        let v = ctx.viscosity();
        if ctx.is_owner_alive() {
            core.evaluate_surroundings(ctx, LookAhead::LeadingFoot(self.orientation));
        }
        if !ctx.is_owner_alive() {
            self.dying_velocity(core, v);
            return;
        }

        let touching_left = core.touches_solid(Direction::Left);
        let touching_right = core.touches_solid(Direction::Right);
        self.can_wall_jump = self.vertical != VerticalState::Standing
            && self.tuning.can_wall_jump
            && (touching_left || touching_right);

        let view = IntelligenceView {
            orientation: self.orientation,
            vertical: self.vertical,
            surroundings: core.surfaces(),
            ground_ahead_solid: core.ground_ahead_solid,
            bounds: core.bounds(),
            main_character: ctx.room.main_character_bounds(ctx.owner),
            external: ctx.owner().intents,
            can_wall_jump: self.can_wall_jump,
        };
        let intents = self.intelligence.update(&view);
        self.intents = intents;

        if self.vertical == VerticalState::Standing
            && !core.touches_solid(Direction::Bottom)
            && !self.grounded
        {
            self.vertical = VerticalState::Falling;
        }
        self.grounded = false;

        let dir = intents.horizontal();
        if dir < 0.0 {
            self.orientation = Orientation::Left;
        } else if dir > 0.0 {
            self.orientation = Orientation::Right;
        }

        if intents.start_jump && self.can_wall_jump {
            let away = if touching_left { 1.0 } else { -1.0 };
            core.velocity.x = away * self.tuning.max_horizontal_speed;
            core.velocity.y = -self.tuning.jump_speed;
            self.remaining_jump = self.tuning.wall_jump_height;
            self.vertical = VerticalState::Jumping;
            self.wall_jumping = true;
            self.orientation = if away > 0.0 {
                Orientation::Right
            } else {
                Orientation::Left
            };
            ctx.emit(ON_WALL_JUMP);
            return;
        }

        core.velocity.x += dir * self.tuning.horizontal_acceleration * v * v;
        if let Some(support) = compose(core.contact(Direction::Top), core.contact(Direction::Bottom)) {
            let drag = (support.friction * v).min(1.0);
            core.velocity.x -= drag * (core.velocity.x - support.velocity);
        }

        if self.vertical == VerticalState::Standing && intents.start_jump {
            self.vertical = VerticalState::Jumping;
            self.remaining_jump = self.tuning.default_jump_height;
            ctx.emit(ON_JUMP);
        }
        if self.vertical == VerticalState::Jumping
            && (!intents.start_or_continue_jump || self.remaining_jump <= 0.0)
        {
            self.vertical = VerticalState::Falling;
            self.wall_jumping = false;
        }

        self.flying = intents.fly && self.tuning.can_fly;
        if self.flying {
            if self.vertical == VerticalState::Standing {
                self.vertical = VerticalState::Falling;
            }
            core.velocity.y += (self.tuning.gravity - self.tuning.fly_acceleration) * v * v;
        } else if self.vertical == VerticalState::Jumping {
            core.velocity.y = -self.tuning.jump_speed;
        } else {
            core.velocity.y += self.tuning.gravity * v * v;
        }
        if let Some(wall) = compose(core.contact(Direction::Left), core.contact(Direction::Right)) {
            let drag = (wall.friction * v).min(1.0);
            core.velocity.y -= drag * (core.velocity.y - wall.velocity);
        }
    }

    fn finalize_candidate_velocity(&mut self, core: &mut MovementCore, _ctx: &mut MoveContext) {
        let max_x = self.tuning.max_horizontal_speed;
        let max_y = self.tuning.max_vertical_speed;
        core.velocity.x = core.velocity.x.clamp(-max_x, max_x);
        core.velocity.y = core.velocity.y.clamp(-max_y, max_y);
    }

    fn pre_commit_move_y(&mut self, offset: f32) {
        if offset < 0.0 {
            self.remaining_jump += offset;
        }
    }

    fn handle_tile_collision(
        &mut self,
        core: &mut MovementCore,
        _ctx: &mut MoveContext,
        direction: Direction,
        surface: SurfaceInformation,
    ) {
        self.react(core, direction, surface);
    }

    fn handle_obstacle_collision(
        &mut self,
        core: &mut MovementCore,
        ctx: &mut MoveContext,
        obstacle: ObjectId,
        direction: Direction,
        surface: SurfaceInformation,
    ) {
        if surface.is_die {
            ctx.kill(obstacle);
        }
        self.react(core, direction, surface);
    }

    fn handle_terrain_collision(
        &mut self,
        core: &mut MovementCore,
        _ctx: &mut MoveContext,
        _terrain: usize,
        position: TerrainPosition,
    ) {
        match position {
            TerrainPosition::Bottom => {
                if core.velocity.y >= 0.0 {
                    self.land(core);
                }
            }
            TerrainPosition::Top => {
                core.velocity.y = core.velocity.y.max(0.0);
                self.vertical = VerticalState::Falling;
                self.wall_jumping = false;
            }
        }
    }

    fn update_state(&mut self, core: &mut MovementCore, ctx: &mut MoveContext, do_interact: &mut bool) {
        if self.vertical == VerticalState::Jumping && self.remaining_jump <= 0.0 {
            self.vertical = VerticalState::Falling;
            self.wall_jumping = false;
        }

        let alive = ctx.is_owner_alive();
        if alive && self.intents.start_action {
            *do_interact = true;
            if ctx.owner().shooter.is_some() {
                self.shoot_ticks = SHOOT_POSE_TICKS;
            }
        } else {
            self.shoot_ticks = self.shoot_ticks.saturating_sub(1);
        }

        if let Some(scheduled) = self.scheduled.take() {
            scheduled.axis.set(&mut core.velocity, scheduled.speed);
        }

        if !alive && self.death_ticks >= self.tuning.death_duration {
            ctx.finish_dying_owner();
        }

        let state = self.action_state(alive);
        ctx.set_action_state(state, self.orientation);
    }

    fn do_reset(&mut self, _core: &mut MovementCore) {
        *self = Self::new(self.tuning.clone(), self.intelligence_kind.clone());
    }

    fn passes_through_solids(&self) -> bool {
        // The death arc falls through everything.
        self.death_ticks > 0
    }
}
