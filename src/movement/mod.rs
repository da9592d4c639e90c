//! Per-tick movement of room objects.
//!
//! A [`MovementProvider`] pairs the shared [`MovementCore`] (candidate state,
//! surrounding surfaces, the swept collision pass) with one concrete behaviour
//! that plugs into the pass through [`MovementHooks`].

pub mod circular;
pub mod directed;
pub mod projectile;
pub mod run_and_jump;
pub mod surroundings;
pub mod sweep;

use bevy::prelude::*;

use crate::components::{ActionState, ObjectId, Orientation};
use crate::inventory::{CollectibleStore, GameConditionList};
use crate::obstacle::RoomObject;
use crate::physics_core::Aabb;
use crate::room::Room;
use crate::surface::{Direction, SurfaceInformation};
use crate::terrain::TerrainPosition;

use circular::CircularMovementProvider;
use directed::DirectedMovementProvider;
use projectile::LinearProjectileMovementProvider;
use run_and_jump::RunAndJumpMovementProvider;

/// The room as seen by the object currently moving.
pub struct MoveContext<'a> {
    pub room: &'a mut Room,
    pub owner: ObjectId,
}

impl<'a> MoveContext<'a> {
    pub fn new(room: &'a mut Room, owner: ObjectId) -> Self {
        Self { room, owner }
    }

    pub fn owner(&self) -> &RoomObject {
        &self.room.objects[self.owner]
    }

    pub fn owner_mut(&mut self) -> &mut RoomObject {
        &mut self.room.objects[self.owner]
    }

    pub fn is_owner_alive(&self) -> bool {
        self.owner().is_alive()
    }

    pub fn viscosity(&self) -> f32 {
        self.room.viscosity
    }

    pub fn kill(&mut self, id: ObjectId) -> bool {
        self.room.kill(id)
    }

    pub fn kill_owner(&mut self) -> bool {
        self.room.kill(self.owner)
    }

    pub fn finish_dying_owner(&mut self) -> bool {
        self.room.finish_dying(self.owner)
    }

    pub fn emit(&mut self, name: &str) {
        let position = self.owner().position;
        let owner = self.owner;
        self.room.events.emit(
            name,
            serde_json::json!({ "x": position.x, "y": position.y }),
            Some(owner),
        );
    }

    pub fn set_action_state(&mut self, state: ActionState, facing: Orientation) {
        let owner = self.owner_mut();
        owner.action_state = state;
        owner.facing = facing;
    }
}

/// Extension points of the movement pass. Every hook defaults to a no-op.
#[allow(unused_variables)]
pub trait MovementHooks {
    fn set_candidate_velocity(&mut self, core: &mut MovementCore, ctx: &mut MoveContext) {}

    fn finalize_candidate_velocity(&mut self, core: &mut MovementCore, ctx: &mut MoveContext) {}

    /// Fires with the offset actually applied, before it is committed.
    fn pre_commit_move_x(&mut self, offset: f32) {}

    fn pre_commit_move_y(&mut self, offset: f32) {}

    /// `direction` is the side of the moving object that hit the tile.
    fn handle_tile_collision(
        &mut self,
        core: &mut MovementCore,
        ctx: &mut MoveContext,
        direction: Direction,
        surface: SurfaceInformation,
    ) {
    }

    fn handle_obstacle_collision(
        &mut self,
        core: &mut MovementCore,
        ctx: &mut MoveContext,
        obstacle: ObjectId,
        direction: Direction,
        surface: SurfaceInformation,
    ) {
    }

    fn handle_terrain_collision(
        &mut self,
        core: &mut MovementCore,
        ctx: &mut MoveContext,
        terrain: usize,
        position: TerrainPosition,
    ) {
    }

    fn update_state(&mut self, core: &mut MovementCore, ctx: &mut MoveContext, do_interact: &mut bool) {}

    fn do_reset(&mut self, core: &mut MovementCore) {}

    fn accelerates_from_tiles(&self) -> bool {
        true
    }

    /// Scripted movers follow their path exactly and skip the swept collision.
    fn passes_through_solids(&self) -> bool {
        false
    }
}

/// State shared by every provider, rebuilt each tick.
pub struct MovementCore {
    owner: Option<ObjectId>,
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: Vec2,
    surroundings: [Option<SurfaceInformation>; 4],
    pub active_tile_acceleration: Vec2,
    pub ground_ahead_solid: bool,
    pub conditions: GameConditionList,
    /// Stop against lethal surfaces instead of moving into them.
    pub stop_on_deadly: bool,
}

impl MovementCore {
    pub fn new(conditions: GameConditionList, stop_on_deadly: bool) -> Self {
        Self {
            owner: None,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            size: Vec2::ZERO,
            surroundings: [None; 4],
            active_tile_acceleration: Vec2::ZERO,
            ground_ahead_solid: false,
            conditions,
            stop_on_deadly,
        }
    }

    pub fn owner(&self) -> Option<ObjectId> {
        self.owner
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_position(self.position, self.size)
    }

    pub fn contact(&self, direction: Direction) -> Option<SurfaceInformation> {
        self.surroundings[direction.index()]
    }

    /// Surface touching `direction`, or an empty surface when nothing does.
    pub fn surface(&self, direction: Direction) -> SurfaceInformation {
        self.contact(direction)
            .unwrap_or_else(|| SurfaceInformation::empty(direction))
    }

    pub fn surfaces(&self) -> [SurfaceInformation; 4] {
        Direction::ALL.map(|d| self.surface(d))
    }

    pub fn touches_solid(&self, direction: Direction) -> bool {
        self.surface(direction).is_solid
    }

    pub(crate) fn touch(&mut self, direction: Direction, surface: SurfaceInformation) {
        let surface = surface.with_direction(direction);
        let slot = &mut self.surroundings[direction.index()];
        let merged = match *slot {
            Some(existing) => existing.compound(&surface),
            None => surface,
        };
        *slot = Some(merged);
    }

    pub(crate) fn clear_surroundings(&mut self) {
        self.surroundings = [None; 4];
        self.active_tile_acceleration = Vec2::ZERO;
        self.ground_ahead_solid = false;
    }

    pub fn can_move(&self, store: &CollectibleStore) -> bool {
        self.conditions.all_hold(store)
    }
}

pub enum ProviderKind {
    RunAndJump(RunAndJumpMovementProvider),
    Circular(CircularMovementProvider),
    Directed(DirectedMovementProvider),
    LinearProjectile(LinearProjectileMovementProvider),
}

pub struct MovementProvider {
    pub core: MovementCore,
    pub kind: ProviderKind,
}

impl MovementProvider {
    pub fn new(kind: ProviderKind, conditions: GameConditionList) -> Self {
        let stop_on_deadly = match &kind {
            ProviderKind::RunAndJump(p) => p.tuning().stop_on_deadly_contact,
            ProviderKind::LinearProjectile(_) => true,
            ProviderKind::Circular(_) | ProviderKind::Directed(_) => false,
        };
        Self {
            core: MovementCore::new(conditions, stop_on_deadly),
            kind,
        }
    }

    /// Bind to the one object this provider moves.
    pub fn initialize(&mut self, owner: ObjectId) {
        self.core.owner = Some(owner);
    }

    pub fn reset(&mut self, position: Vec2, velocity: Vec2) {
        let (core, hooks) = self.split();
        core.clear_surroundings();
        core.position = position;
        core.velocity = velocity;
        hooks.do_reset(core);
    }

    pub fn can_move(&self, store: &CollectibleStore) -> bool {
        self.core.can_move(store)
    }

    pub fn run_and_jump(&self) -> Option<&RunAndJumpMovementProvider> {
        match &self.kind {
            ProviderKind::RunAndJump(p) => Some(p),
            _ => None,
        }
    }

    pub fn projectile_mut(&mut self) -> Option<&mut LinearProjectileMovementProvider> {
        match &mut self.kind {
            ProviderKind::LinearProjectile(p) => Some(p),
            _ => None,
        }
    }

    fn split(&mut self) -> (&mut MovementCore, &mut dyn MovementHooks) {
        let hooks: &mut dyn MovementHooks = match &mut self.kind {
            ProviderKind::RunAndJump(p) => p,
            ProviderKind::Circular(p) => p,
            ProviderKind::Directed(p) => p,
            ProviderKind::LinearProjectile(p) => p,
        };
        (&mut self.core, hooks)
    }

    /// Advance the owner by one tick.
    ///
    /// The order below is fixed: velocity, tile acceleration, clamp, x sweep,
    /// y sweep, terrains, state update. Does nothing when the provider is not
    /// bound to `ctx.owner` or its gating conditions do not hold.
    pub fn move_object(
        &mut self,
        ctx: &mut MoveContext,
        position: &mut Vec2,
        velocity: &mut Vec2,
        do_interact: &mut bool,
    ) {
        if self.core.owner != Some(ctx.owner) {
            return;
        }
        if !self.core.can_move(&ctx.room.store) {
            return;
        }
        let size = ctx.owner().size;
        let (core, hooks) = self.split();
        core.position = *position;
        core.velocity = *velocity;
        core.size = size;

        hooks.set_candidate_velocity(core, ctx);
        let viscosity = ctx.viscosity();
        if ctx.is_owner_alive() && hooks.accelerates_from_tiles() {
            core.velocity += core.active_tile_acceleration * viscosity * viscosity;
        }
        hooks.finalize_candidate_velocity(core, ctx);

        let dx = core.velocity.x * viscosity;
        sweep::move_horizontal(core, hooks, ctx, dx);
        let dy = core.velocity.y * viscosity;
        sweep::move_vertical(core, hooks, ctx, dy);

        if ctx.is_owner_alive() {
            sweep::enforce_terrains(core, hooks, ctx);
        }
        hooks.update_state(core, ctx, do_interact);

        *position = core.position;
        *velocity = core.velocity;
    }
}

/// Pose for scripted movers: flying toward their horizontal heading, or dying.
pub(crate) fn drifting_action_state(alive: bool, velocity: Vec2) -> (ActionState, Orientation) {
    let facing = if velocity.x < 0.0 {
        Orientation::Left
    } else {
        Orientation::Right
    };
    if alive {
        (ActionState::fly(facing), facing)
    } else {
        (ActionState::Die, facing)
    }
}
