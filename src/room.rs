use std::collections::HashSet;

use bevy::prelude::*;

use crate::components::{ExternalIntents, LifeState, ObjectId};
use crate::events::{MovementEventBus, ON_DEAD, ON_DIE, ON_SHOOT};
use crate::inventory::{CollectibleStore, GameConditionList};
use crate::movement::directed::{Director, DirectorInstruction};
use crate::movement::projectile::LinearProjectileMovementProvider;
use crate::movement::{MoveContext, MovementProvider, ProviderKind};
use crate::obstacle::{ObjectArena, RoomObject};
use crate::physics_core::Aabb;
use crate::terrain::Terrain;
use crate::tilemap::{GridMode, TileGrid};

/// One room's worth of simulation state, advanced a tick at a time.
#[derive(Resource)]
pub struct Room {
    pub grids: Vec<TileGrid>,
    /// Index into `grids` of the grid that takes part in collision.
    pub active_grid: Option<usize>,
    pub objects: ObjectArena,
    pub terrains: Vec<Terrain>,
    pub directors: Vec<Director>,
    pub main_character: Option<ObjectId>,
    /// Slow/fast-motion factor; displacements scale linearly, accelerations squared.
    pub viscosity: f32,
    pub store: CollectibleStore,
    pub events: MovementEventBus,
    warned_providers: HashSet<ObjectId>,
}

impl Default for Room {
    fn default() -> Self {
        Self {
            grids: Vec::new(),
            active_grid: None,
            objects: ObjectArena::default(),
            terrains: Vec::new(),
            directors: Vec::new(),
            main_character: None,
            viscosity: 1.0,
            store: CollectibleStore::default(),
            events: MovementEventBus::default(),
            warned_providers: HashSet::new(),
        }
    }
}

impl Room {
    pub fn active_grid(&self) -> Option<&TileGrid> {
        self.active_grid.and_then(|i| self.grids.get(i))
    }

    /// Tile size of the active grid, or one unit when there is none.
    pub fn tile_size(&self) -> Vec2 {
        self.active_grid().map_or(Vec2::ONE, |g| g.tile_size)
    }

    /// Insert a root object, bind its provider and put it in its start state.
    pub fn add_object(&mut self, object: RoomObject) -> ObjectId {
        let id = self.objects.insert(object);
        self.bind(id);
        id
    }

    pub fn add_child(&mut self, parent: ObjectId, object: RoomObject) -> ObjectId {
        let id = self.objects.insert_child(parent, object);
        self.bind(id);
        id
    }

    fn bind(&mut self, id: ObjectId) {
        let object = &mut self.objects[id];
        if let Some(provider) = object.provider_mut() {
            provider.initialize(id);
        }
        object.reset();
    }

    /// Start `id` dying. False when it was not alive.
    pub fn kill(&mut self, id: ObjectId) -> bool {
        let Some(object) = self.objects.get_mut(id) else {
            return false;
        };
        if !object.die() {
            return false;
        }
        let data = serde_json::json!({
            "name": object.name,
            "x": object.position.x,
            "y": object.position.y,
        });
        debug!("[Runbound room] {} ({:?}) is dying", object.name, id);
        self.events.emit(ON_DIE, data, Some(id));
        true
    }

    pub fn finish_dying(&mut self, id: ObjectId) -> bool {
        let Some(object) = self.objects.get_mut(id) else {
            return false;
        };
        if !object.finish_dying() {
            return false;
        }
        let data = serde_json::json!({ "name": object.name });
        self.events.emit(ON_DEAD, data, Some(id));
        true
    }

    /// Room entry: every object back to its template start state.
    pub fn reset_objects(&mut self) {
        for object in self.objects.iter_mut() {
            object.reset();
        }
        for grid in &mut self.grids {
            grid.reset_origin();
        }
    }

    /// Live, collidable objects `mover` may run into, depth-first.
    pub fn colliders(&self, mover: ObjectId) -> Vec<ObjectId> {
        self.objects
            .depth_first()
            .into_iter()
            .filter(|&id| {
                let object = &self.objects[id];
                object.is_alive() && object.collidable && !self.objects.are_related(mover, id)
            })
            .collect()
    }

    /// Colliders plus the main character, which is always a surface source.
    pub fn surface_sources(&self, mover: ObjectId) -> Vec<ObjectId> {
        let mut sources = self.colliders(mover);
        if let Some(main) = self.main_character {
            let eligible = self.objects.get(main).is_some_and(|o| o.is_alive())
                && !self.objects.are_related(mover, main)
                && !sources.contains(&main);
            if eligible {
                sources.push(main);
            }
        }
        sources
    }

    /// Committed bounds of the main character, unless it is `viewer` itself.
    pub fn main_character_bounds(&self, viewer: ObjectId) -> Option<Aabb> {
        let main = self.main_character.filter(|&id| id != viewer)?;
        self.objects.get(main).map(|o| o.last_bounds())
    }

    pub fn director_at(&self, bounds: &Aabb) -> Option<DirectorInstruction> {
        self.directors
            .iter()
            .find(|d| d.bounds().overlaps(bounds))
            .map(|d| d.instruction)
    }

    pub fn set_main_intents(&mut self, intents: ExternalIntents) {
        if let Some(object) = self.main_character.and_then(|id| self.objects.get_mut(id)) {
            object.intents = intents;
        }
    }

    /// Advance every object by one tick.
    ///
    /// Positions are committed to `last_position` first so every read of
    /// another object during the pass sees where it stood at tick start.
    pub fn step(&mut self) {
        for object in self.objects.iter_mut() {
            object.last_position = object.position;
        }

        for id in self.objects.depth_first() {
            let Some(object) = self.objects.get_mut(id) else {
                continue;
            };
            if object.life == LifeState::Dead {
                continue;
            }
            let Some(mut provider) = object.provider.take() else {
                if self.warned_providers.insert(id) {
                    warn!(
                        "[Runbound room] {} ({:?}) has no movement provider; skipping",
                        self.objects[id].name, id
                    );
                }
                continue;
            };
            if provider.core.owner() != Some(id) && self.warned_providers.insert(id) {
                warn!(
                    "[Runbound room] Provider of {} ({:?}) is not bound to it; skipping",
                    self.objects[id].name, id
                );
            }

            let object = &self.objects[id];
            let mut position = object.position;
            let mut velocity = object.velocity;
            let mut do_interact = false;
            {
                let mut ctx = MoveContext::new(self, id);
                provider.move_object(&mut ctx, &mut position, &mut velocity, &mut do_interact);
            }

            let object = &mut self.objects[id];
            object.provider = Some(provider);
            object.position = position;
            object.velocity = velocity;
            if do_interact {
                self.fire(id);
            }
        }

        self.follow_grids();
        self.events.tick();
    }

    fn follow_grids(&mut self) {
        for grid in &mut self.grids {
            if let GridMode::FollowObject { object, factor } = grid.mode {
                if let Some(target) = self.objects.get(object) {
                    grid.follow(target.position, factor);
                }
            }
        }
    }

    /// Launch a projectile from `shooter`, reusing a dead pooled one when
    /// possible. Returns `None` when the object cannot shoot or its pool is
    /// full of live projectiles.
    pub fn fire(&mut self, shooter: ObjectId) -> Option<ObjectId> {
        let object = self.objects.get(shooter)?;
        if !object.is_alive() {
            return None;
        }
        let config = object.shooter.clone()?;
        let bounds = object.bounds();
        let facing = object.facing.sign();
        let name = format!("{}_projectile", object.name);
        let pool: Vec<ObjectId> = object
            .children
            .iter()
            .copied()
            .filter(|&c| self.objects[c].spawned)
            .collect();

        let size = config.projectile_size;
        let spawn = Vec2::new(
            if facing > 0.0 {
                bounds.max_x
            } else {
                bounds.min_x - size.x
            },
            bounds.center().y - size.y * 0.5,
        );
        let velocity = Vec2::new(facing * config.projectile_speed, 0.0);

        let recycled = pool
            .iter()
            .copied()
            .find(|&c| self.objects[c].life == LifeState::Dead);
        let id = match recycled {
            Some(id) => {
                let projectile = &mut self.objects[id];
                projectile.position = spawn;
                projectile.last_position = spawn;
                projectile.velocity = velocity;
                projectile.life = LifeState::Alive;
                if let Some(provider) = projectile.provider_mut() {
                    provider.reset(spawn, velocity);
                    if let Some(linear) = provider.projectile_mut() {
                        linear.aim(velocity);
                    }
                }
                id
            }
            None if pool.len() < config.max_projectiles => {
                let provider = MovementProvider::new(
                    ProviderKind::LinearProjectile(LinearProjectileMovementProvider::new(
                        velocity,
                        config.death_duration,
                    )),
                    GameConditionList::default(),
                );
                let projectile = RoomObject::new(name, spawn, size)
                    .with_velocity(velocity)
                    .with_surfaces(config.projectile_surfaces)
                    .collidable(true)
                    .with_provider(provider);
                let id = self.add_child(shooter, projectile);
                self.objects[id].spawned = true;
                id
            }
            None => return None,
        };

        self.events.emit(
            ON_SHOOT,
            serde_json::json!({ "x": spawn.x, "y": spawn.y, "projectile": id.0 }),
            Some(shooter),
        );
        Some(id)
    }
}
