use std::ops::{Index, IndexMut};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::components::{ActionState, ExternalIntents, LifeState, ObjectId, Orientation};
use crate::movement::directed::DirectorInstruction;
use crate::movement::MovementProvider;
use crate::physics_core::Aabb;
use crate::surface::{Direction, SurfaceSet};

/// Projectile spawning for objects that shoot when they interact.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShooterConfig {
    pub projectile_size: Vec2,
    pub projectile_speed: f32,
    pub projectile_surfaces: SurfaceSet,
    pub death_duration: u32,
    pub max_projectiles: usize,
}

impl Default for ShooterConfig {
    fn default() -> Self {
        Self {
            projectile_size: Vec2::new(6.0, 4.0),
            projectile_speed: 8.0,
            projectile_surfaces: SurfaceSet::default(),
            death_duration: 10,
            max_projectiles: 3,
        }
    }
}

/// Anything living in a room: the main character, enemies, platforms, projectiles.
///
/// `position` is the top-left corner. `last_position` is the position
/// committed at the start of the current tick; every collision read of
/// another object goes through it.
pub struct RoomObject {
    pub name: String,
    pub position: Vec2,
    pub last_position: Vec2,
    pub velocity: Vec2,
    pub size: Vec2,
    pub surfaces: SurfaceSet,
    pub life: LifeState,
    /// Participates in other objects' sweeps as an obstacle.
    pub collidable: bool,
    pub parent: Option<ObjectId>,
    pub children: Vec<ObjectId>,
    pub start_position: Vec2,
    pub start_velocity: Vec2,
    pub intents: ExternalIntents,
    pub director_instruction: Option<DirectorInstruction>,
    pub action_state: ActionState,
    pub facing: Orientation,
    pub shooter: Option<ShooterConfig>,
    /// Created at runtime (pooled projectiles) rather than from room content.
    pub spawned: bool,
    pub(crate) provider: Option<MovementProvider>,
}

impl RoomObject {
    pub fn new(name: impl Into<String>, position: Vec2, size: Vec2) -> Self {
        Self {
            name: name.into(),
            position,
            last_position: position,
            velocity: Vec2::ZERO,
            size,
            surfaces: SurfaceSet::default(),
            life: LifeState::Alive,
            collidable: false,
            parent: None,
            children: Vec::new(),
            start_position: position,
            start_velocity: Vec2::ZERO,
            intents: ExternalIntents::default(),
            director_instruction: None,
            action_state: ActionState::default(),
            facing: Orientation::default(),
            shooter: None,
            spawned: false,
            provider: None,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self.start_velocity = velocity;
        self
    }

    pub fn with_surfaces(mut self, surfaces: SurfaceSet) -> Self {
        self.surfaces = surfaces;
        self
    }

    pub fn with_provider(mut self, provider: MovementProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_shooter(mut self, shooter: ShooterConfig) -> Self {
        self.shooter = Some(shooter);
        self
    }

    pub fn collidable(mut self, collidable: bool) -> Self {
        self.collidable = collidable;
        self
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_position(self.position, self.size)
    }

    pub fn last_bounds(&self) -> Aabb {
        Aabb::from_position(self.last_position, self.size)
    }

    pub fn left(&self) -> f32 {
        self.position.x
    }

    pub fn top(&self) -> f32 {
        self.position.y
    }

    pub fn right(&self) -> f32 {
        self.position.x + self.size.x
    }

    pub fn bottom(&self) -> f32 {
        self.position.y + self.size.y
    }

    /// Friction offered to things standing on this object.
    pub fn friction(&self) -> f32 {
        self.surfaces.get(Direction::Top).friction
    }

    pub fn offense(&self) -> f32 {
        self.surfaces.max_offense()
    }

    pub fn defense(&self) -> f32 {
        self.surfaces.max_defense()
    }

    pub fn is_deadly(&self) -> bool {
        self.offense() > 0.0
    }

    pub fn is_alive(&self) -> bool {
        self.life == LifeState::Alive
    }

    pub fn provider(&self) -> Option<&MovementProvider> {
        self.provider.as_ref()
    }

    pub fn provider_mut(&mut self) -> Option<&mut MovementProvider> {
        self.provider.as_mut()
    }

    /// Start dying. Returns false when the object was not alive.
    pub fn die(&mut self) -> bool {
        if self.life != LifeState::Alive {
            return false;
        }
        self.life = LifeState::Dying;
        true
    }

    pub fn finish_dying(&mut self) -> bool {
        if self.life != LifeState::Dying {
            return false;
        }
        self.life = LifeState::Dead;
        true
    }

    /// Back to the template start state, as on room entry. Spawned objects
    /// come back dead so their pool slot is free.
    pub fn reset(&mut self) {
        self.position = self.start_position;
        self.last_position = self.start_position;
        self.velocity = self.start_velocity;
        self.life = LifeState::Alive;
        self.director_instruction = None;
        self.action_state = ActionState::default();
        self.intents = ExternalIntents::default();
        let (position, velocity) = (self.position, self.velocity);
        if let Some(provider) = self.provider.as_mut() {
            provider.reset(position, velocity);
        }
        if self.spawned {
            self.life = LifeState::Dead;
        }
    }
}

/// Flat storage for room objects with parent/child links by index.
#[derive(Default)]
pub struct ObjectArena {
    objects: Vec<RoomObject>,
}

impl ObjectArena {
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, id: ObjectId) -> Option<&RoomObject> {
        self.objects.get(id.0)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut RoomObject> {
        self.objects.get_mut(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &RoomObject)> {
        self.objects.iter().enumerate().map(|(i, o)| (ObjectId(i), o))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RoomObject> {
        self.objects.iter_mut()
    }

    pub(crate) fn insert(&mut self, object: RoomObject) -> ObjectId {
        self.objects.push(object);
        ObjectId(self.objects.len() - 1)
    }

    pub(crate) fn insert_child(&mut self, parent: ObjectId, mut object: RoomObject) -> ObjectId {
        object.parent = Some(parent);
        let id = self.insert(object);
        if let Some(p) = self.get_mut(parent) {
            p.children.push(id);
        }
        id
    }

    /// Roots in insertion order, each followed immediately by its subtree.
    pub fn depth_first(&self) -> Vec<ObjectId> {
        let mut out = Vec::with_capacity(self.objects.len());
        let mut stack = Vec::new();
        for (id, object) in self.iter() {
            if object.parent.is_some() {
                continue;
            }
            stack.push(id);
            while let Some(next) = stack.pop() {
                out.push(next);
                if let Some(o) = self.get(next) {
                    stack.extend(o.children.iter().rev().copied());
                }
            }
        }
        out
    }

    /// Same object, or one is an ancestor of the other.
    pub fn are_related(&self, a: ObjectId, b: ObjectId) -> bool {
        a == b || self.is_ancestor(a, b) || self.is_ancestor(b, a)
    }

    fn is_ancestor(&self, ancestor: ObjectId, of: ObjectId) -> bool {
        let mut cursor = self.get(of).and_then(|o| o.parent);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.get(id).and_then(|o| o.parent);
        }
        false
    }
}

impl Index<ObjectId> for ObjectArena {
    type Output = RoomObject;

    fn index(&self, id: ObjectId) -> &RoomObject {
        &self.objects[id.0]
    }
}

impl IndexMut<ObjectId> for ObjectArena {
    fn index_mut(&mut self, id: ObjectId) -> &mut RoomObject {
        &mut self.objects[id.0]
    }
}
