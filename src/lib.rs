pub mod ai;
pub mod components;
pub mod events;
pub mod inventory;
pub mod movement;
pub mod obstacle;
pub mod physics;
pub mod physics_core;
pub mod room;
pub mod simulation;
pub mod spawn;
pub mod surface;
pub mod terrain;
pub mod tilemap;
