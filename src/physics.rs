use bevy::prelude::*;

use crate::room::Room;

/// Steps the [`Room`] resource once per fixed tick.
pub struct MovementPlugin;

impl Plugin for MovementPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(FixedUpdate, step_room.run_if(resource_exists::<Room>));
    }
}

pub fn step_room(mut room: ResMut<Room>) {
    room.step();
}
