use std::collections::VecDeque;

use bevy::prelude::*;
use serde::Serialize;

use crate::components::ObjectId;

const MAX_EVENTS: usize = 500;

pub const ON_JUMP: &str = "OnJump";
pub const ON_WALL_JUMP: &str = "OnWallJump";
pub const ON_DIE: &str = "OnDie";
pub const ON_DEAD: &str = "OnDead";
pub const ON_SHOOT: &str = "OnShoot";

/// Opaque named signal for the audio/event collaborators.
#[derive(Serialize, Clone, Debug)]
pub struct MovementEvent {
    pub name: String,
    pub data: serde_json::Value,
    pub frame: u64,
    pub source_object: Option<ObjectId>,
}

#[derive(Default)]
pub struct MovementEventBus {
    pub recent: VecDeque<MovementEvent>,
    pub frame: u64,
    pub dropped_events: u64,
    last_overflow_log_frame: u64,
}

impl MovementEventBus {
    pub fn emit(
        &mut self,
        name: impl Into<String>,
        data: serde_json::Value,
        source_object: Option<ObjectId>,
    ) {
        self.recent.push_back(MovementEvent {
            name: name.into(),
            data,
            frame: self.frame,
            source_object,
        });
        if self.recent.len() > MAX_EVENTS {
            let excess = self.recent.len() - MAX_EVENTS;
            for _ in 0..excess {
                self.recent.pop_front();
            }
            self.dropped_events = self.dropped_events.saturating_add(excess as u64);
            if self.frame.saturating_sub(self.last_overflow_log_frame) >= 60 {
                self.last_overflow_log_frame = self.frame;
                warn!(
                    "[Runbound events] Dropped {} buffered events (total dropped: {})",
                    excess, self.dropped_events
                );
            }
        }
    }

    pub fn tick(&mut self) {
        self.frame = self.frame.saturating_add(1);
    }

    /// Hand buffered events to a collaborator and clear the buffer.
    pub fn drain(&mut self) -> Vec<MovementEvent> {
        self.recent.drain(..).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.recent.iter().filter(|e| e.name == name).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_bus_tracks_dropped_events() {
        let mut bus = MovementEventBus::default();
        for i in 0..(MAX_EVENTS + 25) {
            bus.emit(ON_JUMP, serde_json::json!({ "i": i }), None);
        }
        assert_eq!(bus.recent.len(), MAX_EVENTS);
        assert!(bus.dropped_events >= 25);
    }

    #[test]
    fn drain_empties_buffer_and_keeps_frame() {
        let mut bus = MovementEventBus::default();
        bus.tick();
        bus.emit(ON_DIE, serde_json::Value::Null, Some(ObjectId(3)));
        let drained = bus.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].frame, 1);
        assert_eq!(drained[0].source_object, Some(ObjectId(3)));
        assert!(bus.recent.is_empty());
    }
}
