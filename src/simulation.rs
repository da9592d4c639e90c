use serde::{Deserialize, Serialize};

use crate::components::{ExternalIntents, LifeState};
use crate::room::Room;
use crate::spawn::RoomConfig;

#[derive(Deserialize, Clone)]
pub struct SimulationRequest {
    /// Room to simulate; the caller's room when absent.
    #[serde(default)]
    pub room: Option<RoomConfig>,
    #[serde(default)]
    pub inputs: Vec<SimInput>,
    #[serde(default = "default_max_frames")]
    pub max_frames: u32,
    #[serde(default = "default_record_interval")]
    pub record_interval: u32,
}

fn default_max_frames() -> u32 {
    600
}

fn default_record_interval() -> u32 {
    1
}

/// Holds `action` from `frame` for `duration` frames (at least one).
#[derive(Deserialize, Clone)]
pub struct SimInput {
    pub frame: u32,
    pub action: String,
    #[serde(default)]
    pub duration: u32,
}

const ACTIONS: [&str; 5] = ["left", "right", "jump", "interact", "fly"];

#[derive(Serialize, Clone)]
pub struct SimulationResult {
    pub outcome: String,
    pub frames_elapsed: u32,
    pub trace: Vec<TraceFrame>,
    pub events: Vec<SimEvent>,
}

/// Main character state after a frame.
#[derive(Serialize, Clone)]
pub struct TraceFrame {
    pub frame: u32,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub action: String,
}

#[derive(Serialize, Clone)]
pub struct SimEvent {
    pub frame: u32,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<usize>,
    pub data: serde_json::Value,
}

impl SimulationRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.record_interval == 0 {
            return Err("record_interval must be at least 1".to_string());
        }
        for input in &self.inputs {
            if !ACTIONS.contains(&input.action.as_str()) {
                return Err(format!(
                    "Unknown input action '{}' at frame {}; expected one of {}",
                    input.action,
                    input.frame,
                    ACTIONS.join(", ")
                ));
            }
        }
        Ok(())
    }
}

pub fn intents_for_frame(inputs: &[SimInput], frame: u32) -> ExternalIntents {
    let mut intents = ExternalIntents::default();
    for input in inputs {
        let end = input.frame.saturating_add(input.duration.max(1));
        if frame < input.frame || frame >= end {
            continue;
        }
        match input.action.as_str() {
            "left" => intents.move_left = true,
            "right" => intents.move_right = true,
            "jump" => {
                intents.jump_held = true;
                intents.jump_pressed |= frame == input.frame;
            }
            "interact" => intents.interact = true,
            "fly" => intents.fly_held = true,
            _ => {}
        }
    }
    intents
}

/// Step `room` under the scripted inputs, tracing its main character.
pub fn run_simulation(room: &mut Room, request: &SimulationRequest) -> SimulationResult {
    let mut result = SimulationResult {
        outcome: "timeout".to_string(),
        frames_elapsed: 0,
        trace: Vec::new(),
        events: Vec::new(),
    };
    let Some(main) = room.main_character else {
        result.outcome = "no_main_character".to_string();
        return result;
    };
    let interval = request.record_interval.max(1);

    for frame in 0..request.max_frames {
        room.set_main_intents(intents_for_frame(&request.inputs, frame));
        room.step();
        result.frames_elapsed = frame + 1;

        for event in room.events.drain() {
            result.events.push(SimEvent {
                frame,
                event_type: event.name,
                object: event.source_object.map(|id| id.0),
                data: event.data,
            });
        }

        let Some(object) = room.objects.get(main) else {
            break;
        };
        let dead = object.life == LifeState::Dead;
        if frame % interval == 0 || dead {
            result.trace.push(TraceFrame {
                frame,
                x: object.position.x,
                y: object.position.y,
                vx: object.velocity.x,
                vy: object.velocity.y,
                action: object.action_state.as_str().to_string(),
            });
        }
        if dead {
            result.outcome = "died".to_string();
            break;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ON_DEAD, ON_JUMP, ON_SHOOT};
    use crate::spawn::build_room;

    fn input(frame: u32, action: &str, duration: u32) -> SimInput {
        SimInput {
            frame,
            action: action.to_string(),
            duration,
        }
    }

    fn request(inputs: Vec<SimInput>, max_frames: u32) -> SimulationRequest {
        SimulationRequest {
            room: None,
            inputs,
            max_frames,
            record_interval: 1,
        }
    }

    #[test]
    fn jump_is_pressed_only_on_its_first_frame() {
        let inputs = vec![input(10, "jump", 3), input(11, "right", 0)];
        let first = intents_for_frame(&inputs, 10);
        assert!(first.jump_pressed && first.jump_held);
        let second = intents_for_frame(&inputs, 11);
        assert!(!second.jump_pressed && second.jump_held && second.move_right);
        assert!(!intents_for_frame(&inputs, 12).move_right);
        assert_eq!(intents_for_frame(&inputs, 13), ExternalIntents::default());
    }

    #[test]
    fn unknown_actions_fail_validation() {
        assert!(request(vec![input(0, "left", 1)], 1).validate().is_ok());
        let err = request(vec![input(4, "dash", 1)], 1)
            .validate()
            .err()
            .expect("error");
        assert!(err.contains("'dash' at frame 4"), "{err}");
    }

    #[test]
    fn traces_a_jump_in_the_test_room() {
        let mut room = build_room(&RoomConfig::test_room()).expect("build");
        let result = run_simulation(&mut room, &request(vec![input(30, "jump", 20)], 60));
        assert_eq!(result.outcome, "timeout");
        assert_eq!(result.frames_elapsed, 60);
        assert_eq!(result.trace.len(), 60);
        assert!(result.trace[29].action.starts_with("Stand"));
        let jump = result
            .events
            .iter()
            .find(|e| e.event_type == ON_JUMP)
            .expect("jump event");
        assert_eq!(jump.frame, 30);
        let apex = result.trace.iter().map(|t| t.y).fold(f32::MAX, f32::min);
        assert!(apex < 194.0 - 60.0, "apex {apex}");
    }

    #[test]
    fn shooting_emits_an_event() {
        let mut room = build_room(&RoomConfig::test_room()).expect("build");
        let result = run_simulation(&mut room, &request(vec![input(20, "interact", 1)], 25));
        assert_eq!(
            result
                .events
                .iter()
                .filter(|e| e.event_type == ON_SHOOT)
                .count(),
            1
        );
    }

    #[test]
    fn stops_when_the_main_character_is_dead() {
        let mut room = build_room(&RoomConfig::test_room()).expect("build");
        let hero = room.main_character.expect("hero");
        room.kill(hero);
        let result = run_simulation(&mut room, &request(Vec::new(), 600));
        assert_eq!(result.outcome, "died");
        // Death arc lasts death_duration ticks, then the object is dead.
        assert_eq!(result.frames_elapsed, 60);
        assert!(result.events.iter().any(|e| e.event_type == ON_DEAD));
    }

    #[test]
    fn room_without_main_character() {
        let mut room = Room::default();
        let result = run_simulation(&mut room, &request(Vec::new(), 10));
        assert_eq!(result.outcome, "no_main_character");
        assert_eq!(result.frames_elapsed, 0);
    }
}
