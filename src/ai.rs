use serde::{Deserialize, Serialize};

use crate::components::{ExternalIntents, MoveIntents, Orientation, VerticalState};
use crate::physics_core::Aabb;
use crate::surface::{Direction, SurfaceInformation};

/// Ticks a jump pressed in the air stays usable for the landing.
pub const JUMP_BUFFER_TICKS: u32 = 10;

const DEFAULT_FOLLOW_MARGIN: f32 = 4.0;

/// Everything a strategy may look at when deciding this tick's intents.
#[derive(Clone, Copy, Debug)]
pub struct IntelligenceView {
    pub orientation: Orientation,
    pub vertical: VerticalState,
    pub surroundings: [SurfaceInformation; 4],
    pub ground_ahead_solid: bool,
    pub bounds: Aabb,
    pub main_character: Option<Aabb>,
    pub external: ExternalIntents,
    /// The provider turns a jump press into a wall jump this tick.
    pub can_wall_jump: bool,
}

impl IntelligenceView {
    pub fn surface(&self, direction: Direction) -> SurfaceInformation {
        self.surroundings[direction.index()]
    }

    pub fn airborne(&self) -> bool {
        self.vertical != VerticalState::Standing
    }

    fn wall_ahead(&self, heading: Orientation) -> bool {
        match heading {
            Orientation::Left => self.surface(Direction::Left).is_solid,
            Orientation::Right => self.surface(Direction::Right).is_solid,
        }
    }
}

pub trait MovementIntelligence {
    fn update(&mut self, view: &IntelligenceView) -> MoveIntents;
}

/// Remembers a jump pressed while airborne so it fires on landing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JumpLatch {
    remaining: u32,
}

impl JumpLatch {
    pub fn is_armed(&self) -> bool {
        self.remaining > 0
    }

    pub fn clear(&mut self) {
        self.remaining = 0;
    }

    /// Returns `(start_jump, start_or_continue_jump)` and ages the latch.
    fn resolve(&mut self, external: &ExternalIntents, view: &IntelligenceView) -> (bool, bool) {
        let airborne = view.airborne();
        // A press spent on a wall jump is not kept. The landing itself happens
        // after this tick's decision, so the latch must outlive it by one tick.
        if external.jump_pressed && airborne && !view.can_wall_jump {
            self.remaining = JUMP_BUFFER_TICKS + 1;
        }
        let buffered = !airborne && external.jump_held && self.is_armed();
        let start = external.jump_pressed || buffered;
        if start && !airborne {
            self.clear();
        }
        self.remaining = self.remaining.saturating_sub(1);
        (start, external.jump_held || start)
    }
}

#[derive(Clone, Debug, Default)]
pub struct UserInput {
    latch: JumpLatch,
}

impl MovementIntelligence for UserInput {
    fn update(&mut self, view: &IntelligenceView) -> MoveIntents {
        let external = view.external;
        let mut intents = MoveIntents {
            move_left: external.move_left,
            move_right: external.move_right,
            start_action: external.interact,
            ..Default::default()
        };
        if external.fly_held {
            self.latch.clear();
            intents.fly = true;
            return intents;
        }
        let (start, hold) = self.latch.resolve(&external, view);
        intents.start_jump = start;
        intents.start_or_continue_jump = hold;
        intents
    }
}

#[derive(Clone, Debug)]
pub struct FollowPlayer {
    pub margin: f32,
}

impl Default for FollowPlayer {
    fn default() -> Self {
        Self {
            margin: DEFAULT_FOLLOW_MARGIN,
        }
    }
}

impl MovementIntelligence for FollowPlayer {
    fn update(&mut self, view: &IntelligenceView) -> MoveIntents {
        let Some(target) = view.main_character else {
            return MoveIntents::default();
        };
        let own = view.bounds.center_x();
        let goal = target.center_x();
        MoveIntents {
            move_left: goal < own - self.margin,
            move_right: goal > own + self.margin,
            ..Default::default()
        }
    }
}

/// Walks one way until a wall (or, optionally, a hole) turns it around.
#[derive(Clone, Debug)]
pub struct TurnOnCollision {
    pub turn_on_hole: bool,
    pub heading: Orientation,
}

impl TurnOnCollision {
    pub fn new(turn_on_hole: bool, heading: Orientation) -> Self {
        Self {
            turn_on_hole,
            heading,
        }
    }

    fn steer(&mut self, view: &IntelligenceView) -> MoveIntents {
        if view.wall_ahead(self.heading) {
            self.heading = self.heading.flipped();
        } else if self.turn_on_hole
            && !view.airborne()
            && view.orientation == self.heading
            && !view.ground_ahead_solid
        {
            self.heading = self.heading.flipped();
        }
        MoveIntents {
            move_left: self.heading == Orientation::Left,
            move_right: self.heading == Orientation::Right,
            ..Default::default()
        }
    }
}

impl MovementIntelligence for TurnOnCollision {
    fn update(&mut self, view: &IntelligenceView) -> MoveIntents {
        self.steer(view)
    }
}

#[derive(Clone, Debug)]
pub struct JumpOverHole {
    pub heading: Orientation,
}

impl MovementIntelligence for JumpOverHole {
    fn update(&mut self, view: &IntelligenceView) -> MoveIntents {
        if view.wall_ahead(self.heading) {
            self.heading = self.heading.flipped();
        }
        let about_to_fall = !view.airborne()
            && view.orientation == self.heading
            && !view.ground_ahead_solid;
        MoveIntents {
            move_left: self.heading == Orientation::Left,
            move_right: self.heading == Orientation::Right,
            start_jump: about_to_fall,
            start_or_continue_jump: about_to_fall || view.airborne(),
            ..Default::default()
        }
    }
}

/// Wall-bouncing patrol that jumps when the player presses jump.
#[derive(Clone, Debug)]
pub struct TurnOnCollisionAndUserJumpInput {
    turn: TurnOnCollision,
    latch: JumpLatch,
}

impl TurnOnCollisionAndUserJumpInput {
    pub fn new(heading: Orientation) -> Self {
        Self {
            turn: TurnOnCollision::new(false, heading),
            latch: JumpLatch::default(),
        }
    }
}

impl MovementIntelligence for TurnOnCollisionAndUserJumpInput {
    fn update(&mut self, view: &IntelligenceView) -> MoveIntents {
        let mut intents = self.turn.steer(view);
        let (start, hold) = self.latch.resolve(&view.external, view);
        intents.start_jump = start;
        intents.start_or_continue_jump = hold;
        intents
    }
}

/// Content-facing selection of a strategy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntelligenceKind {
    #[default]
    UserInput,
    FollowPlayer {
        #[serde(default = "default_follow_margin")]
        margin: f32,
    },
    TurnOnCollision {
        #[serde(default)]
        heading: Orientation,
    },
    TurnOnHoleOrCollision {
        #[serde(default)]
        heading: Orientation,
    },
    JumpOverHole {
        #[serde(default)]
        heading: Orientation,
    },
    TurnOnCollisionAndUserJumpInput {
        #[serde(default)]
        heading: Orientation,
    },
    /// Stands still and never jumps.
    Idle,
}

fn default_follow_margin() -> f32 {
    DEFAULT_FOLLOW_MARGIN
}

pub enum Intelligence {
    UserInput(UserInput),
    FollowPlayer(FollowPlayer),
    TurnOnCollision(TurnOnCollision),
    JumpOverHole(JumpOverHole),
    TurnOnCollisionAndUserJumpInput(TurnOnCollisionAndUserJumpInput),
    Idle,
}

impl From<&IntelligenceKind> for Intelligence {
    fn from(kind: &IntelligenceKind) -> Self {
        match *kind {
            IntelligenceKind::UserInput => Intelligence::UserInput(UserInput::default()),
            IntelligenceKind::FollowPlayer { margin } => {
                Intelligence::FollowPlayer(FollowPlayer { margin })
            }
            IntelligenceKind::TurnOnCollision { heading } => {
                Intelligence::TurnOnCollision(TurnOnCollision::new(false, heading))
            }
            IntelligenceKind::TurnOnHoleOrCollision { heading } => {
                Intelligence::TurnOnCollision(TurnOnCollision::new(true, heading))
            }
            IntelligenceKind::JumpOverHole { heading } => {
                Intelligence::JumpOverHole(JumpOverHole { heading })
            }
            IntelligenceKind::TurnOnCollisionAndUserJumpInput { heading } => {
                Intelligence::TurnOnCollisionAndUserJumpInput(
                    TurnOnCollisionAndUserJumpInput::new(heading),
                )
            }
            IntelligenceKind::Idle => Intelligence::Idle,
        }
    }
}

impl MovementIntelligence for Intelligence {
    fn update(&mut self, view: &IntelligenceView) -> MoveIntents {
        match self {
            Intelligence::UserInput(s) => s.update(view),
            Intelligence::FollowPlayer(s) => s.update(view),
            Intelligence::TurnOnCollision(s) => s.update(view),
            Intelligence::JumpOverHole(s) => s.update(view),
            Intelligence::TurnOnCollisionAndUserJumpInput(s) => s.update(view),
            Intelligence::Idle => MoveIntents::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use bevy::prelude::*;

    use super::*;

    fn view(vertical: VerticalState) -> IntelligenceView {
        IntelligenceView {
            orientation: Orientation::Right,
            vertical,
            surroundings: Direction::ALL.map(SurfaceInformation::empty),
            ground_ahead_solid: true,
            bounds: Aabb::from_position(Vec2::new(100.0, 0.0), Vec2::splat(10.0)),
            main_character: None,
            external: ExternalIntents::default(),
            can_wall_jump: false,
        }
    }

    fn with_wall(mut v: IntelligenceView, direction: Direction) -> IntelligenceView {
        v.surroundings[direction.index()] = SurfaceInformation::solid(direction, 0.2);
        v
    }

    #[test]
    fn jump_pressed_in_air_fires_on_landing_within_buffer() {
        let mut ai = UserInput::default();
        let mut air = view(VerticalState::Falling);
        air.external.jump_pressed = true;
        air.external.jump_held = true;
        let first = ai.update(&air);
        assert!(first.start_jump);

        air.external.jump_pressed = false;
        for _ in 0..5 {
            assert!(!ai.update(&air).start_jump);
        }

        let mut ground = view(VerticalState::Standing);
        ground.external.jump_held = true;
        let landed = ai.update(&ground);
        assert!(landed.start_jump);
        assert!(landed.start_or_continue_jump);

        // Spent: holding on does not jump again.
        assert!(!ai.update(&ground).start_jump);
    }

    #[test]
    fn buffered_jump_expires() {
        let mut ai = UserInput::default();
        let mut air = view(VerticalState::Falling);
        air.external.jump_pressed = true;
        air.external.jump_held = true;
        ai.update(&air);
        air.external.jump_pressed = false;
        for _ in 0..JUMP_BUFFER_TICKS {
            ai.update(&air);
        }
        let mut ground = view(VerticalState::Standing);
        ground.external.jump_held = true;
        assert!(!ai.update(&ground).start_jump);
    }

    #[test]
    fn wall_press_is_kept_only_without_a_wall_jump() {
        let mut sliding = with_wall(view(VerticalState::Falling), Direction::Left);
        sliding.external.jump_pressed = true;
        sliding.external.jump_held = true;
        let mut ground = view(VerticalState::Standing);
        ground.external.jump_held = true;

        let mut ai = UserInput::default();
        ai.update(&sliding);
        assert!(ai.update(&ground).start_jump);

        let mut ai = UserInput::default();
        sliding.can_wall_jump = true;
        ai.update(&sliding);
        assert!(!ai.update(&ground).start_jump);
    }

    #[test]
    fn flight_cancels_jumping() {
        let mut ai = UserInput::default();
        let mut v = view(VerticalState::Standing);
        v.external.jump_pressed = true;
        v.external.jump_held = true;
        v.external.fly_held = true;
        let out = ai.update(&v);
        assert!(out.fly);
        assert!(!out.start_jump);
        assert!(!out.start_or_continue_jump);
    }

    #[test]
    fn follow_player_respects_margin() {
        let mut ai = FollowPlayer::default();
        let mut v = view(VerticalState::Standing);
        v.main_character = Some(Aabb::from_position(Vec2::new(102.0, 0.0), Vec2::splat(10.0)));
        let out = ai.update(&v);
        assert!(!out.move_left && !out.move_right);

        v.main_character = Some(Aabb::from_position(Vec2::new(40.0, 0.0), Vec2::splat(10.0)));
        assert!(ai.update(&v).move_left);
    }

    #[test]
    fn turn_on_collision_reverses_at_walls_and_holes() {
        let mut ai = TurnOnCollision::new(false, Orientation::Right);
        let out = ai.update(&with_wall(view(VerticalState::Standing), Direction::Right));
        assert!(out.move_left);

        let mut hole = view(VerticalState::Standing);
        hole.orientation = Orientation::Left;
        hole.ground_ahead_solid = false;
        assert!(ai.update(&hole).move_left);

        let mut careful = TurnOnCollision::new(true, Orientation::Left);
        assert!(careful.update(&hole).move_right);
    }

    #[test]
    fn jump_over_hole_jumps_at_ledges_and_keeps_holding_in_air() {
        let mut ai = JumpOverHole {
            heading: Orientation::Right,
        };
        let mut ledge = view(VerticalState::Standing);
        ledge.ground_ahead_solid = false;
        let out = ai.update(&ledge);
        assert!(out.start_jump && out.move_right);

        let air = view(VerticalState::Jumping);
        let out = ai.update(&air);
        assert!(!out.start_jump);
        assert!(out.start_or_continue_jump);
    }

    #[test]
    fn patrol_with_user_jump_combines_both() {
        let mut ai = TurnOnCollisionAndUserJumpInput::new(Orientation::Left);
        let mut v = with_wall(view(VerticalState::Standing), Direction::Left);
        v.external.jump_pressed = true;
        let out = ai.update(&v);
        assert!(out.move_right);
        assert!(out.start_jump);
    }

    #[test]
    fn kinds_deserialize_from_tagged_json() {
        let kind: IntelligenceKind =
            serde_json::from_str(r#"{ "type": "turn_on_hole_or_collision", "heading": "Left" }"#)
                .expect("parse");
        assert_eq!(
            kind,
            IntelligenceKind::TurnOnHoleOrCollision {
                heading: Orientation::Left
            }
        );
        assert!(matches!(
            Intelligence::from(&kind),
            Intelligence::TurnOnCollision(TurnOnCollision {
                turn_on_hole: true,
                ..
            })
        ));
    }
}
