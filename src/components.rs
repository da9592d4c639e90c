use std::fmt;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Index of an object in the room's arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct ObjectId(pub usize);

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum LifeState {
    #[default]
    Alive,
    Dying,
    Dead,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum Orientation {
    Left,
    #[default]
    Right,
}

impl Orientation {
    pub fn sign(self) -> f32 {
        match self {
            Orientation::Left => -1.0,
            Orientation::Right => 1.0,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Orientation::Left => Orientation::Right,
            Orientation::Right => Orientation::Left,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum VerticalState {
    Standing,
    Jumping,
    #[default]
    Falling,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    pub fn other(self) -> Self {
        match self {
            Axis::Horizontal => Axis::Vertical,
            Axis::Vertical => Axis::Horizontal,
        }
    }

    pub fn of(self, v: Vec2) -> f32 {
        match self {
            Axis::Horizontal => v.x,
            Axis::Vertical => v.y,
        }
    }

    pub fn set(self, v: &mut Vec2, value: f32) {
        match self {
            Axis::Horizontal => v.x = value,
            Axis::Vertical => v.y = value,
        }
    }
}

/// Pose name handed to the renderer. This is the whole rendering contract.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum ActionState {
    #[default]
    StandRight,
    StandLeft,
    WalkLeft,
    WalkRight,
    JumpLeft,
    JumpRight,
    FallLeft,
    FallRight,
    WallJumpLeft,
    WallJumpRight,
    ShootLeft,
    ShootRight,
    FlyLeft,
    FlyRight,
    Die,
}

impl ActionState {
    pub fn stand(o: Orientation) -> Self {
        match o {
            Orientation::Left => ActionState::StandLeft,
            Orientation::Right => ActionState::StandRight,
        }
    }

    pub fn walk(o: Orientation) -> Self {
        match o {
            Orientation::Left => ActionState::WalkLeft,
            Orientation::Right => ActionState::WalkRight,
        }
    }

    pub fn jump(o: Orientation) -> Self {
        match o {
            Orientation::Left => ActionState::JumpLeft,
            Orientation::Right => ActionState::JumpRight,
        }
    }

    pub fn fall(o: Orientation) -> Self {
        match o {
            Orientation::Left => ActionState::FallLeft,
            Orientation::Right => ActionState::FallRight,
        }
    }

    pub fn wall_jump(o: Orientation) -> Self {
        match o {
            Orientation::Left => ActionState::WallJumpLeft,
            Orientation::Right => ActionState::WallJumpRight,
        }
    }

    pub fn shoot(o: Orientation) -> Self {
        match o {
            Orientation::Left => ActionState::ShootLeft,
            Orientation::Right => ActionState::ShootRight,
        }
    }

    pub fn fly(o: Orientation) -> Self {
        match o {
            Orientation::Left => ActionState::FlyLeft,
            Orientation::Right => ActionState::FlyRight,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionState::StandLeft => "StandLeft",
            ActionState::StandRight => "StandRight",
            ActionState::WalkLeft => "WalkLeft",
            ActionState::WalkRight => "WalkRight",
            ActionState::JumpLeft => "JumpLeft",
            ActionState::JumpRight => "JumpRight",
            ActionState::FallLeft => "FallLeft",
            ActionState::FallRight => "FallRight",
            ActionState::WallJumpLeft => "WallJumpLeft",
            ActionState::WallJumpRight => "WallJumpRight",
            ActionState::ShootLeft => "ShootLeft",
            ActionState::ShootRight => "ShootRight",
            ActionState::FlyLeft => "FlyLeft",
            ActionState::FlyRight => "FlyRight",
            ActionState::Die => "Die",
        }
    }
}

impl fmt::Display for ActionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Already-debounced intents coming from the input collaborator.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalIntents {
    pub move_left: bool,
    pub move_right: bool,
    /// Edge-triggered: true only on the tick the button went down.
    pub jump_pressed: bool,
    pub jump_held: bool,
    pub interact: bool,
    pub fly_held: bool,
}

/// What an intelligence strategy asks the provider to do this tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct MoveIntents {
    pub move_left: bool,
    pub move_right: bool,
    pub start_jump: bool,
    pub start_or_continue_jump: bool,
    pub start_action: bool,
    pub fly: bool,
}

impl MoveIntents {
    /// -1, 0 or +1 along x.
    pub fn horizontal(&self) -> f32 {
        let mut dir = 0.0;
        if self.move_left {
            dir -= 1.0;
        }
        if self.move_right {
            dir += 1.0;
        }
        dir
    }
}
