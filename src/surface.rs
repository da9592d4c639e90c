use serde::{Deserialize, Serialize};

use crate::components::Axis;

/// One of the four sides of a rectangle.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum Direction {
    Left,
    #[default]
    Top,
    Right,
    Bottom,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Top,
        Direction::Right,
        Direction::Bottom,
    ];

    pub fn index(self) -> usize {
        match self {
            Direction::Left => 0,
            Direction::Top => 1,
            Direction::Right => 2,
            Direction::Bottom => 3,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Top => Direction::Bottom,
            Direction::Right => Direction::Left,
            Direction::Bottom => Direction::Top,
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            Direction::Left | Direction::Right => Axis::Horizontal,
            Direction::Top | Direction::Bottom => Axis::Vertical,
        }
    }

    /// Side hit first when travelling along `axis` with the sign of `delta`.
    pub fn leading(axis: Axis, delta: f32) -> Self {
        match (axis, delta > 0.0) {
            (Axis::Horizontal, true) => Direction::Right,
            (Axis::Horizontal, false) => Direction::Left,
            (Axis::Vertical, true) => Direction::Bottom,
            (Axis::Vertical, false) => Direction::Top,
        }
    }

    /// Unit sign pointing away from the rectangle through this side (`+y` is down).
    pub fn outward(self) -> f32 {
        match self {
            Direction::Left | Direction::Top => -1.0,
            Direction::Right | Direction::Bottom => 1.0,
        }
    }
}

/// What an object feels when it touches one side of a tile or obstacle.
#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceInformation {
    #[serde(skip)]
    pub direction: Direction,
    pub is_solid: bool,
    pub friction: f32,
    /// Carried velocity along the surface tangent (conveyors, moving floors).
    pub velocity: f32,
    /// The owner of this surface dies when it is touched here.
    pub is_die: bool,
    pub offense: f32,
    pub defense: f32,
    /// Ejection speed applied on contact (springs, stomp bounces).
    pub tangent_speed: f32,
}

impl SurfaceInformation {
    pub fn empty(direction: Direction) -> Self {
        Self {
            direction,
            ..Default::default()
        }
    }

    pub fn solid(direction: Direction, friction: f32) -> Self {
        Self {
            direction,
            is_solid: true,
            friction,
            ..Default::default()
        }
    }

    pub fn is_deadly(&self) -> bool {
        self.offense > 0.0
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Merge two simultaneous contacts on the same side.
    ///
    /// Solidity is OR'd, friction and carried velocity keep the larger
    /// magnitude, offense keeps the safest (minimum) value and defense the
    /// strongest. A die-on-touch flag and its tangent speed only survive when
    /// both contacts carry it.
    pub fn compound(&self, other: &SurfaceInformation) -> SurfaceInformation {
        let is_die = self.is_die && other.is_die;
        SurfaceInformation {
            direction: self.direction,
            is_solid: self.is_solid || other.is_solid,
            friction: self.friction.max(other.friction),
            velocity: larger_magnitude(self.velocity, other.velocity),
            is_die,
            offense: self.offense.min(other.offense),
            defense: self.defense.max(other.defense),
            tangent_speed: if is_die {
                larger_magnitude(self.tangent_speed, other.tangent_speed)
            } else {
                0.0
            },
        }
    }
}

fn larger_magnitude(a: f32, b: f32) -> f32 {
    if b.abs() > a.abs() {
        b
    } else {
        a
    }
}

/// Compose two optional contacts; a missing contact is the identity.
pub fn compose(
    a: Option<SurfaceInformation>,
    b: Option<SurfaceInformation>,
) -> Option<SurfaceInformation> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.compound(&b)),
        (Some(a), None) => Some(a),
        (None, b) => b,
    }
}

/// The four-sided surface model shared by tiles and obstacles.
#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceSet {
    pub left: SurfaceInformation,
    pub top: SurfaceInformation,
    pub right: SurfaceInformation,
    pub bottom: SurfaceInformation,
}

impl SurfaceSet {
    pub fn uniform(surface: SurfaceInformation) -> Self {
        Self {
            left: surface,
            top: surface,
            right: surface,
            bottom: surface,
        }
    }

    pub fn solid(friction: f32) -> Self {
        Self::uniform(SurfaceInformation::solid(Direction::Top, friction))
    }

    pub fn get(&self, direction: Direction) -> SurfaceInformation {
        let surface = match direction {
            Direction::Left => self.left,
            Direction::Top => self.top,
            Direction::Right => self.right,
            Direction::Bottom => self.bottom,
        };
        surface.with_direction(direction)
    }

    pub fn set(&mut self, direction: Direction, surface: SurfaceInformation) {
        let surface = surface.with_direction(direction);
        match direction {
            Direction::Left => self.left = surface,
            Direction::Top => self.top = surface,
            Direction::Right => self.right = surface,
            Direction::Bottom => self.bottom = surface,
        }
    }

    pub fn is_solid_all(&self) -> bool {
        Direction::ALL.iter().all(|d| self.get(*d).is_solid)
    }

    pub fn max_offense(&self) -> f32 {
        Direction::ALL
            .iter()
            .map(|d| self.get(*d).offense)
            .fold(0.0, f32::max)
    }

    pub fn max_defense(&self) -> f32 {
        Direction::ALL
            .iter()
            .map(|d| self.get(*d).defense)
            .fold(0.0, f32::max)
    }
}
