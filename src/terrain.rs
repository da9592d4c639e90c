use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::physics_core::CONTACT_EPSILON;

/// Which side of an object the terrain bounds.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum TerrainPosition {
    /// Ceiling: objects stay below the surface.
    Top,
    /// Ground: objects stay above the surface.
    #[default]
    Bottom,
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TerrainShape {
    Flat {
        y: f32,
    },
    /// Straight slope between two points; only defined between their x values.
    Line {
        start: Vec2,
        end: Vec2,
    },
    Wave {
        base_y: f32,
        amplitude: f32,
        wavelength: f32,
        #[serde(default)]
        phase: f32,
    },
}

/// A parametric surface constraint that is not part of the tile grid.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct Terrain {
    #[serde(default)]
    pub position: TerrainPosition,
    pub shape: TerrainShape,
    #[serde(default)]
    pub left: Option<f32>,
    #[serde(default)]
    pub right: Option<f32>,
}

impl Terrain {
    pub fn new(position: TerrainPosition, shape: TerrainShape) -> Self {
        Self {
            position,
            shape,
            left: None,
            right: None,
        }
    }

    pub fn with_span(mut self, left: f32, right: f32) -> Self {
        self.left = Some(left);
        self.right = Some(right);
        self
    }

    /// Height of the surface at `x`, or `None` outside the terrain's span.
    pub fn surface_y(&self, x: f32) -> Option<f32> {
        if self.left.is_some_and(|l| x < l) || self.right.is_some_and(|r| x > r) {
            return None;
        }
        match self.shape {
            TerrainShape::Flat { y } => Some(y),
            TerrainShape::Line { start, end } => {
                let (a, b) = if start.x <= end.x {
                    (start, end)
                } else {
                    (end, start)
                };
                if x < a.x || x > b.x {
                    return None;
                }
                let run = b.x - a.x;
                if run.abs() < f32::EPSILON {
                    return Some(a.y.min(b.y));
                }
                Some(a.y + (b.y - a.y) * (x - a.x) / run)
            }
            TerrainShape::Wave {
                base_y,
                amplitude,
                wavelength,
                phase,
            } => {
                let wavelength = wavelength.abs().max(f32::EPSILON);
                Some(base_y + amplitude * (std::f32::consts::TAU * x / wavelength + phase).sin())
            }
        }
    }

    /// Push an object of `size` at top-left `position` back onto the allowed
    /// side of the surface, sampled at the object's horizontal midpoint.
    /// Returns true when the position was corrected.
    pub fn constrain(&self, size: Vec2, position: &mut Vec2) -> bool {
        let Some(surface) = self.surface_y(position.x + size.x * 0.5) else {
            return false;
        };
        match self.position {
            TerrainPosition::Bottom => {
                if position.y + size.y > surface + CONTACT_EPSILON {
                    position.y = surface - size.y;
                    return true;
                }
            }
            TerrainPosition::Top => {
                if position.y < surface - CONTACT_EPSILON {
                    position.y = surface;
                    return true;
                }
            }
        }
        false
    }
}
