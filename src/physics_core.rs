use bevy::prelude::*;

use crate::components::Axis;
use crate::surface::Direction;

/// Edge-to-edge contacts and boundary-exact positions are compared with this slack.
pub const CONTACT_EPSILON: f32 = 1.0e-3;

/// Axis-aligned box in screen space (`min_y` is the top edge).
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Aabb {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

/// How two boxes relate to each other.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Contact {
    Apart,
    Overlap,
    /// Touching edge to edge; carries the side of the first box that touches.
    Border(Direction),
}

impl Aabb {
    /// Box from a top-left corner and a size.
    pub fn from_position(position: Vec2, size: Vec2) -> Self {
        Self {
            min_x: position.x,
            min_y: position.y,
            max_x: position.x + size.x,
            max_y: position.y + size.y,
        }
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn center_x(&self) -> f32 {
        (self.min_x + self.max_x) * 0.5
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.center_x(), (self.min_y + self.max_y) * 0.5)
    }

    pub fn min(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Horizontal => self.min_x,
            Axis::Vertical => self.min_y,
        }
    }

    pub fn max(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Horizontal => self.max_x,
            Axis::Vertical => self.max_y,
        }
    }

    /// Coordinate of one side of the box.
    pub fn edge(&self, side: Direction) -> f32 {
        match side {
            Direction::Left => self.min_x,
            Direction::Top => self.min_y,
            Direction::Right => self.max_x,
            Direction::Bottom => self.max_y,
        }
    }

    /// Length of the shared span along `axis` (negative when disjoint).
    pub fn overlap_along(&self, other: &Aabb, axis: Axis) -> f32 {
        self.max(axis).min(other.max(axis)) - self.min(axis).max(other.min(axis))
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.overlap_along(other, Axis::Horizontal) > CONTACT_EPSILON
            && self.overlap_along(other, Axis::Vertical) > CONTACT_EPSILON
    }

    pub fn contact(&self, other: &Aabb) -> Contact {
        let span_x = self.overlap_along(other, Axis::Horizontal);
        let span_y = self.overlap_along(other, Axis::Vertical);
        if span_x > CONTACT_EPSILON && span_y > CONTACT_EPSILON {
            return Contact::Overlap;
        }
        if span_y > CONTACT_EPSILON {
            if (self.max_x - other.min_x).abs() <= CONTACT_EPSILON {
                return Contact::Border(Direction::Right);
            }
            if (self.min_x - other.max_x).abs() <= CONTACT_EPSILON {
                return Contact::Border(Direction::Left);
            }
        }
        if span_x > CONTACT_EPSILON {
            if (self.max_y - other.min_y).abs() <= CONTACT_EPSILON {
                return Contact::Border(Direction::Bottom);
            }
            if (self.min_y - other.max_y).abs() <= CONTACT_EPSILON {
                return Contact::Border(Direction::Top);
            }
        }
        Contact::Apart
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_requires_positive_area() {
        let a = Aabb::from_position(Vec2::new(0.0, 0.0), Vec2::new(16.0, 16.0));
        let b = Aabb::from_position(Vec2::new(8.0, 8.0), Vec2::new(16.0, 16.0));
        assert_eq!(a.contact(&b), Contact::Overlap);
        assert!(a.overlaps(&b));
    }

    #[test]
    fn flush_boxes_report_the_touching_side() {
        let a = Aabb::from_position(Vec2::new(0.0, 0.0), Vec2::new(16.0, 16.0));
        let right = Aabb::from_position(Vec2::new(16.0, 4.0), Vec2::new(16.0, 16.0));
        let below = Aabb::from_position(Vec2::new(4.0, 16.0), Vec2::new(16.0, 16.0));
        let above = Aabb::from_position(Vec2::new(4.0, -16.0), Vec2::new(16.0, 16.0));
        assert_eq!(a.contact(&right), Contact::Border(Direction::Right));
        assert_eq!(right.contact(&a), Contact::Border(Direction::Left));
        assert_eq!(a.contact(&below), Contact::Border(Direction::Bottom));
        assert_eq!(a.contact(&above), Contact::Border(Direction::Top));
    }

    #[test]
    fn corner_touch_is_apart() {
        let a = Aabb::from_position(Vec2::new(0.0, 0.0), Vec2::new(16.0, 16.0));
        let corner = Aabb::from_position(Vec2::new(16.0, 16.0), Vec2::new(16.0, 16.0));
        assert_eq!(a.contact(&corner), Contact::Apart);
    }
}
