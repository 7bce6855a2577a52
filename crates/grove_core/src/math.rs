//! Axis-aligned rectangles in world or viewport space.
//!
//! `Rect` is stored as top-left corner plus extent, with +y pointing down
//! (screen convention). Every overlap helper here is shared by the spatial
//! index, the collision engine and the compositor so that culling and pickup
//! agree on what "overlapping" means.

use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Build a rect, clamping negative extents to zero.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    pub fn from_min_size(min: Vec2, size: Vec2) -> Self {
        Self::new(min.x, min.y, size.x, size.y)
    }

    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn max(&self) -> Vec2 {
        Vec2::new(self.right(), self.bottom())
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge, used as the painter's-algorithm depth key.
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Strict AABB overlap: touching edges do not count.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Inclusive point containment (edges count as inside).
    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Area of the intersection rectangle, zero when disjoint.
    pub fn intersection_area(&self, other: &Rect) -> f32 {
        let overlap_x = (self.right().min(other.right()) - self.x.max(other.x)).max(0.0);
        let overlap_y = (self.bottom().min(other.bottom()) - self.y.max(other.y)).max(0.0);
        overlap_x * overlap_y
    }

    pub fn translated(&self, offset: Vec2) -> Rect {
        Rect {
            x: self.x + offset.x,
            y: self.y + offset.y,
            ..*self
        }
    }
}
