use serde::{Deserialize, Serialize};

/// Axis-aligned screen rectangle in logical pixels.
///
/// Convention: origin at the top-left of the canvas, y grows downward.
/// Containment is half-open: `[x, x + width) × [y, y + height)`.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }

    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Overlapping region, or `None` if the rectangles share no area.
    ///
    /// Rectangles that merely touch along an edge do not intersect.
    pub fn intersection(&self, other: &PixelRect) -> Option<PixelRect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 > x0 && y1 > y0 {
            Some(PixelRect::new(x0, y0, x1 - x0, y1 - y0))
        } else {
            None
        }
    }

    pub fn intersects(&self, other: &PixelRect) -> bool {
        self.intersection(other).is_some()
    }

    /// Whether `self` lies entirely within `outer`.
    pub fn is_within(&self, outer: &PixelRect) -> bool {
        self.x >= outer.x
            && self.y >= outer.y
            && self.right() <= outer.right()
            && self.bottom() <= outer.bottom()
    }
}

/// Size of the drawing surface in logical pixels.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn rect(&self) -> PixelRect {
        PixelRect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }
}

#[cfg(test)]
mod tests {
    use super::{CanvasSize, PixelRect};

    #[test]
    fn touching_edges_do_not_intersect() {
        let left = PixelRect::new(0.0, 0.0, 400.0, 600.0);
        let right = PixelRect::new(400.0, 0.0, 400.0, 600.0);
        assert!(!left.intersects(&right));
        assert!(!left.contains(400.0, 10.0));
        assert!(right.contains(400.0, 10.0));
    }

    #[test]
    fn intersection_area() {
        let a = PixelRect::new(0.0, 0.0, 800.0, 600.0);
        let b = PixelRect::new(560.0, 0.0, 120.0, 600.0);
        assert_eq!(a.intersection(&b), Some(b));
        assert_eq!(a.intersection(&b).map(|r| r.area()), Some(72_000.0));
    }

    #[test]
    fn canvas_rect_and_containment() {
        let canvas = CanvasSize::new(800, 600).rect();
        assert!(PixelRect::new(10.0, 10.0, 100.0, 100.0).is_within(&canvas));
        assert!(!PixelRect::new(700.0, 0.0, 200.0, 100.0).is_within(&canvas));
        assert!(PixelRect::new(0.0, 0.0, 0.0, 10.0).is_empty());
    }
}
