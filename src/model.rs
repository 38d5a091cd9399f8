use serde::{Deserialize, Serialize};

/// A coordinate in canonical image-pixel space (origin top-left, unscaled).
/// Screen-space positions never appear in the data model; conversion happens
/// at the pointer-event and drawing boundaries via [`crate::viewport::Viewport`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Annotation class. Two-valued by design; the class doubles as the draw
/// color on screen and as the `red`/`blue` bucket name in the saved file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Red,
    Blue,
}

/// A single labeled landmark point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointAnnotation {
    pub point: Point,
    pub class: Label,
}

impl PointAnnotation {
    pub fn new(point: Point, class: Label) -> Self {
        Self { point, class }
    }
}

/// Which bounding-box corner a placement targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    BottomRight,
}

/// The per-image region of interest. Corners are set independently and in
/// either order, and are deliberately not normalized: "top-left" is whatever
/// the user placed, even if its coordinates exceed the other corner's.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
    pub top_left: Option<Point>,
    pub bottom_right: Option<Point>,
}

impl BoundingBox {
    pub fn set_corner(&mut self, corner: Corner, p: Point) {
        match corner {
            Corner::TopLeft => self.top_left = Some(p),
            Corner::BottomRight => self.bottom_right = Some(p),
        }
    }

    /// Both corners, or `None` while the annotation is still incomplete.
    /// Drawing and export must go through this rather than reading corners
    /// directly, so a half-placed box is never treated as a rectangle.
    pub fn corners(&self) -> Option<(Point, Point)> {
        match (self.top_left, self.bottom_right) {
            (Some(tl), Some(br)) => Some((tl, br)),
            _ => None,
        }
    }

}
