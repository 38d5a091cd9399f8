use crate::model::Point;

/// Affine zoom transform between canonical image space and screen space.
///
/// The anchor is the canvas midpoint captured when the viewport is first
/// constructed and is never recomputed afterwards, so zooming is always
/// centered on that fixed screen position regardless of cursor or image size.
#[derive(Clone, Copy, Debug)]
pub struct Viewport {
    zoom: f32,
    center: Point,
}

impl Viewport {
    pub const MIN_ZOOM: f32 = 1.0;

    pub fn new(center: Point) -> Self {
        Self {
            zoom: Self::MIN_ZOOM,
            center,
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Canonical image coords to screen coords:
    /// `screen = image * zoom + center * (1 - zoom)`, per axis.
    pub fn to_screen(&self, p: Point) -> Point {
        Point {
            x: p.x * self.zoom + self.center.x * (1.0 - self.zoom),
            y: p.y * self.zoom + self.center.y * (1.0 - self.zoom),
        }
    }

    /// Inverse of [`to_screen`](Self::to_screen):
    /// `image = (screen - center) / zoom + center`.
    pub fn to_canonical(&self, p: Point) -> Point {
        Point {
            x: (p.x - self.center.x) / self.zoom + self.center.x,
            y: (p.y - self.center.y) / self.zoom + self.center.y,
        }
    }

    /// Multiplies the zoom by `factor`, clamped so the image never renders
    /// below native size.
    pub fn change_zoom(&mut self, factor: f32) {
        self.zoom = (self.zoom * factor).max(Self::MIN_ZOOM);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3
    }

    #[test]
    fn round_trip_is_identity() {
        let mut vp = Viewport::new(Point::new(400.0, 300.0));
        vp.change_zoom(2.5);
        for p in [
            Point::new(0.0, 0.0),
            Point::new(123.5, 77.25),
            Point::new(-40.0, 1000.0),
        ] {
            assert!(approx(vp.to_canonical(vp.to_screen(p)), p));
            assert!(approx(vp.to_screen(vp.to_canonical(p)), p));
        }
    }

    #[test]
    fn identity_at_native_zoom() {
        let vp = Viewport::new(Point::new(150.0, 150.0));
        let p = Point::new(42.0, 17.0);
        assert!(approx(vp.to_screen(p), p));
    }

    #[test]
    fn anchor_is_fixed_under_zoom() {
        let center = Point::new(200.0, 100.0);
        let mut vp = Viewport::new(center);
        vp.change_zoom(3.0);
        assert!(approx(vp.to_screen(center), center));
    }

    #[test]
    fn zoom_never_drops_below_one() {
        let mut vp = Viewport::new(Point::new(0.0, 0.0));
        for _ in 0..20 {
            vp.change_zoom(0.1);
        }
        assert_eq!(vp.zoom(), Viewport::MIN_ZOOM);

        vp.change_zoom(4.0);
        vp.change_zoom(0.1);
        assert_eq!(vp.zoom(), Viewport::MIN_ZOOM);
    }
}
