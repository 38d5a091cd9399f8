//! Turns the current annotation state into a flat list of screen-space
//! primitives. The render collaborator (the egui canvas) only walks this
//! list; the core never touches pixels.

use crate::interp;
use crate::model::{BoundingBox, Label, Point, PointAnnotation};
use crate::viewport::Viewport;

/// Marker dot radius in screen pixels, independent of zoom.
pub const DOT_RADIUS: f32 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Primitive {
    /// Filled circle for one annotation point, colored by class.
    Dot { center: Point, class: Label },
    /// Line between two consecutive same-class points of the working list.
    Line { from: Point, to: Point, class: Label },
    /// Bounding-box outline; present only once both corners are placed.
    BoxOutline { a: Point, b: Point },
    /// Vertical connector from a Blue point down to the Red polyline.
    Connector { from: Point, to: Point },
}

/// Builds the primitive list for the current working set. All coordinates
/// in the output are screen-space; the viewport transform is applied here,
/// once, so callers draw the list verbatim.
pub fn build(
    working: &[PointAnnotation],
    bbox: Option<&BoundingBox>,
    vp: &Viewport,
) -> Vec<Primitive> {
    let mut out = Vec::new();

    for (i, ann) in working.iter().enumerate() {
        out.push(Primitive::Dot {
            center: vp.to_screen(ann.point),
            class: ann.class,
        });
        // Chain line to the previous entry only when adjacent in the working
        // list *and* same class; an interleaved other-class point breaks the
        // chain, matching the on-canvas history of how points were placed.
        if i > 0 && working[i - 1].class == ann.class {
            out.push(Primitive::Line {
                from: vp.to_screen(working[i - 1].point),
                to: vp.to_screen(ann.point),
                class: ann.class,
            });
        }
    }

    if let Some((tl, br)) = bbox.and_then(BoundingBox::corners) {
        out.push(Primitive::BoxOutline {
            a: vp.to_screen(tl),
            b: vp.to_screen(br),
        });
    }

    let red: Vec<Point> = working
        .iter()
        .filter(|a| a.class == Label::Red)
        .map(|a| a.point)
        .collect();
    let blue: Vec<Point> = working
        .iter()
        .filter(|a| a.class == Label::Blue)
        .map(|a| a.point)
        .collect();
    for conn in interp::connectors(&red, &blue) {
        out.push(Primitive::Connector {
            from: vp.to_screen(conn.from),
            to: vp.to_screen(conn.to),
        });
    }

    out
}
