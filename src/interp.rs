//! Relates the Blue points to the polyline formed by consecutive Red points:
//! for each Blue point, a vertical connector is dropped onto every Red
//! segment whose x-range covers it. Stateless; recomputed from the working
//! list whenever it changes.

use crate::model::Point;

/// A vertical connector from a Blue point to its interpolated position on
/// the Red polyline. `from` is the Blue point itself; `to` shares its x.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Connector {
    pub from: Point,
    pub to: Point,
}

/// Builds all connectors between `blue` query points and the polyline of
/// `red` points taken pairwise in insertion order (not sorted by x; reversed
/// segments are valid). A Blue point covered by several segments gets one
/// connector per match.
pub fn connectors(red: &[Point], blue: &[Point]) -> Vec<Connector> {
    let mut out = Vec::new();
    for b in blue {
        for seg in red.windows(2) {
            let (p1, p2) = (seg[0], seg[1]);
            if b.x < p1.x.min(p2.x) || b.x > p1.x.max(p2.x) {
                continue;
            }
            let y = if p1.x == p2.x {
                // Vertical segment: the historical rule checks b.x against
                // the segment's *y*-range and yields b.x as the interpolated
                // y. Kept bug-for-bug; see DESIGN.md.
                if p1.y.min(p2.y) <= b.x && b.x <= p1.y.max(p2.y) {
                    b.x
                } else {
                    continue;
                }
            } else {
                p1.y + (p2.y - p1.y) * (b.x - p1.x) / (p2.x - p1.x)
            };
            out.push(Connector {
                from: *b,
                to: Point::new(b.x, y),
            });
        }
    }
    out
}
