use std::collections::BTreeMap;

use crate::model::{BoundingBox, Corner, Label, Point, PointAnnotation};

/// Annotations for one image: the two class buckets plus the optional
/// bounding box. The buckets mirror the `red`/`blue` arrays of the saved
/// file; each entry still carries its own class tag (a bare `[x,y]` pair in
/// the file defaults to Red even when it was found in the `blue` array).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImageAnnotationSet {
    pub red: Vec<PointAnnotation>,
    pub blue: Vec<PointAnnotation>,
    pub bbox: BoundingBox,
}

/// The annotation state for a whole session: the committed per-image map
/// (keyed by image base name) and the working list for the image currently
/// on screen.
///
/// The one cross-operation invariant: `commit` for the outgoing image must
/// run before `load_working_for` runs for the incoming one, or the working
/// edits are lost. The UI drives that ordering on every navigation and on
/// close.
#[derive(Clone, Debug, Default)]
pub struct AnnotationStore {
    committed: BTreeMap<String, ImageAnnotationSet>,
    working: Vec<PointAnnotation>,
}

impl AnnotationStore {
    pub fn new(committed: BTreeMap<String, ImageAnnotationSet>) -> Self {
        Self {
            committed,
            working: Vec::new(),
        }
    }

    pub fn committed(&self) -> &BTreeMap<String, ImageAnnotationSet> {
        &self.committed
    }

    pub fn working(&self) -> &[PointAnnotation] {
        &self.working
    }

    /// Appends a point to the working list. Out-of-bounds coordinates are
    /// legal and stored as-is; the store never sees image dimensions.
    pub fn add_point(&mut self, point: Point, class: Label) {
        self.working.push(PointAnnotation::new(point, class));
    }

    /// Removes the most recently added working point, whatever its class.
    /// No-op on an empty working list.
    pub fn undo_last(&mut self) -> Option<PointAnnotation> {
        self.working.pop()
    }

    /// Overwrites one corner of `image`'s bounding box, creating the image
    /// entry if this is its first annotation. Corners may arrive in either
    /// order and are not normalized.
    pub fn set_corner(&mut self, image: &str, corner: Corner, p: Point) {
        self.committed
            .entry(image.to_string())
            .or_default()
            .bbox
            .set_corner(corner, p);
    }

    pub fn bbox(&self, image: &str) -> Option<&BoundingBox> {
        self.committed.get(image).map(|set| &set.bbox)
    }

    /// Partitions the working list by class and stores the result as
    /// `image`'s points, replacing whatever was committed before. The
    /// bounding box is untouched; only the point buckets are rewritten.
    pub fn commit(&mut self, image: &str) {
        let entry = self.committed.entry(image.to_string()).or_default();
        entry.red = self
            .working
            .iter()
            .filter(|a| a.class == Label::Red)
            .copied()
            .collect();
        entry.blue = self
            .working
            .iter()
            .filter(|a| a.class == Label::Blue)
            .copied()
            .collect();
    }

    /// Rebuilds the working list for `image`: the committed Red points
    /// followed by the Blue points. Order within each class is preserved;
    /// the interleaving that existed before the last commit is not.
    pub fn load_working_for(&mut self, image: &str) {
        self.working.clear();
        if let Some(set) = self.committed.get(image) {
            self.working.extend(set.red.iter().copied());
            self.working.extend(set.blue.iter().copied());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn undo_restores_prior_working_state() {
        let mut store = AnnotationStore::default();
        store.add_point(pt(1.0, 2.0), Label::Red);
        store.add_point(pt(3.0, 4.0), Label::Blue);
        let before = store.working().to_vec();

        store.add_point(pt(5.0, 6.0), Label::Red);
        store.undo_last();
        assert_eq!(store.working(), before.as_slice());
    }

    #[test]
    fn undo_on_empty_is_noop() {
        let mut store = AnnotationStore::default();
        assert_eq!(store.undo_last(), None);
        assert!(store.working().is_empty());
    }

    #[test]
    fn commit_then_load_partitions_red_before_blue() {
        let mut store = AnnotationStore::default();
        store.add_point(pt(1.0, 1.0), Label::Blue);
        store.add_point(pt(2.0, 2.0), Label::Red);
        store.add_point(pt(3.0, 3.0), Label::Blue);
        store.add_point(pt(4.0, 4.0), Label::Red);

        store.commit("a.jpg");
        store.load_working_for("a.jpg");

        let classes: Vec<Label> = store.working().iter().map(|a| a.class).collect();
        assert_eq!(classes, vec![Label::Red, Label::Red, Label::Blue, Label::Blue]);
        let xs: Vec<f32> = store.working().iter().map(|a| a.point.x).collect();
        assert_eq!(xs, vec![2.0, 4.0, 1.0, 3.0]);
    }

    #[test]
    fn commit_overwrites_previous_points_but_keeps_bbox() {
        let mut store = AnnotationStore::default();
        store.add_point(pt(1.0, 1.0), Label::Red);
        store.commit("a.jpg");
        store.set_corner("a.jpg", Corner::TopLeft, pt(0.0, 0.0));
        store.set_corner("a.jpg", Corner::BottomRight, pt(9.0, 9.0));

        store.load_working_for("a.jpg");
        store.add_point(pt(7.0, 7.0), Label::Blue);
        store.commit("a.jpg");

        let set = &store.committed()["a.jpg"];
        assert_eq!(set.red.len(), 1);
        assert_eq!(set.blue.len(), 1);
        assert_eq!(
            set.bbox.corners(),
            Some((pt(0.0, 0.0), pt(9.0, 9.0)))
        );
    }

    #[test]
    fn load_working_for_unknown_image_clears_working() {
        let mut store = AnnotationStore::default();
        store.add_point(pt(1.0, 1.0), Label::Red);
        store.load_working_for("never-seen.jpg");
        assert!(store.working().is_empty());
    }

    #[test]
    fn corner_overwrite_keeps_last_value() {
        let mut store = AnnotationStore::default();
        store.set_corner("a.jpg", Corner::TopLeft, pt(1.0, 1.0));
        store.set_corner("a.jpg", Corner::TopLeft, pt(2.0, 2.0));

        let bbox = store.bbox("a.jpg").unwrap();
        assert_eq!(bbox.top_left, Some(pt(2.0, 2.0)));
        assert_eq!(bbox.bottom_right, None);
        assert_eq!(bbox.corners(), None);
    }

    #[test]
    fn corners_settable_in_either_order_without_normalization() {
        let mut store = AnnotationStore::default();
        store.set_corner("a.jpg", Corner::BottomRight, pt(1.0, 1.0));
        store.set_corner("a.jpg", Corner::TopLeft, pt(8.0, 8.0));

        // "top-left" keeps the larger coordinates; nothing swaps them.
        let bbox = store.bbox("a.jpg").unwrap();
        assert_eq!(bbox.corners(), Some((pt(8.0, 8.0), pt(1.0, 1.0))));
    }
}
