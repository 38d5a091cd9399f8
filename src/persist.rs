//! Load/save of the annotation document.
//!
//! The on-disk format is one JSON object keyed by image file name:
//!
//! ```json
//! {
//!   "frame_001.jpg": {
//!     "red":  [{"point": [10.0, 20.0], "class": "red"}],
//!     "blue": [[30.0, 40.0]],
//!     "top_left": [5.0, 5.0],
//!     "bottom_right": [200.0, 150.0]
//!   }
//! }
//! ```
//!
//! Loading is tolerant: a two-element array is a bare point defaulting to
//! Red (even inside the `blue` array), a `{point, class}` record is taken
//! as-is, and anything else is skipped with a warning instead of failing
//! the whole document. Saving always writes `{point, class}` records and
//! rewrites the entire file atomically.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{BoundingBox, Label, Point, PointAnnotation};
use crate::store::ImageAnnotationSet;

pub const ANNOTATIONS_FILE: &str = "annotations.json";

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One annotation entry as found in the file. Decided once, here at the
/// parse boundary; the rest of the crate only ever sees [`PointAnnotation`].
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Record { point: (f32, f32), class: Label },
    Pair([f32; 2]),
    Unrecognized(serde_json::Value),
}

impl RawEntry {
    fn normalize(self) -> Option<PointAnnotation> {
        match self {
            RawEntry::Record { point, class } => {
                Some(PointAnnotation::new(Point::new(point.0, point.1), class))
            }
            // Bare pairs predate the class tag and default to Red, no matter
            // which array they were found in.
            RawEntry::Pair([x, y]) => Some(PointAnnotation::new(Point::new(x, y), Label::Red)),
            RawEntry::Unrecognized(_) => None,
        }
    }
}

#[derive(Serialize, Deserialize, Default)]
struct RawImage {
    #[serde(default)]
    red: Vec<RawEntry>,
    #[serde(default)]
    blue: Vec<RawEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    top_left: Option<[f32; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bottom_right: Option<[f32; 2]>,
}

type RawDocument = BTreeMap<String, RawImage>;

fn normalize_bucket(entries: Vec<RawEntry>, image: &str, bucket: &str) -> Vec<PointAnnotation> {
    let total = entries.len();
    let points: Vec<PointAnnotation> = entries.into_iter().filter_map(RawEntry::normalize).collect();
    let skipped = total - points.len();
    if skipped > 0 {
        log::warn!("{image}: skipped {skipped} unrecognized entries in '{bucket}'");
    }
    points
}

fn from_raw(doc: RawDocument) -> BTreeMap<String, ImageAnnotationSet> {
    doc.into_iter()
        .map(|(image, raw)| {
            let set = ImageAnnotationSet {
                red: normalize_bucket(raw.red, &image, "red"),
                blue: normalize_bucket(raw.blue, &image, "blue"),
                bbox: BoundingBox {
                    top_left: raw.top_left.map(|[x, y]| Point::new(x, y)),
                    bottom_right: raw.bottom_right.map(|[x, y]| Point::new(x, y)),
                },
            };
            (image, set)
        })
        .collect()
}

fn to_raw(committed: &BTreeMap<String, ImageAnnotationSet>) -> RawDocument {
    let record = |a: &PointAnnotation| RawEntry::Record {
        point: (a.point.x, a.point.y),
        class: a.class,
    };
    committed
        .iter()
        .map(|(image, set)| {
            let raw = RawImage {
                red: set.red.iter().map(record).collect(),
                blue: set.blue.iter().map(record).collect(),
                top_left: set.bbox.top_left.map(|p| [p.x, p.y]),
                bottom_right: set.bbox.bottom_right.map(|p| [p.x, p.y]),
            };
            (image.clone(), raw)
        })
        .collect()
}

/// Loads the committed map from `path`. A missing file is not an error and
/// yields an empty map; a file that is not valid JSON is.
pub fn load(path: &Path) -> Result<BTreeMap<String, ImageAnnotationSet>, PersistError> {
    if !path.exists() {
        log::info!("no annotation file at {}, starting empty", path.display());
        return Ok(BTreeMap::new());
    }
    let data = std::fs::read_to_string(path)?;
    let doc: RawDocument = serde_json::from_str(&data)?;
    let committed = from_raw(doc);
    log::info!(
        "loaded annotations for {} images from {}",
        committed.len(),
        path.display()
    );
    Ok(committed)
}

/// Rewrites the whole document at `path` from the in-memory committed map.
/// The JSON is written to a temp file in the same directory and renamed over
/// the destination, so a failed save leaves the previous file intact.
pub fn save(path: &Path, committed: &BTreeMap<String, ImageAnnotationSet>) -> Result<(), PersistError> {
    let data = serde_json::to_string_pretty(&to_raw(committed))?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(data.as_bytes())?;
    tmp.persist(path).map_err(|e| e.error)?;
    log::info!(
        "saved annotations for {} images to {}",
        committed.len(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Corner;
    use crate::store::AnnotationStore;

    fn pt(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let committed = load(&dir.path().join(ANNOTATIONS_FILE)).unwrap();
        assert!(committed.is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ANNOTATIONS_FILE);

        let mut store = AnnotationStore::default();
        store.add_point(pt(1.0, 2.0), Label::Red);
        store.add_point(pt(3.0, 4.0), Label::Blue);
        store.add_point(pt(5.0, 6.0), Label::Red);
        store.commit("a.jpg");
        store.set_corner("a.jpg", Corner::TopLeft, pt(0.0, 0.0));
        store.set_corner("a.jpg", Corner::BottomRight, pt(9.0, 9.0));
        store.set_corner("b.jpg", Corner::TopLeft, pt(7.0, 7.0));

        save(&path, store.committed()).unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(&loaded, store.committed());
    }

    #[test]
    fn bare_pairs_default_to_red_even_in_blue_array() {
        let doc = r#"{"a.jpg": {"red": [[1.0, 2.0]], "blue": [[3.0, 4.0]]}}"#;
        let committed = from_raw(serde_json::from_str(doc).unwrap());
        let set = &committed["a.jpg"];
        assert_eq!(set.red, vec![PointAnnotation::new(pt(1.0, 2.0), Label::Red)]);
        assert_eq!(set.blue, vec![PointAnnotation::new(pt(3.0, 4.0), Label::Red)]);
    }

    #[test]
    fn unrecognized_entries_are_skipped_not_fatal() {
        let doc = r#"{
            "a.jpg": {
                "red": [
                    {"point": [1.0, 2.0], "class": "red"},
                    {"wrong": true},
                    [1.0, 2.0, 3.0],
                    "garbage"
                ],
                "blue": []
            }
        }"#;
        let committed = from_raw(serde_json::from_str(doc).unwrap());
        let set = &committed["a.jpg"];
        assert_eq!(set.red, vec![PointAnnotation::new(pt(1.0, 2.0), Label::Red)]);
        assert!(set.blue.is_empty());
    }

    #[test]
    fn missing_buckets_and_corners_are_tolerated() {
        let doc = r#"{"a.jpg": {"top_left": [5.0, 6.0]}}"#;
        let committed = from_raw(serde_json::from_str(doc).unwrap());
        let set = &committed["a.jpg"];
        assert!(set.red.is_empty());
        assert_eq!(set.bbox.top_left, Some(pt(5.0, 6.0)));
        assert_eq!(set.bbox.bottom_right, None);
        assert_eq!(set.bbox.corners(), None);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ANNOTATIONS_FILE);
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(load(&path), Err(PersistError::Json(_))));
    }

    #[test]
    fn save_replaces_previous_document_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ANNOTATIONS_FILE);

        let mut store = AnnotationStore::default();
        store.add_point(pt(1.0, 1.0), Label::Red);
        store.commit("old.jpg");
        save(&path, store.committed()).unwrap();

        let mut replacement = AnnotationStore::default();
        replacement.add_point(pt(2.0, 2.0), Label::Blue);
        replacement.commit("new.jpg");
        save(&path, replacement.committed()).unwrap();

        let loaded = load(&path).unwrap();
        assert!(loaded.contains_key("new.jpg"));
        assert!(!loaded.contains_key("old.jpg"));
    }
}
