//! Sample annotation file for trying out the tool without real detection results.
use std::path::Path;

use tracing::info;

use crate::{
    annotations::{write_annotations, Annotation, AnnotationSet},
    result::RvResult,
};

pub fn demo_annotations() -> AnnotationSet {
    AnnotationSet {
        annotations: vec![
            Annotation::new("app_icon", Some("设置"), [0.050, 0.064, 0.183, 0.103]),
            Annotation::new(
                "widget",
                Some("Calendar Widget"),
                [0.033, 0.199, 0.939, 0.299],
            ),
        ],
    }
}

/// Writes the demo annotations if there is no file at `json_path` yet. Returns whether a file was
/// written.
pub fn write_demo_if_missing(json_path: &Path) -> RvResult<bool> {
    if json_path.exists() {
        Ok(false)
    } else {
        info!("creating demo annotations {:?}, replace them with real ones", json_path);
        write_annotations(json_path, &demo_annotations())?;
        Ok(true)
    }
}

#[cfg(test)]
use crate::annotations::read_annotations;

#[test]
fn test_demo_roundtrip() -> RvResult<()> {
    let path = std::env::temp_dir()
        .join("rvoverlay_demo_test")
        .join("input.json");
    if path.exists() {
        std::fs::remove_file(&path).unwrap();
    }
    assert!(write_demo_if_missing(&path)?);
    assert!(!write_demo_if_missing(&path)?);
    let read = read_annotations(&path)?;
    assert_eq!(read, demo_annotations());
    let labels = read.iter().map(|a| a.label_text()).collect::<Vec<_>>();
    assert_eq!(labels, vec!["设置", "Calendar Widget"]);
    Ok(())
}
