use serde::{Deserialize, Serialize};
use std::{fmt::Debug, fs, io, path::Path};

use crate::{
    domain::BbNorm,
    file_util,
    result::{RvError, RvResult},
    rverr,
};

pub const UNKNOWN_LABEL: &str = "unknown";

/// One labeled region of interest. The bounding box is kept as raw json such that a malformed box
/// only invalidates its own record and not the whole file.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Annotation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<serde_json::Value>,
}

impl Annotation {
    pub fn new(category: &str, label: Option<&str>, bbox: [f64; 4]) -> Self {
        Annotation {
            category: Some(category.to_string()),
            label: label.map(|l| l.to_string()),
            bbox: Some(serde_json::Value::from(bbox.to_vec())),
        }
    }

    /// The label if present, else the category, else [`UNKNOWN_LABEL`]. Empty strings count as
    /// absent.
    pub fn label_text(&self) -> &str {
        fn non_empty(s: &Option<String>) -> Option<&str> {
            s.as_deref().filter(|s| !s.is_empty())
        }
        non_empty(&self.label)
            .or_else(|| non_empty(&self.category))
            .unwrap_or(UNKNOWN_LABEL)
    }

    pub fn bbox_norm(&self) -> RvResult<BbNorm> {
        match &self.bbox {
            Some(bbox) => BbNorm::try_from(bbox),
            None => Err(rverr!(
                MalformedAnnotation,
                "annotation '{}' has no bbox",
                self.label_text()
            )),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct AnnotationSet {
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl AnnotationSet {
    pub fn from_json_str(s: &str) -> RvResult<Self> {
        serde_json::from_str(s).map_err(|e| rverr!(InvalidJson, "{}", e))
    }
    pub fn len(&self) -> usize {
        self.annotations.len()
    }
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter()
    }
}

pub fn read_annotations<P>(path: P) -> RvResult<AnnotationSet>
where
    P: AsRef<Path> + Debug,
{
    let s = fs::read_to_string(&path).map_err(|e| match e.kind() {
        io::ErrorKind::InvalidData => rverr!(InvalidJson, "{:?} is not valid utf-8, {:?}", path, e),
        _ => rverr!(AnnotationFileNotFound, "could not read {:?} due to {:?}", path, e),
    })?;
    AnnotationSet::from_json_str(&s)
        .map_err(|e| RvError::new(e.kind(), &format!("could not parse {:?}, {}", path, e.msg())))
}

pub fn write_annotations<P>(path: P, annotations: &AnnotationSet) -> RvResult<()>
where
    P: AsRef<Path> + Debug,
{
    let s = serde_json::to_string_pretty(annotations).map_err(crate::result::to_rv)?;
    file_util::write(path, s)
}

#[cfg(test)]
use crate::result::ErrorKind;

#[test]
fn test_label_text() {
    let anno = Annotation::new("app_icon", Some("Settings"), [0.0, 0.0, 0.1, 0.1]);
    assert_eq!(anno.label_text(), "Settings");
    let anno = Annotation::new("app_icon", None, [0.0, 0.0, 0.1, 0.1]);
    assert_eq!(anno.label_text(), "app_icon");
    let anno = Annotation::new("app_icon", Some(""), [0.0, 0.0, 0.1, 0.1]);
    assert_eq!(anno.label_text(), "app_icon");
    let anno = Annotation::default();
    assert_eq!(anno.label_text(), UNKNOWN_LABEL);
}

#[test]
fn test_parse() -> RvResult<()> {
    let s = r#"{"annotations": [
        {"category": "app_icon", "label": "Settings", "bbox": [0.05, 0.064, 0.183, 0.103]},
        {"category": "widget", "bbox": [0.1, 0.2, 0.3]},
        {"label": "no box"}
    ]}"#;
    let set = AnnotationSet::from_json_str(s)?;
    assert_eq!(set.len(), 3);
    let labels = set.iter().map(|a| a.label_text()).collect::<Vec<_>>();
    assert_eq!(labels, vec!["Settings", "widget", "no box"]);
    assert_eq!(
        set.annotations[0].bbox_norm()?,
        BbNorm::from_arr(&[0.05, 0.064, 0.183, 0.103])
    );
    assert_eq!(
        set.annotations[1].bbox_norm().unwrap_err().kind(),
        ErrorKind::MalformedAnnotation
    );
    assert_eq!(
        set.annotations[2].bbox_norm().unwrap_err().kind(),
        ErrorKind::MalformedAnnotation
    );
    Ok(())
}

#[test]
fn test_parse_edge_cases() {
    let set = AnnotationSet::from_json_str(r#"{"images": []}"#).unwrap();
    assert!(set.is_empty());
    let set = AnnotationSet::from_json_str(r#"{"annotations": []}"#).unwrap();
    assert!(set.is_empty());
    for broken in [
        r#"{"annotations": [}"#,
        "",
        r#"{"annotations": [{"category": 5, "bbox": [0, 0, 1, 1]}]}"#,
        r#"{"annotations": {"category": "a"}}"#,
    ] {
        let err = AnnotationSet::from_json_str(broken).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidJson);
    }
}

#[test]
fn test_read_missing() {
    let err = read_annotations("/this/path/does/not/exist/annotations.json").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AnnotationFileNotFound);
}
