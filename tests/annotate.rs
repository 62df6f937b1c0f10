use std::{
    fs,
    path::{Path, PathBuf},
};

use image::Rgb;
use rvolib::{
    annotate,
    annotator::read_image,
    cfg::Cfg,
    tracing_setup::init_tracing_for_tests,
    types::ViewImage,
    AnnotateReport, ErrorKind, FontKind, RvResult, BB,
};

const GRAY: Rgb<u8> = Rgb([128, 128, 128]);
const RED: Rgb<u8> = Rgb([255, 0, 0]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

const SETTINGS_JSON: &str = r#"{"annotations":[{"category":"app_icon","label":"Settings","bbox":[0.05,0.064,0.183,0.103]}]}"#;

struct TmpFolder(PathBuf);
impl TmpFolder {
    fn new() -> Self {
        let folder = std::env::temp_dir().join(format!("rvoverlay_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&folder).unwrap();
        TmpFolder(folder)
    }
    fn join(&self, name: &str) -> PathBuf {
        self.0.join(name)
    }
}
impl Drop for TmpFolder {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

fn builtin_font_cfg() -> Cfg {
    let mut cfg = Cfg::default();
    cfg.font_paths = Some(vec![]);
    cfg
}

fn write_inputs(folder: &TmpFolder, w: u32, h: u32, json: &str) -> (PathBuf, PathBuf) {
    let image_path = folder.join("input.png");
    ViewImage::from_pixel(w, h, GRAY).save(&image_path).unwrap();
    let json_path = folder.join("input.json");
    fs::write(&json_path, json).unwrap();
    (image_path, json_path)
}

fn run(image_path: &Path, json_path: &Path, output_path: &Path) -> RvResult<AnnotateReport> {
    init_tracing_for_tests();
    annotate(image_path, json_path, output_path, &builtin_font_cfg())
}

#[test]
fn test_settings_scenario() -> RvResult<()> {
    let folder = TmpFolder::new();
    let (image_path, json_path) = write_inputs(&folder, 1000, 800, SETTINGS_JSON);
    let output_path = folder.join("output.png");
    let report = run(&image_path, &json_path, &output_path)?;

    assert_eq!(report.output_path, output_path);
    assert_eq!(report.font, FontKind::Builtin);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].kind(), ErrorKind::FontLoadFailure);
    assert_eq!(report.drawn.len(), 1);
    let drawn = &report.drawn[0];
    assert_eq!(drawn.label, "Settings");
    assert_eq!(drawn.bb, BB::from_arr(&[50, 51, 183, 82]));
    assert_eq!(drawn.bb.max(), (233, 133));
    // font size is 12, hence 51 - 14
    assert_eq!(drawn.label_pos, (50, 37));

    let im = read_image(&output_path)?;
    assert_eq!(im.dimensions(), (1000, 800));
    for (x, y) in [(233, 133), (50, 133), (233, 51), (232, 132), (140, 133), (233, 90)] {
        assert_eq!(*im.get_pixel(x, y), RED, "box pixel {x}, {y}");
    }
    for (x, y) in [(150, 100), (234, 134), (49, 100), (231, 131), (50, 36), (0, 0)] {
        assert_eq!(*im.get_pixel(x, y), GRAY, "untouched pixel {x}, {y}");
    }
    // label background starts at the label position and text is drawn inside
    assert_eq!(*im.get_pixel(50, 37), RED);
    let n_text_pixels = (39..55)
        .flat_map(|y| (52..180).map(move |x| (x, y)))
        .filter(|(x, y)| *im.get_pixel(*x, *y) == WHITE)
        .count();
    assert!(n_text_pixels > 0);
    Ok(())
}

#[test]
fn test_label_below_box_at_top() -> RvResult<()> {
    let folder = TmpFolder::new();
    let json = r#"{"annotations":[{"category":"status_bar","bbox":[0.0,0.01,1.0,0.05]}]}"#;
    let (image_path, json_path) = write_inputs(&folder, 400, 200, json);
    let report = run(&image_path, &json_path, &folder.join("output.png"))?;
    let drawn = &report.drawn[0];
    assert_eq!(drawn.label, "status_bar");
    assert_eq!(drawn.bb, BB::from_arr(&[0, 2, 400, 10]));
    assert_eq!(drawn.label_pos, (0, 14));
    Ok(())
}

#[test]
fn test_skip_malformed() -> RvResult<()> {
    let folder = TmpFolder::new();
    let json = r#"{"annotations":[
        {"category":"a","bbox":[0.1,0.5,0.1,0.1]},
        {"category":"b","bbox":[0.1,0.5,0.1]},
        {"category":"c"},
        {"label":"d","bbox":[0.6,0.6,0.1,0.1]},
        {"bbox":[0.3,0.3,0.1,0.1]},
        {"category":"e","bbox":[0.1,0.5,"0.1",0.1]}
    ]}"#;
    let (image_path, json_path) = write_inputs(&folder, 100, 100, json);
    let report = run(&image_path, &json_path, &folder.join("output.png"))?;
    let labels = report
        .drawn
        .iter()
        .map(|d| d.label.as_str())
        .collect::<Vec<_>>();
    assert_eq!(labels, vec!["a", "d", "unknown"]);
    let n_malformed = report
        .warnings
        .iter()
        .filter(|w| w.kind() == ErrorKind::MalformedAnnotation)
        .count();
    assert_eq!(n_malformed, 3);
    Ok(())
}

#[test]
fn test_missing_annotations_key() -> RvResult<()> {
    let folder = TmpFolder::new();
    let (image_path, json_path) = write_inputs(&folder, 30, 20, r#"{"images": []}"#);
    let output_path = folder.join("output.png");
    let report = run(&image_path, &json_path, &output_path)?;
    assert!(report.drawn.is_empty());
    let im = read_image(&output_path)?;
    assert!(im.pixels().all(|p| *p == GRAY));
    Ok(())
}

#[test]
fn test_idempotence() -> RvResult<()> {
    let folder = TmpFolder::new();
    let (image_path, json_path) = write_inputs(&folder, 1000, 800, SETTINGS_JSON);
    let output_path = folder.join("output.png");
    run(&image_path, &json_path, &output_path)?;
    let first = fs::read(&output_path).unwrap();
    run(&image_path, &json_path, &output_path)?;
    let second = fs::read(&output_path).unwrap();
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_overwrite_and_jpeg_output() -> RvResult<()> {
    let folder = TmpFolder::new();
    let (image_path, json_path) = write_inputs(&folder, 300, 200, SETTINGS_JSON);
    let output_path = folder.join("annotated_output.jpg");
    fs::write(&output_path, "stale").unwrap();
    run(&image_path, &json_path, &output_path)?;
    let im = read_image(&output_path)?;
    assert_eq!(im.dimensions(), (300, 200));
    Ok(())
}

#[test]
fn test_missing_image() {
    let folder = TmpFolder::new();
    let (_, json_path) = write_inputs(&folder, 10, 10, SETTINGS_JSON);
    let output_path = folder.join("output.png");
    let err = run(&folder.join("missing.png"), &json_path, &output_path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ImageNotFound);
    assert!(!output_path.exists());
}

#[test]
fn test_missing_and_invalid_json() {
    let folder = TmpFolder::new();
    let (image_path, json_path) = write_inputs(&folder, 10, 10, r#"{"annotations": [{]}"#);
    let output_path = folder.join("output.png");
    let err = run(&image_path, &folder.join("missing.json"), &output_path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AnnotationFileNotFound);
    assert!(!output_path.exists());
    let err = run(&image_path, &json_path, &output_path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidJson);
    assert!(!output_path.exists());
}

#[test]
fn test_huge_bbox_next_to_valid() -> RvResult<()> {
    let folder = TmpFolder::new();
    let json = r#"{"annotations":[{"bbox":[0.1,0.5,0.1,0.1]},{"bbox":[0.1,0.5,1e9,0.1]}]}"#;
    let (image_path, json_path) = write_inputs(&folder, 100, 100, json);
    let output_path = folder.join("output.png");
    let report = run(&image_path, &json_path, &output_path)?;
    assert_eq!(report.drawn.len(), 2);
    assert_eq!(report.drawn[1].bb, BB::from_arr(&[10, 50, 200, 10]));
    let im = read_image(&output_path)?;
    assert_eq!(*im.get_pixel(99, 60), RED);
    Ok(())
}
