use image::Rgb;
use imageproc::{drawing, rect::Rect};
use tracing::debug;

use crate::{
    annotations::AnnotationSet,
    cfg::Cfg,
    domain::{Shape, BB},
    font::LabelFont,
    result::{trace_ok_warn, RvError},
    types::ViewImage,
};

/// Gap between box and label as well as padding between label background and text.
pub const LABEL_MARGIN: i32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderStyle {
    pub box_color: Rgb<u8>,
    pub label_bg_color: Rgb<u8>,
    pub text_color: Rgb<u8>,
    pub stroke_width: u32,
}
impl RenderStyle {
    pub fn from_cfg(cfg: &Cfg) -> Self {
        RenderStyle {
            box_color: cfg.box_color(),
            label_bg_color: cfg.label_bg_color(),
            text_color: cfg.text_color(),
            stroke_width: cfg.stroke_width(),
        }
    }
}
impl Default for RenderStyle {
    fn default() -> Self {
        Self::from_cfg(&Cfg::default())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawnAnnotation {
    pub label: String,
    pub bb: BB,
    pub label_pos: (i32, i32),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderReport {
    pub drawn: Vec<DrawnAnnotation>,
    pub warnings: Vec<RvError>,
}

/// Top-left corner of the label background. The label sits above the box unless it would leave
/// the image at the top, then it goes below the box.
pub fn label_position(bb: &BB, font_size: u32) -> (i32, i32) {
    let y_above = bb.y.saturating_sub(font_size as i32 + LABEL_MARGIN);
    if y_above < 0 {
        (bb.x, bb.y.saturating_add(bb.h).saturating_add(LABEL_MARGIN))
    } else {
        (bb.x, y_above)
    }
}

/// Strokes grow from the outer edge of the box inwards.
pub fn draw_box(im: &mut ViewImage, bb: &BB, color: Rgb<u8>, stroke_width: u32) {
    for offset in 0..stroke_width as i32 {
        if let Some(stroke) = bb.inset(offset) {
            drawing::draw_hollow_rect_mut(im, stroke.to_rect(), color);
        }
    }
}

pub fn draw_label(
    im: &mut ViewImage,
    pos: (i32, i32),
    label: &str,
    font: &LabelFont,
    style: &RenderStyle,
) {
    let (text_w, text_h) = font.text_size(label);
    let margin = LABEL_MARGIN as u32;
    let background = Rect::at(pos.0, pos.1).of_size(text_w + 2 * margin, text_h + 2 * margin);
    drawing::draw_filled_rect_mut(im, background, style.label_bg_color);
    font.draw_text(
        im,
        style.text_color,
        pos.0 + LABEL_MARGIN,
        pos.1 + LABEL_MARGIN,
        label,
    );
}

/// Draws boxes and labels in the order of the annotations. Annotations without a valid bounding
/// box are skipped and reported as warnings.
pub fn render_annotations(
    im: &mut ViewImage,
    annotations: &AnnotationSet,
    font: &LabelFont,
    style: &RenderStyle,
) -> RenderReport {
    let shape = Shape::from_im(im);
    let mut report = RenderReport::default();
    for (idx, anno) in annotations.iter().enumerate() {
        let label = anno.label_text();
        let bb_norm = anno.bbox_norm().map_err(|e| {
            let msg = format!("skipping annotation {idx}, {e}");
            report.warnings.push(e);
            msg
        });
        let Some(bb_norm) = trace_ok_warn(bb_norm) else {
            continue;
        };
        let bb = bb_norm.to_pixels(shape);
        draw_box(im, &bb, style.box_color, style.stroke_width);
        let label_pos = label_position(&bb, font.size());
        draw_label(im, label_pos, label, font, style);
        debug!("drew '{label}' at {bb} with label at {label_pos:?}");
        report.drawn.push(DrawnAnnotation {
            label: label.to_string(),
            bb,
            label_pos,
        });
    }
    report
}

#[cfg(test)]
use crate::{
    annotations::Annotation,
    font::{resolve_font, FontKind, PLATFORM_FONT_CANDIDATES},
    result::ErrorKind,
    tracing_setup::init_tracing_for_tests,
};
#[cfg(test)]
use std::path::{Path, PathBuf};

#[cfg(test)]
const GRAY: Rgb<u8> = Rgb([128, 128, 128]);
#[cfg(test)]
const RED: Rgb<u8> = Rgb([255, 0, 0]);

#[test]
fn test_label_position() {
    let bb = BB::from_arr(&[50, 51, 183, 82]);
    assert_eq!(label_position(&bb, 12), (50, 37));
    let bb = BB::from_arr(&[50, 14, 100, 20]);
    assert_eq!(label_position(&bb, 12), (50, 0));
    let bb = BB::from_arr(&[50, 13, 100, 20]);
    assert_eq!(label_position(&bb, 12), (50, 35));
    let bb = BB::from_arr(&[7, 0, 10, 10]);
    assert_eq!(label_position(&bb, 30), (7, 12));
    let bb = BB::from_arr(&[0, 0, i32::MAX, i32::MAX]);
    assert_eq!(label_position(&bb, 12), (0, i32::MAX));
}

#[test]
fn test_draw_box() {
    init_tracing_for_tests();
    let mut im = ViewImage::from_pixel(40, 40, GRAY);
    let bb = BB::from_arr(&[5, 5, 10, 10]);
    draw_box(&mut im, &bb, RED, 2);
    for p in [(5, 5), (15, 15), (5, 15), (15, 5), (6, 6), (14, 14), (10, 6)] {
        assert_eq!(*im.get_pixel(p.0, p.1), RED, "{p:?}");
    }
    for p in [(4, 4), (7, 7), (10, 10), (16, 16), (13, 13)] {
        assert_eq!(*im.get_pixel(p.0, p.1), GRAY, "{p:?}");
    }
    // partially outside of the image
    draw_box(&mut im, &BB::from_arr(&[30, 30, 20, 20]), RED, 2);
    assert_eq!(*im.get_pixel(30, 39), RED);
    assert_eq!(*im.get_pixel(39, 30), RED);
}

#[test]
fn test_draw_label() {
    init_tracing_for_tests();
    let mut im = ViewImage::from_pixel(100, 40, GRAY);
    let font = LabelFont::Builtin { size: 8 };
    let style = RenderStyle::default();
    draw_label(&mut im, (10, 5), "ab", &font, &style);
    // background covers text plus margins, 2 * 8 + 4 wide and 8 + 4 high
    assert_eq!(*im.get_pixel(10, 5), RED);
    assert_eq!(*im.get_pixel(29, 16), RED);
    assert_eq!(*im.get_pixel(30, 16), GRAY);
    assert_eq!(*im.get_pixel(29, 17), GRAY);
    let mut n_white = 0;
    for (x, y, p) in im.enumerate_pixels() {
        if *p == style.text_color {
            assert!((12..28).contains(&x) && (7..15).contains(&y));
            n_white += 1;
        }
    }
    assert!(n_white > 0);
}

#[test]
fn test_render_annotations() {
    init_tracing_for_tests();
    let mut im = ViewImage::from_pixel(200, 100, GRAY);
    let annotations = AnnotationSet {
        annotations: vec![
            Annotation::new("icon", Some("first"), [0.1, 0.5, 0.2, 0.2]),
            Annotation {
                category: Some("broken".to_string()),
                label: None,
                bbox: Some(serde_json::json!([0.1, 0.2, 0.3])),
            },
            Annotation::new("widget", None, [0.5, 0.05, 0.1, 0.1]),
            Annotation {
                category: None,
                label: None,
                bbox: None,
            },
            Annotation {
                category: None,
                label: None,
                bbox: Some(serde_json::json!([0.0, 0.0, 0.5, 0.5])),
            },
        ],
    };
    let font = LabelFont::Builtin { size: 12 };
    let report = render_annotations(&mut im, &annotations, &font, &RenderStyle::default());
    let labels = report
        .drawn
        .iter()
        .map(|d| d.label.as_str())
        .collect::<Vec<_>>();
    assert_eq!(labels, vec!["first", "widget", "unknown"]);
    assert_eq!(report.drawn[0].bb, BB::from_arr(&[20, 50, 40, 20]));
    assert_eq!(report.drawn[0].label_pos, (20, 36));
    // too close to the top, label goes below
    assert_eq!(report.drawn[1].bb, BB::from_arr(&[100, 5, 20, 10]));
    assert_eq!(report.drawn[1].label_pos, (100, 17));
    assert_eq!(report.warnings.len(), 2);
    assert!(report
        .warnings
        .iter()
        .all(|w| w.kind() == ErrorKind::MalformedAnnotation));
    assert_eq!(*im.get_pixel(20, 50), RED);
    assert_eq!(*im.get_pixel(60, 70), RED);
}

#[test]
fn test_render_empty() {
    init_tracing_for_tests();
    let mut im = ViewImage::from_pixel(20, 20, GRAY);
    let font = LabelFont::Builtin { size: 12 };
    let report = render_annotations(
        &mut im,
        &AnnotationSet::default(),
        &font,
        &RenderStyle::default(),
    );
    assert_eq!(report, RenderReport::default());
    assert!(im.pixels().all(|p| *p == GRAY));
}

#[test]
fn test_render_huge_bbox() {
    init_tracing_for_tests();
    let mut im = ViewImage::from_pixel(100, 100, GRAY);
    let annotations = AnnotationSet {
        annotations: vec![
            Annotation::new("valid", None, [0.1, 0.5, 0.1, 0.1]),
            Annotation::new("huge", None, [0.1, 0.5, 1e9, 0.1]),
        ],
    };
    let font = LabelFont::Builtin { size: 12 };
    let report = render_annotations(&mut im, &annotations, &font, &RenderStyle::default());
    assert!(report.warnings.is_empty());
    assert_eq!(report.drawn.len(), 2);
    assert_eq!(report.drawn[0].bb, BB::from_arr(&[10, 50, 10, 10]));
    assert_eq!(report.drawn[1].bb, BB::from_arr(&[10, 50, 200, 10]));
    // the huge box runs to the right border of the image
    assert_eq!(*im.get_pixel(99, 60), RED);
}

#[test]
fn test_truetype_label() {
    init_tracing_for_tests();
    let Some(path) = PLATFORM_FONT_CANDIDATES
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
    else {
        return;
    };
    let (font, warning) = resolve_font(&[PathBuf::from(path)], 12);
    assert!(warning.is_none());
    assert_eq!(font.kind(), FontKind::TrueType(path.to_path_buf()));
    assert_eq!(font.size(), 12);
    let (text_w, text_h) = font.text_size("Settings");
    assert!(text_w > 0 && text_h > 0);

    let mut im = ViewImage::from_pixel(200, 60, GRAY);
    let style = RenderStyle::default();
    draw_label(&mut im, (10, 20), "Settings", &font, &style);
    assert_eq!(*im.get_pixel(10, 20), style.label_bg_color);
    let (bg_w, bg_h) = (text_w + 4, text_h + 4);
    assert_eq!(*im.get_pixel(10 + bg_w - 1, 20 + bg_h - 1), style.label_bg_color);
    assert_eq!(*im.get_pixel(10 + bg_w, 20), GRAY);
    // anti-aliased glyphs blend the text color into the background
    let n_text_pixels = (20..20 + bg_h)
        .flat_map(|y| (10..10 + bg_w).map(move |x| (x, y)))
        .filter(|(x, y)| *im.get_pixel(*x, *y) != style.label_bg_color)
        .count();
    assert!(n_text_pixels > 0);
}
