use std::{
    fmt::{self, Display, Formatter},
    fs,
    path::{Path, PathBuf},
};

use font8x8::{UnicodeFonts, BASIC_FONTS, GREEK_FONTS, HIRAGANA_FONTS, LATIN_FONTS};
use image::Rgb;
use imageproc::{drawing, rect::Rect};
use rusttype::{point, Font, Scale};
use tracing::{debug, info};

use crate::{
    result::{RvError, RvResult},
    rverr,
    types::ViewImage,
};

#[cfg(target_os = "windows")]
pub const PLATFORM_FONT_CANDIDATES: &[&str] = &[
    "C:/Windows/Fonts/simhei.ttf",
    "C:/Windows/Fonts/msyh.ttc",
    "C:/Windows/Fonts/arial.ttf",
];
#[cfg(target_os = "macos")]
pub const PLATFORM_FONT_CANDIDATES: &[&str] = &[
    "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
    "/Library/Fonts/Arial Unicode.ttf",
];
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub const PLATFORM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
];

const MIN_FONT_SIZE: u32 = 12;
const FONT_SIZE_PER_IMAGE_HEIGHT: f64 = 0.015;

// drawn for characters the bitmap font does not know
const MISSING_GLYPH: [u8; 8] = [0x7E, 0x42, 0x42, 0x42, 0x42, 0x42, 0x7E, 0x00];
const BITMAP_GLYPH_SIZE: u32 = 8;

pub fn font_size(image_height: u32) -> u32 {
    let size = (image_height as f64 * FONT_SIZE_PER_IMAGE_HEIGHT).round() as u32;
    size.max(MIN_FONT_SIZE)
}

/// Explicitly configured paths win over the platform candidates.
pub fn candidate_paths(configured: Option<&[PathBuf]>) -> Vec<PathBuf> {
    match configured {
        Some(paths) => paths.to_vec(),
        None => PLATFORM_FONT_CANDIDATES.iter().map(PathBuf::from).collect(),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FontKind {
    TrueType(PathBuf),
    Builtin,
}
impl Display for FontKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::TrueType(p) => write!(f, "truetype font {p:?}"),
            Self::Builtin => f.write_str("built-in bitmap font"),
        }
    }
}

/// Glyph renderer for the labels with its point size.
pub enum LabelFont {
    TrueType {
        font: Font<'static>,
        path: PathBuf,
        size: u32,
    },
    Builtin {
        size: u32,
    },
}

impl LabelFont {
    pub fn size(&self) -> u32 {
        match self {
            Self::TrueType { size, .. } | Self::Builtin { size } => *size,
        }
    }

    pub fn kind(&self) -> FontKind {
        match self {
            Self::TrueType { path, .. } => FontKind::TrueType(path.clone()),
            Self::Builtin { .. } => FontKind::Builtin,
        }
    }

    /// Each bitmap pixel becomes a square block of this side length.
    fn bitmap_scale(size: u32) -> u32 {
        ((size as f32 / BITMAP_GLYPH_SIZE as f32).round() as u32).max(1)
    }

    /// Width and height in pixels of the rendered text.
    pub fn text_size(&self, text: &str) -> (u32, u32) {
        match self {
            Self::TrueType { font, size, .. } => {
                let scale = Scale::uniform(*size as f32);
                let v_metrics = font.v_metrics(scale);
                let width = font
                    .layout(text, scale, point(0.0, v_metrics.ascent))
                    .filter_map(|g| g.pixel_bounding_box())
                    .map(|bb| bb.max.x)
                    .max()
                    .unwrap_or(0)
                    .max(0);
                let height = (v_metrics.ascent - v_metrics.descent).ceil() as u32;
                (width as u32, height)
            }
            Self::Builtin { size } => {
                let block = Self::bitmap_scale(*size) * BITMAP_GLYPH_SIZE;
                (text.chars().count() as u32 * block, block)
            }
        }
    }

    /// Draws the text with its top-left corner at `(x, y)`. Pixels outside of the image are
    /// ignored.
    pub fn draw_text(&self, im: &mut ViewImage, color: Rgb<u8>, x: i32, y: i32, text: &str) {
        match self {
            Self::TrueType { font, size, .. } => {
                let scale = Scale::uniform(*size as f32);
                drawing::draw_text_mut(im, color, x, y, scale, font, text);
            }
            Self::Builtin { size } => {
                let scale = Self::bitmap_scale(*size);
                let advance = (scale * BITMAP_GLYPH_SIZE) as i32;
                for (char_idx, c) in text.chars().enumerate() {
                    let x_char = x + char_idx as i32 * advance;
                    for (row_idx, row) in bitmap_glyph(c).iter().enumerate() {
                        for bit in 0..BITMAP_GLYPH_SIZE {
                            if (row >> bit) & 1 != 0 {
                                let block = Rect::at(
                                    x_char + (bit * scale) as i32,
                                    y + row_idx as i32 * scale as i32,
                                )
                                .of_size(scale, scale);
                                drawing::draw_filled_rect_mut(im, block, color);
                            }
                        }
                    }
                }
            }
        }
    }
}

fn bitmap_glyph(c: char) -> [u8; 8] {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| GREEK_FONTS.get(c))
        .or_else(|| HIRAGANA_FONTS.get(c))
        .unwrap_or(MISSING_GLYPH)
}

pub fn load_truetype(path: &Path) -> RvResult<Font<'static>> {
    let bytes = fs::read(path)
        .map_err(|e| rverr!(FontLoadFailure, "could not read font {:?} due to {:?}", path, e))?;
    Font::try_from_vec(bytes)
        .ok_or_else(|| rverr!(FontLoadFailure, "{:?} does not contain a usable font", path))
}

/// Tries the candidates in order and falls back to the built-in bitmap font. The fallback comes
/// with a warning.
pub fn resolve_font(candidates: &[PathBuf], size: u32) -> (LabelFont, Option<RvError>) {
    for path in candidates {
        match load_truetype(path) {
            Ok(font) => {
                info!("using font {:?} with size {}", path, size);
                return (
                    LabelFont::TrueType {
                        font,
                        path: path.clone(),
                        size,
                    },
                    None,
                );
            }
            Err(e) => debug!("{e}"),
        }
    }
    let warning = rverr!(
        FontLoadFailure,
        "none of the fonts {:?} could be loaded, falling back to the built-in font",
        candidates
    );
    (LabelFont::Builtin { size }, Some(warning))
}

#[cfg(test)]
use crate::result::ErrorKind;

#[test]
fn test_font_size() {
    assert_eq!(font_size(0), 12);
    assert_eq!(font_size(800), 12);
    assert_eq!(font_size(1000), 15);
    assert_eq!(font_size(2000), 30);
}

#[test]
fn test_candidates() {
    let platform = candidate_paths(None);
    assert_eq!(platform.len(), PLATFORM_FONT_CANDIDATES.len());
    assert_eq!(platform[0], PathBuf::from(PLATFORM_FONT_CANDIDATES[0]));
    let configured = vec![PathBuf::from("a.ttf"), PathBuf::from("b.ttf")];
    assert_eq!(candidate_paths(Some(configured.as_slice())), configured);
    assert!(candidate_paths(Some(&[][..])).is_empty());
}

#[test]
fn test_resolve_fallback() {
    let not_a_font = std::env::temp_dir().join("rvoverlay_not_a_font.ttf");
    fs::write(&not_a_font, b"certainly not a font").unwrap();
    let candidates = vec![PathBuf::from("/does/not/exist.ttf"), not_a_font];
    let (font, warning) = resolve_font(&candidates, 17);
    assert_eq!(font.kind(), FontKind::Builtin);
    assert_eq!(font.size(), 17);
    assert_eq!(warning.unwrap().kind(), ErrorKind::FontLoadFailure);
    let (font, warning) = resolve_font(&[], 12);
    assert_eq!(font.kind(), FontKind::Builtin);
    assert!(warning.is_some());
}

#[test]
fn test_builtin_text_size() {
    let font = LabelFont::Builtin { size: 12 };
    assert_eq!(font.text_size("Settings"), (8 * 16, 16));
    assert_eq!(font.text_size(""), (0, 16));
    assert_eq!(font.text_size("设置"), (2 * 16, 16));
    let font = LabelFont::Builtin { size: 5 };
    assert_eq!(font.text_size("ab"), (16, 8));
}

#[test]
fn test_builtin_draw() {
    let mut im = ViewImage::new(64, 32);
    let white = Rgb([255, 255, 255]);
    let font = LabelFont::Builtin { size: 8 };
    font.draw_text(&mut im, white, 2, 2, "A");
    let n_white = im.pixels().filter(|p| **p == white).count();
    assert!(n_white > 0);
    // nothing outside of the glyph cell
    for (x, y, p) in im.enumerate_pixels() {
        if *p == white {
            assert!((2..10).contains(&x) && (2..10).contains(&y));
        }
    }
    // clipped without panicking
    font.draw_text(&mut im, white, -4, 28, "AB");
    font.draw_text(&mut im, white, 60, -100, "AB");
}
