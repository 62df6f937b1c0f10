use image::GenericImageView;
use imageproc::rect::Rect;
use std::fmt::Display;

use crate::{result::RvError, rverr};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shape {
    pub w: u32,
    pub h: u32,
}
impl Shape {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }
    pub fn from_im<I>(im: &I) -> Self
    where
        I: GenericImageView,
    {
        Self {
            w: im.width(),
            h: im.height(),
        }
    }
}

/// Bounding box in pixel coordinates. Corners `(x, y)` and `(x + w, y + h)` are both part of
/// the box. Coordinates may lie outside of the image, drawing clips them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct BB {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}
impl BB {
    pub fn from_arr(a: &[i32; 4]) -> Self {
        BB {
            x: a[0],
            y: a[1],
            w: a[2],
            h: a[3],
        }
    }
    pub fn min(&self) -> (i32, i32) {
        (self.x, self.y)
    }
    pub fn max(&self) -> (i32, i32) {
        (self.x.saturating_add(self.w), self.y.saturating_add(self.h))
    }
    /// Box shrunk by `offset` pixels on each side, `None` if nothing is left.
    pub fn inset(&self, offset: i32) -> Option<Self> {
        let (w, h) = (self.w - 2 * offset, self.h - 2 * offset);
        if w < 0 || h < 0 {
            None
        } else {
            Some(BB {
                x: self.x + offset,
                y: self.y + offset,
                w,
                h,
            })
        }
    }
    /// Rectangle covering all pixels of the box including both corners.
    pub fn to_rect(&self) -> Rect {
        Rect::at(self.x, self.y).of_size(
            self.w.saturating_add(1).max(1) as u32,
            self.h.saturating_add(1).max(1) as u32,
        )
    }
}
impl Display for BB {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (x_max, y_max) = self.max();
        write!(f, "({}, {})-({}, {})", self.x, self.y, x_max, y_max)
    }
}

/// Bounding box relative to the image width and height. `x` and `y` denote the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct BbNorm {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}
impl BbNorm {
    pub fn from_arr(a: &[f64; 4]) -> Self {
        BbNorm {
            x: a[0],
            y: a[1],
            w: a[2],
            h: a[3],
        }
    }
    /// Coordinates are clamped to a band around the image, `[-w, 2w]` for x and `[-h, 2h]` for
    /// y, and sizes to `[0, 2w]` and `[0, 2h]`. Values far off the image would only be clipped
    /// while drawing anyway.
    pub fn to_pixels(&self, shape: Shape) -> BB {
        let (w, h) = (shape.w as f64, shape.h as f64);
        let to_px = |v: f64, min: f64, max: f64| v.round().clamp(min, max) as i32;
        BB {
            x: to_px(self.x * w, -w, 2.0 * w),
            y: to_px(self.y * h, -h, 2.0 * h),
            w: to_px(self.w * w, 0.0, 2.0 * w),
            h: to_px(self.h * h, 0.0, 2.0 * h),
        }
    }
}
impl TryFrom<&serde_json::Value> for BbNorm {
    type Error = RvError;
    fn try_from(value: &serde_json::Value) -> Result<Self, Self::Error> {
        let elts = value
            .as_array()
            .ok_or_else(|| rverr!(MalformedAnnotation, "bbox {} is not an array", value))?;
        if elts.len() != 4 {
            return Err(rverr!(
                MalformedAnnotation,
                "bbox {} has {} elements instead of 4",
                value,
                elts.len()
            ));
        }
        let mut coords = [0.0; 4];
        for (c, elt) in coords.iter_mut().zip(elts) {
            *c = elt
                .as_f64()
                .ok_or_else(|| rverr!(MalformedAnnotation, "bbox {} is not numeric", value))?;
        }
        Ok(Self::from_arr(&coords))
    }
}

#[cfg(test)]
use crate::result::ErrorKind;
#[cfg(test)]
use serde_json::json;

#[test]
fn test_bb() {
    let bb = BB::from_arr(&[10, 10, 10, 5]);
    assert_eq!(bb.min(), (10, 10));
    assert_eq!(bb.max(), (20, 15));
    assert_eq!(bb.inset(1), Some(BB::from_arr(&[11, 11, 8, 3])));
    assert_eq!(bb.inset(3), None);
    let rect = bb.to_rect();
    assert_eq!((rect.left(), rect.top()), (10, 10));
    assert_eq!((rect.right(), rect.bottom()), (20, 15));
    assert_eq!(format!("{bb}"), "(10, 10)-(20, 15)");
    let rect = BB::from_arr(&[3, 4, 0, 0]).to_rect();
    assert_eq!((rect.width(), rect.height()), (1, 1));
    let bb = BB::from_arr(&[10, 10, i32::MAX, i32::MAX]);
    assert_eq!(bb.max(), (i32::MAX, i32::MAX));
    let rect = bb.to_rect();
    assert_eq!((rect.width(), rect.height()), (i32::MAX as u32, i32::MAX as u32));
}

#[test]
fn test_to_pixels() {
    let shape = Shape::new(1000, 800);
    let bb = BbNorm::from_arr(&[0.05, 0.064, 0.183, 0.103]).to_pixels(shape);
    assert_eq!(bb, BB::from_arr(&[50, 51, 183, 82]));
    assert_eq!(bb.max(), (233, 133));
    let bb = BbNorm::from_arr(&[0.0, 0.0, 1.0, 1.0]).to_pixels(shape);
    assert_eq!(bb, BB::from_arr(&[0, 0, 1000, 800]));
    let bb = BbNorm::from_arr(&[0.1, 0.1, -0.2, 0.0]).to_pixels(shape);
    assert_eq!(bb, BB::from_arr(&[100, 80, 0, 0]));
    for (x, y, w, h) in [(0.3333, 0.25, 0.5, 0.125), (0.0015, 0.9999, 0.0, 0.0001)] {
        let bb = BbNorm { x, y, w, h }.to_pixels(shape);
        assert!((bb.x as f64 - x * 1000.0).abs() <= 0.5);
        assert!((bb.y as f64 - y * 800.0).abs() <= 0.5);
        assert!((bb.max().0 as f64 - (x + w) * 1000.0).abs() <= 1.0);
        assert!((bb.max().1 as f64 - (y + h) * 800.0).abs() <= 1.0);
    }
}

#[test]
fn test_to_pixels_out_of_range() {
    let shape = Shape::new(100, 100);
    let bb = BbNorm::from_arr(&[0.1, 0.5, 1e9, 0.1]).to_pixels(shape);
    assert_eq!(bb, BB::from_arr(&[10, 50, 200, 10]));
    assert_eq!(bb.max(), (210, 60));
    let bb = BbNorm::from_arr(&[-1e12, 1e12, f64::MAX, -f64::MAX]).to_pixels(shape);
    assert_eq!(bb, BB::from_arr(&[-100, 200, 200, 0]));
    let bb = BbNorm::from_arr(&[-0.5, 1.5, 0.5, 0.5]).to_pixels(shape);
    assert_eq!(bb, BB::from_arr(&[-50, 150, 50, 50]));
}

#[test]
fn test_bbnorm_from_json() {
    let bb = BbNorm::try_from(&json!([0.1, 0.2, 0.3, 0.4])).unwrap();
    assert_eq!(bb, BbNorm::from_arr(&[0.1, 0.2, 0.3, 0.4]));
    let bb = BbNorm::try_from(&json!([0, 1, 0, 1])).unwrap();
    assert_eq!(bb, BbNorm::from_arr(&[0.0, 1.0, 0.0, 1.0]));
    for malformed in [
        json!([0.1, 0.2, 0.3]),
        json!([0.1, 0.2, 0.3, 0.4, 0.5]),
        json!([0.1, "0.2", 0.3, 0.4]),
        json!({"x": 0.1}),
        json!(null),
    ] {
        let err = BbNorm::try_from(&malformed).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedAnnotation);
    }
}
