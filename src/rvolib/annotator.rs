use std::path::{Path, PathBuf};

use image::ImageFormat;
use tracing::{info, warn};

use crate::{
    annotations::read_annotations,
    cfg::Cfg,
    domain::Shape,
    font::{self, FontKind},
    render::{render_annotations, DrawnAnnotation, RenderStyle},
    result::{RvError, RvResult},
    rverr,
    types::ViewImage,
};

pub const DEFAULT_OUTPUT_PATH: &str = "annotated_output.jpg";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnotateReport {
    pub output_path: PathBuf,
    pub font: FontKind,
    pub drawn: Vec<DrawnAnnotation>,
    /// Recovered problems, i.e., skipped annotations and font fallbacks.
    pub warnings: Vec<RvError>,
}

pub fn read_image(path: &Path) -> RvResult<ViewImage> {
    image::io::Reader::open(path)
        .map_err(|e| rverr!(ImageNotFound, "could not open image {:?}, {:?}", path, e))?
        .with_guessed_format()
        .map_err(|e| rverr!(ImageNotFound, "could not read image {:?}, {:?}", path, e))?
        .decode()
        .map(|im| im.into_rgb8())
        .map_err(|e| rverr!(ImageNotFound, "could not decode image {:?}, {:?}", path, e))
}

/// The format follows the extension, unknown extensions are written as jpeg. Existing files are
/// overwritten.
pub fn save_image(im: &ViewImage, path: &Path) -> RvResult<()> {
    let format = ImageFormat::from_path(path).unwrap_or(ImageFormat::Jpeg);
    im.save_with_format(path, format)
        .map_err(|e| rverr!(Unexpected, "could not save image to {:?}, {:?}", path, e))
}

/// Draws the annotations of the json file onto a copy of the image and saves it. Nothing is
/// written if the image or the annotations cannot be loaded.
pub fn annotate(
    image_path: &Path,
    json_path: &Path,
    output_path: &Path,
    cfg: &Cfg,
) -> RvResult<AnnotateReport> {
    let mut im = read_image(image_path)?;
    let shape = Shape::from_im(&im);
    info!("loaded {:?} with shape {}x{}", image_path, shape.w, shape.h);

    let size = cfg.font_size.unwrap_or_else(|| font::font_size(shape.h));
    let candidates = font::candidate_paths(cfg.font_paths.as_deref());
    let (label_font, font_warning) = font::resolve_font(&candidates, size);
    if let Some(w) = &font_warning {
        warn!("{w}");
    }

    let annotations = read_annotations(json_path)?;
    info!("read {} annotations from {:?}", annotations.len(), json_path);

    let style = RenderStyle::from_cfg(cfg);
    let render_report = render_annotations(&mut im, &annotations, &label_font, &style);
    save_image(&im, output_path)?;
    info!("annotated image saved to {:?}", output_path);

    let warnings = font_warning
        .into_iter()
        .chain(render_report.warnings)
        .collect();
    Ok(AnnotateReport {
        output_path: output_path.to_path_buf(),
        font: label_font.kind(),
        drawn: render_report.drawn,
        warnings,
    })
}

#[cfg(test)]
use crate::result::ErrorKind;

#[test]
fn test_read_image_errors() {
    let err = read_image(Path::new("/does/not/exist.png")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ImageNotFound);
    let not_an_image = std::env::temp_dir().join("rvoverlay_not_an_image.png");
    std::fs::write(&not_an_image, "no pixels in here").unwrap();
    let err = read_image(&not_an_image).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ImageNotFound);
}

#[test]
fn test_save_formats() -> RvResult<()> {
    let folder = std::env::temp_dir().join("rvoverlay_save_formats");
    std::fs::create_dir_all(&folder).map_err(crate::result::to_rv)?;
    let im = ViewImage::from_pixel(16, 8, image::Rgb([10, 20, 30]));
    for (name, expected) in [
        ("a.png", ImageFormat::Png),
        ("a.jpg", ImageFormat::Jpeg),
        ("a.unknownext", ImageFormat::Jpeg),
        ("a", ImageFormat::Jpeg),
    ] {
        let path = folder.join(name);
        save_image(&im, &path)?;
        let format = image::io::Reader::open(&path)
            .and_then(|r| r.with_guessed_format())
            .map_err(crate::result::to_rv)?
            .format();
        assert_eq!(format, Some(expected), "{name}");
        let read = read_image(&path)?;
        assert_eq!(Shape::from_im(&read), Shape::new(16, 8));
    }
    Ok(())
}
