use crate::{
    file_util::{self, DEFAULT_HOMEDIR},
    result::{to_rv, RvResult},
    rverr,
};
use image::Rgb;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CFG_DEFAULT: &str = r#"
    # font_paths = ["/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf"]
    # font_size = 14
    box_color = [255, 0, 0]
    label_bg_color = [255, 0, 0]
    text_color = [255, 255, 255]
    stroke_width = 2
    # log_folder =
    "#;

pub fn get_default_cfg() -> Cfg {
    toml::from_str(CFG_DEFAULT).expect("default config broken")
}

pub fn get_cfg_path() -> PathBuf {
    DEFAULT_HOMEDIR.join("rvo_cfg.toml")
}

pub fn get_log_folder(cfg: &Cfg) -> PathBuf {
    match &cfg.log_folder {
        Some(lf) => lf.clone(),
        None => DEFAULT_HOMEDIR.join("logs"),
    }
}

/// Reads the config from the given path. Missing files yield the defaults.
pub fn read_cfg(cfg_toml_path: &Path) -> RvResult<Cfg> {
    if cfg_toml_path.exists() {
        let toml_str = file_util::read_to_string(cfg_toml_path)?;
        toml::from_str(&toml_str)
            .map_err(|e| rverr!(Unexpected, "could not parse cfg {:?}, {}", cfg_toml_path, e))
    } else {
        Ok(get_default_cfg())
    }
}

pub fn get_cfg() -> RvResult<Cfg> {
    read_cfg(&get_cfg_path())
}

pub fn write_cfg(cfg: &Cfg, cfg_path: &Path) -> RvResult<()> {
    let cfg_str = toml::to_string_pretty(cfg).map_err(to_rv)?;
    file_util::write(cfg_path, cfg_str)
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Cfg {
    /// Candidate fonts tried in order, overrides the platform defaults. An empty list selects the
    /// built-in bitmap font directly.
    pub font_paths: Option<Vec<PathBuf>>,
    /// Overrides the size derived from the image height.
    pub font_size: Option<u32>,
    box_color: Option<[u8; 3]>,
    label_bg_color: Option<[u8; 3]>,
    text_color: Option<[u8; 3]>,
    stroke_width: Option<u32>,
    pub log_folder: Option<PathBuf>,
}

impl Cfg {
    pub fn box_color(&self) -> Rgb<u8> {
        Rgb(self.box_color.unwrap_or([255, 0, 0]))
    }
    pub fn label_bg_color(&self) -> Rgb<u8> {
        Rgb(self.label_bg_color.unwrap_or([255, 0, 0]))
    }
    pub fn text_color(&self) -> Rgb<u8> {
        Rgb(self.text_color.unwrap_or([255, 255, 255]))
    }
    pub fn stroke_width(&self) -> u32 {
        self.stroke_width.unwrap_or(2)
    }
}

#[test]
fn test_default_cfg() {
    let cfg = get_default_cfg();
    assert_eq!(cfg.font_paths, None);
    assert_eq!(cfg.font_size, None);
    assert_eq!(cfg.box_color(), Rgb([255, 0, 0]));
    assert_eq!(cfg.label_bg_color(), Rgb([255, 0, 0]));
    assert_eq!(cfg.text_color(), Rgb([255, 255, 255]));
    assert_eq!(cfg.stroke_width(), 2);
    assert_eq!(get_log_folder(&cfg), DEFAULT_HOMEDIR.join("logs"));
}

#[test]
fn test_partial_cfg() {
    let cfg: Cfg = toml::from_str(
        r#"
        font_paths = []
        text_color = [0, 0, 0]
        "#,
    )
    .unwrap();
    assert_eq!(cfg.font_paths, Some(vec![]));
    assert_eq!(cfg.text_color(), Rgb([0, 0, 0]));
    assert_eq!(cfg.box_color(), Rgb([255, 0, 0]));
    assert_eq!(cfg.stroke_width(), 2);
    assert_eq!(Cfg::default().stroke_width(), 2);
}

#[test]
fn test_write_read_cfg() -> RvResult<()> {
    let path = std::env::temp_dir()
        .join("rvoverlay_cfg_test")
        .join("rvo_cfg.toml");
    let mut cfg = get_default_cfg();
    cfg.font_size = Some(20);
    cfg.stroke_width = Some(3);
    cfg.log_folder = Some(PathBuf::from("some/logs"));
    write_cfg(&cfg, &path)?;
    let cfg_read = read_cfg(&path)?;
    assert_eq!(cfg, cfg_read);
    assert_eq!(get_log_folder(&cfg_read), PathBuf::from("some/logs"));
    let missing = std::env::temp_dir().join("rvoverlay_cfg_test").join("missing.toml");
    assert_eq!(read_cfg(&missing)?, get_default_cfg());
    Ok(())
}
