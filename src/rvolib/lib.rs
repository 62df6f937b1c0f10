#![forbid(unsafe_code)]

pub mod annotations;
pub mod annotator;
pub mod cfg;
pub mod demo;
pub mod domain;
pub mod file_util;
pub mod font;
pub mod render;
pub mod result;
pub mod tracing_setup;
pub mod types;
pub mod util;

pub use annotations::{read_annotations, Annotation, AnnotationSet};
pub use annotator::{annotate, AnnotateReport, DEFAULT_OUTPUT_PATH};
pub use domain::{BbNorm, Shape, BB};
pub use font::{FontKind, LabelFont};
pub use render::{DrawnAnnotation, RenderReport, RenderStyle};
pub use result::{ErrorKind, RvError, RvResult};
