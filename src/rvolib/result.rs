use std::{
    error::Error,
    fmt::{self, Debug, Display, Formatter},
};
use tracing::{error, warn};

/// Malformed annotations and font load failures are reported as warnings, all other kinds abort a
/// run.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum ErrorKind {
    ImageNotFound,
    AnnotationFileNotFound,
    InvalidJson,
    MalformedAnnotation,
    FontLoadFailure,
    Unexpected,
}
impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let s = match self {
            Self::ImageNotFound => "image not found",
            Self::AnnotationFileNotFound => "annotation file not found",
            Self::InvalidJson => "invalid json",
            Self::MalformedAnnotation => "malformed annotation",
            Self::FontLoadFailure => "font load failure",
            Self::Unexpected => "unexpected failure",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug)]
pub struct RvError {
    kind: ErrorKind,
    msg: String,
}
impl RvError {
    pub fn new(kind: ErrorKind, msg: &str) -> RvError {
        RvError {
            kind,
            msg: msg.to_string(),
        }
    }
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
    pub fn msg(&self) -> &str {
        &self.msg
    }
}
impl Display for RvError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.msg)
    }
}
impl Error for RvError {}
impl From<&str> for RvError {
    fn from(value: &str) -> Self {
        RvError::new(ErrorKind::Unexpected, value)
    }
}
pub type RvResult<U> = Result<U, RvError>;

pub fn trace_ok_err<T, E>(x: Result<T, E>) -> Option<T>
where
    E: Debug,
{
    match x {
        Ok(x) => Some(x),
        Err(e) => {
            error!("{e:?}");
            None
        }
    }
}
pub fn trace_ok_warn<T, E>(x: Result<T, E>) -> Option<T>
where
    E: Debug,
{
    match x {
        Ok(x) => Some(x),
        Err(e) => {
            warn!("{e:?}");
            None
        }
    }
}
/// Creates an [`RvError`](RvError) of the given kind with a formatted message.
/// ```rust
/// use rvolib::{rverr, result::{ErrorKind, RvError}};
/// assert_eq!(
///     rverr!(InvalidJson, "some error {}", 1),
///     RvError::new(ErrorKind::InvalidJson, "some error 1")
/// );
/// ```
#[macro_export]
macro_rules! rverr {
    ($kind:ident, $s:literal) => {
        $crate::result::RvError::new($crate::result::ErrorKind::$kind, format!($s).as_str())
    };
    ($kind:ident, $s:literal, $( $exps:expr ),*) => {
        $crate::result::RvError::new(
            $crate::result::ErrorKind::$kind,
            format!($s, $($exps,)*).as_str()
        )
    }
}

pub fn to_rv<E: Debug>(e: E) -> RvError {
    rverr!(
        Unexpected,
        "original error type is '{:?}', error message is '{:?}'",
        std::any::type_name::<E>(),
        e
    )
}

#[test]
fn test_display() {
    let e = rverr!(ImageNotFound, "could not open {:?}", "a.png");
    assert_eq!(e.kind(), ErrorKind::ImageNotFound);
    assert_eq!(e.msg(), "could not open \"a.png\"");
    assert_eq!(format!("{e}"), "image not found: could not open \"a.png\"");
    let e = to_rv(std::io::Error::new(std::io::ErrorKind::Other, "x"));
    assert_eq!(e.kind(), ErrorKind::Unexpected);
    assert_eq!(RvError::from("y").kind(), ErrorKind::Unexpected);
}

#[test]
fn test_trace_ok() {
    assert_eq!(trace_ok_warn::<_, RvError>(Ok(3)), Some(3));
    assert_eq!(trace_ok_warn::<u8, _>(Err(rverr!(MalformedAnnotation, "x"))), None);
    assert_eq!(trace_ok_err::<u8, _>(Err("y")), None);
}
