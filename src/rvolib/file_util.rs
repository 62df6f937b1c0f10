use crate::{result::RvResult, rverr};
use lazy_static::lazy_static;
use std::{
    ffi::OsStr,
    fmt::Debug,
    fs, io,
    path::{Path, PathBuf},
};

lazy_static! {
    pub static ref DEFAULT_HOMEDIR: PathBuf = match dirs::home_dir() {
        Some(p) => p.join(".rvoverlay"),
        _ => std::env::temp_dir().join("rvoverlay"),
    };
}

pub fn read_to_string<P>(p: P) -> RvResult<String>
where
    P: AsRef<Path> + Debug,
{
    fs::read_to_string(&p)
        .map_err(|e| rverr!(Unexpected, "could not read {:?} due to {:?}", p, e))
}

/// Writes the file and creates missing parent folders.
pub fn write<P, C>(path: P, contents: C) -> RvResult<()>
where
    P: AsRef<Path> + Debug,
    C: AsRef<[u8]>,
{
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| rverr!(Unexpected, "could not create {:?} due to {:?}", parent, e))?;
        }
    }
    fs::write(&path, contents)
        .map_err(|e| rverr!(Unexpected, "could not write {:?} due to {:?}", path, e))
}

pub fn osstr_to_str(p: Option<&OsStr>) -> io::Result<&str> {
    p.ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{p:?} not found")))?
        .to_str()
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{p:?} not convertible to unicode"),
            )
        })
}

pub fn path_to_str(p: &Path) -> RvResult<&str> {
    osstr_to_str(Some(p.as_os_str()))
        .map_err(|e| rverr!(Unexpected, "could not transform '{:?}' due to '{:?}'", p, e))
}

#[test]
fn test_write_read() -> RvResult<()> {
    let folder = std::env::temp_dir().join("rvoverlay_file_util_test").join("nested");
    let path = folder.join("some.txt");
    write(&path, "some content")?;
    assert_eq!(read_to_string(&path)?, "some content");
    assert_eq!(path_to_str(&path)?, path.to_str().unwrap());
    fs::remove_dir_all(folder).map_err(crate::result::to_rv)?;
    Ok(())
}
