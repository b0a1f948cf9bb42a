use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("File not found. path: {0:?}")]
    NotFound(PathBuf),
    #[error("IO error. path: {path:?}, cause: {cause}")]
    Io { path: PathBuf, cause: std::io::Error },
    #[error("Unable to parse file. path: {path:?}, cause: {cause}")]
    Parse { path: PathBuf, cause: serde_json::Error },
}

impl FileError {
    fn from_io(path: &Path, cause: std::io::Error) -> Self {
        match cause.kind() {
            ErrorKind::NotFound => FileError::NotFound(path.to_path_buf()),
            _ => FileError::Io {
                path: path.to_path_buf(),
                cause,
            },
        }
    }
}

pub fn load<T: DeserializeOwned>(file_path: &Path) -> Result<T, FileError> {
    let file = File::open(file_path).map_err(|cause| FileError::from_io(file_path, cause))?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|cause| match cause.is_io() {
        true => FileError::from_io(file_path, cause.into()),
        false => FileError::Parse {
            path: file_path.to_path_buf(),
            cause,
        },
    })
}

/// Pretty-printed, 4-space indent, with a trailing newline.
///
/// The content is written to a temporary file next to `file_path` which then replaces it, an existing file is
/// left untouched if writing fails.
pub fn save<T: Serialize>(t: &T, file_path: &Path) -> Result<(), FileError> {
    let io_error = |cause: std::io::Error| FileError::from_io(file_path, cause);

    let directory = match file_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let temp_file = NamedTempFile::new_in(directory).map_err(io_error)?;

    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(BufWriter::new(temp_file), formatter);
    t.serialize(&mut ser)
        .map_err(|cause| io_error(cause.into()))?;

    let mut writer = ser.into_inner();
    writer.write_all(b"\n").map_err(io_error)?;
    let temp_file = writer
        .into_inner()
        .map_err(|error| io_error(error.into_error()))?;

    temp_file
        .persist(file_path)
        .map_err(|error| io_error(error.error))?;

    Ok(())
}
