//! Plain-text file reading for note ingestion.
//!
//! Notes are ingested as whole UTF-8 text files; there is no need for
//! memory-mapped access or a write path back out to the filesystem.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Maximum file size to read into memory (1GB).
const MAX_FILE_SIZE: u64 = 1024 * 1024 * 1024;

struct FileReader {
    file: File,
    size: u64,
    path: String,
}

impl FileReader {
    fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let path_str = path_ref.to_string_lossy().to_string();

        if !path_ref.exists() {
            return Err(Error::Io(io::Error::new(io::ErrorKind::NotFound, format!("file not found: {path_str}"))));
        }

        let file = File::open(path_ref).map_err(Error::Io)?;
        let metadata = file.metadata().map_err(Error::Io)?;
        let size = metadata.len();

        if size > MAX_FILE_SIZE {
            return Err(Error::Io(io::Error::other(format!(
                "file too large: {size} bytes (max: {MAX_FILE_SIZE} bytes)"
            ))));
        }

        Ok(Self { file, size, path: path_str })
    }

    #[allow(clippy::cast_possible_truncation)]
    fn read_to_string(&self) -> Result<String> {
        let mut file = &self.file;
        let mut buffer = Vec::with_capacity(self.size as usize);
        file.read_to_end(&mut buffer).map_err(Error::Io)?;
        String::from_utf8(buffer).map_err(|e| Error::Io(io::Error::other(format!("invalid UTF-8 in {}: {e}", self.path))))
    }
}

/// Reads a file to string.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid UTF-8.
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<String> {
    FileReader::open(path)?.read_to_string()
}
