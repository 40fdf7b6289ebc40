use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use smilegen_logging::smile_info;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::{ClientError, DataUrlError, ExpressionApi, ResultImage};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("cannot decode result image: {0}")]
    Decode(#[from] DataUrlError),
    #[error("cannot download result image: {0}")]
    Download(#[from] ClientError),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// Atomically write content to `{dir}/{filename}` by writing a temp file then renaming.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

/// Writes a result image to `{dir}/{filename}`, downloading hosted results first.
pub async fn save_result(
    api: &dyn ExpressionApi,
    image: &ResultImage,
    dir: &Path,
    filename: &str,
) -> Result<PathBuf, PersistError> {
    let bytes = match image {
        ResultImage::Inline(data_url) => data_url.decode()?,
        ResultImage::Remote(url) => api.fetch_remote(url).await?,
    };
    let path = AtomicFileWriter::new(dir.to_path_buf()).write(filename, &bytes)?;
    smile_info!("Saved result ({} bytes) to {:?}", bytes.len(), path);
    Ok(path)
}
