//! Local file handling for attachments
//!
//! Outgoing files are inspected against the upload size policy before they
//! are attached to a draft, and read into memory only when the message is
//! sent. Downloads are written to a temporary file in the target directory
//! and moved into place under a sanitized, non-clobbering name.

use log::info;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::api::{ApiClient, OutboundFile};
use crate::error::{ApiError, validate_attachment_size};

/// A local file selected for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftFile {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
}

impl DraftFile {
    /// Inspect a file on disk and check it against the size limit
    pub fn inspect(path: impl AsRef<Path>) -> Result<Self, ApiError> {
        let path = path.as_ref();
        let metadata = fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(ApiError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a file", path.display()),
            )));
        }
        validate_attachment_size(metadata.len())?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());

        Ok(Self {
            path: path.to_path_buf(),
            file_name,
            size: metadata.len(),
        })
    }

    /// Read the file for upload, re-checking the size limit
    pub fn load(&self) -> Result<OutboundFile, ApiError> {
        let data = fs::read(&self.path)?;
        validate_attachment_size(data.len() as u64)?;
        Ok(OutboundFile {
            file_name: self.file_name.clone(),
            data,
        })
    }
}

/// Download an attachment into `dir`, named after its display name.
///
/// Returns the path written. An existing file is never overwritten; a
/// " (n)" suffix is added instead.
pub fn download_attachment(
    client: &ApiClient,
    stored_name: &str,
    display_name: &str,
    dir: &Path,
) -> Result<PathBuf, ApiError> {
    let data = client.download_file(stored_name)?;
    let path = write_download(dir, display_name, &data)?;
    info!("Saved {} ({} bytes) to {}", display_name, data.len(), path.display());
    Ok(path)
}

fn write_download(dir: &Path, display_name: &str, data: &[u8]) -> std::io::Result<PathBuf> {
    fs::create_dir_all(dir)?;

    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(data)?;
    temp.flush()?;

    let name = sanitize_file_name(display_name);
    let mut attempt = 0;
    loop {
        let target = dir.join(numbered_name(&name, attempt));
        match temp.persist_noclobber(&target) {
            Ok(_) => return Ok(target),
            Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists && attempt < 1000 => {
                temp = e.file;
                attempt += 1;
            }
            Err(e) => return Err(e.error),
        }
    }
}

/// Reduce a server-supplied name to a single safe path component
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| match c {
            ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "download".to_string()
    } else {
        cleaned
    }
}

fn numbered_name(name: &str, n: u32) -> String {
    if n == 0 {
        return name.to_string();
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{} ({}).{}", stem, n, ext),
        _ => format!("{} ({})", name, n),
    }
}
