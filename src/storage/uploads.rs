//! Item image files
//!
//! Images live as plain files under the configured upload root. Items only
//! record a reference of the form `<url_prefix>/<file name>`; this module maps
//! references back to paths and owns creating and removing the files.

use std::io;
use std::path::{Path, PathBuf};

use crate::config::UploadConfig;

#[derive(Debug, Clone)]
pub struct Uploads {
    root: PathBuf,
    url_prefix: String,
}

impl Uploads {
    /// Create the upload root if needed
    pub fn open(config: &UploadConfig) -> io::Result<Self> {
        std::fs::create_dir_all(&config.root)?;
        Ok(Self {
            root: config.root.clone(),
            url_prefix: config.url_prefix.trim_end_matches('/').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write an uploaded file under a random name and return its reference.
    ///
    /// The extension of the client-supplied name is kept when it is short and
    /// alphanumeric; nothing else from that name reaches the filesystem.
    pub fn store(&self, bytes: &[u8], original_name: Option<&str>) -> io::Result<String> {
        let mut file_name = uuid::Uuid::new_v4().simple().to_string();
        if let Some(ext) = original_name.and_then(safe_extension) {
            file_name.push('.');
            file_name.push_str(&ext);
        }

        std::fs::write(self.root.join(&file_name), bytes)?;
        tracing::debug!(file = %file_name, size = bytes.len(), "Stored uploaded image");

        Ok(format!("{}/{}", self.url_prefix, file_name))
    }

    /// Resolve a reference to a path under the root.
    ///
    /// Only the last segment of the reference is used, so a reference can
    /// never point outside the root. Returns `None` for empty references.
    pub fn path_for(&self, image_ref: &str) -> Option<PathBuf> {
        let file_name = image_ref.rsplit('/').next()?;
        if file_name.is_empty() || file_name == "." || file_name == ".." {
            return None;
        }
        Some(self.root.join(file_name))
    }

    /// Whether a file currently exists for the reference
    pub fn exists(&self, image_ref: &str) -> bool {
        self.path_for(image_ref).is_some_and(|path| path.is_file())
    }

    /// Delete the file behind a reference. Returns `false` if there was none.
    pub fn remove(&self, image_ref: &str) -> io::Result<bool> {
        let Some(path) = self.path_for(image_ref) else {
            return Ok(false);
        };
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

fn safe_extension(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
