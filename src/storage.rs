// SPDX-License-Identifier: GPL-3.0-only

//! Photo library backed by a directory
//!
//! Photos are written as `IMG_<timestamp>.<ext>` into the user's pictures
//! directory (`~/Pictures/Camera` by default).

use crate::backends::camera::{CapturedPhoto, PhotoLibrary};
use crate::errors::PhotoError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Get default photo directory
pub fn get_default_photo_dir(folder: &str) -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join(folder)
}

/// Photo library writing into one directory
#[derive(Debug, Clone)]
pub struct DirectoryPhotoLibrary {
    dir: PathBuf,
}

impl DirectoryPhotoLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// First free `IMG_<timestamp>[_n].<ext>` path in the directory
    fn next_path(&self, extension: &str) -> PathBuf {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let mut path = self.dir.join(format!("IMG_{}.{}", timestamp, extension));
        let mut n = 1;
        while path.exists() {
            path = self
                .dir
                .join(format!("IMG_{}_{}.{}", timestamp, n, extension));
            n += 1;
        }
        path
    }
}

impl PhotoLibrary for DirectoryPhotoLibrary {
    fn save(&self, photo: &CapturedPhoto) -> Result<PathBuf, PhotoError> {
        std::fs::create_dir_all(&self.dir)?;

        let path = self.next_path(photo.codec.extension());
        debug!(path = %path.display(), bytes = photo.data.len(), "Writing photo");

        std::fs::write(&path, &photo.data)
            .map_err(|e| PhotoError::SaveFailed(format!("{}: {}", path.display(), e)))?;

        info!(path = %path.display(), "Photo saved successfully");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::PhotoCodec;

    #[test]
    fn test_save_writes_bytes_with_codec_extension() {
        let dir = std::env::temp_dir().join(format!("shutter-storage-{}", uuid::Uuid::new_v4()));
        let library = DirectoryPhotoLibrary::new(&dir);
        let photo = CapturedPhoto {
            request_id: uuid::Uuid::new_v4(),
            data: vec![1, 2, 3],
            codec: PhotoCodec::Png,
            width: 1,
            height: 1,
        };

        let first = library.save(&photo).unwrap();
        let second = library.save(&photo).unwrap();

        assert_ne!(first, second, "same-second saves must not overwrite");
        assert_eq!(first.extension().unwrap(), "png");
        assert_eq!(std::fs::read(&first).unwrap(), vec![1, 2, 3]);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
