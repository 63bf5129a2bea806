//! File image loading for preview media placeholders.

use std::path::{Path, PathBuf};

use image::DynamicImage;

/// Loads referenced image files relative to the document's directory.
#[derive(Debug, Clone)]
pub struct MediaLoader {
    base_path: PathBuf,
}

impl MediaLoader {
    /// Create a loader with the given base path for relative srcs.
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Load an image file; `None` when the file is missing or undecodable
    /// (the placeholder line stays visible in that case).
    pub fn load(&self, src: &str) -> Option<DynamicImage> {
        image::open(self.resolve_path(src)).ok()
    }

    fn resolve_path(&self, src: &str) -> PathBuf {
        let path = Path::new(src);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(path)
        }
    }
}
