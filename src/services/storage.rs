//! Local filesystem storage for uploaded wastage images.
//!
//! Images are stored under `<web_root>/uploads/wastage/<challan_id>/` with
//! generated names, and served back through actix-files at the same relative
//! URL that gets persisted on the record.

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::UploadedImage;

/// URL prefix and directory (relative to the web root) for stored images.
pub const UPLOADS_PREFIX: &str = "uploads/wastage";

/// Extensions accepted for image uploads (lowercase).
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

/// Per-file size ceiling: 10 MiB.
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Image store rooted at the configured web root.
#[derive(Clone)]
pub struct ImageStore {
    web_root: PathBuf,
}

impl ImageStore {
    pub fn new(web_root: impl Into<PathBuf>) -> Self {
        Self {
            web_root: web_root.into(),
        }
    }

    /// Persist a batch of uploaded images under the challan's directory.
    ///
    /// Files with a disallowed extension, zero length, or exceeding
    /// [`MAX_IMAGE_SIZE`] are skipped, as is any file whose write fails;
    /// partial success is normal. Returns one relative URL per stored file,
    /// in input order.
    pub async fn save_images(
        &self,
        images: &[UploadedImage],
        challan_id: &str,
    ) -> AppResult<Vec<String>> {
        if images.is_empty() {
            return Ok(Vec::new());
        }

        let dir = self.web_root.join(UPLOADS_PREFIX).join(challan_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::FileSystem(format!("Failed to create upload directory: {}", e)))?;

        let mut urls = Vec::new();

        for image in images {
            if image.data.is_empty() {
                warn!("Skipping empty upload: {}", image.filename);
                continue;
            }

            let Some(ext) = allowed_extension(&image.filename) else {
                warn!("Skipping upload with invalid file type: {}", image.filename);
                continue;
            };

            if image.data.len() > MAX_IMAGE_SIZE {
                warn!(
                    "Skipping oversized upload {} ({} bytes)",
                    image.filename,
                    image.data.len()
                );
                continue;
            }

            // Fresh name per file; never derived from the client filename
            let file_name = format!("{}.{}", Uuid::new_v4(), ext);
            let path = dir.join(&file_name);

            match tokio::fs::write(&path, &image.data).await {
                Ok(()) => {
                    let url = format!("/{}/{}/{}", UPLOADS_PREFIX, challan_id, file_name);
                    info!("Image saved: {}", url);
                    urls.push(url);
                }
                Err(e) => {
                    error!("Failed to save image {}: {}", image.filename, e);
                }
            }
        }

        Ok(urls)
    }

    /// Best-effort removal of previously stored images.
    ///
    /// A missing file is not an error; other failures are logged per file and
    /// never abort the batch.
    pub async fn delete_images(&self, urls: &[String]) {
        for url in urls {
            let path = self.web_root.join(url.trim_start_matches('/'));

            match tokio::fs::remove_file(&path).await {
                Ok(()) => info!("Image deleted: {}", url),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => error!("Failed to delete image {}: {}", url, e),
            }
        }
    }
}

/// Return the lowercase extension when it is on the allow-list.
fn allowed_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?.to_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}
