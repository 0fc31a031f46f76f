//! Image CDN clients
//!
//! Listing images are uploaded through an [`ImageCdn`]. With credentials configured this
//! is [`CloudinaryCdn`]; otherwise [`InlineImageStore`] keeps uploads inside the listing
//! as data URIs.

pub mod cloudinary;
pub mod inline;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

pub use cloudinary::CloudinaryCdn;
pub use inline::InlineImageStore;

/// MIME types accepted for listing uploads
pub const ACCEPTED_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

/// An uploaded file as received from the client
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

impl ImageUpload {
    /// Check size and content type; the MIME type is sniffed from the bytes
    pub fn validated(filename: impl Into<String>, bytes: Bytes, max_size: usize) -> AppResult<Self> {
        let filename = filename.into();
        if bytes.is_empty() {
            return Err(AppError::validation(format!("Uploaded file '{filename}' is empty")));
        }
        if bytes.len() > max_size {
            return Err(AppError::validation(format!(
                "Uploaded file '{filename}' is {} bytes, the limit is {max_size}",
                bytes.len()
            )));
        }

        let mime_type = infer::get(&bytes).map(|kind| kind.mime_type());
        match mime_type {
            Some(mime) if ACCEPTED_MIME_TYPES.contains(&mime) => Ok(Self {
                filename,
                mime_type: mime.to_string(),
                bytes,
            }),
            _ => Err(AppError::validation(format!(
                "Uploaded file '{filename}' is not a JPEG, PNG or WebP image"
            ))),
        }
    }
}

/// Where an image ended up after upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    pub url: String,
    pub public_id: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageCdn: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Upload a client file
    async fn upload(&self, upload: ImageUpload) -> AppResult<UploadedImage>;

    /// Re-host an existing reference (remote URL or data URI)
    async fn upload_reference(&self, reference: &str) -> AppResult<UploadedImage>;

    async fn delete(&self, public_id: &str) -> AppResult<()>;

    /// Small cover rendition for list views
    fn thumbnail_url(&self, public_id: &str) -> Option<String>;

    /// Whether `url` is already served by this CDN
    fn is_hosted(&self, url: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::transcode::tests::png_fixture;

    #[test]
    fn test_upload_validation() {
        let png = Bytes::from(png_fixture(4, 4));
        let upload = ImageUpload::validated("a.png", png.clone(), 1024 * 1024).unwrap();
        assert_eq!(upload.mime_type, "image/png");

        assert!(ImageUpload::validated("a.png", png, 10).is_err());
        assert!(ImageUpload::validated("a.txt", Bytes::from_static(b"hello"), 1024).is_err());
        assert!(ImageUpload::validated("a.gif", Bytes::from_static(b"GIF89a......"), 1024).is_err());
        assert!(ImageUpload::validated("empty", Bytes::new(), 1024).is_err());
    }
}
