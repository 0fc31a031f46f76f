use async_trait::async_trait;

use super::{ImageCdn, ImageUpload, UploadedImage};
use crate::errors::AppResult;
use crate::images::encode_data_uri;

/// Keeps uploads as base64 data URIs on the listing itself
#[derive(Debug, Default, Clone)]
pub struct InlineImageStore;

#[async_trait]
impl ImageCdn for InlineImageStore {
    fn name(&self) -> &'static str {
        "inline"
    }

    async fn upload(&self, upload: ImageUpload) -> AppResult<UploadedImage> {
        Ok(UploadedImage {
            url: encode_data_uri(&upload.mime_type, &upload.bytes),
            public_id: None,
        })
    }

    async fn upload_reference(&self, reference: &str) -> AppResult<UploadedImage> {
        Ok(UploadedImage {
            url: reference.to_string(),
            public_id: None,
        })
    }

    async fn delete(&self, _public_id: &str) -> AppResult<()> {
        Ok(())
    }

    fn thumbnail_url(&self, _public_id: &str) -> Option<String> {
        None
    }

    fn is_hosted(&self, url: &str) -> bool {
        url.starts_with("data:")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_upload_becomes_data_uri() {
        let store = InlineImageStore;
        let uploaded = store
            .upload(ImageUpload {
                filename: "a.png".to_string(),
                mime_type: "image/png".to_string(),
                bytes: Bytes::from_static(b"abc"),
            })
            .await
            .unwrap();
        assert_eq!(uploaded.url, "data:image/png;base64,YWJj");
        assert!(uploaded.public_id.is_none());
        assert!(store.is_hosted(&uploaded.url));
    }
}
