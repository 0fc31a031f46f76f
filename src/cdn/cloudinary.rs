//! Cloudinary upload API client
//!
//! Uploads and deletions use signed requests: the parameters are sorted by name, joined as
//! `k=v&k=v`, the API secret is appended and the result is hashed with SHA-256.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

use super::{ImageCdn, ImageUpload, UploadedImage};
use crate::config::CdnConfig;
use crate::errors::{AppError, AppResult};

const SERVICE: &str = "cloudinary";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct CloudinaryCdn {
    config: CdnConfig,
    http_client: Client,
}

impl CloudinaryCdn {
    pub fn new(config: CdnConfig, timeout: Duration) -> AppResult<Self> {
        if config.cloud_name.trim().is_empty()
            || config.api_key.trim().is_empty()
            || config.api_secret.trim().is_empty()
        {
            return Err(AppError::configuration(
                "cdn.cloud_name, cdn.api_key and cdn.api_secret are required",
            ));
        }

        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            config,
            http_client,
        })
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/{}/image/{action}",
            self.config.api_base.trim_end_matches('/'),
            self.config.cloud_name
        )
    }

    fn delivery_prefix(&self) -> String {
        format!(
            "{}/{}/",
            self.config.delivery_base.trim_end_matches('/'),
            self.config.cloud_name
        )
    }

    /// Hex SHA-256 over the sorted parameters followed by the API secret
    pub fn sign(params: &BTreeMap<&str, String>, api_secret: &str) -> String {
        let to_sign = params
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn upload_params(&self) -> BTreeMap<&'static str, String> {
        let mut params = BTreeMap::new();
        params.insert("folder", self.config.folder.clone());
        params.insert("timestamp", chrono::Utc::now().timestamp().to_string());
        if !self.config.upload_transformation.is_empty() {
            params.insert("transformation", self.config.upload_transformation.clone());
        }
        params
    }

    fn signed_form(&self, params: BTreeMap<&'static str, String>) -> Form {
        let signature = Self::sign(&params, &self.config.api_secret);
        let mut form = Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key, value);
        }
        form
    }

    async fn send_upload(&self, form: Form) -> AppResult<UploadedImage> {
        let response = self
            .http_client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::external_service(SERVICE, format!("upload failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorResponse>()
                .await
                .map(|body| body.error.message)
                .unwrap_or_else(|_| status.to_string());
            return Err(AppError::external_service(
                SERVICE,
                format!("upload rejected: {message}"),
            ));
        }

        let body: UploadResponse = response.json().await.map_err(|e| {
            AppError::external_service(SERVICE, format!("unexpected upload response: {e}"))
        })?;
        debug!(public_id = %body.public_id, "image uploaded to cloudinary");

        Ok(UploadedImage {
            url: body.secure_url,
            public_id: Some(body.public_id),
        })
    }
}

#[async_trait]
impl ImageCdn for CloudinaryCdn {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn upload(&self, upload: ImageUpload) -> AppResult<UploadedImage> {
        let part = Part::bytes(upload.bytes.to_vec())
            .file_name(upload.filename)
            .mime_str(&upload.mime_type)?;
        let form = self.signed_form(self.upload_params()).part("file", part);
        self.send_upload(form).await
    }

    async fn upload_reference(&self, reference: &str) -> AppResult<UploadedImage> {
        let form = self
            .signed_form(self.upload_params())
            .text("file", reference.to_string());
        self.send_upload(form).await
    }

    async fn delete(&self, public_id: &str) -> AppResult<()> {
        let mut params = BTreeMap::new();
        params.insert("public_id", public_id.to_string());
        params.insert("timestamp", chrono::Utc::now().timestamp().to_string());

        let response = self
            .http_client
            .post(self.endpoint("destroy"))
            .multipart(self.signed_form(params))
            .send()
            .await
            .map_err(|e| AppError::external_service(SERVICE, format!("destroy failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::external_service(
                SERVICE,
                format!("destroy {public_id} returned {status}"),
            ));
        }

        let body: DestroyResponse = response.json().await.map_err(|e| {
            AppError::external_service(SERVICE, format!("unexpected destroy response: {e}"))
        })?;
        match body.result.as_str() {
            "ok" => Ok(()),
            "not found" => {
                warn!(public_id, "cloudinary asset already gone");
                Ok(())
            }
            other => Err(AppError::external_service(
                SERVICE,
                format!("destroy {public_id}: {other}"),
            )),
        }
    }

    fn thumbnail_url(&self, public_id: &str) -> Option<String> {
        Some(format!(
            "{}image/upload/{}/{public_id}",
            self.delivery_prefix(),
            self.config.thumbnail_transformation
        ))
    }

    fn is_hosted(&self, url: &str) -> bool {
        url.starts_with(&self.delivery_prefix())
    }
}
