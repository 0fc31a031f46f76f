//! Where an image's bytes come from

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use sha2::{Digest, Sha256};

use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Remote http(s) image
    Url(String),
    /// `data:<mime>;base64,<payload>`
    DataUri(String),
    /// Raw encoded bytes, e.g. a fresh upload
    Bytes(Bytes),
}

impl ImageSource {
    /// Interpret a stored image reference
    pub fn parse(reference: &str) -> AppResult<Self> {
        let reference = reference.trim();
        if reference.starts_with("data:") {
            return Ok(Self::DataUri(reference.to_string()));
        }

        match url::Url::parse(reference) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
                Ok(Self::Url(reference.to_string()))
            }
            _ => Err(AppError::validation(format!(
                "Unsupported image reference '{}'",
                truncate(reference, 64)
            ))),
        }
    }

    /// Short SHA-256 fingerprint of the source, stable across requests
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        match self {
            Self::Url(url) => hasher.update(url.as_bytes()),
            Self::DataUri(uri) => hasher.update(uri.as_bytes()),
            Self::Bytes(bytes) => hasher.update(bytes),
        }
        hex::encode(&hasher.finalize()[..8])
    }
}

/// Split a base64 data URI into its declared MIME type and decoded payload
pub fn decode_data_uri(uri: &str) -> AppResult<(String, Bytes)> {
    let malformed = || AppError::validation("Malformed data URI");

    let rest = uri.strip_prefix("data:").ok_or_else(malformed)?;
    let (header, payload) = rest.split_once(',').ok_or_else(malformed)?;
    let mime = header.strip_suffix(";base64").ok_or_else(malformed)?;
    let mime = if mime.is_empty() {
        "application/octet-stream"
    } else {
        mime
    };

    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(cleaned).map_err(|_| malformed())?;
    Ok((mime.to_string(), Bytes::from(bytes)))
}

/// Encode bytes as a base64 data URI
pub fn encode_data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

fn truncate(value: &str, max: usize) -> &str {
    match value.char_indices().nth(max) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_references() {
        assert!(matches!(
            ImageSource::parse("https://res.cloudinary.com/x/image/upload/a.jpg").unwrap(),
            ImageSource::Url(_)
        ));
        assert!(matches!(
            ImageSource::parse("data:image/png;base64,AAAA").unwrap(),
            ImageSource::DataUri(_)
        ));
        assert!(ImageSource::parse("/uploads/a.jpg").is_err());
        assert!(ImageSource::parse("ftp://host/a.jpg").is_err());
    }

    #[test]
    fn test_data_uri_round_trip() {
        let uri = encode_data_uri("image/png", b"\x89PNG");
        let (mime, bytes) = decode_data_uri(&uri).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(&bytes[..], b"\x89PNG");
    }

    #[test]
    fn test_malformed_data_uris() {
        assert!(decode_data_uri("data:image/png,plain").is_err());
        assert!(decode_data_uri("data:image/png;base64").is_err());
        assert!(decode_data_uri("data:image/png;base64,***").is_err());
    }

    #[test]
    fn test_fingerprint_depends_on_source() {
        let a = ImageSource::Url("https://a/1.jpg".to_string());
        let b = ImageSource::Url("https://a/2.jpg".to_string());
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 16);
    }
}
