//! Decode, downscale and re-encode image bytes

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use strum::{Display, EnumString};

use crate::errors::{AppError, AppResult};

/// Requested output encoding
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Keep the source encoding
    #[default]
    Original,
    #[strum(to_string = "jpeg", serialize = "jpg")]
    Jpeg,
    Png,
    Webp,
}

/// Width, quality and format of a rendered image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageVariant {
    pub width: Option<u32>,
    pub quality: u8,
    pub format: OutputFormat,
}

impl ImageVariant {
    /// Build a variant from request parameters. Width is capped at `max_width` and zero
    /// means "keep"; quality is clamped into 1..=100.
    pub fn from_params(
        width: Option<u32>,
        quality: Option<u8>,
        format: Option<&str>,
        default_quality: u8,
        max_width: u32,
    ) -> AppResult<Self> {
        let format = match format.map(str::trim).filter(|f| !f.is_empty()) {
            Some(raw) => raw.parse::<OutputFormat>().map_err(|_| {
                AppError::validation(format!(
                    "Invalid image format '{raw}': expected jpeg, png, webp or original"
                ))
            })?,
            None => OutputFormat::Original,
        };

        Ok(Self {
            width: width.filter(|w| *w > 0).map(|w| w.min(max_width.max(1))),
            quality: quality.unwrap_or(default_quality).clamp(1, 100),
            format,
        })
    }

    /// Whether rendering would leave the source untouched
    pub fn is_passthrough(&self) -> bool {
        self.width.is_none() && self.format == OutputFormat::Original
    }

    pub fn cache_suffix(&self) -> String {
        let width = self
            .width
            .map_or_else(|| "orig".to_string(), |w| w.to_string());
        format!("w{width}-q{}-{}", self.quality, self.format)
    }
}

/// Result of transcoding: encoded bytes plus MIME type
#[derive(Debug, Clone)]
pub struct Encoded {
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// MIME type sniffed from the content itself
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    infer::get(bytes)
        .map(|kind| kind.mime_type())
        .unwrap_or("application/octet-stream")
}

/// Decode `source`, downscale to the requested width when it is narrower than the
/// source, and encode in the requested format. Images are never upscaled.
pub fn transcode(source: &[u8], variant: &ImageVariant) -> Result<Encoded, image::ImageError> {
    let source_format = image::guess_format(source)?;
    let mut img = image::load_from_memory_with_format(source, source_format)?;

    if let Some(width) = variant.width {
        if width < img.width() {
            img = img.resize(width, img.height(), FilterType::Triangle);
        }
    }

    let target = match variant.format {
        OutputFormat::Original => source_format,
        OutputFormat::Jpeg => ImageFormat::Jpeg,
        OutputFormat::Png => ImageFormat::Png,
        OutputFormat::Webp => ImageFormat::WebP,
    };

    encode(&img, target, variant.quality)
}

fn encode(img: &DynamicImage, format: ImageFormat, quality: u8) -> Result<Encoded, image::ImageError> {
    let mut bytes = Vec::new();
    match format {
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
            rgb.write_with_encoder(encoder)?;
        }
        ImageFormat::WebP => {
            // The WebP encoder is lossless and only takes 8-bit RGB(A)
            let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
            rgba.write_to(&mut Cursor::new(&mut bytes), ImageFormat::WebP)?;
        }
        other => {
            img.write_to(&mut Cursor::new(&mut bytes), other)?;
        }
    }

    Ok(Encoded {
        mime_type: format.to_mime_type(),
        bytes,
    })
}
