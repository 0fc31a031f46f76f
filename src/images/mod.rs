//! Image resize proxy
//!
//! Turns a stored image reference (remote URL, data URI or raw upload) into bytes of a
//! requested width, quality and format. Rendered variants live in the
//! [`ImageCache`](crate::cache::ImageCache); anything that cannot be decoded is served
//! as-is.

pub mod proxy;
pub mod source;
pub mod transcode;

pub use proxy::{ImageProxy, RenderedImage};
pub use source::{decode_data_uri, encode_data_uri, ImageSource};
pub use transcode::{sniff_mime, ImageVariant, OutputFormat};
