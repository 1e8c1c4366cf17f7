//! Encoded-image transport consumed by imports, exports and diff packing.

mod image_rs;

pub use image_rs::ImageRsCodec;

use crate::foundation::error::AnvilResult;

/// Raw-RGBA8 to encoded-bytes codec.
///
/// The transport format is opaque to the engine: the only contract is that
/// each encode/decode pair round-trips for matching dimensions. The default
/// implementation ([`ImageRsCodec`]) is lossless in both formats.
pub trait ImageCodec {
    /// Encode `4 * w * h` RGBA8 bytes as WebP.
    fn raw_to_webp(&self, rgba: &[u8], width: u32, height: u32) -> AnvilResult<Vec<u8>>;

    /// Decode WebP bytes back to exactly `4 * w * h` RGBA8 bytes.
    fn webp_to_raw(&self, bytes: &[u8], width: u32, height: u32) -> AnvilResult<Vec<u8>>;

    /// Encode `4 * w * h` RGBA8 bytes as PNG.
    fn raw_to_png(&self, rgba: &[u8], width: u32, height: u32) -> AnvilResult<Vec<u8>>;

    /// Decode PNG bytes back to exactly `4 * w * h` RGBA8 bytes.
    fn png_to_raw(&self, bytes: &[u8], width: u32, height: u32) -> AnvilResult<Vec<u8>>;
}
