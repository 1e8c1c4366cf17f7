use std::io::Cursor;

use anyhow::Context;
use image_webp::{WebPDecoder, WebPEncoder};

use crate::{
    codec::ImageCodec,
    foundation::color::pixel_byte_len,
    foundation::error::{AnvilError, AnvilResult},
};

/// Default codec: lossless WebP via `image_webp`, PNG via `image`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageRsCodec;

impl ImageCodec for ImageRsCodec {
    fn raw_to_webp(&self, rgba: &[u8], width: u32, height: u32) -> AnvilResult<Vec<u8>> {
        expect_raw_len(rgba, width, height)?;
        let mut out = Vec::new();
        WebPEncoder::new(&mut out)
            .encode(rgba, width, height, image_webp::ColorType::Rgba8)
            .context("encode rgba as webp")?;
        Ok(out)
    }

    fn webp_to_raw(&self, bytes: &[u8], width: u32, height: u32) -> AnvilResult<Vec<u8>> {
        let mut decoder = WebPDecoder::new(Cursor::new(bytes))
            .map_err(|e| AnvilError::decode(format!("webp header: {e}")))?;

        let (dw, dh) = decoder.dimensions();
        if (dw, dh) != (width, height) {
            return Err(AnvilError::decode(format!(
                "webp dimensions {dw}x{dh} do not match expected {width}x{height}"
            )));
        }

        let len = decoder
            .output_buffer_size()
            .ok_or_else(|| AnvilError::decode("webp output size overflow".to_string()))?;
        let mut data = vec![0u8; len];
        decoder
            .read_image(&mut data)
            .map_err(|e| AnvilError::decode(format!("webp payload: {e}")))?;

        if decoder.has_alpha() {
            Ok(data)
        } else {
            Ok(expand_rgb_to_rgba(&data))
        }
    }

    fn raw_to_png(&self, rgba: &[u8], width: u32, height: u32) -> AnvilResult<Vec<u8>> {
        expect_raw_len(rgba, width, height)?;
        let img = image::RgbaImage::from_raw(width, height, rgba.to_vec())
            .ok_or_else(|| AnvilError::validation("png encode dimensions overflow"))?;
        let mut out = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .context("encode rgba as png")?;
        Ok(out)
    }

    fn png_to_raw(&self, bytes: &[u8], width: u32, height: u32) -> AnvilResult<Vec<u8>> {
        let dyn_img = image::load_from_memory_with_format(bytes, image::ImageFormat::Png)
            .map_err(|e| AnvilError::decode(format!("png payload: {e}")))?;
        let rgba = dyn_img.to_rgba8();
        let (dw, dh) = rgba.dimensions();
        if (dw, dh) != (width, height) {
            return Err(AnvilError::decode(format!(
                "png dimensions {dw}x{dh} do not match expected {width}x{height}"
            )));
        }
        Ok(rgba.into_raw())
    }
}

fn expect_raw_len(rgba: &[u8], width: u32, height: u32) -> AnvilResult<()> {
    let expected = pixel_byte_len(width, height);
    if rgba.len() != expected {
        return Err(AnvilError::BufferSizeMismatch {
            expected,
            actual: rgba.len(),
        });
    }
    Ok(())
}

fn expand_rgb_to_rgba(rgb: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rgb.len() / 3 * 4);
    for px in rgb.chunks_exact(3) {
        out.extend_from_slice(&[px[0], px[1], px[2], 255]);
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/codec.rs"]
mod tests;
