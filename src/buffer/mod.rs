//! The authoritative RGBA8 pixel grid.
//!
//! All pixel mutation goes through [`PixelBuffer`] so ownership of the bytes
//! is unambiguous. Coordinates are signed at the API edge: out-of-range
//! reads are transparent black, out-of-range writes are no-ops, and
//! rectangle operations clip.

mod blit;
mod effects;
mod fill;

pub use blit::{Antialias, BlitOptions};
pub use effects::DitherMode;
pub use fill::MaskMode;

use tracing::debug;

use crate::{
    codec::ImageCodec,
    foundation::color::{Rgba8, TRANSPARENT, pixel_byte_len},
    foundation::error::{AnvilError, AnvilResult},
};

/// Row-major, unpadded RGBA8 pixel grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// All-transparent buffer of the given size.
    pub fn new(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer {
            width,
            height,
            data: vec![0u8; pixel_byte_len(width, height)],
        }
    }

    /// Buffer adopting `bytes` as its contents.
    pub fn from_raw(width: u32, height: u32, bytes: Vec<u8>) -> AnvilResult<PixelBuffer> {
        let expected = pixel_byte_len(width, height);
        if bytes.len() != expected {
            return Err(AnvilError::BufferSizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }
        Ok(PixelBuffer {
            width,
            height,
            data: bytes,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Byte length of the backing storage (`width * height * 4`).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the buffer covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Read-only view of the raw bytes.
    ///
    /// The view is only valid until the next mutation; callers must not
    /// cache it across writes or resizes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// True when `(x, y)` addresses a pixel inside the buffer.
    pub fn is_in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    fn byte_index(&self, x: i32, y: i32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    /// Color at `(x, y)`; transparent black outside the buffer.
    pub fn get(&self, x: i32, y: i32) -> Rgba8 {
        if !self.is_in_bounds(x, y) {
            return TRANSPARENT;
        }
        let idx = self.byte_index(x, y);
        let mut px = [0u8; 4];
        px.copy_from_slice(&self.data[idx..idx + 4]);
        px
    }

    /// Write `color` at `(x, y)`.
    ///
    /// Out-of-range coordinates are a no-op returning `false`; otherwise the
    /// return value reports whether any channel actually changed.
    pub fn set(&mut self, x: i32, y: i32, color: Rgba8) -> bool {
        if !self.is_in_bounds(x, y) {
            return false;
        }
        let idx = self.byte_index(x, y);
        let px = &mut self.data[idx..idx + 4];
        let changed = px != color;
        px.copy_from_slice(&color);
        changed
    }

    /// Color at byte offset `idx`; transparent black past the end.
    pub fn index_get(&self, idx: usize) -> Rgba8 {
        if idx + 4 > self.data.len() {
            return TRANSPARENT;
        }
        let mut px = [0u8; 4];
        px.copy_from_slice(&self.data[idx..idx + 4]);
        px
    }

    /// Write `color` at byte offset `idx`; reports whether bytes changed.
    pub fn index_set(&mut self, idx: usize, color: Rgba8) -> bool {
        if idx + 4 > self.data.len() {
            return false;
        }
        let px = &mut self.data[idx..idx + 4];
        let changed = px != color;
        px.copy_from_slice(&color);
        changed
    }

    /// Write `color` to every pixel.
    pub fn fill(&mut self, color: Rgba8) {
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&color);
        }
    }

    /// Copy the rectangle into a fresh `w * h * 4` buffer.
    ///
    /// Out-of-range source pixels read as transparent black. A zero-area
    /// rectangle yields an empty vector.
    pub fn read_rect(&self, x: i32, y: i32, width: u32, height: u32) -> Vec<u8> {
        if width == 0 || height == 0 {
            return Vec::new();
        }

        let src_w = i64::from(self.width);
        let src_h = i64::from(self.height);
        let x = i64::from(x);
        let y = i64::from(y);
        let mut out = vec![0u8; pixel_byte_len(width, height)];

        for row in 0..i64::from(height) {
            let sy = y + row;
            if sy < 0 || sy >= src_h {
                continue;
            }

            let start_col = (-x).clamp(0, i64::from(width));
            let end_col = (src_w - x).clamp(0, i64::from(width));
            if start_col >= end_col {
                continue;
            }

            let copy_len = ((end_col - start_col) * 4) as usize;
            let dst_off = ((row * i64::from(width) + start_col) * 4) as usize;
            let src_off = ((sy * src_w + x + start_col) * 4) as usize;
            out[dst_off..dst_off + copy_len]
                .copy_from_slice(&self.data[src_off..src_off + copy_len]);
        }

        out
    }

    /// Write `src` into the rectangle, clipping to the buffer.
    ///
    /// `src` must span exactly `w * h * 4` bytes.
    pub fn write_rect(
        &mut self,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        src: &[u8],
    ) -> AnvilResult<()> {
        let expected = pixel_byte_len(width, height);
        if src.len() != expected {
            return Err(AnvilError::BufferSizeMismatch {
                expected,
                actual: src.len(),
            });
        }
        if width == 0 || height == 0 {
            return Ok(());
        }

        let dst_w = i64::from(self.width);
        let dst_h = i64::from(self.height);
        let x = i64::from(x);
        let y = i64::from(y);

        for row in 0..i64::from(height) {
            let dy = y + row;
            if dy < 0 || dy >= dst_h {
                continue;
            }

            let start_col = (-x).clamp(0, i64::from(width));
            let end_col = (dst_w - x).clamp(0, i64::from(width));
            if start_col >= end_col {
                continue;
            }

            let copy_len = ((end_col - start_col) * 4) as usize;
            let src_off = ((row * i64::from(width) + start_col) * 4) as usize;
            let dst_off = ((dy * dst_w + x + start_col) * 4) as usize;
            self.data[dst_off..dst_off + copy_len]
                .copy_from_slice(&src[src_off..src_off + copy_len]);
        }

        Ok(())
    }

    /// Bulk scatter write: `coords` holds `(x, y)` pairs, `colors` one RGBA
    /// quad per pair. In-bounds pairs are written, the rest skipped.
    pub fn write_pixels(&mut self, coords: &[u32], colors: &[u8]) -> AnvilResult<()> {
        if !coords.len().is_multiple_of(2) || colors.len() != coords.len() * 2 {
            return Err(AnvilError::BufferSizeMismatch {
                expected: coords.len() * 2,
                actual: colors.len(),
            });
        }

        for (pair, px) in coords.chunks_exact(2).zip(colors.chunks_exact(4)) {
            let (x, y) = (pair[0], pair[1]);
            if x >= self.width || y >= self.height {
                continue;
            }
            let idx = (y as usize * self.width as usize + x as usize) * 4;
            self.data[idx..idx + 4].copy_from_slice(px);
        }

        Ok(())
    }

    /// Crop and translate in one step.
    ///
    /// Allocates a zeroed `new_w` x `new_h` grid and copies the overlap so
    /// that the source pixel at `(src_origin_x, src_origin_y)` lands at
    /// `(dest_origin_x, dest_origin_y)`. Origins are floored; uncovered
    /// areas stay transparent.
    pub fn resize_with_origins(
        &mut self,
        new_width: u32,
        new_height: u32,
        src_origin_x: f32,
        src_origin_y: f32,
        dest_origin_x: f32,
        dest_origin_y: f32,
    ) {
        let old_w = i64::from(self.width);
        let old_h = i64::from(self.height);
        let new_w = i64::from(new_width);
        let new_h = i64::from(new_height);

        let src_ox = src_origin_x.floor() as i64;
        let src_oy = src_origin_y.floor() as i64;
        let dst_ox = dest_origin_x.floor() as i64;
        let dst_oy = dest_origin_y.floor() as i64;

        let mut out = vec![0u8; pixel_byte_len(new_width, new_height)];

        // Destination rows that map onto valid source rows: for dest (dx, dy)
        // the source pixel is (dx - dst_ox + src_ox, dy - dst_oy + src_oy).
        let copy_left = 0.max(dst_ox - src_ox);
        let copy_top = 0.max(dst_oy - src_oy);
        let copy_right = new_w.min(dst_ox - src_ox + old_w);
        let copy_bottom = new_h.min(dst_oy - src_oy + old_h);

        if copy_left < copy_right && copy_top < copy_bottom {
            let row_px = (copy_right - copy_left) as usize;
            for dy in copy_top..copy_bottom {
                let sy = dy - dst_oy + src_oy;
                if sy < 0 || sy >= old_h {
                    continue;
                }
                let sx = copy_left - dst_ox + src_ox;
                if sx < 0 || sx + row_px as i64 > old_w {
                    continue;
                }
                let src_idx = ((sy * old_w + sx) * 4) as usize;
                let dst_idx = ((dy * new_w + copy_left) * 4) as usize;
                let byte_len = row_px * 4;
                out[dst_idx..dst_idx + byte_len]
                    .copy_from_slice(&self.data[src_idx..src_idx + byte_len]);
            }
        }

        self.width = new_width;
        self.height = new_height;
        self.data = out;
    }

    /// Replace contents and dimensions with `raw`; `false` on length
    /// mismatch, leaving the buffer untouched.
    pub fn overwrite_with(&mut self, raw: Vec<u8>, width: u32, height: u32) -> bool {
        if raw.len() != pixel_byte_len(width, height) {
            return false;
        }
        self.width = width;
        self.height = height;
        self.data = raw;
        true
    }

    /// Sample masked pixels into a fresh `mask_w * mask_h * 4` buffer.
    ///
    /// Output pixel `(x, y)` is the buffer pixel at
    /// `(offset_x + x, offset_y + y)` where the mask byte is non-zero, and
    /// transparent elsewhere. A mask shorter than its dimensions yields an
    /// empty vector.
    pub fn slice_with_mask(
        &self,
        mask: &[u8],
        mask_width: u32,
        mask_height: u32,
        mask_offset_x: f32,
        mask_offset_y: f32,
    ) -> Vec<u8> {
        if mask_width == 0 || mask_height == 0 {
            return Vec::new();
        }
        if (mask_width as usize) * (mask_height as usize) > mask.len() {
            return Vec::new();
        }

        let mut out = vec![0u8; pixel_byte_len(mask_width, mask_height)];
        let ox = mask_offset_x.round() as i32;
        let oy = mask_offset_y.round() as i32;

        for y in 0..mask_height as i32 {
            for x in 0..mask_width as i32 {
                let mi = y as usize * mask_width as usize + x as usize;
                if mask[mi] == 0 {
                    continue;
                }
                let (sx, sy) = (x + ox, y + oy);
                if !self.is_in_bounds(sx, sy) {
                    continue;
                }
                let src_idx = self.byte_index(sx, sy);
                let dst_idx = mi * 4;
                out[dst_idx..dst_idx + 4].copy_from_slice(&self.data[src_idx..src_idx + 4]);
            }
        }

        out
    }

    /// Keep only pixels covered by the positioned mask.
    ///
    /// Returns a buffer of the **buffer's** size: pixels where the mask
    /// (anchored at the rounded offset) is non-zero are copied, everything
    /// else is transparent.
    pub fn crop_with_mask(
        &self,
        mask: &[u8],
        mask_width: u32,
        mask_height: u32,
        mask_offset_x: f32,
        mask_offset_y: f32,
    ) -> Vec<u8> {
        if (mask_width as usize) * (mask_height as usize) > mask.len() {
            return Vec::new();
        }

        let mut out = vec![0u8; self.data.len()];
        let ox = mask_offset_x.round() as i32;
        let oy = mask_offset_y.round() as i32;
        let mw = mask_width as i32;
        let mh = mask_height as i32;

        for sy in 0..self.height as i32 {
            for sx in 0..self.width as i32 {
                let (mx, my) = (sx - ox, sy - oy);
                if mx < 0 || mx >= mw || my < 0 || my >= mh {
                    continue;
                }
                if mask[my as usize * mw as usize + mx as usize] == 0 {
                    continue;
                }
                let idx = self.byte_index(sx, sy);
                out[idx..idx + 4].copy_from_slice(&self.data[idx..idx + 4]);
            }
        }

        out
    }

    /// Replace contents from raw RGBA8 bytes; may change dimensions.
    pub fn import_raw(&mut self, raw: &[u8], width: u32, height: u32) -> bool {
        if raw.len() != pixel_byte_len(width, height) {
            return false;
        }
        self.overwrite_with(raw.to_vec(), width, height)
    }

    /// Decode WebP bytes and replace contents; `false` leaves the buffer
    /// untouched.
    pub fn import_webp(
        &mut self,
        bytes: &[u8],
        width: u32,
        height: u32,
        codec: &dyn ImageCodec,
    ) -> bool {
        match codec.webp_to_raw(bytes, width, height) {
            Ok(raw) => self.overwrite_with(raw, width, height),
            Err(err) => {
                debug!(%err, "webp import failed");
                false
            }
        }
    }

    /// Decode PNG bytes and replace contents; `false` leaves the buffer
    /// untouched.
    pub fn import_png(
        &mut self,
        bytes: &[u8],
        width: u32,
        height: u32,
        codec: &dyn ImageCodec,
    ) -> bool {
        match codec.png_to_raw(bytes, width, height) {
            Ok(raw) => self.overwrite_with(raw, width, height),
            Err(err) => {
                debug!(%err, "png import failed");
                false
            }
        }
    }

    /// Encode the buffer as WebP.
    pub fn export_webp(&self, codec: &dyn ImageCodec) -> AnvilResult<Vec<u8>> {
        codec.raw_to_webp(&self.data, self.width, self.height)
    }

    /// Encode the buffer as PNG.
    pub fn export_png(&self, codec: &dyn ImageCodec) -> AnvilResult<Vec<u8>> {
        codec.raw_to_png(&self.data, self.width, self.height)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/buffer/core.rs"]
mod tests;
