//! Patch shapes and the packed transport form.
//!
//! A patch stores the **pre-image** of a set of writes. Applying it swaps
//! the stored payload with the current buffer contents, so after one
//! application the patch holds the opposite pre-image and can be replayed
//! in the other direction. Packed patches are plain data with no hidden
//! references and can be persisted as-is.

use crate::{
    codec::ImageCodec,
    foundation::color::{Rgba8, packed_u32_to_rgba, rgba_to_packed_u32},
    foundation::error::{AnvilError, AnvilResult},
    foundation::geom::BoundBox,
};

/// Pre-image of one pixel write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelPatch {
    /// Pixel x coordinate.
    pub x: u32,
    /// Pixel y coordinate.
    pub y: u32,
    /// Color at `(x, y)` before the write.
    pub color: Rgba8,
}

/// Transport form of [`PixelPatch`]; the color is packed as
/// `(A<<24)|(R<<16)|(G<<8)|B`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PackedPixelPatch {
    /// Pixel x coordinate.
    pub x: u32,
    /// Pixel y coordinate.
    pub y: u32,
    /// Packed swap color.
    pub color: u32,
}

impl PixelPatch {
    /// Pack the color into its u32 transport layout.
    pub fn pack(self) -> PackedPixelPatch {
        PackedPixelPatch {
            x: self.x,
            y: self.y,
            color: rgba_to_packed_u32(self.color),
        }
    }
}

impl PackedPixelPatch {
    /// Unpack the transport color back into channels.
    pub fn unpack(self) -> PixelPatch {
        PixelPatch {
            x: self.x,
            y: self.y,
            color: packed_u32_to_rgba(self.color),
        }
    }
}

/// Pre-image of a rectangular region.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartialPatch {
    /// Region the swap buffer covers; may extend outside the buffer.
    pub bound_box: BoundBox,
    /// Raw RGBA8 pre-image, `bound_box.width * bound_box.height * 4` bytes.
    pub swap_buffer: Vec<u8>,
}

/// Transport form of [`PartialPatch`]: the swap payload encoded as WebP.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PackedPartialPatch {
    /// Region the payload covers.
    pub bound_box: BoundBox,
    /// Encoded swap payload.
    pub swap_webp: Vec<u8>,
}

impl PartialPatch {
    /// Validate the payload length and encode it for transport.
    pub fn pack(&self, codec: &dyn ImageCodec) -> AnvilResult<PackedPartialPatch> {
        let expected = self.bound_box.byte_len();
        if self.swap_buffer.len() != expected {
            return Err(AnvilError::PartialBufferSizeMismatch {
                expected,
                actual: self.swap_buffer.len(),
            });
        }
        let swap_webp = codec.raw_to_webp(
            &self.swap_buffer,
            self.bound_box.width,
            self.bound_box.height,
        )?;
        Ok(PackedPartialPatch {
            bound_box: self.bound_box,
            swap_webp,
        })
    }
}

impl PackedPartialPatch {
    /// Decode the payload back into raw RGBA8 bytes.
    pub fn unpack(&self, codec: &dyn ImageCodec) -> AnvilResult<PartialPatch> {
        let swap_buffer = codec.webp_to_raw(
            &self.swap_webp,
            self.bound_box.width,
            self.bound_box.height,
        )?;
        Ok(PartialPatch {
            bound_box: self.bound_box,
            swap_buffer,
        })
    }
}

/// Pre-image of the entire buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WholePatch {
    /// Buffer width the swap buffer encodes.
    pub width: u32,
    /// Buffer height the swap buffer encodes.
    pub height: u32,
    /// Raw RGBA8 pre-image, `width * height * 4` bytes.
    pub swap_buffer: Vec<u8>,
}

/// Transport form of [`WholePatch`]: the swap payload encoded as WebP.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PackedWholePatch {
    /// Buffer width the payload encodes.
    pub width: u32,
    /// Buffer height the payload encodes.
    pub height: u32,
    /// Encoded swap payload.
    pub swap_webp: Vec<u8>,
}

impl WholePatch {
    /// Validate the payload length and encode it for transport.
    pub fn pack(&self, codec: &dyn ImageCodec) -> AnvilResult<PackedWholePatch> {
        let expected = (self.width as usize) * (self.height as usize) * 4;
        if self.swap_buffer.len() != expected {
            return Err(AnvilError::BufferSizeMismatch {
                expected,
                actual: self.swap_buffer.len(),
            });
        }
        let swap_webp = codec.raw_to_webp(&self.swap_buffer, self.width, self.height)?;
        Ok(PackedWholePatch {
            width: self.width,
            height: self.height,
            swap_webp,
        })
    }
}

impl PackedWholePatch {
    /// Decode the payload back into raw RGBA8 bytes.
    pub fn unpack(&self, codec: &dyn ImageCodec) -> AnvilResult<WholePatch> {
        let swap_buffer = codec.webp_to_raw(&self.swap_webp, self.width, self.height)?;
        Ok(WholePatch {
            width: self.width,
            height: self.height,
            swap_buffer,
        })
    }
}

/// Self-contained packed patch, the transport form handed to the undo
/// coordinator.
///
/// Applying a patch **rewrites it in place** into its own inverse; patches
/// are deliberately mutable values, not snapshots.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PackedDiffs {
    /// Per-pixel swap entries in insertion order; duplicates are kept.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pixels: Vec<PackedPixelPatch>,
    /// Rectangular swap payload, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial: Option<PackedPartialPatch>,
    /// Whole-buffer swap payload, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whole: Option<PackedWholePatch>,
}

impl PackedDiffs {
    /// True when the patch carries no payload of any kind.
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty() && self.partial.is_none() && self.whole.is_none()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/diff/patch.rs"]
mod tests;
