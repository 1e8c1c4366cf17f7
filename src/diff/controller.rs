//! Pending-diff state machine.

use tracing::{debug, trace};

use crate::{
    codec::ImageCodec,
    diff::patch::{
        PackedDiffs, PackedPartialPatch, PackedWholePatch, PartialPatch, PixelPatch, WholePatch,
    },
    foundation::error::{AnvilError, AnvilResult},
};

/// Collects pre-images of buffer mutations and emits compact packed patches.
///
/// Three diff kinds are tracked, ordered fine to coarse: pixel, partial,
/// whole. Ingesting a coarser kind discards pending finer ones, and the
/// first coarse pre-image of a flush cycle wins over later ones of the same
/// kind: the payload recorded earliest is the true pre-state. Partial and
/// whole payloads are bulky, so they are packed to WebP at ingest time;
/// pixels stay unpacked until emission.
#[derive(Debug, Default)]
pub struct DiffController {
    pixels: Vec<PixelPatch>,
    partial: Option<PackedPartialPatch>,
    whole: Option<PackedWholePatch>,
}

impl DiffController {
    /// Controller with nothing pending.
    pub fn new() -> DiffController {
        DiffController::default()
    }

    /// Queue a single-pixel pre-image.
    ///
    /// Entries keep insertion order and duplicates are not coalesced.
    /// Dropped while a coarser kind is pending, which keeps the pending-set
    /// invariant (a set partial or whole implies no pending pixels).
    pub fn add_pixel(&mut self, patch: PixelPatch) {
        if self.partial.is_some() || self.whole.is_some() {
            trace!(x = patch.x, y = patch.y, "pixel diff dropped, coarser diff pending");
            return;
        }
        self.pixels.push(patch);
    }

    /// Queue a rectangular pre-image, packing it immediately.
    ///
    /// Fails with a partial-size mismatch when the swap buffer does not
    /// span the bound box. Clears pending pixels. Ignored when a whole or
    /// an earlier partial is already pending, and for empty boxes.
    pub fn add_partial(
        &mut self,
        patch: &PartialPatch,
        codec: &dyn ImageCodec,
    ) -> AnvilResult<()> {
        let expected = patch.bound_box.byte_len();
        if patch.swap_buffer.len() != expected {
            return Err(AnvilError::PartialBufferSizeMismatch {
                expected,
                actual: patch.swap_buffer.len(),
            });
        }
        if patch.bound_box.is_empty() {
            return Ok(());
        }
        if self.whole.is_some() {
            debug!("partial diff ignored, whole diff pending");
            return Ok(());
        }
        if self.partial.is_some() {
            debug!("partial diff ignored, earlier partial pending");
            return Ok(());
        }

        let packed = patch.pack(codec)?;
        self.pixels.clear();
        self.partial = Some(packed);
        Ok(())
    }

    /// Queue a whole-buffer pre-image, packing it immediately.
    ///
    /// Fails with a size mismatch when the swap buffer does not span the
    /// dimensions. Clears pending pixels and partial. Ignored when a whole
    /// is already pending.
    pub fn add_whole(&mut self, patch: &WholePatch, codec: &dyn ImageCodec) -> AnvilResult<()> {
        let expected = (patch.width as usize) * (patch.height as usize) * 4;
        if patch.swap_buffer.len() != expected {
            return Err(AnvilError::BufferSizeMismatch {
                expected,
                actual: patch.swap_buffer.len(),
            });
        }
        if self.whole.is_some() {
            debug!("whole diff ignored, earlier whole pending");
            return Ok(());
        }

        let packed = patch.pack(codec)?;
        self.add_whole_packed(packed);
        Ok(())
    }

    /// Queue an already-encoded whole pre-image (no codec round-trip).
    pub fn add_whole_packed(&mut self, packed: PackedWholePatch) {
        if self.whole.is_some() {
            debug!("whole diff ignored, earlier whole pending");
            return;
        }
        self.pixels.clear();
        self.partial = None;
        self.whole = Some(packed);
    }

    /// True when any diff kind is pending.
    pub fn has_pending_changes(&self) -> bool {
        !self.pixels.is_empty() || self.partial.is_some() || self.whole.is_some()
    }

    /// Packed snapshot of the pending diffs without clearing them.
    pub fn preview_patch(&self) -> Option<PackedDiffs> {
        if !self.has_pending_changes() {
            return None;
        }
        Some(PackedDiffs {
            pixels: self.pixels.iter().map(|p| p.pack()).collect(),
            partial: self.partial.clone(),
            whole: self.whole.clone(),
        })
    }

    /// Packed snapshot, resetting the pending state.
    ///
    /// `None` when nothing is pending, so repeated flushes without writes
    /// stay empty.
    pub fn flush(&mut self) -> Option<PackedDiffs> {
        let patch = self.preview_patch();
        self.reset();
        patch
    }

    /// Drop the pending diffs without emitting a patch.
    pub fn discard(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        self.pixels.clear();
        self.partial = None;
        self.whole = None;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/diff/controller.rs"]
mod tests;
