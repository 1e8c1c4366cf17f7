//! The engine facade.
//!
//! [`Anvil`] wires the three owners together: the pixel buffer owns the
//! bytes, the tile grid owns dirtiness, the diff controller owns pre-images.
//! Every mutator is responsible for touching all three, which keeps the
//! coupling in one place.

use tracing::{debug, instrument};

use crate::{
    buffer::{BlitOptions, DitherMode, MaskMode, PixelBuffer},
    codec::{ImageCodec, ImageRsCodec},
    diff::{DiffController, PackedDiffs, PackedWholePatch, PartialPatch, PixelPatch},
    foundation::color::{Rgba8, packed_u32_to_rgba, rgba_to_packed_u32},
    foundation::error::{AnvilError, AnvilResult},
    foundation::geom::BoundBox,
    tiles::{TileGrid, TileIndex, TileInfo},
};

/// Direction a patch is replayed in.
///
/// Because every patch kind swaps its payload with the current contents,
/// application is symmetric; the mode is informational and shows up in
/// tracing spans.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatchMode {
    /// Replay towards the older state.
    Undo,
    /// Replay towards the newer state.
    Redo,
}

/// One layer's pixel engine: buffer, dirty tiles and pending diffs.
pub struct Anvil {
    buffer: PixelBuffer,
    tiles: TileGrid,
    diffs: DiffController,
    codec: Box<dyn ImageCodec>,
}

impl std::fmt::Debug for Anvil {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Anvil")
            .field("buffer", &self.buffer)
            .field("tiles", &self.tiles)
            .field("diffs", &self.diffs)
            .finish()
    }
}

impl Anvil {
    /// Engine over a zeroed `width` x `height` buffer with the default
    /// lossless codec.
    pub fn new(width: u32, height: u32, tile_size: u32) -> AnvilResult<Anvil> {
        Anvil::with_codec(width, height, tile_size, Box::new(ImageRsCodec))
    }

    /// Engine with an injected codec implementation.
    pub fn with_codec(
        width: u32,
        height: u32,
        tile_size: u32,
        codec: Box<dyn ImageCodec>,
    ) -> AnvilResult<Anvil> {
        if tile_size == 0 {
            return Err(AnvilError::validation("tile size must be >= 1"));
        }
        Ok(Anvil {
            buffer: PixelBuffer::new(width, height),
            tiles: TileGrid::new(width, height, tile_size),
            diffs: DiffController::new(),
            codec,
        })
    }

    /// Buffer width in pixels.
    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    /// Buffer height in pixels.
    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// Tile lattice pitch in pixels.
    pub fn tile_size(&self) -> u32 {
        self.tiles.tile_size()
    }

    /// Read-only handle to the pixel buffer, e.g. for thumbnail export.
    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    // ---- pixel access ------------------------------------------------

    /// Color at `(x, y)`; errors on out-of-range coordinates.
    ///
    /// [`PixelBuffer::get`] on [`buffer`](Self::buffer) is the permissive
    /// variant that reads transparent black instead.
    pub fn get_pixel(&self, x: i32, y: i32) -> AnvilResult<Rgba8> {
        if !self.buffer.is_in_bounds(x, y) {
            return Err(self.out_of_bounds(x, y));
        }
        Ok(self.buffer.get(x, y))
    }

    /// Write `color` at `(x, y)`, recording the pre-image; errors on
    /// out-of-range coordinates.
    ///
    /// Returns whether the pixel actually changed. The pre-image entry is
    /// recorded either way so replay order stays faithful to the write
    /// order.
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Rgba8) -> AnvilResult<bool> {
        if !self.buffer.is_in_bounds(x, y) {
            return Err(self.out_of_bounds(x, y));
        }
        let old = self.buffer.get(x, y);
        let changed = self.buffer.set(x, y, color);
        self.tiles.mark_dirty_by_pixel(x, y);
        self.diffs.add_pixel(PixelPatch {
            x: x as u32,
            y: y as u32,
            color: old,
        });
        Ok(changed)
    }

    fn out_of_bounds(&self, x: i32, y: i32) -> AnvilError {
        AnvilError::OutOfBounds {
            x,
            y,
            width: self.buffer.width(),
            height: self.buffer.height(),
        }
    }

    // ---- fills -------------------------------------------------------

    /// Fill a rectangle (clipped to the buffer) with `color`, recording
    /// per-pixel pre-images. Returns whether any pixel changed.
    pub fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Rgba8) -> bool {
        let Some(clipped) = BoundBox::new(x, y, width, height)
            .clipped_to(self.buffer.width(), self.buffer.height())
        else {
            return false;
        };

        let mut changed = false;
        for py in clipped.y..clipped.y + clipped.height as i32 {
            for px in clipped.x..clipped.x + clipped.width as i32 {
                let old = self.buffer.get(px, py);
                changed |= self.buffer.set(px, py, color);
                self.diffs.add_pixel(PixelPatch {
                    x: px as u32,
                    y: py as u32,
                    color: old,
                });
            }
        }
        self.tiles.mark_rect_dirty(clipped);
        changed
    }

    /// Fill the whole buffer with `color`, recording a whole pre-image.
    pub fn fill_all(&mut self, color: Rgba8) -> AnvilResult<()> {
        self.add_current_whole_diff()?;
        self.buffer.fill(color);
        self.tiles.set_all_dirty();
        Ok(())
    }

    /// Write `color` wherever the mask byte is non-zero.
    ///
    /// Records no diffs (callers snapshot first, as with flood fill); marks
    /// every tile dirty on change.
    pub fn fill_mask_area(&mut self, mask: &[u8], color: Rgba8) -> bool {
        let changed = self.buffer.fill_mask_area(mask, color);
        if changed {
            self.tiles.set_all_dirty();
        }
        changed
    }

    /// Scanline flood fill from `(x, y)`.
    ///
    /// Records no diffs; callers that need undo wrap the call with
    /// [`add_partial_diff`](Self::add_partial_diff) or
    /// [`add_current_whole_diff`](Self::add_current_whole_diff). On change,
    /// every tile is marked dirty (a documented over-approximation of the
    /// visited set).
    pub fn flood_fill(&mut self, x: i32, y: i32, color: Rgba8, threshold: u8) -> bool {
        let changed = self.buffer.flood_fill(x, y, color, threshold);
        if changed {
            self.tiles.set_all_dirty();
        }
        changed
    }

    /// [`flood_fill`](Self::flood_fill) constrained by a selection mask.
    pub fn flood_fill_with_mask(
        &mut self,
        x: i32,
        y: i32,
        color: Rgba8,
        threshold: u8,
        mask: &[u8],
        mode: MaskMode,
    ) -> bool {
        let changed = self
            .buffer
            .flood_fill_with_mask(x, y, color, threshold, mask, mode);
        if changed {
            self.tiles.set_all_dirty();
        }
        changed
    }

    // ---- bulk IO -----------------------------------------------------

    /// Composite transformed raw source bytes onto the buffer.
    ///
    /// Records no diffs; marks every tile dirty (the transform may touch
    /// anywhere).
    pub fn transfer_from_raw(&mut self, src: &[u8], src_width: u32, src_height: u32, opts: &BlitOptions) {
        self.buffer.blit_from_raw(src, src_width, src_height, opts);
        self.tiles.set_all_dirty();
    }

    /// Copy a rectangle out of the buffer; out-of-range pixels read as
    /// transparent black.
    pub fn read_rect(&self, x: i32, y: i32, width: u32, height: u32) -> Vec<u8> {
        self.buffer.read_rect(x, y, width, height)
    }

    /// Write `src` into a rectangle (clipped), recording per-pixel
    /// pre-images for the clipped region.
    pub fn write_rect(
        &mut self,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        src: &[u8],
    ) -> AnvilResult<()> {
        let expected = (width as usize) * (height as usize) * 4;
        if src.len() != expected {
            return Err(AnvilError::BufferSizeMismatch {
                expected,
                actual: src.len(),
            });
        }

        if let Some(clipped) =
            BoundBox::new(x, y, width, height).clipped_to(self.buffer.width(), self.buffer.height())
        {
            for py in clipped.y..clipped.y + clipped.height as i32 {
                for px in clipped.x..clipped.x + clipped.width as i32 {
                    self.diffs.add_pixel(PixelPatch {
                        x: px as u32,
                        y: py as u32,
                        color: self.buffer.get(px, py),
                    });
                }
            }
            self.tiles.mark_rect_dirty(clipped);
        }

        self.buffer.write_rect(x, y, width, height, src)
    }

    /// Bulk scatter write, recording pre-images for the in-bounds pairs.
    pub fn write_pixels(&mut self, coords: &[u32], colors: &[u8]) -> AnvilResult<()> {
        if !coords.len().is_multiple_of(2) || colors.len() != coords.len() * 2 {
            return Err(AnvilError::BufferSizeMismatch {
                expected: coords.len() * 2,
                actual: colors.len(),
            });
        }

        for pair in coords.chunks_exact(2) {
            let (x, y) = (pair[0] as i32, pair[1] as i32);
            if !self.buffer.is_in_bounds(x, y) {
                continue;
            }
            self.diffs.add_pixel(PixelPatch {
                x: pair[0],
                y: pair[1],
                color: self.buffer.get(x, y),
            });
            self.tiles.mark_dirty_by_pixel(x, y);
        }

        self.buffer.write_pixels(coords, colors)
    }

    // ---- resize ------------------------------------------------------

    /// Resize keeping the origin anchored, discarding pending diffs.
    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        self.resize_with_offset(new_width, new_height, (0.0, 0.0), (0.0, 0.0));
    }

    /// Crop-and-translate resize.
    ///
    /// The source pixel at `src_origin` lands at `dest_origin` in the new
    /// buffer. Pending diffs are **discarded**: callers flush first, or
    /// treat the resize as its own patch by snapshotting a whole diff
    /// beforehand.
    #[instrument(skip(self))]
    pub fn resize_with_offset(
        &mut self,
        new_width: u32,
        new_height: u32,
        src_origin: (f32, f32),
        dest_origin: (f32, f32),
    ) {
        self.buffer.resize_with_origins(
            new_width,
            new_height,
            src_origin.0,
            src_origin.1,
            dest_origin.0,
            dest_origin.1,
        );
        self.tiles.resize(new_width, new_height);
        self.diffs.discard();
    }

    // ---- import / export ---------------------------------------------

    /// Replace the buffer from raw RGBA8 bytes; may change dimensions.
    ///
    /// On success the pending diffs are replaced by a whole pre-image of
    /// the previous contents. A length mismatch returns `false` and leaves
    /// everything untouched.
    pub fn import_raw(&mut self, raw: &[u8], width: u32, height: u32) -> bool {
        if raw.len() != (width as usize) * (height as usize) * 4 {
            return false;
        }
        self.import_decoded(raw.to_vec(), width, height)
    }

    /// Decode WebP bytes and replace the buffer; `false` on decode failure.
    #[instrument(skip(self, bytes))]
    pub fn import_webp(&mut self, bytes: &[u8], width: u32, height: u32) -> bool {
        match self.codec.webp_to_raw(bytes, width, height) {
            Ok(raw) => self.import_decoded(raw, width, height),
            Err(err) => {
                debug!(%err, "webp import failed");
                false
            }
        }
    }

    /// Decode PNG bytes and replace the buffer; `false` on decode failure.
    #[instrument(skip(self, bytes))]
    pub fn import_png(&mut self, bytes: &[u8], width: u32, height: u32) -> bool {
        match self.codec.png_to_raw(bytes, width, height) {
            Ok(raw) => self.import_decoded(raw, width, height),
            Err(err) => {
                debug!(%err, "png import failed");
                false
            }
        }
    }

    fn import_decoded(&mut self, raw: Vec<u8>, width: u32, height: u32) -> bool {
        let pre = match self.buffer.export_webp(self.codec.as_ref()) {
            Ok(webp) => webp,
            Err(err) => {
                debug!(%err, "pre-import snapshot failed");
                return false;
            }
        };

        let pre_patch = PackedWholePatch {
            width: self.buffer.width(),
            height: self.buffer.height(),
            swap_webp: pre,
        };
        self.diffs.discard();
        self.diffs.add_whole_packed(pre_patch);

        self.buffer.overwrite_with(raw, width, height);
        self.tiles.resize(width, height);
        self.tiles.set_all_dirty();
        true
    }

    /// Encode the buffer as WebP.
    pub fn export_webp(&self) -> AnvilResult<Vec<u8>> {
        self.buffer.export_webp(self.codec.as_ref())
    }

    /// Encode the buffer as PNG.
    pub fn export_png(&self) -> AnvilResult<Vec<u8>> {
        self.buffer.export_png(self.codec.as_ref())
    }

    // ---- diff recording ----------------------------------------------

    /// Queue a single-pixel pre-image directly.
    pub fn add_pixel_diff(&mut self, x: u32, y: u32, color: Rgba8) {
        self.diffs.add_pixel(PixelPatch { x, y, color });
    }

    /// Queue a rectangular pre-image; optionally mark its tiles dirty.
    pub fn add_partial_diff(
        &mut self,
        bound_box: BoundBox,
        swap_buffer: Vec<u8>,
        set_dirty: bool,
    ) -> AnvilResult<()> {
        let patch = PartialPatch {
            bound_box,
            swap_buffer,
        };
        self.diffs.add_partial(&patch, self.codec.as_ref())?;
        if set_dirty {
            self.tiles.mark_rect_dirty(bound_box);
        }
        Ok(())
    }

    /// Snapshot the current buffer as a whole pre-image.
    ///
    /// "Save before you mutate": call this ahead of an operation that does
    /// not record its own diffs.
    pub fn add_current_whole_diff(&mut self) -> AnvilResult<()> {
        let swap_webp = self.buffer.export_webp(self.codec.as_ref())?;
        self.diffs.add_whole_packed(PackedWholePatch {
            width: self.buffer.width(),
            height: self.buffer.height(),
            swap_webp,
        });
        Ok(())
    }

    /// True when any diff kind is pending.
    pub fn has_pending_changes(&self) -> bool {
        self.diffs.has_pending_changes()
    }

    /// Packed snapshot of pending diffs without clearing them.
    pub fn preview_patch(&self) -> Option<PackedDiffs> {
        self.diffs.preview_patch()
    }

    /// Packed snapshot of pending diffs, clearing the pending state.
    ///
    /// Tile dirtiness is untouched; the renderer's upload loop owns it.
    #[instrument(skip(self))]
    pub fn flush_diffs(&mut self) -> Option<PackedDiffs> {
        let patch = self.diffs.flush();
        debug!(emitted = patch.is_some(), "flush diffs");
        patch
    }

    /// Drop pending diffs without emitting a patch.
    pub fn discard_diffs(&mut self) {
        self.diffs.discard();
    }

    // ---- patch application -------------------------------------------

    /// Apply a packed patch, rewriting it in place into its own inverse.
    ///
    /// Kinds apply in fixed order: whole, then partial, then pixels, so one
    /// patch can express "replace everything, then a region, then single
    /// pixels". Each kind swaps its payload with the current contents:
    /// after the call the patch replays in the opposite direction. All
    /// touched tiles are marked dirty.
    #[instrument(skip(self, patch))]
    pub fn apply_patch(&mut self, patch: &mut PackedDiffs, mode: PatchMode) -> AnvilResult<()> {
        let _ = mode; // symmetric swap semantics; mode is span context only

        if let Some(whole) = patch.whole.as_mut() {
            let incoming = self
                .codec
                .webp_to_raw(&whole.swap_webp, whole.width, whole.height)?;
            let cur_width = self.buffer.width();
            let cur_height = self.buffer.height();
            let cur_webp = self.buffer.export_webp(self.codec.as_ref())?;

            let dims_change = (cur_width, cur_height) != (whole.width, whole.height);
            let (new_width, new_height) = (whole.width, whole.height);
            self.buffer.overwrite_with(incoming, new_width, new_height);

            whole.swap_webp = cur_webp;
            whole.width = cur_width;
            whole.height = cur_height;

            if dims_change {
                self.tiles.resize(new_width, new_height);
            }
            self.tiles.set_all_dirty();
        }

        if let Some(partial) = patch.partial.as_mut() {
            let bb = partial.bound_box;
            let incoming = self
                .codec
                .webp_to_raw(&partial.swap_webp, bb.width, bb.height)?;
            let current = self.buffer.read_rect(bb.x, bb.y, bb.width, bb.height);
            let cur_webp = self.codec.raw_to_webp(&current, bb.width, bb.height)?;

            self.buffer.write_rect(bb.x, bb.y, bb.width, bb.height, &incoming)?;
            partial.swap_webp = cur_webp;
            self.tiles.mark_rect_dirty(bb);
        }

        for entry in &mut patch.pixels {
            let (x, y) = (entry.x as i32, entry.y as i32);
            let current = self.buffer.get(x, y);
            self.buffer.set(x, y, packed_u32_to_rgba(entry.color));
            entry.color = rgba_to_packed_u32(current);
            self.tiles.mark_dirty_by_pixel(x, y);
        }

        Ok(())
    }

    // ---- tiles -------------------------------------------------------

    /// Dirty tile addresses in row-major order.
    pub fn dirty_tiles(&self) -> Vec<TileIndex> {
        self.tiles.dirty_tile_indices()
    }

    /// Clear every dirty flag (the renderer calls this after uploads).
    pub fn clear_dirty_tiles(&mut self) {
        self.tiles.clear_all_dirty();
    }

    /// Mark every tile dirty.
    pub fn set_all_dirty(&mut self) {
        self.tiles.set_all_dirty();
    }

    /// Geometry and dirty state of one tile; `None` for out-of-range
    /// indices.
    pub fn tile_info(&self, index: TileIndex) -> Option<TileInfo> {
        let bounds = self.tiles.tile_bounds(index)?;
        Some(TileInfo {
            index,
            bounds,
            dirty: self.tiles.is_dirty(index),
        })
    }

    // ---- effects -----------------------------------------------------

    /// Invert color channels; records no diffs, marks every tile dirty.
    pub fn invert(&mut self) {
        self.buffer.invert();
        self.tiles.set_all_dirty();
    }

    /// Convert to Rec. 601 luma; records no diffs, marks every tile dirty.
    pub fn grayscale(&mut self) {
        self.buffer.grayscale();
        self.tiles.set_all_dirty();
    }

    /// Brightness/contrast adjust; records no diffs, marks every tile
    /// dirty.
    pub fn brightness_contrast(&mut self, brightness: f32, contrast: f32) {
        self.buffer.brightness_contrast(brightness, contrast);
        self.tiles.set_all_dirty();
    }

    /// Posterize color channels; records no diffs, marks every tile dirty.
    pub fn posterize(&mut self, levels: u32) {
        self.buffer.posterize(levels);
        self.tiles.set_all_dirty();
    }

    /// Gaussian blur; records no diffs, marks every tile dirty.
    pub fn gaussian_blur(&mut self, radius: u32, sigma: f32) -> AnvilResult<()> {
        self.buffer.gaussian_blur(radius, sigma)?;
        self.tiles.set_all_dirty();
        Ok(())
    }

    /// Dithered quantization; records no diffs, marks every tile dirty.
    pub fn dither(&mut self, mode: DitherMode, levels: u32, strength: f32) {
        self.buffer.dither(mode, levels, strength);
        self.tiles.set_all_dirty();
    }

    /// Clear small opaque specks; records no diffs, marks every tile dirty
    /// when anything was removed. Returns the number of removed specks.
    pub fn dust_removal(&mut self, max_size: u32, alpha_threshold: u8) -> usize {
        let removed = self.buffer.dust_removal(max_size, alpha_threshold);
        if removed > 0 {
            self.tiles.set_all_dirty();
        }
        removed
    }
}

#[cfg(test)]
#[path = "../tests/unit/engine.rs"]
mod tests;
