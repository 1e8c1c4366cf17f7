//! Anvil is the pixel-buffer engine for one layer of a raster editor.
//!
//! It owns the in-memory image of a layer and everything needed to mutate
//! it deterministically, record those mutations compactly, and replay them
//! for undo/redo. Three subsystems make up the core:
//!
//! 1. **[`PixelBuffer`]**: the authoritative RGBA8 grid with bounds-checked
//!    access, rectangular IO, flood fill, affine blits and origin-aware
//!    resize.
//! 2. **[`TileGrid`]**: a coarse dirty-tile bitset renderers read to decide
//!    what to re-upload.
//! 3. **[`DiffController`] + [`PackedDiffs`]**: pre-images of mutations,
//!    packed into a compact transport form (WebP for region payloads,
//!    packed u32 for pixels) and replayed by **swapping** contents in
//!    place, so an applied patch becomes its own inverse.
//!
//! [`Anvil`] is the facade that wires the three together and guarantees
//! their coupling: every mutator updates the buffer, marks tiles dirty and
//! records the pre-image.
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Synchronous and single-threaded**: no operation suspends; callers
//!   needing parallelism partition by layer, one engine per layer.
//! - **Straight RGBA8** end-to-end: colors are non-premultiplied, sRGB
//!   8-bit.
//! - **Geometric tolerance**: clipped rectangles, out-of-range tiles and
//!   short masks are silent no-ops; size mismatches and strict pixel access
//!   are typed errors.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod buffer;
mod codec;
mod diff;
mod engine;
mod foundation;
mod tiles;

pub use buffer::{Antialias, BlitOptions, DitherMode, MaskMode, PixelBuffer};
pub use codec::{ImageCodec, ImageRsCodec};
pub use diff::{
    DiffController, PackedDiffs, PackedPartialPatch, PackedPixelPatch, PackedWholePatch,
    PartialPatch, PixelPatch, WholePatch,
};
pub use engine::{Anvil, PatchMode};
pub use foundation::color::{Rgba8, TRANSPARENT, packed_u32_to_rgba, rgba_to_packed_u32};
pub use foundation::error::{AnvilError, AnvilResult};
pub use foundation::geom::BoundBox;
pub use tiles::{TileGrid, TileIndex, TileInfo};
