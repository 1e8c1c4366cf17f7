//! Coarse dirty-tile tracking for renderer uploads.
//!
//! A [`TileGrid`] lays a fixed `tile_size` lattice over the pixel buffer and
//! keeps one dirty bit per tile, packed into u32 words. Edge tiles may be
//! partial. Out-of-range tile indices are accepted silently on both reads
//! and writes; they arise naturally from geometric operations.

use bitvec::{order::Lsb0, vec::BitVec};

use crate::foundation::geom::BoundBox;

/// Row/column address of one tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TileIndex {
    /// Tile row, counted from the top.
    pub row: u32,
    /// Tile column, counted from the left.
    pub col: u32,
}

impl TileIndex {
    /// Index from row and column.
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

/// Snapshot of one tile's geometry and dirty state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileInfo {
    /// The tile's address.
    pub index: TileIndex,
    /// Pixel rectangle the tile covers; edge tiles may be smaller than
    /// `tile_size`.
    pub bounds: BoundBox,
    /// Whether the tile is currently marked dirty.
    pub dirty: bool,
}

/// Bitset of dirty flags over a `tile_size` lattice.
#[derive(Clone, Debug)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tile_size: u32,
    rows: u32,
    cols: u32,
    dirty: BitVec<u32, Lsb0>,
}

impl TileGrid {
    /// Grid over a `width` x `height` buffer.
    ///
    /// `tile_size` must be at least 1; the facade validates this before
    /// construction.
    pub fn new(width: u32, height: u32, tile_size: u32) -> TileGrid {
        let cols = width.div_ceil(tile_size);
        let rows = height.div_ceil(tile_size);
        TileGrid {
            width,
            height,
            tile_size,
            rows,
            cols,
            dirty: BitVec::repeat(false, (rows as usize) * (cols as usize)),
        }
    }

    /// Tracked buffer width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Tracked buffer height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Lattice pitch in pixels.
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Number of tile rows (`ceil(height / tile_size)`).
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of tile columns (`ceil(width / tile_size)`).
    pub fn cols(&self) -> u32 {
        self.cols
    }

    fn bit_index(&self, index: TileIndex) -> Option<usize> {
        if index.row >= self.rows || index.col >= self.cols {
            return None;
        }
        Some((index.row as usize) * (self.cols as usize) + index.col as usize)
    }

    /// Tile containing the pixel at `(x, y)` (floor division).
    pub fn pixel_to_tile(&self, x: u32, y: u32) -> TileIndex {
        TileIndex::new(y / self.tile_size, x / self.tile_size)
    }

    /// Pixel rectangle of a tile; `None` for an out-of-range index.
    pub fn tile_bounds(&self, index: TileIndex) -> Option<BoundBox> {
        if index.row >= self.rows || index.col >= self.cols {
            return None;
        }
        let x = index.col * self.tile_size;
        let y = index.row * self.tile_size;
        Some(BoundBox::new(
            x as i32,
            y as i32,
            self.tile_size.min(self.width - x),
            self.tile_size.min(self.height - y),
        ))
    }

    /// Dirty flag of a tile; out-of-range indices read as clean.
    pub fn is_dirty(&self, index: TileIndex) -> bool {
        self.bit_index(index)
            .map(|i| self.dirty[i])
            .unwrap_or(false)
    }

    /// Set or clear a tile's dirty flag; out-of-range indices are ignored.
    pub fn set_dirty(&mut self, index: TileIndex, dirty: bool) {
        if let Some(i) = self.bit_index(index) {
            self.dirty.set(i, dirty);
        }
    }

    /// Mark the tile containing pixel `(x, y)` dirty; pixels outside the
    /// tracked buffer are ignored.
    pub fn mark_dirty_by_pixel(&mut self, x: i32, y: i32) {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return;
        }
        let index = self.pixel_to_tile(x as u32, y as u32);
        self.set_dirty(index, true);
    }

    /// Mark every tile intersecting `rect` dirty (clipped to the buffer).
    pub fn mark_rect_dirty(&mut self, rect: BoundBox) {
        let Some(clipped) = rect.clipped_to(self.width, self.height) else {
            return;
        };
        let first = self.pixel_to_tile(clipped.x as u32, clipped.y as u32);
        let last = self.pixel_to_tile(
            clipped.x as u32 + clipped.width - 1,
            clipped.y as u32 + clipped.height - 1,
        );
        for row in first.row..=last.row {
            for col in first.col..=last.col {
                self.set_dirty(TileIndex::new(row, col), true);
            }
        }
    }

    /// Clear every dirty flag.
    pub fn clear_all_dirty(&mut self) {
        self.dirty.fill(false);
    }

    /// Set every dirty flag.
    pub fn set_all_dirty(&mut self) {
        self.dirty.fill(true);
    }

    /// Number of dirty tiles.
    pub fn dirty_count(&self) -> usize {
        self.dirty.count_ones()
    }

    /// Dirty tile addresses in row-major order.
    pub fn dirty_tile_indices(&self) -> Vec<TileIndex> {
        let cols = self.cols.max(1);
        self.dirty
            .iter_ones()
            .map(|i| TileIndex::new(i as u32 / cols, i as u32 % cols))
            .collect()
    }

    /// Recompute the lattice for a resized buffer.
    ///
    /// Dirty flags survive for tiles present in both the old and the new
    /// lattice; everything else starts clean.
    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        let new_cols = new_width.div_ceil(self.tile_size);
        let new_rows = new_height.div_ceil(self.tile_size);
        let mut next = BitVec::repeat(false, (new_rows as usize) * (new_cols as usize));

        for row in 0..self.rows.min(new_rows) {
            for col in 0..self.cols.min(new_cols) {
                let old_i = (row as usize) * (self.cols as usize) + col as usize;
                if self.dirty[old_i] {
                    next.set((row as usize) * (new_cols as usize) + col as usize, true);
                }
            }
        }

        self.width = new_width;
        self.height = new_height;
        self.rows = new_rows;
        self.cols = new_cols;
        self.dirty = next;
    }

    /// Raw bitset words, 32 tiles per word; trailing bits stay zero.
    pub(crate) fn dirty_words(&self) -> &[u32] {
        self.dirty.as_raw_slice()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/tiles/grid.rs"]
mod tests;
