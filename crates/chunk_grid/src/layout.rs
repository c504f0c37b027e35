use std::ops::Range;

use crate::{CELLS_PER_WORD, CHUNK_HEADER_BYTES, GridConfig, GridCreateError, MAX_CHUNK_EDGE};

/// Fixed byte geometry of one chunk record: an 8 byte coordinate header
/// (chunk x and y as little-endian f32) followed by the chunk's cell bytes
/// packed four per 32-bit word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkLayout {
    chunk_edge: u32,
    cells_per_chunk: u32,
    cell_words: u32,
    stride: usize,
}

impl ChunkLayout {
    pub fn from_config(config: &GridConfig) -> Result<Self, GridCreateError> {
        if config.chunk_edge == 0 {
            return Err(GridCreateError::ChunkEdgeZero);
        }
        if config.chunk_edge > MAX_CHUNK_EDGE {
            return Err(GridCreateError::ChunkEdgeTooLarge);
        }
        let cells_per_chunk = config
            .chunk_edge
            .checked_mul(config.chunk_edge)
            .ok_or(GridCreateError::ChunkEdgeTooLarge)?;
        let cell_words = cells_per_chunk.div_ceil(CELLS_PER_WORD as u32);
        let stride = CHUNK_HEADER_BYTES + cell_words as usize * CELLS_PER_WORD;
        Ok(Self {
            chunk_edge: config.chunk_edge,
            cells_per_chunk,
            cell_words,
            stride,
        })
    }

    pub fn chunk_edge(&self) -> u32 {
        self.chunk_edge
    }

    pub fn cells_per_chunk(&self) -> u32 {
        self.cells_per_chunk
    }

    pub fn cell_words(&self) -> u32 {
        self.cell_words
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn slot_offset(&self, slot: u32) -> usize {
        slot as usize * self.stride
    }

    pub fn record_range(&self, slot: u32) -> Range<usize> {
        let start = self.slot_offset(slot);
        start..start + self.stride
    }

    pub fn header_range(&self, slot: u32) -> Range<usize> {
        let start = self.slot_offset(slot);
        start..start + CHUNK_HEADER_BYTES
    }

    pub fn cell_offset(&self, slot: u32, local_index: usize) -> usize {
        debug_assert!(
            local_index < self.cells_per_chunk as usize,
            "local index {local_index} out of range for {} cells",
            self.cells_per_chunk
        );
        self.slot_offset(slot) + CHUNK_HEADER_BYTES + local_index
    }

    /// Byte range of the 32-bit word holding the cell, the smallest span a
    /// device partial write carries.
    pub fn cell_word_range(&self, slot: u32, local_index: usize) -> Range<usize> {
        let word_start = self.slot_offset(slot)
            + CHUNK_HEADER_BYTES
            + local_index / CELLS_PER_WORD * CELLS_PER_WORD;
        word_start..word_start + CELLS_PER_WORD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout_with_edge(chunk_edge: u32) -> ChunkLayout {
        ChunkLayout::from_config(&GridConfig::with_chunk_edge(chunk_edge)).expect("chunk layout")
    }

    #[test]
    fn stride_covers_header_and_word_packed_cells() {
        let layout = layout_with_edge(8);
        assert_eq!(layout.cells_per_chunk(), 64);
        assert_eq!(layout.cell_words(), 16);
        assert_eq!(layout.stride(), 72);

        let narrow = layout_with_edge(3);
        assert_eq!(narrow.cells_per_chunk(), 9);
        assert_eq!(narrow.cell_words(), 3);
        assert_eq!(narrow.stride(), 20);
    }

    #[test]
    fn rejects_degenerate_chunk_edges() {
        assert_eq!(
            ChunkLayout::from_config(&GridConfig::with_chunk_edge(0)),
            Err(GridCreateError::ChunkEdgeZero)
        );
        assert_eq!(
            ChunkLayout::from_config(&GridConfig::with_chunk_edge(MAX_CHUNK_EDGE + 1)),
            Err(GridCreateError::ChunkEdgeTooLarge)
        );
    }

    #[test]
    fn cell_word_range_is_word_aligned_and_contains_the_cell() {
        let layout = layout_with_edge(8);
        for slot in [0u32, 3] {
            for local_index in [0usize, 1, 3, 4, 10, 63] {
                let word = layout.cell_word_range(slot, local_index);
                assert_eq!(word.len(), CELLS_PER_WORD);
                assert_eq!(
                    (word.start - layout.slot_offset(slot) - CHUNK_HEADER_BYTES)
                        % CELLS_PER_WORD,
                    0
                );
                let cell = layout.cell_offset(slot, local_index);
                assert!(word.contains(&cell));
                assert!(word.end <= layout.record_range(slot).end);
            }
        }
    }
}
