use std::collections::HashMap;
use std::num::NonZeroU32;
use std::ops::Range;

use crate::{
    BLANK_CELL, CHUNK_HEADER_BYTES, CellCoordinate, CellRect, ChunkCoordinate, ChunkLayout,
    GridConfig, GridCreateError, GridMapper,
};

/// Sparse map from chunk coordinate to an occupied record slot.
///
/// Slots are stored one-based so the map's absent state doubles as the
/// "no chunk" sentinel.
#[derive(Debug, Default)]
pub struct ChunkIndex {
    slots: HashMap<ChunkCoordinate, NonZeroU32>,
}

impl ChunkIndex {
    pub fn slot_of(&self, chunk: ChunkCoordinate) -> Option<u32> {
        self.slots.get(&chunk).map(|slot| slot.get() - 1)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn insert(&mut self, chunk: ChunkCoordinate, slot: u32) {
        let one_based = slot
            .checked_add(1)
            .and_then(NonZeroU32::new)
            .expect("chunk slot overflow");
        let previous = self.slots.insert(chunk, one_based);
        debug_assert!(
            previous.is_none(),
            "chunk ({}, {}) registered twice",
            chunk.x,
            chunk.y
        );
    }
}

/// Host-mirror mutation description consumed by the device mirror. Ranges
/// are byte spans into `ChunkStore::mirror_bytes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreUpdate {
    /// Nothing changed (blank write aimed at a chunk that was never created).
    Unchanged,
    /// One cell changed inside an existing record.
    CellWritten { word: Range<usize> },
    /// A record was appended without reallocation.
    ChunkAppended {
        header: Range<usize>,
        cell_word: Range<usize>,
    },
    /// The mirror was reallocated; device copies must be recreated in full.
    StoreGrown { capacity: u32 },
}

/// Append-only array of fixed-stride chunk records plus the sparse index
/// over it. Owns the host-side byte mirror the device copy is built from.
#[derive(Debug)]
pub struct ChunkStore {
    layout: ChunkLayout,
    mapper: GridMapper,
    initial_capacity: u32,
    mirror: Vec<u8>,
    capacity: u32,
    existing: u32,
    index: ChunkIndex,
    bounds: Option<CellRect>,
}

impl ChunkStore {
    pub fn with_config(config: GridConfig) -> Result<Self, GridCreateError> {
        let layout = ChunkLayout::from_config(&config)?;
        if !(config.cell_size.is_finite() && config.cell_size > 0.0) {
            return Err(GridCreateError::CellSizeNotPositive);
        }
        if config.initial_chunk_capacity == 0 {
            return Err(GridCreateError::InitialCapacityZero);
        }
        Ok(Self {
            layout,
            mapper: GridMapper::new(config.chunk_edge, config.cell_size),
            initial_capacity: config.initial_chunk_capacity,
            mirror: Vec::new(),
            capacity: 0,
            existing: 0,
            index: ChunkIndex::default(),
            bounds: None,
        })
    }

    pub fn layout(&self) -> &ChunkLayout {
        &self.layout
    }

    pub fn mapper(&self) -> GridMapper {
        self.mapper
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn existing_count(&self) -> u32 {
        self.existing
    }

    pub fn bounds(&self) -> Option<CellRect> {
        self.bounds
    }

    pub fn mirror_bytes(&self) -> &[u8] {
        &self.mirror
    }

    pub fn chunk_slot(&self, chunk: ChunkCoordinate) -> Option<u32> {
        self.index.slot_of(chunk)
    }

    pub fn record_bytes(&self, slot: u32) -> &[u8] {
        assert!(slot < self.existing, "record slot {slot} is not occupied");
        &self.mirror[self.layout.record_range(slot)]
    }

    /// Chunk coordinate parsed back out of the record header.
    pub fn record_chunk_coordinate(&self, slot: u32) -> ChunkCoordinate {
        let header = self.record_bytes(slot);
        let x = f32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let y = f32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        ChunkCoordinate {
            x: x as i32,
            y: y as i32,
        }
    }

    /// Current value of a cell; absent chunks read as blank.
    pub fn cell_value(&self, cell: CellCoordinate) -> u8 {
        let chunk = self.mapper.chunk_of_cell(cell);
        let Some(slot) = self.index.slot_of(chunk) else {
            return BLANK_CELL;
        };
        let local = self.mapper.local_index(cell, chunk);
        self.mirror[self.layout.cell_offset(slot, local)]
    }

    /// Writes one cell into the host mirror and reports what changed.
    ///
    /// A blank write aimed at a chunk that does not exist is skipped: creating
    /// an empty record just to hold blank cells is wasted capacity. A blank
    /// write into an existing chunk is a normal cell write and never removes
    /// the record, even once every cell in it is blank again.
    pub fn set_cell(&mut self, cell: CellCoordinate, value: u8) -> StoreUpdate {
        let chunk = self.mapper.chunk_of_cell(cell);
        if let Some(slot) = self.index.slot_of(chunk) {
            let local = self.mapper.local_index(cell, chunk);
            self.mirror[self.layout.cell_offset(slot, local)] = value;
            StoreUpdate::CellWritten {
                word: self.layout.cell_word_range(slot, local),
            }
        } else if value == BLANK_CELL {
            StoreUpdate::Unchanged
        } else {
            self.append_chunk(chunk, cell, value)
        }
    }

    fn append_chunk(
        &mut self,
        chunk: ChunkCoordinate,
        cell: CellCoordinate,
        value: u8,
    ) -> StoreUpdate {
        let grew = self.ensure_capacity_for_append();
        let slot = self.existing;

        let mut coordinate_bytes = [0u8; CHUNK_HEADER_BYTES];
        coordinate_bytes[..4].copy_from_slice(&(chunk.x as f32).to_le_bytes());
        coordinate_bytes[4..].copy_from_slice(&(chunk.y as f32).to_le_bytes());
        self.mirror[self.layout.header_range(slot)].copy_from_slice(&coordinate_bytes);

        let local = self.mapper.local_index(cell, chunk);
        self.mirror[self.layout.cell_offset(slot, local)] = value;

        self.index.insert(chunk, slot);
        self.existing += 1;

        let extent = CellRect::chunk_extent(chunk, self.layout.chunk_edge());
        self.bounds = Some(match self.bounds {
            Some(bounds) => bounds.union(extent),
            None => extent,
        });

        if grew {
            StoreUpdate::StoreGrown {
                capacity: self.capacity,
            }
        } else {
            StoreUpdate::ChunkAppended {
                header: self.layout.header_range(slot),
                cell_word: self.layout.cell_word_range(slot, local),
            }
        }
    }

    fn ensure_capacity_for_append(&mut self) -> bool {
        if self.existing < self.capacity {
            return false;
        }
        let expanded = if self.capacity == 0 {
            self.initial_capacity
        } else {
            self.capacity
                .checked_mul(2)
                .expect("chunk store capacity overflow")
        };
        let expanded_len = (expanded as usize)
            .checked_mul(self.layout.stride())
            .expect("chunk store mirror size overflow");
        let mut expanded_mirror = vec![0u8; expanded_len];
        expanded_mirror[..self.mirror.len()].copy_from_slice(&self.mirror);
        log::debug!(
            "chunk store mirror grew from {} to {expanded} records ({expanded_len} bytes)",
            self.capacity
        );
        self.mirror = expanded_mirror;
        self.capacity = expanded;
        true
    }
}
