use std::fmt;

pub const BLANK_CELL: u8 = 0;
pub const CHUNK_HEADER_BYTES: usize = 8;
pub const CELLS_PER_WORD: usize = 4;
pub const DEFAULT_CHUNK_EDGE: u32 = 8;
pub const DEFAULT_INITIAL_CHUNK_CAPACITY: u32 = 10;
pub const MAX_CHUNK_EDGE: u32 = 1024;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConfig {
    pub chunk_edge: u32,
    pub cell_size: f32,
    pub initial_chunk_capacity: u32,
}

impl GridConfig {
    /// Creates a config with the specified chunk edge length.
    pub fn with_chunk_edge(chunk_edge: u32) -> Self {
        Self {
            chunk_edge,
            ..Self::default()
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            chunk_edge: DEFAULT_CHUNK_EDGE,
            cell_size: 1.0,
            initial_chunk_capacity: DEFAULT_INITIAL_CHUNK_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridCreateError {
    ChunkEdgeZero,
    ChunkEdgeTooLarge,
    CellSizeNotPositive,
    InitialCapacityZero,
}

impl fmt::Display for GridCreateError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridCreateError::ChunkEdgeZero => {
                write!(formatter, "chunk edge length must be at least 1")
            }
            GridCreateError::ChunkEdgeTooLarge => {
                write!(
                    formatter,
                    "chunk edge length must not exceed {MAX_CHUNK_EDGE}"
                )
            }
            GridCreateError::CellSizeNotPositive => {
                write!(formatter, "grid cell size must be positive and finite")
            }
            GridCreateError::InitialCapacityZero => {
                write!(formatter, "initial chunk capacity must be at least 1")
            }
        }
    }
}

impl std::error::Error for GridCreateError {}

mod coords;
mod layout;
mod store;

pub use coords::{CellCoordinate, CellRect, ChunkCoordinate, GridMapper, WorldRect};
pub use layout::ChunkLayout;
pub use store::{ChunkIndex, ChunkStore, StoreUpdate};
