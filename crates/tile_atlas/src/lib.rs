use std::fmt;

pub const DEFAULT_CELL_TEXTURE_SIZE: u32 = 16;
pub const MAX_ATLAS_SLOTS: u32 = 256;

/// Index of one fixed-size texture cell inside the atlas surface.
///
/// Slot 0 is reserved for the fully blank texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileSlot(u8);

impl TileSlot {
    pub const BLANK: TileSlot = TileSlot(0);

    pub fn from_index(index: u8) -> Self {
        Self(index)
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn is_blank(self) -> bool {
        self.0 == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasConfig {
    pub cell_texture_size: u32,
    pub slots_wide: u32,
    pub slots_high: u32,
}

impl AtlasConfig {
    /// Creates a config with the specified slot grid.
    pub fn with_slot_grid(slots_wide: u32, slots_high: u32) -> Self {
        Self {
            cell_texture_size: DEFAULT_CELL_TEXTURE_SIZE,
            slots_wide,
            slots_high,
        }
    }

    /// Creates a config with a 2x2 slot grid, the smallest useful atlas.
    pub fn tiny4() -> Self {
        Self::with_slot_grid(2, 2)
    }

    /// Creates a config with a 16x16 slot grid, the full range a cell byte
    /// can address (default for production).
    pub fn full256() -> Self {
        Self::with_slot_grid(16, 16)
    }
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self::full256()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtlasCreateError {
    CellTextureSizeZero,
    SlotGridZero,
    SlotGridExceedsCellRange,
    SurfaceSizeOverflow,
    SurfaceSizeExceedsDeviceLimit,
}

impl fmt::Display for AtlasCreateError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtlasCreateError::CellTextureSizeZero => {
                write!(formatter, "atlas cell texture size must be at least 1")
            }
            AtlasCreateError::SlotGridZero => {
                write!(formatter, "atlas slots_wide/slots_high must be at least 1")
            }
            AtlasCreateError::SlotGridExceedsCellRange => {
                write!(
                    formatter,
                    "atlas slot grid must not exceed {MAX_ATLAS_SLOTS} slots"
                )
            }
            AtlasCreateError::SurfaceSizeOverflow => {
                write!(formatter, "atlas surface pixel size overflows")
            }
            AtlasCreateError::SurfaceSizeExceedsDeviceLimit => {
                write!(
                    formatter,
                    "atlas surface exceeds the device texture dimension limit"
                )
            }
        }
    }
}

impl std::error::Error for AtlasCreateError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtlasRegisterError {
    InvalidArgument,
    DuplicateContent,
    AllocatorExhausted,
}

impl fmt::Display for AtlasRegisterError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtlasRegisterError::InvalidArgument => {
                write!(
                    formatter,
                    "texture pixel buffer does not match the atlas cell size"
                )
            }
            AtlasRegisterError::DuplicateContent => {
                write!(
                    formatter,
                    "texture content matches the reserved blank slot"
                )
            }
            AtlasRegisterError::AllocatorExhausted => {
                write!(formatter, "texture atlas has no free slots")
            }
        }
    }
}

impl std::error::Error for AtlasRegisterError {}

mod allocator;
mod catalog;
#[cfg(feature = "atlas-gpu")]
mod surface;

pub use allocator::{AtlasAllocator, AtlasLayout, SlotAssignment};
pub use catalog::{TileCatalog, TileCatalogError, TilePixelProducer};
#[cfg(feature = "atlas-gpu")]
pub use surface::AtlasSurface;

#[cfg(all(test, feature = "atlas-gpu"))]
mod tests;
