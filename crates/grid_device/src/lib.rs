//! Grid device crate root.
//!
//! This module defines the public API (`ChunkedTileGrid`, `GridDevice`,
//! `SharedGridResources`) and wires the host-side chunk store, the atlas
//! allocator, and the device mirror into one grid surface.
//!
//! Internal architecture overview:
//! - `args`: indirect draw argument layout shared with the device.
//! - `device`: the `GridDevice` seam and its wgpu implementation.
//! - `mirror`: keeps device buffers consistent with the host mirror.
//! - `shared`: per-device chunk mesh, pipeline, and bind group factory.
//! - `recording`: transfer-logging device double for tests.

use std::collections::HashMap;
use std::fmt;

use chunk_grid::{
    CellCoordinate, CellRect, ChunkStore, GridConfig, GridCreateError, GridMapper, WorldRect,
};
use tile_atlas::{
    AtlasAllocator, AtlasConfig, AtlasCreateError, AtlasLayout, AtlasRegisterError, SlotAssignment,
    TileCatalog, TileCatalogError, TileSlot,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileGridCreateError {
    Grid(GridCreateError),
    Atlas(AtlasCreateError),
}

impl fmt::Display for TileGridCreateError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileGridCreateError::Grid(error) => {
                write!(formatter, "grid configuration rejected: {error}")
            }
            TileGridCreateError::Atlas(error) => {
                write!(formatter, "atlas configuration rejected: {error}")
            }
        }
    }
}

impl std::error::Error for TileGridCreateError {}

impl From<GridCreateError> for TileGridCreateError {
    fn from(error: GridCreateError) -> Self {
        TileGridCreateError::Grid(error)
    }
}

impl From<AtlasCreateError> for TileGridCreateError {
    fn from(error: AtlasCreateError) -> Self {
        TileGridCreateError::Atlas(error)
    }
}

/// Errors raised by grid operations after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridError {
    /// The tile slot does not name a registered texture.
    IndexOutOfRange,
    Atlas(AtlasRegisterError),
    AtlasCreate(AtlasCreateError),
    Catalog(TileCatalogError),
}

impl fmt::Display for GridError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::IndexOutOfRange => {
                write!(formatter, "tile slot is outside the registered texture range")
            }
            GridError::Atlas(error) => {
                write!(formatter, "texture registration failed: {error}")
            }
            GridError::AtlasCreate(error) => {
                write!(formatter, "atlas surface creation failed: {error}")
            }
            GridError::Catalog(error) => {
                write!(formatter, "tile kind lookup failed: {error}")
            }
        }
    }
}

impl std::error::Error for GridError {}

impl From<AtlasRegisterError> for GridError {
    fn from(error: AtlasRegisterError) -> Self {
        GridError::Atlas(error)
    }
}

impl From<AtlasCreateError> for GridError {
    fn from(error: AtlasCreateError) -> Self {
        GridError::AtlasCreate(error)
    }
}

impl From<TileCatalogError> for GridError {
    fn from(error: TileCatalogError) -> Self {
        GridError::Catalog(error)
    }
}

/// Sparse, unbounded grid of textured cells over a [`GridDevice`].
///
/// Cell writes land in the host-side chunk store immediately; while the grid
/// is active the device mirror follows along with partial writes, full
/// re-uploads on growth, and an instance count refresh per visibility pass.
#[derive(Debug)]
pub struct ChunkedTileGrid<D: GridDevice> {
    store: ChunkStore,
    mirror: ChunkDeviceMirror<D>,
    atlas_layout: AtlasLayout,
    atlas: Option<AtlasAllocator>,
    kind_slots: HashMap<String, TileSlot>,
    mesh_index_count: u32,
}

impl<D: GridDevice> ChunkedTileGrid<D> {
    /// Validates both configurations and builds an empty, inactive grid.
    /// Neither the record buffer nor the atlas surface is allocated yet.
    pub fn new(
        device: D,
        grid_config: GridConfig,
        atlas_config: AtlasConfig,
    ) -> Result<Self, TileGridCreateError> {
        let store = ChunkStore::with_config(grid_config)?;
        let atlas_layout = AtlasLayout::from_config(&atlas_config)?;
        let mesh_index_count = chunk_mesh_index_count(store.layout());
        Ok(Self {
            store,
            mirror: ChunkDeviceMirror::new(device),
            atlas_layout,
            atlas: None,
            kind_slots: HashMap::new(),
            mesh_index_count,
        })
    }

    pub fn store(&self) -> &ChunkStore {
        &self.store
    }

    pub fn mapper(&self) -> GridMapper {
        self.store.mapper()
    }

    pub fn atlas_layout(&self) -> &AtlasLayout {
        &self.atlas_layout
    }

    pub fn device(&self) -> &D {
        self.mirror.device()
    }

    pub fn device_mut(&mut self) -> &mut D {
        self.mirror.device_mut()
    }

    pub fn is_active(&self) -> bool {
        self.mirror.is_active()
    }

    /// Index count of the shared chunk mesh this grid draws with.
    pub fn mesh_index_count(&self) -> u32 {
        self.mesh_index_count
    }

    /// Registered textures including the reserved blank slot, zero until the
    /// first registration creates the atlas.
    pub fn texture_count(&self) -> u32 {
        self.atlas.as_ref().map_or(0, AtlasAllocator::texture_count)
    }

    /// Number of chunk records the device draws as instances.
    pub fn render_count(&self) -> u32 {
        self.store.existing_count()
    }

    /// Cell-space bounding rectangle of every chunk ever created.
    pub fn bounds(&self) -> Option<CellRect> {
        self.store.bounds()
    }

    pub fn world_bounds(&self) -> Option<WorldRect> {
        Some(self.store.bounds()?.to_world(self.store.mapper().cell_size()))
    }

    fn ensure_atlas(&mut self) -> Result<&mut AtlasAllocator, GridError> {
        if self.atlas.is_none() {
            self.mirror
                .device_mut()
                .ensure_atlas_surface(&self.atlas_layout)?;
            self.atlas = Some(AtlasAllocator::new(self.atlas_layout));
            log::debug!(
                "atlas allocator created with {} slots",
                self.atlas_layout.slot_capacity()
            );
        }
        Ok(self
            .atlas
            .as_mut()
            .expect("atlas allocator initialized above"))
    }

    /// Registers texture content and returns its atlas slot.
    ///
    /// The first registration creates the atlas surface. Content identical
    /// to an already registered texture resolves to the existing slot and
    /// uploads nothing.
    pub fn register_texture(&mut self, pixels: &[u8]) -> Result<TileSlot, GridError> {
        let atlas_layout = self.atlas_layout;
        let assignment = self.ensure_atlas()?.register(pixels)?;
        if let SlotAssignment::New(slot) = assignment {
            self.mirror
                .device_mut()
                .upload_atlas_slot(&atlas_layout, slot, pixels);
        }
        Ok(assignment.slot())
    }

    /// Resolves a catalog kind to its atlas slot, producing and registering
    /// its pixels on first use and caching the result per kind name.
    pub fn register_kind(
        &mut self,
        catalog: &TileCatalog,
        kind: &str,
    ) -> Result<TileSlot, GridError> {
        if let Some(&slot) = self.kind_slots.get(kind) {
            return Ok(slot);
        }
        let pixels = catalog.produce(kind)?;
        let slot = self.register_texture(&pixels)?;
        self.kind_slots.insert(kind.to_string(), slot);
        Ok(slot)
    }

    /// Writes one cell. Non-blank slots must name a registered texture; the
    /// blank slot is always accepted and never creates a chunk on its own.
    pub fn set_cell_tile(&mut self, cell: CellCoordinate, tile: TileSlot) -> Result<(), GridError> {
        if !tile.is_blank() && u32::from(tile.index()) >= self.texture_count() {
            return Err(GridError::IndexOutOfRange);
        }
        let update = self.store.set_cell(cell, tile.index());
        self.mirror.apply_update(&self.store, &update);
        Ok(())
    }

    /// Writes the blank slot. The containing chunk, if any, stays allocated.
    pub fn clear_cell_tile(&mut self, cell: CellCoordinate) -> Result<(), GridError> {
        self.set_cell_tile(cell, TileSlot::BLANK)
    }

    /// Current slot of a cell; blank for cells whose chunk was never created.
    pub fn cell_tile(&self, cell: CellCoordinate) -> TileSlot {
        TileSlot::from_index(self.store.cell_value(cell))
    }

    /// Binds or releases the device buffers as the grid enters and leaves
    /// the rendered set. Reactivation re-uploads the full host mirror.
    pub fn set_active(&mut self, active: bool) {
        if active {
            self.mirror.activate(&self.store, self.mesh_index_count);
        } else {
            self.mirror.deactivate();
        }
    }

    /// Pushes the chunk count into the draw args when it changed since the
    /// last refresh. Call once per visibility pass.
    pub fn refresh_render_count(&mut self) {
        self.mirror.refresh_render_count(&self.store);
    }
}

mod args;
mod device;
mod mirror;
#[cfg(any(test, feature = "test-helpers"))]
mod recording;
mod shared;

pub use args::{INSTANCE_COUNT_OFFSET, IndirectRenderArgs};
pub use device::{GridDevice, WgpuGridDevice};
pub use mirror::ChunkDeviceMirror;
#[cfg(any(test, feature = "test-helpers"))]
pub use recording::{RecordedTransfer, RecordingDevice};
pub use shared::{GridParamsGpu, SharedGridResources, chunk_mesh_index_count};

#[cfg(test)]
mod wgsl_tests;
