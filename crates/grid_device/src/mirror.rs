use chunk_grid::{ChunkStore, StoreUpdate};

use crate::args::IndirectRenderArgs;
use crate::device::GridDevice;

/// Keeps the device-resident record and args buffers consistent with the
/// host-side chunk store.
///
/// The mirror starts inactive: no device buffers exist and every store
/// update lands in the host mirror alone. Activation uploads the full mirror
/// and seeds the draw args; deactivation releases both buffers again.
#[derive(Debug)]
pub struct ChunkDeviceMirror<D: GridDevice> {
    device: D,
    active: bool,
    last_render_count: Option<u32>,
}

impl<D: GridDevice> ChunkDeviceMirror<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            active: false,
            last_render_count: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Recreates the record and args buffers from the host mirror. A store
    /// that never allocated gets its record buffer on first growth instead.
    pub fn activate(&mut self, store: &ChunkStore, mesh_index_count: u32) {
        if self.active {
            return;
        }
        if store.capacity() > 0 {
            self.device.recreate_records(store.mirror_bytes());
        }
        let render_count = store.existing_count();
        self.device
            .recreate_args(IndirectRenderArgs::for_chunk_mesh(
                mesh_index_count,
                render_count,
            ));
        self.last_render_count = Some(render_count);
        self.active = true;
        log::debug!(
            "grid device mirror activated: {} records, {} mirror bytes",
            render_count,
            store.mirror_bytes().len()
        );
    }

    /// Releases the device buffers. The host mirror stays authoritative and
    /// the next activation re-uploads it in full.
    pub fn deactivate(&mut self) {
        if !self.active {
            return;
        }
        self.device.release_render_buffers();
        self.last_render_count = None;
        self.active = false;
        log::debug!("grid device mirror deactivated");
    }

    /// Applies one store update to the device copy.
    ///
    /// Cell writes and appends transfer exactly the touched byte ranges.
    /// Growth recreates the record buffer from the whole mirror in a single
    /// transfer, invalidating any handle bound over the old buffer.
    pub fn apply_update(&mut self, store: &ChunkStore, update: &StoreUpdate) {
        if !self.active {
            return;
        }
        let mirror = store.mirror_bytes();
        match update {
            StoreUpdate::Unchanged => {}
            StoreUpdate::CellWritten { word } => {
                self.device.write_records(word.start, &mirror[word.clone()]);
            }
            StoreUpdate::ChunkAppended { header, cell_word } => {
                self.device
                    .write_records(header.start, &mirror[header.clone()]);
                self.device
                    .write_records(cell_word.start, &mirror[cell_word.clone()]);
            }
            StoreUpdate::StoreGrown { capacity } => {
                log::debug!(
                    "record buffer grown to {capacity} records, re-uploading {} bytes",
                    mirror.len()
                );
                self.device.recreate_records(mirror);
            }
        }
    }

    /// Rewrites the args instance count, but only when the chunk count moved
    /// since the previous refresh.
    pub fn refresh_render_count(&mut self, store: &ChunkStore) {
        if !self.active {
            return;
        }
        let render_count = store.existing_count();
        if self.last_render_count == Some(render_count) {
            return;
        }
        self.device.write_args_instance_count(render_count);
        self.last_render_count = Some(render_count);
    }
}
