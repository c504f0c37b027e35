use tile_atlas::{AtlasCreateError, AtlasLayout, TileSlot};

use crate::args::IndirectRenderArgs;
use crate::device::GridDevice;

/// One transfer issued by the grid against the device, as observed by
/// [`RecordingDevice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordedTransfer {
    RecordsRecreated { len: usize },
    RecordsWritten { offset: usize, len: usize },
    ArgsRecreated { args: IndirectRenderArgs },
    ArgsInstanceCountWritten { instance_count: u32 },
    RenderBuffersReleased,
    AtlasSurfaceEnsured,
    AtlasSlotUploaded { slot: u8, len: usize },
}

/// In-memory [`GridDevice`] double. It keeps a byte-level copy of the record
/// buffer and a log of every transfer, so tests can assert both the final
/// device state and the exact traffic that produced it.
#[derive(Debug, Default)]
pub struct RecordingDevice {
    records: Vec<u8>,
    records_live: bool,
    args: Option<IndirectRenderArgs>,
    record_generation: u64,
    atlas_layout: Option<AtlasLayout>,
    transfers: Vec<RecordedTransfer>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Byte content of the simulated record buffer.
    pub fn records(&self) -> &[u8] {
        &self.records
    }

    pub fn args(&self) -> Option<IndirectRenderArgs> {
        self.args
    }

    pub fn records_live(&self) -> bool {
        self.records_live
    }

    pub fn record_generation(&self) -> u64 {
        self.record_generation
    }

    pub fn atlas_layout(&self) -> Option<&AtlasLayout> {
        self.atlas_layout.as_ref()
    }

    pub fn transfers(&self) -> &[RecordedTransfer] {
        &self.transfers
    }

    pub fn clear_transfers(&mut self) {
        self.transfers.clear();
    }
}

impl GridDevice for RecordingDevice {
    fn recreate_records(&mut self, contents: &[u8]) {
        self.records = contents.to_vec();
        self.records_live = true;
        self.record_generation += 1;
        self.transfers.push(RecordedTransfer::RecordsRecreated {
            len: contents.len(),
        });
    }

    fn write_records(&mut self, offset: usize, bytes: &[u8]) {
        assert!(
            self.records_live,
            "partial record write without a live record buffer"
        );
        self.records[offset..offset + bytes.len()].copy_from_slice(bytes);
        self.transfers.push(RecordedTransfer::RecordsWritten {
            offset,
            len: bytes.len(),
        });
    }

    fn recreate_args(&mut self, args: IndirectRenderArgs) {
        self.args = Some(args);
        self.transfers.push(RecordedTransfer::ArgsRecreated { args });
    }

    fn write_args_instance_count(&mut self, instance_count: u32) {
        let Some(args) = self.args.as_mut() else {
            panic!("instance count write without a live args buffer");
        };
        args.instance_count = instance_count;
        self.transfers
            .push(RecordedTransfer::ArgsInstanceCountWritten { instance_count });
    }

    fn release_render_buffers(&mut self) {
        self.records.clear();
        self.records_live = false;
        self.args = None;
        self.transfers.push(RecordedTransfer::RenderBuffersReleased);
    }

    fn ensure_atlas_surface(&mut self, layout: &AtlasLayout) -> Result<(), AtlasCreateError> {
        if self.atlas_layout.is_none() {
            self.atlas_layout = Some(*layout);
            self.transfers.push(RecordedTransfer::AtlasSurfaceEnsured);
        }
        Ok(())
    }

    fn upload_atlas_slot(&mut self, layout: &AtlasLayout, slot: TileSlot, pixels: &[u8]) {
        debug_assert_eq!(pixels.len(), layout.slot_pixel_len());
        self.transfers.push(RecordedTransfer::AtlasSlotUploaded {
            slot: slot.index(),
            len: pixels.len(),
        });
    }
}
