use wgpu::util::DeviceExt;

use tile_atlas::{AtlasCreateError, AtlasLayout, AtlasSurface, TileSlot};

use crate::args::{INSTANCE_COUNT_OFFSET, IndirectRenderArgs};

/// Device-side operations the grid drives. This is the seam between the
/// host-side grid state and the GPU; tests substitute a recording double.
pub trait GridDevice {
    /// Replaces the record buffer with a fresh allocation holding
    /// `contents`. Any previously handed-out handle is invalidated.
    fn recreate_records(&mut self, contents: &[u8]);

    /// Partial write into the live record buffer. The caller aligns `offset`
    /// and `bytes` to whole words.
    fn write_records(&mut self, offset: usize, bytes: &[u8]);

    /// Replaces the indirect args buffer with one holding `args`.
    fn recreate_args(&mut self, args: IndirectRenderArgs);

    /// Rewrites only the instance count field of the live args buffer.
    fn write_args_instance_count(&mut self, instance_count: u32);

    /// Drops the record and args buffers. The atlas surface stays alive so
    /// registered textures survive deactivation.
    fn release_render_buffers(&mut self);

    /// Creates the atlas surface on first call; later calls are no-ops.
    fn ensure_atlas_surface(&mut self, layout: &AtlasLayout) -> Result<(), AtlasCreateError>;

    /// Uploads one slot's pixels into the atlas surface.
    fn upload_atlas_slot(&mut self, layout: &AtlasLayout, slot: TileSlot, pixels: &[u8]);
}

/// [`GridDevice`] backed by a real wgpu device and queue.
#[derive(Debug)]
pub struct WgpuGridDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    record_buffer: Option<wgpu::Buffer>,
    args_buffer: Option<wgpu::Buffer>,
    atlas_surface: Option<AtlasSurface>,
    record_generation: u64,
}

impl WgpuGridDevice {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            record_buffer: None,
            args_buffer: None,
            atlas_surface: None,
            record_generation: 0,
        }
    }

    pub fn record_buffer(&self) -> Option<&wgpu::Buffer> {
        self.record_buffer.as_ref()
    }

    pub fn args_buffer(&self) -> Option<&wgpu::Buffer> {
        self.args_buffer.as_ref()
    }

    pub fn atlas_surface(&self) -> Option<&AtlasSurface> {
        self.atlas_surface.as_ref()
    }

    /// Increments whenever the record buffer handle changes. Consumers
    /// holding a bind group over the buffer rebind when this moves.
    pub fn record_generation(&self) -> u64 {
        self.record_generation
    }
}

impl GridDevice for WgpuGridDevice {
    fn recreate_records(&mut self, contents: &[u8]) {
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("grid.chunk_records"),
            size: contents.len() as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.queue.write_buffer(&buffer, 0, contents);
        self.record_buffer = Some(buffer);
        self.record_generation += 1;
        log::debug!(
            "chunk record buffer recreated: {} bytes, generation {}",
            contents.len(),
            self.record_generation
        );
    }

    fn write_records(&mut self, offset: usize, bytes: &[u8]) {
        let Some(buffer) = self.record_buffer.as_ref() else {
            panic!("partial record write without a live record buffer");
        };
        self.queue.write_buffer(buffer, offset as u64, bytes);
    }

    fn recreate_args(&mut self, args: IndirectRenderArgs) {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("grid.indirect_args"),
                contents: bytemuck::bytes_of(&args),
                usage: wgpu::BufferUsages::INDIRECT | wgpu::BufferUsages::COPY_DST,
            });
        self.args_buffer = Some(buffer);
    }

    fn write_args_instance_count(&mut self, instance_count: u32) {
        let Some(buffer) = self.args_buffer.as_ref() else {
            panic!("instance count write without a live args buffer");
        };
        self.queue.write_buffer(
            buffer,
            INSTANCE_COUNT_OFFSET,
            bytemuck::bytes_of(&instance_count),
        );
    }

    fn release_render_buffers(&mut self) {
        self.record_buffer = None;
        self.args_buffer = None;
    }

    fn ensure_atlas_surface(&mut self, layout: &AtlasLayout) -> Result<(), AtlasCreateError> {
        if self.atlas_surface.is_none() {
            let surface = AtlasSurface::create(&self.device, layout)?;
            surface.upload_blank(&self.queue, layout);
            self.atlas_surface = Some(surface);
        }
        Ok(())
    }

    fn upload_atlas_slot(&mut self, layout: &AtlasLayout, slot: TileSlot, pixels: &[u8]) {
        let Some(surface) = self.atlas_surface.as_ref() else {
            panic!("atlas slot upload before the surface was created");
        };
        surface.upload_slot(&self.queue, layout, slot, pixels);
    }
}
