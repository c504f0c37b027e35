use crate::{AtlasCreateError, AtlasLayout, TileSlot};

/// GPU surface backing the atlas: one RGBA8 texture holding every slot.
#[derive(Debug)]
pub struct AtlasSurface {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl AtlasSurface {
    pub fn create(device: &wgpu::Device, layout: &AtlasLayout) -> Result<Self, AtlasCreateError> {
        let limits = device.limits();
        if layout.surface_width() > limits.max_texture_dimension_2d
            || layout.surface_height() > limits.max_texture_dimension_2d
        {
            return Err(AtlasCreateError::SurfaceSizeExceedsDeviceLimit);
        }
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("tile_atlas.surface"),
            size: wgpu::Extent3d {
                width: layout.surface_width(),
                height: layout.surface_height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("tile_atlas.surface_view"),
            format: Some(wgpu::TextureFormat::Rgba8Unorm),
            dimension: Some(wgpu::TextureViewDimension::D2),
            usage: None,
            aspect: wgpu::TextureAspect::All,
            base_mip_level: 0,
            mip_level_count: Some(1),
            base_array_layer: 0,
            array_layer_count: Some(1),
        });
        log::debug!(
            "atlas surface created: {}x{} pixels, {} slots",
            layout.surface_width(),
            layout.surface_height(),
            layout.slot_capacity()
        );
        Ok(Self { texture, view })
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Copies one slot's pixels into its cell of the surface.
    pub fn upload_slot(
        &self,
        queue: &wgpu::Queue,
        layout: &AtlasLayout,
        slot: TileSlot,
        pixels: &[u8],
    ) {
        debug_assert_eq!(pixels.len(), layout.slot_pixel_len());
        let (origin_x, origin_y) = layout.slot_pixel_origin(slot);
        let size = layout.cell_texture_size();
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: origin_x,
                    y: origin_y,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(size * 4),
                rows_per_image: Some(size),
            },
            wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Writes transparent pixels into the reserved blank slot. The blank
    /// slot's content is part of the shader contract, not left to texture
    /// zero-initialization.
    pub fn upload_blank(&self, queue: &wgpu::Queue, layout: &AtlasLayout) {
        let blank = vec![0u8; layout.slot_pixel_len()];
        self.upload_slot(queue, layout, TileSlot::BLANK, &blank);
    }
}
