use std::sync::Arc;

use static_assertions::const_assert_eq;
use wgpu::util::DeviceExt;

use chunk_grid::ChunkLayout;
use tile_atlas::AtlasLayout;

/// Index count of the shared chunk cell mesh: two triangles per cell, drawn
/// once per chunk record instance.
pub fn chunk_mesh_index_count(layout: &ChunkLayout) -> u32 {
    layout.cells_per_chunk() * 6
}

/// Uniform parameters of the grid pipeline, std140-compatible.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GridParamsGpu {
    pub view_scale: [f32; 2],
    pub view_offset: [f32; 2],
    pub cell_uv_scale: [f32; 2],
    pub chunk_edge: u32,
    pub record_words: u32,
    pub slots_per_row: u32,
    pub _pad: [u32; 3],
}

const_assert_eq!(std::mem::size_of::<GridParamsGpu>(), 48);

impl GridParamsGpu {
    /// Packs the grid and atlas layouts plus a world-to-clip transform into
    /// the shader's uniform block.
    pub fn new(
        chunk_layout: &ChunkLayout,
        atlas_layout: &AtlasLayout,
        view_scale: [f32; 2],
        view_offset: [f32; 2],
    ) -> Self {
        let (uv_scale_x, uv_scale_y) = atlas_layout.slot_uv_scale();
        Self {
            view_scale,
            view_offset,
            cell_uv_scale: [uv_scale_x, uv_scale_y],
            chunk_edge: chunk_layout.chunk_edge(),
            record_words: (chunk_layout.stride() / 4) as u32,
            slots_per_row: atlas_layout.slots_per_row(),
            _pad: [0; 3],
        }
    }
}

/// Immutable render resources shared by every grid drawing against the same
/// device: the chunk cell mesh, the bind group layout, the pipeline, and the
/// atlas sampler.
///
/// Built once per device by the factory below and handed around as an
/// [`Arc`]; per-grid state (record buffer, args, atlas surface) stays in
/// [`crate::WgpuGridDevice`].
#[derive(Debug)]
pub struct SharedGridResources {
    index_buffer: wgpu::Buffer,
    index_count: u32,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline: wgpu::RenderPipeline,
    sampler: wgpu::Sampler,
}

impl SharedGridResources {
    /// Builds the shared mesh and pipeline for chunks of `chunk_layout`,
    /// rendering into `target_format` attachments.
    pub fn create(
        device: &wgpu::Device,
        chunk_layout: &ChunkLayout,
        target_format: wgpu::TextureFormat,
    ) -> Arc<Self> {
        let cells = chunk_layout.cells_per_chunk();
        let mut indices = Vec::with_capacity(cells as usize * 6);
        for cell in 0..cells {
            let base = cell * 4;
            indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 1, base + 3]);
        }
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("grid.chunk_mesh_indices"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("grid.bind_group_layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: true },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 3,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("grid.pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("grid.shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("chunk_grid.wgsl").into()),
        });
        // Vertex pulling: corners come from the index value, so no vertex
        // buffers are bound.
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("grid.pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("grid.atlas_sampler"),
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Arc::new(Self {
            index_buffer,
            index_count: chunk_mesh_index_count(chunk_layout),
            bind_group_layout,
            pipeline,
            sampler,
        })
    }

    pub fn index_buffer(&self) -> &wgpu::Buffer {
        &self.index_buffer
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    pub fn create_params_buffer(
        &self,
        device: &wgpu::Device,
        params: GridParamsGpu,
    ) -> wgpu::Buffer {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("grid.params"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        })
    }

    /// Bind group over the live record buffer and atlas view. Record buffer
    /// handles move on growth, so callers rebuild this whenever the device's
    /// record generation changes.
    pub fn create_grid_bind_group(
        &self,
        device: &wgpu::Device,
        params_buffer: &wgpu::Buffer,
        record_buffer: &wgpu::Buffer,
        atlas_view: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("grid.bind_group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: record_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(atlas_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }
}
