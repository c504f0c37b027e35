use super::*;

fn create_device_queue() -> Option<(wgpu::Device, wgpu::Queue)> {
    pollster::block_on(async {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok()?;
        let limits = adapter.limits();
        adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("tile_atlas tests"),
                required_features: wgpu::Features::empty(),
                required_limits: limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .ok()
    })
}

#[test]
fn surface_slot_uploads_pass_device_validation() {
    let _ = env_logger::builder().is_test(true).try_init();
    let Some((device, queue)) = create_device_queue() else {
        eprintln!("skipping: no wgpu adapter available");
        return;
    };
    let layout = AtlasLayout::from_config(&AtlasConfig::default()).expect("atlas layout");

    let error_scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let surface = AtlasSurface::create(&device, &layout).expect("atlas surface");
    surface.upload_blank(&queue, &layout);

    let pixels = vec![200u8; layout.slot_pixel_len()];
    surface.upload_slot(&queue, &layout, TileSlot::from_index(1), &pixels);
    let last_slot = TileSlot::from_index((layout.slot_capacity() - 1) as u8);
    surface.upload_slot(&queue, &layout, last_slot, &pixels);
    queue.submit([]);

    let error = pollster::block_on(error_scope.pop());
    assert!(error.is_none(), "atlas upload validation failed: {error:?}");
}

#[test]
fn surface_creation_respects_device_limits() {
    let Some((device, _queue)) = create_device_queue() else {
        eprintln!("skipping: no wgpu adapter available");
        return;
    };
    // 256 slots of enormous cells: the slot grid is legal but the surface
    // pixel size exceeds any real device limit.
    let config = AtlasConfig {
        cell_texture_size: 1 << 20,
        slots_wide: 16,
        slots_high: 16,
    };
    let layout = AtlasLayout::from_config(&config).expect("atlas layout");
    assert_eq!(
        AtlasSurface::create(&device, &layout).err(),
        Some(AtlasCreateError::SurfaceSizeExceedsDeviceLimit)
    );
}
