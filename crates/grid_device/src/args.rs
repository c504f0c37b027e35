use static_assertions::const_assert_eq;

/// Arguments of one indexed, instanced draw, laid out exactly as the device
/// consumes them from an indirect buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct IndirectRenderArgs {
    pub index_count: u32,
    pub instance_count: u32,
    pub first_index: u32,
    pub base_vertex: i32,
    pub first_instance: u32,
}

/// Byte offset of `instance_count` inside the args buffer, the only field
/// rewritten after creation.
pub const INSTANCE_COUNT_OFFSET: u64 = 4;

const_assert_eq!(std::mem::size_of::<IndirectRenderArgs>(), 20);
const_assert_eq!(
    std::mem::offset_of!(IndirectRenderArgs, instance_count),
    INSTANCE_COUNT_OFFSET as usize
);

impl IndirectRenderArgs {
    /// Args drawing `instance_count` chunk records with the shared chunk
    /// mesh. Offsets stay zero, the mesh and records are indexed from their
    /// start.
    pub fn for_chunk_mesh(index_count: u32, instance_count: u32) -> Self {
        Self {
            index_count,
            instance_count,
            first_index: 0,
            base_vertex: 0,
            first_instance: 0,
        }
    }
}
