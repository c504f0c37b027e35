use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};

use crate::{AtlasConfig, AtlasCreateError, AtlasRegisterError, MAX_ATLAS_SLOTS, TileSlot};

/// Pixel geometry of the atlas surface and its slot grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasLayout {
    cell_texture_size: u32,
    slots_wide: u32,
    slots_high: u32,
    surface_width: u32,
    surface_height: u32,
    slot_capacity: u32,
}

impl AtlasLayout {
    pub fn from_config(config: &AtlasConfig) -> Result<Self, AtlasCreateError> {
        if config.cell_texture_size == 0 {
            return Err(AtlasCreateError::CellTextureSizeZero);
        }
        if config.slots_wide == 0 || config.slots_high == 0 {
            return Err(AtlasCreateError::SlotGridZero);
        }
        let slot_capacity = config
            .slots_wide
            .checked_mul(config.slots_high)
            .ok_or(AtlasCreateError::SlotGridExceedsCellRange)?;
        if slot_capacity > MAX_ATLAS_SLOTS {
            return Err(AtlasCreateError::SlotGridExceedsCellRange);
        }
        let surface_width = config
            .slots_wide
            .checked_mul(config.cell_texture_size)
            .ok_or(AtlasCreateError::SurfaceSizeOverflow)?;
        let surface_height = config
            .slots_high
            .checked_mul(config.cell_texture_size)
            .ok_or(AtlasCreateError::SurfaceSizeOverflow)?;
        Ok(Self {
            cell_texture_size: config.cell_texture_size,
            slots_wide: config.slots_wide,
            slots_high: config.slots_high,
            surface_width,
            surface_height,
            slot_capacity,
        })
    }

    pub fn cell_texture_size(&self) -> u32 {
        self.cell_texture_size
    }

    pub fn slots_per_row(&self) -> u32 {
        self.slots_wide
    }

    pub fn surface_width(&self) -> u32 {
        self.surface_width
    }

    pub fn surface_height(&self) -> u32 {
        self.surface_height
    }

    pub fn slot_capacity(&self) -> u32 {
        self.slot_capacity
    }

    /// Byte length of one slot's tightly packed RGBA8 content.
    pub fn slot_pixel_len(&self) -> usize {
        self.cell_texture_size as usize * self.cell_texture_size as usize * 4
    }

    pub fn slot_pixel_origin(&self, slot: TileSlot) -> (u32, u32) {
        let index = u32::from(slot.index());
        assert!(
            index < self.slot_capacity,
            "slot {index} is out of bounds for atlas slot grid {}x{}",
            self.slots_wide,
            self.slots_high
        );
        (
            index % self.slots_wide * self.cell_texture_size,
            index / self.slots_wide * self.cell_texture_size,
        )
    }

    pub fn slot_uv_origin(&self, slot: TileSlot) -> (f32, f32) {
        let (origin_x, origin_y) = self.slot_pixel_origin(slot);
        (
            origin_x as f32 / self.surface_width as f32,
            origin_y as f32 / self.surface_height as f32,
        )
    }

    /// Fraction of the surface one slot covers along each axis.
    pub fn slot_uv_scale(&self) -> (f32, f32) {
        (
            self.cell_texture_size as f32 / self.surface_width as f32,
            self.cell_texture_size as f32 / self.surface_height as f32,
        )
    }
}

/// Outcome of a texture registration: a freshly assigned slot whose pixels
/// still need uploading, or the slot identical content already occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotAssignment {
    New(TileSlot),
    Existing(TileSlot),
}

impl SlotAssignment {
    pub fn slot(self) -> TileSlot {
        match self {
            SlotAssignment::New(slot) | SlotAssignment::Existing(slot) => slot,
        }
    }

    pub fn is_new(self) -> bool {
        matches!(self, SlotAssignment::New(_))
    }
}

/// Content-deduplicating slot allocator over the atlas slot grid.
///
/// Slot 0 is seeded as the fully blank texture at construction; callers
/// clear cells instead of registering blank content.
#[derive(Debug)]
pub struct AtlasAllocator {
    layout: AtlasLayout,
    next_slot: u32,
    slots_by_hash: HashMap<u64, TileSlot>,
    blank_hash: u64,
}

impl AtlasAllocator {
    pub fn new(layout: AtlasLayout) -> Self {
        let blank_pixels = vec![0u8; layout.slot_pixel_len()];
        let blank_hash = content_hash(&blank_pixels);
        let mut slots_by_hash = HashMap::new();
        slots_by_hash.insert(blank_hash, TileSlot::BLANK);
        Self {
            layout,
            next_slot: 1,
            slots_by_hash,
            blank_hash,
        }
    }

    pub fn layout(&self) -> &AtlasLayout {
        &self.layout
    }

    /// Number of live slots, including the reserved blank slot.
    pub fn texture_count(&self) -> u32 {
        self.next_slot
    }

    pub fn capacity(&self) -> u32 {
        self.layout.slot_capacity()
    }

    /// Assigns a slot for the pixel content, deduplicating by content hash.
    ///
    /// Pixels must be tightly packed RGBA8 of exactly the cell texture size.
    /// Content hashing is internal; identical bytes always resolve to the
    /// same slot without consuming a second one.
    pub fn register(&mut self, pixels: &[u8]) -> Result<SlotAssignment, AtlasRegisterError> {
        if pixels.len() != self.layout.slot_pixel_len() {
            return Err(AtlasRegisterError::InvalidArgument);
        }
        let hash = content_hash(pixels);
        if hash == self.blank_hash {
            return Err(AtlasRegisterError::DuplicateContent);
        }
        if let Some(&slot) = self.slots_by_hash.get(&hash) {
            log::debug!("atlas registration deduplicated to slot {}", slot.index());
            return Ok(SlotAssignment::Existing(slot));
        }
        if self.next_slot >= self.layout.slot_capacity() {
            log::warn!(
                "atlas allocator exhausted: {} of {} slots in use",
                self.next_slot,
                self.layout.slot_capacity()
            );
            return Err(AtlasRegisterError::AllocatorExhausted);
        }
        let slot = TileSlot::from_index(
            u8::try_from(self.next_slot).expect("slot index exceeds cell range"),
        );
        self.next_slot += 1;
        self.slots_by_hash.insert(hash, slot);
        Ok(SlotAssignment::New(slot))
    }
}

fn content_hash(pixels: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    pixels.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allocator_with_config(config: AtlasConfig) -> AtlasAllocator {
        AtlasAllocator::new(AtlasLayout::from_config(&config).expect("atlas layout"))
    }

    fn solid_pixels(layout: &AtlasLayout, value: u8) -> Vec<u8> {
        vec![value; layout.slot_pixel_len()]
    }

    #[test]
    fn registering_identical_content_returns_the_same_slot_once() {
        let mut allocator = allocator_with_config(AtlasConfig::default());
        let pixels = solid_pixels(allocator.layout(), 128);

        let first = allocator.register(&pixels).expect("first registration");
        assert_eq!(first, SlotAssignment::New(TileSlot::from_index(1)));

        let second = allocator.register(&pixels).expect("second registration");
        assert_eq!(second, SlotAssignment::Existing(TileSlot::from_index(1)));
        assert_eq!(allocator.texture_count(), 2);
    }

    #[test]
    fn blank_content_is_rejected_as_duplicate_of_the_reserved_slot() {
        let mut allocator = allocator_with_config(AtlasConfig::default());
        let blank = solid_pixels(allocator.layout(), 0);
        assert_eq!(
            allocator.register(&blank),
            Err(AtlasRegisterError::DuplicateContent)
        );
        assert_eq!(allocator.texture_count(), 1);
    }

    #[test]
    fn mismatched_pixel_length_fails_before_any_state_change() {
        let mut allocator = allocator_with_config(AtlasConfig::default());
        assert_eq!(
            allocator.register(&[255u8; 16]),
            Err(AtlasRegisterError::InvalidArgument)
        );
        assert_eq!(allocator.texture_count(), 1);
    }

    #[test]
    fn exhaustion_is_reported_once_every_slot_is_assigned() {
        let mut allocator = allocator_with_config(AtlasConfig::tiny4());
        for value in 1..=3u8 {
            let assignment = allocator
                .register(&solid_pixels(allocator.layout(), value))
                .expect("registration within capacity");
            assert_eq!(assignment, SlotAssignment::New(TileSlot::from_index(value)));
        }
        assert_eq!(allocator.texture_count(), allocator.capacity());
        assert_eq!(
            allocator.register(&solid_pixels(allocator.layout(), 4)),
            Err(AtlasRegisterError::AllocatorExhausted)
        );
    }

    #[test]
    fn slot_origins_walk_the_grid_row_major() {
        let layout = AtlasLayout::from_config(&AtlasConfig::default()).expect("atlas layout");
        assert_eq!(layout.slot_pixel_origin(TileSlot::BLANK), (0, 0));
        assert_eq!(layout.slot_pixel_origin(TileSlot::from_index(1)), (16, 0));
        assert_eq!(layout.slot_pixel_origin(TileSlot::from_index(17)), (16, 16));

        let (u, v) = layout.slot_uv_origin(TileSlot::from_index(17));
        assert_eq!((u, v), (0.0625, 0.0625));
        assert_eq!(layout.slot_uv_scale(), (0.0625, 0.0625));
    }

    #[test]
    fn layout_rejects_degenerate_configs() {
        assert_eq!(
            AtlasLayout::from_config(&AtlasConfig {
                cell_texture_size: 0,
                slots_wide: 2,
                slots_high: 2,
            }),
            Err(AtlasCreateError::CellTextureSizeZero)
        );
        assert_eq!(
            AtlasLayout::from_config(&AtlasConfig::with_slot_grid(0, 4)),
            Err(AtlasCreateError::SlotGridZero)
        );
        assert_eq!(
            AtlasLayout::from_config(&AtlasConfig::with_slot_grid(32, 32)),
            Err(AtlasCreateError::SlotGridExceedsCellRange)
        );
    }
}
