use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;

/// Closure producing a tile kind's pixel content on demand.
pub type TilePixelProducer = Box<dyn Fn() -> Vec<u8> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileCatalogError {
    DuplicateKind,
    UnknownKind,
}

impl fmt::Display for TileCatalogError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileCatalogError::DuplicateKind => {
                write!(formatter, "tile kind is already registered in the catalog")
            }
            TileCatalogError::UnknownKind => {
                write!(formatter, "tile kind is not registered in the catalog")
            }
        }
    }
}

impl std::error::Error for TileCatalogError {}

/// Registration-time dispatch table from tile kind to pixel constructor.
///
/// Populated once at startup; instantiating a kind afterwards is a plain
/// table lookup plus one closure call.
pub struct TileCatalog {
    producers: HashMap<String, TilePixelProducer>,
}

impl fmt::Debug for TileCatalog {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("TileCatalog")
            .field("kinds", &self.producers.len())
            .finish()
    }
}

impl Default for TileCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl TileCatalog {
    pub fn new() -> Self {
        Self {
            producers: HashMap::new(),
        }
    }

    pub fn register_kind<F>(
        &mut self,
        kind: impl Into<String>,
        producer: F,
    ) -> Result<(), TileCatalogError>
    where
        F: Fn() -> Vec<u8> + Send + Sync + 'static,
    {
        match self.producers.entry(kind.into()) {
            Entry::Occupied(_) => Err(TileCatalogError::DuplicateKind),
            Entry::Vacant(vacant) => {
                vacant.insert(Box::new(producer));
                Ok(())
            }
        }
    }

    pub fn produce(&self, kind: &str) -> Result<Vec<u8>, TileCatalogError> {
        let producer = self
            .producers
            .get(kind)
            .ok_or(TileCatalogError::UnknownKind)?;
        Ok(producer())
    }

    pub fn contains_kind(&self, kind: &str) -> bool {
        self.producers.contains_key(kind)
    }

    pub fn kind_count(&self) -> usize {
        self.producers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AtlasAllocator, AtlasConfig, AtlasLayout, SlotAssignment, TileSlot};

    #[test]
    fn duplicate_kind_registration_is_rejected() {
        let mut catalog = TileCatalog::new();
        catalog
            .register_kind("grass", || vec![0, 255, 0, 255])
            .expect("first registration");
        assert_eq!(
            catalog.register_kind("grass", || vec![0, 200, 0, 255]),
            Err(TileCatalogError::DuplicateKind)
        );
        assert_eq!(catalog.kind_count(), 1);
    }

    #[test]
    fn unknown_kind_lookup_fails() {
        let catalog = TileCatalog::new();
        assert_eq!(catalog.produce("water"), Err(TileCatalogError::UnknownKind));
        assert!(!catalog.contains_kind("water"));
    }

    #[test]
    fn produced_content_feeds_the_allocator() {
        let layout = AtlasLayout::from_config(&AtlasConfig::default()).expect("atlas layout");
        let pixel_len = layout.slot_pixel_len();

        let mut catalog = TileCatalog::new();
        catalog
            .register_kind("stone", move || vec![90u8; pixel_len])
            .expect("register stone");

        let mut allocator = AtlasAllocator::new(layout);
        let pixels = catalog.produce("stone").expect("produce stone");
        let assignment = allocator.register(&pixels).expect("register stone pixels");
        assert_eq!(assignment, SlotAssignment::New(TileSlot::from_index(1)));

        let again = catalog.produce("stone").expect("produce stone again");
        assert_eq!(
            allocator.register(&again).expect("re-register stone pixels"),
            SlotAssignment::Existing(TileSlot::from_index(1))
        );
    }
}
