#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCoordinate {
    pub x: i32,
    pub y: i32,
}

impl CellCoordinate {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkCoordinate {
    pub x: i32,
    pub y: i32,
}

impl ChunkCoordinate {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Stateless cell/chunk/world coordinate math for a fixed chunk edge length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMapper {
    chunk_edge: u32,
    cell_size: f32,
}

impl GridMapper {
    pub fn new(chunk_edge: u32, cell_size: f32) -> Self {
        debug_assert!(chunk_edge > 0, "chunk edge must be at least 1");
        debug_assert!(
            cell_size.is_finite() && cell_size > 0.0,
            "cell size must be positive"
        );
        Self {
            chunk_edge,
            cell_size,
        }
    }

    pub fn chunk_edge(self) -> u32 {
        self.chunk_edge
    }

    pub fn cell_size(self) -> f32 {
        self.cell_size
    }

    /// Floor division of the cell coordinate by the chunk edge, exact for
    /// negative coordinates: cell `(-1, -1)` lives in chunk `(-1, -1)`,
    /// never `(0, 0)`.
    pub fn chunk_of_cell(self, cell: CellCoordinate) -> ChunkCoordinate {
        let edge = self.chunk_edge as i32;
        ChunkCoordinate {
            x: cell.x.div_euclid(edge),
            y: cell.y.div_euclid(edge),
        }
    }

    /// Row-major offset of `cell` within `chunk`, in `[0, edge * edge)`.
    ///
    /// A cell outside the chunk is a coordinate-math defect upstream, not a
    /// state this function repairs.
    pub fn local_index(self, cell: CellCoordinate, chunk: ChunkCoordinate) -> usize {
        let edge = i64::from(self.chunk_edge);
        let local_x = i64::from(cell.x) - i64::from(chunk.x) * edge;
        let local_y = i64::from(cell.y) - i64::from(chunk.y) * edge;
        debug_assert!(
            (0..edge).contains(&local_x) && (0..edge).contains(&local_y),
            "cell ({}, {}) is not inside chunk ({}, {})",
            cell.x,
            cell.y,
            chunk.x,
            chunk.y
        );
        (local_y * edge + local_x) as usize
    }

    pub fn cell_of_local(self, chunk: ChunkCoordinate, local_index: usize) -> CellCoordinate {
        let edge = i64::from(self.chunk_edge);
        let local = local_index as i64;
        debug_assert!(
            local < edge * edge,
            "local index {local_index} out of range for chunk edge {}",
            self.chunk_edge
        );
        CellCoordinate {
            x: (i64::from(chunk.x) * edge + local % edge) as i32,
            y: (i64::from(chunk.y) * edge + local / edge) as i32,
        }
    }

    pub fn local_to_world(self, cell: CellCoordinate) -> (f32, f32) {
        (
            cell.x as f32 * self.cell_size,
            cell.y as f32 * self.cell_size,
        )
    }

    pub fn world_to_local(self, world_x: f32, world_y: f32) -> CellCoordinate {
        CellCoordinate {
            x: (world_x / self.cell_size).floor() as i32,
            y: (world_y / self.cell_size).floor() as i32,
        }
    }
}

/// Inclusive cell-space rectangle covered by the chunks created so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub min_x: i64,
    pub min_y: i64,
    pub max_x: i64,
    pub max_y: i64,
}

impl CellRect {
    pub fn chunk_extent(chunk: ChunkCoordinate, chunk_edge: u32) -> Self {
        let edge = i64::from(chunk_edge);
        let min_x = i64::from(chunk.x) * edge;
        let min_y = i64::from(chunk.y) * edge;
        Self {
            min_x,
            min_y,
            max_x: min_x + edge - 1,
            max_y: min_y + edge - 1,
        }
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// World-space rectangle covering the cells; max edges are exclusive.
    pub fn to_world(self, cell_size: f32) -> WorldRect {
        WorldRect {
            min_x: self.min_x as f32 * cell_size,
            min_y: self.min_y as f32 * cell_size,
            max_x: (self.max_x + 1) as f32 * cell_size,
            max_y: (self.max_y + 1) as f32 * cell_size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldRect {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_floor_div(value: i32, divisor: i32) -> i32 {
        (f64::from(value) / f64::from(divisor)).floor() as i32
    }

    #[test]
    fn chunk_of_cell_matches_reference_floor_division() {
        for edge in [1u32, 2, 3, 4, 5, 7, 8, 16, 64] {
            let mapper = GridMapper::new(edge, 1.0);
            let signed_edge = edge as i32;
            for coordinate in -1000..=1000 {
                let chunk = mapper.chunk_of_cell(CellCoordinate::new(coordinate, coordinate));
                let expected = reference_floor_div(coordinate, signed_edge);
                assert_eq!(
                    chunk.x, expected,
                    "floor division mismatch for {coordinate} / {edge}"
                );
                assert_eq!(chunk.y, expected);
            }
        }
    }

    #[test]
    fn chunk_of_cell_handles_boundary_coordinates() {
        let edge = 8u32;
        let mapper = GridMapper::new(edge, 1.0);
        let signed_edge = edge as i32;
        for coordinate in [-1, -signed_edge, -signed_edge - 1, 0, signed_edge - 1, signed_edge] {
            let chunk = mapper.chunk_of_cell(CellCoordinate::new(coordinate, 0));
            assert_eq!(chunk.x, reference_floor_div(coordinate, signed_edge));
        }
        assert_eq!(
            mapper.chunk_of_cell(CellCoordinate::new(-1, -1)),
            ChunkCoordinate::new(-1, -1)
        );
    }

    #[test]
    fn local_index_is_injective_within_a_chunk() {
        let mapper = GridMapper::new(8, 1.0);
        for chunk in [
            ChunkCoordinate::new(0, 0),
            ChunkCoordinate::new(-1, -1),
            ChunkCoordinate::new(3, -7),
        ] {
            let mut seen = vec![false; 64];
            for local_y in 0..8 {
                for local_x in 0..8 {
                    let cell = CellCoordinate::new(chunk.x * 8 + local_x, chunk.y * 8 + local_y);
                    assert_eq!(mapper.chunk_of_cell(cell), chunk);
                    let local = mapper.local_index(cell, chunk);
                    assert!(local < 64, "local index {local} out of range");
                    assert!(!seen[local], "local index {local} assigned twice");
                    seen[local] = true;
                    assert_eq!(mapper.cell_of_local(chunk, local), cell);
                }
            }
            assert!(seen.iter().all(|&occupied| occupied));
        }
    }

    #[test]
    fn world_mapping_round_trips_through_cells() {
        let mapper = GridMapper::new(8, 0.5);
        for cell in [
            CellCoordinate::new(0, 0),
            CellCoordinate::new(17, -3),
            CellCoordinate::new(-120, 45),
        ] {
            let (world_x, world_y) = mapper.local_to_world(cell);
            assert_eq!(mapper.world_to_local(world_x, world_y), cell);
        }
        assert_eq!(
            mapper.world_to_local(-0.25, -0.25),
            CellCoordinate::new(-1, -1)
        );
    }

    #[test]
    fn cell_rect_union_and_world_conversion() {
        let first = CellRect::chunk_extent(ChunkCoordinate::new(0, 0), 8);
        let second = CellRect::chunk_extent(ChunkCoordinate::new(-1, -1), 8);
        let merged = first.union(second);
        assert_eq!(
            merged,
            CellRect {
                min_x: -8,
                min_y: -8,
                max_x: 7,
                max_y: 7,
            }
        );
        let world = merged.to_world(2.0);
        assert_eq!(world.min_x, -16.0);
        assert_eq!(world.max_x, 16.0);
    }
}
