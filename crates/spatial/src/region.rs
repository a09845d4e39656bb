use sightline_common::Position;

use crate::chunk::{ChunkCoord, chunk_of};

/// Inclusive square of chunks, `[min.x, max.x] x [min.z, max.z]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewRegion {
    pub min: ChunkCoord,
    pub max: ChunkCoord,
}

impl ViewRegion {
    /// Square of Chebyshev radius `view_distance` around `center`.
    pub fn around(center: ChunkCoord, view_distance: u32) -> Self {
        let r = view_distance.min(i32::MAX as u32) as i32;
        Self {
            min: ChunkCoord::new(center.x.saturating_sub(r), center.z.saturating_sub(r)),
            max: ChunkCoord::new(center.x.saturating_add(r), center.z.saturating_add(r)),
        }
    }

    /// Region seen from a world position.
    pub fn from_viewer(position: Position, view_distance: u32) -> Self {
        Self::around(chunk_of(position), view_distance)
    }

    /// Check if a chunk is inside the region.
    pub fn contains(&self, chunk: ChunkCoord) -> bool {
        inside_view(self, chunk)
    }

    /// Whether the chunk holding `position` is inside the region.
    pub fn contains_position(&self, position: Position) -> bool {
        self.contains(chunk_of(position))
    }
}

/// Inclusive containment test.
pub fn inside_view(region: &ViewRegion, chunk: ChunkCoord) -> bool {
    chunk.x >= region.min.x
        && chunk.x <= region.max.x
        && chunk.z >= region.min.z
        && chunk.z <= region.max.z
}

/// Every chunk of the square of radius `radius` around `center`.
pub fn chunks_in_radius(center: ChunkCoord, radius: u32) -> Vec<ChunkCoord> {
    let region = ViewRegion::around(center, radius);
    let mut result = Vec::new();
    for x in region.min.x..=region.max.x {
        for z in region.min.z..=region.max.z {
            result.push(ChunkCoord::new(x, z));
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_is_inclusive() {
        let region = ViewRegion::around(ChunkCoord::new(0, 0), 2);
        assert!(region.contains(ChunkCoord::new(2, 0)));
        assert!(region.contains(ChunkCoord::new(-2, -2)));
        assert!(!region.contains(ChunkCoord::new(3, 0)));
        assert!(!region.contains(ChunkCoord::new(0, -3)));
    }

    #[test]
    fn region_is_square_not_round() {
        let region = ViewRegion::around(ChunkCoord::new(5, 5), 1);
        assert!(region.contains(ChunkCoord::new(6, 6)));
        assert!(region.contains(ChunkCoord::new(4, 6)));
    }

    #[test]
    fn zero_distance_sees_only_its_chunk() {
        let region = ViewRegion::around(ChunkCoord::new(1, 1), 0);
        assert!(region.contains(ChunkCoord::new(1, 1)));
        assert!(!region.contains(ChunkCoord::new(1, 2)));
    }

    #[test]
    fn from_viewer_uses_viewer_chunk() {
        let region = ViewRegion::from_viewer(Position::new(40.0, 70.0, -1.0), 1);
        assert_eq!(region.min, ChunkCoord::new(1, -2));
        assert_eq!(region.max, ChunkCoord::new(3, 0));
        assert!(region.contains_position(Position::new(63.9, 0.0, 15.0)));
        assert!(!region.contains_position(Position::new(64.0, 0.0, 15.0)));
    }

    #[test]
    fn region_saturates_at_world_edge() {
        let region = ViewRegion::around(ChunkCoord::new(i32::MAX, i32::MIN), 4);
        assert_eq!(region.max.x, i32::MAX);
        assert_eq!(region.min.z, i32::MIN);
    }

    #[test]
    fn chunks_in_radius_count() {
        assert_eq!(chunks_in_radius(ChunkCoord::new(0, 0), 0).len(), 1);
        assert_eq!(chunks_in_radius(ChunkCoord::new(0, 0), 2).len(), 25);
    }
}
