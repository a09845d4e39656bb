use std::sync::Arc;

use parking_lot::RwLock;
use sightline_common::Position;
use sightline_spatial::ViewRegion;

/// Where a client stands and how far it sees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub position: Position,
    pub view_distance: u32,
}

impl ViewState {
    pub fn new(position: Position, view_distance: u32) -> Self {
        Self {
            position,
            view_distance,
        }
    }

    pub fn region(&self) -> ViewRegion {
        ViewRegion::from_viewer(self.position, self.view_distance)
    }
}

/// Live accessor for a client's viewpoint. Read on every evaluation and
/// never cached by sessions.
pub trait Viewpoint {
    fn current(&self) -> ViewState;
}

/// A viewpoint that never moves.
impl Viewpoint for ViewState {
    fn current(&self) -> ViewState {
        *self
    }
}

/// Viewpoint shared between the connection that moves the player and the
/// view that reads it.
#[derive(Debug, Clone)]
pub struct SharedViewpoint(Arc<RwLock<ViewState>>);

impl SharedViewpoint {
    pub fn new(state: ViewState) -> Self {
        Self(Arc::new(RwLock::new(state)))
    }

    pub fn set_position(&self, position: Position) {
        self.0.write().position = position;
    }

    pub fn set_view_distance(&self, view_distance: u32) {
        self.0.write().view_distance = view_distance;
    }
}

impl Viewpoint for SharedViewpoint {
    fn current(&self) -> ViewState {
        *self.0.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sightline_spatial::ChunkCoord;

    #[test]
    fn shared_viewpoint_is_live() {
        let shared = SharedViewpoint::new(ViewState::new(Position::ZERO, 2));
        let reader = shared.clone();
        assert!(reader.current().region().contains(ChunkCoord::new(2, 0)));

        shared.set_position(Position::new(-100.0, 0.0, 0.0));
        shared.set_view_distance(1);
        let region = reader.current().region();
        assert!(!region.contains(ChunkCoord::new(2, 0)));
        assert!(region.contains(ChunkCoord::new(-7, 0)));
    }

    #[test]
    fn fixed_state_is_a_viewpoint() {
        let fixed = ViewState::new(Position::new(8.0, 0.0, 8.0), 0);
        assert_eq!(fixed.current().region().min, ChunkCoord::new(0, 0));
    }
}
