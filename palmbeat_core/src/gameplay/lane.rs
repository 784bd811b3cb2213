use crate::input::events::Gesture;

pub const LANE_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lane {
    pub index: usize,
    pub symbol: Gesture,
}

/// Fixed lane -> required symbol assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneMap {
    lanes: Vec<Lane>,
}

impl Default for LaneMap {
    fn default() -> Self {
        Self::new([Gesture::Fist, Gesture::Peace, Gesture::Index, Gesture::OpenHand])
    }
}

impl LaneMap {
    pub fn new(symbols: impl IntoIterator<Item = Gesture>) -> Self {
        let lanes: Vec<Lane> = symbols
            .into_iter()
            .enumerate()
            .map(|(index, symbol)| Lane { index, symbol })
            .collect();
        assert!(!lanes.is_empty(), "a lane map needs at least one lane");
        Self { lanes }
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    /// First lane bound to `symbol`.
    pub fn lane_for_symbol(&self, symbol: Gesture) -> Option<usize> {
        self.lanes.iter().find(|l| l.symbol == symbol).map(|l| l.index)
    }

    pub fn symbol_for_lane(&self, lane: usize) -> Option<Gesture> {
        self.lanes.get(lane).map(|l| l.symbol)
    }
}
