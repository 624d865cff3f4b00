use crate::{PositionUpdate, VesselStatic};

/// A batch of parsed live feed messages handed from the consumer to the ingest task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataMessage {
    pub positions: Vec<PositionUpdate>,
    pub static_messages: Vec<VesselStatic>,
}

impl DataMessage {
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() && self.static_messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.positions.len() + self.static_messages.len()
    }
}
