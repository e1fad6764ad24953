use crate::models::Position;

/// The single map coordinate a new report is anchored to. Last write wins.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Selection {
    position: Option<Position>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_selected(&mut self, position: Position) {
        log::debug!("Selected position {position}");
        self.position = Some(position);
    }

    pub fn clear(&mut self) {
        self.position = None;
    }

    pub fn get(&self) -> Option<Position> {
        self.position
    }
}
