use super::ids::RoomId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomType {
    Theory,
    Lab,
}

/// A physical room. Rooms with `available=false` are excluded from every
/// variable's domain at build time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub room_number: String,
    pub capacity: u32,
    pub room_type: RoomType,
    #[serde(default = "default_true")]
    pub available: bool,
}

fn default_true() -> bool {
    true
}

impl Room {
    pub fn is_suitable(&self, room_type: RoomType, cohort_size: u32) -> bool {
        self.available && self.room_type == room_type && self.capacity >= cohort_size
    }
}
