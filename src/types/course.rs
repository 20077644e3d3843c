use super::ids::CourseId;
use super::room::RoomType;
use serde::{Deserialize, Serialize};

/// A subject / course-unit. `id` commonly equals `code`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub code: String,
    pub name: String,
    pub weekly_hours: u32,
    pub credits: u32,
    pub preferred_room_type: RoomType,
    /// Mandatory unless overridden by canonical alignment; term planning
    /// fails loudly when both this and a canonical pin are absent.
    pub preferred_term: Option<u8>,
    /// Ties a theory+practical pair (or similar) into one logical unit.
    pub course_group: Option<String>,
    pub canonical_id: Option<String>,
}

impl Course {
    /// `ceil(weekly_hours / 2)`: the number of 2-hour blocks to schedule.
    pub fn sessions_required(&self) -> u32 {
        (self.weekly_hours + 1) / 2
    }
}
