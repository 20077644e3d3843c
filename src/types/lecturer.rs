use super::ids::LecturerId;
use super::time_slot::AvailabilityRange;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LecturerRole {
    Dean,
    FullTime,
    PartTime,
}

impl LecturerRole {
    /// Role-derived default for `max_weekly_hours`, used when the record
    /// does not carry an explicit value.
    pub fn default_max_weekly_hours(&self) -> u32 {
        match self {
            LecturerRole::Dean => 15,
            LecturerRole::PartTime => 3,
            LecturerRole::FullTime => 22,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lecturer {
    pub id: LecturerId,
    pub name: String,
    pub role: LecturerRole,
    /// Canonical-course ids, or raw course codes for legacy data.
    pub specializations: Vec<String>,
    /// `None` means no restriction: every time slot is available.
    pub availability: Option<Vec<AvailabilityRange>>,
    pub sessions_per_day: u32,
    pub max_weekly_hours: Option<u32>,
}

impl Lecturer {
    pub fn effective_max_weekly_hours(&self) -> u32 {
        self.max_weekly_hours
            .unwrap_or_else(|| self.role.default_max_weekly_hours())
    }

    pub fn is_qualified_raw(&self, specialization: &str) -> bool {
        self.specializations
            .iter()
            .any(|s| s.eq_ignore_ascii_case(specialization))
    }
}

impl Default for Lecturer {
    fn default() -> Self {
        Self {
            id: LecturerId(String::new()),
            name: String::new(),
            role: LecturerRole::FullTime,
            specializations: Vec::new(),
            availability: None,
            sessions_per_day: 2,
            max_weekly_hours: None,
        }
    }
}
