use super::ids::{CourseId, FacultyId, ProgramId};
use serde::{Deserialize, Serialize};

/// A cohort of students sharing a curriculum in a given semester and term.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub id: ProgramId,
    pub batch_label: String,
    /// Program code, e.g. "BSCAIT", "BIT", "BCS".
    pub code: String,
    /// Semester label, "S1".."S6".
    pub semester: String,
    pub term: Option<u8>,
    pub cohort_size: u32,
    pub course_ids: Vec<CourseId>,
    pub faculty: FacultyId,
}

impl Program {
    pub fn normalized_code(&self) -> String {
        self.code.to_ascii_uppercase()
    }
}
