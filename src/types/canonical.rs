use super::ids::CanonicalId;
use serde::{Deserialize, Serialize};

/// A cross-program equivalence class: a set of concrete course codes that
/// teach the same material under different program-specific codes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalCourseGroup {
    pub canonical_id: CanonicalId,
    pub display_name: String,
    pub equivalent_codes: Vec<String>,
}
