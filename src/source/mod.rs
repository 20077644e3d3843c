//! External collaborator contracts: where entities come from, where
//! assignments go, and how a run reports its progress. The core never
//! touches a filesystem or a database directly; it only calls through
//! these traits, so the orchestrator can be driven by tests, a demo CLI,
//! or (outside this crate) a real HTTP/store-backed service.

use crate::error::Result;
use crate::types::{CanonicalCourseGroup, Course, FacultyId, Lecturer, Program, Room};
use std::collections::HashMap;
use std::path::Path;

/// Read-only entity queries the orchestrator issues once per run.
pub trait EntitySource {
    fn load_cohorts(&self, faculty: &FacultyId) -> Result<Vec<Program>>;
    fn load_courses(&self) -> Result<Vec<Course>>;
    fn load_lecturers(&self) -> Result<Vec<Lecturer>>;
    fn load_rooms(&self) -> Result<Vec<Room>>;
    fn load_canonical_groups(&self) -> Result<Vec<CanonicalCourseGroup>>;
}

/// Plain in-memory `EntitySource`, the one a demo binary or a test builds
/// by hand instead of reading from a store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEntitySource {
    pub programs: Vec<Program>,
    pub courses: Vec<Course>,
    pub lecturers: Vec<Lecturer>,
    pub rooms: Vec<Room>,
    pub canonical_groups: Vec<CanonicalCourseGroup>,
}

impl EntitySource for InMemoryEntitySource {
    fn load_cohorts(&self, faculty: &FacultyId) -> Result<Vec<Program>> {
        Ok(self
            .programs
            .iter()
            .filter(|p| &p.faculty == faculty)
            .cloned()
            .collect())
    }

    fn load_courses(&self) -> Result<Vec<Course>> {
        Ok(self.courses.clone())
    }

    fn load_lecturers(&self) -> Result<Vec<Lecturer>> {
        Ok(self.lecturers.clone())
    }

    fn load_rooms(&self) -> Result<Vec<Room>> {
        Ok(self.rooms.clone())
    }

    fn load_canonical_groups(&self) -> Result<Vec<CanonicalCourseGroup>> {
        Ok(self.canonical_groups.clone())
    }
}

fn load_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&text).map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))
}

/// Reads the demo/test entity layout off disk: `programs.json`,
/// `courses.json`, `lecturers.json`, `rooms.json`, `canonical_groups.json`
/// under one directory. Generalized from the teacher's
/// `parser::json::load_input_from_dir` — a convenience for the demo
/// binary and integration tests, not a production storage surface.
pub struct JsonDirEntitySource {
    dir: std::path::PathBuf,
}

impl JsonDirEntitySource {
    pub fn new(dir: impl Into<std::path::PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl EntitySource for JsonDirEntitySource {
    fn load_cohorts(&self, faculty: &FacultyId) -> Result<Vec<Program>> {
        let all: Vec<Program> = load_json_file(&self.dir.join("programs.json"))?;
        Ok(all.into_iter().filter(|p| &p.faculty == faculty).collect())
    }

    fn load_courses(&self) -> Result<Vec<Course>> {
        load_json_file(&self.dir.join("courses.json"))
    }

    fn load_lecturers(&self) -> Result<Vec<Lecturer>> {
        load_json_file(&self.dir.join("lecturers.json"))
    }

    fn load_rooms(&self) -> Result<Vec<Room>> {
        load_json_file(&self.dir.join("rooms.json"))
    }

    fn load_canonical_groups(&self) -> Result<Vec<CanonicalCourseGroup>> {
        let path = self.dir.join("canonical_groups.json");
        if !path.exists() {
            return Ok(Vec::new());
        }
        load_json_file(&path)
    }
}

/// A persisted session assignment, carrying the fields §6 requires beyond
/// the in-core [`crate::types::Assignment`] (faculty, academic year,
/// status, generation id, creation timestamp).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PersistedAssignment {
    pub storage_id: String,
    pub variable_id: String,
    pub term: u8,
    pub academic_year: String,
    pub faculty: String,
    pub program_id: String,
    pub course_id: String,
    pub lecturer_id: String,
    pub room_number: String,
    pub day: crate::types::Weekday,
    pub period: u8,
    pub start_minute: u16,
    pub end_minute: u16,
    pub session_number: u32,
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub generation_id: String,
}

/// Write path for committed assignments. Production storage is out of
/// scope per the core's non-goals; this trait is the seam a real store
/// implements.
pub trait AssignmentSink {
    fn persist(
        &mut self,
        assignment: &crate::types::Assignment,
        faculty: &FacultyId,
        academic_year: &str,
        generation_id: &str,
    ) -> Result<String>;

    /// Removes every assignment belonging to `faculty` for `(term, year)`,
    /// returning the count removed. Supports `regenerate`.
    fn delete_faculty(&mut self, faculty: &FacultyId, term: u8, academic_year: &str) -> Result<usize>;
}

/// In-memory `Vec`-backed sink for tests and the demo binary.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAssignmentSink {
    pub records: Vec<PersistedAssignment>,
    next_id: u64,
}

impl InMemoryAssignmentSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AssignmentSink for InMemoryAssignmentSink {
    fn persist(
        &mut self,
        assignment: &crate::types::Assignment,
        faculty: &FacultyId,
        academic_year: &str,
        generation_id: &str,
    ) -> Result<String> {
        self.next_id += 1;
        let storage_id = format!("assign-{}", self.next_id);
        self.records.push(PersistedAssignment {
            storage_id: storage_id.clone(),
            variable_id: assignment.variable_id.0.clone(),
            term: assignment.term,
            academic_year: academic_year.to_string(),
            faculty: faculty.0.clone(),
            program_id: assignment.program_id.0.clone(),
            course_id: assignment.course_id.0.clone(),
            lecturer_id: assignment.lecturer_id.0.clone(),
            room_number: assignment.room_number.clone(),
            day: assignment.time_slot.day,
            period: assignment.time_slot.period,
            start_minute: assignment.time_slot.start_minute,
            end_minute: assignment.time_slot.end_minute,
            session_number: assignment.session_number,
            status: "confirmed".to_string(),
            created_at: chrono::Utc::now(),
            generation_id: generation_id.to_string(),
        });
        Ok(storage_id)
    }

    fn delete_faculty(&mut self, faculty: &FacultyId, term: u8, academic_year: &str) -> Result<usize> {
        let before = self.records.len();
        self.records
            .retain(|r| !(r.faculty == faculty.0 && r.term == term && r.academic_year == academic_year));
        Ok(before - self.records.len())
    }
}

/// Stage-transition callback a run reports progress through. Returning
/// `false` requests cancellation at the next checkpoint.
pub trait ProgressSink {
    fn report(&mut self, term: u8, pct: u8, stage: &str, detail: &str) -> bool;
}

/// Always continues; used by tests and library callers with nothing to
/// show the user.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn report(&mut self, _term: u8, _pct: u8, _stage: &str, _detail: &str) -> bool {
        true
    }
}

/// indicatif/colored progress bar for the demo binary. Never cancels on
/// its own; a wrapping Ctrl-C handler would flip its `cancelled` flag.
pub struct TerminalSink {
    bar: indicatif::ProgressBar,
    cancelled: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

impl TerminalSink {
    pub fn new(cancelled: std::sync::Arc<std::sync::atomic::AtomicBool>) -> Self {
        let bar = indicatif::ProgressBar::new(100);
        bar.set_style(
            indicatif::ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>3}% {msg}")
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar()),
        );
        Self { bar, cancelled }
    }
}

impl ProgressSink for TerminalSink {
    fn report(&mut self, term: u8, pct: u8, stage: &str, detail: &str) -> bool {
        self.bar.set_position(pct as u64);
        self.bar.set_message(format!(
            "{} {}",
            colored::Colorize::cyan(stage),
            detail
        ));
        if pct >= 100 {
            self.bar.finish_with_message(format!("term {term} done: {detail}"));
        }
        !self.cancelled.load(std::sync::atomic::Ordering::Relaxed)
    }
}

/// Groups of variable ids sharing a canonical course and session number,
/// the shape the GGA's merge mutation consumes. Built from the CSP's
/// finished variable set: any two variables whose course resolves to the
/// same canonical id and whose `session_number` matches are candidates.
pub fn build_canonical_groups(
    variables: &[crate::types::SchedulingVariable],
    courses_by_id: &HashMap<crate::types::CourseId, &Course>,
) -> crate::gga::CanonicalGroups {
    let mut groups: crate::gga::CanonicalGroups = HashMap::new();
    for variable in variables {
        let Some(course) = courses_by_id.get(&variable.course_id) else {
            continue;
        };
        let Some(canonical_id) = &course.canonical_id else {
            continue;
        };
        groups
            .entry(canonical_id.clone())
            .or_default()
            .entry(variable.session_number)
            .or_default()
            .push(variable.id.clone());
    }
    groups.retain(|_, by_session| {
        by_session.retain(|_, ids| ids.len() > 1);
        !by_session.is_empty()
    });
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CourseId, FacultyId, ProgramId, RoomType};

    fn program(faculty: &str) -> Program {
        Program {
            id: ProgramId("P1".to_string()),
            batch_label: "2025".to_string(),
            code: "BIT".to_string(),
            semester: "S1".to_string(),
            term: Some(1),
            cohort_size: 25,
            course_ids: vec![],
            faculty: FacultyId(faculty.to_string()),
        }
    }

    #[test]
    fn in_memory_source_filters_cohorts_by_faculty() {
        let source = InMemoryEntitySource {
            programs: vec![program("ENG"), program("SCI")],
            ..Default::default()
        };
        let cohorts = source.load_cohorts(&FacultyId("ENG".to_string())).unwrap();
        assert_eq!(cohorts.len(), 1);
    }

    #[test]
    fn in_memory_sink_persists_then_deletes_by_faculty() {
        let mut sink = InMemoryAssignmentSink::new();
        let faculty = FacultyId("ENG".to_string());
        let assignment = crate::types::Assignment {
            variable_id: crate::types::VariableId("v1".to_string()),
            course_id: CourseId("C1".to_string()),
            program_id: ProgramId("P1".to_string()),
            lecturer_id: crate::types::LecturerId("L1".to_string()),
            room_number: "R1".to_string(),
            time_slot: crate::types::TimeSlot {
                day: crate::types::Weekday::Mon,
                period: 0,
                start_minute: 540,
                end_minute: 660,
                is_afternoon: false,
            },
            term: 1,
            session_number: 1,
        };
        sink.persist(&assignment, &faculty, "2025-2026", "gen1").unwrap();
        assert_eq!(sink.records.len(), 1);
        let removed = sink.delete_faculty(&faculty, 1, "2025-2026").unwrap();
        assert_eq!(removed, 1);
        assert!(sink.records.is_empty());
    }

    #[test]
    fn canonical_groups_only_keep_multi_session_buckets() {
        let course_solo = Course {
            id: CourseId("C1".to_string()),
            code: "C1".to_string(),
            name: "C1".to_string(),
            weekly_hours: 4,
            credits: 3,
            preferred_room_type: RoomType::Theory,
            preferred_term: Some(1),
            course_group: None,
            canonical_id: Some("CID".to_string()),
        };
        let mut by_id = HashMap::new();
        by_id.insert(course_solo.id.clone(), &course_solo);

        let v1 = crate::types::SchedulingVariable {
            id: crate::types::VariableId("v1".to_string()),
            course_id: course_solo.id.clone(),
            program_id: ProgramId("P1".to_string()),
            session_number: 1,
            term: 1,
            time_slots: vec![],
            lecturers: vec![],
            rooms: vec![],
            lecturer_time_slots: HashMap::new(),
            assignment: None,
        };
        let groups = build_canonical_groups(std::slice::from_ref(&v1), &by_id);
        assert!(groups.is_empty(), "a single session has no merge partner");
    }
}
