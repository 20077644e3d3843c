use crate::error::{DomainFailureCause, PlannerError};
use crate::resolver::{CanonicalResolver, QualificationMode};
use crate::types::{
    Course, Lecturer, Program, Room, SchedulingVariable, TimeSlot, VariableId, Weekday,
};
use std::collections::HashMap;

pub struct DomainBuildInputs<'a> {
    pub lecturers: &'a [Lecturer],
    pub rooms: &'a [Room],
    pub resolver: &'a CanonicalResolver,
    pub time_slots: &'a [TimeSlot],
    pub qualification_mode: QualificationMode,
}

fn lecturer_available_slots(lecturer: &Lecturer, time_slots: &[TimeSlot]) -> Vec<TimeSlot> {
    match &lecturer.availability {
        None => time_slots.to_vec(),
        Some(ranges) => time_slots
            .iter()
            .filter(|slot| {
                ranges
                    .iter()
                    .any(|r| r.day == slot.day && slot.overlaps(r.start_minute, r.end_minute))
            })
            .copied()
            .collect(),
    }
}

/// Builds and prunes the domain for every required session of `course`
/// within `program`. Returns one variable per `1..=sessions_required`.
pub fn build_course_variables(
    program: &Program,
    course: &Course,
    term: u8,
    inputs: &DomainBuildInputs,
) -> Result<Vec<SchedulingVariable>, PlannerError> {
    let qualified_lecturers: Vec<&Lecturer> = inputs
        .lecturers
        .iter()
        .filter(|l| {
            l.effective_max_weekly_hours() >= 2
                && inputs.resolver.qualified(
                    &course.code,
                    &l.specializations,
                    inputs.qualification_mode,
                )
        })
        .collect();

    let mut lecturer_time_slots = HashMap::new();
    let mut available_lecturers = Vec::new();
    for lecturer in &qualified_lecturers {
        let slots = lecturer_available_slots(lecturer, inputs.time_slots);
        if slots.is_empty() {
            continue;
        }
        available_lecturers.push(lecturer.id.clone());
        lecturer_time_slots.insert(lecturer.id.clone(), slots);
    }

    let suitable_rooms: Vec<_> = inputs
        .rooms
        .iter()
        .filter(|r| r.is_suitable(course.preferred_room_type, program.cohort_size))
        .map(|r| r.id.clone())
        .collect();

    let sessions_required = course.sessions_required();
    let mut variables = Vec::with_capacity(sessions_required as usize);

    for session_number in 1..=sessions_required {
        let variable_id = VariableId(format!(
            "{}:{}:{}",
            program.id.0, course.id.0, session_number
        ));

        if available_lecturers.is_empty() {
            return Err(PlannerError::EmptyDomain {
                variable: variable_id,
                cause: DomainFailureCause::NoQualifiedLecturer,
            });
        }
        if suitable_rooms.is_empty() {
            return Err(PlannerError::EmptyDomain {
                variable: variable_id,
                cause: DomainFailureCause::NoSufficientCapacityRoom,
            });
        }
        if inputs.time_slots.is_empty() {
            return Err(PlannerError::EmptyDomain {
                variable: variable_id,
                cause: DomainFailureCause::NoCompatibleSlotAfterAvailability,
            });
        }

        variables.push(SchedulingVariable {
            id: variable_id,
            course_id: course.id.clone(),
            program_id: program.id.clone(),
            session_number,
            term,
            time_slots: inputs.time_slots.to_vec(),
            lecturers: available_lecturers.clone(),
            rooms: suitable_rooms.clone(),
            lecturer_time_slots: lecturer_time_slots.clone(),
            assignment: None,
        });
    }

    Ok(variables)
}

/// Per-(room/lecturer/cohort) occupancy tracked during search, pre-seeded
/// from the booking ledger's other-faculty entries so independent runs
/// never collide, and mutated by forward checking as this run's own
/// variables get assigned.
#[derive(Default, Clone)]
pub struct ConstraintContext {
    pub occupied_room: std::collections::HashSet<(String, Weekday, u8)>,
    pub occupied_lecturer: std::collections::HashSet<(String, Weekday, u8)>,
    pub occupied_cohort: std::collections::HashSet<(String, Weekday, u8)>,
    /// (program, canonical-or-course key, day) already used this week.
    pub occupied_canonical_day: std::collections::HashSet<(String, String, Weekday)>,
    pub lecturer_daily_count: HashMap<(String, Weekday), u32>,
    pub lecturer_morning_used: std::collections::HashSet<(String, Weekday)>,
    pub lecturer_afternoon_used: std::collections::HashSet<(String, Weekday)>,
    pub lecturer_hours_used: HashMap<String, u32>,
}

impl ConstraintContext {
    pub fn mark_room(&mut self, room: &str, day: Weekday, period: u8) {
        self.occupied_room.insert((room.to_string(), day, period));
    }

    pub fn mark_lecturer(&mut self, lecturer: &str, day: Weekday, period: u8) {
        self.occupied_lecturer
            .insert((lecturer.to_string(), day, period));
    }

    pub fn is_room_free(&self, room: &str, day: Weekday, period: u8) -> bool {
        !self
            .occupied_room
            .contains(&(room.to_string(), day, period))
    }

    pub fn is_lecturer_free(&self, lecturer: &str, day: Weekday, period: u8) -> bool {
        !self
            .occupied_lecturer
            .contains(&(lecturer.to_string(), day, period))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FacultyId, LecturerRole, ProgramId, RoomType};

    fn program() -> Program {
        Program {
            id: ProgramId("P1".to_string()),
            batch_label: "2025".to_string(),
            code: "BIT".to_string(),
            semester: "S1".to_string(),
            term: Some(1),
            cohort_size: 25,
            course_ids: vec![],
            faculty: FacultyId("ENG".to_string()),
        }
    }

    fn course() -> Course {
        Course {
            id: crate::types::CourseId("C1".to_string()),
            code: "C1".to_string(),
            name: "Course One".to_string(),
            weekly_hours: 4,
            credits: 3,
            preferred_room_type: RoomType::Theory,
            preferred_term: Some(1),
            course_group: None,
            canonical_id: None,
        }
    }

    #[test]
    fn qualified_lecturer_with_availability_produces_variables() {
        let lecturer = Lecturer {
            id: crate::types::LecturerId("L1".to_string()),
            name: "Dr. One".to_string(),
            role: LecturerRole::FullTime,
            specializations: vec!["C1".to_string()],
            availability: None,
            sessions_per_day: 2,
            max_weekly_hours: None,
        };
        let room = Room {
            id: crate::types::RoomId("R1".to_string()),
            room_number: "R1".to_string(),
            capacity: 40,
            room_type: RoomType::Theory,
            available: true,
        };
        let resolver = CanonicalResolver::empty();
        let slots = crate::types::all_time_slots(&crate::types::default_periods());
        let inputs = DomainBuildInputs {
            lecturers: std::slice::from_ref(&lecturer),
            rooms: std::slice::from_ref(&room),
            resolver: &resolver,
            time_slots: &slots,
            qualification_mode: QualificationMode::Permissive,
        };

        let vars = build_course_variables(&program(), &course(), 1, &inputs).unwrap();
        assert_eq!(vars.len(), 2); // ceil(4/2)
        assert_eq!(vars[0].lecturers, vec![crate::types::LecturerId("L1".to_string())]);
    }

    #[test]
    fn no_qualified_lecturer_is_empty_domain_error() {
        let resolver = CanonicalResolver::empty();
        let slots = crate::types::all_time_slots(&crate::types::default_periods());
        let inputs = DomainBuildInputs {
            lecturers: &[],
            rooms: &[Room {
                id: crate::types::RoomId("R1".to_string()),
                room_number: "R1".to_string(),
                capacity: 40,
                room_type: RoomType::Theory,
                available: true,
            }],
            resolver: &resolver,
            time_slots: &slots,
            qualification_mode: QualificationMode::Permissive,
        };
        let err = build_course_variables(&program(), &course(), 1, &inputs).unwrap_err();
        assert!(matches!(
            err,
            PlannerError::EmptyDomain {
                cause: DomainFailureCause::NoQualifiedLecturer,
                ..
            }
        ));
    }
}
