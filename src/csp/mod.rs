//! Constraint-satisfaction scheduling: builds one `SchedulingVariable` per
//! required session, then solves with MRV-ordered backtracking and forward
//! checking. See `domain` for variable/domain construction and `search` for
//! the solver itself.

pub mod domain;
pub mod search;

use crate::error::PlannerError;
use crate::ledger::BookingLedger;
use crate::resolver::{CanonicalResolver, QualificationMode};
use crate::rng::PlannerRng;
use crate::types::{Course, CourseId, FacultyId, Lecturer, Program, Room, TimeSlot};
use domain::{build_course_variables, ConstraintContext, DomainBuildInputs};
use search::{search, SearchOutcome, SearchProblem};
use std::collections::HashMap;
use std::time::Duration;

/// Everything the CSP run needs beyond the entities themselves: the time
/// grid, the qualification mode to build domains with, and the faculty
/// whose existing bookings should not block this run's own variables.
pub struct CspRunInputs<'a> {
    pub programs: &'a [Program],
    pub courses_by_id: &'a HashMap<CourseId, &'a Course>,
    pub lecturers: &'a [Lecturer],
    pub rooms: &'a [Room],
    pub resolver: &'a CanonicalResolver,
    pub time_slots: &'a [TimeSlot],
    pub qualification_mode: QualificationMode,
    pub faculty: &'a FacultyId,
}

pub struct CspRunResult {
    pub outcome: SearchOutcome,
    pub variables_built: usize,
}

fn seed_context_from_ledger(ledger: &BookingLedger, faculty: &FacultyId) -> ConstraintContext {
    let mut ctx = ConstraintContext::default();
    for entry in ledger.other_faculty_bookings(faculty) {
        use crate::ledger::ResourceKind;
        match entry.key.resource_kind {
            ResourceKind::Room => ctx.mark_room(&entry.key.resource_id, entry.key.day, entry.key.period),
            ResourceKind::Lecturer => ctx.mark_lecturer(&entry.key.resource_id, entry.key.day, entry.key.period),
        }
    }
    ctx
}

/// Builds every program's variables (one `(program, course, term)` triple
/// per assigned course) and runs the search once over the combined set, so
/// cross-program room/lecturer conflicts are caught by the same solver
/// pass rather than resolved program-by-program.
pub fn run_csp(
    ledger: &BookingLedger,
    inputs: &CspRunInputs<'_>,
    rng: &mut PlannerRng,
    budget: Duration,
    mut should_cancel: impl FnMut() -> bool,
) -> Result<CspRunResult, PlannerError> {
    let domain_inputs = DomainBuildInputs {
        lecturers: inputs.lecturers,
        rooms: inputs.rooms,
        resolver: inputs.resolver,
        time_slots: inputs.time_slots,
        qualification_mode: inputs.qualification_mode,
    };

    let mut variables = Vec::new();
    for program in inputs.programs {
        let term = program.term.unwrap_or(1);
        for course_id in &program.course_ids {
            let Some(course) = inputs.courses_by_id.get(course_id) else {
                return Err(PlannerError::UnknownCourseRef {
                    cohort: program.id.clone(),
                    course: course_id.clone(),
                });
            };
            let vars = build_course_variables(program, course, term, &domain_inputs)?;
            variables.extend(vars);
        }
    }

    let variables_built = variables.len();
    let ctx = seed_context_from_ledger(ledger, inputs.faculty);

    let lecturers_by_id: HashMap<_, _> = inputs.lecturers.iter().map(|l| (l.id.clone(), l)).collect();
    let rooms_by_id: HashMap<_, _> = inputs.rooms.iter().map(|r| (r.id.clone(), r)).collect();
    let problem = SearchProblem {
        lecturers_by_id: &lecturers_by_id,
        rooms_by_id: &rooms_by_id,
        courses_by_id: inputs.courses_by_id,
    };

    let outcome = search(variables, ctx, &problem, rng, budget, &mut should_cancel)?;

    Ok(CspRunResult {
        outcome,
        variables_built,
    })
}
