use super::domain::ConstraintContext;
use crate::error::PlannerError;
use crate::rng::PlannerRng;
use crate::types::{
    Assignment, Course, CourseId, Lecturer, LecturerId, Room, RoomId, SchedulingVariable, TimeSlot,
    VariableId, Weekday,
};
use std::collections::HashMap;
use std::time::{Duration, Instant};

const MAX_CANDIDATES_PER_VARIABLE: usize = 256;

/// Read-only lookup tables the search needs alongside each variable's
/// pruned domain.
pub struct SearchProblem<'a> {
    pub lecturers_by_id: &'a HashMap<LecturerId, &'a Lecturer>,
    pub rooms_by_id: &'a HashMap<RoomId, &'a Room>,
    pub courses_by_id: &'a HashMap<CourseId, &'a Course>,
}

/// Two variables of the same canonical course (or raw course when no
/// canonical id exists) for the same cohort must not land on the same day.
fn canonical_key(course: &Course) -> String {
    course.canonical_id.clone().unwrap_or_else(|| course.code.clone())
}

#[derive(Clone, Copy)]
struct Candidate {
    time_slot: TimeSlot,
    lecturer: usize, // index into variable.lecturers
    room: usize,     // index into variable.rooms
}

struct AppliedDelta {
    room_number: String,
    lecturer_id: String,
    day: Weekday,
    period: u8,
    cohort_key: String,
    canonical_key: String,
    hours_added: u32,
    marked_morning: bool,
    marked_afternoon: bool,
}

struct Frame {
    var_pos: usize,
    candidates: Vec<Candidate>,
    cursor: usize,
    applied: Option<AppliedDelta>,
}

fn generate_candidates(
    variable: &SchedulingVariable,
    ctx: &ConstraintContext,
    problem: &SearchProblem<'_>,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    let course = problem.courses_by_id.get(&variable.course_id);
    let cohort_key = variable.program_id.0.clone();

    'slots: for slot in &variable.time_slots {
        if candidates.len() >= MAX_CANDIDATES_PER_VARIABLE {
            break;
        }
        if ctx.occupied_cohort.contains(&(cohort_key.clone(), slot.day, slot.period)) {
            continue;
        }
        if let Some(course) = course {
            let ckey = canonical_key(course);
            if ctx
                .occupied_canonical_day
                .contains(&(cohort_key.clone(), ckey, slot.day))
            {
                continue;
            }
        }

        for (li, lecturer_id) in variable.lecturers.iter().enumerate() {
            if candidates.len() >= MAX_CANDIDATES_PER_VARIABLE {
                break 'slots;
            }
            let allowed_slots = variable.lecturer_time_slots.get(lecturer_id);
            if let Some(allowed) = allowed_slots {
                if !allowed.iter().any(|s| s.key() == slot.key()) {
                    continue;
                }
            }
            if !ctx.is_lecturer_free(&lecturer_id.0, slot.day, slot.period) {
                continue;
            }
            let Some(lecturer) = problem.lecturers_by_id.get(lecturer_id) else {
                continue;
            };
            let daily_count = ctx
                .lecturer_daily_count
                .get(&(lecturer_id.0.clone(), slot.day))
                .copied()
                .unwrap_or(0);
            if daily_count >= lecturer.sessions_per_day {
                continue;
            }
            if slot.is_afternoon && ctx.lecturer_afternoon_used.contains(&(lecturer_id.0.clone(), slot.day)) {
                continue;
            }
            if !slot.is_afternoon && ctx.lecturer_morning_used.contains(&(lecturer_id.0.clone(), slot.day)) {
                continue;
            }
            let hours_used = ctx.lecturer_hours_used.get(&lecturer_id.0).copied().unwrap_or(0);
            if hours_used + 2 > lecturer.effective_max_weekly_hours() {
                continue;
            }

            for (ri, room_id) in variable.rooms.iter().enumerate() {
                if candidates.len() >= MAX_CANDIDATES_PER_VARIABLE {
                    break 'slots;
                }
                if !ctx.is_room_free(&room_id.0, slot.day, slot.period) {
                    continue;
                }
                candidates.push(Candidate {
                    time_slot: *slot,
                    lecturer: li,
                    room: ri,
                });
            }
        }
    }

    // Least-constraining-value heuristic: prefer lecturers with more
    // residual weekly capacity, and rooms with the smallest sufficient
    // capacity (tight fit reduces fragmentation).
    candidates.sort_by(|a, b| {
        let la = &variable.lecturers[a.lecturer];
        let lb = &variable.lecturers[b.lecturer];
        let residual_a = problem
            .lecturers_by_id
            .get(la)
            .map(|l| l.effective_max_weekly_hours())
            .unwrap_or(0);
        let residual_b = problem
            .lecturers_by_id
            .get(lb)
            .map(|l| l.effective_max_weekly_hours())
            .unwrap_or(0);
        let ra = &variable.rooms[a.room];
        let rb = &variable.rooms[b.room];
        let cap_a = problem.rooms_by_id.get(ra).map(|r| r.capacity).unwrap_or(u32::MAX);
        let cap_b = problem.rooms_by_id.get(rb).map(|r| r.capacity).unwrap_or(u32::MAX);
        residual_b.cmp(&residual_a).then(cap_a.cmp(&cap_b))
    });

    candidates
}

fn apply_candidate(
    variable: &SchedulingVariable,
    candidate: &Candidate,
    ctx: &mut ConstraintContext,
    course: Option<&Course>,
) -> AppliedDelta {
    let room_id = &variable.rooms[candidate.room];
    let lecturer_id = &variable.lecturers[candidate.lecturer];
    let slot = candidate.time_slot;
    let cohort_key = variable.program_id.0.clone();
    let ckey = course.map(canonical_key).unwrap_or_default();

    ctx.mark_room(&room_id.0, slot.day, slot.period);
    ctx.mark_lecturer(&lecturer_id.0, slot.day, slot.period);
    ctx.occupied_cohort.insert((cohort_key.clone(), slot.day, slot.period));
    ctx.occupied_canonical_day
        .insert((cohort_key.clone(), ckey.clone(), slot.day));

    *ctx.lecturer_daily_count
        .entry((lecturer_id.0.clone(), slot.day))
        .or_insert(0) += 1;
    *ctx.lecturer_hours_used.entry(lecturer_id.0.clone()).or_insert(0) += 2;

    let marked_morning = !slot.is_afternoon;
    let marked_afternoon = slot.is_afternoon;
    if marked_morning {
        ctx.lecturer_morning_used.insert((lecturer_id.0.clone(), slot.day));
    }
    if marked_afternoon {
        ctx.lecturer_afternoon_used.insert((lecturer_id.0.clone(), slot.day));
    }

    AppliedDelta {
        room_number: room_id.0.clone(),
        lecturer_id: lecturer_id.0.clone(),
        day: slot.day,
        period: slot.period,
        cohort_key,
        canonical_key: ckey,
        hours_added: 2,
        marked_morning,
        marked_afternoon,
    }
}

fn undo_delta(ctx: &mut ConstraintContext, delta: &AppliedDelta) {
    ctx.occupied_room.remove(&(delta.room_number.clone(), delta.day, delta.period));
    ctx.occupied_lecturer
        .remove(&(delta.lecturer_id.clone(), delta.day, delta.period));
    ctx.occupied_cohort
        .remove(&(delta.cohort_key.clone(), delta.day, delta.period));
    ctx.occupied_canonical_day
        .remove(&(delta.cohort_key.clone(), delta.canonical_key.clone(), delta.day));

    if let Some(count) = ctx.lecturer_daily_count.get_mut(&(delta.lecturer_id.clone(), delta.day)) {
        *count = count.saturating_sub(1);
    }
    if let Some(hours) = ctx.lecturer_hours_used.get_mut(&delta.lecturer_id) {
        *hours = hours.saturating_sub(delta.hours_added);
    }
    if delta.marked_morning {
        ctx.lecturer_morning_used.remove(&(delta.lecturer_id.clone(), delta.day));
    }
    if delta.marked_afternoon {
        ctx.lecturer_afternoon_used.remove(&(delta.lecturer_id.clone(), delta.day));
    }
}

pub struct SearchOutcome {
    pub assignments: Vec<Assignment>,
    pub unassigned: Vec<VariableId>,
    pub partial: bool,
}

/// Orders variables by Minimum Remaining Values: smallest
/// `|slots| x |lecturers| x |rooms|` first, ties broken by highest
/// `sessions_required` (approximated by lecturer domain tightness here,
/// since the course isn't threaded through) then lexicographic id.
fn mrv_order(variables: &[SchedulingVariable]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..variables.len()).collect();
    order.sort_by(|&a, &b| {
        let va = &variables[a];
        let vb = &variables[b];
        va.domain_size()
            .cmp(&vb.domain_size())
            .then(vb.session_number.cmp(&va.session_number))
            .then(va.id.0.cmp(&vb.id.0))
    });
    order
}

/// Backtracking search over an explicit frame stack (no native recursion),
/// so cancellation checks and depth bounds are cheap between pops.
pub fn search(
    mut variables: Vec<SchedulingVariable>,
    mut ctx: ConstraintContext,
    problem: &SearchProblem<'_>,
    _rng: &mut PlannerRng,
    budget: Duration,
    mut should_cancel: impl FnMut() -> bool,
) -> Result<SearchOutcome, PlannerError> {
    let order = mrv_order(&variables);
    let started = Instant::now();
    let mut stack: Vec<Frame> = Vec::with_capacity(variables.len());
    let mut partial = false;

    'search: while stack.len() < order.len() {
        if started.elapsed() > budget || should_cancel() {
            partial = true;
            break;
        }

        let var_pos = stack.len();
        let var_idx = order[var_pos];
        let course = problem.courses_by_id.get(&variables[var_idx].course_id).copied();
        let candidates = generate_candidates(&variables[var_idx], &ctx, problem);

        let mut frame = Frame {
            var_pos,
            candidates,
            cursor: 0,
            applied: None,
        };

        loop {
            if frame.cursor >= frame.candidates.len() {
                // Exhausted this variable: chronological backtrack.
                loop {
                    let Some(mut prev) = stack.pop() else {
                        partial = true;
                        break 'search;
                    };
                    if let Some(delta) = prev.applied.take() {
                        undo_delta(&mut ctx, &delta);
                        variables[order[prev.var_pos]].assignment = None;
                    }
                    prev.cursor += 1;
                    if prev.cursor < prev.candidates.len() {
                        stack.push(prev);
                        break;
                    }
                    // else keep popping further back
                }
                continue 'search;
            }

            let candidate = frame.candidates[frame.cursor];
            let delta = apply_candidate(&variables[var_idx], &candidate, &mut ctx, course);
            let variable = &mut variables[var_idx];
            let room_id = variable.rooms[candidate.room].clone();
            variable.assignment = Some(Assignment {
                variable_id: variable.id.clone(),
                course_id: variable.course_id.clone(),
                program_id: variable.program_id.clone(),
                lecturer_id: variable.lecturers[candidate.lecturer].clone(),
                room_number: room_id.0,
                time_slot: candidate.time_slot,
                term: variable.term,
                session_number: variable.session_number,
            });
            frame.applied = Some(delta);
            stack.push(frame);
            continue 'search;
        }
    }

    let mut assignments = Vec::new();
    let mut unassigned = Vec::new();
    for variable in &variables {
        match &variable.assignment {
            Some(a) => assignments.push(a.clone()),
            None => unassigned.push(variable.id.clone()),
        }
    }
    if !unassigned.is_empty() {
        partial = true;
    }

    Ok(SearchOutcome {
        assignments,
        unassigned,
        partial,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csp::domain::{build_course_variables, DomainBuildInputs};
    use crate::resolver::{CanonicalResolver, QualificationMode};
    use crate::types::{
        all_time_slots, default_periods, CourseId, FacultyId, LecturerRole, Program, ProgramId,
        RoomId, RoomType,
    };

    fn lecturer(id: &str, specs: &[&str]) -> Lecturer {
        Lecturer {
            id: LecturerId(id.to_string()),
            name: id.to_string(),
            role: LecturerRole::FullTime,
            specializations: specs.iter().map(|s| s.to_string()).collect(),
            availability: None,
            sessions_per_day: 2,
            max_weekly_hours: None,
        }
    }

    fn room(id: &str, capacity: u32, room_type: RoomType) -> Room {
        Room {
            id: RoomId(id.to_string()),
            room_number: id.to_string(),
            capacity,
            room_type,
            available: true,
        }
    }

    fn course(id: &str, hours: u32) -> Course {
        Course {
            id: CourseId(id.to_string()),
            code: id.to_string(),
            name: id.to_string(),
            weekly_hours: hours,
            credits: 3,
            preferred_room_type: RoomType::Theory,
            preferred_term: Some(1),
            course_group: None,
            canonical_id: None,
        }
    }

    #[test]
    fn single_cohort_solves_without_conflicts() {
        let program = Program {
            id: ProgramId("P1".to_string()),
            batch_label: "2025".to_string(),
            code: "BIT".to_string(),
            semester: "S1".to_string(),
            term: Some(1),
            cohort_size: 25,
            course_ids: vec![],
            faculty: FacultyId("ENG".to_string()),
        };
        let courses = vec![course("C1", 4), course("C2", 4)];
        let lecturers = vec![lecturer("L1", &["C1"]), lecturer("L2", &["C2"])];
        let rooms = vec![room("R1", 40, RoomType::Theory), room("R2", 40, RoomType::Theory)];
        let resolver = CanonicalResolver::empty();
        let slots = all_time_slots(&default_periods());

        let inputs = DomainBuildInputs {
            lecturers: &lecturers,
            rooms: &rooms,
            resolver: &resolver,
            time_slots: &slots,
            qualification_mode: QualificationMode::Permissive,
        };

        let mut variables = Vec::new();
        for c in &courses {
            variables.extend(build_course_variables(&program, c, 1, &inputs).unwrap());
        }

        let lecturers_by_id: HashMap<_, _> = lecturers.iter().map(|l| (l.id.clone(), l)).collect();
        let rooms_by_id: HashMap<_, _> = rooms.iter().map(|r| (r.id.clone(), r)).collect();
        let courses_by_id: HashMap<_, _> = courses.iter().map(|c| (c.id.clone(), c)).collect();
        let problem = SearchProblem {
            lecturers_by_id: &lecturers_by_id,
            rooms_by_id: &rooms_by_id,
            courses_by_id: &courses_by_id,
        };

        let mut rng = PlannerRng::from_seed(1);
        let outcome = search(
            variables,
            ConstraintContext::default(),
            &problem,
            &mut rng,
            Duration::from_secs(5),
            || false,
        )
        .unwrap();

        assert!(!outcome.partial);
        assert_eq!(outcome.assignments.len(), 4); // 2 sessions x 2 courses

        let mut seen = std::collections::HashSet::new();
        for a in &outcome.assignments {
            let key = (a.room_number.clone(), a.time_slot.day, a.time_slot.period);
            assert!(seen.insert(key), "room double-booked");
        }
    }
}
