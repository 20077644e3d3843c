//! Orchestrator: runs the whole pipeline for one `(term, faculty,
//! academic_year)` request — load entities, plan terms, solve the CSP,
//! improve with the GGA, commit to the ledger, persist assignments.

use crate::config::{CommitPolicy, PlannerConfig};
use crate::csp::{run_csp, CspRunInputs};
use crate::error::{PlannerError, Result};
use crate::gga::{run_gga, CanonicalGroups, GgaRunInputs, VariablePair};
use crate::ledger::BookingLedger;
use crate::resolver::{CanonicalResolver, QualificationMode};
use crate::rng::PlannerRng;
use crate::source::{build_canonical_groups, AssignmentSink, EntitySource, ProgressSink};
use crate::term_planner::{build_canonical_term_alignment, split_semester, AlignmentInput};
use crate::types::{Assignment, Course, CourseId, FacultyId, Lecturer, LecturerId, Program, ProgramId, RoomId};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// One orchestrated run's request parameters.
pub struct RunRequest<'a> {
    pub term: u8,
    pub faculty: &'a FacultyId,
    pub academic_year: &'a str,
    pub regenerate: bool,
}

/// `{success, sessions_count, elapsed_ms, final_fitness, warnings[], error?}`
/// per §6's failure-reporting contract.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub success: bool,
    pub sessions_count: usize,
    pub elapsed_ms: u64,
    pub final_fitness: f64,
    pub warnings: Vec<String>,
    pub error: Option<String>,
}

fn stage(sink: &mut dyn ProgressSink, term: u8, pct: u8, stage_label: &str, detail: &str) -> Result<()> {
    if !sink.report(term, pct, stage_label, detail) {
        return Err(PlannerError::InvariantViolation("run cancelled by progress sink".to_string()).into());
    }
    Ok(())
}

/// Plans every cohort's term courses, honoring cross-program canonical
/// alignment, and returns each cohort's course-id set for `term` alongside
/// any warnings (cohorts dropped for having zero courses this term).
fn plan_terms(
    programs: &[Program],
    courses_by_id: &HashMap<CourseId, &Course>,
    term: u8,
    warnings: &mut Vec<String>,
) -> Result<HashMap<ProgramId, Vec<CourseId>>> {
    let program_courses: Vec<(ProgramId, Vec<Course>)> = programs
        .iter()
        .map(|p| {
            let courses: Vec<Course> = p
                .course_ids
                .iter()
                .filter_map(|cid| courses_by_id.get(cid).map(|c| (*c).clone()))
                .collect();
            (p.id.clone(), courses)
        })
        .collect();

    let alignment_inputs: Vec<AlignmentInput> = programs
        .iter()
        .zip(program_courses.iter())
        .map(|(program, (_, courses))| AlignmentInput {
            program_code: &program.code,
            semester: &program.semester,
            courses,
        })
        .collect();
    let (alignment, _decisions) = build_canonical_term_alignment(&alignment_inputs);

    let mut by_program = HashMap::new();
    for (program, (program_id, courses)) in programs.iter().zip(program_courses.into_iter()) {
        if courses.is_empty() {
            warnings.push(format!("cohort '{}' has no courses to plan", program_id.0));
            continue;
        }
        let (term1, term2) = split_semester(&program.semester, &program.code, &courses, &alignment)?;
        let selected = if term == 1 { term1.course_ids } else { term2.course_ids };
        if selected.is_empty() {
            warnings.push(format!("cohort '{}' has no courses in term {}", program_id.0, term));
            continue;
        }
        by_program.insert(program_id, selected);
    }
    Ok(by_program)
}

/// Runs the full pipeline: ledger open → load → term plan → CSP → GGA →
/// commit. Returns a [`RunReport`] even on failure (with `error` set);
/// only unrecoverable setup errors (entity source I/O) are `Err`.
pub fn run(
    source: &dyn EntitySource,
    assignment_sink: &mut dyn AssignmentSink,
    ledger: &mut BookingLedger,
    progress: &mut dyn ProgressSink,
    config: &PlannerConfig,
    rng: &mut PlannerRng,
    request: &RunRequest<'_>,
) -> Result<RunReport> {
    let started = Instant::now();
    config.validate()?;

    if request.regenerate {
        ledger.discard_faculty(request.faculty);
    }

    let programs = source.load_cohorts(request.faculty)?;
    let courses = source.load_courses()?;
    let lecturers = source.load_lecturers()?;
    let rooms = source.load_rooms()?;
    let canonical_groups_registry = source.load_canonical_groups()?;
    let resolver = CanonicalResolver::new(&canonical_groups_registry);
    let courses_by_id: HashMap<CourseId, &Course> = courses.iter().map(|c| (c.id.clone(), c)).collect();
    let lecturers_by_id: HashMap<LecturerId, &Lecturer> = lecturers.iter().map(|l| (l.id.clone(), l)).collect();

    let mut warnings = Vec::new();
    let planned = plan_terms(&programs, &courses_by_id, request.term, &mut warnings)?;

    let mut scoped_programs: Vec<Program> = Vec::new();
    for program in &programs {
        if let Some(course_ids) = planned.get(&program.id) {
            let mut scoped = program.clone();
            scoped.course_ids = course_ids.clone();
            scoped.term = Some(request.term);
            scoped_programs.push(scoped);
        }
    }

    if scoped_programs.is_empty() {
        let report = RunReport {
            success: false,
            sessions_count: 0,
            elapsed_ms: started.elapsed().as_millis() as u64,
            final_fitness: 0.0,
            warnings,
            error: Some("no cohort has any course in this term".to_string()),
        };
        return Ok(report);
    }

    stage(progress, request.term, 10, "planning", "term split and canonical alignment complete")?;

    let time_slots = crate::types::all_time_slots(config.periods());
    let csp_inputs = CspRunInputs {
        programs: &scoped_programs,
        courses_by_id: &courses_by_id,
        lecturers: &lecturers,
        rooms: &rooms,
        resolver: &resolver,
        time_slots: &time_slots,
        qualification_mode: QualificationMode::Permissive,
        faculty: request.faculty,
    };

    let csp_budget = Duration::from_secs(config.csp_budget_seconds);
    let csp_result = run_csp(ledger, &csp_inputs, rng, csp_budget, || false)?;

    stage(progress, request.term, 40, "csp", &format!("{} variables built", csp_result.variables_built))?;

    if csp_result.outcome.assignments.is_empty() {
        let report = RunReport {
            success: false,
            sessions_count: 0,
            elapsed_ms: started.elapsed().as_millis() as u64,
            final_fitness: 0.0,
            warnings,
            error: Some(PlannerError::Infeasible.to_string()),
        };
        return Ok(report);
    }

    if csp_result.outcome.partial {
        warnings.push(format!(
            "CSP produced a partial schedule: {} session(s) unassigned",
            csp_result.outcome.unassigned.len()
        ));
        if config.commit_policy == CommitPolicy::Strict {
            let report = RunReport {
                success: false,
                sessions_count: 0,
                elapsed_ms: started.elapsed().as_millis() as u64,
                final_fitness: 0.0,
                warnings,
                error: Some(PlannerError::PartialSolutionRejected.to_string()),
            };
            return Ok(report);
        }
    }

    stage(progress, request.term, 60, "csp", "feasibility search complete")?;

    let mut variables = Vec::new();
    for program in &scoped_programs {
        let term = program.term.unwrap_or(request.term);
        for course_id in &program.course_ids {
            let Some(course) = courses_by_id.get(course_id) else {
                continue;
            };
            let domain_inputs = crate::csp::domain::DomainBuildInputs {
                lecturers: &lecturers,
                rooms: &rooms,
                resolver: &resolver,
                time_slots: &time_slots,
                qualification_mode: QualificationMode::Permissive,
            };
            if let Ok(vars) = crate::csp::domain::build_course_variables(program, course, term, &domain_inputs) {
                variables.extend(vars);
            }
        }
    }

    let canonical_groups: CanonicalGroups = build_canonical_groups(&variables, &courses_by_id);
    let variable_pairs: Vec<VariablePair> = scoped_programs
        .iter()
        .flat_map(|program| {
            let mut pairs = Vec::new();
            let group_map: HashMap<&str, Vec<&CourseId>> = program
                .course_ids
                .iter()
                .filter_map(|cid| courses_by_id.get(cid).and_then(|c| c.course_group.as_deref()).map(|g| (g, cid)))
                .fold(HashMap::new(), |mut acc, (g, cid)| {
                    acc.entry(g).or_default().push(cid);
                    acc
                });
            for group_courses in group_map.values() {
                if group_courses.len() < 2 {
                    continue;
                }
                for var_a in variables.iter().filter(|v| &v.program_id == &program.id && group_courses.contains(&&v.course_id)) {
                    for var_b in variables.iter().filter(|v| &v.program_id == &program.id && group_courses.contains(&&v.course_id)) {
                        if var_a.id != var_b.id && var_a.session_number == var_b.session_number && var_a.course_id != var_b.course_id {
                            pairs.push((var_a.id.clone(), var_b.id.clone()));
                        }
                    }
                }
            }
            pairs
        })
        .collect();

    let room_capacity: HashMap<RoomId, u32> = rooms.iter().map(|r| (r.id.clone(), r.capacity)).collect();
    let program_sizes: HashMap<ProgramId, u32> = scoped_programs.iter().map(|p| (p.id.clone(), p.cohort_size)).collect();

    let gga_inputs = GgaRunInputs {
        variables: &variables,
        variable_pairs: &variable_pairs,
        canonical_groups: &canonical_groups,
        room_capacity: &room_capacity,
        program_sizes: &program_sizes,
        lecturers_by_id: &lecturers_by_id,
        courses_by_id: &courses_by_id,
        config,
    };

    let gga_budget = Duration::from_secs(config.gga_budget_seconds);
    let gga_result = run_gga(&csp_result.outcome.assignments, &gga_inputs, rng, gga_budget, || false, |_, _| {});

    stage(
        progress,
        request.term,
        85,
        "gga",
        &format!("{} generation(s), fitness {:.3}", gga_result.generations_run, gga_result.fitness.overall_fitness),
    )?;

    let final_assignments: Vec<Assignment> = gga_result.chromosome.to_assignments();
    let generation_id = format!("gen-{}-{}-{}", request.faculty.0, request.academic_year, request.term);

    if let Err(err) = ledger.commit_many(&final_assignments, request.faculty, &generation_id) {
        let report = RunReport {
            success: false,
            sessions_count: 0,
            elapsed_ms: started.elapsed().as_millis() as u64,
            final_fitness: 0.0,
            warnings,
            error: Some(err.to_string()),
        };
        return Ok(report);
    }

    for assignment in &final_assignments {
        assignment_sink.persist(assignment, request.faculty, request.academic_year, &generation_id)?;
    }

    stage(
        progress,
        request.term,
        100,
        "done",
        &format!("{} session(s) scheduled", final_assignments.len()),
    )?;

    Ok(RunReport {
        success: true,
        sessions_count: final_assignments.len(),
        elapsed_ms: started.elapsed().as_millis() as u64,
        final_fitness: gga_result.fitness.overall_fitness,
        warnings,
        error: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{InMemoryAssignmentSink, InMemoryEntitySource, NullSink};
    use crate::types::{LecturerId, LecturerRole, Room, RoomType};

    fn sample_source() -> InMemoryEntitySource {
        InMemoryEntitySource {
            programs: vec![Program {
                id: ProgramId("P1".to_string()),
                batch_label: "2025".to_string(),
                code: "BIT".to_string(),
                semester: "S1".to_string(),
                term: None,
                cohort_size: 25,
                course_ids: vec![CourseId("C1".to_string()), CourseId("C2".to_string())],
                faculty: FacultyId("ENG".to_string()),
            }],
            courses: vec![
                Course {
                    id: CourseId("C1".to_string()),
                    code: "C1".to_string(),
                    name: "Course One".to_string(),
                    weekly_hours: 4,
                    credits: 3,
                    preferred_room_type: RoomType::Theory,
                    preferred_term: Some(1),
                    course_group: None,
                    canonical_id: None,
                },
                Course {
                    id: CourseId("C2".to_string()),
                    code: "C2".to_string(),
                    name: "Course Two".to_string(),
                    weekly_hours: 4,
                    credits: 3,
                    preferred_room_type: RoomType::Theory,
                    preferred_term: Some(1),
                    course_group: None,
                    canonical_id: None,
                },
            ],
            lecturers: vec![
                crate::types::Lecturer {
                    id: LecturerId("L1".to_string()),
                    name: "Dr. One".to_string(),
                    role: LecturerRole::FullTime,
                    specializations: vec!["C1".to_string()],
                    availability: None,
                    sessions_per_day: 4,
                    max_weekly_hours: None,
                },
                crate::types::Lecturer {
                    id: LecturerId("L2".to_string()),
                    name: "Dr. Two".to_string(),
                    role: LecturerRole::FullTime,
                    specializations: vec!["C2".to_string()],
                    availability: None,
                    sessions_per_day: 4,
                    max_weekly_hours: None,
                },
            ],
            rooms: vec![
                Room {
                    id: RoomId("R1".to_string()),
                    room_number: "R1".to_string(),
                    capacity: 40,
                    room_type: RoomType::Theory,
                    available: true,
                },
                Room {
                    id: RoomId("R2".to_string()),
                    room_number: "R2".to_string(),
                    capacity: 40,
                    room_type: RoomType::Theory,
                    available: true,
                },
            ],
            canonical_groups: vec![],
        }
    }

    #[test]
    fn end_to_end_run_schedules_and_commits() {
        let source = sample_source();
        let mut sink = InMemoryAssignmentSink::new();
        let mut ledger = BookingLedger::new(1, "2025-2026");
        let mut progress = NullSink;
        let mut config = PlannerConfig::default();
        config.gga_population_size = 10;
        config.gga_max_generations = 2;
        let mut rng = PlannerRng::from_seed(9);

        let request = RunRequest {
            term: 1,
            faculty: &FacultyId("ENG".to_string()),
            academic_year: "2025-2026",
            regenerate: false,
        };

        let report = run(&source, &mut sink, &mut ledger, &mut progress, &config, &mut rng, &request).unwrap();
        assert!(report.success, "{:?}", report.error);
        assert_eq!(report.sessions_count, 4); // 2 courses x 2 sessions each
        assert_eq!(sink.records.len(), 4);
    }
}
