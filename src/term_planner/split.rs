use super::ratio::{program_alternating_ratio, resolve_ratio};
use crate::error::PlannerError;
use crate::types::{Course, CourseId};
use std::collections::HashMap;

/// One resolved term plan: the courses assigned to it plus aggregate totals.
#[derive(Debug, Clone, Default)]
pub struct TermPlan {
    pub term: u8,
    pub course_ids: Vec<CourseId>,
    pub total_weekly_hours: u32,
    pub total_credits: u32,
}

/// One course-group unit, or a lone standalone course.
struct Unit<'a> {
    courses: Vec<&'a Course>,
    group: Option<String>,
}

fn group_units(courses: &[Course]) -> Vec<Unit<'_>> {
    let mut groups: HashMap<String, Vec<&Course>> = HashMap::new();
    let mut standalone: Vec<&Course> = Vec::new();
    let mut group_order: Vec<String> = Vec::new();

    for course in courses {
        match &course.course_group {
            Some(g) => {
                if !groups.contains_key(g) {
                    group_order.push(g.clone());
                }
                groups.entry(g.clone()).or_default().push(course);
            }
            None => standalone.push(course),
        }
    }

    let mut units: Vec<Unit> = group_order
        .into_iter()
        .map(|g| Unit {
            courses: groups.remove(&g).unwrap_or_default(),
            group: Some(g),
        })
        .collect();

    for course in standalone {
        units.push(Unit {
            courses: vec![course],
            group: None,
        });
    }

    units
}

/// Resolves the term for one unit given canonical pins, per the priority
/// order: canonical alignment first, then mandatory `preferred_term`
/// (majority vote across group members), else a missing-input error.
fn resolve_unit_term(
    unit: &Unit,
    canonical_alignment: &HashMap<String, u8>,
) -> Result<u8, Vec<CourseId>> {
    // Priority 1: any member's canonical id already pinned.
    for course in &unit.courses {
        if let Some(cid) = &course.canonical_id {
            if let Some(term) = canonical_alignment.get(cid) {
                return Ok(*term);
            }
        }
    }

    // Priority 2: preferred_term, majority vote across group members.
    let mut votes: HashMap<u8, u32> = HashMap::new();
    let mut offenders = Vec::new();
    for course in &unit.courses {
        match course.preferred_term {
            Some(t) => *votes.entry(t).or_insert(0) += 1,
            None => offenders.push(course.id.clone()),
        }
    }

    if !offenders.is_empty() {
        return Err(offenders);
    }

    let winner = votes
        .into_iter()
        .max_by_key(|(term, count)| (*count, std::cmp::Reverse(*term)))
        .map(|(term, _)| term)
        .expect("unit has at least one course");
    Ok(winner)
}

/// Splits `courses` (all belonging to one cohort's semester) into Term 1
/// and Term 2 plans. `program_code` drives the asymmetric-ratio
/// alternation tiebreak; it has no effect on which specific courses land
/// in which term — that's always canonical-pin or `preferred_term` driven.
pub fn split_semester(
    semester: &str,
    program_code: &str,
    courses: &[Course],
    canonical_alignment: &HashMap<String, u8>,
) -> Result<(TermPlan, TermPlan), PlannerError> {
    let units = group_units(courses);
    let effective_unit_count = units.len() as u32;
    let base_ratio = resolve_ratio(semester, effective_unit_count);
    let _ratio = program_alternating_ratio(program_code, base_ratio);

    let mut term1 = TermPlan {
        term: 1,
        ..Default::default()
    };
    let mut term2 = TermPlan {
        term: 2,
        ..Default::default()
    };
    let mut offenders = Vec::new();

    for unit in &units {
        match resolve_unit_term(unit, canonical_alignment) {
            Ok(term) => {
                let plan = if term == 1 { &mut term1 } else { &mut term2 };
                for course in &unit.courses {
                    plan.course_ids.push(course.id.clone());
                    plan.total_weekly_hours += course.weekly_hours;
                    plan.total_credits += course.credits;
                }
            }
            Err(mut missing) => offenders.append(&mut missing),
        }
    }

    if !offenders.is_empty() {
        return Err(PlannerError::MissingPreferredTerm { offenders });
    }

    Ok((term1, term2))
}

/// Round-trip check: concatenating both term plans reproduces the input
/// course set (multiset equality by id).
pub fn validate_round_trip(courses: &[Course], term1: &TermPlan, term2: &TermPlan) -> bool {
    let mut expected: Vec<&CourseId> = courses.iter().map(|c| &c.id).collect();
    let mut actual: Vec<&CourseId> = term1.course_ids.iter().chain(term2.course_ids.iter()).collect();
    expected.sort();
    actual.sort();
    expected == actual
}
