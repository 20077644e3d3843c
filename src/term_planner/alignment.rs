use super::ratio::{default_split_ratios, resolve_ratio};
use super::split::split_semester;
use crate::types::Course;
use std::collections::HashMap;

/// One cohort's course list as seen by the alignment pass.
pub struct AlignmentInput<'a> {
    pub program_code: &'a str,
    pub semester: &'a str,
    pub courses: &'a [Course],
}

#[derive(Debug, Clone)]
pub struct AlignmentDecision {
    pub canonical_id: String,
    pub assigned_term: u8,
    pub reason: String,
    pub votes: HashMap<u8, u32>,
    pub conflicts: Vec<String>,
}

struct Occurrence {
    course_id: String,
    preferred_term: Option<u8>,
    semester: String,
}

/// Builds a global canonical term alignment so equivalent courses land in
/// the same term across programs, by running a trial split per cohort
/// (without any alignment pin) and observing where course-groups land.
pub fn build_canonical_term_alignment(
    inputs: &[AlignmentInput],
) -> (HashMap<String, u8>, Vec<AlignmentDecision>) {
    let mut occurrences: HashMap<String, Vec<Occurrence>> = HashMap::new();

    for input in inputs {
        for course in input.courses {
            let Some(cid) = &course.canonical_id else {
                continue;
            };
            occurrences.entry(cid.clone()).or_default().push(Occurrence {
                course_id: course.id.0.clone(),
                preferred_term: course.preferred_term,
                semester: input.semester.to_string(),
            });
        }
    }

    // Trial split per cohort (no alignment) to see where course-groups land.
    let mut canonical_term_from_groups: HashMap<String, u8> = HashMap::new();
    for input in inputs {
        let Ok((term1, term2)) = split_semester(
            input.semester,
            input.program_code,
            input.courses,
            &HashMap::new(),
        ) else {
            continue;
        };

        for (plan, term) in [(&term1, 1u8), (&term2, 2u8)] {
            for course_id in &plan.course_ids {
                let Some(course) = input.courses.iter().find(|c| &c.id == course_id) else {
                    continue;
                };
                if course.course_group.is_none() {
                    continue;
                }
                let Some(cid) = &course.canonical_id else {
                    continue;
                };
                let opposite = if term == 1 { 2u8 } else { 1u8 };
                if canonical_term_from_groups.get(cid) != Some(&opposite) {
                    canonical_term_from_groups.insert(cid.clone(), term);
                }
            }
        }
    }

    let mut alignment = HashMap::new();
    let mut decisions = Vec::new();
    let defaults = default_split_ratios();

    for (canonical_id, occs) in &occurrences {
        let unique_courses: std::collections::HashSet<&str> =
            occs.iter().map(|o| o.course_id.as_str()).collect();
        if unique_courses.len() <= 1 {
            continue;
        }

        let mut votes: HashMap<u8, u32> = HashMap::new();
        for o in occs {
            if let Some(t) = o.preferred_term {
                *votes.entry(t).or_insert(0) += 1;
            }
        }

        let (assigned_term, reason) = if let Some(term) = canonical_term_from_groups.get(canonical_id) {
            (
                *term,
                format!("Aligned with subject group assignment (Term {term})"),
            )
        } else if !votes.is_empty() {
            let max_count = *votes.values().max().unwrap();
            // Tie -> term 1.
            let term = if votes.get(&1).copied().unwrap_or(0) == max_count {
                1
            } else {
                *votes
                    .iter()
                    .max_by_key(|(_, count)| **count)
                    .map(|(term, _)| term)
                    .unwrap()
            };
            (term, format!("Majority preferred Term {term} ({max_count} votes)"))
        } else {
            let sample_semester = occs.first().map(|o| o.semester.as_str());
            let ratio = sample_semester.and_then(|s| defaults.get(s)).copied();
            match ratio {
                Some(r) if r.term1_units != r.term2_units => {
                    let term = if r.term1_units >= r.term2_units { 1 } else { 2 };
                    (term, format!("Followed semester ratio bias (Term {term})"))
                }
                _ => (1u8, "Defaulted to Term 1 (no preferences)".to_string()),
            }
        };

        let conflicts = if votes.len() > 1 {
            vec![format!(
                "Conflicting preferences: Term 1 = {}, Term 2 = {}",
                votes.get(&1).copied().unwrap_or(0),
                votes.get(&2).copied().unwrap_or(0)
            )]
        } else {
            Vec::new()
        };

        alignment.insert(canonical_id.clone(), assigned_term);
        decisions.push(AlignmentDecision {
            canonical_id: canonical_id.clone(),
            assigned_term,
            reason,
            votes,
            conflicts,
        });
    }

    let _ = resolve_ratio; // retained for ratio-table reuse by callers of split_semester
    (alignment, decisions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CourseId, RoomType};

    fn course(id: &str, term: Option<u8>, group: Option<&str>, canonical: Option<&str>) -> Course {
        Course {
            id: CourseId(id.to_string()),
            code: id.to_string(),
            name: id.to_string(),
            weekly_hours: 4,
            credits: 3,
            preferred_room_type: RoomType::Theory,
            preferred_term: term,
            course_group: group.map(|s| s.to_string()),
            canonical_id: canonical.map(|s| s.to_string()),
        }
    }

    #[test]
    fn course_group_priority_pulls_equivalent_into_same_term() {
        let program_a_courses = vec![
            course("BIT1212_THEORY", Some(1), Some("DB_PAIR"), Some("DB_SYS")),
            course("BIT1214_PRACTICAL", Some(1), Some("DB_PAIR"), None),
        ];
        let program_b_courses = vec![course("BCS1212_THEORY", Some(2), None, Some("DB_SYS"))];

        let inputs = vec![
            AlignmentInput {
                program_code: "BIT",
                semester: "S3",
                courses: &program_a_courses,
            },
            AlignmentInput {
                program_code: "BCS",
                semester: "S3",
                courses: &program_b_courses,
            },
        ];

        let (alignment, decisions) = build_canonical_term_alignment(&inputs);
        assert_eq!(alignment.get("DB_SYS"), Some(&1));
        assert!(decisions.iter().any(|d| d.canonical_id == "DB_SYS"));
    }

    #[test]
    fn single_occurrence_canonical_is_skipped() {
        let courses = vec![course("C1", Some(1), None, Some("SOLO"))];
        let inputs = vec![AlignmentInput {
            program_code: "BIT",
            semester: "S1",
            courses: &courses,
        }];
        let (alignment, _) = build_canonical_term_alignment(&inputs);
        assert!(alignment.is_empty());
    }
}
