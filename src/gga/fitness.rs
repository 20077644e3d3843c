use super::chromosome::{Chromosome, FitnessScore};
use crate::config::FitnessWeights;
use crate::types::WEEKDAYS;
use std::collections::HashMap;

/// Coefficient of variation (stdev / mean), 0 when every count is equal.
/// Used to turn a distribution of per-bucket loads into a single balance
/// signal: lower variation means a more even spread.
fn coefficient_of_variation(counts: &[f64]) -> f64 {
    if counts.is_empty() {
        return 0.0;
    }
    let mean = counts.iter().sum::<f64>() / counts.len() as f64;
    if mean == 0.0 {
        return 0.0;
    }
    let variance = counts.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / counts.len() as f64;
    variance.sqrt() / mean
}

fn balance_score(counts: &[f64]) -> f64 {
    1.0 / (1.0 + coefficient_of_variation(counts))
}

/// Average idle gap (in periods) between a cohort's sessions on the days
/// it has more than one, converted to a `[0,1]` score where 0 gap is best.
fn student_idle_time_score(chromosome: &Chromosome) -> f64 {
    let mut total_idle = 0u32;
    let mut day_count = 0u32;

    for (_, genes) in chromosome.genes_by_program() {
        let mut by_day: HashMap<_, Vec<u8>> = HashMap::new();
        for gene in genes {
            by_day.entry(gene.time_slot.day).or_default().push(gene.time_slot.period);
        }
        for (_, mut periods) in by_day {
            periods.sort_unstable();
            day_count += 1;
            for window in periods.windows(2) {
                total_idle += (window[1] - window[0]).saturating_sub(1) as u32;
            }
        }
    }

    if day_count == 0 {
        return 1.0;
    }
    let avg_idle = total_idle as f64 / day_count as f64;
    (1.0 - avg_idle / 3.0).clamp(0.0, 1.0)
}

fn lecturer_workload_balance_score(chromosome: &Chromosome) -> f64 {
    let by_lecturer = chromosome.genes_by_lecturer();
    let counts: Vec<f64> = by_lecturer.values().map(|g| g.len() as f64).collect();
    balance_score(&counts)
}

fn room_utilization_score(chromosome: &Chromosome) -> f64 {
    let by_room = chromosome.genes_by_room();
    let counts: Vec<f64> = by_room.values().map(|g| g.len() as f64).collect();
    balance_score(&counts)
}

fn weekday_distribution_score(chromosome: &Chromosome) -> f64 {
    let by_day = chromosome.genes_by_day();
    let counts: Vec<f64> = WEEKDAYS
        .iter()
        .map(|d| by_day.get(d).map(|g| g.len() as f64).unwrap_or(0.0))
        .collect();
    balance_score(&counts)
}

pub fn evaluate(chromosome: &Chromosome, weights: &FitnessWeights) -> FitnessScore {
    let student_idle_time = student_idle_time_score(chromosome);
    let lecturer_workload_balance = lecturer_workload_balance_score(chromosome);
    let room_utilization = room_utilization_score(chromosome);
    let weekday_distribution = weekday_distribution_score(chromosome);

    let overall_fitness = student_idle_time * weights.student_idle_time
        + lecturer_workload_balance * weights.lecturer_workload_balance
        + room_utilization * weights.room_utilization
        + weekday_distribution * weights.weekday_distribution;

    FitnessScore {
        student_idle_time,
        lecturer_workload_balance,
        room_utilization,
        weekday_distribution,
        overall_fitness,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Assignment, ChromosomeId, CourseId, LecturerId, ProgramId, TimeSlot, VariableId, Weekday};

    fn assignment(session: &str, lecturer: &str, room: &str, day: Weekday, period: u8) -> Assignment {
        Assignment {
            variable_id: VariableId(session.to_string()),
            course_id: CourseId("C1".to_string()),
            program_id: ProgramId("P1".to_string()),
            lecturer_id: LecturerId(lecturer.to_string()),
            room_number: room.to_string(),
            time_slot: TimeSlot {
                day,
                period,
                start_minute: 540,
                end_minute: 660,
                is_afternoon: period >= 2,
            },
            term: 1,
            session_number: 1,
        }
    }

    #[test]
    fn back_to_back_sessions_score_higher_idle_than_spread_out() {
        let compact = Chromosome::from_csp_solution(
            &[
                assignment("v1", "L1", "R1", Weekday::Mon, 0),
                assignment("v2", "L1", "R1", Weekday::Mon, 1),
            ],
            ChromosomeId("A".to_string()),
        );
        let spread = Chromosome::from_csp_solution(
            &[
                assignment("v1", "L1", "R1", Weekday::Mon, 0),
                assignment("v2", "L1", "R1", Weekday::Mon, 3),
            ],
            ChromosomeId("B".to_string()),
        );
        let weights = FitnessWeights::default();
        let compact_score = evaluate(&compact, &weights);
        let spread_score = evaluate(&spread, &weights);
        assert!(compact_score.student_idle_time > spread_score.student_idle_time);
    }

    #[test]
    fn overall_fitness_is_in_unit_range() {
        let chromosome = Chromosome::from_csp_solution(
            &[assignment("v1", "L1", "R1", Weekday::Mon, 0)],
            ChromosomeId("A".to_string()),
        );
        let score = evaluate(&chromosome, &FitnessWeights::default());
        assert!(score.overall_fitness >= 0.0 && score.overall_fitness <= 1.0001);
    }
}
