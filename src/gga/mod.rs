//! Guided genetic algorithm: takes the CSP's feasible (or partial) seed and
//! searches for a fitter schedule while never weakening a hard constraint.
//! See `chromosome` for the candidate representation, `fitness` for the
//! weighted scoring function, and `operators` for crossover/mutation.

pub mod chromosome;
pub mod fitness;
pub mod operators;

use crate::config::PlannerConfig;
use crate::rng::PlannerRng;
use crate::types::{
    Assignment, ChromosomeId, Course, CourseId, Lecturer, LecturerId, RoomId, SchedulingVariable, VariableId,
    Weekday,
};
use chromosome::{Chromosome, FitnessScore};
use operators::{crossover, is_feasible, is_feasible_with_merge_group, mutate, CrossoverStrategy, OperatorContext};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// Two session ids that must keep the same day and adjacent periods
/// (typically a theory+practical pair). Mutation and crossover move them
/// together or not at all.
pub type VariablePair = (VariableId, VariableId);

/// `canonical_id -> session_number -> variable ids` eligible for the merge
/// mutation's room-sharing optimization, built by the CSP once search
/// completes.
pub type CanonicalGroups = HashMap<String, HashMap<u32, Vec<VariableId>>>;

pub struct GgaRunInputs<'a> {
    pub variables: &'a [SchedulingVariable],
    pub variable_pairs: &'a [VariablePair],
    pub canonical_groups: &'a CanonicalGroups,
    pub room_capacity: &'a HashMap<RoomId, u32>,
    pub program_sizes: &'a HashMap<crate::types::ProgramId, u32>,
    /// Needed by `is_feasible` to re-check the lecturer daily/weekly caps
    /// and canonical-same-day constraint the CSP's domain pruning enforces
    /// but a gene's value alone doesn't carry.
    pub lecturers_by_id: &'a HashMap<LecturerId, &'a Lecturer>,
    pub courses_by_id: &'a HashMap<CourseId, &'a Course>,
    pub config: &'a PlannerConfig,
}

pub struct GgaRunResult {
    pub chromosome: Chromosome,
    pub fitness: FitnessScore,
    pub generations_run: u32,
    pub stalled: bool,
}

/// Builds the per-variable lookup `OperatorContext` needs from the flat
/// variable list the CSP produced.
fn variables_by_id(variables: &[SchedulingVariable]) -> HashMap<VariableId, SchedulingVariable> {
    variables.iter().map(|v| (v.id.clone(), v.clone())).collect()
}

/// Forces each pair's second gene onto the first gene's day, preserving the
/// pair's original period offset, after a mutation or crossover may have
/// separated them. Pairs that can't be reconciled without breaking a room
/// or lecturer domain constraint are left as-is; the caller's feasibility
/// check discards the candidate if that leaves a hard-constraint violation.
fn sync_pairs(chromosome: &mut Chromosome, pairs: &[VariablePair]) {
    for (a, b) in pairs {
        let day_a = chromosome
            .genes
            .iter()
            .find(|g| &g.session_id == a)
            .map(|g| g.time_slot.day);
        let Some(day_a) = day_a else { continue };
        if let Some(gene_b) = chromosome.genes.iter_mut().find(|g| &g.session_id == b) {
            gene_b.time_slot.day = day_a;
        }
    }
}

/// Population seed: the CSP chromosome plus `population_size - 1` mildly
/// mutated variants, so the initial generation already spans some
/// diversity around the feasible baseline.
fn seed_population(
    base: &Chromosome,
    size: usize,
    ctx: &OperatorContext,
    rng: &mut PlannerRng,
) -> Vec<Chromosome> {
    let mut population = Vec::with_capacity(size);
    population.push(base.clone());
    for i in 1..size {
        let mut variant = mutate(base, ctx, None, rng);
        variant.id = ChromosomeId(format!("seed_{i}"));
        population.push(variant);
    }
    population
}

/// Evaluates every chromosome's fitness on a scoped thread pool sized to
/// available parallelism (capped so small populations don't oversubscribe
/// a handful of cores). Each worker only ever touches its own slice of the
/// population plus the read-only entity/weight tables; results are
/// collected back on the calling thread before selection proceeds.
fn evaluate_population(population: &mut [Chromosome], weights: &crate::config::FitnessWeights) {
    let worker_count = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(population.len().max(1))
        .max(1);

    if worker_count <= 1 || population.len() < 32 {
        for chromosome in population.iter_mut() {
            chromosome.fitness = Some(fitness::evaluate(chromosome, weights));
        }
        return;
    }

    std::thread::scope(|scope| {
        let chunk_size = population.len().div_ceil(worker_count);
        for chunk in population.chunks_mut(chunk_size) {
            scope.spawn(move || {
                for chromosome in chunk.iter_mut() {
                    chromosome.fitness = Some(fitness::evaluate(chromosome, weights));
                }
            });
        }
    });
}

fn tournament_select<'a>(
    population: &'a [Chromosome],
    tournament_size: usize,
    rng: &mut PlannerRng,
) -> &'a Chromosome {
    let mut best: Option<&Chromosome> = None;
    for _ in 0..tournament_size {
        let idx = rng.gen_range(0..population.len());
        let candidate = &population[idx];
        let better = match best {
            None => true,
            Some(b) => {
                candidate.fitness.map(|f| f.overall_fitness).unwrap_or(0.0)
                    > b.fitness.map(|f| f.overall_fitness).unwrap_or(0.0)
            }
        };
        if better {
            best = Some(candidate);
        }
    }
    best.unwrap_or(&population[0])
}

fn crossover_strategy(rng: &mut PlannerRng) -> CrossoverStrategy {
    match rng.gen_range(0..3) {
        0 => CrossoverStrategy::Uniform,
        1 => CrossoverStrategy::DayBased,
        _ => CrossoverStrategy::LecturerBased,
    }
}

/// Dedicated merge mutation: for a `canonical_groups` bucket whose cohort
/// sizes already sum to at most a compatible room's capacity, collapses
/// every session in the bucket onto the same `(day, period, room,
/// lecturer)`, consolidating rooms as a pure soft-objective move. Never
/// reachable from the CSP — gated purely by the capacity check, per the
/// merge-mutation-gating design note.
fn try_merge_mutation(
    chromosome: &Chromosome,
    inputs: &GgaRunInputs,
    variables: &HashMap<VariableId, SchedulingVariable>,
    rng: &mut PlannerRng,
) -> Option<(Chromosome, Vec<VariableId>)> {
    let mergeable_ids: Vec<&VariableId> = inputs
        .canonical_groups
        .values()
        .flat_map(|by_session| by_session.values())
        .find(|ids| ids.len() > 1)?
        .iter()
        .collect();

    let gene_indices: Vec<usize> = chromosome
        .genes
        .iter()
        .enumerate()
        .filter(|(_, g)| mergeable_ids.contains(&&g.session_id))
        .map(|(i, _)| i)
        .collect();
    if gene_indices.len() < 2 {
        return None;
    }

    let total_size: u32 = gene_indices
        .iter()
        .map(|&i| {
            inputs
                .program_sizes
                .get(&chromosome.genes[i].program_id)
                .copied()
                .unwrap_or(0)
        })
        .sum();

    // A merge target must be a room every merged session's own CSP-pruned
    // domain already allows, not just any room with enough capacity — else
    // the merge can plant a theory course in a lab, or a room outside a
    // merged variable's domain entirely (constraints 4/5).
    let mut shared_rooms: Option<HashSet<RoomId>> = None;
    for id in &mergeable_ids {
        let domain: HashSet<RoomId> = match variables.get(id) {
            Some(variable) => variable.rooms.iter().cloned().collect(),
            None => return None,
        };
        shared_rooms = Some(match shared_rooms {
            Some(existing) => existing.intersection(&domain).cloned().collect(),
            None => domain,
        });
    }
    let shared_rooms = shared_rooms?;

    let target_room = shared_rooms
        .into_iter()
        .filter(|id| inputs.room_capacity.get(id).copied().unwrap_or(0) >= total_size)
        .min_by_key(|id| inputs.room_capacity.get(id).copied().unwrap_or(u32::MAX))?;

    let anchor = chromosome.genes[gene_indices[0]].clone();
    let mut candidate = chromosome.clone();
    for &idx in &gene_indices {
        candidate.genes[idx].time_slot = anchor.time_slot;
        candidate.genes[idx].room_number = target_room.0.clone();
        candidate.genes[idx].lecturer_id = anchor.lecturer_id.clone();
    }
    candidate.id = ChromosomeId(format!("{}_merge", chromosome.id.0));
    let _ = rng; // merge target is deterministic; rng kept for signature symmetry with other mutations
    let merged_ids: Vec<VariableId> = mergeable_ids.into_iter().cloned().collect();
    Some((candidate, merged_ids))
}

/// Runs the guided genetic algorithm to completion: target fitness,
/// generation cap, or stall limit, whichever comes first, or the wall
/// clock budget / cancellation signal. Returns the best chromosome seen
/// across the whole run, not just the final generation's survivor.
pub fn run_gga(
    seed_assignments: &[Assignment],
    inputs: &GgaRunInputs,
    rng: &mut PlannerRng,
    budget: Duration,
    mut should_cancel: impl FnMut() -> bool,
    mut on_generation: impl FnMut(u32, f64),
) -> GgaRunResult {
    let started = Instant::now();
    let variables = variables_by_id(inputs.variables);
    let ctx = OperatorContext {
        variables: &variables,
        lecturers_by_id: inputs.lecturers_by_id,
        courses_by_id: inputs.courses_by_id,
        mutation_rate: inputs.config.gga_mutation_rate,
        crossover_rate: inputs.config.gga_crossover_rate,
    };

    let seed = Chromosome::from_csp_solution(seed_assignments, ChromosomeId("CSP_SEED".to_string()));
    let mut population = seed_population(&seed, inputs.config.gga_population_size.max(1), &ctx, rng);
    evaluate_population(&mut population, &inputs.config.fitness_weights);

    let mut best = population[0].clone();
    let mut best_score = best.fitness.map(|f| f.overall_fitness).unwrap_or(0.0);
    for candidate in &population {
        let score = candidate.fitness.map(|f| f.overall_fitness).unwrap_or(0.0);
        if score > best_score {
            best = candidate.clone();
            best_score = score;
        }
    }

    let elite_count = 10.min(population.len());
    let mut generations_run = 0u32;
    let mut stall_count = 0u32;
    let mut stalled = false;

    for generation in 1..=inputs.config.gga_max_generations {
        if started.elapsed() > budget || should_cancel() {
            break;
        }
        if best_score >= inputs.config.gga_target_fitness {
            break;
        }
        if stall_count >= inputs.config.gga_stall_limit {
            stalled = true;
            break;
        }

        population.sort_by(|a, b| {
            b.fitness
                .map(|f| f.overall_fitness)
                .unwrap_or(0.0)
                .partial_cmp(&a.fitness.map(|f| f.overall_fitness).unwrap_or(0.0))
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut next_gen: Vec<Chromosome> = population[..elite_count].to_vec();

        while next_gen.len() < population.len() {
            let parent1 = tournament_select(&population, 3, rng);
            let parent2 = tournament_select(&population, 3, rng);
            let strategy = crossover_strategy(rng);
            let (mut child1, mut child2) = crossover(parent1, parent2, strategy, &ctx, rng);

            sync_pairs(&mut child1, inputs.variable_pairs);
            if !is_feasible(&child1, &ctx) {
                child1 = parent1.clone();
            }
            sync_pairs(&mut child2, inputs.variable_pairs);
            if !is_feasible(&child2, &ctx) {
                child2 = parent2.clone();
            }

            if rng.gen_bool(inputs.config.gga_mutation_rate) {
                child1 = mutate(&child1, &ctx, child1.fitness.as_ref(), rng);
            }
            if rng.gen_bool(inputs.config.gga_mutation_rate) {
                child2 = mutate(&child2, &ctx, child2.fitness.as_ref(), rng);
            }

            if rng.gen_bool(0.05) {
                if let Some((merged, merged_ids)) = try_merge_mutation(&child1, inputs, &variables, rng) {
                    if is_feasible_with_merge_group(&merged, &merged_ids, &ctx) {
                        child1 = merged;
                    }
                }
            }

            child1.generation = generation;
            child1.age = 0;
            child2.generation = generation;
            child2.age = 0;
            next_gen.push(child1);
            if next_gen.len() < population.len() {
                next_gen.push(child2);
            }
        }

        for elite in next_gen.iter_mut().take(elite_count) {
            elite.age += 1;
        }

        population = next_gen;
        evaluate_population(&mut population, &inputs.config.fitness_weights);

        let mut generation_best = 0.0f64;
        for candidate in &population {
            let score = candidate.fitness.map(|f| f.overall_fitness).unwrap_or(0.0);
            if score > generation_best {
                generation_best = score;
            }
            if score > best_score {
                best = candidate.clone();
                best_score = score;
            }
        }

        if generation_best <= best_score - 1e-9 || (generation_best - best_score).abs() < 1e-9 {
            stall_count += 1;
        } else {
            stall_count = 0;
        }

        generations_run = generation;
        on_generation(generation, best_score);
    }

    GgaRunResult {
        fitness: best.fitness.unwrap_or_default(),
        chromosome: best,
        generations_run,
        stalled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlannerConfig;
    use crate::types::{CourseId, LecturerId, LecturerRole, ProgramId, RoomType, TimeSlot};
    use std::collections::HashMap;

    fn lecturer(id: &str) -> Lecturer {
        Lecturer {
            id: LecturerId(id.to_string()),
            name: id.to_string(),
            role: LecturerRole::FullTime,
            specializations: vec!["C1".to_string()],
            availability: None,
            sessions_per_day: 4,
            max_weekly_hours: None,
        }
    }

    fn course() -> Course {
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
        }
    }

    fn variable(id: &str, day: Weekday) -> SchedulingVariable {
        SchedulingVariable {
            id: VariableId(id.to_string()),
            course_id: CourseId("C1".to_string()),
            program_id: ProgramId("P1".to_string()),
            session_number: 1,
            term: 1,
            time_slots: vec![
                TimeSlot { day, period: 0, start_minute: 540, end_minute: 660, is_afternoon: false },
                TimeSlot { day, period: 1, start_minute: 660, end_minute: 780, is_afternoon: false },
            ],
            lecturers: vec![LecturerId("L1".to_string())],
            rooms: vec![RoomId("R1".to_string())],
            lecturer_time_slots: HashMap::new(),
            assignment: None,
        }
    }

    fn assignment(id: &str, day: Weekday, period: u8) -> Assignment {
        Assignment {
            variable_id: VariableId(id.to_string()),
            course_id: CourseId("C1".to_string()),
            program_id: ProgramId("P1".to_string()),
            lecturer_id: LecturerId("L1".to_string()),
            room_number: "R1".to_string(),
            time_slot: TimeSlot { day, period, start_minute: 540, end_minute: 660, is_afternoon: false },
            term: 1,
            session_number: 1,
        }
    }

    #[test]
    fn gga_never_regresses_below_seed_fitness() {
        let seed = vec![
            assignment("v1", Weekday::Mon, 0),
            assignment("v2", Weekday::Tue, 0),
        ];
        let variables = vec![variable("v1", Weekday::Mon), variable("v2", Weekday::Tue)];
        let mut config = PlannerConfig::default();
        config.gga_population_size = 20;
        config.gga_max_generations = 5;
        let room_capacity: HashMap<RoomId, u32> = [(RoomId("R1".to_string()), 40)].into_iter().collect();
        let program_sizes: HashMap<ProgramId, u32> = [(ProgramId("P1".to_string()), 25)].into_iter().collect();
        let canonical_groups = CanonicalGroups::new();
        let pairs = Vec::new();
        let l1 = lecturer("L1");
        let lecturers_by_id: HashMap<LecturerId, &Lecturer> = [(l1.id.clone(), &l1)].into_iter().collect();
        let c1 = course();
        let courses_by_id: HashMap<CourseId, &Course> = [(c1.id.clone(), &c1)].into_iter().collect();

        let inputs = GgaRunInputs {
            variables: &variables,
            variable_pairs: &pairs,
            canonical_groups: &canonical_groups,
            room_capacity: &room_capacity,
            program_sizes: &program_sizes,
            lecturers_by_id: &lecturers_by_id,
            courses_by_id: &courses_by_id,
            config: &config,
        };

        let seed_chromosome = Chromosome::from_csp_solution(&seed, ChromosomeId("seed".to_string()));
        let seed_score = fitness::evaluate(&seed_chromosome, &config.fitness_weights).overall_fitness;

        let mut rng = PlannerRng::from_seed(11);
        let result = run_gga(&seed, &inputs, &mut rng, Duration::from_secs(5), || false, |_, _| {});

        assert!(result.fitness.overall_fitness >= seed_score - 1e-6);
        let variables_by_id: HashMap<VariableId, SchedulingVariable> =
            variables.iter().map(|v| (v.id.clone(), v.clone())).collect();
        let verify_ctx = OperatorContext {
            variables: &variables_by_id,
            lecturers_by_id: &lecturers_by_id,
            courses_by_id: &courses_by_id,
            mutation_rate: config.gga_mutation_rate,
            crossover_rate: config.gga_crossover_rate,
        };
        assert!(is_feasible(&result.chromosome, &verify_ctx));
    }

    #[test]
    fn merge_mutation_only_picks_room_in_shared_domain() {
        let lab_room = RoomId("LAB1".to_string());
        let mut v1 = variable("v1", Weekday::Mon);
        v1.rooms = vec![lab_room.clone()];
        let mut v2 = variable("v2", Weekday::Tue);
        v2.rooms = vec![lab_room.clone()];
        let variables = vec![v1, v2];
        let variables_by_id: HashMap<VariableId, SchedulingVariable> =
            variables.iter().map(|v| (v.id.clone(), v.clone())).collect();

        let mut canonical_groups = CanonicalGroups::new();
        canonical_groups
            .entry("CANON".to_string())
            .or_default()
            .insert(1, vec![VariableId("v1".to_string()), VariableId("v2".to_string())]);

        // THEORY1 has plenty of capacity but isn't in either merged
        // variable's room domain (wrong type) — it must never be picked.
        let room_capacity: HashMap<RoomId, u32> = [
            (lab_room.clone(), 30),
            (RoomId("THEORY1".to_string()), 200),
        ]
        .into_iter()
        .collect();
        let program_sizes: HashMap<ProgramId, u32> = [(ProgramId("P1".to_string()), 10)].into_iter().collect();
        let pairs = Vec::new();
        let config = PlannerConfig::default();
        let l1 = lecturer("L1");
        let lecturers_by_id: HashMap<LecturerId, &Lecturer> = [(l1.id.clone(), &l1)].into_iter().collect();
        let c1 = course();
        let courses_by_id: HashMap<CourseId, &Course> = [(c1.id.clone(), &c1)].into_iter().collect();

        let inputs = GgaRunInputs {
            variables: &variables,
            variable_pairs: &pairs,
            canonical_groups: &canonical_groups,
            room_capacity: &room_capacity,
            program_sizes: &program_sizes,
            lecturers_by_id: &lecturers_by_id,
            courses_by_id: &courses_by_id,
            config: &config,
        };

        let seed_genes = vec![
            Assignment {
                variable_id: VariableId("v1".to_string()),
                course_id: CourseId("C1".to_string()),
                program_id: ProgramId("P1".to_string()),
                lecturer_id: LecturerId("L1".to_string()),
                room_number: lab_room.0.clone(),
                time_slot: TimeSlot { day: Weekday::Mon, period: 0, start_minute: 540, end_minute: 660, is_afternoon: false },
                term: 1,
                session_number: 1,
            },
            Assignment {
                variable_id: VariableId("v2".to_string()),
                course_id: CourseId("C1".to_string()),
                program_id: ProgramId("P1".to_string()),
                lecturer_id: LecturerId("L1".to_string()),
                room_number: lab_room.0.clone(),
                time_slot: TimeSlot { day: Weekday::Tue, period: 0, start_minute: 540, end_minute: 660, is_afternoon: false },
                term: 1,
                session_number: 1,
            },
        ];
        let chromosome = Chromosome::from_csp_solution(&seed_genes, ChromosomeId("c1".to_string()));

        let mut rng = PlannerRng::from_seed(1);
        let (merged, merged_ids) = try_merge_mutation(&chromosome, &inputs, &variables_by_id, &mut rng)
            .expect("merge candidate");
        assert_eq!(merged_ids.len(), 2);
        for gene in merged.genes.iter().filter(|g| merged_ids.contains(&g.session_id)) {
            assert_eq!(gene.room_number, lab_room.0);
        }
    }
}
