use super::chromosome::{Chromosome, FitnessScore, Gene};
use crate::rng::PlannerRng;
use crate::types::{
    ChromosomeId, Course, CourseId, Lecturer, LecturerId, ProgramId, SchedulingVariable, VariableId,
    Weekday, WEEKDAYS,
};
use std::collections::{HashMap, HashSet};

/// Read-only context every mutation/crossover call needs: the pruned CSP
/// domain per variable (so a mutated gene only ever lands on a value that
/// was already qualification/capacity/availability-checked), the lecturer
/// and course lookup tables `is_feasible` needs to re-check the caps and
/// canonical-day constraints the domain itself doesn't encode, and the
/// configured rates.
pub struct OperatorContext<'a> {
    pub variables: &'a HashMap<VariableId, SchedulingVariable>,
    pub lecturers_by_id: &'a HashMap<LecturerId, &'a Lecturer>,
    pub courses_by_id: &'a HashMap<CourseId, &'a Course>,
    pub mutation_rate: f64,
    pub crossover_rate: f64,
}

fn canonical_key(course: &Course) -> String {
    course.canonical_id.clone().unwrap_or_else(|| course.code.clone())
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum CrossoverStrategy {
    Uniform,
    DayBased,
    LecturerBased,
}

/// Per-lecturer, per-day bookkeeping for constraint 7 (session cap, one
/// morning slot, one afternoon slot).
#[derive(Default)]
struct LecturerDayLoad {
    sessions: u32,
    morning_used: bool,
    afternoon_used: bool,
}

/// Re-checks every hard constraint the CSP's own candidate generation
/// enforces (§4.3): no room/lecturer/cohort double-booking, per-day and
/// weekly lecturer caps, part-time availability, and the one-canonical-
/// course-per-cohort-per-day rule. Mutation and crossover both reject any
/// candidate that fails this, so the population never drifts infeasible
/// — matching the design note that the GGA must not weaken any hard
/// constraint the CSP already established.
pub fn is_feasible(chromosome: &Chromosome, ctx: &OperatorContext) -> bool {
    let mut rooms = HashSet::new();
    let mut lecturers = HashSet::new();
    let mut cohorts = HashSet::new();
    let mut canonical_days = HashSet::new();
    let mut lecturer_days: HashMap<(LecturerId, Weekday), LecturerDayLoad> = HashMap::new();
    let mut lecturer_hours: HashMap<LecturerId, u32> = HashMap::new();

    for gene in &chromosome.genes {
        let room_key = (gene.room_number.clone(), gene.time_slot.day, gene.time_slot.period);
        if !rooms.insert(room_key) {
            return false;
        }
        let lecturer_key = (gene.lecturer_id.clone(), gene.time_slot.day, gene.time_slot.period);
        if !lecturers.insert(lecturer_key) {
            return false;
        }
        let cohort_key = (gene.program_id.clone(), gene.time_slot.day, gene.time_slot.period);
        if !cohorts.insert(cohort_key) {
            return false;
        }

        if let Some(variable) = ctx.variables.get(&gene.session_id) {
            if let Some(allowed) = variable.lecturer_time_slots.get(&gene.lecturer_id) {
                if !allowed.iter().any(|s| s.key() == gene.time_slot.key()) {
                    return false;
                }
            }
        }

        if let Some(course) = ctx.courses_by_id.get(&gene.course_id) {
            let key = (gene.program_id.clone(), canonical_key(course), gene.time_slot.day);
            if !canonical_days.insert(key) {
                return false;
            }
        }

        let load = lecturer_days.entry((gene.lecturer_id.clone(), gene.time_slot.day)).or_default();
        load.sessions += 1;
        if gene.time_slot.is_afternoon {
            if load.afternoon_used {
                return false;
            }
            load.afternoon_used = true;
        } else {
            if load.morning_used {
                return false;
            }
            load.morning_used = true;
        }
        if let Some(lecturer) = ctx.lecturers_by_id.get(&gene.lecturer_id) {
            if load.sessions > lecturer.sessions_per_day {
                return false;
            }
        }

        let hours = lecturer_hours.entry(gene.lecturer_id.clone()).or_insert(0);
        *hours += 2;
        if let Some(lecturer) = ctx.lecturers_by_id.get(&gene.lecturer_id) {
            if *hours > lecturer.effective_max_weekly_hours() {
                return false;
            }
        }
    }
    true
}

/// Like [`is_feasible`], but treats every gene whose `session_id` is in
/// `merged_ids` as one virtual occupant of its `(room, day, period,
/// lecturer)` rather than independent occupants — used only to validate a
/// merge mutation's result, where several cohorts are meant to share one
/// room/lecturer/slot as long as their combined size still fit the room
/// (checked separately, by the caller, before this runs).
pub fn is_feasible_with_merge_group(
    chromosome: &Chromosome,
    merged_ids: &[VariableId],
    ctx: &OperatorContext,
) -> bool {
    let mut rooms = HashSet::new();
    let mut lecturers = HashSet::new();
    let mut cohorts = HashSet::new();
    let mut canonical_days = HashSet::new();
    let mut lecturer_days: HashMap<(LecturerId, Weekday), LecturerDayLoad> = HashMap::new();
    let mut lecturer_hours: HashMap<LecturerId, u32> = HashMap::new();

    for gene in &chromosome.genes {
        let is_merged = merged_ids.contains(&gene.session_id);
        let cohort_key = (gene.program_id.clone(), gene.time_slot.day, gene.time_slot.period);
        if !cohorts.insert(cohort_key) {
            return false;
        }

        if let Some(course) = ctx.courses_by_id.get(&gene.course_id) {
            let key = (gene.program_id.clone(), canonical_key(course), gene.time_slot.day);
            if !canonical_days.insert(key) {
                return false;
            }
        }

        if is_merged {
            continue;
        }

        let room_key = (gene.room_number.clone(), gene.time_slot.day, gene.time_slot.period);
        if !rooms.insert(room_key) {
            return false;
        }
        let lecturer_key = (gene.lecturer_id.clone(), gene.time_slot.day, gene.time_slot.period);
        if !lecturers.insert(lecturer_key) {
            return false;
        }

        if let Some(variable) = ctx.variables.get(&gene.session_id) {
            if let Some(allowed) = variable.lecturer_time_slots.get(&gene.lecturer_id) {
                if !allowed.iter().any(|s| s.key() == gene.time_slot.key()) {
                    return false;
                }
            }
        }

        let load = lecturer_days.entry((gene.lecturer_id.clone(), gene.time_slot.day)).or_default();
        load.sessions += 1;
        if gene.time_slot.is_afternoon {
            if load.afternoon_used {
                return false;
            }
            load.afternoon_used = true;
        } else {
            if load.morning_used {
                return false;
            }
            load.morning_used = true;
        }
        if let Some(lecturer) = ctx.lecturers_by_id.get(&gene.lecturer_id) {
            if load.sessions > lecturer.sessions_per_day {
                return false;
            }
        }

        let hours = lecturer_hours.entry(gene.lecturer_id.clone()).or_insert(0);
        *hours += 2;
        if let Some(lecturer) = ctx.lecturers_by_id.get(&gene.lecturer_id) {
            if *hours > lecturer.effective_max_weekly_hours() {
                return false;
            }
        }
    }
    true
}

fn mutate_gene(gene: &mut Gene, ctx: &OperatorContext, rng: &mut PlannerRng) {
    let Some(variable) = ctx.variables.get(&gene.session_id) else {
        return;
    };
    match rng.gen_range(0..3) {
        0 => {
            // Constrain to the current lecturer's available-slot subset, if
            // they have one (constraint 9) — the full slot grid would let a
            // part-time lecturer's gene drift outside their availability.
            let candidates: &[crate::types::TimeSlot] = variable
                .lecturer_time_slots
                .get(&gene.lecturer_id)
                .map(|slots| slots.as_slice())
                .unwrap_or(variable.time_slots.as_slice());
            if let Some(slot) = rng.choose(candidates) {
                gene.time_slot = *slot;
            }
        }
        1 => {
            if let Some(room) = rng.choose(&variable.rooms) {
                gene.room_number = room.0.clone();
            }
        }
        _ => {
            // Only swap in a lecturer whose availability (if restricted)
            // still covers the gene's current slot, so the mutation alone
            // never produces a part-time-availability violation.
            let candidates: Vec<&LecturerId> = variable
                .lecturers
                .iter()
                .filter(|l| {
                    variable
                        .lecturer_time_slots
                        .get(l)
                        .map(|slots| slots.iter().any(|s| s.key() == gene.time_slot.key()))
                        .unwrap_or(true)
                })
                .collect();
            if let Some(lecturer) = rng.choose(&candidates) {
                gene.lecturer_id = (*lecturer).clone();
            }
        }
    }
}

fn random_mutation(chromosome: &mut Chromosome, ctx: &OperatorContext, rng: &mut PlannerRng) {
    if chromosome.genes.is_empty() {
        return;
    }
    let count = ((chromosome.genes.len() as f64 * ctx.mutation_rate).ceil() as usize)
        .max(1)
        .min(chromosome.genes.len());
    let mut indices: Vec<usize> = (0..chromosome.genes.len()).collect();
    rng.shuffle(&mut indices);
    for &idx in indices.iter().take(count) {
        mutate_gene(&mut chromosome.genes[idx], ctx, rng);
    }
}

fn day_session_counts(chromosome: &Chromosome) -> HashMap<Weekday, usize> {
    let mut counts = HashMap::new();
    for gene in &chromosome.genes {
        *counts.entry(gene.time_slot.day).or_insert(0) += 1;
    }
    counts
}

fn busiest_and_lightest_day(counts: &HashMap<Weekday, usize>) -> Option<(Weekday, Weekday)> {
    let busiest = counts.iter().max_by_key(|(_, c)| **c).map(|(d, _)| *d)?;
    let lightest = WEEKDAYS
        .iter()
        .min_by_key(|d| counts.get(d).copied().unwrap_or(0))
        .copied()?;
    Some((busiest, lightest))
}

/// Moves one session of the cohort's busiest day to a later free period on
/// the same day, narrowing the gap toward the first session.
fn compact_schedule_mutation(chromosome: &mut Chromosome) {
    let groups: Vec<Vec<VariableId>> = {
        let mut by_program_day: HashMap<(ProgramId, Weekday), Vec<VariableId>> = HashMap::new();
        for (program, genes) in chromosome.genes_by_program() {
            for gene in &genes {
                by_program_day
                    .entry((program.clone(), gene.time_slot.day))
                    .or_default()
                    .push(gene.session_id.clone());
            }
        }
        by_program_day.into_values().collect()
    };

    let Some(ids) = groups.into_iter().find(|ids| ids.len() > 1) else {
        return;
    };
    let target = &ids[0];
    if let Some(gene) = chromosome.genes.iter_mut().find(|g| &g.session_id == target) {
        if gene.time_slot.period > 0 {
            gene.time_slot.period -= 1;
        }
    }
}

/// Moves one session belonging to the most-loaded lecturer from their
/// busiest day to their lightest day.
fn balance_lecturer_load_mutation(chromosome: &mut Chromosome) {
    let by_lecturer: HashMap<LecturerId, Vec<VariableId>> = chromosome
        .genes_by_lecturer()
        .into_iter()
        .map(|(k, v)| (k, v.into_iter().map(|g| g.session_id.clone()).collect()))
        .collect();

    let Some((lecturer, ids)) = by_lecturer.iter().max_by_key(|(_, ids)| ids.len()) else {
        return;
    };
    let mut per_day: HashMap<Weekday, usize> = HashMap::new();
    for id in ids {
        if let Some(gene) = chromosome.genes.iter().find(|g| &g.session_id == id) {
            *per_day.entry(gene.time_slot.day).or_insert(0) += 1;
        }
    }
    let Some((busiest, lightest)) = busiest_and_lightest_day(&per_day) else {
        return;
    };
    if busiest == lightest {
        return;
    }
    if let Some(gene) = chromosome
        .genes
        .iter_mut()
        .find(|g| &g.lecturer_id == lecturer && g.time_slot.day == busiest)
    {
        gene.time_slot.day = lightest;
    }
}

/// Moves sessions from the most-used room into whichever other room is
/// currently least used, if that room still fits the session's domain.
fn consolidate_room_mutation(chromosome: &mut Chromosome, ctx: &OperatorContext) {
    let by_room = chromosome.genes_by_room();
    let Some((busiest_room, _)) = by_room.iter().max_by_key(|(_, g)| g.len()) else {
        return;
    };
    let busiest_room = busiest_room.clone();
    let target_session = chromosome
        .genes
        .iter()
        .find(|g| g.room_number == busiest_room)
        .map(|g| g.session_id.clone());
    let Some(target_session) = target_session else {
        return;
    };
    let Some(variable) = ctx.variables.get(&target_session) else {
        return;
    };
    let alternative = variable.rooms.iter().find(|r| r.0 != busiest_room);
    if let Some(room) = alternative {
        if let Some(gene) = chromosome.genes.iter_mut().find(|g| g.session_id == target_session) {
            gene.room_number = room.0.clone();
        }
    }
}

fn redistribute_days_mutation(chromosome: &mut Chromosome) {
    let counts = day_session_counts(chromosome);
    let Some((busiest, lightest)) = busiest_and_lightest_day(&counts) else {
        return;
    };
    if busiest == lightest {
        return;
    }
    if counts.get(&busiest).copied().unwrap_or(0) <= counts.get(&lightest).copied().unwrap_or(0) + 2 {
        return;
    }
    if let Some(gene) = chromosome.genes.iter_mut().find(|g| g.time_slot.day == busiest) {
        gene.time_slot.day = lightest;
    }
}

fn guided_mutation(chromosome: &mut Chromosome, ctx: &OperatorContext, fitness: &FitnessScore) {
    let components = [
        (fitness.student_idle_time, 0),
        (fitness.lecturer_workload_balance, 1),
        (fitness.room_utilization, 2),
        (fitness.weekday_distribution, 3),
    ];
    let weakest = components
        .iter()
        .min_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(_, idx)| *idx)
        .unwrap_or(0);

    match weakest {
        0 => compact_schedule_mutation(chromosome),
        1 => balance_lecturer_load_mutation(chromosome),
        2 => consolidate_room_mutation(chromosome, ctx),
        _ => redistribute_days_mutation(chromosome),
    }
}

/// Mutates a clone of `chromosome`. With a known fitness breakdown, 70% of
/// calls target the single weakest component; the rest (and every call
/// with no fitness yet) apply untargeted random mutation for diversity.
/// Rejects and returns the unmutated clone if the result breaks a hard
/// constraint.
pub fn mutate(
    chromosome: &Chromosome,
    ctx: &OperatorContext,
    fitness: Option<&FitnessScore>,
    rng: &mut PlannerRng,
) -> Chromosome {
    let mut candidate = chromosome.clone();
    candidate.id = ChromosomeId(format!("{}_m", chromosome.id.0));

    match fitness {
        Some(f) if rng.gen_bool(0.7) => guided_mutation(&mut candidate, ctx, f),
        _ => random_mutation(&mut candidate, ctx, rng),
    }

    if is_feasible(&candidate, ctx) {
        candidate
    } else {
        chromosome.clone()
    }
}

fn uniform_crossover(parent1: &Chromosome, parent2: &Chromosome, rng: &mut PlannerRng) -> (Chromosome, Chromosome) {
    let mut child1 = parent1.clone();
    let mut child2 = parent2.clone();
    let len = child1.genes.len().min(child2.genes.len());
    for i in 0..len {
        if rng.gen_bool(0.5) {
            std::mem::swap(&mut child1.genes[i], &mut child2.genes[i]);
        }
    }
    (child1, child2)
}

fn day_based_crossover(parent1: &Chromosome, parent2: &Chromosome, rng: &mut PlannerRng) -> (Chromosome, Chromosome) {
    let p1_by_day = parent1.genes_by_day();
    let p2_by_day = parent2.genes_by_day();
    let mut c1_genes = Vec::new();
    let mut c2_genes = Vec::new();

    for day in WEEKDAYS {
        let (from1, from2) = if rng.gen_bool(0.5) { (&p1_by_day, &p2_by_day) } else { (&p2_by_day, &p1_by_day) };
        if let Some(genes) = from1.get(&day) {
            c1_genes.extend(genes.iter().map(|g| (*g).clone()));
        }
        if let Some(genes) = from2.get(&day) {
            c2_genes.extend(genes.iter().map(|g| (*g).clone()));
        }
    }

    let mut child1 = parent1.clone();
    child1.genes = c1_genes;
    let mut child2 = parent2.clone();
    child2.genes = c2_genes;
    (child1, child2)
}

fn lecturer_based_crossover(parent1: &Chromosome, parent2: &Chromosome, rng: &mut PlannerRng) -> (Chromosome, Chromosome) {
    let p1_by_lecturer = parent1.genes_by_lecturer();
    let p2_by_lecturer = parent2.genes_by_lecturer();
    let mut all_lecturers: HashSet<LecturerId> = p1_by_lecturer.keys().cloned().collect();
    all_lecturers.extend(p2_by_lecturer.keys().cloned());

    let mut c1_genes = Vec::new();
    let mut c2_genes = Vec::new();

    for lecturer in all_lecturers {
        let (from1, from2) = if rng.gen_bool(0.5) {
            (&p1_by_lecturer, &p2_by_lecturer)
        } else {
            (&p2_by_lecturer, &p1_by_lecturer)
        };
        if let Some(genes) = from1.get(&lecturer) {
            c1_genes.extend(genes.iter().map(|g| (*g).clone()));
        }
        if let Some(genes) = from2.get(&lecturer) {
            c2_genes.extend(genes.iter().map(|g| (*g).clone()));
        }
    }

    let mut child1 = parent1.clone();
    child1.genes = c1_genes;
    let mut child2 = parent2.clone();
    child2.genes = c2_genes;
    (child1, child2)
}

/// Reduces `child`'s genes to exactly one per `session_id` from
/// `reference`'s variable set, preferring whichever copy `child` already
/// carries for that session and falling back to `reference`'s own gene for
/// any session `child` dropped. `day_based_crossover`/`lecturer_based_crossover`
/// bucket genes by day or lecturer rather than by variable, so a session
/// that moved between parents can otherwise end up duplicated (picked up
/// under two different buckets) or missing (picked up under neither) —
/// this restores the "every required session appears as exactly one
/// variable" invariant before feasibility is checked.
fn reconcile_offspring(child: &mut Chromosome, reference: &Chromosome) {
    let mut by_session: HashMap<VariableId, Gene> = HashMap::new();
    for gene in child.genes.drain(..) {
        by_session.entry(gene.session_id.clone()).or_insert(gene);
    }
    child.genes = reference
        .genes
        .iter()
        .map(|g| by_session.remove(&g.session_id).unwrap_or_else(|| g.clone()))
        .collect();
}

/// True iff `chromosome` carries exactly the same multiset of `session_id`s
/// as `reference` — the post-`reconcile_offspring` sanity check the
/// crossover wrapper falls back to a parent clone on.
fn session_multiset_matches(chromosome: &Chromosome, reference: &Chromosome) -> bool {
    let mut a: Vec<&VariableId> = chromosome.genes.iter().map(|g| &g.session_id).collect();
    let mut b: Vec<&VariableId> = reference.genes.iter().map(|g| &g.session_id).collect();
    a.sort();
    b.sort();
    a == b
}

/// Produces two offspring from `parent1`/`parent2`. With probability
/// `1 - crossover_rate` no recombination happens and clones of the parents
/// are returned. Offspring are reconciled to one gene per session against
/// their respective parent, then discarded in favor of the (feasible, by
/// construction) parent clone if reconciliation still left a session
/// mismatch or the result breaks a hard constraint.
pub fn crossover(
    parent1: &Chromosome,
    parent2: &Chromosome,
    strategy: CrossoverStrategy,
    ctx: &OperatorContext,
    rng: &mut PlannerRng,
) -> (Chromosome, Chromosome) {
    if !rng.gen_bool(ctx.crossover_rate) {
        return (parent1.clone(), parent2.clone());
    }

    let (mut child1, mut child2) = match strategy {
        CrossoverStrategy::Uniform => uniform_crossover(parent1, parent2, rng),
        CrossoverStrategy::DayBased => day_based_crossover(parent1, parent2, rng),
        CrossoverStrategy::LecturerBased => lecturer_based_crossover(parent1, parent2, rng),
    };

    reconcile_offspring(&mut child1, parent1);
    reconcile_offspring(&mut child2, parent2);

    let child1 = if session_multiset_matches(&child1, parent1) && is_feasible(&child1, ctx) {
        child1
    } else {
        parent1.clone()
    };
    let child2 = if session_multiset_matches(&child2, parent2) && is_feasible(&child2, ctx) {
        child2
    } else {
        parent2.clone()
    };
    (child1, child2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        Assignment, ChromosomeId as CId, CourseId, Lecturer, LecturerRole, ProgramId, RoomId, RoomType,
        TimeSlot,
    };

    fn variable(id: &str) -> SchedulingVariable {
        SchedulingVariable {
            id: VariableId(id.to_string()),
            course_id: CourseId("C1".to_string()),
            program_id: ProgramId("P1".to_string()),
            session_number: 1,
            term: 1,
            time_slots: vec![
                TimeSlot { day: Weekday::Mon, period: 0, start_minute: 540, end_minute: 660, is_afternoon: false },
                TimeSlot { day: Weekday::Tue, period: 1, start_minute: 660, end_minute: 780, is_afternoon: false },
            ],
            lecturers: vec![LecturerId("L1".to_string()), LecturerId("L2".to_string())],
            rooms: vec![RoomId("R1".to_string()), RoomId("R2".to_string())],
            lecturer_time_slots: HashMap::new(),
            assignment: None,
        }
    }

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

    fn base_chromosome() -> Chromosome {
        let assignments = vec![Assignment {
            variable_id: VariableId("v1".to_string()),
            course_id: CourseId("C1".to_string()),
            program_id: ProgramId("P1".to_string()),
            lecturer_id: LecturerId("L1".to_string()),
            room_number: "R1".to_string(),
            time_slot: TimeSlot { day: Weekday::Mon, period: 0, start_minute: 540, end_minute: 660, is_afternoon: false },
            term: 1,
            session_number: 1,
        }];
        Chromosome::from_csp_solution(&assignments, CId("CSP_BASE".to_string()))
    }

    fn two_session_chromosome() -> Chromosome {
        let assignments = vec![
            Assignment {
                variable_id: VariableId("v1".to_string()),
                course_id: CourseId("C1".to_string()),
                program_id: ProgramId("P1".to_string()),
                lecturer_id: LecturerId("L1".to_string()),
                room_number: "R1".to_string(),
                time_slot: TimeSlot { day: Weekday::Mon, period: 0, start_minute: 540, end_minute: 660, is_afternoon: false },
                term: 1,
                session_number: 1,
            },
            Assignment {
                variable_id: VariableId("v2".to_string()),
                course_id: CourseId("C1".to_string()),
                program_id: ProgramId("P1".to_string()),
                lecturer_id: LecturerId("L2".to_string()),
                room_number: "R2".to_string(),
                time_slot: TimeSlot { day: Weekday::Tue, period: 1, start_minute: 660, end_minute: 780, is_afternoon: false },
                term: 1,
                session_number: 2,
            },
        ];
        Chromosome::from_csp_solution(&assignments, CId("CSP_BASE".to_string()))
    }

    #[test]
    fn mutation_result_is_always_feasible() {
        let chromosome = base_chromosome();
        let mut variables = HashMap::new();
        variables.insert(VariableId("v1".to_string()), variable("v1"));
        let l1 = lecturer("L1");
        let l2 = lecturer("L2");
        let lecturers_by_id: HashMap<LecturerId, &Lecturer> =
            [(l1.id.clone(), &l1), (l2.id.clone(), &l2)].into_iter().collect();
        let c1 = course();
        let courses_by_id: HashMap<CourseId, &Course> = [(c1.id.clone(), &c1)].into_iter().collect();
        let ctx = OperatorContext {
            variables: &variables,
            lecturers_by_id: &lecturers_by_id,
            courses_by_id: &courses_by_id,
            mutation_rate: 1.0,
            crossover_rate: 0.8,
        };
        let mut rng = PlannerRng::from_seed(7);
        let mutated = mutate(&chromosome, &ctx, None, &mut rng);
        assert!(is_feasible(&mutated, &ctx));
    }

    #[test]
    fn part_time_lecturer_mutation_never_leaves_availability() {
        let mut chromosome = base_chromosome();
        let mon_slot = TimeSlot { day: Weekday::Mon, period: 0, start_minute: 540, end_minute: 660, is_afternoon: false };
        let mut v1 = variable("v1");
        v1.lecturer_time_slots.insert(LecturerId("L1".to_string()), vec![mon_slot]);
        let mut variables = HashMap::new();
        variables.insert(VariableId("v1".to_string()), v1);
        let l1 = lecturer("L1");
        let l2 = lecturer("L2");
        let lecturers_by_id: HashMap<LecturerId, &Lecturer> =
            [(l1.id.clone(), &l1), (l2.id.clone(), &l2)].into_iter().collect();
        let c1 = course();
        let courses_by_id: HashMap<CourseId, &Course> = [(c1.id.clone(), &c1)].into_iter().collect();
        let ctx = OperatorContext {
            variables: &variables,
            lecturers_by_id: &lecturers_by_id,
            courses_by_id: &courses_by_id,
            mutation_rate: 1.0,
            crossover_rate: 0.8,
        };
        let mut rng = PlannerRng::from_seed(11);
        for _ in 0..50 {
            chromosome = mutate(&chromosome, &ctx, None, &mut rng);
            assert_eq!(chromosome.genes[0].time_slot.key(), mon_slot.key());
        }
    }

    #[test]
    fn zero_crossover_rate_returns_parent_clones() {
        let p1 = base_chromosome();
        let mut p2 = base_chromosome();
        p2.genes[0].room_number = "R2".to_string();
        let variables = HashMap::new();
        let lecturers_by_id = HashMap::new();
        let courses_by_id = HashMap::new();
        let ctx = OperatorContext {
            variables: &variables,
            lecturers_by_id: &lecturers_by_id,
            courses_by_id: &courses_by_id,
            mutation_rate: 0.15,
            crossover_rate: 0.0,
        };
        let mut rng = PlannerRng::from_seed(3);
        let (c1, c2) = crossover(&p1, &p2, CrossoverStrategy::Uniform, &ctx, &mut rng);
        assert_eq!(c1.genes[0].room_number, "R1");
        assert_eq!(c2.genes[0].room_number, "R2");
    }

    #[test]
    fn day_based_crossover_never_duplicates_or_drops_sessions() {
        let p1 = two_session_chromosome();
        let mut p2 = two_session_chromosome();
        // swap the two sessions' days between parents, the scenario that
        // used to produce a duplicate or dropped session.
        p2.genes[0].time_slot.day = Weekday::Wed;
        p2.genes[1].time_slot.day = Weekday::Mon;
        let variables = HashMap::new();
        let lecturers_by_id = HashMap::new();
        let courses_by_id = HashMap::new();
        let ctx = OperatorContext {
            variables: &variables,
            lecturers_by_id: &lecturers_by_id,
            courses_by_id: &courses_by_id,
            mutation_rate: 0.15,
            crossover_rate: 1.0,
        };
        let mut rng = PlannerRng::from_seed(5);
        for _ in 0..20 {
            let (c1, c2) = crossover(&p1, &p2, CrossoverStrategy::DayBased, &ctx, &mut rng);
            assert!(session_multiset_matches(&c1, &p1));
            assert!(session_multiset_matches(&c2, &p2));
        }
    }
}
