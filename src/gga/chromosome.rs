use crate::types::{
    Assignment, ChromosomeId, CourseId, LecturerId, ProgramId, TimeSlot, VariableId, Weekday,
};
use std::collections::HashMap;

/// One session assignment inside a chromosome. Carries the same payload as
/// [`Assignment`] plus two pieces of GGA-only metadata used by the guided
/// mutation operator to pick promising targets.
#[derive(Debug, Clone)]
pub struct Gene {
    pub session_id: VariableId,
    pub course_id: CourseId,
    pub program_id: ProgramId,
    pub lecturer_id: LecturerId,
    pub room_number: String,
    pub time_slot: TimeSlot,
    pub term: u8,
    pub session_number: u32,
    /// How many domain alternatives this gene had at CSP build time,
    /// normalized to `[0,1]`; low flexibility genes are deprioritized by
    /// the guided mutation operator since they are more likely to break.
    pub flexibility: f64,
    pub conflict_score: f64,
}

impl Gene {
    pub fn from_assignment(assignment: &Assignment) -> Self {
        Self {
            session_id: assignment.variable_id.clone(),
            course_id: assignment.course_id.clone(),
            program_id: assignment.program_id.clone(),
            lecturer_id: assignment.lecturer_id.clone(),
            room_number: assignment.room_number.clone(),
            time_slot: assignment.time_slot,
            term: assignment.term,
            session_number: assignment.session_number,
            flexibility: 0.5,
            conflict_score: 0.0,
        }
    }

    pub fn to_assignment(&self) -> Assignment {
        Assignment {
            variable_id: self.session_id.clone(),
            course_id: self.course_id.clone(),
            program_id: self.program_id.clone(),
            lecturer_id: self.lecturer_id.clone(),
            room_number: self.room_number.clone(),
            time_slot: self.time_slot,
            term: self.term,
            session_number: self.session_number,
        }
    }
}

/// Fitness breakdown. Each component lives in `[0,1]`, 1 being best;
/// `overall_fitness` is the weighted sum per [`crate::config::FitnessWeights`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FitnessScore {
    pub student_idle_time: f64,
    pub lecturer_workload_balance: f64,
    pub room_utilization: f64,
    pub weekday_distribution: f64,
    pub overall_fitness: f64,
}

/// A complete candidate timetable: one gene per scheduling variable.
#[derive(Debug, Clone)]
pub struct Chromosome {
    pub id: ChromosomeId,
    pub genes: Vec<Gene>,
    pub fitness: Option<FitnessScore>,
    pub generation: u32,
    pub age: u32,
}

impl Chromosome {
    pub fn from_csp_solution(assignments: &[Assignment], id: ChromosomeId) -> Self {
        Self {
            id,
            genes: assignments.iter().map(Gene::from_assignment).collect(),
            fitness: None,
            generation: 0,
            age: 0,
        }
    }

    pub fn genes_by_program(&self) -> HashMap<ProgramId, Vec<&Gene>> {
        let mut groups: HashMap<ProgramId, Vec<&Gene>> = HashMap::new();
        for gene in &self.genes {
            groups.entry(gene.program_id.clone()).or_default().push(gene);
        }
        groups
    }

    pub fn genes_by_lecturer(&self) -> HashMap<LecturerId, Vec<&Gene>> {
        let mut groups: HashMap<LecturerId, Vec<&Gene>> = HashMap::new();
        for gene in &self.genes {
            groups.entry(gene.lecturer_id.clone()).or_default().push(gene);
        }
        groups
    }

    pub fn genes_by_room(&self) -> HashMap<String, Vec<&Gene>> {
        let mut groups: HashMap<String, Vec<&Gene>> = HashMap::new();
        for gene in &self.genes {
            groups.entry(gene.room_number.clone()).or_default().push(gene);
        }
        groups
    }

    pub fn genes_by_day(&self) -> HashMap<Weekday, Vec<&Gene>> {
        let mut groups: HashMap<Weekday, Vec<&Gene>> = HashMap::new();
        for gene in &self.genes {
            groups.entry(gene.time_slot.day).or_default().push(gene);
        }
        groups
    }

    pub fn to_assignments(&self) -> Vec<Assignment> {
        self.genes.iter().map(Gene::to_assignment).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CourseId, LecturerId, ProgramId, VariableId, Weekday};

    fn assignment(session: &str, day: Weekday) -> Assignment {
        Assignment {
            variable_id: VariableId(session.to_string()),
            course_id: CourseId("C1".to_string()),
            program_id: ProgramId("P1".to_string()),
            lecturer_id: LecturerId("L1".to_string()),
            room_number: "R1".to_string(),
            time_slot: TimeSlot {
                day,
                period: 0,
                start_minute: 540,
                end_minute: 660,
                is_afternoon: false,
            },
            term: 1,
            session_number: 1,
        }
    }

    #[test]
    fn from_csp_solution_preserves_gene_count() {
        let assignments = vec![assignment("v1", Weekday::Mon), assignment("v2", Weekday::Tue)];
        let chromosome = Chromosome::from_csp_solution(&assignments, ChromosomeId("CSP_BASE".to_string()));
        assert_eq!(chromosome.genes.len(), 2);
        assert_eq!(chromosome.generation, 0);
    }

    #[test]
    fn groups_by_day_separates_genes() {
        let assignments = vec![assignment("v1", Weekday::Mon), assignment("v2", Weekday::Tue)];
        let chromosome = Chromosome::from_csp_solution(&assignments, ChromosomeId("CSP_BASE".to_string()));
        let by_day = chromosome.genes_by_day();
        assert_eq!(by_day.len(), 2);
    }
}
