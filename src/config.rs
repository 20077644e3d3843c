use crate::error::PlannerError;
use crate::types::{default_periods, PeriodDef};
use serde::{Deserialize, Serialize};

/// The four fitness components' weights. Must sum to 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FitnessWeights {
    #[serde(default = "default_student_idle_weight")]
    pub student_idle_time: f64,
    #[serde(default = "default_workload_weight")]
    pub lecturer_workload_balance: f64,
    #[serde(default = "default_room_weight")]
    pub room_utilization: f64,
    #[serde(default = "default_weekday_weight")]
    pub weekday_distribution: f64,
}

fn default_student_idle_weight() -> f64 {
    0.35
}
fn default_workload_weight() -> f64 {
    0.30
}
fn default_room_weight() -> f64 {
    0.20
}
fn default_weekday_weight() -> f64 {
    0.15
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            student_idle_time: default_student_idle_weight(),
            lecturer_workload_balance: default_workload_weight(),
            room_utilization: default_room_weight(),
            weekday_distribution: default_weekday_weight(),
        }
    }
}

impl FitnessWeights {
    pub fn sum(&self) -> f64 {
        self.student_idle_time
            + self.lecturer_workload_balance
            + self.room_utilization
            + self.weekday_distribution
    }

    pub fn validate(&self) -> Result<(), PlannerError> {
        let sum = self.sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(PlannerError::FitnessWeightsInvalid { sum });
        }
        Ok(())
    }
}

/// Partial CSP solutions: commit whatever was built (`Lenient`, reporting
/// the gap via warnings) or refuse to commit at all (`Strict`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitPolicy {
    Lenient,
    Strict,
}

impl Default for CommitPolicy {
    fn default() -> Self {
        CommitPolicy::Lenient
    }
}

/// The five GGA tunables, the fitness weights, the commit policy, and the
/// fixed-but-loadable time grid. Loaded once at run start; changes during
/// a run are not observed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default = "default_population_size")]
    pub gga_population_size: usize,
    #[serde(default = "default_max_generations")]
    pub gga_max_generations: u32,
    #[serde(default = "default_mutation_rate")]
    pub gga_mutation_rate: f64,
    #[serde(default = "default_crossover_rate")]
    pub gga_crossover_rate: f64,
    #[serde(default = "default_target_fitness")]
    pub gga_target_fitness: f64,
    #[serde(default = "default_stall_limit")]
    pub gga_stall_limit: u32,
    #[serde(default)]
    pub fitness_weights: FitnessWeights,
    #[serde(default)]
    pub commit_policy: CommitPolicy,
    #[serde(default = "default_csp_budget_seconds")]
    pub csp_budget_seconds: u64,
    #[serde(default = "default_gga_budget_seconds")]
    pub gga_budget_seconds: u64,
    #[serde(skip)]
    periods: Vec<PeriodDef>,
}

fn default_population_size() -> usize {
    200
}
fn default_max_generations() -> u32 {
    200
}
fn default_mutation_rate() -> f64 {
    0.15
}
fn default_crossover_rate() -> f64 {
    0.80
}
fn default_target_fitness() -> f64 {
    0.90
}
fn default_stall_limit() -> u32 {
    100
}
fn default_csp_budget_seconds() -> u64 {
    300
}
fn default_gga_budget_seconds() -> u64 {
    120
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            gga_population_size: default_population_size(),
            gga_max_generations: default_max_generations(),
            gga_mutation_rate: default_mutation_rate(),
            gga_crossover_rate: default_crossover_rate(),
            gga_target_fitness: default_target_fitness(),
            gga_stall_limit: default_stall_limit(),
            fitness_weights: FitnessWeights::default(),
            commit_policy: CommitPolicy::default(),
            csp_budget_seconds: default_csp_budget_seconds(),
            gga_budget_seconds: default_gga_budget_seconds(),
            periods: default_periods(),
        }
    }
}

impl PlannerConfig {
    pub fn periods(&self) -> &[PeriodDef] {
        &self.periods
    }

    pub fn with_periods(mut self, periods: Vec<PeriodDef>) -> Self {
        self.periods = periods;
        self
    }

    pub fn validate(&self) -> Result<(), PlannerError> {
        self.fitness_weights.validate()?;
        if self.periods.is_empty() {
            return Err(PlannerError::EmptyTimeSlotSet);
        }
        Ok(())
    }

    /// Loads config from a TOML file, falling back to `Default` when the
    /// file is absent, matching the teacher's `load_config_or_default`.
    pub fn load_or_default(path: &std::path::Path) -> crate::error::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&text)?;
        if config.periods.is_empty() {
            config.periods = default_periods();
        }
        Ok(config)
    }
}
