use crate::types::{CourseId, ProgramId, VariableId};
use thiserror::Error;

/// Why a scheduling variable ended up with an empty domain after pruning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainFailureCause {
    NoQualifiedLecturer,
    NoSufficientCapacityRoom,
    NoCompatibleSlotAfterAvailability,
}

impl std::fmt::Display for DomainFailureCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DomainFailureCause::NoQualifiedLecturer => "no qualified lecturer",
            DomainFailureCause::NoSufficientCapacityRoom => "no sufficient-capacity room",
            DomainFailureCause::NoCompatibleSlotAfterAvailability => {
                "no compatible slot after availability filtering"
            }
        };
        write!(f, "{s}")
    }
}

/// A resource key as it appears in the booking ledger, used to report
/// concurrent-modification failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingKeyDisplay(pub String);

impl std::fmt::Display for BookingKeyDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Domain-specific errors for the planning core.
#[derive(Error, Debug)]
pub enum PlannerError {
    // Configuration errors: fatal, caught before CSP starts.
    #[error("courses missing mandatory preferred_term and no canonical pin: {offenders:?}")]
    MissingPreferredTerm { offenders: Vec<CourseId> },

    #[error("course '{course}' is missing mandatory preferred_room_type")]
    MissingPreferredRoomType { course: CourseId },

    #[error("time slot table is empty")]
    EmptyTimeSlotSet,

    #[error("fitness weights must sum to 1.0, got {sum}")]
    FitnessWeightsInvalid { sum: f64 },

    // Data integrity errors: collected, reported, excluded from the plan.
    #[error("program '{cohort}' references unknown course '{course}'")]
    UnknownCourseRef { cohort: ProgramId, course: CourseId },

    #[error("course '{course}' has no qualified, available lecturer")]
    UnqualifiedOrMissingLecturer { course: CourseId },

    #[error("room has non-positive capacity")]
    InvalidRoomCapacity,

    // Feasibility errors: fatal for this run.
    #[error("variable '{variable}' has an empty domain: {cause}")]
    EmptyDomain {
        variable: VariableId,
        cause: DomainFailureCause,
    },

    // Search exhaustion: carried as a warning, not normally returned as Err.
    #[error("CSP search exhausted its budget after {elapsed_ms}ms")]
    SearchExhausted { elapsed_ms: u64 },

    // Concurrent modification: fatal for this run, caller should retry.
    #[error("concurrent modification: booking already exists for {key}")]
    ConcurrentModification { key: BookingKeyDisplay },

    // Internal invariant violation: treated as a bug.
    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),

    #[error("refusing to commit a partial CSP solution under strict commit policy")]
    PartialSolutionRejected,

    #[error("no feasible schedule found")]
    Infeasible,
}

/// Use anyhow::Result at application boundaries.
pub type Result<T> = anyhow::Result<T>;
