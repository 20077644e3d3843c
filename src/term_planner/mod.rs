//! Term planner: splits each program's semester courses into Term 1 /
//! Term 2, honoring course grouping, mandatory `preferred_term`, and
//! cross-program canonical alignment.

mod alignment;
mod ratio;
mod split;

pub use alignment::{build_canonical_term_alignment, AlignmentDecision, AlignmentInput};
pub use ratio::{
    default_split_ratios, dynamic_ratio, program_alternating_ratio, resolve_ratio,
    unit_count_ratios, TermSplitRatio,
};
pub use split::{split_semester, validate_round_trip, TermPlan};
