use std::collections::HashMap;

/// A target term1:term2 unit split. Advisory — it informs the program
/// alternation tiebreak and workload-balance validation, but the actual
/// per-course term assignment always comes from canonical alignment or
/// `preferred_term` (see `split_semester`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermSplitRatio {
    pub term1_units: u32,
    pub term2_units: u32,
}

impl TermSplitRatio {
    pub fn new(term1: u32, term2: u32) -> Self {
        Self {
            term1_units: term1,
            term2_units: term2,
        }
    }

    pub fn is_balanced(&self) -> bool {
        self.term1_units == self.term2_units
    }

    pub fn flipped(&self) -> Self {
        Self::new(self.term2_units, self.term1_units)
    }
}

/// Fixed default ratio per semester label.
pub fn default_split_ratios() -> HashMap<&'static str, TermSplitRatio> {
    [
        ("S1", TermSplitRatio::new(3, 2)),
        ("S2", TermSplitRatio::new(2, 3)),
        ("S3", TermSplitRatio::new(3, 2)),
        ("S4", TermSplitRatio::new(3, 2)),
        ("S5", TermSplitRatio::new(2, 3)),
        ("S6", TermSplitRatio::new(2, 2)),
    ]
    .into_iter()
    .collect()
}

/// Ratio lookup by effective unit count, used when a semester's unit count
/// differs from what the fixed table assumed.
pub fn unit_count_ratios() -> HashMap<u32, TermSplitRatio> {
    [
        (4, TermSplitRatio::new(2, 2)),
        (5, TermSplitRatio::new(3, 2)),
        (6, TermSplitRatio::new(3, 3)),
        (7, TermSplitRatio::new(4, 3)),
        (8, TermSplitRatio::new(4, 4)),
    ]
    .into_iter()
    .collect()
}

/// Near-balanced split for unit counts with no table entry, clamped to
/// at least one unit per term.
pub fn dynamic_ratio(unit_count: u32) -> TermSplitRatio {
    let term1 = ((unit_count + 1) / 2).max(1);
    let term2 = (unit_count.saturating_sub(term1)).max(1);
    TermSplitRatio::new(term1, term2)
}

/// Resolves the ratio to use for a semester with `effective_unit_count`
/// units, per the semester-default-vs-count-table-vs-dynamic priority.
pub fn resolve_ratio(semester: &str, effective_unit_count: u32) -> TermSplitRatio {
    let defaults = default_split_ratios();
    if let Some(ratio) = defaults.get(semester) {
        let expected_count = ratio.term1_units + ratio.term2_units;
        if expected_count == effective_unit_count {
            return *ratio;
        }
    }
    let by_count = unit_count_ratios();
    if let Some(ratio) = by_count.get(&effective_unit_count) {
        return *ratio;
    }
    dynamic_ratio(effective_unit_count)
}

/// Deterministically flips an asymmetric 5-unit ratio between programs so
/// cohorts competing for the same term don't also compete for the same
/// resources. Only 5-unit asymmetric ratios are ever flipped; balanced
/// ratios (3:3, 4:4, 2:2) pass through unchanged.
pub fn program_alternating_ratio(program_code: &str, base: TermSplitRatio) -> TermSplitRatio {
    if base.is_balanced() || base.term1_units + base.term2_units != 5 {
        return base;
    }

    let normalized = program_code.to_ascii_uppercase();
    if normalized.contains("BSCAIT") || normalized.contains("BIT") {
        base
    } else if normalized.contains("BCS") {
        base.flipped()
    } else {
        // Hash-based tiebreak for unrecognized program codes, deterministic
        // given the same normalized code.
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        use std::hash::{Hash, Hasher};
        normalized.hash(&mut hasher);
        if hasher.finish() % 2 == 0 {
            base
        } else {
            base.flipped()
        }
    }
}
