//! Canonical course resolver: maps a concrete course code to a shared
//! canonical identifier and answers lecturer-qualification questions.

use crate::types::CanonicalCourseGroup;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualificationMode {
    /// Exact canonical id / display name / course code / equivalent-code
    /// match only. Default for new deployments; used by invariant checks
    /// and validation reports.
    Strict,
    /// Adds the fuzzy token-overlap fallback. Used by CSP domain
    /// construction to tolerate messy human-entered specialization data.
    Permissive,
}

fn normalize(s: &str) -> String {
    s.trim()
        .to_ascii_uppercase()
        .replace(['_', ' '], "-")
}

fn tokens(normalized: &str) -> Vec<&str> {
    normalized.split('-').filter(|t| !t.is_empty()).collect()
}

/// Built once at run start from the persisted `CanonicalCourseGroup` set,
/// plus a fallback table embedded in code for cold starts.
pub struct CanonicalResolver {
    code_to_canonical: HashMap<String, String>,
    canonical_to_codes: HashMap<String, Vec<String>>,
    canonical_display_names: HashMap<String, String>,
    /// Case/separator-insensitive variant name -> canonical id.
    variant_to_canonical: HashMap<String, String>,
}

impl CanonicalResolver {
    pub fn new(groups: &[CanonicalCourseGroup]) -> Self {
        let mut code_to_canonical = HashMap::new();
        let mut canonical_to_codes = HashMap::new();
        let mut canonical_display_names = HashMap::new();
        let mut variant_to_canonical = HashMap::new();

        for group in groups {
            let cid = group.canonical_id.0.clone();
            canonical_display_names.insert(cid.clone(), group.display_name.clone());
            variant_to_canonical.insert(normalize(&cid), cid.clone());
            variant_to_canonical.insert(normalize(&group.display_name), cid.clone());

            for code in &group.equivalent_codes {
                code_to_canonical.insert(code.clone(), cid.clone());
                variant_to_canonical.insert(normalize(code), cid.clone());
            }
            canonical_to_codes.insert(cid, group.equivalent_codes.clone());
        }

        Self {
            code_to_canonical,
            canonical_to_codes,
            canonical_display_names,
            variant_to_canonical,
        }
    }

    /// An empty resolver: every lookup behaves as if the course is
    /// unknown to the canonical registry. Used as the embedded fallback
    /// when the persisted group collection can't be reached.
    pub fn empty() -> Self {
        Self {
            code_to_canonical: HashMap::new(),
            canonical_to_codes: HashMap::new(),
            canonical_display_names: HashMap::new(),
            variant_to_canonical: HashMap::new(),
        }
    }

    pub fn canonical_of(&self, code: &str) -> Option<&str> {
        self.code_to_canonical.get(code).map(|s| s.as_str())
    }

    /// Returns the equivalence class for `code`, or `{code}` if unknown.
    pub fn equivalents(&self, code: &str) -> Vec<String> {
        match self.canonical_of(code) {
            Some(cid) => self
                .canonical_to_codes
                .get(cid)
                .cloned()
                .unwrap_or_else(|| vec![code.to_string()]),
            None => vec![code.to_string()],
        }
    }

    /// True iff any specialization in `specializations` qualifies the
    /// lecturer to teach `course_code`.
    pub fn qualified(&self, course_code: &str, specializations: &[String], mode: QualificationMode) -> bool {
        if specializations.is_empty() {
            return false;
        }
        specializations
            .iter()
            .any(|spec| self.is_match(course_code, spec, mode))
    }

    fn is_match(&self, course_code: &str, spec: &str, mode: QualificationMode) -> bool {
        if spec.eq_ignore_ascii_case(course_code) {
            return true;
        }

        let canonical_id = self.canonical_of(course_code).map(|s| s.to_string());

        if let Some(cid) = &canonical_id {
            if spec.eq_ignore_ascii_case(cid) {
                return true;
            }
            if let Some(name) = self.canonical_display_names.get(cid) {
                if spec.eq_ignore_ascii_case(name) {
                    return true;
                }
            }
            if let Some(codes) = self.canonical_to_codes.get(cid) {
                if codes.iter().any(|c| c.eq_ignore_ascii_case(spec)) {
                    return true;
                }
            }
        }

        // spec itself might already be a canonical id referencing course_code
        if let Some(resolved) = self.variant_to_canonical.get(&normalize(spec)) {
            if Some(resolved) == canonical_id.as_ref() {
                return true;
            }
            if resolved.eq_ignore_ascii_case(course_code) {
                return true;
            }
        }

        if mode == QualificationMode::Strict {
            return false;
        }

        // Fuzzy fallback: normalized canonical id and normalized spec share
        // >= 2 hyphen-delimited tokens, or the canonical id is a single-word
        // substring of the spec.
        if let Some(cid) = &canonical_id {
            let cid_norm = normalize(cid);
            let spec_norm = normalize(spec);
            if cid_norm.contains(&spec_norm) || spec_norm.contains(&cid_norm) {
                let cid_tokens = tokens(&cid_norm);
                let spec_tokens: Vec<&str> = tokens(&spec_norm);
                let shared = cid_tokens.iter().filter(|t| spec_tokens.contains(t)).count();
                if shared >= 2 || cid_tokens.len() == 1 {
                    return true;
                }
            }
        }

        false
    }
}

/// A small set of cross-program equivalences shipped in code so that a
/// cold start (before the canonical group collection loads) still has
/// reasonable qualification behavior. Deployments are expected to
/// override this via `load_canonical_groups`.
pub fn fallback_canonical_groups() -> Vec<CanonicalCourseGroup> {
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CanonicalId;

    fn sample_groups() -> Vec<CanonicalCourseGroup> {
        vec![CanonicalCourseGroup {
            canonical_id: CanonicalId("PROG_C".to_string()),
            display_name: "Programming Concepts".to_string(),
            equivalent_codes: vec![
                "BIT1103".to_string(),
                "BCS1103".to_string(),
                "BIT1107".to_string(),
            ],
        }]
    }

    #[test]
    fn exact_code_match() {
        let r = CanonicalResolver::new(&sample_groups());
        assert!(r.qualified("BIT1103", &["BIT1103".to_string()], QualificationMode::Strict));
    }

    #[test]
    fn canonical_id_match() {
        let r = CanonicalResolver::new(&sample_groups());
        assert!(r.qualified("BCS1103", &["PROG_C".to_string()], QualificationMode::Strict));
    }

    #[test]
    fn equivalent_code_match() {
        let r = CanonicalResolver::new(&sample_groups());
        assert!(r.qualified("BIT1103", &["BCS1103".to_string()], QualificationMode::Strict));
    }

    #[test]
    fn strict_mode_rejects_fuzzy() {
        let r = CanonicalResolver::new(&sample_groups());
        assert!(!r.qualified("BIT1103", &["Programming-Concepts-Lab".to_string()], QualificationMode::Strict));
    }

    #[test]
    fn permissive_mode_allows_fuzzy_token_overlap() {
        let r = CanonicalResolver::new(&sample_groups());
        assert!(r.qualified(
            "BIT1103",
            &["PROG-C-VARIANT".to_string()],
            QualificationMode::Permissive
        ));
    }

    #[test]
    fn empty_specializations_never_qualify() {
        let r = CanonicalResolver::new(&sample_groups());
        assert!(!r.qualified("BIT1103", &[], QualificationMode::Permissive));
    }

    #[test]
    fn unknown_course_falls_back_to_equivalents_self() {
        let r = CanonicalResolver::new(&sample_groups());
        assert_eq!(r.equivalents("MATH101"), vec!["MATH101".to_string()]);
    }
}
