use std::sync::OnceLock;

use regex::Regex;

use crate::error::StoreError;
use crate::model::{Semester, StudentRecord};

pub const CANONICAL_ENGINEERING: &str = "Ingeniería";

fn engineering_variants() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Catalan, accented/unaccented Spanish, common misspellings, and the
        // dotted abbreviations. The canonical spelling itself is listed so
        // lowercase input is folded too.
        Regex::new(
            r"(?i)\b(?:Enginyeria|Ingeniería|Ingenieria|Ingenería|Ingeneria|Ing\.|Eng\.)",
        )
        .expect("engineering pattern is a valid regex")
    })
}

/// Canonical form of a career name. Idempotent.
pub fn normalize_career(raw: &str) -> String {
    engineering_variants()
        .replace_all(raw, CANONICAL_ENGINEERING)
        .trim()
        .to_string()
}

/// Trim every field, normalize the career, and default the semester.
pub fn canonicalize(mut rec: StudentRecord) -> StudentRecord {
    rec.name = rec.name.trim().to_string();
    rec.career = normalize_career(&rec.career);
    rec.origin_city = rec.origin_city.trim().to_string();
    rec.phone = rec.phone.trim().to_string();
    rec.id = rec
        .id
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    if rec.semester.is_none() {
        rec.semester = Some(Semester::default());
    }
    rec
}

/// Required fields for a record accepted through `add` or `update`.
pub fn validate_required(rec: &StudentRecord) -> Result<(), StoreError> {
    let mut missing = Vec::new();
    if rec.name.trim().is_empty() {
        missing.push("name");
    }
    if rec.career.trim().is_empty() {
        missing.push("career");
    }
    if rec.origin_city.trim().is_empty() {
        missing.push("originCity");
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(StoreError::validation(format!(
            "missing fields: {}",
            missing.join(", ")
        )))
    }
}
