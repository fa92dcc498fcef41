use anyhow::Context;
use std::path::Path;

use crate::model::StudentRecord;

/// Misspellings found in the original spreadsheet roster.
const CITY_ALIASES: &[(&str, &str)] = &[
    ("Bilbo", "Bilbao"),
    ("Grana", "Granada"),
    ("San Sebastiána", "San Sebastián"),
];

pub fn normalize_city(raw: &str) -> String {
    let t = raw.trim();
    CITY_ALIASES
        .iter()
        .find(|(from, _)| *from == t)
        .map(|(_, to)| to.to_string())
        .unwrap_or_else(|| t.to_string())
}

pub struct ParsedRoster {
    pub students: Vec<StudentRecord>,
    pub skipped: usize,
}

/// Read a legacy roster export: a JSON array of student objects, or an
/// object with a `students` array. Entries without a name, and entries that
/// are not objects, are skipped.
pub fn parse_legacy_roster(path: &Path) -> anyhow::Result<ParsedRoster> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.to_string_lossy()))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", path.to_string_lossy()))?;
    let rows = match value {
        serde_json::Value::Array(rows) => rows,
        serde_json::Value::Object(mut obj) => match obj.remove("students") {
            Some(serde_json::Value::Array(rows)) => rows,
            _ => anyhow::bail!("roster object has no students array"),
        },
        _ => anyhow::bail!("roster must be a JSON array of students"),
    };

    let mut students = Vec::with_capacity(rows.len());
    let mut skipped = 0usize;
    for row in rows {
        if !row.is_object() {
            skipped += 1;
            continue;
        }
        let Ok(mut rec) = serde_json::from_value::<StudentRecord>(row) else {
            skipped += 1;
            continue;
        };
        if rec.name.trim().is_empty() {
            skipped += 1;
            continue;
        }
        rec.origin_city = normalize_city(&rec.origin_city);
        students.push(rec);
    }
    Ok(ParsedRoster { students, skipped })
}
