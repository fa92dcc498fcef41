//! Derived dashboard views over a record snapshot.
//!
//! Everything here is a pure function of the input records: no errors, no
//! I/O. Missing fields are treated as empty strings. [`DashboardView`] is the
//! memoized bundle the daemon keeps between mutations.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use sha2::{Digest, Sha256};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::geo::ProvinceMap;
use crate::i18n::{count_label, t, Key, Lang};
use crate::model::StudentRecord;

/// Sort key for locale-aware comparison. Case and accents are ignored at the
/// primary level; Spanish keeps `ñ` as its own letter after `n`.
pub fn collation_key(s: &str, lang: Lang) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if lang == Lang::Es && matches!(c, 'ñ' | 'Ñ') {
            out.push('n');
            out.push(char::MAX);
            continue;
        }
        out.extend(c.to_lowercase().nfd().filter(|d| !is_combining_mark(*d)));
    }
    out
}

pub fn locale_cmp(a: &str, b: &str, lang: Lang) -> Ordering {
    collation_key(a, lang)
        .cmp(&collation_key(b, lang))
        .then_with(|| a.cmp(b))
}

fn unique_values<F>(records: &[StudentRecord], lang: Lang, field: F) -> Vec<String>
where
    F: Fn(&StudentRecord) -> &str,
{
    let mut seen = HashSet::new();
    let mut out: Vec<String> = records
        .iter()
        .map(|r| field(r).trim())
        .filter(|v| !v.is_empty() && seen.insert(*v))
        .map(str::to_string)
        .collect();
    out.sort_by_cached_key(|v| (collation_key(v, lang), v.clone()));
    out
}

pub fn unique_cities(records: &[StudentRecord], lang: Lang) -> Vec<String> {
    unique_values(records, lang, |r| &r.origin_city)
}

pub fn unique_careers(records: &[StudentRecord], lang: Lang) -> Vec<String> {
    unique_values(records, lang, |r| &r.career)
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Outcome of the city/career search box. `Inactive` means both queries were
/// empty and the results panel stays hidden; `Active` may hold zero matches.
#[derive(Debug, Clone, PartialEq)]
pub enum TextFilter<'a> {
    Inactive,
    Active(Vec<&'a StudentRecord>),
}

impl<'a> TextFilter<'a> {
    pub fn is_active(&self) -> bool {
        matches!(self, TextFilter::Active(_))
    }

    pub fn matches(&self) -> &[&'a StudentRecord] {
        match self {
            TextFilter::Inactive => &[],
            TextFilter::Active(v) => v,
        }
    }
}

pub fn filter_by_text<'a>(
    records: &'a [StudentRecord],
    city_query: &str,
    career_query: &str,
) -> TextFilter<'a> {
    let city = city_query.trim().to_lowercase();
    let career = career_query.trim().to_lowercase();
    if city.is_empty() && career.is_empty() {
        return TextFilter::Inactive;
    }
    TextFilter::Active(
        records
            .iter()
            .filter(|r| city.is_empty() || contains_ci(&r.origin_city, &city))
            .filter(|r| career.is_empty() || contains_ci(&r.career, &career))
            .collect(),
    )
}

/// Results heading for an active text filter, e.g. `Ciudad: "Bil" · Carrera: "Ing"`.
pub fn filter_title(lang: Lang, city_query: &str, career_query: &str) -> String {
    let mut parts = Vec::new();
    if !city_query.trim().is_empty() {
        parts.push(format!("{}: \"{}\"", t(lang, Key::CityLabel), city_query.trim()));
    }
    if !career_query.trim().is_empty() {
        parts.push(format!(
            "{}: \"{}\"",
            t(lang, Key::CareerLabel),
            career_query.trim()
        ));
    }
    if parts.is_empty() {
        t(lang, Key::Results).to_string()
    } else {
        parts.join(" · ")
    }
}

/// Table quick search over every visible column.
pub fn quick_search<'a>(records: &'a [StudentRecord], term: &str) -> Vec<&'a StudentRecord> {
    let term = term.trim().to_lowercase();
    records
        .iter()
        .filter(|r| {
            term.is_empty()
                || contains_ci(&r.name, &term)
                || contains_ci(&r.career, &term)
                || contains_ci(&r.origin_city, &term)
                || contains_ci(&r.phone, &term)
        })
        .collect()
}

/// Autocomplete suggestions from a unique-value index.
pub fn suggest<'a>(options: &'a [String], query: &str) -> Vec<&'a str> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return Vec::new();
    }
    options
        .iter()
        .filter(|o| contains_ci(o, &q))
        .map(String::as_str)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTier {
    Empty,
    Low,
    Mid,
    High,
    Max,
}

pub fn color_bucket(count: usize, max_count: usize) -> ColorTier {
    if count == 0 {
        return ColorTier::Empty;
    }
    let ratio = count as f64 / max_count.max(1) as f64;
    if ratio < 0.2 {
        ColorTier::Low
    } else if ratio < 0.5 {
        ColorTier::Mid
    } else if ratio < 0.8 {
        ColorTier::High
    } else {
        ColorTier::Max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvinceStat {
    pub province: String,
    pub count: usize,
    pub tier: ColorTier,
}

/// Students grouped by resolved province. Provinces iterate in name order;
/// records within a province keep input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProvinceBuckets {
    buckets: BTreeMap<String, Vec<StudentRecord>>,
}

impl ProvinceBuckets {
    pub fn get(&self, province: &str) -> &[StudentRecord] {
        self.buckets.get(province).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, province: &str) -> usize {
        self.get(province).len()
    }

    pub fn contains(&self, province: &str) -> bool {
        self.buckets.contains_key(province)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[StudentRecord])> {
        self.buckets.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Largest bucket, never below 1.
    pub fn max_count(&self) -> usize {
        self.buckets.values().map(Vec::len).max().unwrap_or(0).max(1)
    }

    pub fn stats(&self) -> Vec<ProvinceStat> {
        let max = self.max_count();
        self.iter()
            .map(|(province, recs)| ProvinceStat {
                province: province.to_string(),
                count: recs.len(),
                tier: color_bucket(recs.len(), max),
            })
            .collect()
    }
}

pub fn bucket_by_province(records: &[StudentRecord], provinces: &ProvinceMap) -> ProvinceBuckets {
    let mut buckets: BTreeMap<String, Vec<StudentRecord>> = BTreeMap::new();
    for rec in records {
        let origin = rec.origin_city.trim();
        if origin.is_empty() {
            continue;
        }
        let mut placed = HashSet::new();
        for province in provinces.resolve(origin) {
            if placed.insert(province) {
                buckets
                    .entry(province.to_string())
                    .or_default()
                    .push(rec.clone());
            }
        }
    }
    ProvinceBuckets { buckets }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub students: usize,
    pub cities: usize,
    pub careers: usize,
}

/// SHA-256 over the canonical JSON of the set.
pub fn revision(records: &[StudentRecord]) -> String {
    let bytes = serde_json::to_vec(records).unwrap_or_default();
    Sha256::digest(&bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Memoized indexes for one snapshot. Rebuild after every mutation.
#[derive(Debug, Clone)]
pub struct DashboardView {
    records: Vec<StudentRecord>,
    lang: Lang,
    cities: Vec<String>,
    careers: Vec<String>,
    buckets: ProvinceBuckets,
    revision: String,
}

impl DashboardView {
    pub fn build(records: Vec<StudentRecord>, provinces: &ProvinceMap, lang: Lang) -> Self {
        let cities = unique_cities(&records, lang);
        let careers = unique_careers(&records, lang);
        let buckets = bucket_by_province(&records, provinces);
        let revision = revision(&records);
        Self {
            records,
            lang,
            cities,
            careers,
            buckets,
            revision,
        }
    }

    pub fn records(&self) -> &[StudentRecord] {
        &self.records
    }

    pub fn lang(&self) -> Lang {
        self.lang
    }

    pub fn cities(&self) -> &[String] {
        &self.cities
    }

    pub fn careers(&self) -> &[String] {
        &self.careers
    }

    pub fn buckets(&self) -> &ProvinceBuckets {
        &self.buckets
    }

    pub fn revision(&self) -> &str {
        &self.revision
    }

    pub fn summary(&self) -> Summary {
        Summary {
            students: self.records.len(),
            cities: self.cities.len(),
            careers: self.careers.len(),
        }
    }

    pub fn filter(&self, city_query: &str, career_query: &str) -> TextFilter<'_> {
        filter_by_text(&self.records, city_query, career_query)
    }

    pub fn count_label(&self, count: usize) -> String {
        count_label(self.lang, count)
    }

    pub fn province_title(&self, province: &str) -> String {
        format!("{}: {}", t(self.lang, Key::ProvinceLabel), province)
    }
}
