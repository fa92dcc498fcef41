//! Static display strings for the two dashboard languages.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    Es,
    Ca,
}

impl Lang {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "es" => Some(Lang::Es),
            "ca" => Some(Lang::Ca),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Lang::Es => "es",
            Lang::Ca => "ca",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Results,
    CityLabel,
    CareerLabel,
    ProvinceLabel,
    StudentUnit,
    StudentsUnit,
    StatStudents,
    StatCities,
    StatCareers,
}

pub fn t(lang: Lang, key: Key) -> &'static str {
    match (lang, key) {
        (Lang::Es, Key::Results) => "Resultados",
        (Lang::Es, Key::CityLabel) => "Ciudad",
        (Lang::Es, Key::CareerLabel) => "Carrera",
        (Lang::Es, Key::ProvinceLabel) => "Provincia",
        (Lang::Es, Key::StudentUnit) => "estudiante",
        (Lang::Es, Key::StudentsUnit) => "estudiantes",
        (Lang::Es, Key::StatStudents) => "Estudiantes",
        (Lang::Es, Key::StatCities) => "Ciudades",
        (Lang::Es, Key::StatCareers) => "Carreras",
        (Lang::Ca, Key::Results) => "Resultats",
        (Lang::Ca, Key::CityLabel) => "Ciutat",
        (Lang::Ca, Key::CareerLabel) => "Carrera",
        (Lang::Ca, Key::ProvinceLabel) => "Província",
        (Lang::Ca, Key::StudentUnit) => "estudiant",
        (Lang::Ca, Key::StudentsUnit) => "estudiants",
        (Lang::Ca, Key::StatStudents) => "Estudiants",
        (Lang::Ca, Key::StatCities) => "Ciutats",
        (Lang::Ca, Key::StatCareers) => "Carreres",
    }
}

/// "1 estudiante", "3 estudiantes".
pub fn count_label(lang: Lang, count: usize) -> String {
    let unit = if count == 1 {
        Key::StudentUnit
    } else {
        Key::StudentsUnit
    };
    format!("{count} {}", t(lang, unit))
}
