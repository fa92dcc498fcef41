use serde::{Deserialize, Deserializer, Serialize};

/// One exchange student as stored and served.
///
/// Field aliases accept the legacy roster keys so files written before the
/// rename still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, alias = "nom", deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, alias = "carrera", deserialize_with = "null_as_empty")]
    pub career: String,
    #[serde(
        default,
        alias = "origen",
        alias = "origin",
        deserialize_with = "null_as_empty"
    )]
    pub origin_city: String,
    #[serde(default, alias = "telefon", deserialize_with = "null_as_empty")]
    pub phone: String,
    #[serde(default, alias = "semestre", skip_serializing_if = "Option::is_none")]
    pub semester: Option<Semester>,
}

impl StudentRecord {
    pub fn new(
        name: impl Into<String>,
        career: impl Into<String>,
        origin_city: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            career: career.into(),
            origin_city: origin_city.into(),
            phone: String::new(),
            semester: None,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }

    pub fn with_semester(mut self, semester: Semester) -> Self {
        self.semester = Some(semester);
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Semester {
    #[default]
    #[serde(rename = "1st", alias = "1r")]
    First,
    #[serde(rename = "2nd", alias = "2n")]
    Second,
    #[serde(rename = "Annual", alias = "Anual")]
    Annual,
}

impl Semester {
    pub fn as_str(self) -> &'static str {
        match self {
            Semester::First => "1st",
            Semester::Second => "2nd",
            Semester::Annual => "Annual",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "1st" | "1r" => Some(Semester::First),
            "2nd" | "2n" => Some(Semester::Second),
            "Annual" | "Anual" => Some(Semester::Annual),
            _ => None,
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
