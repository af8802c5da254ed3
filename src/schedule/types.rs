use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder group key for records without a class
pub const UNKNOWN_CLASS: &str = "Nieznana klasa";
/// Placeholder group key for records without an absent teacher
pub const UNKNOWN_TEACHER: &str = "Nieznany nauczyciel";

/// Reads a string field where `null` and a missing value both mean ""
pub(crate) fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Class identifier, trimmed and uppercased (e.g. "1A")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ClassName(String);

impl ClassName {
    pub fn new(raw: &str) -> Self {
        ClassName(raw.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the name is safe to use as a file stem
    pub fn is_plain(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .chars()
                .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    }

    /// Leading digits of the name, i.e. the school year ("2B" -> 2)
    pub fn year(&self) -> Option<u32> {
        let digits: String = self.0.chars().take_while(|c| c.is_ascii_digit()).collect();
        digits.parse().ok()
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One substitution as stored in the data files
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutionRecord {
    #[serde(rename = "class", alias = "klasa", default, deserialize_with = "null_as_empty")]
    pub class: String,
    #[serde(rename = "timeSlot", alias = "godzina", default, deserialize_with = "null_as_empty")]
    pub time_slot: String,
    #[serde(alias = "przedmiot", default, deserialize_with = "null_as_empty")]
    pub subject: String,
    #[serde(
        rename = "absentTeacher",
        alias = "nauczyciel_nieobecny",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub absent_teacher: String,
    #[serde(
        rename = "coveringTeacher",
        alias = "nauczyciel_zastepujacy",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub covering_teacher: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub status: String,
    #[serde(alias = "opis", default, deserialize_with = "null_as_empty")]
    pub description: String,
}

impl SubstitutionRecord {
    pub fn detail(&self) -> SubstitutionDetail {
        SubstitutionDetail {
            status: self.status.clone(),
            absent_teacher: self.absent_teacher.clone(),
            covering_teacher: self.covering_teacher.clone(),
            description: self.description.clone(),
        }
    }
}

/// Substitution fields surfaced on a matched lesson
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutionDetail {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub status: String,
    #[serde(
        rename = "absentTeacher",
        alias = "nauczyciel_nieobecny",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub absent_teacher: String,
    #[serde(
        rename = "coveringTeacher",
        alias = "nauczyciel_zastepujacy",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub covering_teacher: String,
    #[serde(alias = "opis", default, deserialize_with = "null_as_empty")]
    pub description: String,
}

/// A single lesson in a class timetable
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimetableEntry {
    #[serde(rename = "timeSlot", alias = "godzina", default, deserialize_with = "null_as_empty")]
    pub time_slot: String,
    #[serde(alias = "przedmiot", default, deserialize_with = "null_as_empty")]
    pub subject: String,
    #[serde(alias = "nauczyciel", default, skip_serializing_if = "Option::is_none")]
    pub teacher: Option<String>,
    #[serde(alias = "sala", default, skip_serializing_if = "Option::is_none")]
    pub room: Option<serde_json::Value>,
    #[serde(alias = "zastepstwo", default, skip_serializing_if = "Option::is_none")]
    pub substitution: Option<SubstitutionDetail>,
}

impl TimetableEntry {
    pub fn new(time_slot: &str, subject: &str) -> Self {
        TimetableEntry {
            time_slot: time_slot.to_string(),
            subject: subject.to_string(),
            ..Default::default()
        }
    }

    pub fn taught_by(mut self, teacher: &str) -> Self {
        self.teacher = Some(teacher.to_string());
        self
    }

    /// Teacher name, "" when the lesson has none
    pub fn teacher_name(&self) -> &str {
        self.teacher.as_deref().unwrap_or("")
    }
}

/// Weekday name -> lessons, in file order
pub type Timetable = IndexMap<String, Vec<TimetableEntry>>;

/// Weekday (or date) -> substitutions for that day
pub type SubstitutionsByDay = IndexMap<String, Vec<SubstitutionRecord>>;

/// A teacher as listed in `nauczyciele.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    #[serde(alias = "imie", default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(alias = "przedmiot", default, deserialize_with = "null_as_empty")]
    pub subject: String,
    #[serde(alias = "sala", default, skip_serializing_if = "Option::is_none")]
    pub room: Option<serde_json::Value>,
    #[serde(alias = "etap", default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<serde_json::Value>,
    // "yes" | "no"
    #[serde(alias = "obecnosc", default, deserialize_with = "null_as_empty")]
    pub presence: String,
    #[serde(alias = "powod", default, deserialize_with = "null_as_empty")]
    pub reason: String,
    #[serde(alias = "wychowawca", default, skip_serializing_if = "Option::is_none")]
    pub homeroom: Option<serde_json::Value>,
}

impl Teacher {
    pub fn is_absent(&self) -> bool {
        self.presence == "no"
    }

    pub fn is_present(&self) -> bool {
        self.presence == "yes"
    }
}
