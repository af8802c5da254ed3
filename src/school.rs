use serde::{Deserialize, Serialize};

use crate::schedule::types::null_as_empty;
use crate::schedule::Teacher;

/// Entry of `klasy.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassInfo {
    #[serde(rename = "homeroomTeacher", alias = "wychowawca", default, deserialize_with = "null_as_empty")]
    pub homeroom_teacher: String,
    #[serde(alias = "uczniowie", default)]
    pub students: Vec<String>,
}

/// Upcoming school event shown on the home page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchoolEvent {
    #[serde(alias = "data", default, deserialize_with = "null_as_empty")]
    pub date: String,
    #[serde(alias = "tytul", default, deserialize_with = "null_as_empty")]
    pub title: String,
}

/// Absence summary for the home page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbsenceStats {
    #[serde(rename = "absentCount")]
    pub absent_count: usize,
    #[serde(rename = "dominantReason")]
    pub dominant_reason: String,
}

impl AbsenceStats {
    pub const NO_REASON: &'static str = "Brak";

    /// Counts absent teachers and picks the most common reason.
    /// Ties go to the reason seen first.
    pub fn from_teachers(teachers: &[Teacher]) -> Self {
        let absent: Vec<&Teacher> = teachers.iter().filter(|t| t.is_absent()).collect();

        let mut reasons: Vec<(&str, usize)> = Vec::new();
        for teacher in &absent {
            if teacher.reason.is_empty() {
                continue;
            }
            match reasons.iter_mut().find(|(reason, _)| *reason == teacher.reason) {
                Some((_, count)) => *count += 1,
                None => reasons.push((teacher.reason.as_str(), 1)),
            }
        }

        // max_by_key keeps the last maximum, so search from the back
        let dominant_reason = reasons
            .iter()
            .rev()
            .max_by_key(|(_, count)| *count)
            .map(|(reason, _)| reason.to_string())
            .unwrap_or_else(|| Self::NO_REASON.to_string());

        AbsenceStats {
            absent_count: absent.len(),
            dominant_reason,
        }
    }
}
