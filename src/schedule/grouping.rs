use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::collation::PolishCollator;
use super::types::{SubstitutionRecord, UNKNOWN_CLASS, UNKNOWN_TEACHER};

/// How the day view groups its substitutions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupMode {
    #[default]
    Class,
    Teacher,
}

impl GroupMode {
    /// Parses the `tryb` query value, falling back to class mode
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("teacher") => GroupMode::Teacher,
            _ => GroupMode::Class,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupMode::Class => "class",
            GroupMode::Teacher => "teacher",
        }
    }

    /// Group key of a record in this mode
    pub fn key_of(&self, record: &SubstitutionRecord) -> String {
        let (value, fallback) = match self {
            GroupMode::Class => (record.class.as_str(), UNKNOWN_CLASS),
            GroupMode::Teacher => (record.absent_teacher.as_str(), UNKNOWN_TEACHER),
        };
        if value.is_empty() {
            fallback.to_string()
        } else {
            value.to_string()
        }
    }

    fn collator(&self) -> PolishCollator {
        match self {
            GroupMode::Class => PolishCollator::numeric(),
            GroupMode::Teacher => PolishCollator::alphabetic(),
        }
    }
}

/// One group of the day view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubstitutionGroup {
    pub key: String,
    pub substitutions: Vec<SubstitutionRecord>,
}

/// Groups records by `key_fn`, keeping first-seen key order and the input
/// order of records inside each group.
pub fn group_substitutions_by_key<F>(
    substitutions: &[SubstitutionRecord],
    key_fn: F,
) -> IndexMap<String, Vec<SubstitutionRecord>>
where
    F: Fn(&SubstitutionRecord) -> String,
{
    let mut grouped: IndexMap<String, Vec<SubstitutionRecord>> = IndexMap::new();
    for record in substitutions {
        grouped.entry(key_fn(record)).or_default().push(record.clone());
    }
    grouped
}

/// Groups a day's substitutions for display and orders the groups with the
/// mode's collator.
pub fn group_for_display(substitutions: &[SubstitutionRecord], mode: GroupMode) -> Vec<SubstitutionGroup> {
    let grouped = group_substitutions_by_key(substitutions, |record| mode.key_of(record));
    let collator = mode.collator();

    let mut groups: Vec<SubstitutionGroup> = grouped
        .into_iter()
        .map(|(key, substitutions)| SubstitutionGroup { key, substitutions })
        .collect();
    groups.sort_by(|a, b| collator.compare(&a.key, &b.key));
    groups
}
