use super::types::{ClassName, SubstitutionRecord, Timetable, TimetableEntry};

/// Returns the substitutions that concern `class_name`, in input order.
///
/// A record matches when its class equals the name (case-insensitive), or
/// when its description mentions the name followed or preceded by a space.
/// The description check is a plain substring test: "1A" at the very start
/// or end of a description only matches from one side.
pub fn filter_substitutions_for_class(
    class_name: &ClassName,
    all_substitutions: &[SubstitutionRecord],
) -> Vec<SubstitutionRecord> {
    let name = class_name.as_str();
    let leading = format!(" {}", name);
    let trailing = format!("{} ", name);

    all_substitutions
        .iter()
        .filter(|record| {
            let class = record.class.to_uppercase();
            let description = record.description.to_uppercase();
            class == name || description.contains(&leading) || description.contains(&trailing)
        })
        .cloned()
        .collect()
}

/// True when a substitution applies to the given lesson slot
fn matches_lesson(record: &SubstitutionRecord, entry: &TimetableEntry) -> bool {
    record.time_slot.trim() == entry.time_slot.trim()
        && record.subject.trim().to_lowercase() == entry.subject.trim().to_lowercase()
}

/// Annotates every lesson with the first substitution that matches its time
/// slot and subject. Lessons without a match are left untouched.
pub fn annotate_timetable(
    mut timetable: Timetable,
    relevant_substitutions: &[SubstitutionRecord],
) -> Timetable {
    for lessons in timetable.values_mut() {
        for entry in lessons.iter_mut() {
            // First match wins
            if let Some(record) = relevant_substitutions
                .iter()
                .find(|record| matches_lesson(record, entry))
            {
                entry.substitution = Some(record.detail());
            }
        }
    }
    timetable
}
