use crate::schedule::{group_for_display, ClassPlans, GroupMode, SubstitutionRecord, SubstitutionsByDay, TimetableEntry};

/// Formats the teacher change of a record: "absent -> covering"
pub fn format_teacher_change(record: &SubstitutionRecord) -> String {
    let absent = GroupMode::Teacher.key_of(record);
    if record.covering_teacher.is_empty() {
        absent
    } else {
        format!("{} -> {}", absent, record.covering_teacher)
    }
}

/// One line of a day listing: "HH:MM [class] subject (teachers) status"
pub fn format_record_line(record: &SubstitutionRecord) -> String {
    format!(
        "{:>5} [{}] {} ({}) {}",
        record.time_slot,
        GroupMode::Class.key_of(record),
        record.subject,
        format_teacher_change(record),
        record.status
    )
}

/// Prints generated substitutions, grouped by class within each weekday
pub fn print_substitutions(by_day: &SubstitutionsByDay) {
    let total: usize = by_day.values().map(Vec::len).sum();
    println!("\n=== Zastępstwa ({}) ===", total);

    for (day, records) in by_day {
        println!("\n** {} **", day);
        if records.is_empty() {
            println!("  brak zmian");
            continue;
        }
        for group in group_for_display(records, GroupMode::Class) {
            println!("  {}:", group.key);
            for record in &group.substitutions {
                println!("    {}", format_record_line(record));
            }
        }
    }
}

/// One timetable line: "slot subject (teacher, room)"
pub fn format_lesson_line(lesson: &TimetableEntry) -> String {
    let room = match &lesson.room {
        Some(serde_json::Value::String(room)) => room.clone(),
        Some(room) => room.to_string(),
        None => "?".to_string(),
    };
    format!("{:>11} {} ({}, {})", lesson.time_slot, lesson.subject, lesson.teacher_name(), room)
}

/// Prints generated class timetables
pub fn print_plans(plans: &ClassPlans) {
    for (class, plan) in plans {
        println!("\n=== Plan {} ===", class);
        for (day, lessons) in plan {
            println!("  {}:", day);
            for lesson in lessons {
                println!("    {}", format_lesson_line(lesson));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_teacher_change() {
        let mut record = SubstitutionRecord {
            absent_teacher: "Jan Kowalski".to_string(),
            covering_teacher: "Anna Nowak".to_string(),
            ..Default::default()
        };
        assert_eq!(format_teacher_change(&record), "Jan Kowalski -> Anna Nowak");

        record.covering_teacher.clear();
        assert_eq!(format_teacher_change(&record), "Jan Kowalski");

        record.absent_teacher.clear();
        assert_eq!(format_teacher_change(&record), "Nieznany nauczyciel");
    }

    #[test]
    fn test_format_record_line() {
        let record = SubstitutionRecord {
            class: "2A".to_string(),
            time_slot: "8:00".to_string(),
            subject: "Matematyka".to_string(),
            absent_teacher: "Jan Kowalski".to_string(),
            status: "odwołane".to_string(),
            ..Default::default()
        };
        assert_eq!(format_record_line(&record), " 8:00 [2A] Matematyka (Jan Kowalski) odwołane");
    }

    #[test]
    fn test_format_lesson_line() {
        let mut lesson = TimetableEntry::new("8:00-8:45", "Fizyka").taught_by("Ewa Wójcik");
        assert_eq!(format_lesson_line(&lesson), "  8:00-8:45 Fizyka (Ewa Wójcik, ?)");

        lesson.room = Some(serde_json::Value::from(12));
        assert_eq!(format_lesson_line(&lesson), "  8:00-8:45 Fizyka (Ewa Wójcik, 12)");
    }
}
