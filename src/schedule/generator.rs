use indexmap::IndexMap;
use tracing::{debug, info, warn};

use super::types::{ClassName, SubstitutionRecord, SubstitutionsByDay, Teacher, Timetable, TimetableEntry};

/// School days in output order
pub const SCHOOL_DAYS: [&str; 5] = ["poniedzialek", "wtorek", "sroda", "czwartek", "piatek"];

pub const STATUS_MERGED: &str = "łączenie";
pub const STATUS_SUBSTITUTED: &str = "zastępstwo";
pub const STATUS_CANCELLED: &str = "odwołane";

/// Class name -> timetable for every class in the school
pub type ClassPlans = IndexMap<String, Timetable>;

/// How an absent teacher's lesson gets covered
#[derive(Debug, Clone, PartialEq, Eq)]
enum Cover {
    Merged { with_class: String, teacher: String },
    Substituted { teacher: String },
    Cancelled,
}

/// Builds substitutions for every lesson taught by an absent teacher.
///
/// Each lesson is covered by the first option that works:
/// 1. merge with another class having a lesson at the same time with a
///    present teacher, at most one school year apart
/// 2. a present teacher with no lesson at that time
/// 3. cancellation
pub fn generate_substitutions(teachers: &[Teacher], plans: &ClassPlans) -> SubstitutionsByDay {
    let mut result: SubstitutionsByDay = SCHOOL_DAYS
        .iter()
        .map(|day| (day.to_string(), Vec::new()))
        .collect();

    let absent: Vec<&Teacher> = teachers.iter().filter(|t| t.is_absent()).collect();
    info!(count = absent.len(), "absent teachers");

    // an unnamed teacher would match every lesson without a teacher
    let absent: Vec<&Teacher> = absent
        .into_iter()
        .filter(|t| {
            let named = !t.name.trim().is_empty();
            if !named {
                warn!("skipping absent teacher without a name");
            }
            named
        })
        .collect();

    for teacher in absent {
        for (class, plan) in plans {
            for (day, lessons) in plan {
                for lesson in lessons.iter().filter(|l| l.teacher_name() == teacher.name) {
                    let cover = find_cover(class, day, lesson, teachers, plans);
                    debug!(teacher = %teacher.name, %class, %day, slot = %lesson.time_slot, ?cover, "covered lesson");
                    result
                        .entry(day.clone())
                        .or_default()
                        .push(build_record(class, lesson, &teacher.name, cover));
                }
            }
        }
    }

    result
}

fn find_cover(class: &str, day: &str, lesson: &TimetableEntry, teachers: &[Teacher], plans: &ClassPlans) -> Cover {
    if let Some((with_class, teacher)) = find_merge(class, day, lesson, teachers, plans) {
        return Cover::Merged { with_class, teacher };
    }

    let free = teachers
        .iter()
        .filter(|t| t.is_present())
        .find(|t| !is_busy(&t.name, day, &lesson.time_slot, plans));

    match free {
        Some(teacher) => Cover::Substituted { teacher: teacher.name.clone() },
        None => Cover::Cancelled,
    }
}

/// First other class with a lesson at the same time that can absorb this one
fn find_merge(
    class: &str,
    day: &str,
    lesson: &TimetableEntry,
    teachers: &[Teacher],
    plans: &ClassPlans,
) -> Option<(String, String)> {
    let year = ClassName::new(class).year();

    for (other_class, other_plan) in plans {
        if other_class == class {
            continue;
        }

        let Some(other) = other_plan
            .get(day)
            .and_then(|lessons| lessons.iter().find(|l| l.time_slot == lesson.time_slot))
        else {
            continue;
        };

        if other.subject.is_empty() || other.teacher_name().is_empty() {
            continue;
        }

        // Covering teacher must be known and present
        match teachers.iter().find(|t| t.name == other.teacher_name()) {
            Some(t) if !t.is_absent() => {}
            _ => continue,
        }

        if let (Some(a), Some(b)) = (year, ClassName::new(other_class).year()) {
            if a.abs_diff(b) > 1 {
                continue;
            }
        }

        return Some((other_class.clone(), other.teacher_name().to_string()));
    }

    None
}

/// True when the teacher has any lesson at that time on that day
fn is_busy(teacher: &str, day: &str, time_slot: &str, plans: &ClassPlans) -> bool {
    plans.values().any(|plan| {
        plan.get(day).is_some_and(|lessons| {
            lessons
                .iter()
                .any(|l| l.teacher_name() == teacher && l.time_slot == time_slot)
        })
    })
}

fn build_record(class: &str, lesson: &TimetableEntry, absent_teacher: &str, cover: Cover) -> SubstitutionRecord {
    let (status, covering_teacher, description) = match cover {
        Cover::Merged { with_class, teacher } => (
            STATUS_MERGED,
            teacher,
            format!("Połączono klasy {} i {}", class, with_class),
        ),
        Cover::Substituted { teacher } => {
            let description = format!("Zastępuje {}", teacher);
            (STATUS_SUBSTITUTED, teacher, description)
        }
        Cover::Cancelled => (STATUS_CANCELLED, String::new(), "Zajęcia odwołane".to_string()),
    };

    SubstitutionRecord {
        class: class.to_string(),
        time_slot: lesson.time_slot.clone(),
        subject: lesson.subject.clone(),
        absent_teacher: absent_teacher.to_string(),
        covering_teacher,
        status: status.to_string(),
        description,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teacher(name: &str, presence: &str) -> Teacher {
        Teacher {
            name: name.to_string(),
            presence: presence.to_string(),
            ..Default::default()
        }
    }

    fn plan(day: &str, lessons: Vec<TimetableEntry>) -> Timetable {
        let mut plan = Timetable::new();
        plan.insert(day.to_string(), lessons);
        plan
    }

    #[test]
    fn test_merges_with_neighbouring_year() {
        let teachers = vec![teacher("Nowak", "no"), teacher("Kowalski", "yes")];
        let mut plans = ClassPlans::new();
        plans.insert(
            "1A".to_string(),
            plan("wtorek", vec![TimetableEntry::new("8:00", "Matematyka").taught_by("Nowak")]),
        );
        plans.insert(
            "2A".to_string(),
            plan("wtorek", vec![TimetableEntry::new("8:00", "Fizyka").taught_by("Kowalski")]),
        );

        let result = generate_substitutions(&teachers, &plans);
        let records = &result["wtorek"];
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, STATUS_MERGED);
        assert_eq!(records[0].covering_teacher, "Kowalski");
        assert_eq!(records[0].description, "Połączono klasy 1A i 2A");
        assert_eq!(records[0].class, "1A");
        assert_eq!(records[0].subject, "Matematyka");
    }

    #[test]
    fn test_does_not_merge_distant_years() {
        let teachers = vec![
            teacher("Nowak", "no"),
            teacher("Kowalski", "yes"),
            teacher("Wójcik", "yes"),
        ];
        let mut plans = ClassPlans::new();
        plans.insert(
            "1A".to_string(),
            plan("sroda", vec![TimetableEntry::new("8:00", "Matematyka").taught_by("Nowak")]),
        );
        plans.insert(
            "3A".to_string(),
            plan("sroda", vec![TimetableEntry::new("8:00", "Fizyka").taught_by("Kowalski")]),
        );

        let result = generate_substitutions(&teachers, &plans);
        let records = &result["sroda"];
        assert_eq!(records[0].status, STATUS_SUBSTITUTED);
        assert_eq!(records[0].covering_teacher, "Wójcik");
        assert_eq!(records[0].description, "Zastępuje Wójcik");
    }

    #[test]
    fn test_does_not_merge_with_absent_teacher() {
        let teachers = vec![teacher("Nowak", "no"), teacher("Kowalski", "no")];
        let mut plans = ClassPlans::new();
        plans.insert(
            "1A".to_string(),
            plan("piatek", vec![TimetableEntry::new("8:00", "Matematyka").taught_by("Nowak")]),
        );
        plans.insert(
            "1B".to_string(),
            plan("piatek", vec![TimetableEntry::new("9:00", "Chemia").taught_by("Kowalski")]),
        );

        let result = generate_substitutions(&teachers, &plans);
        let first = &result["piatek"][0];
        assert_eq!(first.class, "1A");
        assert_eq!(first.status, STATUS_CANCELLED);
        assert_eq!(first.covering_teacher, "");
        assert_eq!(first.description, "Zajęcia odwołane");
    }

    #[test]
    fn test_busy_teacher_is_not_a_substitute() {
        let teachers = vec![
            teacher("Nowak", "no"),
            teacher("Zajęty", "yes"),
            teacher("Wolny", "yes"),
        ];
        let mut plans = ClassPlans::new();
        plans.insert(
            "1A".to_string(),
            plan("poniedzialek", vec![TimetableEntry::new("8:00", "Polski").taught_by("Nowak")]),
        );
        plans.insert(
            "4A".to_string(),
            plan("poniedzialek", vec![TimetableEntry::new("8:00", "WF").taught_by("Zajęty")]),
        );

        let result = generate_substitutions(&teachers, &plans);
        assert_eq!(result["poniedzialek"][0].covering_teacher, "Wolny");
    }

    #[test]
    fn test_all_school_days_present() {
        let result = generate_substitutions(&[], &ClassPlans::new());
        let days: Vec<&str> = result.keys().map(|k| k.as_str()).collect();
        assert_eq!(days, SCHOOL_DAYS.to_vec());
        assert!(result.values().all(|records| records.is_empty()));
    }

    #[test]
    fn test_absent_teacher_without_name_is_skipped() {
        let teachers = vec![teacher("", "no"), teacher("Kowalski", "yes")];
        let mut plans = ClassPlans::new();
        plans.insert(
            "1A".to_string(),
            plan("poniedzialek", vec![TimetableEntry::new("8:00", "Godzina wychowawcza")]),
        );

        let result = generate_substitutions(&teachers, &plans);
        assert!(result.values().all(|records| records.is_empty()));
    }
}
