use indexmap::IndexMap;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use tracing::{debug, warn};

use super::generator::ClassPlans;
use super::types::{Teacher, Timetable, TimetableEntry};

/// Lessons placed on one day at most
pub const MAX_LESSONS_PER_DAY: usize = 5;
/// School hours as minutes after midnight
pub const SCHOOL_DAY_START: u32 = 8 * 60;
pub const SCHOOL_DAY_END: u32 = 16 * 60;

/// Used when `szkola.json` lists no usable lesson slots
pub const DEFAULT_LESSON_SLOTS: [&str; 6] = [
    "8:00-8:45",
    "8:55-9:40",
    "9:50-10:35",
    "10:45-11:30",
    "11:40-12:25",
    "12:35-13:20",
];

const DEFAULT_STAGES: [u64; 3] = [1, 2, 3];
const UNKNOWN_ROOM: &str = "?";

fn one() -> u32 {
    1
}

/// Entry of `przedmioty.json`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubjectInfo {
    #[serde(alias = "klasy", default)]
    pub classes: Vec<String>,
    #[serde(alias = "etapy", default)]
    pub stages: Option<Vec<u64>>,
    /// Lessons per week
    #[serde(alias = "godziny", default = "one")]
    pub weekly_hours: u32,
    /// Lessons per day at most
    #[serde(alias = "lekcje_dziennie", default = "one")]
    pub daily_limit: u32,
}

/// Entry of `etapy.json`, keyed by stage number
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StageInfo {
    #[serde(alias = "klasy", default)]
    pub classes: Vec<String>,
}

/// `szkola.json`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchoolInfo {
    #[serde(alias = "nazwa", default)]
    pub name: String,
    #[serde(alias = "rok_szkolny", default)]
    pub school_year: String,
    #[serde(alias = "godziny_szkolne", default)]
    pub lesson_slots: Vec<String>,
}

pub type Subjects = IndexMap<String, SubjectInfo>;
pub type Stages = IndexMap<String, StageInfo>;

/// Subject -> teacher, per class
pub type ClassTeachers = IndexMap<String, IndexMap<String, Teacher>>;

/// Everything the timetable generator reads
#[derive(Debug, Clone, Default)]
pub struct PlanInputs {
    pub classes: Vec<String>,
    pub teachers: Vec<Teacher>,
    pub subjects: Subjects,
    pub stages: Stages,
    pub days: Vec<String>,
    pub lesson_slots: Vec<String>,
}

fn to_minutes(time: &str) -> Option<u32> {
    let (hours, minutes) = time.trim().split_once(':')?;
    Some(hours.parse::<u32>().ok()? * 60 + minutes.parse::<u32>().ok()?)
}

/// True for a "H:MM-H:MM" slot that starts and ends within school hours
pub fn slot_in_school_hours(slot: &str) -> bool {
    let compact: String = slot.chars().filter(|c| !c.is_whitespace()).collect();
    let Some((start, end)) = compact.split_once('-') else {
        return false;
    };

    match (to_minutes(start), to_minutes(end)) {
        (Some(t1), Some(t2)) => {
            (SCHOOL_DAY_START..SCHOOL_DAY_END).contains(&t1) && SCHOOL_DAY_START < t2 && t2 <= SCHOOL_DAY_END
        }
        _ => false,
    }
}

/// Usable slots of `configured`, or the default slots when none remain
pub fn usable_slots(configured: &[String]) -> Vec<String> {
    let slots: Vec<String> = configured.iter().filter(|s| slot_in_school_hours(s)).cloned().collect();
    if slots.is_empty() {
        DEFAULT_LESSON_SLOTS.iter().map(|s| s.to_string()).collect()
    } else {
        slots
    }
}

/// Stage of a class; classes listed under no stage are stage 1
pub fn class_stage(class: &str, stages: &Stages) -> u64 {
    stages
        .iter()
        .find(|(_, info)| info.classes.iter().any(|c| c == class))
        .and_then(|(id, _)| id.parse().ok())
        .unwrap_or(1)
}

fn teacher_stage(teacher: &Teacher) -> Option<u64> {
    let stage = teacher.stage.as_ref()?;
    stage.as_u64().or_else(|| stage.as_str()?.trim().parse().ok())
}

/// Picks a random present teacher for every subject a class takes.
///
/// A teacher qualifies when their stage is one the subject is taught at, or
/// is the class's stage, 0 or 1. Teachers without a stage never qualify.
pub fn assign_teachers<R: Rng + ?Sized>(
    classes: &[String],
    teachers: &[Teacher],
    subjects: &Subjects,
    stages: &Stages,
    rng: &mut R,
) -> ClassTeachers {
    let mut by_subject: IndexMap<&str, Vec<&Teacher>> = IndexMap::new();
    for teacher in teachers.iter().filter(|t| !t.is_absent()) {
        by_subject.entry(teacher.subject.as_str()).or_default().push(teacher);
    }

    let mut assigned = ClassTeachers::new();
    for class in classes {
        let class_stage = class_stage(class, stages);
        let mut chosen = IndexMap::new();

        for (subject, info) in subjects {
            if !info.classes.iter().any(|c| c == class) {
                continue;
            }
            let allowed = info.stages.as_deref().unwrap_or(&DEFAULT_STAGES);

            let candidates: Vec<&Teacher> = by_subject
                .get(subject.as_str())
                .map(|list| {
                    list.iter()
                        .copied()
                        .filter(|t| match teacher_stage(t) {
                            Some(stage) => allowed.contains(&stage) || [class_stage, 0, 1].contains(&stage),
                            None => false,
                        })
                        .collect()
                })
                .unwrap_or_default();

            match candidates.choose(rng) {
                Some(teacher) => {
                    chosen.insert(subject.clone(), (*teacher).clone());
                }
                None => warn!(%subject, %class, stage = class_stage, "no teacher for subject"),
            }
        }

        assigned.insert(class.clone(), chosen);
    }

    assigned
}

/// Fills one class's week.
///
/// The weekly lessons are shuffled, then each day takes up to
/// [`MAX_LESSONS_PER_DAY`] random slots in slot order. A subject that hit its
/// daily limit yields to the next queued subject still under its limit; the
/// slot stays empty when there is none.
pub fn generate_plan<R: Rng + ?Sized>(
    class_teachers: &IndexMap<String, Teacher>,
    subjects: &Subjects,
    days: &[String],
    slots: &[String],
    rng: &mut R,
) -> Timetable {
    let mut plan: Timetable = days.iter().map(|d| (d.clone(), Vec::new())).collect();

    let daily_limit_of = |subject: &str| subjects.get(subject).map_or(1, |s| s.daily_limit) as usize;

    let mut weekly: Vec<&str> = Vec::new();
    for subject in class_teachers.keys() {
        let hours = subjects.get(subject).map_or(1, |s| s.weekly_hours) as usize;
        weekly.extend(std::iter::repeat(subject.as_str()).take(hours));
    }
    weekly.shuffle(rng);

    let slot_index = |slot: &str| slots.iter().position(|s| s == slot).unwrap_or(usize::MAX);

    for day in days {
        if weekly.is_empty() {
            break;
        }

        let mut day_slots: Vec<&String> = slots
            .choose_multiple(rng, slots.len().min(MAX_LESSONS_PER_DAY))
            .collect();
        day_slots.sort_by_key(|s| slot_index(s.as_str()));

        let mut placed: IndexMap<&str, usize> = IndexMap::new();
        let mut lessons = Vec::new();

        for slot in day_slots {
            let next = weekly
                .iter()
                .position(|subject| placed.get(subject).copied().unwrap_or(0) < daily_limit_of(*subject));
            let Some(position) = next else {
                continue;
            };

            let subject = weekly.remove(position);
            let Some(teacher) = class_teachers.get(subject) else {
                continue;
            };
            *placed.entry(subject).or_default() += 1;

            let mut entry = TimetableEntry::new(slot, subject).taught_by(&teacher.name);
            entry.room = Some(
                teacher
                    .room
                    .clone()
                    .unwrap_or_else(|| serde_json::Value::String(UNKNOWN_ROOM.to_string())),
            );
            lessons.push(entry);
        }

        lessons.sort_by_key(|l| slot_index(l.time_slot.as_str()));
        debug!(%day, lessons = lessons.len(), "planned day");
        plan.insert(day.clone(), lessons);
    }

    plan
}

/// Timetables for every class in `inputs.classes`
pub fn generate_all_plans<R: Rng + ?Sized>(inputs: &PlanInputs, rng: &mut R) -> ClassPlans {
    let slots = usable_slots(&inputs.lesson_slots);
    let assigned = assign_teachers(&inputs.classes, &inputs.teachers, &inputs.subjects, &inputs.stages, rng);

    assigned
        .iter()
        .map(|(class, teachers)| {
            let plan = generate_plan(teachers, &inputs.subjects, &inputs.days, &slots, rng);
            (class.clone(), plan)
        })
        .collect()
}
