use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calendar::SchoolCalendar;
use crate::error::StoreError;
use crate::schedule::plans::{PlanInputs, SchoolInfo, Stages, Subjects};
use crate::schedule::{
    ClassName, ClassPlans, PolishCollator, SubstitutionRecord, SubstitutionsByDay, Teacher, Timetable, SCHOOL_DAYS,
};
use crate::school::{ClassInfo, SchoolEvent};

pub const PLANS_DIR: &str = "plany";
pub const DAYS_DIR: &str = "zastepstwa";
pub const SUBSTITUTIONS_FILE: &str = "zastepstwa.json";
pub const TEACHERS_FILE: &str = "nauczyciele.json";
pub const CLASSES_FILE: &str = "klasy.json";
pub const CALENDAR_FILE: &str = "calendar.json";
pub const EVENTS_FILE: &str = "wydarzenia.json";
pub const SUBJECTS_FILE: &str = "przedmioty.json";
pub const STAGES_FILE: &str = "etapy.json";
pub const SCHOOL_FILE: &str = "szkola.json";

const FREE_DAY_STATUS: &str = "wolne";

/// Free-day marker stored in place of a day's substitution list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayNotice {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub opis: Option<String>,
}

/// Contents of one `zastepstwa/<day>.json` file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DayFile {
    Records(Vec<SubstitutionRecord>),
    Notice(DayNotice),
}

impl DayFile {
    /// Description of the free day, when this file marks one
    pub fn free_day(&self) -> Option<&str> {
        match self {
            DayFile::Notice(notice) if notice.status == FREE_DAY_STATUS => {
                Some(notice.opis.as_deref().unwrap_or("Dzień wolny"))
            }
            _ => None,
        }
    }

    pub fn records(&self) -> &[SubstitutionRecord] {
        match self {
            DayFile::Records(records) => records,
            DayFile::Notice(_) => &[],
        }
    }
}

/// Flat JSON files under one data directory
#[derive(Debug, Clone)]
pub struct JsonStore {
    data_dir: PathBuf,
}

impl JsonStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        JsonStore {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn plans_dir(&self) -> PathBuf {
        self.data_dir.join(PLANS_DIR)
    }

    fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T, StoreError> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Loads a file relative to the data directory.
    /// Missing or invalid files are logged and yield the default value.
    pub fn load_json<T: DeserializeOwned + Default>(&self, relative: impl AsRef<Path>) -> T {
        let path = self.data_dir.join(relative.as_ref());
        match self.read_json(&path) {
            Ok(value) => value,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not load JSON file");
                T::default()
            }
        }
    }

    /// Writes pretty JSON relative to the data directory, creating parents
    pub fn write_json<T: Serialize>(&self, relative: impl AsRef<Path>, value: &T) -> Result<PathBuf, StoreError> {
        let path = self.data_dir.join(relative.as_ref());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serde_json::to_string_pretty(value)?)?;
        debug!(path = %path.display(), "wrote JSON file");
        Ok(path)
    }

    /// File stems of `*.json` files in a data subdirectory
    fn json_stems(&self, dir: &str) -> Vec<String> {
        let Ok(entries) = fs::read_dir(self.data_dir.join(dir)) else {
            return Vec::new();
        };

        entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| path.file_stem().map(|stem| stem.to_string_lossy().into_owned()))
            .collect()
    }

    /// Days with a substitution file, oldest first
    pub fn list_days(&self) -> Vec<String> {
        let mut days = self.json_stems(DAYS_DIR);
        days.sort();
        days
    }

    /// Loads one day file; `None` when it is missing or unreadable
    pub fn load_day(&self, day: &str) -> Option<DayFile> {
        let path = self.data_dir.join(DAYS_DIR).join(format!("{}.json", day));
        if !path.exists() {
            return None;
        }
        match self.read_json(&path) {
            Ok(file) => Some(file),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not load day file");
                None
            }
        }
    }

    /// Classes that have a timetable file, in class order
    pub fn list_timetables(&self) -> Vec<String> {
        let collator = PolishCollator::numeric();
        let mut classes = self.json_stems(PLANS_DIR);
        classes.sort_by(|a, b| collator.compare(a, b));
        classes
    }

    /// Timetable of one class; empty when missing
    pub fn load_timetable(&self, class: &ClassName) -> Timetable {
        if !class.is_plain() {
            warn!(class = %class, "refusing to load timetable for unusual class name");
            return Timetable::new();
        }
        self.load_json(Path::new(PLANS_DIR).join(format!("{}.json", class)))
    }

    /// Writes `plany/<class>.json`
    pub fn write_timetable(&self, class: &ClassName, plan: &Timetable) -> Result<PathBuf, StoreError> {
        if !class.is_plain() {
            return Err(StoreError::UnusualClassName(class.to_string()));
        }
        self.write_json(Path::new(PLANS_DIR).join(format!("{}.json", class)), plan)
    }

    pub fn load_all_timetables(&self) -> ClassPlans {
        self.list_timetables()
            .into_iter()
            .map(|class| {
                let plan: Timetable = self.load_json(Path::new(PLANS_DIR).join(format!("{}.json", class)));
                (class, plan)
            })
            .collect()
    }

    /// Weekday-keyed substitutions from `zastepstwa.json`
    pub fn legacy_substitutions(&self) -> SubstitutionsByDay {
        self.load_json(SUBSTITUTIONS_FILE)
    }

    /// Every known substitution: the weekday file first, then each day file
    /// in day order. Free days contribute nothing.
    pub fn all_substitutions(&self) -> Vec<SubstitutionRecord> {
        let mut all: Vec<SubstitutionRecord> = self.legacy_substitutions().into_values().flatten().collect();

        for day in self.list_days() {
            if let Some(file) = self.load_day(&day) {
                all.extend_from_slice(file.records());
            }
        }

        all
    }

    /// Substitutions of one day file, or of one weekday of `zastepstwa.json`
    pub fn substitutions_for_day(&self, day: &str) -> Result<Vec<SubstitutionRecord>, StoreError> {
        if let Some(file) = self.load_day(day) {
            return Ok(file.records().to_vec());
        }
        self.legacy_substitutions()
            .shift_remove(day)
            .ok_or_else(|| StoreError::UnknownDay(day.to_string()))
    }

    pub fn teachers(&self) -> Vec<Teacher> {
        self.load_json(TEACHERS_FILE)
    }

    pub fn classes(&self) -> IndexMap<String, ClassInfo> {
        self.load_json(CLASSES_FILE)
    }

    pub fn events(&self) -> Vec<SchoolEvent> {
        self.load_json(EVENTS_FILE)
    }

    pub fn calendar(&self) -> SchoolCalendar {
        self.load_json(CALENDAR_FILE)
    }

    pub fn subjects(&self) -> Subjects {
        self.load_json(SUBJECTS_FILE)
    }

    pub fn stages(&self) -> Stages {
        self.load_json(STAGES_FILE)
    }

    pub fn school_info(&self) -> SchoolInfo {
        self.load_json(SCHOOL_FILE)
    }

    /// Timetable generator inputs. Days are the keys of `zastepstwa.json`,
    /// or the five school days when it is empty.
    pub fn plan_inputs(&self) -> PlanInputs {
        let mut days: Vec<String> = self.legacy_substitutions().keys().cloned().collect();
        if days.is_empty() {
            days = SCHOOL_DAYS.iter().map(|d| d.to_string()).collect();
        }

        PlanInputs {
            classes: self.classes().keys().cloned().collect(),
            teachers: self.teachers(),
            subjects: self.subjects(),
            stages: self.stages(),
            days,
            lesson_slots: self.school_info().lesson_slots,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, relative: &str, contents: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_missing_file_yields_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        assert!(store.teachers().is_empty());
        assert!(store.classes().is_empty());
        assert!(store.load_timetable(&ClassName::new("1A")).is_empty());
        assert!(store.list_days().is_empty());
    }

    #[test]
    fn test_invalid_json_yields_default() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), TEACHERS_FILE, "{ not json");
        let store = JsonStore::new(dir.path());
        assert!(store.teachers().is_empty());
    }

    #[test]
    fn test_days_sorted_and_free_day_detected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "zastepstwa/2025-11-12.json", r#"[{"klasa": "1A", "godzina": "8:00", "przedmiot": "WF"}]"#);
        write(dir.path(), "zastepstwa/2025-11-11.json", r#"{"status": "wolne", "opis": "Święto"}"#);
        write(dir.path(), "zastepstwa/notes.txt", "ignored");
        let store = JsonStore::new(dir.path());

        assert_eq!(store.list_days(), vec!["2025-11-11", "2025-11-12"]);

        let free = store.load_day("2025-11-11").unwrap();
        assert_eq!(free.free_day(), Some("Święto"));
        assert!(free.records().is_empty());

        let normal = store.load_day("2025-11-12").unwrap();
        assert_eq!(normal.free_day(), None);
        assert_eq!(normal.records().len(), 1);

        assert!(store.load_day("2025-11-13").is_none());
    }

    #[test]
    fn test_all_substitutions_flattens_both_sources() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            SUBSTITUTIONS_FILE,
            r#"{
                "poniedzialek": [{"klasa": "1A", "przedmiot": "A"}],
                "wtorek": [{"klasa": "1A", "przedmiot": "B"}, {"klasa": "2A", "przedmiot": "C"}]
            }"#,
        );
        write(dir.path(), "zastepstwa/2025-11-11.json", r#"{"status": "wolne"}"#);
        write(dir.path(), "zastepstwa/2025-11-12.json", r#"[{"klasa": "3A", "przedmiot": "D"}]"#);
        let store = JsonStore::new(dir.path());

        let subjects: Vec<String> = store.all_substitutions().into_iter().map(|r| r.subject).collect();
        assert_eq!(subjects, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_substitutions_for_day() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), SUBSTITUTIONS_FILE, r#"{"wtorek": [{"klasa": "1A", "przedmiot": "B"}]}"#);
        write(dir.path(), "zastepstwa/2025-11-12.json", r#"[{"klasa": "3A", "przedmiot": "D"}]"#);
        let store = JsonStore::new(dir.path());

        assert_eq!(store.substitutions_for_day("2025-11-12").unwrap()[0].subject, "D");
        assert_eq!(store.substitutions_for_day("wtorek").unwrap()[0].subject, "B");
        assert!(matches!(
            store.substitutions_for_day("piatek"),
            Err(StoreError::UnknownDay(day)) if day == "piatek"
        ));
    }

    #[test]
    fn test_timetables_listed_in_class_order() {
        let dir = tempfile::tempdir().unwrap();
        for class in ["10A", "2A", "1B"] {
            write(dir.path(), &format!("plany/{}.json", class), r#"{"poniedzialek": []}"#);
        }
        let store = JsonStore::new(dir.path());
        assert_eq!(store.list_timetables(), vec!["1B", "2A", "10A"]);
        assert_eq!(store.load_all_timetables().len(), 3);
    }

    #[test]
    fn test_unusual_class_name_is_not_loaded() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "secret.json", r#"{"poniedzialek": []}"#);
        let store = JsonStore::new(dir.path());
        assert!(store.load_timetable(&ClassName::new("../secret")).is_empty());
    }

    #[test]
    fn test_write_json_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        let path = store.write_json("nested/out.json", &vec![1, 2, 3]).unwrap();
        let back: Vec<i32> = store.load_json("nested/out.json");
        assert!(path.exists());
        assert_eq!(back, vec![1, 2, 3]);
    }

    #[test]
    fn test_plan_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        write(dir.path(), CLASSES_FILE, r#"{"1A": {}, "2B": {}}"#);
        write(
            dir.path(),
            SUBJECTS_FILE,
            r#"{"Matematyka": {"klasy": ["1A"], "godziny": 4, "lekcje_dziennie": 2}, "Plastyka": {"klasy": ["2B"]}}"#,
        );
        write(dir.path(), STAGES_FILE, r#"{"2": {"klasy": ["2B"]}}"#);
        write(dir.path(), SCHOOL_FILE, r#"{"nazwa": "ZSP", "godziny_szkolne": ["8:00-8:45"]}"#);

        let inputs = store.plan_inputs();
        assert_eq!(inputs.classes, vec!["1A", "2B"]);
        assert_eq!(inputs.days.len(), 5);
        assert_eq!(inputs.lesson_slots, vec!["8:00-8:45"]);
        assert_eq!(inputs.subjects["Matematyka"].weekly_hours, 4);
        assert_eq!(inputs.subjects["Matematyka"].daily_limit, 2);
        assert_eq!(inputs.subjects["Plastyka"].weekly_hours, 1);
        assert_eq!(inputs.subjects["Plastyka"].stages, None);
        assert_eq!(inputs.stages["2"].classes, vec!["2B"]);

        write(dir.path(), SUBSTITUTIONS_FILE, r#"{"poniedzialek": [], "wtorek": []}"#);
        assert_eq!(store.plan_inputs().days, vec!["poniedzialek", "wtorek"]);
    }

    #[test]
    fn test_write_timetable() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::new(dir.path());
        let mut plan = Timetable::new();
        plan.insert("poniedzialek".to_string(), Vec::new());

        store.write_timetable(&ClassName::new("1a"), &plan).unwrap();
        assert_eq!(store.list_timetables(), vec!["1A"]);
        assert_eq!(store.load_timetable(&ClassName::new("1A")), plan);

        let err = store.write_timetable(&ClassName::new("../x"), &plan).unwrap_err();
        assert!(matches!(err, StoreError::UnusualClassName(_)));
    }
}
