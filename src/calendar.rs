use chrono::{Datelike, NaiveDate};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

const MONTHS_PL: [&str; 12] = [
    "Styczeń", "Luty", "Marzec", "Kwiecień", "Maj", "Czerwiec",
    "Lipiec", "Sierpień", "Wrzesień", "Październik", "Listopad", "Grudzień",
];

const DAYS_PL: [&str; 7] = [
    "Niedziela", "Poniedziałek", "Wtorek", "Środa", "Czwartek", "Piątek", "Sobota",
];

/// A holiday is either one date or an inclusive `[from, to]` range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Holiday {
    Single(String),
    Range(Vec<String>),
}

impl Holiday {
    pub fn contains(&self, date: NaiveDate) -> bool {
        match self {
            Holiday::Single(day) => parse_date(day) == Some(date),
            Holiday::Range(bounds) => match bounds.as_slice() {
                [from, to] => match (parse_date(from), parse_date(to)) {
                    (Some(from), Some(to)) => from <= date && date <= to,
                    _ => false,
                },
                _ => false,
            },
        }
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Contents of `calendar.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolCalendar {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub opis: String,
    // holiday name -> date or range
    #[serde(default)]
    pub swieta: IndexMap<String, Holiday>,
}

impl SchoolCalendar {
    /// Name of the first holiday covering `date`, if any
    pub fn is_free_day(&self, date: NaiveDate) -> Option<&str> {
        self.swieta
            .iter()
            .find(|(_, holiday)| holiday.contains(date))
            .map(|(name, _)| name.as_str())
    }
}

/// Date information the pages use for the header clock and calendar panel
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarContext {
    pub iso: String,
    pub year: i32,
    // 0-based, January = 0
    pub month: u32,
    pub day: u32,
    // 0 = Sunday
    pub weekday: u32,
    pub months_pl: [&'static str; 12],
    pub days_pl: [&'static str; 7],
    pub is_free_today: bool,
    pub free_today_name: Option<String>,
    pub school_calendar: SchoolCalendar,
}

impl CalendarContext {
    pub fn for_date(date: NaiveDate, calendar: SchoolCalendar) -> Self {
        let free_today_name = calendar.is_free_day(date).map(str::to_string);
        CalendarContext {
            iso: date.format("%Y-%m-%d").to_string(),
            year: date.year(),
            month: date.month0(),
            day: date.day(),
            weekday: date.weekday().num_days_from_sunday(),
            months_pl: MONTHS_PL,
            days_pl: DAYS_PL,
            is_free_today: free_today_name.is_some(),
            free_today_name,
            school_calendar: calendar,
        }
    }
}
