pub mod types;
pub mod collation;
pub mod reconcile;
pub mod grouping;
pub mod generator;
pub mod plans;

pub use types::{
    ClassName, SubstitutionDetail, SubstitutionRecord, SubstitutionsByDay, Teacher, Timetable,
    TimetableEntry,
};
pub use collation::PolishCollator;
pub use reconcile::{annotate_timetable, filter_substitutions_for_class};
pub use grouping::{group_for_display, group_substitutions_by_key, GroupMode, SubstitutionGroup};
pub use generator::{generate_substitutions, ClassPlans, SCHOOL_DAYS};
pub use plans::{generate_all_plans, PlanInputs};
