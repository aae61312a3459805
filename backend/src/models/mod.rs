pub mod activity;
pub mod extraction;
pub mod import;
pub mod roster;
pub mod session;

pub use activity::{
    ActivityFilter, ActivityListItem, ActivityRecord, ActivityType, ActivityTypeInfo, FieldRules,
    ResolvedActivity, SaveActivityRequest, SaveActivityResponse, ScoreRule, UpsertOutcome,
};
pub use extraction::{
    ActivityDraft, ClassOption, DraftStudent, ExtractRequest, ExtractResponse, LessonOption,
    Selection,
};
pub use import::{BatchSummary, ImportResponse, ImportRow, RowOutcome, RowStatus};
pub use roster::{ActivityTypeLabel, Assignment, ClassRef, StudentRow};
pub use session::SessionRow;
