use serde::{Deserialize, Serialize};

use super::activity::ActivityType;

/// Body of `POST /api/teacher/activities/extract`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractRequest {
    pub text: String,
    #[serde(default)]
    pub model_source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftStudent {
    pub id: String,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonOption {
    pub lesson_id: String,
    pub title: String,
}

/// A class of the student that the teacher teaches, with its lessons.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassOption {
    pub class_id: String,
    pub class_name: String,
    pub lessons: Vec<LessonOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub class_id: String,
    pub lesson_id: String,
}

/// Extracted record awaiting the teacher's confirmation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityDraft {
    pub student: Option<DraftStudent>,
    pub activity_type: Option<ActivityType>,
    pub activity_label: Option<String>,
    pub title: Option<String>,
    /// ISO `YYYY-MM-DD`.
    pub date: String,
    pub jalali_date: String,
    pub score: Option<f64>,
    pub qualitative: Option<String>,
    pub subject: Option<String>,
    pub options: Vec<ClassOption>,
    pub selected: Option<Selection>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub success: bool,
    pub model_source: String,
    pub draft: ActivityDraft,
}
