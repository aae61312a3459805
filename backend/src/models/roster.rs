use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ClassRef {
    pub id: String,
    pub name: String,
    pub grade: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StudentRow {
    pub id: String,
    pub full_name: String,
    pub national_id: Option<String>,
    pub class_id: String,
}

/// A (class, lesson) pair the teacher is assigned to.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Assignment {
    pub class_id: String,
    pub lesson_id: String,
    pub lesson_title: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct ActivityTypeLabel {
    pub label: String,
    pub activity_type: String,
}
