use sqlx::SqlitePool;
use tracing::debug;

use crate::auth::Identity;
use crate::db::repository;
use crate::error::AppError;
use crate::import::resolver::{ActivityTypeTable, Roster};

/// Lookup tables built once per request for the calling teacher.
pub struct TeacherContext {
    pub roster: Roster,
    pub types: ActivityTypeTable,
}

impl TeacherContext {
    pub async fn load(db: &SqlitePool, identity: &Identity) -> Result<Self, AppError> {
        let classes =
            repository::fetch_teacher_classes(db, &identity.school_id, &identity.user_id).await?;
        let students =
            repository::fetch_teacher_students(db, &identity.school_id, &identity.user_id).await?;
        let assignments = repository::fetch_teacher_assignments(db, &identity.user_id).await?;
        let labels = repository::fetch_activity_type_labels(db, &identity.school_id).await?;

        let roster = Roster::new(
            &identity.user_id,
            &identity.school_id,
            classes,
            students,
            assignments,
        );
        debug!(
            "roster for teacher {}: {} classes, {} students, {} assignments",
            identity.user_id,
            roster.classes.len(),
            roster.students.len(),
            roster.assignments.len()
        );

        Ok(Self {
            roster,
            types: ActivityTypeTable::for_school(labels),
        })
    }
}
