use sqlx::SqliteConnection;
use tracing::debug;

use crate::db::repository;
use crate::models::{ActivityRecord, ResolvedActivity, UpsertOutcome};

/// Writes one resolved activity keyed on
/// (student, date, activity type, teacher). An existing row keeps its id and
/// creation time; everything else is overwritten.
pub async fn apply(
    conn: &mut SqliteConnection,
    activity: &ResolvedActivity,
) -> Result<(UpsertOutcome, ActivityRecord), sqlx::Error> {
    let existing = repository::find_activity_by_identity(
        &mut *conn,
        &activity.student_id,
        &activity.activity_date,
        activity.activity_type.key(),
        &activity.teacher_id,
    )
    .await?;

    match existing {
        Some(current) => {
            debug!("updating activity {} for student {}", current.id, activity.student_id);
            let record = repository::update_activity(conn, current, activity).await?;
            Ok((UpsertOutcome::Updated, record))
        }
        None => {
            let record = repository::insert_activity(conn, activity).await?;
            debug!("inserted activity {} for student {}", record.id, activity.student_id);
            Ok((UpsertOutcome::Added, record))
        }
    }
}
