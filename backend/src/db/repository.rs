use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::models::{
    ActivityFilter, ActivityListItem, ActivityRecord, ActivityTypeLabel, Assignment, ClassRef,
    ResolvedActivity, SessionRow, StudentRow,
};

const ACTIVITY_COLUMNS: &str = "id, school_id, teacher_id, student_id, class_id, lesson_id, \
     activity_type, title, activity_date, score, qualitative, created_at, updated_at";

pub async fn find_session(db: &SqlitePool, token: &str) -> Result<Option<SessionRow>, sqlx::Error> {
    sqlx::query_as::<_, SessionRow>(
        r#"
        SELECT u.id AS user_id, u.school_id, u.role, u.name, s.expires_at
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.token = ?1
        "#,
    )
    .bind(token)
    .fetch_optional(db)
    .await
}

/// Classes the teacher holds at least one assignment in.
pub async fn fetch_teacher_classes(
    db: &SqlitePool,
    school_id: &str,
    teacher_id: &str,
) -> Result<Vec<ClassRef>, sqlx::Error> {
    sqlx::query_as::<_, ClassRef>(
        r#"
        SELECT DISTINCT c.id, c.name, c.grade
        FROM classes c
        JOIN teacher_assignments ta ON ta.class_id = c.id
        WHERE ta.teacher_id = ?1 AND c.school_id = ?2
        ORDER BY c.name
        "#,
    )
    .bind(teacher_id)
    .bind(school_id)
    .fetch_all(db)
    .await
}

/// One row per (student, class) enrollment within the teacher's classes.
pub async fn fetch_teacher_students(
    db: &SqlitePool,
    school_id: &str,
    teacher_id: &str,
) -> Result<Vec<StudentRow>, sqlx::Error> {
    sqlx::query_as::<_, StudentRow>(
        r#"
        SELECT s.id, s.full_name, s.national_id, cs.class_id
        FROM students s
        JOIN class_students cs ON cs.student_id = s.id
        WHERE s.school_id = ?2
          AND cs.class_id IN (
              SELECT class_id FROM teacher_assignments WHERE teacher_id = ?1
          )
        ORDER BY s.id, cs.class_id
        "#,
    )
    .bind(teacher_id)
    .bind(school_id)
    .fetch_all(db)
    .await
}

pub async fn fetch_teacher_assignments(
    db: &SqlitePool,
    teacher_id: &str,
) -> Result<Vec<Assignment>, sqlx::Error> {
    sqlx::query_as::<_, Assignment>(
        r#"
        SELECT ta.class_id, ta.lesson_id, l.title AS lesson_title
        FROM teacher_assignments ta
        JOIN lessons l ON l.id = ta.lesson_id
        WHERE ta.teacher_id = ?1
        ORDER BY ta.class_id, l.title
        "#,
    )
    .bind(teacher_id)
    .fetch_all(db)
    .await
}

pub async fn fetch_activity_type_labels(
    db: &SqlitePool,
    school_id: &str,
) -> Result<Vec<ActivityTypeLabel>, sqlx::Error> {
    sqlx::query_as::<_, ActivityTypeLabel>(
        "SELECT label, activity_type FROM school_activity_types WHERE school_id = ?1 ORDER BY label",
    )
    .bind(school_id)
    .fetch_all(db)
    .await
}

pub async fn find_activity_by_identity(
    conn: &mut SqliteConnection,
    student_id: &str,
    activity_date: &str,
    activity_type: &str,
    teacher_id: &str,
) -> Result<Option<ActivityRecord>, sqlx::Error> {
    sqlx::query_as::<_, ActivityRecord>(&format!(
        "SELECT {ACTIVITY_COLUMNS} FROM activities \
         WHERE student_id = ?1 AND activity_date = ?2 AND activity_type = ?3 AND teacher_id = ?4"
    ))
    .bind(student_id)
    .bind(activity_date)
    .bind(activity_type)
    .bind(teacher_id)
    .fetch_optional(conn)
    .await
}

pub async fn insert_activity(
    conn: &mut SqliteConnection,
    activity: &ResolvedActivity,
) -> Result<ActivityRecord, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO activities
            (id, school_id, teacher_id, student_id, class_id, lesson_id,
            activity_type, title, activity_date, score, qualitative, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
        "#,
    )
    .bind(&id)
    .bind(&activity.school_id)
    .bind(&activity.teacher_id)
    .bind(&activity.student_id)
    .bind(&activity.class_id)
    .bind(&activity.lesson_id)
    .bind(activity.activity_type.key())
    .bind(&activity.title)
    .bind(&activity.activity_date)
    .bind(activity.score)
    .bind(&activity.qualitative)
    .bind(&now)
    .execute(&mut *conn)
    .await?;

    Ok(ActivityRecord {
        id,
        school_id: activity.school_id.clone(),
        teacher_id: activity.teacher_id.clone(),
        student_id: activity.student_id.clone(),
        class_id: activity.class_id.clone(),
        lesson_id: activity.lesson_id.clone(),
        activity_type: activity.activity_type.key().to_string(),
        title: activity.title.clone(),
        activity_date: activity.activity_date.clone(),
        score: activity.score,
        qualitative: activity.qualitative.clone(),
        created_at: now.clone(),
        updated_at: now,
    })
}

/// Overwrites the mutable fields of an existing row, keeping id and created_at.
pub async fn update_activity(
    conn: &mut SqliteConnection,
    current: ActivityRecord,
    activity: &ResolvedActivity,
) -> Result<ActivityRecord, sqlx::Error> {
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE activities
        SET class_id = ?1,
            lesson_id = ?2,
            title = ?3,
            score = ?4,
            qualitative = ?5,
            updated_at = ?6
        WHERE id = ?7
        "#,
    )
    .bind(&activity.class_id)
    .bind(&activity.lesson_id)
    .bind(&activity.title)
    .bind(activity.score)
    .bind(&activity.qualitative)
    .bind(&now)
    .bind(&current.id)
    .execute(&mut *conn)
    .await?;

    Ok(ActivityRecord {
        class_id: activity.class_id.clone(),
        lesson_id: activity.lesson_id.clone(),
        title: activity.title.clone(),
        score: activity.score,
        qualitative: activity.qualitative.clone(),
        updated_at: now,
        ..current
    })
}

pub async fn fetch_activities(
    db: &SqlitePool,
    teacher_id: &str,
    filter: &ActivityFilter,
) -> Result<Vec<ActivityListItem>, sqlx::Error> {
    sqlx::query_as::<_, ActivityListItem>(
        r#"
        SELECT
            a.id, a.student_id, s.full_name AS student_name,
            a.class_id, c.name AS class_name,
            a.lesson_id, l.title AS lesson_title,
            a.activity_type, a.title, a.activity_date,
            a.score, a.qualitative, a.updated_at
        FROM activities a
        JOIN students s ON s.id = a.student_id
        JOIN classes c ON c.id = a.class_id
        JOIN lessons l ON l.id = a.lesson_id
        WHERE a.teacher_id = ?1
          AND (?2 IS NULL OR a.student_id = ?2)
          AND (?3 IS NULL OR a.activity_type = ?3)
          AND (?4 IS NULL OR a.activity_date >= ?4)
          AND (?5 IS NULL OR a.activity_date <= ?5)
        ORDER BY a.activity_date DESC, s.full_name
        "#,
    )
    .bind(teacher_id)
    .bind(&filter.student_id)
    .bind(&filter.activity_type)
    .bind(&filter.from)
    .bind(&filter.to)
    .fetch_all(db)
    .await
}
