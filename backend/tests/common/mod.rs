#![allow(dead_code)]

use chrono::{Duration, Utc};
use school_backend::auth::{Identity, Role};
use school_backend::db::MIGRATOR;
use school_backend::models::ImportRow;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

pub const TEACHER_A: &str = "t-a";
pub const TEACHER_B: &str = "t-b";
pub const SCHOOL: &str = "sch-1";

pub async fn setup_db() -> SqlitePool {
    // One connection so every query sees the same in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create database");
    MIGRATOR.run(&pool).await.expect("Failed to run migrations");
    seed(&pool).await;
    pool
}

async fn exec(pool: &SqlitePool, sql: &str) {
    sqlx::query(sql)
        .execute(pool)
        .await
        .unwrap_or_else(|e| panic!("seed failed: {e}\n{sql}"));
}

async fn seed(pool: &SqlitePool) {
    exec(pool, "INSERT INTO schools (id, name) VALUES ('sch-1', 'دبیرستان نمونه'), ('sch-2', 'دبیرستان دیگر')").await;
    exec(
        pool,
        r#"
        INSERT INTO users (id, school_id, name, role) VALUES
            ('t-a', 'sch-1', 'خانم محمدی', 'teacher'),
            ('t-b', 'sch-1', 'آقای کاظمی', 'teacher'),
            ('p-1', 'sch-1', 'آقای مدیر', 'principal'),
            ('t-x', 'sch-2', 'معلم مدرسه دیگر', 'teacher')
        "#,
    )
    .await;
    exec(
        pool,
        r#"
        INSERT INTO classes (id, school_id, name, grade) VALUES
            ('c-7a', 'sch-1', 'هفتم-الف', 'هفتم'),
            ('c-7b', 'sch-1', 'هفتم-ب', 'هفتم'),
            ('c-x', 'sch-2', 'هفتم-الف', 'هفتم')
        "#,
    )
    .await;
    exec(
        pool,
        r#"
        INSERT INTO students (id, school_id, full_name, national_id) VALUES
            ('st-1', 'sch-1', 'علی رضایی', '0012345678'),
            ('st-2', 'sch-1', 'علی رضایی‌نژاد', NULL),
            ('st-3', 'sch-1', 'سارا کریمی', NULL),
            ('st-4', 'sch-1', 'مریم احمدی', NULL),
            ('st-x', 'sch-2', 'علی رضایی', NULL)
        "#,
    )
    .await;
    exec(
        pool,
        r#"
        INSERT INTO class_students (class_id, student_id) VALUES
            ('c-7a', 'st-1'), ('c-7a', 'st-2'), ('c-7a', 'st-4'),
            ('c-7b', 'st-3'),
            ('c-x', 'st-x')
        "#,
    )
    .await;
    exec(
        pool,
        "INSERT INTO lessons (id, school_id, title) VALUES ('l-math', 'sch-1', 'ریاضی'), ('l-sci', 'sch-1', 'علوم'), ('l-x', 'sch-2', 'ریاضی')",
    )
    .await;
    exec(
        pool,
        r#"
        INSERT INTO teacher_assignments (teacher_id, class_id, lesson_id) VALUES
            ('t-a', 'c-7a', 'l-math'),
            ('t-a', 'c-7a', 'l-sci'),
            ('t-b', 'c-7b', 'l-math'),
            ('t-x', 'c-x', 'l-x')
        "#,
    )
    .await;

    let future = (Utc::now() + Duration::days(1)).to_rfc3339();
    let past = (Utc::now() - Duration::days(1)).to_rfc3339();
    sqlx::query(
        r#"
        INSERT INTO sessions (token, user_id, expires_at) VALUES
            ('tok-a', 't-a', ?1),
            ('tok-b', 't-b', ?1),
            ('tok-p', 'p-1', ?1),
            ('tok-old', 't-a', ?2)
        "#,
    )
    .bind(&future)
    .bind(&past)
    .execute(pool)
    .await
    .expect("Failed to seed sessions");
}

pub fn teacher(user_id: &str) -> Identity {
    Identity {
        user_id: user_id.to_string(),
        school_id: SCHOOL.to_string(),
        role: Role::Teacher,
        name: "معلم".to_string(),
    }
}

/// The reference row: علی رضایی, هفتم-الف, ریاضی, midterm, 1404/01/07, 18.
pub fn example_row(row_number: usize) -> ImportRow {
    ImportRow {
        row_number,
        student_name: Some("علی رضایی".to_string()),
        class_name: Some("هفتم-الف".to_string()),
        lesson_name: Some("ریاضی".to_string()),
        activity_type: Some("آزمون میان‌ترم".to_string()),
        date: Some("1404/01/07".to_string()),
        score: Some("18".to_string()),
        ..ImportRow::default()
    }
}

pub async fn count_activities(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM activities")
        .fetch_one(pool)
        .await
        .expect("Failed to count activities")
}
