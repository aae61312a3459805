mod common;

use rust_xlsxwriter::Workbook;
use school_backend::error::AppError;
use school_backend::models::{ActivityRecord, RowStatus};
use school_backend::services::ImportService;

use common::{TEACHER_A, TEACHER_B, count_activities, example_row, setup_db, teacher};

async fn fetch_all(pool: &sqlx::SqlitePool) -> Vec<ActivityRecord> {
    sqlx::query_as::<_, ActivityRecord>("SELECT * FROM activities ORDER BY student_id")
        .fetch_all(pool)
        .await
        .expect("Failed to fetch activities")
}

#[tokio::test]
async fn example_row_is_added_with_gregorian_date() {
    let pool = setup_db().await;
    let service = ImportService::new(pool.clone());

    let response = service
        .import_rows(&teacher(TEACHER_A), vec![example_row(2)])
        .await
        .expect("import failed");

    assert!(response.success);
    assert_eq!(response.summary.added, 1);
    assert_eq!(response.summary.failed, 0);
    assert_eq!(response.results[0].status, RowStatus::Added);
    assert_eq!(response.results[0].student_name.as_deref(), Some("علی رضایی"));

    let rows = fetch_all(&pool).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].student_id, "st-1");
    assert_eq!(rows[0].activity_date, "2025-03-27");
    assert_eq!(rows[0].activity_type, "midterm_exam");
    assert_eq!(rows[0].score, Some(18.0));
    assert_eq!(rows[0].teacher_id, TEACHER_A);
}

#[tokio::test]
async fn importing_the_same_batch_twice_only_updates() {
    let pool = setup_db().await;
    let service = ImportService::new(pool.clone());
    let batch = || {
        let mut other = example_row(3);
        other.student_name = Some("مریم احمدی".to_string());
        other.score = Some("15.5".to_string());
        vec![example_row(2), other]
    };

    let first = service.import_rows(&teacher(TEACHER_A), batch()).await.unwrap();
    assert_eq!(first.summary.added, 2);
    let created: Vec<String> = fetch_all(&pool).await.into_iter().map(|r| r.created_at).collect();

    let second = service.import_rows(&teacher(TEACHER_A), batch()).await.unwrap();
    assert_eq!(second.summary.added, 0);
    assert_eq!(second.summary.updated, 2);
    assert_eq!(count_activities(&pool).await, 2);

    let after: Vec<String> = fetch_all(&pool).await.into_iter().map(|r| r.created_at).collect();
    assert_eq!(created, after);
}

#[tokio::test]
async fn out_of_range_score_is_reported_with_its_row_number() {
    let pool = setup_db().await;
    let service = ImportService::new(pool.clone());
    let mut row = example_row(2);
    row.score = Some("25".to_string());

    let response = service.import_rows(&teacher(TEACHER_A), vec![row]).await.unwrap();

    assert!(response.success);
    assert_eq!(response.summary.added, 0);
    assert_eq!(response.summary.updated, 0);
    assert_eq!(response.summary.failed, 1);
    assert_eq!(response.results[0].status, RowStatus::Rejected);
    assert!(response.errors[0].starts_with("ردیف 2:"));
    assert!(response.errors[0].contains("نمره نامعتبر"));
    assert_eq!(count_activities(&pool).await, 0);
}

#[tokio::test]
async fn rejected_rows_do_not_stop_the_batch() {
    let pool = setup_db().await;
    let service = ImportService::new(pool.clone());
    let mut bad_date = example_row(3);
    bad_date.date = Some("1404/02/32".to_string());
    let mut missing_class = example_row(4);
    missing_class.class_name = None;
    let mut good = example_row(5);
    good.student_name = Some("مریم احمدی".to_string());

    let response = service
        .import_rows(&teacher(TEACHER_A), vec![bad_date, missing_class, good])
        .await
        .unwrap();

    assert_eq!(response.summary.total, 3);
    assert_eq!(response.summary.added, 1);
    assert_eq!(response.summary.failed, 2);
    assert!(response.errors[0].starts_with("ردیف 3:"));
    assert!(response.errors[1].starts_with("ردیف 4:"));
    assert_eq!(response.results[2].row, 5);
}

#[tokio::test]
async fn exact_name_wins_over_longer_name_in_the_same_class() {
    let pool = setup_db().await;
    let service = ImportService::new(pool.clone());

    service.import_rows(&teacher(TEACHER_A), vec![example_row(2)]).await.unwrap();

    let rows = fetch_all(&pool).await;
    assert_eq!(rows[0].student_id, "st-1");
}

#[tokio::test]
async fn other_teachers_students_are_never_matched() {
    let pool = setup_db().await;
    let service = ImportService::new(pool.clone());

    // سارا کریمی is only in هفتم-ب, which belongs to teacher B.
    let mut in_own_class = example_row(2);
    in_own_class.student_name = Some("سارا کریمی".to_string());
    let mut in_foreign_class = example_row(3);
    in_foreign_class.student_name = Some("سارا کریمی".to_string());
    in_foreign_class.class_name = Some("هفتم-ب".to_string());

    let response = service
        .import_rows(&teacher(TEACHER_A), vec![in_own_class, in_foreign_class])
        .await
        .unwrap();
    assert_eq!(response.summary.failed, 2);
    assert_eq!(count_activities(&pool).await, 0);

    let mut for_b = example_row(2);
    for_b.student_name = Some("سارا کریمی".to_string());
    for_b.class_name = Some("هفتم-ب".to_string());
    let response = service.import_rows(&teacher(TEACHER_B), vec![for_b]).await.unwrap();
    assert_eq!(response.summary.added, 1);
}

#[tokio::test]
async fn corrected_lesson_updates_instead_of_duplicating() {
    let pool = setup_db().await;
    let service = ImportService::new(pool.clone());
    service.import_rows(&teacher(TEACHER_A), vec![example_row(2)]).await.unwrap();

    let mut corrected = example_row(2);
    corrected.lesson_name = Some("علوم".to_string());
    corrected.score = Some("19".to_string());
    let response = service.import_rows(&teacher(TEACHER_A), vec![corrected]).await.unwrap();

    assert_eq!(response.summary.updated, 1);
    let rows = fetch_all(&pool).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].lesson_id, "l-sci");
    assert_eq!(rows[0].score, Some(19.0));
}

#[tokio::test]
async fn qualitative_homework_without_score_is_accepted() {
    let pool = setup_db().await;
    let service = ImportService::new(pool.clone());
    let mut row = example_row(2);
    row.activity_type = Some("تکلیف کلاسی".to_string());
    row.score = None;
    row.qualitative = Some("بسیار خوب".to_string());

    let response = service.import_rows(&teacher(TEACHER_A), vec![row]).await.unwrap();

    assert_eq!(response.summary.added, 1);
    let rows = fetch_all(&pool).await;
    assert_eq!(rows[0].score, None);
    assert_eq!(rows[0].qualitative.as_deref(), Some("بسیار خوب"));
    assert_eq!(rows[0].title, "تکلیف کلاسی");
}

#[tokio::test]
async fn score_on_a_type_without_scores_is_rejected() {
    let pool = setup_db().await;
    let service = ImportService::new(pool.clone());
    let mut row = example_row(2);
    row.activity_type = Some("class_activity".to_string());
    row.score = Some("15".to_string());

    let response = service.import_rows(&teacher(TEACHER_A), vec![row]).await.unwrap();

    assert_eq!(response.summary.added, 0);
    assert_eq!(response.summary.failed, 1);
    assert_eq!(response.results[0].status, RowStatus::Rejected);
    assert!(response.errors[0].starts_with("ردیف 2:"));
    assert!(response.errors[0].contains("نمره کمی مجاز نیست"));
    assert_eq!(count_activities(&pool).await, 0);
}

#[tokio::test]
async fn school_labels_replace_the_defaults() {
    let pool = setup_db().await;
    sqlx::query(
        "INSERT INTO school_activity_types (school_id, label, activity_type) VALUES ('sch-1', 'امتحان نیم‌سال', 'midterm_exam')",
    )
    .execute(&pool)
    .await
    .unwrap();
    let service = ImportService::new(pool.clone());
    let mut custom = example_row(2);
    custom.activity_type = Some("امتحان نیم‌سال".to_string());
    let default_label = example_row(3);

    let response = service
        .import_rows(&teacher(TEACHER_A), vec![custom, default_label])
        .await
        .unwrap();

    assert_eq!(response.results[0].status, RowStatus::Added);
    assert_eq!(response.results[1].status, RowStatus::Rejected);
}

#[tokio::test]
async fn xlsx_upload_is_imported_with_sheet_row_numbers() {
    let pool = setup_db().await;
    let service = ImportService::new(pool.clone());

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let headers = ["ردیف", "نام دانش‌آموز", "کلاس", "درس", "نوع فعالیت", "تاریخ", "نمره کمی"];
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    sheet.write_number(1, 0, 1.0).unwrap();
    sheet.write_string(1, 1, "علی رضایی").unwrap();
    sheet.write_string(1, 2, "هفتم-الف").unwrap();
    sheet.write_string(1, 3, "ریاضی").unwrap();
    sheet.write_string(1, 4, "آزمون میان‌ترم").unwrap();
    sheet.write_string(1, 5, "۱۴۰۴/۰۱/۰۷").unwrap();
    sheet.write_number(1, 6, 18.0).unwrap();
    // Row 3 left blank on purpose.
    sheet.write_number(3, 0, 2.0).unwrap();
    sheet.write_string(3, 1, "مریم احمدی").unwrap();
    sheet.write_string(3, 2, "هفتم-الف").unwrap();
    sheet.write_string(3, 3, "ریاضی").unwrap();
    sheet.write_string(3, 4, "آزمون میان‌ترم").unwrap();
    sheet.write_string(3, 5, "1404/01/07").unwrap();
    sheet.write_number(3, 6, 20.01).unwrap();
    let bytes = workbook.save_to_buffer().unwrap();

    let response = service
        .import_file(&teacher(TEACHER_A), "نمرات.xlsx", bytes)
        .await
        .unwrap();

    assert_eq!(response.summary.total, 2);
    assert_eq!(response.summary.added, 1);
    assert_eq!(response.results[0].row, 2);
    assert!(response.errors[0].starts_with("ردیف 4:"));
}

#[tokio::test]
async fn numeric_national_id_cell_picks_between_namesakes() {
    let pool = setup_db().await;
    sqlx::query("INSERT INTO students (id, school_id, full_name, national_id) VALUES ('st-9', 'sch-1', 'علی رضایی', NULL)")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO class_students (class_id, student_id) VALUES ('c-7a', 'st-9')")
        .execute(&pool)
        .await
        .unwrap();
    let service = ImportService::new(pool.clone());

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let headers = ["نام دانش‌آموز", "کد ملی", "کلاس", "درس", "نوع فعالیت", "تاریخ", "نمره کمی"];
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    sheet.write_string(1, 0, "علی رضایی").unwrap();
    sheet.write_number(1, 1, 12345678.0).unwrap();
    sheet.write_string(1, 2, "هفتم-الف").unwrap();
    sheet.write_string(1, 3, "ریاضی").unwrap();
    sheet.write_string(1, 4, "آزمون میان‌ترم").unwrap();
    sheet.write_string(1, 5, "1404/01/07").unwrap();
    sheet.write_number(1, 6, 18.0).unwrap();
    let bytes = workbook.save_to_buffer().unwrap();

    let response = service
        .import_file(&teacher(TEACHER_A), "نمرات.xlsx", bytes)
        .await
        .unwrap();

    assert_eq!(response.summary.added, 1, "errors: {:?}", response.errors);
    let rows = fetch_all(&pool).await;
    assert_eq!(rows[0].student_id, "st-1");
}

#[tokio::test]
async fn unreadable_or_unsupported_files_fail_the_request() {
    let pool = setup_db().await;
    let service = ImportService::new(pool.clone());

    let garbage = service
        .import_file(&teacher(TEACHER_A), "grades.xlsx", b"not a zip".to_vec())
        .await;
    assert!(matches!(garbage, Err(AppError::InvalidSpreadsheet(_))));

    let pdf = service
        .import_file(&teacher(TEACHER_A), "grades.pdf", b"%PDF".to_vec())
        .await;
    assert!(matches!(pdf, Err(AppError::BadRequest(_))));

    let no_headers = service
        .import_file(&teacher(TEACHER_A), "grades.csv", "a,b\n1,2\n".as_bytes().to_vec())
        .await;
    assert!(matches!(no_headers, Err(AppError::InvalidSpreadsheet(_))));
}
