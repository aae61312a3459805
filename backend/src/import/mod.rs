//! Spreadsheet import pipeline: decode, validate, resolve, upsert, report.

pub mod draft;
pub mod jalali;
pub mod rejection;
pub mod report;
pub mod resolver;
pub mod sheet;
pub mod text;
pub mod upsert;
pub mod validator;

use crate::models::{ImportRow, ResolvedActivity};

use rejection::Rejection;
use resolver::{ActivityTypeTable, Roster};

/// Runs every row-local check and binds the row to the teacher's roster.
pub fn resolve_row(
    row: &ImportRow,
    roster: &Roster,
    types: &ActivityTypeTable,
) -> Result<ResolvedActivity, Rejection> {
    let valid = validator::validate(row, types)?;
    let activity_date = jalali::normalize(&valid.date).map_err(|_| Rejection::InvalidDate)?;

    let class = roster
        .find_class(&valid.class_name)
        .ok_or_else(|| Rejection::UnknownClass(valid.class_name.clone()))?;
    let student =
        roster.resolve_student_in_class(&valid.student_name, valid.national_id.as_deref(), class)?;
    let lesson = roster
        .find_lesson(&class.id, &valid.lesson_name)
        .ok_or_else(|| Rejection::LessonNotFound(valid.lesson_name.clone(), class.name.clone()))?;

    Ok(ResolvedActivity {
        school_id: roster.school_id.clone(),
        teacher_id: roster.teacher_id.clone(),
        student_id: student.id.clone(),
        class_id: class.id.clone(),
        lesson_id: lesson.lesson_id.clone(),
        activity_type: valid.activity_type,
        title: valid.title,
        activity_date,
        score: valid.score,
        qualitative: valid.qualitative,
    })
}
