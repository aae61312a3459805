//! Row-local validation: required fields, score range and the fixed
//! activity-type field applicability table.

use crate::models::{ActivityType, ImportRow, ScoreRule};

use super::rejection::{Rejection, RequiredField};
use super::resolver::ActivityTypeTable;
use super::text::{non_empty, normalize_digits};

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 20.0;

/// A row whose fields are present and well-formed, not yet bound to ids.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidRow {
    pub row_number: usize,
    pub student_name: String,
    pub national_id: Option<String>,
    pub class_name: String,
    pub lesson_name: String,
    pub activity_type: ActivityType,
    pub title: String,
    pub date: String,
    pub score: Option<f64>,
    pub qualitative: Option<String>,
}

fn required(value: &Option<String>, field: RequiredField) -> Result<String, Rejection> {
    non_empty(value.as_deref()).ok_or(Rejection::MissingField(field))
}

pub fn parse_score(raw: &str) -> Result<f64, Rejection> {
    let cleaned = normalize_digits(raw.trim()).replace(['٫', ','], ".");
    let score = cleaned.parse::<f64>().map_err(|_| Rejection::InvalidScore)?;
    check_score(score)
}

pub fn check_score(score: f64) -> Result<f64, Rejection> {
    if score.is_finite() && (MIN_SCORE..=MAX_SCORE).contains(&score) {
        Ok(score)
    } else {
        Err(Rejection::InvalidScore)
    }
}

/// Enforces which of score / qualitative text the activity type accepts.
pub fn check_applicability(
    activity_type: ActivityType,
    label: &str,
    score: Option<f64>,
    qualitative: Option<&str>,
) -> Result<(), Rejection> {
    let rules = activity_type.rules();
    match (rules.score, score) {
        (ScoreRule::Required, None) => return Err(Rejection::ScoreRequired(label.to_string())),
        (ScoreRule::Forbidden, Some(_)) => {
            return Err(Rejection::ScoreNotAllowed(label.to_string()));
        }
        _ => {}
    }
    if !rules.qualitative_allowed && qualitative.is_some() {
        return Err(Rejection::QualitativeNotAllowed(label.to_string()));
    }
    Ok(())
}

pub fn validate(row: &ImportRow, types: &ActivityTypeTable) -> Result<ValidRow, Rejection> {
    let student_name = required(&row.student_name, RequiredField::StudentName)?;
    let class_name = required(&row.class_name, RequiredField::ClassName)?;
    let lesson_name = required(&row.lesson_name, RequiredField::LessonName)?;
    let type_label = required(&row.activity_type, RequiredField::ActivityType)?;
    let date = required(&row.date, RequiredField::Date)?;

    let activity_type = types
        .resolve(&type_label)
        .ok_or_else(|| Rejection::UnknownActivityType(type_label.clone()))?;

    let score = non_empty(row.score.as_deref())
        .map(|raw| parse_score(&raw))
        .transpose()?;
    let qualitative = non_empty(row.qualitative.as_deref());

    let label = types.label_for(activity_type);
    check_applicability(activity_type, &label, score, qualitative.as_deref())?;

    let title = non_empty(row.title.as_deref()).unwrap_or(label);

    Ok(ValidRow {
        row_number: row.row_number,
        student_name,
        national_id: non_empty(row.national_id.as_deref()),
        class_name,
        lesson_name,
        activity_type,
        title,
        date,
        score,
        qualitative,
    })
}
