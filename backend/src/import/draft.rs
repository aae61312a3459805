//! Turns a language-model reply into an [`ActivityDraft`] checked against the
//! teacher's roster and the activity-type rules.
//!
//! Nothing here fails on bad field values: they are dropped and reported as
//! warnings, so the teacher can fix them before saving.

use chrono::{Datelike, Days, NaiveDate};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{
    ActivityDraft, ActivityType, ClassOption, DraftStudent, LessonOption, ScoreRule, Selection,
};

use super::jalali::{InvalidDate, JalaliDate};
use super::resolver::{ActivityTypeTable, Resolution, Roster, RosterStudent, find_student};
use super::text::{fold_name, non_empty, normalize_digits};
use super::validator::parse_score;

#[derive(Debug, Error, PartialEq)]
pub enum DraftError {
    #[error("model reply contains no JSON object")]
    NoJson,

    #[error("model reply is not valid JSON: {0}")]
    Malformed(String),
}

/// Loosely typed fields as the model returned them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFields {
    pub student_name: Option<String>,
    pub activity_type: Option<String>,
    pub score: Option<String>,
    pub qualitative: Option<String>,
    pub subject: Option<String>,
    pub title: Option<String>,
    pub date: Option<String>,
}

/// Slice of `input` from the first `{` to its matching `}`.
pub fn extract_first_json_object(input: &str) -> Option<&str> {
    let start = input.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape = false;

    for (idx, c) in input[start..].char_indices() {
        if escape {
            escape = false;
            continue;
        }
        match c {
            '\\' if in_string => escape = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&input[start..=start + idx]);
                }
            }
            _ => {}
        }
    }
    None
}

fn field(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match object.get(*key)? {
        Value::String(s) => non_empty(Some(s.as_str())),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

pub fn parse_reply(reply: &str) -> Result<ExtractedFields, DraftError> {
    let json = extract_first_json_object(reply).ok_or(DraftError::NoJson)?;
    let value: Value =
        serde_json::from_str(json).map_err(|e| DraftError::Malformed(e.to_string()))?;
    let object = value.as_object().ok_or(DraftError::NoJson)?;

    Ok(ExtractedFields {
        student_name: field(object, &["student_name", "student"]),
        activity_type: field(object, &["activity_type", "type"]),
        score: field(object, &["score", "grade"]),
        qualitative: field(object, &["qualitative", "description"]),
        subject: field(object, &["subject", "lesson"]),
        title: field(object, &["title"]),
        date: field(object, &["date"]),
    })
}

/// Resolves relative day words and Jalali or ISO dates; absent means today.
pub fn infer_date(raw: Option<&str>, today: NaiveDate) -> Result<NaiveDate, InvalidDate> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(today);
    };
    let back = match raw {
        "امروز" => Some(0),
        "دیروز" => Some(1),
        "پریروز" => Some(2),
        _ => None,
    };
    if let Some(days) = back {
        return today.checked_sub_days(Days::new(days)).ok_or(InvalidDate);
    }

    let ascii = normalize_digits(raw);
    if let Ok(date) = NaiveDate::parse_from_str(&ascii, "%Y-%m-%d") {
        // Jalali years stay well below this for the foreseeable future.
        if date.year() >= 1700 {
            return Ok(date);
        }
    }
    JalaliDate::parse(&ascii)?.to_gregorian()
}

/// System prompt: today's date, the type vocabulary and the teacher's roster.
pub fn system_prompt(today: NaiveDate, roster: &Roster, types: &ActivityTypeTable) -> String {
    let labels: Vec<String> = types
        .entries()
        .map(|(label, t)| format!("{} ({})", label, t.key()))
        .collect();
    let students: Vec<&str> = roster.students.iter().map(|s| s.full_name.as_str()).collect();
    let mut lessons: Vec<&str> = roster
        .assignments
        .iter()
        .map(|a| a.lesson_title.as_str())
        .collect();
    lessons.sort_unstable();
    lessons.dedup();

    format!(
        "You extract one school activity record from a Persian teacher's note.\n\
         Today is {today} in the Jalali calendar.\n\
         Reply with a single JSON object with the keys \
         student_name, activity_type, score, qualitative, subject, title, date.\n\
         activity_type must be one of: {types}.\n\
         score is a number from 0 to 20. date is a Jalali YYYY/MM/DD date, or \
         امروز, دیروز or پریروز. Use null for anything not mentioned.\n\
         Known students: {students}.\n\
         Known subjects: {lessons}.",
        today = JalaliDate::from_gregorian(today),
        types = labels.join("، "),
        students = students.join("، "),
        lessons = lessons.join("، "),
    )
}

fn find_in_text<'a>(text: &str, roster: &'a Roster) -> Option<&'a RosterStudent> {
    let haystack = fold_name(text);
    let mut hits = roster
        .students
        .iter()
        .filter(|s| haystack.contains(&fold_name(&s.full_name)));
    let first = hits.next()?;
    hits.next().is_none().then_some(first)
}

fn resolve_student<'a>(
    fields: &ExtractedFields,
    text: &str,
    roster: &'a Roster,
) -> Option<&'a RosterStudent> {
    if let Some(name) = &fields.student_name {
        if let Resolution::Found(found) = find_student(name, None, &roster.all_students()) {
            return Some(found.student);
        }
    }
    find_in_text(text, roster)
}

fn class_options(student: &RosterStudent, roster: &Roster) -> Vec<ClassOption> {
    roster
        .classes
        .iter()
        .filter(|c| student.class_ids.contains(&c.id))
        .map(|c| ClassOption {
            class_id: c.id.clone(),
            class_name: c.name.clone(),
            lessons: roster
                .lessons_in_class(&c.id)
                .into_iter()
                .map(|a| LessonOption {
                    lesson_id: a.lesson_id.clone(),
                    title: a.lesson_title.clone(),
                })
                .collect(),
        })
        .filter(|o| !o.lessons.is_empty())
        .collect()
}

/// The single (class, lesson) pair matching `subject`, or the only pair there is.
fn preselect(options: &[ClassOption], subject: Option<&str>) -> Option<Selection> {
    let wanted = subject.map(fold_name);
    let wanted = wanted.as_ref();
    let candidates: Vec<Selection> = options
        .iter()
        .flat_map(|o| {
            o.lessons
                .iter()
                .filter(move |l| wanted.is_none_or(|w| &fold_name(&l.title) == w))
                .map(move |l| Selection {
                    class_id: o.class_id.clone(),
                    lesson_id: l.lesson_id.clone(),
                })
        })
        .collect();
    match candidates.as_slice() {
        [only] => Some(only.clone()),
        _ => None,
    }
}

pub fn build_draft(
    fields: ExtractedFields,
    text: &str,
    today: NaiveDate,
    roster: &Roster,
    types: &ActivityTypeTable,
) -> ActivityDraft {
    let mut warnings = Vec::new();

    let student = resolve_student(&fields, text, roster);
    if student.is_none() {
        warnings.push(match &fields.student_name {
            Some(name) => format!("دانش‌آموز «{}» در فهرست کلاس‌های شما یافت نشد", name),
            None => "نام دانش‌آموز در متن تشخیص داده نشد".to_string(),
        });
    }

    let activity_type: Option<ActivityType> = match &fields.activity_type {
        Some(raw) => {
            let resolved = types.resolve(raw);
            if resolved.is_none() {
                warnings.push(format!("نوع فعالیت «{}» شناخته نشد", raw));
            }
            resolved
        }
        None => {
            warnings.push("نوع فعالیت در متن تشخیص داده نشد".to_string());
            None
        }
    };
    let label = activity_type.map(|t| types.label_for(t));

    let mut score = match &fields.score {
        Some(raw) => match parse_score(raw) {
            Ok(score) => Some(score),
            Err(_) => {
                warnings.push(format!("نمره «{}» نامعتبر است و نادیده گرفته شد", raw));
                None
            }
        },
        None => None,
    };
    let mut qualitative = fields.qualitative.clone();

    if let (Some(t), Some(label)) = (activity_type, &label) {
        let rules = t.rules();
        if !rules.qualitative_allowed && qualitative.take().is_some() {
            warnings.push(format!("برای «{}» ارزشیابی کیفی مجاز نیست و حذف شد", label));
        }
        if rules.score == ScoreRule::Forbidden && score.take().is_some() {
            warnings.push(format!("برای «{}» نمره کمی مجاز نیست و حذف شد", label));
        }
        if rules.score == ScoreRule::Required && score.is_none() {
            warnings.push(format!("برای «{}» وارد کردن نمره کمی الزامی است", label));
        }
    }
    let date = match infer_date(fields.date.as_deref(), today) {
        Ok(date) => date,
        Err(_) => {
            warnings.push(format!(
                "تاریخ «{}» نامعتبر است؛ تاریخ امروز در نظر گرفته شد",
                fields.date.as_deref().unwrap_or_default()
            ));
            today
        }
    };

    let options = student
        .map(|s| class_options(s, roster))
        .unwrap_or_default();
    let selected = preselect(&options, fields.subject.as_deref());

    ActivityDraft {
        student: student.map(|s| DraftStudent {
            id: s.id.clone(),
            full_name: s.full_name.clone(),
        }),
        activity_type,
        title: fields.title.or_else(|| label.clone()),
        activity_label: label,
        date: date.format("%Y-%m-%d").to_string(),
        jalali_date: JalaliDate::from_gregorian(date).to_string(),
        score,
        qualitative,
        subject: fields.subject,
        options,
        selected,
        warnings,
    }
}
