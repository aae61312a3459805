use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Canonical activity-type vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    MidtermExam,
    FinalExam,
    MonthlyExam,
    WeeklyExam,
    ClassActivity,
    ClassHomework,
    HomeHomework,
}

/// Whether a quantitative score must be supplied or must be left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreRule {
    Required,
    Forbidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldRules {
    pub score: ScoreRule,
    pub qualitative_allowed: bool,
}

impl ActivityType {
    pub const ALL: [ActivityType; 7] = [
        ActivityType::MidtermExam,
        ActivityType::FinalExam,
        ActivityType::MonthlyExam,
        ActivityType::WeeklyExam,
        ActivityType::ClassActivity,
        ActivityType::ClassHomework,
        ActivityType::HomeHomework,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ActivityType::MidtermExam => "midterm_exam",
            ActivityType::FinalExam => "final_exam",
            ActivityType::MonthlyExam => "monthly_exam",
            ActivityType::WeeklyExam => "weekly_exam",
            ActivityType::ClassActivity => "class_activity",
            ActivityType::ClassHomework => "class_homework",
            ActivityType::HomeHomework => "home_homework",
        }
    }

    /// Built-in display label, used when a school has no custom mapping.
    pub fn default_label(self) -> &'static str {
        match self {
            ActivityType::MidtermExam => "آزمون میان‌ترم",
            ActivityType::FinalExam => "آزمون پایان‌ترم",
            ActivityType::MonthlyExam => "آزمون ماهانه",
            ActivityType::WeeklyExam => "آزمون هفتگی",
            ActivityType::ClassActivity => "فعالیت کلاسی",
            ActivityType::ClassHomework => "تکلیف کلاسی",
            ActivityType::HomeHomework => "تکلیف منزل",
        }
    }

    /// Fixed field-applicability table. Not configurable per school.
    pub fn rules(self) -> FieldRules {
        match self {
            ActivityType::MidtermExam
            | ActivityType::FinalExam
            | ActivityType::MonthlyExam
            | ActivityType::WeeklyExam => FieldRules {
                score: ScoreRule::Required,
                qualitative_allowed: false,
            },
            ActivityType::ClassActivity
            | ActivityType::ClassHomework
            | ActivityType::HomeHomework => FieldRules {
                score: ScoreRule::Forbidden,
                qualitative_allowed: true,
            },
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ActivityType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityType::ALL
            .into_iter()
            .find(|t| t.key() == s.trim())
            .ok_or(())
    }
}

/// Persisted activity row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActivityRecord {
    pub id: String,
    pub school_id: String,
    pub teacher_id: String,
    pub student_id: String,
    pub class_id: String,
    pub lesson_id: String,
    pub activity_type: String,
    pub title: String,
    pub activity_date: String,
    pub score: Option<f64>,
    pub qualitative: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Validated, identifier-bound activity ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedActivity {
    pub school_id: String,
    pub teacher_id: String,
    pub student_id: String,
    pub class_id: String,
    pub lesson_id: String,
    pub activity_type: ActivityType,
    pub title: String,
    /// ISO `YYYY-MM-DD`.
    pub activity_date: String,
    pub score: Option<f64>,
    pub qualitative: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Added,
    Updated,
}

/// Body of `POST /api/teacher/activities`.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveActivityRequest {
    pub student_id: String,
    pub class_id: String,
    pub lesson_id: String,
    pub activity_type: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Jalali date string, or ISO when the client already converted it.
    pub date: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub qualitative: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SaveActivityResponse {
    pub success: bool,
    pub outcome: UpsertOutcome,
    pub activity: ActivityRecord,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityFilter {
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub activity_type: Option<String>,
    /// Inclusive ISO lower bound.
    #[serde(default)]
    pub from: Option<String>,
    /// Inclusive ISO upper bound.
    #[serde(default)]
    pub to: Option<String>,
}

/// Row returned by the activity listing, joined with display names.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ActivityListItem {
    pub id: String,
    pub student_id: String,
    pub student_name: String,
    pub class_id: String,
    pub class_name: String,
    pub lesson_id: String,
    pub lesson_title: String,
    pub activity_type: String,
    pub title: String,
    pub activity_date: String,
    pub score: Option<f64>,
    pub qualitative: Option<String>,
    pub updated_at: String,
    #[sqlx(skip)]
    pub jalali_date: String,
}

#[derive(Debug, Serialize)]
pub struct ActivityTypeInfo {
    pub key: ActivityType,
    pub label: String,
    pub rules: FieldRules,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip_through_from_str() {
        for t in ActivityType::ALL {
            assert_eq!(t.key().parse::<ActivityType>(), Ok(t));
        }
        assert!("quiz".parse::<ActivityType>().is_err());
    }

    #[test]
    fn exams_require_score_and_homework_takes_text_only() {
        assert_eq!(ActivityType::MidtermExam.rules().score, ScoreRule::Required);
        assert!(!ActivityType::FinalExam.rules().qualitative_allowed);
        let homework = ActivityType::ClassHomework.rules();
        assert_eq!(homework.score, ScoreRule::Forbidden);
        assert!(homework.qualitative_allowed);
    }
}
