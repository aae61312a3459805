//! Scoped entity resolution: students, classes, lessons and activity types.
//!
//! Every lookup runs against a [`Roster`] snapshot that only holds the
//! requesting teacher's classes, the students enrolled in them and the
//! lessons the teacher is assigned to.

use std::collections::BTreeMap;

use crate::models::{ActivityType, ActivityTypeLabel, Assignment, ClassRef, StudentRow};

use super::rejection::Rejection;
use super::text::{collapse_whitespace, fold_name, normalize_digits};

/// Minimum token-overlap fraction accepted by the last matching tier.
pub const OVERLAP_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, PartialEq)]
pub struct RosterStudent {
    pub id: String,
    pub full_name: String,
    pub national_id: Option<String>,
    pub class_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    NationalId,
    Exact,
    Normalized,
    TokenSubset,
    OverlapScore,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentMatch<'a> {
    pub student: &'a RosterStudent,
    pub tier: MatchTier,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<'a> {
    Found(StudentMatch<'a>),
    Ambiguous(usize),
    NotFound,
}

/// Pre-processed search name.
struct Query {
    lowered: String,
    folded: String,
    tokens: Vec<String>,
}

impl Query {
    fn new(name: &str) -> Self {
        let folded = fold_name(name);
        let tokens = folded.split(' ').filter(|t| !t.is_empty()).map(str::to_string).collect();
        Self {
            lowered: name.trim().to_lowercase(),
            folded,
            tokens,
        }
    }
}

enum TierResult<'a> {
    None,
    One(&'a RosterStudent, f64),
    Many(usize),
}

type Matcher = for<'a> fn(&Query, &[&'a RosterStudent]) -> TierResult<'a>;

const TIERS: [(MatchTier, Matcher); 4] = [
    (MatchTier::Exact, exact_match),
    (MatchTier::Normalized, normalized_match),
    (MatchTier::TokenSubset, token_subset_match),
    (MatchTier::OverlapScore, overlap_score_match),
];

fn collect<'a>(hits: Vec<&'a RosterStudent>) -> TierResult<'a> {
    match hits.as_slice() {
        [] => TierResult::None,
        [one] => TierResult::One(*one, 1.0),
        many => TierResult::Many(many.len()),
    }
}

fn exact_match<'a>(query: &Query, candidates: &[&'a RosterStudent]) -> TierResult<'a> {
    collect(
        candidates
            .iter()
            .copied()
            .filter(|c| c.full_name.trim().to_lowercase() == query.lowered)
            .collect(),
    )
}

fn normalized_match<'a>(query: &Query, candidates: &[&'a RosterStudent]) -> TierResult<'a> {
    collect(
        candidates
            .iter()
            .copied()
            .filter(|c| fold_name(&c.full_name) == query.folded)
            .collect(),
    )
}

fn token_subset_match<'a>(query: &Query, candidates: &[&'a RosterStudent]) -> TierResult<'a> {
    collect(
        candidates
            .iter()
            .copied()
            .filter(|c| {
                let folded = fold_name(&c.full_name);
                let tokens: Vec<&str> = folded.split(' ').collect();
                query
                    .tokens
                    .iter()
                    .all(|q| tokens.iter().any(|t| t.contains(q.as_str())))
            })
            .collect(),
    )
}

fn overlap_score_match<'a>(query: &Query, candidates: &[&'a RosterStudent]) -> TierResult<'a> {
    let mut best: Option<(&'a RosterStudent, f64)> = None;
    for candidate in candidates.iter().copied() {
        let folded = fold_name(&candidate.full_name);
        let hits = query
            .tokens
            .iter()
            .filter(|q| folded.contains(q.as_str()))
            .count();
        let score = hits as f64 / query.tokens.len() as f64;
        best = match best {
            Some((current, s))
                if s > score || (s == score && current.id <= candidate.id) =>
            {
                Some((current, s))
            }
            _ => Some((candidate, score)),
        };
    }
    match best {
        Some((student, score)) if score >= OVERLAP_THRESHOLD => TierResult::One(student, score),
        _ => TierResult::None,
    }
}

const NATIONAL_ID_LEN: usize = 10;

/// Keeps the digits only. Shorter ids are left-padded with zeros, since a
/// spreadsheet cell holding the id as a number drops its leading zeros.
fn normalize_national_id(raw: &str) -> String {
    let digits: String = normalize_digits(raw)
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() || digits.len() >= NATIONAL_ID_LEN {
        return digits;
    }
    format!("{:0>width$}", digits, width = NATIONAL_ID_LEN)
}

/// Finds a student by national id (when given) or by name, among `candidates`.
///
/// Tiers run in order; the first one that produces a result decides.
/// A tier that yields several candidates stops the search with `Ambiguous`.
/// It deliberately does not fall through to a looser tier; the row has to
/// carry a national id instead.
pub fn find_student<'a>(
    name: &str,
    national_id: Option<&str>,
    candidates: &[&'a RosterStudent],
) -> Resolution<'a> {
    if let Some(wanted) = national_id.map(normalize_national_id).filter(|n| !n.is_empty()) {
        let hits: Vec<&RosterStudent> = candidates
            .iter()
            .copied()
            .filter(|c| c.national_id.as_deref().map(normalize_national_id) == Some(wanted.clone()))
            .collect();
        if let [student] = hits.as_slice() {
            return Resolution::Found(StudentMatch {
                student: *student,
                tier: MatchTier::NationalId,
                score: 1.0,
            });
        }
    }

    let query = Query::new(name);
    if query.tokens.is_empty() {
        return Resolution::NotFound;
    }

    for (tier, matcher) in TIERS {
        match matcher(&query, candidates) {
            TierResult::None => continue,
            TierResult::One(student, score) => {
                return Resolution::Found(StudentMatch {
                    student,
                    tier,
                    score,
                });
            }
            TierResult::Many(count) => return Resolution::Ambiguous(count),
        }
    }
    Resolution::NotFound
}

/// Label → activity type lookup for one school.
#[derive(Debug, Clone)]
pub struct ActivityTypeTable {
    entries: Vec<(String, ActivityType)>,
}

fn label_key(label: &str) -> String {
    fold_name(label).replace(' ', "")
}

impl ActivityTypeTable {
    pub fn defaults() -> Self {
        Self {
            entries: ActivityType::ALL
                .into_iter()
                .map(|t| (t.default_label().to_string(), t))
                .collect(),
        }
    }

    /// Uses the school's own labels, or the built-in ones when it has none.
    pub fn for_school(rows: Vec<ActivityTypeLabel>) -> Self {
        let entries: Vec<(String, ActivityType)> = rows
            .into_iter()
            .filter_map(|row| {
                let activity_type = row.activity_type.parse::<ActivityType>().ok()?;
                Some((row.label, activity_type))
            })
            .collect();
        if entries.is_empty() {
            Self::defaults()
        } else {
            Self { entries }
        }
    }

    /// Accepts a canonical key or a display label.
    pub fn resolve(&self, label: &str) -> Option<ActivityType> {
        if let Ok(activity_type) = label.parse::<ActivityType>() {
            return Some(activity_type);
        }
        let wanted = label_key(label);
        self.entries
            .iter()
            .find(|(l, _)| label_key(l) == wanted)
            .map(|(_, t)| *t)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, ActivityType)> {
        self.entries.iter().map(|(l, t)| (l.as_str(), *t))
    }

    pub fn label_for(&self, activity_type: ActivityType) -> String {
        self.entries
            .iter()
            .find(|(_, t)| *t == activity_type)
            .map(|(l, _)| l.clone())
            .unwrap_or_else(|| activity_type.default_label().to_string())
    }
}

/// Read-only snapshot of what one teacher may see.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    pub teacher_id: String,
    pub school_id: String,
    pub classes: Vec<ClassRef>,
    pub students: Vec<RosterStudent>,
    pub assignments: Vec<Assignment>,
}

impl Roster {
    pub fn new(
        teacher_id: &str,
        school_id: &str,
        classes: Vec<ClassRef>,
        student_rows: Vec<StudentRow>,
        assignments: Vec<Assignment>,
    ) -> Self {
        let mut grouped: BTreeMap<String, RosterStudent> = BTreeMap::new();
        for row in student_rows {
            grouped
                .entry(row.id.clone())
                .or_insert_with(|| RosterStudent {
                    id: row.id,
                    full_name: row.full_name,
                    national_id: row.national_id,
                    class_ids: Vec::new(),
                })
                .class_ids
                .push(row.class_id);
        }
        Self {
            teacher_id: teacher_id.to_string(),
            school_id: school_id.to_string(),
            classes,
            students: grouped.into_values().collect(),
            assignments,
        }
    }

    pub fn find_class(&self, name: &str) -> Option<&ClassRef> {
        let wanted = collapse_whitespace(name);
        self.classes
            .iter()
            .find(|c| collapse_whitespace(&c.name) == wanted)
    }

    pub fn class_by_id(&self, id: &str) -> Option<&ClassRef> {
        self.classes.iter().find(|c| c.id == id)
    }

    pub fn student_by_id(&self, id: &str) -> Option<&RosterStudent> {
        self.students.iter().find(|s| s.id == id)
    }

    pub fn all_students(&self) -> Vec<&RosterStudent> {
        self.students.iter().collect()
    }

    pub fn students_in_class(&self, class_id: &str) -> Vec<&RosterStudent> {
        self.students
            .iter()
            .filter(|s| s.class_ids.iter().any(|c| c == class_id))
            .collect()
    }

    /// Exact (title, class) lookup among the teacher's assignments.
    pub fn find_lesson(&self, class_id: &str, title: &str) -> Option<&Assignment> {
        let wanted = collapse_whitespace(title);
        self.assignments
            .iter()
            .find(|a| a.class_id == class_id && collapse_whitespace(&a.lesson_title) == wanted)
    }

    pub fn lessons_in_class(&self, class_id: &str) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.class_id == class_id)
            .collect()
    }

    pub fn is_assigned(&self, class_id: &str, lesson_id: &str) -> bool {
        self.assignments
            .iter()
            .any(|a| a.class_id == class_id && a.lesson_id == lesson_id)
    }

    /// Resolves a student among the members of `class`, explaining failures.
    pub fn resolve_student_in_class(
        &self,
        name: &str,
        national_id: Option<&str>,
        class: &ClassRef,
    ) -> Result<&RosterStudent, Rejection> {
        match find_student(name, national_id, &self.students_in_class(&class.id)) {
            Resolution::Found(found) => Ok(found.student),
            Resolution::Ambiguous(_) => Err(Rejection::StudentAmbiguous(name.to_string())),
            Resolution::NotFound => match find_student(name, national_id, &self.all_students()) {
                Resolution::Found(_) => Err(Rejection::StudentNotInClass(
                    name.to_string(),
                    class.name.clone(),
                )),
                _ => Err(Rejection::StudentNotFound(name.to_string())),
            },
        }
    }
}
