use chrono::Local;
use sqlx::SqlitePool;
use tracing::info;

use crate::auth::Identity;
use crate::db::repository;
use crate::error::AppError;
use crate::import::draft::infer_date;
use crate::import::jalali::iso_to_jalali;
use crate::import::rejection::Rejection;
use crate::import::resolver::ActivityTypeTable;
use crate::import::text::non_empty;
use crate::import::upsert;
use crate::import::validator::{check_applicability, check_score};
use crate::models::{
    ActivityFilter, ActivityListItem, ActivityTypeInfo, ResolvedActivity, SaveActivityRequest,
    SaveActivityResponse,
};

use super::context::TeacherContext;

pub struct ActivityService {
    db: SqlitePool,
}

fn to_iso(raw: &str) -> Result<String, Rejection> {
    infer_date(Some(raw), Local::now().date_naive())
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| Rejection::InvalidDate)
}

impl ActivityService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Saves one confirmed record through the same rules as a spreadsheet row.
    pub async fn save(
        &self,
        identity: &Identity,
        req: SaveActivityRequest,
    ) -> Result<SaveActivityResponse, AppError> {
        let context = TeacherContext::load(&self.db, identity).await?;
        let roster = &context.roster;

        let activity_type = context
            .types
            .resolve(&req.activity_type)
            .ok_or_else(|| Rejection::UnknownActivityType(req.activity_type.clone()))?;
        let label = context.types.label_for(activity_type);

        let class = roster
            .class_by_id(&req.class_id)
            .ok_or_else(|| Rejection::UnknownClass(req.class_id.clone()))?;
        let student = roster
            .student_by_id(&req.student_id)
            .ok_or_else(|| Rejection::StudentNotFound(req.student_id.clone()))?;
        if !student.class_ids.contains(&class.id) {
            return Err(
                Rejection::StudentNotInClass(student.full_name.clone(), class.name.clone()).into(),
            );
        }
        if !roster.is_assigned(&class.id, &req.lesson_id) {
            return Err(Rejection::LessonNotFound(req.lesson_id.clone(), class.name.clone()).into());
        }

        let activity_date = to_iso(&req.date)?;
        let score = req.score.map(check_score).transpose()?;
        let qualitative = non_empty(req.qualitative.as_deref());
        check_applicability(activity_type, &label, score, qualitative.as_deref())?;

        let resolved = ResolvedActivity {
            school_id: identity.school_id.clone(),
            teacher_id: identity.user_id.clone(),
            student_id: student.id.clone(),
            class_id: class.id.clone(),
            lesson_id: req.lesson_id.clone(),
            activity_type,
            title: non_empty(req.title.as_deref()).unwrap_or(label),
            activity_date,
            score,
            qualitative,
        };

        let mut tx = self.db.begin().await?;
        let (outcome, activity) = upsert::apply(&mut *tx, &resolved).await?;
        tx.commit().await?;

        info!(
            "saved activity {} ({:?}) for student {}",
            activity.id, outcome, activity.student_id
        );
        Ok(SaveActivityResponse {
            success: true,
            outcome,
            activity,
        })
    }

    pub async fn list(
        &self,
        identity: &Identity,
        filter: ActivityFilter,
    ) -> Result<Vec<ActivityListItem>, AppError> {
        let types = self.activity_type_table(&identity.school_id).await?;

        let activity_type = match non_empty(filter.activity_type.as_deref()) {
            Some(raw) => Some(
                types
                    .resolve(&raw)
                    .ok_or(Rejection::UnknownActivityType(raw))?
                    .key()
                    .to_string(),
            ),
            None => None,
        };
        let bound = |raw: Option<&str>| -> Result<Option<String>, AppError> {
            non_empty(raw)
                .map(|r| to_iso(&r))
                .transpose()
                .map_err(AppError::from)
        };
        let filter = ActivityFilter {
            student_id: non_empty(filter.student_id.as_deref()),
            activity_type,
            from: bound(filter.from.as_deref())?,
            to: bound(filter.to.as_deref())?,
        };

        let mut items = repository::fetch_activities(&self.db, &identity.user_id, &filter).await?;
        for item in &mut items {
            item.jalali_date = iso_to_jalali(&item.activity_date).unwrap_or_default();
        }
        Ok(items)
    }

    /// Effective label table for the caller's school with field rules.
    pub async fn activity_types(&self, identity: &Identity) -> Result<Vec<ActivityTypeInfo>, AppError> {
        let types = self.activity_type_table(&identity.school_id).await?;
        Ok(types
            .entries()
            .map(|(label, key)| ActivityTypeInfo {
                key,
                label: label.to_string(),
                rules: key.rules(),
            })
            .collect())
    }

    async fn activity_type_table(&self, school_id: &str) -> Result<ActivityTypeTable, AppError> {
        let labels = repository::fetch_activity_type_labels(&self.db, school_id).await?;
        Ok(ActivityTypeTable::for_school(labels))
    }
}
