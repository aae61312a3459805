use std::sync::Arc;

use chrono::Local;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::auth::Identity;
use crate::error::AppError;
use crate::import::draft::{build_draft, parse_reply, system_prompt};
use crate::llm::{CompletionRequest, LanguageModel, ModelSource};
use crate::models::{ExtractRequest, ExtractResponse};

use super::context::TeacherContext;

pub struct ExtractionService {
    db: SqlitePool,
    model: Arc<dyn LanguageModel>,
}

impl ExtractionService {
    pub fn new(db: SqlitePool, model: Arc<dyn LanguageModel>) -> Self {
        Self { db, model }
    }

    /// Asks the model for one record and checks it against the roster.
    /// The result is a draft; nothing is written.
    pub async fn extract(
        &self,
        identity: &Identity,
        req: ExtractRequest,
    ) -> Result<ExtractResponse, AppError> {
        let text = req.text.trim();
        if text.is_empty() {
            return Err(AppError::BadRequest("متن فعالیت خالی است".to_string()));
        }
        let source = req
            .model_source
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<ModelSource>)
            .transpose()?;

        let context = TeacherContext::load(&self.db, identity).await?;
        let today = Local::now().date_naive();

        let completion = self
            .model
            .complete(CompletionRequest {
                source,
                system: system_prompt(today, &context.roster, &context.types),
                user: text.to_string(),
            })
            .await?;
        debug!("model {} replied: {}", completion.source, completion.content);

        let fields =
            parse_reply(&completion.content).map_err(|e| AppError::Extraction(e.to_string()))?;
        let draft = build_draft(fields, text, today, &context.roster, &context.types);

        info!(
            "extracted draft for teacher {} with {} warnings",
            identity.user_id,
            draft.warnings.len()
        );
        Ok(ExtractResponse {
            success: true,
            model_source: completion.source.to_string(),
            draft,
        })
    }
}
