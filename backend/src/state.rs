use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::llm::LanguageModel;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub model: Arc<dyn LanguageModel>,
    pub config: Arc<AppConfig>,
}
