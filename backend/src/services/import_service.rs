use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::auth::Identity;
use crate::error::AppError;
use crate::import::report::{build_response, row_message};
use crate::import::sheet::{self, SheetFormat};
use crate::import::{resolve_row, upsert};
use crate::models::{ImportResponse, ImportRow, RowOutcome, UpsertOutcome};

use super::context::TeacherContext;

pub struct ImportService {
    db: SqlitePool,
}

#[derive(Debug)]
pub struct ImportStats {
    pub rows: usize,
    pub added: usize,
    pub updated: usize,
    pub rejected: usize,
}

impl ImportService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Decodes an uploaded workbook and imports its rows.
    pub async fn import_file(
        &self,
        identity: &Identity,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<ImportResponse, AppError> {
        let format = SheetFormat::from_filename(filename).ok_or_else(|| {
            AppError::BadRequest(
                "فرمت فایل پشتیبانی نمی‌شود؛ فایل xlsx، xls، ods یا csv بارگذاری کنید".to_string(),
            )
        })?;

        let rows = tokio::task::spawn_blocking(move || sheet::parse_upload(bytes, format))
            .await
            .map_err(|e| AppError::InvalidSpreadsheet(format!("خواندن فایل ناموفق بود: {}", e)))?
            .map_err(|e| AppError::InvalidSpreadsheet(e.to_string()))?;

        info!("parsed {} rows from {}", rows.len(), filename);
        self.import_rows(identity, rows).await
    }

    /// Validates, resolves and upserts every row inside one transaction.
    /// Rejected rows are reported; only storage failures abort the batch.
    pub async fn import_rows(
        &self,
        identity: &Identity,
        rows: Vec<ImportRow>,
    ) -> Result<ImportResponse, AppError> {
        info!(
            "Starting import of {} rows for teacher {}",
            rows.len(),
            identity.user_id
        );
        let context = TeacherContext::load(&self.db, identity).await?;

        let mut outcomes: Vec<RowOutcome> = Vec::with_capacity(rows.len());
        let mut stats = ImportStats {
            rows: rows.len(),
            added: 0,
            updated: 0,
            rejected: 0,
        };

        let mut tx = self.db.begin().await?;
        for row in &rows {
            match resolve_row(row, &context.roster, &context.types) {
                Ok(resolved) => {
                    let (outcome, _) = upsert::apply(&mut *tx, &resolved).await?;
                    match outcome {
                        UpsertOutcome::Added => stats.added += 1,
                        UpsertOutcome::Updated => stats.updated += 1,
                    }
                    let name = context
                        .roster
                        .student_by_id(&resolved.student_id)
                        .map(|s| s.full_name.as_str())
                        .unwrap_or_default();
                    outcomes.push(RowOutcome::written(row.row_number, name, outcome));
                }
                Err(rejection) => {
                    debug!("{}", row_message(row.row_number, &rejection.to_string()));
                    stats.rejected += 1;
                    outcomes.push(RowOutcome::rejected(
                        row.row_number,
                        row.student_name.clone(),
                        &rejection,
                    ));
                }
            }
        }
        tx.commit().await?;

        info!("Import completed: {:?}", stats);
        Ok(build_response(outcomes))
    }
}
