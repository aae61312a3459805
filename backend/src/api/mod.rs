use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Query};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use tracing::{error, info};

use crate::auth::{Teacher, require_session};
use crate::error::AppError;
use crate::import::sheet;
use crate::models::*;
use crate::services::{ActivityService, ExtractionService, ImportService};
use crate::state::AppState;

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub fn router(state: AppState) -> Router {
    let teacher = Router::new()
        .route(
            "/activities/import",
            post(import_activities).layer(DefaultBodyLimit::max(state.config.max_upload_bytes)),
        )
        .route("/activities/import/template", get(import_template))
        .route("/activities/extract", post(extract_activity))
        .route("/activities", get(list_activities).post(save_activity))
        .route("/activity-types", get(list_activity_types))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route("/health", get(health))
        .nest("/api/teacher", teacher)
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn import_activities(
    State(state): State<AppState>,
    Teacher(identity): Teacher,
    mut multipart: Multipart,
) -> Result<Json<ImportResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("درخواست نامعتبر است: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("خواندن فایل ناموفق بود: {}", e)))?;
        if bytes.is_empty() {
            return Err(AppError::BadRequest("فایل ارسال‌شده خالی است".to_string()));
        }

        info!(
            "import upload {} ({} bytes) from teacher {}",
            filename,
            bytes.len(),
            identity.user_id
        );
        let service = ImportService::new(state.db.clone());
        let response = service.import_file(&identity, &filename, bytes.to_vec()).await?;
        return Ok(Json(response));
    }

    Err(AppError::BadRequest("فایلی برای بارگذاری انتخاب نشده است".to_string()))
}

async fn import_template(Teacher(_): Teacher) -> Result<impl IntoResponse, AppError> {
    let bytes = sheet::build_template().map_err(|e| {
        error!("failed to build import template: {}", e);
        AppError::Config(e.to_string())
    })?;
    Ok((
        [
            (CONTENT_TYPE, XLSX_MIME),
            (
                CONTENT_DISPOSITION,
                "attachment; filename=\"activities-template.xlsx\"",
            ),
        ],
        bytes,
    ))
}

async fn extract_activity(
    State(state): State<AppState>,
    Teacher(identity): Teacher,
    Json(req): Json<ExtractRequest>,
) -> Result<Json<ExtractResponse>, AppError> {
    let service = ExtractionService::new(state.db.clone(), state.model.clone());
    let response = service.extract(&identity, req).await?;
    Ok(Json(response))
}

async fn save_activity(
    State(state): State<AppState>,
    Teacher(identity): Teacher,
    Json(req): Json<SaveActivityRequest>,
) -> Result<Json<SaveActivityResponse>, AppError> {
    let service = ActivityService::new(state.db.clone());
    let response = service.save(&identity, req).await?;
    Ok(Json(response))
}

async fn list_activities(
    State(state): State<AppState>,
    Teacher(identity): Teacher,
    Query(filter): Query<ActivityFilter>,
) -> Result<Json<Vec<ActivityListItem>>, AppError> {
    let service = ActivityService::new(state.db.clone());
    let items = service.list(&identity, filter).await?;
    Ok(Json(items))
}

async fn list_activity_types(
    State(state): State<AppState>,
    Teacher(identity): Teacher,
) -> Result<Json<Vec<ActivityTypeInfo>>, AppError> {
    let service = ActivityService::new(state.db.clone());
    let types = service.activity_types(&identity).await?;
    Ok(Json(types))
}
