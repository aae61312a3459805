use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::import::rejection::Rejection;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid spreadsheet: {0}")]
    InvalidSpreadsheet(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// A single-record request that fails a row rule is answered with 422.
impl From<Rejection> for AppError {
    fn from(rejection: Rejection) -> Self {
        AppError::Unprocessable(rejection.to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "لطفاً ابتدا وارد حساب کاربری خود شوید".to_string(),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "شما به این بخش دسترسی ندارید".to_string(),
            ),
            AppError::NotFound => (StatusCode::NOT_FOUND, "مورد درخواستی یافت نشد".to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::InvalidSpreadsheet(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Extraction(msg) => {
                error!("extraction failed: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "استخراج اطلاعات از متن ناموفق بود. لطفاً دوباره تلاش کنید".to_string(),
                )
            }
            AppError::Database(e) => {
                error!("database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "خطا در ارتباط با پایگاه داده".to_string(),
                )
            }
            AppError::Config(msg) => {
                error!("configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "خطای داخلی سرور".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            error: status.to_string(),
            message,
        });

        (status, body).into_response()
    }
}
