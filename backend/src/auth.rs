use std::str::FromStr;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::db::repository;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Principal,
    Teacher,
    Parent,
    Student,
    Admin,
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "principal" => Ok(Role::Principal),
            "teacher" => Ok(Role::Teacher),
            "parent" => Ok(Role::Parent),
            "student" => Ok(Role::Student),
            "admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

/// Authenticated caller, injected into request extensions by [`require_session`].
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    pub user_id: String,
    pub school_id: String,
    pub role: Role,
    pub name: String,
}

fn session_token<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
}

pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_token(request.headers(), &state.config.session_cookie)
        .ok_or(AppError::Unauthorized)?
        .to_string();

    let session = repository::find_session(&state.db, &token)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let expires_at = DateTime::parse_from_rfc3339(&session.expires_at)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| AppError::Unauthorized)?;
    if expires_at < Utc::now() {
        debug!("session for user {} has expired", session.user_id);
        return Err(AppError::Unauthorized);
    }

    let role = session.role.parse::<Role>().map_err(|_| AppError::Forbidden)?;
    request.extensions_mut().insert(Identity {
        user_id: session.user_id,
        school_id: session.school_id,
        role,
        name: session.name,
    });

    Ok(next.run(request).await)
}

/// Extractor for routes only teachers may use.
#[derive(Debug, Clone)]
pub struct Teacher(pub Identity);

impl<S> FromRequestParts<S> for Teacher
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or(AppError::Unauthorized)?;
        if identity.role != Role::Teacher {
            return Err(AppError::Forbidden);
        }
        Ok(Teacher(identity))
    }
}
