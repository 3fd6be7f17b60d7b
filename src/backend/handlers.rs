use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::backend::AppState;
use crate::database::db::queries;
use crate::database::models::User;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Response {
    match queries::verify_login(&state.db, &payload.username, &payload.password).await {
        Ok(Some(user)) => match queries::create_session(&state.db, user.user_id).await {
            Ok(token) => (StatusCode::OK, Json(json!({ "token": token }))).into_response(),
            Err(err) => internal_error(err),
        },
        Ok(None) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid username or password" })),
        )
            .into_response(),
        Err(err) => internal_error(err),
    }
}

/// Bearer-protected echo of the authenticated identity.
pub async fn auth_test(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match bearer_user(&state, &headers).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(response) => response,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGoalRequest {
    pub user_id: i64,
    pub name: String,
    pub target_amount: f64,
    pub time_frame: i64,
}

pub async fn create_goal(
    State(state): State<AppState>,
    Json(payload): Json<CreateGoalRequest>,
) -> Response {
    if payload.name.trim().is_empty()
        || !payload.target_amount.is_finite()
        || payload.target_amount <= 0.0
        || payload.time_frame <= 0
    {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": "name, targetAmount and timeFrame must be set and positive" })),
        )
            .into_response();
    }

    match queries::create_goal(
        &state.db,
        payload.user_id,
        payload.name.trim(),
        payload.target_amount,
        payload.time_frame,
    )
    .await
    {
        Ok(goal) => (StatusCode::CREATED, Json(goal)).into_response(),
        Err(err) => internal_error(err),
    }
}

pub async fn goals_by_user(State(state): State<AppState>, Path(user_id): Path<i64>) -> Response {
    match queries::goals_by_user(&state.db, user_id).await {
        Ok(goals) => (StatusCode::OK, Json(goals)).into_response(),
        Err(err) => internal_error(err),
    }
}

/// Idempotent: 204 whether or not the row existed.
pub async fn delete_goal(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match queries::delete_goal(&state.db, id).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => internal_error(err),
    }
}

async fn bearer_user(state: &AppState, headers: &HeaderMap) -> Result<User, Response> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);

    let Some(token) = token else {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "missing bearer token" })),
        )
            .into_response());
    };

    match queries::user_for_token(&state.db, token).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "unknown token" })),
        )
            .into_response()),
        Err(err) => Err(internal_error(err)),
    }
}

fn internal_error(err: sqlx::Error) -> Response {
    error!(%err, "database error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "internal error" })),
    )
        .into_response()
}
