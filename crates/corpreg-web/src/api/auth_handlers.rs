use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::auth::{BearerToken, IssuedToken};
use crate::dto::{LoginRequest, LoginResponse};
use crate::error::AppError;
use crate::state::AppState;

fn token_response(issued: IssuedToken) -> Json<LoginResponse> {
    Json(LoginResponse {
        code: StatusCode::OK.as_u16(),
        token: issued.token,
        expire: issued.expires_at,
    })
}

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(body) = body.map_err(|e| {
        tracing::debug!("Unreadable login body: {}", e.body_text());
        AppError::Auth("missing Username or Password".to_string())
    })?;

    if body.username.is_empty() || body.password.is_empty() {
        return Err(AppError::Auth("missing Username or Password".to_string()));
    }

    let issued = state.auth.login(&body.username, &body.password)?;
    Ok(token_response(issued))
}

pub async fn refresh_token(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Json<LoginResponse>, AppError> {
    let issued = state.auth.refresh(&token)?;
    Ok(token_response(issued))
}
