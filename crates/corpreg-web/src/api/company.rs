use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use corpreg_core::{Company, CompanyPayload};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::dto::MessageResponse;
use crate::error::AppError;
use crate::state::AppState;

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest("Invalid UUID".to_string()))
}

fn payload(body: Result<Json<CompanyPayload>, JsonRejection>) -> Result<CompanyPayload, AppError> {
    body.map(|Json(p)| p)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

pub async fn get_company(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Company>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(state.companies.get(id).await?))
}

pub async fn create_company(
    user: AuthUser,
    State(state): State<AppState>,
    body: Result<Json<CompanyPayload>, JsonRejection>,
) -> Result<Json<Company>, AppError> {
    let company = state.companies.create(payload(body)?).await?;
    tracing::debug!("Company {} created by {}", company.id, user.username);
    Ok(Json(company))
}

pub async fn update_company(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<CompanyPayload>, JsonRejection>,
) -> Result<Json<Company>, AppError> {
    let id = parse_id(&id)?;
    let company = state.companies.update(id, payload(body)?).await?;
    tracing::debug!("Company {} updated by {}", company.id, user.username);
    Ok(Json(company))
}

pub async fn delete_company(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id)?;
    state.companies.delete(id).await?;
    tracing::debug!("Company {id} deleted by {}", user.username);
    Ok(Json(MessageResponse {
        message: "Company deleted".to_string(),
    }))
}
