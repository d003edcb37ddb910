mod auth_handlers;
pub mod company;

use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;

use crate::middleware::rate_limit::rate_limit;
use crate::state::AppState;

pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth_handlers::login))
        .route("/refresh_token", post(auth_handlers::refresh_token))
}

/// Company routes. Reads are public; the mutating handlers take an
/// [`AuthUser`](crate::auth::AuthUser) and so reject requests without a valid token.
pub fn company_router() -> Router<AppState> {
    Router::new()
        .route("/company", post(company::create_company))
        .route(
            "/company/{id}",
            get(company::get_company)
                .patch(company::update_company)
                .delete(company::delete_company),
        )
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// The full `/api/v1` application with the global rate limit in front of routing.
pub fn app(state: AppState) -> Router {
    let v1 = Router::new()
        .route("/health", get(health))
        .merge(auth_router())
        .merge(company_router());

    Router::new()
        .nest("/api/v1", v1)
        .layer(from_fn_with_state(state.limiter.clone(), rate_limit))
        .with_state(state)
}
