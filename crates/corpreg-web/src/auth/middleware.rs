use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

const TOKEN_QUERY_PARAM: &str = "token";
const TOKEN_COOKIE: &str = "jwt";

/// The authenticated admin, rebuilt from token claims on every request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
}

/// The raw bearer token presented with a request, not yet verified.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Looks for a token in the `Authorization: Bearer` header, then the `token`
/// query parameter, then the `jwt` cookie. The first non-empty one wins.
pub fn lookup_token(parts: &Parts) -> Option<String> {
    let from_header = parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);
    if from_header.is_some() {
        return from_header;
    }

    let from_query = Query::<TokenQuery>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(q)| q.token)
        .filter(|t| !t.is_empty());
    if from_query.is_some() {
        tracing::debug!("Using token from {TOKEN_QUERY_PARAM} query parameter");
        return from_query;
    }

    CookieJar::from_headers(&parts.headers)
        .get(TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        lookup_token(parts)
            .map(BearerToken)
            .ok_or_else(|| AppError::Auth("auth header is empty".to_string()))
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        state.auth.authenticate(&token)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(builder: axum::http::request::Builder) -> Parts {
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn header_wins_over_query_and_cookie() {
        let p = parts(
            Request::builder()
                .uri("/x?token=from-query")
                .header("authorization", "Bearer from-header")
                .header("cookie", "jwt=from-cookie"),
        );
        assert_eq!(lookup_token(&p).as_deref(), Some("from-header"));
    }

    #[test]
    fn query_wins_over_cookie() {
        let p = parts(
            Request::builder()
                .uri("/x?other=1&token=from-query")
                .header("cookie", "jwt=from-cookie"),
        );
        assert_eq!(lookup_token(&p).as_deref(), Some("from-query"));
    }

    #[test]
    fn cookie_is_the_last_resort() {
        let p = parts(
            Request::builder()
                .uri("/x")
                .header("cookie", "theme=dark; jwt=from-cookie"),
        );
        assert_eq!(lookup_token(&p).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn non_bearer_header_falls_through() {
        let p = parts(
            Request::builder()
                .uri("/x?token=from-query")
                .header("authorization", "Basic YWRtaW46YWRtaW4="),
        );
        assert_eq!(lookup_token(&p).as_deref(), Some("from-query"));
    }

    #[test]
    fn nothing_present_yields_none() {
        let p = parts(Request::builder().uri("/x"));
        assert_eq!(lookup_token(&p), None);
    }
}
