use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use super::jwt::{Claims, JwtSigner, TokenSigner};
use super::middleware::AuthUser;
use crate::config::AuthConfig;
use crate::error::AppError;

/// A freshly issued bearer token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Token lifecycle for the single configured admin account.
pub struct AuthManager {
    signer: Arc<dyn TokenSigner>,
    username: String,
    password: String,
    ttl: Duration,
    max_refresh: Duration,
}

impl AuthManager {
    pub fn new(config: &AuthConfig) -> Self {
        Self::with_signer(config, Arc::new(JwtSigner::new(&config.jwt_secret)))
    }

    pub fn with_signer(config: &AuthConfig, signer: Arc<dyn TokenSigner>) -> Self {
        Self {
            signer,
            username: config.username.clone(),
            password: config.password.clone(),
            ttl: Duration::from_secs(config.token_ttl_secs),
            max_refresh: Duration::from_secs(config.max_refresh_secs),
        }
    }

    /// Exchanges the admin credentials for a token.
    pub fn login(&self, username: &str, password: &str) -> Result<IssuedToken, AppError> {
        let user_ok = constant_time_eq(username.as_bytes(), self.username.as_bytes());
        let password_ok = constant_time_eq(password.as_bytes(), self.password.as_bytes());
        if !(user_ok && password_ok) {
            tracing::warn!("Failed login attempt for user: {username}");
            return Err(AppError::Auth("incorrect Username or Password".to_string()));
        }

        tracing::info!("Login succeeded for user: {username}");
        Ok(self.issue(username, now_secs())?)
    }

    /// Verifies a token (signature and expiry) and checks it names the admin.
    pub fn authenticate(&self, token: &str) -> Result<AuthUser, AppError> {
        let claims = self
            .signer
            .verify(token, true)
            .map_err(|e| {
                tracing::debug!("Token rejected: {e}");
                AppError::Auth("Invalid or expired token".to_string())
            })?;
        self.authorize(claims)
    }

    /// Issues a replacement token.
    ///
    /// The presented token may already be expired, as long as it was issued
    /// within the max-refresh window.
    pub fn refresh(&self, token: &str) -> Result<IssuedToken, AppError> {
        self.refresh_at(token, now_secs())
    }

    fn refresh_at(&self, token: &str, now: u64) -> Result<IssuedToken, AppError> {
        let claims = self
            .signer
            .verify(token, false)
            .map_err(|_| AppError::Auth("Invalid token".to_string()))?;

        if claims.orig_iat.saturating_add(self.max_refresh.as_secs()) < now {
            return Err(AppError::Auth("Token is past its refresh window".to_string()));
        }

        let user = self.authorize(claims)?;
        tracing::debug!("Refreshed token for user: {}", user.username);
        Ok(self.issue(&user.username, now)?)
    }

    fn authorize(&self, claims: Claims) -> Result<AuthUser, AppError> {
        if claims.sub != self.username {
            tracing::warn!("Token subject {} is not the admin user", claims.sub);
            return Err(AppError::Forbidden(
                "you don't have permission to access this resource".to_string(),
            ));
        }
        Ok(AuthUser {
            username: claims.sub,
        })
    }

    fn issue(&self, username: &str, now: u64) -> anyhow::Result<IssuedToken> {
        let exp = now + self.ttl.as_secs();
        let claims = Claims {
            sub: username.to_string(),
            exp,
            orig_iat: now,
        };
        let token = self.signer.sign(&claims)?;
        let expires_at = Utc
            .timestamp_opt(i64::try_from(exp)?, 0)
            .single()
            .ok_or_else(|| anyhow::anyhow!("token expiry out of range: {exp}"))?;
        Ok(IssuedToken { token, expires_at })
    }
}

fn now_secs() -> u64 {
    jsonwebtoken::get_current_timestamp()
}

/// Constant-time byte comparison to prevent timing side-channel attacks on credentials.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> AuthManager {
        AuthManager::new(&manager_config())
    }

    #[test]
    fn login_with_correct_credentials_issues_usable_token() {
        let auth = manager();
        let issued = auth.login("admin", "hunter2").unwrap();
        assert!(issued.expires_at > Utc::now());
        let user = auth.authenticate(&issued.token).unwrap();
        assert_eq!(user.username, "admin");
    }

    #[test]
    fn login_with_wrong_credentials_fails() {
        let auth = manager();
        assert!(matches!(auth.login("admin", "wrong"), Err(AppError::Auth(_))));
        assert!(matches!(auth.login("root", "hunter2"), Err(AppError::Auth(_))));
        assert!(matches!(auth.login("", ""), Err(AppError::Auth(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        let auth = manager();
        let issued = auth.issue("admin", now_secs() - 7200).unwrap();
        assert!(matches!(
            auth.authenticate(&issued.token),
            Err(AppError::Auth(_))
        ));
    }

    #[test]
    fn token_for_other_subject_is_forbidden() {
        let auth = manager();
        let issued = auth.issue("mallory", now_secs()).unwrap();
        assert!(matches!(
            auth.authenticate(&issued.token),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn refresh_renews_expiry() {
        let auth = manager();
        let now = now_secs();
        let issued = auth.issue("admin", now - 600).unwrap();
        let refreshed = auth.refresh_at(&issued.token, now).unwrap();
        assert!(refreshed.expires_at > issued.expires_at);
        assert!(auth.authenticate(&refreshed.token).is_ok());
    }

    #[test]
    fn expired_token_within_refresh_window_can_be_refreshed() {
        let auth = AuthManager::new(&AuthConfig {
            token_ttl_secs: 60,
            max_refresh_secs: 3600,
            ..manager_config()
        });
        let now = now_secs();
        let issued = auth.issue("admin", now - 120).unwrap();
        assert!(auth.authenticate(&issued.token).is_err());
        assert!(auth.refresh_at(&issued.token, now).is_ok());
    }

    #[test]
    fn refresh_outside_window_is_rejected() {
        let auth = manager();
        let now = now_secs();
        let issued = auth.issue("admin", now - 3601).unwrap();
        assert!(matches!(
            auth.refresh_at(&issued.token, now),
            Err(AppError::Auth(_))
        ));
    }

    #[test]
    fn refresh_rejects_foreign_signatures() {
        let auth = manager();
        let other = AuthManager::new(&AuthConfig {
            jwt_secret: "another-secret-another-secret-another".to_string(),
            ..manager_config()
        });
        let issued = other.login("admin", "hunter2").unwrap();
        assert!(matches!(auth.refresh(&issued.token), Err(AppError::Auth(_))));
    }

    #[test]
    fn constant_time_eq_matches_plain_equality() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
        assert!(constant_time_eq(b"", b""));
    }

    fn manager_config() -> AuthConfig {
        AuthConfig {
            username: "admin".to_string(),
            password: "hunter2".to_string(),
            jwt_secret: "test-secret-test-secret-test-secret".to_string(),
            token_ttl_secs: 3600,
            max_refresh_secs: 3600,
        }
    }
}
