use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
    #[serde(default = "default_max_refresh_secs")]
    pub max_refresh_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Sustained rate in tokens per second; may be fractional.
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: f64,
    #[serde(default = "default_burst")]
    pub burst: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            jwt_secret: String::new(),
            token_ttl_secs: default_token_ttl_secs(),
            max_refresh_secs: default_max_refresh_secs(),
        }
    }
}

fn default_token_ttl_secs() -> u64 {
    3600
}

fn default_max_refresh_secs() -> u64 {
    3600
}

fn default_requests_per_second() -> f64 {
    1.0
}

fn default_burst() -> u32 {
    1
}

fn default_shutdown_grace_secs() -> u64 {
    5
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_requests_per_second(),
            burst: default_burst(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_db_path() -> PathBuf {
    PathBuf::from("corpreg.db")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_db_path() }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            auth: AuthConfig::default(),
            database: DatabaseConfig::default(),
            rate_limit: RateLimitConfig::default(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

/// Command-line overrides; every field left `None` keeps the file/env value.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ConfigOverrides {
    /// Address to listen on, e.g. 0.0.0.0:8080.
    #[arg(long)]
    pub bind_addr: Option<SocketAddr>,
    /// Admin username.
    #[arg(long)]
    pub auth_user: Option<String>,
    /// Admin password.
    #[arg(long)]
    pub auth_password: Option<String>,
    /// HMAC secret used to sign tokens.
    #[arg(long)]
    pub jwt_secret: Option<String>,
    /// SQLite database file.
    #[arg(long)]
    pub db_path: Option<PathBuf>,
    /// Sustained request rate (tokens per second).
    #[arg(long)]
    pub rate_limit: Option<f64>,
    /// Burst capacity of the rate limiter.
    #[arg(long)]
    pub rate_burst: Option<u32>,
}

const WEAK_SECRETS: &[&str] = &[
    "change-me-to-a-random-secret",
    "secret",
    "password",
    "jwt-secret",
];

impl ServerConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    /// Reads the optional TOML file named by `CORPREG_CONFIG`, then applies
    /// `CORPREG_*` environment variables, then `overrides`.
    pub fn load(overrides: &ConfigOverrides) -> anyhow::Result<Self> {
        let config_path = std::env::var("CORPREG_CONFIG")
            .map(PathBuf::from)
            .ok();

        let mut config = if let Some(path) = config_path {
            let contents = std::fs::read_to_string(&path)?;
            toml::from_str(&contents)?
        } else {
            ServerConfig::default()
        };

        config.apply_env()?;
        config.apply_overrides(overrides);
        config.finish()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> anyhow::Result<()> {
        if let Ok(addr) = std::env::var("CORPREG_BIND_ADDR") {
            self.bind_addr = addr.parse()?;
        }
        if let Ok(user) = std::env::var("CORPREG_AUTH_USER") {
            self.auth.username = user;
        }
        if let Ok(password) = std::env::var("CORPREG_AUTH_PASSWORD") {
            self.auth.password = password;
        }
        if let Ok(secret) = std::env::var("CORPREG_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Ok(val) = std::env::var("CORPREG_TOKEN_TTL_SECS") {
            self.auth.token_ttl_secs = val.parse()?;
        }
        if let Ok(val) = std::env::var("CORPREG_MAX_REFRESH_SECS") {
            self.auth.max_refresh_secs = val.parse()?;
        }
        if let Ok(path) = std::env::var("CORPREG_DB_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Ok(val) = std::env::var("CORPREG_RATE_LIMIT") {
            self.rate_limit.requests_per_second = val.parse()?;
        }
        if let Ok(val) = std::env::var("CORPREG_RATE_BURST") {
            self.rate_limit.burst = val.parse()?;
        }
        if let Ok(val) = std::env::var("CORPREG_SHUTDOWN_GRACE_SECS") {
            self.shutdown_grace_secs = val.parse()?;
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(addr) = overrides.bind_addr {
            self.bind_addr = addr;
        }
        if let Some(user) = &overrides.auth_user {
            self.auth.username = user.clone();
        }
        if let Some(password) = &overrides.auth_password {
            self.auth.password = password.clone();
        }
        if let Some(secret) = &overrides.jwt_secret {
            self.auth.jwt_secret = secret.clone();
        }
        if let Some(path) = &overrides.db_path {
            self.database.path = path.clone();
        }
        if let Some(rate) = overrides.rate_limit {
            self.rate_limit.requests_per_second = rate;
        }
        if let Some(burst) = overrides.rate_burst {
            self.rate_limit.burst = burst;
        }
    }

    /// Fills in a random secret when none is set and rejects unusable values.
    fn finish(&mut self) -> anyhow::Result<()> {
        if self.auth.username.is_empty() || self.auth.password.is_empty() {
            anyhow::bail!(
                "Admin credentials are not configured. \
                 Set CORPREG_AUTH_USER and CORPREG_AUTH_PASSWORD (or --auth-user/--auth-password)."
            );
        }

        if self.auth.jwt_secret.is_empty() {
            self.auth.jwt_secret = uuid::Uuid::new_v4().to_string();
            tracing::warn!(
                "No JWT secret configured. Generated random secret (will change on restart)."
            );
        }
        if WEAK_SECRETS.iter().any(|&w| self.auth.jwt_secret == w) {
            anyhow::bail!(
                "JWT secret matches a known weak/placeholder value. \
                 Set a strong random secret via CORPREG_JWT_SECRET environment variable."
            );
        }
        if self.auth.jwt_secret.len() < 32 {
            tracing::warn!(
                "JWT secret is shorter than 32 characters. \
                 Consider using a stronger secret via CORPREG_JWT_SECRET."
            );
        }

        let rate = self.rate_limit.requests_per_second;
        if !rate.is_finite() || rate <= 0.0 {
            anyhow::bail!("Rate limit must be a positive number of requests per second, got {rate}");
        }
        if self.rate_limit.burst == 0 {
            anyhow::bail!("Rate burst must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_credentials() -> ServerConfig {
        let mut config = ServerConfig::default();
        config.auth.username = "admin".to_string();
        config.auth.password = "hunter2".to_string();
        config
    }

    #[test]
    fn toml_file_fills_missing_sections_with_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            bind_addr = "127.0.0.1:9000"

            [auth]
            username = "admin"
            password = "pw"

            [rate_limit]
            requests_per_second = 2.5
            "#,
        )
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.auth.token_ttl_secs, 3600);
        assert_eq!(config.rate_limit.requests_per_second, 2.5);
        assert_eq!(config.rate_limit.burst, 1);
        assert_eq!(config.database.path, PathBuf::from("corpreg.db"));
        assert_eq!(config.shutdown_grace_secs, 5);
    }

    #[test]
    fn overrides_replace_only_given_values() {
        let mut config = with_credentials();
        config.apply_overrides(&ConfigOverrides {
            rate_burst: Some(10),
            db_path: Some(PathBuf::from("/tmp/x.db")),
            ..Default::default()
        });
        assert_eq!(config.rate_limit.burst, 10);
        assert_eq!(config.database.path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.auth.username, "admin");
        assert_eq!(config.rate_limit.requests_per_second, 1.0);
    }

    #[test]
    fn missing_credentials_are_rejected() {
        let mut config = ServerConfig::default();
        assert!(config.finish().is_err());
    }

    #[test]
    fn empty_secret_is_replaced_with_random_one() {
        let mut config = with_credentials();
        config.finish().unwrap();
        assert!(!config.auth.jwt_secret.is_empty());
    }

    #[test]
    fn weak_secret_is_rejected() {
        let mut config = with_credentials();
        config.auth.jwt_secret = "secret".to_string();
        assert!(config.finish().is_err());
    }

    #[test]
    fn non_positive_rate_or_zero_burst_is_rejected() {
        let mut config = with_credentials();
        config.rate_limit.requests_per_second = 0.0;
        assert!(config.finish().is_err());

        let mut config = with_credentials();
        config.rate_limit.burst = 0;
        assert!(config.finish().is_err());
    }
}
