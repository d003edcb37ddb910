//! Scripted client walk-through against a running server: log in, create a
//! company, patch it, read it back, then delete it.

use std::time::Duration;

use anyhow::Context;
use corpreg_core::{Company, CompanyPayload, CompanyType};
use reqwest::header;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::json;

use crate::dto::{LoginRequest, LoginResponse};

const MAX_RATE_LIMIT_RETRIES: u32 = 3;

pub struct ExampleClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ExampleClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}/api/v1{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends the request, waiting out `429` responses for up to
    /// [`MAX_RATE_LIMIT_RETRIES`] attempts.
    async fn send(&self, builder: RequestBuilder) -> anyhow::Result<String> {
        let mut attempt = 0;
        loop {
            let request = builder
                .try_clone()
                .context("request body cannot be retried")?;
            let response = request.send().await?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS && attempt < MAX_RATE_LIMIT_RETRIES {
                let wait = response
                    .headers()
                    .get(header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(1);
                tracing::info!("Rate limited, retrying in {wait}s");
                tokio::time::sleep(Duration::from_secs(wait)).await;
                attempt += 1;
                continue;
            }

            let body = response.text().await?;
            if !status.is_success() {
                anyhow::bail!("request failed with {status}: {body}");
            }
            return Ok(body);
        }
    }

    pub async fn login(&mut self, username: &str, password: &str) -> anyhow::Result<()> {
        let body = self
            .send(self.request(Method::POST, "/login").json(&LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            }))
            .await
            .context("login")?;
        let login: LoginResponse = serde_json::from_str(&body)?;
        tracing::info!("Authenticated, token expires at {}", login.expire);
        self.token = Some(login.token);
        Ok(())
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let payload = CompanyPayload {
            name: Some(format!("Example Company {}", uuid::Uuid::new_v4().simple())),
            description: Some("A company created by the example client".to_string()),
            amount_of_employees: Some(10),
            registered: Some(true),
            company_type: Some(CompanyType::Corporation.to_string()),
            ..Default::default()
        };
        let body = self
            .send(self.request(Method::POST, "/company").json(&payload))
            .await
            .context("create company")?;
        tracing::info!("Created company: {body}");
        let company: Company = serde_json::from_str(&body)?;
        let path = format!("/company/{}", company.id);

        let patch = json!({ "description": format!("{} - updated", company.description) });
        let body = self
            .send(self.request(Method::PATCH, &path).json(&patch))
            .await
            .context("update company")?;
        tracing::info!("Updated company: {body}");

        let body = self
            .send(self.request(Method::GET, &path))
            .await
            .context("get company")?;
        tracing::info!("Fetched company: {body}");

        let body = self
            .send(self.request(Method::DELETE, &path))
            .await
            .context("delete company")?;
        tracing::info!("Delete response: {body}");
        Ok(())
    }
}
