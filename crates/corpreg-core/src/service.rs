//! Company lifecycle: validate, then persist.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::model::{Company, CompanyDraft, CompanyPayload};
use crate::repository::CompanyRepository;
use crate::validator::{self, ValidCompany};

/// Create/read/update/delete for companies on top of a [`CompanyRepository`].
///
/// No write reaches the repository unless the full record passed validation.
#[derive(Clone)]
pub struct CompanyService {
    repo: Arc<dyn CompanyRepository>,
}

impl CompanyService {
    pub fn new(repo: Arc<dyn CompanyRepository>) -> Self {
        Self { repo }
    }

    /// Validates `payload` and stores it under a freshly generated id.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Validation`] if a field rule fails.
    /// - [`CoreError::Conflict`] if the name is already used.
    /// - [`CoreError::Store`] for storage failures.
    pub async fn create(&self, payload: CompanyPayload) -> CoreResult<Company> {
        let valid = validator::validate(CompanyDraft::from(payload)).map_err(CoreError::Validation)?;

        let now = Utc::now();
        let company = build(Uuid::new_v4(), valid, now, now);
        self.repo.insert(&company).await.map_err(tag("create"))?;

        tracing::info!("Created company {} ({})", company.id, company.name);
        Ok(company)
    }

    /// # Errors
    ///
    /// [`CoreError::NotFound`] when no company has this id; storage failures
    /// are reported separately as [`CoreError::Store`].
    pub async fn get(&self, id: Uuid) -> CoreResult<Company> {
        self.repo
            .get(id)
            .await
            .map_err(tag("get"))?
            .ok_or(CoreError::NotFound(id))
    }

    /// Merges `payload` onto the stored company `id` and saves the result.
    ///
    /// Fields absent from the payload keep their stored value; present fields,
    /// including empty strings, overwrite. Any id in the payload is ignored.
    /// The merged record is validated as a whole.
    pub async fn update(&self, id: Uuid, payload: CompanyPayload) -> CoreResult<Company> {
        let existing = self.get(id).await?;

        let mut draft = CompanyDraft::from(&existing);
        draft.merge(payload);
        let valid = validator::validate(draft).map_err(CoreError::Validation)?;

        let company = build(id, valid, existing.created_at, Utc::now());
        self.repo.update(&company).await.map_err(tag("update"))?;

        tracing::info!("Updated company {}", company.id);
        Ok(company)
    }

    /// Removes the company; removing an absent id succeeds.
    pub async fn delete(&self, id: Uuid) -> CoreResult<()> {
        let removed = self.repo.delete(id).await.map_err(tag("delete"))?;
        if removed {
            tracing::info!("Deleted company {id}");
        } else {
            tracing::debug!("Delete of absent company {id}");
        }
        Ok(())
    }
}

fn build(
    id: Uuid,
    valid: ValidCompany,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
) -> Company {
    Company {
        id,
        name: valid.name,
        description: valid.description,
        amount_of_employees: valid.amount_of_employees,
        registered: valid.registered,
        company_type: valid.company_type,
        created_at,
        updated_at,
    }
}

/// Re-tags a repository failure with the service operation that hit it.
fn tag(op: &'static str) -> impl Fn(CoreError) -> CoreError {
    move |err| match err {
        CoreError::Store { source, .. } => CoreError::Store { op, source },
        other => other,
    }
}
