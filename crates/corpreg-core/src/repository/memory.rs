use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::CompanyRepository;
use crate::error::{CoreError, CoreResult};
use crate::model::Company;

/// In-process company store backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryCompanyRepository {
    companies: RwLock<HashMap<Uuid, Company>>,
}

impl MemoryCompanyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.companies.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.companies.read().await.is_empty()
    }
}

fn name_taken(companies: &HashMap<Uuid, Company>, name: &str, except: Uuid) -> bool {
    companies
        .values()
        .any(|c| c.id != except && c.name == name)
}

#[async_trait]
impl CompanyRepository for MemoryCompanyRepository {
    async fn insert(&self, company: &Company) -> CoreResult<()> {
        let mut companies = self.companies.write().await;
        if name_taken(&companies, &company.name, company.id) {
            return Err(CoreError::Conflict(company.name.clone()));
        }
        if companies.contains_key(&company.id) {
            return Err(CoreError::store(
                "insert",
                format!("duplicate company id {}", company.id),
            ));
        }
        companies.insert(company.id, company.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> CoreResult<Option<Company>> {
        Ok(self.companies.read().await.get(&id).cloned())
    }

    async fn update(&self, company: &Company) -> CoreResult<()> {
        let mut companies = self.companies.write().await;
        if !companies.contains_key(&company.id) {
            return Err(CoreError::NotFound(company.id));
        }
        if name_taken(&companies, &company.name, company.id) {
            return Err(CoreError::Conflict(company.name.clone()));
        }
        companies.insert(company.id, company.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> CoreResult<bool> {
        Ok(self.companies.write().await.remove(&id).is_some())
    }
}
