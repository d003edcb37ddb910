//! Company persistence.
//!
//! [`CompanyRepository`] is the capability the service needs. Two
//! implementations ship: [`SqliteCompanyRepository`] for the server and
//! [`MemoryCompanyRepository`] for tests and embedding.

mod memory;
mod sqlite;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::CoreResult;
use crate::model::Company;

pub use memory::MemoryCompanyRepository;
pub use sqlite::SqliteCompanyRepository;

/// Storage for companies, keyed by id.
///
/// Implementations must enforce name uniqueness and report violations as
/// [`CoreError::Conflict`](crate::CoreError::Conflict). Every method is a
/// single round trip; there are no cross-call transactions.
#[async_trait]
pub trait CompanyRepository: Send + Sync {
    async fn insert(&self, company: &Company) -> CoreResult<()>;

    /// Returns `Ok(None)` when no row has this id.
    async fn get(&self, id: Uuid) -> CoreResult<Option<Company>>;

    /// Overwrites the stored row with the same id.
    ///
    /// Returns [`CoreError::NotFound`](crate::CoreError::NotFound) if the row
    /// disappeared.
    async fn update(&self, company: &Company) -> CoreResult<()>;

    /// Returns whether a row was removed. Removing an absent id is not an error.
    async fn delete(&self, id: Uuid) -> CoreResult<bool>;
}
