//! corpreg core library: the company domain without any transport.
//!
//! `corpreg-core` owns everything about a company record except HTTP: the
//! entity and its wire payload, field validation, persistence and the service
//! that ties them together. The web crate is a thin layer on top.
//!
//! # Modules
//!
//! - [`model`]: [`Company`], [`CompanyType`], the create/patch [`CompanyPayload`] and merge logic.
//! - [`validator`]: Field rules and the [`Violations`] they produce.
//! - [`repository`]: The [`CompanyRepository`] trait with SQLite and in-memory stores.
//! - [`service`]: [`CompanyService`], which validates before every write.
//! - [`error`]: Unified error type ([`CoreError`]) and result alias ([`CoreResult`]).

pub mod error;
pub mod model;
pub mod repository;
pub mod service;
pub mod validator;

pub use error::{CoreError, CoreResult};
pub use model::{Company, CompanyDraft, CompanyPayload, CompanyType};
pub use repository::{CompanyRepository, MemoryCompanyRepository, SqliteCompanyRepository};
pub use service::CompanyService;
pub use validator::{Violation, Violations};
