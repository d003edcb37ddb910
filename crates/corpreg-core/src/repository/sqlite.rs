use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

use super::CompanyRepository;
use crate::error::{CoreError, CoreResult};
use crate::model::{Company, CompanyType};

const CREATE_TABLE: &str = "\
CREATE TABLE IF NOT EXISTS companies (
    id                  TEXT PRIMARY KEY NOT NULL,
    name                TEXT NOT NULL UNIQUE,
    description         TEXT NOT NULL DEFAULT '',
    amount_of_employees INTEGER NOT NULL,
    registered          BOOLEAN NOT NULL,
    company_type        TEXT NOT NULL,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL
)";

const SELECT_BY_ID: &str = "\
SELECT id, name, description, amount_of_employees, registered, company_type, created_at, updated_at
FROM companies WHERE id = ?";

/// Company store on a SQLite database file.
///
/// The `companies` table is created on connect if it does not exist; there
/// are no other migrations.
#[derive(Debug, Clone)]
pub struct SqliteCompanyRepository {
    pool: SqlitePool,
}

impl SqliteCompanyRepository {
    /// Opens (creating if needed) the database at `path`.
    pub async fn connect(path: &Path) -> CoreResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| CoreError::store("connect", e))?;
        tracing::info!("Opened company database at {}", path.display());
        Self::with_pool(pool).await
    }

    /// Opens a private in-memory database.
    ///
    /// Limited to one connection, since every SQLite in-memory connection is a
    /// separate database.
    pub async fn in_memory() -> CoreResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| CoreError::store("connect", e))?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| CoreError::store("connect", e))?;
        Self::with_pool(pool).await
    }

    pub async fn with_pool(pool: SqlitePool) -> CoreResult<Self> {
        sqlx::query(CREATE_TABLE)
            .execute(&pool)
            .await
            .map_err(|e| CoreError::store("create table", e))?;
        Ok(Self { pool })
    }

    /// Waits for checked-out connections to return, then closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Maps a write failure, singling out unique-constraint violations on `name`.
fn write_error(op: &'static str, company: &Company, err: sqlx::Error) -> CoreError {
    let unique = err
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());
    if unique {
        CoreError::Conflict(company.name.clone())
    } else {
        CoreError::store(op, err)
    }
}

fn company_from_row(row: &SqliteRow) -> CoreResult<Company> {
    let decode = |e: sqlx::Error| CoreError::store("decode", e);

    let id: String = row.try_get("id").map_err(decode)?;
    let company_type: String = row.try_get("company_type").map_err(decode)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(decode)?;

    Ok(Company {
        id: Uuid::parse_str(&id).map_err(|e| CoreError::store("decode", e))?,
        name: row.try_get("name").map_err(decode)?,
        description: row.try_get("description").map_err(decode)?,
        amount_of_employees: row.try_get("amount_of_employees").map_err(decode)?,
        registered: row.try_get("registered").map_err(decode)?,
        company_type: CompanyType::from_str(&company_type)
            .map_err(|e| CoreError::store("decode", e))?,
        created_at,
        updated_at,
    })
}

#[async_trait]
impl CompanyRepository for SqliteCompanyRepository {
    async fn insert(&self, company: &Company) -> CoreResult<()> {
        sqlx::query(
            "INSERT INTO companies \
             (id, name, description, amount_of_employees, registered, company_type, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(company.id.to_string())
        .bind(&company.name)
        .bind(&company.description)
        .bind(company.amount_of_employees)
        .bind(company.registered)
        .bind(company.company_type.as_str())
        .bind(company.created_at)
        .bind(company.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error("insert", company, e))?;

        tracing::debug!("Inserted company {}", company.id);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> CoreResult<Option<Company>> {
        let row = sqlx::query(SELECT_BY_ID)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CoreError::store("get", e))?;

        row.as_ref().map(company_from_row).transpose()
    }

    async fn update(&self, company: &Company) -> CoreResult<()> {
        let result = sqlx::query(
            "UPDATE companies SET \
             name = ?, description = ?, amount_of_employees = ?, registered = ?, \
             company_type = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(&company.name)
        .bind(&company.description)
        .bind(company.amount_of_employees)
        .bind(company.registered)
        .bind(company.company_type.as_str())
        .bind(company.updated_at)
        .bind(company.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| write_error("update", company, e))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(company.id));
        }
        tracing::debug!("Updated company {}", company.id);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> CoreResult<bool> {
        let result = sqlx::query("DELETE FROM companies WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| CoreError::store("delete", e))?;

        Ok(result.rows_affected() > 0)
    }
}
