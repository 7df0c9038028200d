//! # Catalog Repository
//!
//! Categories and manufacturers: both are `(id, unique name)` tables that
//! products reference, so one repository serves both.
//!
//! ```text
//! POST /api/categories {name}      ──► create(Category, name)  ──► 201 / 409
//! import row "Sarees"              ──► get_or_create(..)        ──► id
//! ```

use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;
use vastra_core::{Category, Manufacturer};

use crate::error::{DbError, DbResult};

/// Which catalog table to operate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Category,
    Manufacturer,
}

impl CatalogKind {
    const fn table(&self) -> &'static str {
        match self {
            CatalogKind::Category => "categories",
            CatalogKind::Manufacturer => "manufacturers",
        }
    }

    /// Singular name used in messages and errors.
    pub const fn label(&self) -> &'static str {
        match self {
            CatalogKind::Category => "category",
            CatalogKind::Manufacturer => "manufacturer",
        }
    }
}

/// A catalog row. Converts into the typed [`Category`] / [`Manufacturer`].
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CatalogEntry {
    pub id: i64,
    pub name: String,
}

impl From<CatalogEntry> for Category {
    fn from(entry: CatalogEntry) -> Self {
        Category {
            id: entry.id,
            name: entry.name,
        }
    }
}

impl From<CatalogEntry> for Manufacturer {
    fn from(entry: CatalogEntry) -> Self {
        Manufacturer {
            id: entry.id,
            name: entry.name,
        }
    }
}

/// Repository for category and manufacturer operations.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Lists all entries ordered by name.
    pub async fn list(&self, kind: CatalogKind) -> DbResult<Vec<CatalogEntry>> {
        let sql = format!("SELECT id, name FROM {} ORDER BY name", kind.table());
        let entries = sqlx::query_as::<_, CatalogEntry>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(kind = kind.label(), count = entries.len(), "Listed catalog");
        Ok(entries)
    }

    /// All categories ordered by name.
    pub async fn categories(&self) -> DbResult<Vec<Category>> {
        Ok(self
            .list(CatalogKind::Category)
            .await?
            .into_iter()
            .map(Category::from)
            .collect())
    }

    /// All manufacturers ordered by name.
    pub async fn manufacturers(&self) -> DbResult<Vec<Manufacturer>> {
        Ok(self
            .list(CatalogKind::Manufacturer)
            .await?
            .into_iter()
            .map(Manufacturer::from)
            .collect())
    }

    /// Inserts a new entry.
    ///
    /// ## Errors
    /// - `DbError::UniqueViolation` if the name already exists
    pub async fn create(&self, kind: CatalogKind, name: &str) -> DbResult<CatalogEntry> {
        let id = Self::insert(&self.pool, kind, name)
            .await
            .map_err(|e| e.with_value(name))?;

        debug!(kind = kind.label(), id, name, "Catalog entry created");
        Ok(CatalogEntry {
            id,
            name: name.to_string(),
        })
    }

    // =========================================================================
    // Executor-level operations (usable inside a transaction)
    // =========================================================================

    pub async fn insert<'e, E>(executor: E, kind: CatalogKind, name: &str) -> DbResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("INSERT INTO {} (name) VALUES (?)", kind.table());
        let result = sqlx::query(&sql).bind(name).execute(executor).await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn find_id<'e, E>(executor: E, kind: CatalogKind, name: &str) -> DbResult<Option<i64>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("SELECT id FROM {} WHERE name = ?", kind.table());
        let id = sqlx::query_scalar::<_, i64>(&sql)
            .bind(name)
            .fetch_optional(executor)
            .await?;
        Ok(id)
    }

    /// Returns the id for `name`, inserting it first if it does not exist.
    pub async fn get_or_create(
        conn: &mut sqlx::SqliteConnection,
        kind: CatalogKind,
        name: &str,
    ) -> DbResult<i64> {
        if let Some(id) = Self::find_id(&mut *conn, kind, name).await? {
            return Ok(id);
        }

        let id = Self::insert(&mut *conn, kind, name).await?;
        debug!(kind = kind.label(), id, name, "Catalog entry created on demand");
        Ok(id)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
