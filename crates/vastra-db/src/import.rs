//! # Product Import
//!
//! Upserts spreadsheet rows into the catalog by barcode.
//!
//! ```text
//! BEGIN
//!   for each row (1-based):
//!     parse_import_row ── Err ──► errors[]
//!        │
//!     SAVEPOINT
//!       category / manufacturer: get_or_create
//!       barcode known? ── yes ──► overwrite all fields   (updated)
//!                     └─ no ──► insert                   (inserted)
//!     RELEASE  (or ROLLBACK TO on failure ──► errors[])
//! COMMIT   unless nothing succeeded and something failed ──► ROLLBACK
//! ```
//!
//! Quantity is overwritten, never added, so importing the same sheet twice
//! leaves stock where the sheet says.

use sqlx::{Acquire, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use vastra_core::validation::parse_import_row;
use vastra_core::{
    ImportCells, ImportReport, ImportRowError, ProductChanges, ProductDraft, ProductUpsert,
    UpsertOutcome,
};

use crate::error::{DbError, DbResult};
use crate::pool::begin_write;
use crate::repository::catalog::{CatalogKind, CatalogRepository};
use crate::repository::product::ProductRepository;

/// Spreadsheet import upserter.
#[derive(Debug, Clone)]
pub struct ProductImporter {
    pool: SqlitePool,
}

impl ProductImporter {
    pub fn new(pool: SqlitePool) -> Self {
        ProductImporter { pool }
    }

    /// Imports a batch of rows.
    ///
    /// A failing row is recorded and skipped; the others still land.
    ///
    /// ## Errors
    /// - `DbError::ImportRejected` when every row failed (nothing written)
    pub async fn import(&self, rows: &[ImportCells]) -> DbResult<ImportReport> {
        let mut report = ImportReport::default();
        let mut tx = begin_write(&self.pool).await?;

        for (index, cells) in rows.iter().enumerate() {
            let row = index + 1;

            let upsert = match parse_import_row(cells) {
                Ok(upsert) => upsert,
                Err(err) => {
                    debug!(row, error = %err, "Import row rejected");
                    report.errors.push(ImportRowError {
                        row,
                        error: err.to_string(),
                    });
                    continue;
                }
            };

            let mut savepoint = (&mut *tx).begin().await?;
            match Self::upsert(&mut savepoint, &upsert).await {
                Ok(outcome) => {
                    savepoint.commit().await?;
                    report.record(outcome);
                }
                Err(err) => {
                    savepoint.rollback().await?;
                    warn!(row, barcode = %upsert.barcode, error = %err, "Import row failed");
                    report.errors.push(ImportRowError {
                        row,
                        error: err.to_string(),
                    });
                }
            }
        }

        if report.imported() == 0 && !report.errors.is_empty() {
            tx.rollback().await?;
            warn!(failed = report.errors.len(), "Import rejected, no rows imported");
            return Err(DbError::ImportRejected {
                errors: report.errors,
            });
        }

        tx.commit().await?;

        info!(
            inserted = report.inserted,
            updated = report.updated,
            failed = report.errors.len(),
            "Products imported"
        );
        Ok(report)
    }

    async fn upsert(conn: &mut SqliteConnection, row: &ProductUpsert) -> DbResult<UpsertOutcome> {
        let category_id =
            CatalogRepository::get_or_create(&mut *conn, CatalogKind::Category, &row.category)
                .await?;
        let manufacturer_id = CatalogRepository::get_or_create(
            &mut *conn,
            CatalogKind::Manufacturer,
            &row.manufacturer,
        )
        .await?;

        let fields = ProductChanges {
            category_id,
            manufacturer_id,
            quantity: row.quantity,
            cost_price: row.cost_price,
            sale_price: row.sale_price,
        };

        match ProductRepository::id_by_barcode(&mut *conn, &row.barcode).await? {
            Some(id) => {
                ProductRepository::overwrite(&mut *conn, id, &fields).await?;
                Ok(UpsertOutcome::Updated)
            }
            None => {
                let draft = ProductDraft {
                    barcode: row.barcode.clone(),
                    fields,
                };
                ProductRepository::insert(&mut *conn, &draft).await?;
                Ok(UpsertOutcome::Inserted)
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use vastra_core::Money;

    fn cells(barcode: &str, category: &str, maker: &str, qty: &str, cost: &str, sale: &str) -> ImportCells {
        ImportCells {
            barcode: barcode.into(),
            category: category.into(),
            manufacturer: maker.into(),
            quantity: qty.into(),
            cost_price: cost.into(),
            sale_price: sale.into(),
        }
    }

    async fn count(db: &Database, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_existing_overwritten_new_inserted() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let importer = db.importer();

        importer
            .import(&[cells("SAR-0001", "Sarees", "Kanchi Weavers", "31", "1000", "2000")])
            .await
            .unwrap();

        let report = importer
            .import(&[
                cells("SAR-0001", "Silk Sarees", "Kanchi Weavers", "12", "1100", "2250.50"),
                cells("KUR-0001", "Kurtis", "Jaipur Prints", "8", "400", "799"),
            ])
            .await
            .unwrap();

        assert_eq!(report.inserted, 1);
        assert_eq!(report.updated, 1);
        assert!(report.errors.is_empty());

        let saree = db.products().get_by_barcode("SAR-0001").await.unwrap().unwrap();
        assert_eq!(saree.category, "Silk Sarees");
        assert_eq!(saree.product.quantity, 12);
        assert_eq!(saree.product.cost_price, Money::from_rupees(1100));
        assert_eq!(saree.product.sale_price, Money::from_paise(225_050));

        let kurti = db.products().get_by_barcode("KUR-0001").await.unwrap().unwrap();
        assert_eq!(kurti.manufacturer, "Jaipur Prints");

        assert_eq!(count(&db, "products").await, 2);
        assert_eq!(count(&db, "categories").await, 3);
        assert_eq!(count(&db, "manufacturers").await, 2);
    }

    #[tokio::test]
    async fn test_reimport_creates_no_duplicates() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let sheet = vec![
            cells("SAR-0001", "Sarees", "Kanchi Weavers", "31", "1000", "2000"),
            cells("SAR-0002", "Sarees", "Kanchi Weavers", "5", "900", "1800"),
        ];

        let first = db.importer().import(&sheet).await.unwrap();
        let second = db.importer().import(&sheet).await.unwrap();

        assert_eq!((first.inserted, first.updated), (2, 0));
        assert_eq!((second.inserted, second.updated), (0, 2));
        assert_eq!(count(&db, "products").await, 2);
        assert_eq!(count(&db, "categories").await, 1);
        assert_eq!(count(&db, "manufacturers").await, 1);

        let saree = db.products().get_by_barcode("SAR-0001").await.unwrap().unwrap();
        assert_eq!(saree.product.quantity, 31);
    }

    #[tokio::test]
    async fn test_bad_rows_reported_good_rows_kept() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let report = db
            .importer()
            .import(&[
                cells("SAR-0001", "Sarees", "Kanchi Weavers", "31", "1000", "2000"),
                cells("", "Sarees", "Kanchi Weavers", "1", "1", "1"),
                cells("SAR-0003", "Sarees", "Kanchi Weavers", "2.5", "1", "1"),
                cells("SAR-0004", "Lehengas", "Kanchi Weavers", "3", "abc", "1"),
            ])
            .await
            .unwrap();

        assert_eq!(report.imported(), 1);
        let rows: Vec<_> = report.errors.iter().map(|e| e.row).collect();
        assert_eq!(rows, vec![2, 3, 4]);

        assert_eq!(count(&db, "products").await, 1);
        // The failed Lehengas row never reached the database
        assert_eq!(count(&db, "categories").await, 1);
    }

    #[tokio::test]
    async fn test_storage_failure_undoes_only_its_row() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        sqlx::query(
            "CREATE TRIGGER block_dup_barcode BEFORE INSERT ON products \
             WHEN NEW.barcode = 'DUP-0001' \
             BEGIN SELECT RAISE(ABORT, 'barcode blocked'); END",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let report = db
            .importer()
            .import(&[
                cells("KUR-0001", "Kurtis", "Jaipur Prints", "8", "400", "799"),
                cells("DUP-0001", "Dupattas", "Banaras Silk House", "4", "300", "650"),
                cells("KUR-0002", "Kurtis", "Jaipur Prints", "6", "420", "849"),
            ])
            .await
            .unwrap();

        assert_eq!(report.inserted, 2);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].row, 2);

        assert!(db.products().get_by_barcode("KUR-0001").await.unwrap().is_some());
        assert!(db.products().get_by_barcode("KUR-0002").await.unwrap().is_some());
        assert!(db.products().get_by_barcode("DUP-0001").await.unwrap().is_none());

        // Category and manufacturer created for the failed row were rolled back too
        assert_eq!(count(&db, "categories").await, 1);
        assert_eq!(count(&db, "manufacturers").await, 1);
    }

    #[tokio::test]
    async fn test_nothing_imported_is_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let err = db
            .importer()
            .import(&[
                cells("", "Sarees", "Kanchi Weavers", "1", "1", "1"),
                cells("SAR-0002", "", "Kanchi Weavers", "1", "1", "1"),
            ])
            .await
            .unwrap_err();

        match err {
            DbError::ImportRejected { errors } => assert_eq!(errors.len(), 2),
            other => panic!("expected ImportRejected, got {other:?}"),
        }
        assert_eq!(count(&db, "products").await, 0);
        assert_eq!(count(&db, "categories").await, 0);
    }

    #[tokio::test]
    async fn test_empty_batch_is_empty_report() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let report = db.importer().import(&[]).await.unwrap();
        assert_eq!(report, ImportReport::default());
    }
}
