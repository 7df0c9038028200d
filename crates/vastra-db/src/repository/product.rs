//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Joined listing and lookup (by id, by barcode)
//! - Admin create / full update / quantity set
//! - Stock movements applied by the sale ledger
//!
//! ## Guarded Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  StockMovement { product_id: 42, delta: -3 }                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE products SET quantity = quantity - 3                            │
//! │   WHERE id = 42 AND quantity >= 3          ← one statement, no race     │
//! │       │                                                                 │
//! │       ├── 1 row  → done                                                 │
//! │       └── 0 rows → look again:                                          │
//! │              ├── no product  → ProductNotFound(42)                      │
//! │              └── stock = 2   → InsufficientStock { 2, 3 }               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{Executor, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, warn};
use vastra_core::{CoreError, ProductChanges, ProductDraft, ProductView, StockMovement, StockPolicy};

use crate::error::{DbError, DbResult};

const VIEW_SELECT: &str = r#"
    SELECT
        p.id,
        p.barcode,
        p.category_id,
        p.manufacturer_id,
        p.quantity,
        p.cost_price,
        p.sale_price,
        c.name AS category,
        m.name AS manufacturer
    FROM products p
    JOIN categories c ON c.id = p.category_id
    JOIN manufacturers m ON m.id = p.manufacturer_id
"#;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// // Counter scan
/// let product = repo.get_by_barcode("SAR-0042").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists all products with category and manufacturer names.
    pub async fn list(&self) -> DbResult<Vec<ProductView>> {
        let sql = format!("{VIEW_SELECT} ORDER BY p.id");
        let products = sqlx::query_as::<_, ProductView>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Gets a product by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<ProductView>> {
        Self::view_by_id(&self.pool, id).await
    }

    /// Gets a product by barcode. This is the counter's scan lookup.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<ProductView>> {
        debug!(barcode, "Looking up product by barcode");

        let sql = format!("{VIEW_SELECT} WHERE p.barcode = ?");
        let product = sqlx::query_as::<_, ProductView>(&sql)
            .bind(barcode)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Inserts a new product and returns it joined.
    ///
    /// ## Errors
    /// - `DbError::UniqueViolation` if the barcode exists
    /// - `DbError::ForeignKeyViolation` if the category/manufacturer id is unknown
    pub async fn create(&self, draft: &ProductDraft) -> DbResult<ProductView> {
        debug!(barcode = %draft.barcode, "Inserting product");

        let id = Self::insert(&self.pool, draft)
            .await
            .map_err(|e| e.with_value(draft.barcode.as_str()))?;

        Self::view_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Overwrites every field except the barcode.
    pub async fn update(&self, id: i64, changes: &ProductChanges) -> DbResult<ProductView> {
        debug!(id, "Updating product");

        if Self::overwrite(&self.pool, id, changes).await? == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Self::view_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Sets the stock level directly (stock take, corrections).
    pub async fn set_quantity(&self, id: i64, quantity: i64) -> DbResult<()> {
        debug!(id, quantity, "Setting product quantity");

        let result = sqlx::query("UPDATE products SET quantity = ? WHERE id = ?")
            .bind(quantity)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    // =========================================================================
    // Executor-level operations (usable inside a transaction)
    // =========================================================================

    pub async fn view_by_id<'e, E>(executor: E, id: i64) -> DbResult<Option<ProductView>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("{VIEW_SELECT} WHERE p.id = ?");
        let product = sqlx::query_as::<_, ProductView>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(product)
    }

    /// Id of the product with this barcode, if any.
    pub async fn id_by_barcode<'e, E>(executor: E, barcode: &str) -> DbResult<Option<i64>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id = sqlx::query_scalar::<_, i64>("SELECT id FROM products WHERE barcode = ?")
            .bind(barcode)
            .fetch_optional(executor)
            .await?;
        Ok(id)
    }

    pub async fn insert<'e, E>(executor: E, draft: &ProductDraft) -> DbResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let fields = &draft.fields;
        let result = sqlx::query(
            r#"
            INSERT INTO products
                (barcode, category_id, manufacturer_id, quantity, cost_price, sale_price)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&draft.barcode)
        .bind(fields.category_id)
        .bind(fields.manufacturer_id)
        .bind(fields.quantity)
        .bind(fields.cost_price)
        .bind(fields.sale_price)
        .execute(executor)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Returns the number of rows changed (0 when the id is unknown).
    pub async fn overwrite<'e, E>(executor: E, id: i64, changes: &ProductChanges) -> DbResult<u64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET category_id = ?, manufacturer_id = ?, quantity = ?, cost_price = ?, sale_price = ?
            WHERE id = ?
            "#,
        )
        .bind(changes.category_id)
        .bind(changes.manufacturer_id)
        .bind(changes.quantity)
        .bind(changes.cost_price)
        .bind(changes.sale_price)
        .bind(id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn quantity_of<'e, E>(executor: E, id: i64) -> DbResult<Option<i64>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let quantity = sqlx::query_scalar::<_, i64>("SELECT quantity FROM products WHERE id = ?")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(quantity)
    }

    /// Applies one net stock movement.
    ///
    /// Decrements fail on an unknown product, and under
    /// [`StockPolicy::Enforce`] on insufficient stock. Restores to a product
    /// that no longer exists are skipped.
    pub async fn apply_movement(
        conn: &mut SqliteConnection,
        movement: StockMovement,
        policy: StockPolicy,
    ) -> DbResult<()> {
        let StockMovement { product_id, delta } = movement;
        let guarded = movement.is_decrement() && policy == StockPolicy::Enforce;

        let result = if guarded {
            sqlx::query("UPDATE products SET quantity = quantity + ? WHERE id = ? AND quantity >= ?")
                .bind(delta)
                .bind(product_id)
                .bind(-delta)
                .execute(&mut *conn)
                .await?
        } else {
            sqlx::query("UPDATE products SET quantity = quantity + ? WHERE id = ?")
                .bind(delta)
                .bind(product_id)
                .execute(&mut *conn)
                .await?
        };

        if result.rows_affected() == 1 {
            debug!(product_id, delta, "Stock adjusted");
            return Ok(());
        }

        match Self::quantity_of(&mut *conn, product_id).await? {
            None if movement.is_decrement() => Err(CoreError::ProductNotFound(product_id).into()),
            None => {
                warn!(product_id, delta, "Product gone, stock restore skipped");
                Ok(())
            }
            Some(available) => Err(CoreError::InsufficientStock {
                product_id,
                available,
                requested: -delta,
            }
            .into()),
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
    use crate::repository::catalog::CatalogKind;
    use vastra_core::Money;

    async fn setup() -> (Database, ProductChanges) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let category = db.catalog().create(CatalogKind::Category, "Sarees").await.unwrap();
        let maker = db
            .catalog()
            .create(CatalogKind::Manufacturer, "Kanchi Weavers")
            .await
            .unwrap();

        let fields = ProductChanges {
            category_id: category.id,
            manufacturer_id: maker.id,
            quantity: 10,
            cost_price: Money::from_rupees(1400),
            sale_price: Money::from_rupees(2000),
        };
        (db, fields)
    }

    fn draft(barcode: &str, fields: &ProductChanges) -> ProductDraft {
        ProductDraft {
            barcode: barcode.to_string(),
            fields: fields.clone(),
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let (db, fields) = setup().await;
        let repo = db.products();

        let created = repo.create(&draft("SAR-0001", &fields)).await.unwrap();
        assert_eq!(created.category, "Sarees");
        assert_eq!(created.manufacturer, "Kanchi Weavers");
        assert_eq!(created.product.sale_price, Money::from_rupees(2000));

        let by_barcode = repo.get_by_barcode("SAR-0001").await.unwrap().unwrap();
        assert_eq!(by_barcode.product.id, created.product.id);

        assert!(repo.get_by_barcode("NOPE").await.unwrap().is_none());
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_barcode() {
        let (db, fields) = setup().await;
        let repo = db.products();

        repo.create(&draft("SAR-0001", &fields)).await.unwrap();
        let err = repo.create(&draft("SAR-0001", &fields)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref value, .. } if value == "SAR-0001"));
    }

    #[tokio::test]
    async fn test_unknown_category_is_foreign_key_violation() {
        let (db, mut fields) = setup().await;
        fields.category_id = 999;

        let err = db.products().create(&draft("SAR-0001", &fields)).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_update_and_set_quantity() {
        let (db, fields) = setup().await;
        let repo = db.products();
        let id = repo.create(&draft("SAR-0001", &fields)).await.unwrap().product.id;

        let mut changes = fields.clone();
        changes.sale_price = Money::from_paise(189_950);
        changes.quantity = 4;
        let updated = repo.update(id, &changes).await.unwrap();
        assert_eq!(updated.product.sale_price, Money::from_paise(189_950));
        assert_eq!(updated.product.barcode, "SAR-0001");

        repo.set_quantity(id, 25).await.unwrap();
        assert_eq!(repo.get_by_id(id).await.unwrap().unwrap().product.quantity, 25);

        assert!(matches!(repo.set_quantity(404, 1).await, Err(DbError::NotFound { .. })));
        assert!(matches!(repo.update(404, &changes).await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_guarded_decrement() {
        let (db, fields) = setup().await;
        let id = db.products().create(&draft("SAR-0001", &fields)).await.unwrap().product.id;
        let mut conn = db.pool().acquire().await.unwrap();

        let take = |delta| StockMovement { product_id: id, delta };

        ProductRepository::apply_movement(&mut conn, take(-4), StockPolicy::Enforce)
            .await
            .unwrap();
        assert_eq!(ProductRepository::quantity_of(&mut *conn, id).await.unwrap(), Some(6));

        let err = ProductRepository::apply_movement(&mut conn, take(-7), StockPolicy::Enforce)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 6, requested: 7, .. })
        ));

        // Permissive policy lets stock go negative
        ProductRepository::apply_movement(&mut conn, take(-7), StockPolicy::AllowNegative)
            .await
            .unwrap();
        assert_eq!(ProductRepository::quantity_of(&mut *conn, id).await.unwrap(), Some(-1));
    }

    #[tokio::test]
    async fn test_movement_on_missing_product() {
        let (db, _) = setup().await;
        let mut conn = db.pool().acquire().await.unwrap();

        let err = ProductRepository::apply_movement(
            &mut conn,
            StockMovement { product_id: 77, delta: -1 },
            StockPolicy::AllowNegative,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ProductNotFound(77))));

        // Restores degrade quietly
        ProductRepository::apply_movement(
            &mut conn,
            StockMovement { product_id: 77, delta: 3 },
            StockPolicy::Enforce,
        )
        .await
        .unwrap();
    }
}
