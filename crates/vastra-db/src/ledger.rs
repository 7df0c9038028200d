//! # Sale Ledger
//!
//! Create, replace and delete sales as single transactions spanning the
//! header, its items and the stock of every product involved.
//!
//! ## Transaction Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create(NewSale)                                                        │
//! │    validate ──► BEGIN                                                   │
//! │                  ├── last_number(type) → DocumentNumber::following      │
//! │                  ├── insert_header(date = shop clock)                   │
//! │                  ├── insert_items                                       │
//! │                  └── apply StockPlan::for_create                        │
//! │                 COMMIT ──► re-read detail (items + barcode)             │
//! │                                                                         │
//! │  replace(id, SaleRevision)                                              │
//! │    validate ──► BEGIN                                                   │
//! │                  ├── header? else SaleNotFound                          │
//! │                  ├── apply StockPlan::for_replace(old, new)             │
//! │                  ├── update_totals                                      │
//! │                  └── delete_items + insert_items                        │
//! │                 COMMIT                                                  │
//! │                                                                         │
//! │  delete(id)                                                             │
//! │    BEGIN ├── header? else SaleNotFound                                  │
//! │          ├── apply StockPlan::for_delete(old)                           │
//! │          └── delete_items + delete_header                               │
//! │    COMMIT                                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any `?` between BEGIN and COMMIT drops the transaction, which rolls it
//! back. Nothing is visible to readers until COMMIT.
//!
//! BEGIN is `BEGIN IMMEDIATE`: a second writer waits for the first to
//! commit rather than failing with `database is locked`.

use chrono::{FixedOffset, NaiveDateTime, Offset, SubsecRound, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use vastra_core::validation::validate_sale_lines;
use vastra_core::{
    CoreError, DocumentNumber, NewSale, Sale, SaleDetail, SaleRevision, StockPlan, StockPolicy,
};

use crate::error::{DbError, DbResult};
use crate::pool::begin_write;
use crate::repository::product::ProductRepository;
use crate::repository::sale::SaleRepository;

/// IST, UTC+05:30.
const IST_OFFSET_SECONDS: i32 = 330 * 60;

// =============================================================================
// Shop Clock
// =============================================================================

/// The shop's wall clock. Sales are stamped in local time so that a
/// "today" report means the shop's today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShopClock {
    offset: FixedOffset,
}

impl ShopClock {
    pub fn new(offset: FixedOffset) -> Self {
        ShopClock { offset }
    }

    /// Clock for an offset in minutes east of UTC, `None` if out of range.
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(ShopClock::new)
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Current local time, whole seconds.
    pub fn now(&self) -> NaiveDateTime {
        Utc::now()
            .with_timezone(&self.offset)
            .naive_local()
            .trunc_subsecs(0)
    }
}

impl Default for ShopClock {
    fn default() -> Self {
        let offset = FixedOffset::east_opt(IST_OFFSET_SECONDS).unwrap_or_else(|| Utc.fix());
        ShopClock { offset }
    }
}

// =============================================================================
// Sale Ledger
// =============================================================================

/// Sale Transaction Manager.
///
/// ## Usage
/// ```rust,ignore
/// let detail = db.ledger().create(&new_sale).await?;
/// assert_eq!(detail.sale.number, "BILL-0001");
/// ```
#[derive(Debug, Clone)]
pub struct SaleLedger {
    pool: SqlitePool,
    policy: StockPolicy,
    clock: ShopClock,
}

impl SaleLedger {
    pub fn new(pool: SqlitePool, policy: StockPolicy, clock: ShopClock) -> Self {
        SaleLedger {
            pool,
            policy,
            clock,
        }
    }

    /// Records a new bill or estimate and takes its stock.
    ///
    /// Returns the persisted sale with `id`, `number`, `date` and items.
    ///
    /// ## Errors
    /// - `EmptySale` / `Validation` before anything is written
    /// - `ProductNotFound`, `InsufficientStock`: whole sale rolled back
    pub async fn create(&self, sale: &NewSale) -> DbResult<SaleDetail> {
        validate_sale_lines(&sale.lines)?;

        let plan = StockPlan::for_create(&sale.lines);
        let totals = sale.totals.resolve(&sale.lines);
        let date = self.clock.now();

        let mut tx = begin_write(&self.pool).await?;

        let last = SaleRepository::last_number(&mut *tx, sale.sale_type).await?;
        let number = DocumentNumber::following(sale.sale_type, last.as_deref()).to_string();
        debug!(%number, "Next document number");

        let sale_id = SaleRepository::insert_header(&mut *tx, sale, &number, date, &totals).await?;
        SaleRepository::insert_items(&mut tx, sale_id, &sale.lines).await?;
        self.apply(&mut tx, &plan).await?;

        tx.commit().await?;

        info!(
            sale_id,
            %number,
            lines = sale.lines.len(),
            total = %totals.final_amount,
            "Sale created"
        );

        self.reload(sale_id).await
    }

    /// Replaces a sale's totals and items, moving stock by the difference.
    ///
    /// `number`, `date`, customer fields and type are kept.
    pub async fn replace(&self, sale_id: i64, revision: &SaleRevision) -> DbResult<SaleDetail> {
        validate_sale_lines(&revision.lines)?;

        let totals = revision.totals.resolve(&revision.lines);

        let mut tx = begin_write(&self.pool).await?;

        let header = Self::require_header(&mut tx, sale_id).await?;
        let old_items = SaleRepository::fetch_items(&mut *tx, sale_id).await?;
        let plan = StockPlan::for_replace(&old_items, &revision.lines);

        self.apply(&mut tx, &plan).await?;
        SaleRepository::update_totals(&mut *tx, sale_id, &totals).await?;
        SaleRepository::delete_items(&mut *tx, sale_id).await?;
        SaleRepository::insert_items(&mut tx, sale_id, &revision.lines).await?;

        tx.commit().await?;

        info!(
            sale_id,
            number = %header.number,
            products_moved = plan.len(),
            "Sale replaced"
        );

        self.reload(sale_id).await
    }

    /// Deletes a sale and puts its stock back.
    ///
    /// Returns the deleted header.
    pub async fn delete(&self, sale_id: i64) -> DbResult<Sale> {
        let mut tx = begin_write(&self.pool).await?;

        let header = Self::require_header(&mut tx, sale_id).await?;
        let old_items = SaleRepository::fetch_items(&mut *tx, sale_id).await?;
        let plan = StockPlan::for_delete(&old_items);

        self.apply(&mut tx, &plan).await?;
        SaleRepository::delete_items(&mut *tx, sale_id).await?;
        SaleRepository::delete_header(&mut *tx, sale_id).await?;

        tx.commit().await?;

        info!(
            sale_id,
            number = %header.number,
            restored_products = plan.len(),
            "Sale deleted"
        );

        Ok(header)
    }

    async fn require_header(conn: &mut SqliteConnection, sale_id: i64) -> DbResult<Sale> {
        SaleRepository::fetch_header(&mut *conn, sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id).into())
    }

    async fn apply(&self, conn: &mut SqliteConnection, plan: &StockPlan) -> DbResult<()> {
        for movement in plan.movements() {
            if let Err(err) = ProductRepository::apply_movement(&mut *conn, movement, self.policy).await {
                warn!(
                    product_id = movement.product_id,
                    delta = movement.delta,
                    error = %err,
                    "Stock movement rejected, rolling back"
                );
                return Err(err);
            }
        }
        Ok(())
    }

    async fn reload(&self, sale_id: i64) -> DbResult<SaleDetail> {
        SaleRepository::new(self.pool.clone())
            .detail(sale_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", sale_id))
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
    use vastra_core::{
        CustomerDetails, Money, PaymentMode, ProductChanges, ProductDraft, SaleLine, SaleTotals,
        SaleType,
    };

    struct Shop {
        db: Database,
        saree: i64,
        kurti: i64,
    }

    async fn shop_with(config: DbConfig) -> Shop {
        let db = Database::new(config).await.unwrap();
        let sarees = db.catalog().create(CatalogKind::Category, "Sarees").await.unwrap();
        let kurtis = db.catalog().create(CatalogKind::Category, "Kurtis").await.unwrap();
        let maker = db
            .catalog()
            .create(CatalogKind::Manufacturer, "Kanchi Weavers")
            .await
            .unwrap();

        let add = |barcode: &str, category_id: i64, quantity: i64, rupees: i64| ProductDraft {
            barcode: barcode.to_string(),
            fields: ProductChanges {
                category_id,
                manufacturer_id: maker.id,
                quantity,
                cost_price: Money::from_rupees(rupees / 2),
                sale_price: Money::from_rupees(rupees),
            },
        };

        let saree = db.products().create(&add("SAR-0001", sarees.id, 31, 2000)).await.unwrap();
        let kurti = db.products().create(&add("KUR-0001", kurtis.id, 10, 800)).await.unwrap();

        Shop {
            db,
            saree: saree.product.id,
            kurti: kurti.product.id,
        }
    }

    async fn shop() -> Shop {
        shop_with(DbConfig::in_memory()).await
    }

    fn line(product_id: i64, category: &str, rupees: i64, quantity: i64) -> SaleLine {
        SaleLine {
            product_id,
            category_name: category.to_string(),
            sale_price: Money::from_rupees(rupees),
            quantity,
        }
    }

    fn bill(lines: Vec<SaleLine>) -> NewSale {
        NewSale {
            sale_type: SaleType::Bill,
            customer: CustomerDetails::default(),
            payment_mode: Some(PaymentMode::Cash),
            remarks: None,
            totals: SaleTotals::default(),
            lines,
        }
    }

    async fn stock(shop: &Shop, id: i64) -> i64 {
        shop.db.products().get_by_id(id).await.unwrap().unwrap().product.quantity
    }

    async fn sale_count(shop: &Shop) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(shop.db.pool())
            .await
            .unwrap()
    }

    async fn item_count(shop: &Shop) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM sale_items")
            .fetch_one(shop.db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_first_bill() {
        let shop = shop().await;

        let detail = shop
            .db
            .ledger()
            .create(&bill(vec![line(shop.saree, "Sarees", 2000, 2)]))
            .await
            .unwrap();

        assert_eq!(detail.sale.number, "BILL-0001");
        assert_eq!(detail.sale.customer_name, vastra_core::WALK_IN_CUSTOMER);
        assert_eq!(detail.sale.total_amount, Money::from_rupees(4000));
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].item_final_price, Money::from_rupees(4000));
        assert_eq!(detail.items[0].barcode.as_deref(), Some("SAR-0001"));
        assert_eq!(stock(&shop, shop.saree).await, 29);
    }

    #[tokio::test]
    async fn test_numbers_increase_per_type() {
        let shop = shop().await;
        let ledger = shop.db.ledger();

        let mut estimate = bill(vec![line(shop.kurti, "Kurtis", 800, 1)]);
        estimate.sale_type = SaleType::Estimate;

        let a = ledger.create(&bill(vec![line(shop.saree, "Sarees", 2000, 1)])).await.unwrap();
        let e = ledger.create(&estimate).await.unwrap();
        let b = ledger.create(&bill(vec![line(shop.saree, "Sarees", 2000, 1)])).await.unwrap();

        assert_eq!(a.sale.number, "BILL-0001");
        assert_eq!(e.sale.number, "EST-0001");
        assert_eq!(b.sale.number, "BILL-0002");
    }

    #[tokio::test]
    async fn test_item_price_computed_server_side() {
        let shop = shop().await;
        let detail = shop
            .db
            .ledger()
            .create(&bill(vec![line(shop.saree, "Sarees", 2000, 3)]))
            .await
            .unwrap();

        assert_eq!(detail.items[0].item_final_price, Money::from_rupees(6000));
        assert_eq!(stock(&shop, shop.saree).await, 28);
    }

    #[tokio::test]
    async fn test_create_then_delete_restores_stock() {
        let shop = shop().await;
        let ledger = shop.db.ledger();

        let detail = ledger
            .create(&bill(vec![
                line(shop.saree, "Sarees", 2000, 3),
                line(shop.kurti, "Kurtis", 800, 2),
                line(shop.saree, "Sarees", 1800, 1),
            ]))
            .await
            .unwrap();
        assert_eq!(stock(&shop, shop.saree).await, 27);
        assert_eq!(stock(&shop, shop.kurti).await, 8);

        let deleted = ledger.delete(detail.sale.id).await.unwrap();
        assert_eq!(deleted.number, "BILL-0001");

        assert_eq!(stock(&shop, shop.saree).await, 31);
        assert_eq!(stock(&shop, shop.kurti).await, 10);
        assert_eq!(sale_count(&shop).await, 0);
        assert_eq!(item_count(&shop).await, 0);
    }

    #[tokio::test]
    async fn test_replace_moves_only_the_difference() {
        let shop = shop().await;
        let ledger = shop.db.ledger();

        let detail = ledger
            .create(&bill(vec![line(shop.saree, "Sarees", 2000, 3)]))
            .await
            .unwrap();
        assert_eq!(stock(&shop, shop.saree).await, 28);

        // 3 -> 5 takes 2 more
        let revised = ledger
            .replace(
                detail.sale.id,
                &SaleRevision {
                    totals: SaleTotals::default(),
                    lines: vec![line(shop.saree, "Sarees", 2000, 5)],
                },
            )
            .await
            .unwrap();
        assert_eq!(stock(&shop, shop.saree).await, 26);
        assert_eq!(revised.sale.total_amount, Money::from_rupees(10_000));
        assert_eq!(revised.sale.number, detail.sale.number);
        assert_eq!(revised.sale.date, detail.sale.date);

        // Drop the saree, add a kurti
        ledger
            .replace(
                detail.sale.id,
                &SaleRevision {
                    totals: SaleTotals {
                        total_discount: Some(Money::from_rupees(50)),
                        ..Default::default()
                    },
                    lines: vec![line(shop.kurti, "Kurtis", 800, 1)],
                },
            )
            .await
            .unwrap();
        assert_eq!(stock(&shop, shop.saree).await, 31);
        assert_eq!(stock(&shop, shop.kurti).await, 9);

        let sale = shop.db.sales().get(detail.sale.id).await.unwrap().unwrap();
        assert_eq!(sale.total_discount, Money::from_rupees(50));
        assert_eq!(sale.final_amount, Money::from_rupees(750));
        assert_eq!(item_count(&shop).await, 1);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back_everything() {
        let shop = shop().await;

        let err = shop
            .db
            .ledger()
            .create(&bill(vec![
                line(shop.kurti, "Kurtis", 800, 2),
                line(shop.saree, "Sarees", 2000, 32),
            ]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 31, requested: 32, .. })
        ));
        assert_eq!(sale_count(&shop).await, 0);
        assert_eq!(item_count(&shop).await, 0);
        assert_eq!(stock(&shop, shop.kurti).await, 10);
        assert_eq!(stock(&shop, shop.saree).await, 31);
    }

    #[tokio::test]
    async fn test_duplicate_lines_checked_on_aggregate() {
        let shop = shop().await;

        // 6 + 5 > 10 even though each line alone fits
        let err = shop
            .db
            .ledger()
            .create(&bill(vec![
                line(shop.kurti, "Kurtis", 800, 6),
                line(shop.kurti, "Kurtis", 700, 5),
            ]))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InsufficientStock { .. })));
    }

    #[tokio::test]
    async fn test_unknown_product_rolls_back() {
        let shop = shop().await;

        let err = shop
            .db
            .ledger()
            .create(&bill(vec![
                line(shop.saree, "Sarees", 2000, 1),
                line(9999, "Sarees", 2000, 1),
            ]))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Domain(CoreError::ProductNotFound(9999))));
        assert_eq!(sale_count(&shop).await, 0);
        assert_eq!(stock(&shop, shop.saree).await, 31);
    }

    #[tokio::test]
    async fn test_failed_create_consumes_no_number() {
        let shop = shop().await;
        let ledger = shop.db.ledger();

        ledger
            .create(&bill(vec![line(shop.saree, "Sarees", 2000, 100)]))
            .await
            .unwrap_err();
        let ok = ledger
            .create(&bill(vec![line(shop.saree, "Sarees", 2000, 1)]))
            .await
            .unwrap();
        assert_eq!(ok.sale.number, "BILL-0001");
    }

    #[tokio::test]
    async fn test_failed_replace_changes_nothing() {
        let shop = shop().await;
        let ledger = shop.db.ledger();

        let detail = ledger
            .create(&bill(vec![line(shop.kurti, "Kurtis", 800, 2)]))
            .await
            .unwrap();

        let err = ledger
            .replace(
                detail.sale.id,
                &SaleRevision {
                    totals: SaleTotals::default(),
                    lines: vec![line(shop.kurti, "Kurtis", 800, 50)],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InsufficientStock { .. })));

        assert_eq!(stock(&shop, shop.kurti).await, 8);
        let items = shop.db.sales().items(detail.sale.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_allow_negative_policy() {
        let shop = shop_with(DbConfig::in_memory().stock_policy(StockPolicy::AllowNegative)).await;

        shop.db
            .ledger()
            .create(&bill(vec![line(shop.kurti, "Kurtis", 800, 12)]))
            .await
            .unwrap();
        assert_eq!(stock(&shop, shop.kurti).await, -2);
    }

    #[tokio::test]
    async fn test_missing_sale() {
        let shop = shop().await;
        let ledger = shop.db.ledger();

        assert!(matches!(
            ledger.delete(42).await,
            Err(DbError::Domain(CoreError::SaleNotFound(42)))
        ));
        assert!(matches!(
            ledger
                .replace(
                    42,
                    &SaleRevision {
                        totals: SaleTotals::default(),
                        lines: vec![line(shop.saree, "Sarees", 2000, 1)],
                    },
                )
                .await,
            Err(DbError::Domain(CoreError::SaleNotFound(42)))
        ));
        assert_eq!(stock(&shop, shop.saree).await, 31);
    }

    #[tokio::test]
    async fn test_empty_sale_rejected() {
        let shop = shop().await;
        assert!(matches!(
            shop.db.ledger().create(&bill(vec![])).await,
            Err(DbError::Domain(CoreError::EmptySale))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_all_succeed() {
        let dir = std::env::temp_dir().join(format!("vastra-ledger-{}", std::process::id()));
        let shop = shop_with(DbConfig::new(dir.join("shop.db"))).await;

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let ledger = shop.db.ledger();
                let sale = bill(vec![line(shop.saree, "Sarees", 2000, 1)]);
                tokio::spawn(async move { ledger.create(&sale).await })
            })
            .collect();

        let mut numbers = Vec::new();
        for task in tasks {
            let detail = task.await.unwrap().unwrap();
            numbers.push(detail.sale.number);
        }
        numbers.sort();
        numbers.dedup();

        assert_eq!(numbers.len(), 20);
        assert_eq!(numbers.first().map(String::as_str), Some("BILL-0001"));
        assert_eq!(numbers.last().map(String::as_str), Some("BILL-0020"));
        assert_eq!(stock(&shop, shop.saree).await, 11);
        assert_eq!(sale_count(&shop).await, 20);

        shop.db.close().await;
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_shop_clock() {
        assert_eq!(ShopClock::default().offset().local_minus_utc(), 19_800);
        assert!(ShopClock::from_offset_minutes(-300).is_some());
        assert!(ShopClock::from_offset_minutes(24 * 60).is_none());
        assert_eq!(ShopClock::default().now().and_utc().timestamp_subsec_nanos(), 0);
    }
}
