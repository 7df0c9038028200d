//! # Sale Repository
//!
//! Database operations for sale headers and sale items.
//!
//! ## Read Side vs Write Side
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  READ (pool, this struct's methods)                                     │
//! │    list(filter)            → report screen, newest first                │
//! │    detail(id)              → header + items (+ current barcode)         │
//! │    list_for_export(filter) → header + item count                        │
//! │                                                                         │
//! │  WRITE (executor functions, called by SaleLedger inside one tx)        │
//! │    last_number → insert_header → insert_items                           │
//! │    update_totals → delete_items → insert_items                          │
//! │    delete_items → delete_header                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{Executor, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;
use vastra_core::types::sale_timestamp;
use vastra_core::{
    NewSale, ResolvedTotals, Sale, SaleDetail, SaleFilter, SaleItem, SaleLine, SaleSummary,
    SaleType,
};

use crate::error::DbResult;

const SALE_COLUMNS: &str = r#"
    s.id,
    s.type,
    s.number,
    s.customer_name,
    s.mobile,
    s.customer_address,
    s.customer_gstin,
    s.payment_mode,
    s.remarks,
    s.date,
    s.total_amount,
    s.total_discount,
    s.final_amount
"#;

/// Escapes `%`, `_` and `\` so user text matches literally inside LIKE.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Appends the WHERE clause for a [`SaleFilter`].
///
/// `date` wins over the range. Day comparisons go through SQLite's
/// `date()`, so a day filter covers 00:00:00 through 23:59:59.
fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &SaleFilter) {
    qb.push(" WHERE 1 = 1");

    if let Some(day) = filter.date {
        qb.push(" AND date(s.date) = ").push_bind(day);
    } else {
        if let Some(start) = filter.start_date {
            qb.push(" AND date(s.date) >= ").push_bind(start);
        }
        if let Some(end) = filter.end_date {
            qb.push(" AND date(s.date) <= ").push_bind(end);
        }
    }

    if let Some(sale_type) = filter.sale_type {
        qb.push(" AND s.type = ").push_bind(sale_type);
    }

    if let Some(term) = filter.search.as_deref() {
        let pattern = like_pattern(term);
        qb.push(" AND (s.customer_name LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR s.mobile LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Lists sale headers matching the filter, newest first.
    pub async fn list(&self, filter: &SaleFilter) -> DbResult<Vec<Sale>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {SALE_COLUMNS} FROM sales s"));
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY s.date DESC, s.id DESC");

        let sales = qb.build_query_as::<Sale>().fetch_all(&self.pool).await?;

        debug!(count = sales.len(), ?filter, "Listed sales");
        Ok(sales)
    }

    /// Like [`list`](Self::list), with each sale's line count.
    pub async fn list_for_export(&self, filter: &SaleFilter) -> DbResult<Vec<SaleSummary>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {SALE_COLUMNS}, \
             (SELECT COUNT(*) FROM sale_items si WHERE si.sale_id = s.id) AS item_count \
             FROM sales s"
        ));
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY s.date DESC, s.id DESC");

        let rows = qb
            .build_query_as::<SaleSummary>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Listed sales for export");
        Ok(rows)
    }

    /// Gets a sale header by id.
    pub async fn get(&self, id: i64) -> DbResult<Option<Sale>> {
        Self::fetch_header(&self.pool, id).await
    }

    /// Gets a sale's items in insertion order.
    pub async fn items(&self, sale_id: i64) -> DbResult<Vec<SaleItem>> {
        Self::fetch_items(&self.pool, sale_id).await
    }

    /// Header plus items, or `None` if the sale does not exist.
    pub async fn detail(&self, id: i64) -> DbResult<Option<SaleDetail>> {
        let Some(sale) = self.get(id).await? else {
            return Ok(None);
        };
        let items = self.items(id).await?;

        Ok(Some(SaleDetail { sale, items }))
    }

    // =========================================================================
    // Executor-level operations (usable inside a transaction)
    // =========================================================================

    pub async fn fetch_header<'e, E>(executor: E, id: i64) -> DbResult<Option<Sale>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales s WHERE s.id = ?");
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(sale)
    }

    /// Items with the product's current barcode, absent if the product is gone.
    pub async fn fetch_items<'e, E>(executor: E, sale_id: i64) -> DbResult<Vec<SaleItem>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT
                si.id,
                si.sale_id,
                si.product_id,
                si.category_name,
                si.sale_price,
                si.quantity,
                si.item_final_price,
                p.barcode AS barcode
            FROM sale_items si
            LEFT JOIN products p ON p.id = si.product_id
            WHERE si.sale_id = ?
            ORDER BY si.id
            "#,
        )
        .bind(sale_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    /// Highest issued number for a type, compared numerically.
    pub async fn last_number<'e, E>(executor: E, sale_type: SaleType) -> DbResult<Option<String>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        // Digits start after "PREFIX-" (1-based substr)
        let digits_from = sale_type.prefix().len() as i64 + 2;

        let number = sqlx::query_scalar::<_, String>(
            r#"
            SELECT number FROM sales
            WHERE type = ?
            ORDER BY CAST(substr(number, ?) AS INTEGER) DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(sale_type)
        .bind(digits_from)
        .fetch_optional(executor)
        .await?;
        Ok(number)
    }

    pub async fn insert_header<'e, E>(
        executor: E,
        sale: &NewSale,
        number: &str,
        date: chrono::NaiveDateTime,
        totals: &ResolvedTotals,
    ) -> DbResult<i64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO sales (
                type, number, customer_name, mobile, payment_mode, remarks, date,
                total_amount, total_discount, final_amount, customer_address, customer_gstin
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(sale.sale_type)
        .bind(number)
        .bind(sale.customer.display_name())
        .bind(sale.customer.mobile.as_deref())
        .bind(sale.payment_mode)
        .bind(sale.remarks.as_deref())
        .bind(date.format(sale_timestamp::FORMAT).to_string())
        .bind(totals.total_amount)
        .bind(totals.total_discount)
        .bind(totals.final_amount)
        .bind(sale.customer.address.as_deref())
        .bind(sale.customer.gstin.as_deref())
        .execute(executor)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Writes one snapshot row per line, `item_final_price` computed here.
    pub async fn insert_items(
        conn: &mut SqliteConnection,
        sale_id: i64,
        lines: &[SaleLine],
    ) -> DbResult<()> {
        for line in lines {
            sqlx::query(
                r#"
                INSERT INTO sale_items
                    (sale_id, product_id, category_name, sale_price, quantity, item_final_price)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(sale_id)
            .bind(line.product_id)
            .bind(line.category_name.trim())
            .bind(line.sale_price)
            .bind(line.quantity)
            .bind(line.item_final_price())
            .execute(&mut *conn)
            .await?;
        }

        debug!(sale_id, count = lines.len(), "Sale items inserted");
        Ok(())
    }

    pub async fn update_totals<'e, E>(executor: E, id: i64, totals: &ResolvedTotals) -> DbResult<u64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            "UPDATE sales SET total_amount = ?, total_discount = ?, final_amount = ? WHERE id = ?",
        )
        .bind(totals.total_amount)
        .bind(totals.total_discount)
        .bind(totals.final_amount)
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_items<'e, E>(executor: E, sale_id: i64) -> DbResult<u64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM sale_items WHERE sale_id = ?")
            .bind(sale_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_header<'e, E>(executor: E, id: i64) -> DbResult<u64>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM sales WHERE id = ?")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{NaiveDate, NaiveDateTime};
    use vastra_core::{CustomerDetails, Money, SaleTotals};

    fn new_sale(sale_type: SaleType, name: Option<&str>, mobile: Option<&str>) -> NewSale {
        NewSale {
            sale_type,
            customer: CustomerDetails {
                name: name.map(str::to_string),
                mobile: mobile.map(str::to_string),
                ..Default::default()
            },
            payment_mode: None,
            remarks: None,
            totals: SaleTotals::default(),
            lines: vec![SaleLine {
                product_id: 1,
                category_name: "Sarees".to_string(),
                sale_price: Money::from_rupees(2000),
                quantity: 1,
            }],
        }
    }

    fn at(text: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(text, sale_timestamp::FORMAT).unwrap()
    }

    /// Inserts a header + items directly, bypassing the ledger.
    async fn insert(db: &Database, sale: &NewSale, number: &str, date: &str) -> i64 {
        let totals = sale.totals.resolve(&sale.lines);
        let mut conn = db.pool().acquire().await.unwrap();
        let id = SaleRepository::insert_header(&mut *conn, sale, number, at(date), &totals)
            .await
            .unwrap();
        SaleRepository::insert_items(&mut conn, id, &sale.lines).await.unwrap();
        id
    }

    async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        insert(&db, &new_sale(SaleType::Bill, Some("Meena Iyer"), Some("9876500001")), "BILL-0001", "2024-01-01 00:00:00").await;
        insert(&db, &new_sale(SaleType::Bill, None, None), "BILL-0002", "2024-01-01 23:59:59").await;
        insert(&db, &new_sale(SaleType::Estimate, Some("Ravi"), Some("9123400002")), "EST-0001", "2024-01-02 10:00:00").await;
        insert(&db, &new_sale(SaleType::Bill, Some("meena k"), None), "BILL-0003", "2024-01-03 18:30:00").await;
        db
    }

    fn numbers(sales: &[Sale]) -> Vec<&str> {
        sales.iter().map(|s| s.number.as_str()).collect()
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let db = seeded().await;
        let sales = db.sales().list(&SaleFilter::default()).await.unwrap();
        assert_eq!(numbers(&sales), vec!["BILL-0003", "EST-0001", "BILL-0002", "BILL-0001"]);
    }

    #[tokio::test]
    async fn test_exact_date_covers_whole_day() {
        let db = seeded().await;
        let filter = SaleFilter {
            date: NaiveDate::from_ymd_opt(2024, 1, 1),
            // Ignored when date is present
            start_date: NaiveDate::from_ymd_opt(2024, 1, 3),
            ..Default::default()
        };
        let sales = db.sales().list(&filter).await.unwrap();
        assert_eq!(numbers(&sales), vec!["BILL-0002", "BILL-0001"]);
    }

    #[tokio::test]
    async fn test_range_is_inclusive() {
        let db = seeded().await;
        let filter = SaleFilter {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 2),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 3),
            ..Default::default()
        };
        let sales = db.sales().list(&filter).await.unwrap();
        assert_eq!(numbers(&sales), vec!["BILL-0003", "EST-0001"]);

        let open_ended = SaleFilter {
            end_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..Default::default()
        };
        assert_eq!(db.sales().list(&open_ended).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_type_and_search_filters() {
        let db = seeded().await;

        let estimates = SaleFilter {
            sale_type: Some(SaleType::Estimate),
            ..Default::default()
        };
        assert_eq!(numbers(&db.sales().list(&estimates).await.unwrap()), vec!["EST-0001"]);

        // Case-insensitive, name or mobile
        let by_name = SaleFilter {
            search: Some("MEENA".to_string()),
            ..Default::default()
        };
        assert_eq!(
            numbers(&db.sales().list(&by_name).await.unwrap()),
            vec!["BILL-0003", "BILL-0001"]
        );

        let by_mobile = SaleFilter {
            search: Some("91234".to_string()),
            ..Default::default()
        };
        assert_eq!(numbers(&db.sales().list(&by_mobile).await.unwrap()), vec!["EST-0001"]);

        let wildcard = SaleFilter {
            search: Some("%".to_string()),
            ..Default::default()
        };
        assert!(db.sales().list(&wildcard).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_customer_is_walk_in() {
        let db = seeded().await;
        let sales = db.sales().list(&SaleFilter::default()).await.unwrap();
        let walk_in = sales.iter().find(|s| s.number == "BILL-0002").unwrap();
        assert_eq!(walk_in.customer_name, vastra_core::WALK_IN_CUSTOMER);
    }

    #[tokio::test]
    async fn test_detail_joins_barcode_best_effort() {
        let db = seeded().await;
        let detail = db.sales().detail(1).await.unwrap().unwrap();

        assert_eq!(detail.sale.number, "BILL-0001");
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].item_final_price, Money::from_rupees(2000));
        // Product 1 was never created
        assert_eq!(detail.items[0].barcode, None);

        assert!(db.sales().detail(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_last_number_is_numeric_max() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let sale = new_sale(SaleType::Bill, None, None);
        insert(&db, &sale, "BILL-10000", "2024-01-01 10:00:00").await;
        insert(&db, &sale, "BILL-9999", "2024-01-01 11:00:00").await;

        let last = SaleRepository::last_number(db.pool(), SaleType::Bill).await.unwrap();
        assert_eq!(last.as_deref(), Some("BILL-10000"));
        assert_eq!(
            SaleRepository::last_number(db.pool(), SaleType::Estimate).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_export_counts_items() {
        let db = seeded().await;
        let rows = db.sales().list_for_export(&SaleFilter::default()).await.unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.item_count == 1));
    }

    #[test]
    fn test_like_pattern_escapes() {
        assert_eq!(like_pattern("ab"), "%ab%");
        assert_eq!(like_pattern("5%_"), "%5\\%\\_%");
    }
}
