use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::db::StoreError;
use crate::sales::{Sale, SaleItem, SaleRow};

/// Storage for sale aggregates.
///
/// Every method that writes more than one row does so in a single
/// transaction; callers never see a sale without its items.
#[async_trait]
pub trait SaleStore: Send + Sync {
    /// Persist a freshly assembled sale and all of its items
    async fn create(&self, sale: &Sale) -> Result<Sale, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Sale>, StoreError>;

    /// Sales ordered by sale date, newest first
    async fn list(&self, branch_id: Option<Uuid>) -> Result<Vec<Sale>, StoreError>;

    /// Flip an active sale to cancelled.
    ///
    /// Only the sale's own flag is written. Returns `false` when the sale is
    /// missing or already cancelled.
    async fn cancel_sale(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Flip one active item to cancelled, leaving every other flag alone.
    /// Returns `false` when the item is missing or already cancelled.
    async fn cancel_item(&self, sale_id: Uuid, item_id: Uuid) -> Result<bool, StoreError>;

    /// `false` when nothing was deleted
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

const SALE_COLUMNS: &str =
    "id, sale_number, sale_date, branch_id, user_id, is_cancelled, total_amount, created_at, updated_at";

const SALE_ITEM_COLUMNS: &str =
    "id, product_id, quantity, unit_price, discount, total_amount, is_cancelled";

/// PostgreSQL-backed sale store
#[derive(Clone)]
pub struct PgSaleStore {
    pool: PgPool,
}

impl PgSaleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_items(&self, sale_id: Uuid) -> Result<Vec<SaleItem>, StoreError> {
        let items = sqlx::query_as::<_, SaleItem>(&format!(
            "SELECT {} FROM sale_items WHERE sale_id = $1 ORDER BY line_number",
            SALE_ITEM_COLUMNS
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Attach items to a batch of sale rows with a single item query
    async fn hydrate(&self, rows: Vec<SaleRow>) -> Result<Vec<Sale>, StoreError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let item_rows = sqlx::query_as::<_, SaleItemRow>(&format!(
            "SELECT sale_id, {} FROM sale_items WHERE sale_id = ANY($1) ORDER BY sale_id, line_number",
            SALE_ITEM_COLUMNS
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut items_by_sale: HashMap<Uuid, Vec<SaleItem>> = HashMap::with_capacity(rows.len());
        for row in item_rows {
            items_by_sale.entry(row.sale_id).or_default().push(row.item);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let items = items_by_sale.remove(&row.id).unwrap_or_default();
                Sale::from_row(row, items)
            })
            .collect())
    }
}

/// Item row tagged with its parent, used for batched loads
#[derive(FromRow)]
struct SaleItemRow {
    sale_id: Uuid,
    #[sqlx(flatten)]
    item: SaleItem,
}

#[async_trait]
impl SaleStore for PgSaleStore {
    async fn create(&self, sale: &Sale) -> Result<Sale, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO sales (id, sale_number, sale_date, branch_id, user_id, is_cancelled, total_amount, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(sale.id)
        .bind(&sale.sale_number)
        .bind(sale.sale_date)
        .bind(sale.branch_id)
        .bind(sale.user_id)
        .bind(sale.is_cancelled)
        .bind(sale.total_amount())
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&mut *tx)
        .await?;

        for (line_number, item) in sale.items().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sale_items (id, sale_id, line_number, product_id, quantity, unit_price, discount, total_amount, is_cancelled)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(item.id)
            .bind(sale.id)
            .bind(line_number as i32)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.discount)
            .bind(item.total_amount)
            .bind(item.is_cancelled)
            .execute(&mut *tx)
            .await?;
        }

        // Dropping tx without commit rolls everything back
        tx.commit().await?;

        Ok(sale.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Sale>, StoreError> {
        let row = sqlx::query_as::<_, SaleRow>(&format!(
            "SELECT {} FROM sales WHERE id = $1",
            SALE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let items = self.load_items(row.id).await?;
                Ok(Some(Sale::from_row(row, items)))
            }
            None => Ok(None),
        }
    }

    async fn list(&self, branch_id: Option<Uuid>) -> Result<Vec<Sale>, StoreError> {
        let rows = match branch_id {
            Some(branch_id) => {
                sqlx::query_as::<_, SaleRow>(&format!(
                    "SELECT {} FROM sales WHERE branch_id = $1 ORDER BY sale_date DESC",
                    SALE_COLUMNS
                ))
                .bind(branch_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, SaleRow>(&format!(
                    "SELECT {} FROM sales ORDER BY sale_date DESC",
                    SALE_COLUMNS
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        self.hydrate(rows).await
    }

    async fn cancel_sale(&self, id: Uuid) -> Result<bool, StoreError> {
        // Cancelled is terminal, only an active row matches
        let result = sqlx::query(
            "UPDATE sales SET is_cancelled = TRUE, updated_at = NOW() WHERE id = $1 AND is_cancelled = FALSE",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn cancel_item(&self, sale_id: Uuid, item_id: Uuid) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE sale_items SET is_cancelled = TRUE WHERE id = $1 AND sale_id = $2 AND is_cancelled = FALSE",
        )
        .bind(item_id)
        .bind(sale_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query("UPDATE sales SET updated_at = NOW() WHERE id = $1")
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        // sale_items rows go with ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM sales WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
