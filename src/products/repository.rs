use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::StoreError;
use crate::products::{CreateProductRequest, Product, UpdateProductRequest};

/// Storage for catalog products
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn create(&self, request: CreateProductRequest) -> Result<Product, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, StoreError>;

    async fn list(&self) -> Result<Vec<Product>, StoreError>;

    /// Apply a partial update. `None` when the product does not exist.
    async fn update(&self, id: Uuid, request: UpdateProductRequest) -> Result<Option<Product>, StoreError>;

    /// `false` when nothing was deleted
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// PostgreSQL-backed product repository
#[derive(Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn create(&self, request: CreateProductRequest) -> Result<Product, StoreError> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (id, name, unit_price, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, unit_price, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.name)
        .bind(request.unit_price)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(product)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, name, unit_price, created_at, updated_at FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT id, name, unit_price, created_at, updated_at FROM products ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    async fn update(&self, id: Uuid, request: UpdateProductRequest) -> Result<Option<Product>, StoreError> {
        // COALESCE keeps the current value for omitted fields
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET name = COALESCE($1, name),
                unit_price = COALESCE($2, unit_price),
                updated_at = $3
            WHERE id = $4
            RETURNING id, name, unit_price, created_at, updated_at
            "#,
        )
        .bind(request.name)
        .bind(request.unit_price)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
