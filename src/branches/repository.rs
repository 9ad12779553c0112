use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::branches::{Branch, CreateBranchRequest};
use crate::db::StoreError;

/// Storage for branches
#[async_trait]
pub trait BranchRepository: Send + Sync {
    async fn create(&self, request: CreateBranchRequest) -> Result<Branch, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Branch>, StoreError>;

    async fn list(&self) -> Result<Vec<Branch>, StoreError>;

    /// `false` when nothing was deleted
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// PostgreSQL-backed branch repository
#[derive(Clone)]
pub struct PgBranchRepository {
    pool: PgPool,
}

impl PgBranchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BranchRepository for PgBranchRepository {
    async fn create(&self, request: CreateBranchRequest) -> Result<Branch, StoreError> {
        let branch = sqlx::query_as::<_, Branch>(
            r#"
            INSERT INTO branches (id, name, location, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, location, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&request.name)
        .bind(&request.location)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(branch)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Branch>, StoreError> {
        let branch = sqlx::query_as::<_, Branch>(
            "SELECT id, name, location, created_at FROM branches WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(branch)
    }

    async fn list(&self) -> Result<Vec<Branch>, StoreError> {
        let branches = sqlx::query_as::<_, Branch>(
            "SELECT id, name, location, created_at FROM branches ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(branches)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM branches WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
