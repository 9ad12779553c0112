// Sale audit trail
//
// Events are published after the sale write has committed. Publishing is
// best-effort: the service logs failures and carries on.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::sales::Sale;

/// Summary of one sale line carried in audit events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleLineSummary {
    pub item_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub total_amount: Decimal,
}

/// Domain events emitted by the sale service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SaleEvent {
    Created {
        sale_id: Uuid,
        sale_number: String,
        branch_id: Uuid,
        user_id: Uuid,
        total_amount: Decimal,
        lines: Vec<SaleLineSummary>,
    },
    Cancelled {
        sale_id: Uuid,
        user_id: Uuid,
    },
    ItemCancelled {
        sale_id: Uuid,
        item_id: Uuid,
        user_id: Uuid,
    },
    Deleted {
        sale_id: Uuid,
        user_id: Uuid,
    },
}

impl SaleEvent {
    pub fn created(sale: &Sale) -> Self {
        SaleEvent::Created {
            sale_id: sale.id,
            sale_number: sale.sale_number.clone(),
            branch_id: sale.branch_id,
            user_id: sale.user_id,
            total_amount: sale.total_amount(),
            lines: sale
                .items()
                .iter()
                .map(|item| SaleLineSummary {
                    item_id: item.id,
                    product_id: item.product_id,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    discount: item.discount,
                    total_amount: item.total_amount,
                })
                .collect(),
        }
    }

    pub fn sale_id(&self) -> Uuid {
        match self {
            SaleEvent::Created { sale_id, .. }
            | SaleEvent::Cancelled { sale_id, .. }
            | SaleEvent::ItemCancelled { sale_id, .. }
            | SaleEvent::Deleted { sale_id, .. } => *sale_id,
        }
    }

    /// Short event name, also used as the `event_type` column
    pub fn kind(&self) -> &'static str {
        match self {
            SaleEvent::Created { .. } => "sale_created",
            SaleEvent::Cancelled { .. } => "sale_cancelled",
            SaleEvent::ItemCancelled { .. } => "sale_item_cancelled",
            SaleEvent::Deleted { .. } => "sale_deleted",
        }
    }
}

/// Failure to deliver an audit event
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("failed to encode audit event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to store audit event: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("audit sink unavailable: {0}")]
    Unavailable(String),
}

/// Destination for sale audit events
#[async_trait]
pub trait AuditPublisher: Send + Sync {
    async fn publish(&self, event: &SaleEvent) -> Result<(), AuditError>;
}

/// Publishes events as structured tracing records
#[derive(Debug, Clone, Default)]
pub struct LogAuditPublisher;

#[async_trait]
impl AuditPublisher for LogAuditPublisher {
    async fn publish(&self, event: &SaleEvent) -> Result<(), AuditError> {
        let payload = serde_json::to_string(event)?;
        tracing::info!(
            target: "sales_api::audit",
            event = event.kind(),
            sale_id = %event.sale_id(),
            payload = %payload,
            "Sale audit event"
        );
        Ok(())
    }
}

/// Writes events to the `sale_audit_log` table
#[derive(Clone)]
pub struct PgAuditPublisher {
    pool: PgPool,
}

impl PgAuditPublisher {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditPublisher for PgAuditPublisher {
    async fn publish(&self, event: &SaleEvent) -> Result<(), AuditError> {
        let payload = serde_json::to_value(event)?;

        sqlx::query(
            r#"
            INSERT INTO sale_audit_log (audit_id, sale_id, event_type, payload, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(event.sale_id())
        .bind(event.kind())
        .bind(payload)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
