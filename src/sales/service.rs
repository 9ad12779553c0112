use std::sync::Arc;

use uuid::Uuid;

use crate::branches::BranchRepository;
use crate::products::ProductRepository;
use crate::sales::{
    AuditPublisher, CreateSaleRequest, Sale, SaleError, SaleEvent, SaleItem, SaleStore,
};

/// Service for sale business logic
#[derive(Clone)]
pub struct SaleService {
    branches: Arc<dyn BranchRepository>,
    products: Arc<dyn ProductRepository>,
    sales: Arc<dyn SaleStore>,
    audit: Arc<dyn AuditPublisher>,
}

impl SaleService {
    pub fn new(
        branches: Arc<dyn BranchRepository>,
        products: Arc<dyn ProductRepository>,
        sales: Arc<dyn SaleStore>,
        audit: Arc<dyn AuditPublisher>,
    ) -> Self {
        Self {
            branches,
            products,
            sales,
            audit,
        }
    }

    /// Create a new sale
    ///
    /// # Arguments
    /// * `user_id` - Acting user, resolved by the transport layer
    /// * `request` - Branch and product lines
    ///
    /// # Order of checks
    /// 1. Request shape (nothing is looked up if this fails)
    /// 2. Branch exists (no product is looked up if it does not)
    /// 3. Every product exists, in line order, stopping at the first miss
    ///
    /// Nothing is written unless all three pass. The sale and its items are
    /// persisted in one call and the audit event is published afterwards.
    pub async fn create_sale(
        &self,
        user_id: Uuid,
        request: CreateSaleRequest,
    ) -> Result<Sale, SaleError> {
        request.validate_for(user_id)?;

        self.branches
            .find_by_id(request.branch_id)
            .await?
            .ok_or(SaleError::BranchNotFound(request.branch_id))?;

        let mut items = Vec::with_capacity(request.items.len());
        for line in &request.items {
            let product = self
                .products
                .find_by_id(line.product_id)
                .await?
                .ok_or(SaleError::ProductNotFound(line.product_id))?;

            tracing::debug!(
                product_id = %product.id,
                unit_price = %product.unit_price,
                quantity = line.quantity,
                "Pricing sale line"
            );

            items.push(SaleItem::price(product.id, product.unit_price, line.quantity)?);
        }

        let sale = Sale::assemble(request.branch_id, user_id, items)?;
        let sale = self.sales.create(&sale).await?;

        tracing::info!(
            sale_id = %sale.id,
            sale_number = %sale.sale_number,
            branch_id = %sale.branch_id,
            total_amount = %sale.total_amount(),
            "Sale created"
        );

        self.publish(SaleEvent::created(&sale)).await;

        Ok(sale)
    }

    /// Get a sale with its items
    pub async fn get_sale(&self, sale_id: Uuid) -> Result<Sale, SaleError> {
        self.sales
            .find_by_id(sale_id)
            .await?
            .ok_or(SaleError::SaleNotFound(sale_id))
    }

    /// List sales, optionally restricted to one branch
    pub async fn list_sales(&self, branch_id: Option<Uuid>) -> Result<Vec<Sale>, SaleError> {
        let sales = self.sales.list(branch_id).await?;
        tracing::debug!("Retrieved {} sales", sales.len());
        Ok(sales)
    }

    /// Cancel a whole sale. Cancelled is terminal.
    ///
    /// The loaded copy only picks the error to report. The write is a
    /// guarded flag update and leaves item flags alone.
    pub async fn cancel_sale(&self, user_id: Uuid, sale_id: Uuid) -> Result<Sale, SaleError> {
        let mut sale = self.get_sale(sale_id).await?;
        sale.cancel()?;

        if !self.sales.cancel_sale(sale_id).await? {
            return Err(SaleError::InvalidTransition(format!(
                "Sale {} is already cancelled",
                sale.sale_number
            )));
        }

        tracing::info!(sale_id = %sale_id, user_id = %user_id, "Sale cancelled");
        self.publish(SaleEvent::Cancelled { sale_id, user_id }).await;

        self.get_sale(sale_id).await
    }

    /// Cancel a single line without touching the sale's own flag
    pub async fn cancel_item(
        &self,
        user_id: Uuid,
        sale_id: Uuid,
        item_id: Uuid,
    ) -> Result<Sale, SaleError> {
        let mut sale = self.get_sale(sale_id).await?;
        sale.cancel_item(item_id)?;

        if !self.sales.cancel_item(sale_id, item_id).await? {
            return Err(SaleError::InvalidTransition(format!(
                "Sale item {} is already cancelled",
                item_id
            )));
        }

        tracing::info!(sale_id = %sale_id, item_id = %item_id, "Sale item cancelled");
        self.publish(SaleEvent::ItemCancelled {
            sale_id,
            item_id,
            user_id,
        })
        .await;

        self.get_sale(sale_id).await
    }

    /// Delete a sale and its items
    pub async fn delete_sale(&self, user_id: Uuid, sale_id: Uuid) -> Result<(), SaleError> {
        if !self.sales.delete(sale_id).await? {
            return Err(SaleError::SaleNotFound(sale_id));
        }

        tracing::info!(sale_id = %sale_id, "Sale deleted");
        self.publish(SaleEvent::Deleted { sale_id, user_id }).await;

        Ok(())
    }

    async fn publish(&self, event: SaleEvent) {
        // Audit failures must not fail the operation that triggered them
        if let Err(e) = self.audit.publish(&event).await {
            tracing::warn!(
                sale_id = %event.sale_id(),
                event = event.kind(),
                "Failed to publish sale audit event: {}",
                e
            );
        }
    }
}
