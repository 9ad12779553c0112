pub mod branches;
pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod products;
pub mod sales;
pub mod validation;

#[cfg(test)]
mod test_support;


use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use branches::{BranchRepository, PgBranchRepository};
use config::AuditSink;
use products::{PgProductRepository, ProductRepository};
use sales::{AuditPublisher, LogAuditPublisher, PgAuditPublisher, PgSaleStore, SaleService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub branches: Arc<dyn BranchRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub sale_service: SaleService,
}

impl AppState {
    /// Wire the PostgreSQL-backed collaborators around one pool
    pub fn from_pool(pool: PgPool, audit_sink: AuditSink) -> Self {
        let branches: Arc<dyn BranchRepository> = Arc::new(PgBranchRepository::new(pool.clone()));
        let products: Arc<dyn ProductRepository> = Arc::new(PgProductRepository::new(pool.clone()));
        let audit: Arc<dyn AuditPublisher> = match audit_sink {
            AuditSink::Log => Arc::new(LogAuditPublisher),
            AuditSink::Database => Arc::new(PgAuditPublisher::new(pool.clone())),
        };
        let sale_service = SaleService::new(
            branches.clone(),
            products.clone(),
            Arc::new(PgSaleStore::new(pool)),
            audit,
        );

        Self {
            branches,
            products,
            sale_service,
        }
    }
}

/// Handler for GET /health
async fn health() -> &'static str {
    "ok"
}

/// Maps all API endpoints to their handlers
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/sales",
            post(sales::create_sale_handler).get(sales::list_sales_handler),
        )
        .route(
            "/api/sales/:id",
            get(sales::get_sale_handler).delete(sales::delete_sale_handler),
        )
        .route("/api/sales/:id/cancel", post(sales::cancel_sale_handler))
        .route(
            "/api/sales/:id/items/:item_id/cancel",
            post(sales::cancel_sale_item_handler),
        )
        .route(
            "/api/products",
            post(products::create_product_handler).get(products::list_products_handler),
        )
        .route(
            "/api/products/:id",
            get(products::get_product_handler)
                .put(products::update_product_handler)
                .delete(products::delete_product_handler),
        )
        .route(
            "/api/branches",
            post(branches::create_branch_handler).get(branches::list_branches_handler),
        )
        .route(
            "/api/branches/:id",
            get(branches::get_branch_handler).delete(branches::delete_branch_handler),
        )
        .route("/health", get(health))
}

/// Creates and configures the application router with CORS and request tracing
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    api_routes()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
