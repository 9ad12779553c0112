// In-memory collaborators for service and HTTP tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::branches::{Branch, BranchRepository, CreateBranchRequest};
use crate::db::StoreError;
use crate::products::{CreateProductRequest, Product, ProductRepository, UpdateProductRequest};
use crate::sales::{AuditError, AuditPublisher, Sale, SaleEvent, SaleService, SaleStore};
use crate::AppState;

/// Branches, products and sales kept in process memory
#[derive(Default)]
pub struct InMemoryStore {
    branches: Mutex<HashMap<Uuid, Branch>>,
    products: Mutex<HashMap<Uuid, Product>>,
    sales: Mutex<HashMap<Uuid, Sale>>,
    branch_lookups: AtomicUsize,
    product_lookups: AtomicUsize,
    fail_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn add_branch(&self, name: &str) -> Uuid {
        let branch = Branch {
            id: Uuid::new_v4(),
            name: name.to_string(),
            location: None,
            created_at: Utc::now(),
        };
        let id = branch.id;
        self.branches.lock().unwrap().insert(id, branch);
        id
    }

    pub fn add_product(&self, name: &str, unit_price: Decimal) -> Uuid {
        let product = Product {
            id: Uuid::new_v4(),
            name: name.to_string(),
            unit_price,
            created_at: Utc::now(),
            updated_at: None,
        };
        let id = product.id;
        self.products.lock().unwrap().insert(id, product);
        id
    }

    pub fn set_product_price(&self, id: Uuid, unit_price: Decimal) {
        if let Some(product) = self.products.lock().unwrap().get_mut(&id) {
            product.unit_price = unit_price;
        }
    }

    pub fn product_price(&self, id: Uuid) -> Option<Decimal> {
        self.products.lock().unwrap().get(&id).map(|p| p.unit_price)
    }

    pub fn sale(&self, id: Uuid) -> Option<Sale> {
        self.sales.lock().unwrap().get(&id).cloned()
    }

    pub fn sale_count(&self) -> usize {
        self.sales.lock().unwrap().len()
    }

    pub fn branch_lookups(&self) -> usize {
        self.branch_lookups.load(Ordering::SeqCst)
    }

    pub fn product_lookups(&self) -> usize {
        self.product_lookups.load(Ordering::SeqCst)
    }

    /// Make every subsequent sale write fail
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("writes disabled".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BranchRepository for InMemoryStore {
    async fn create(&self, request: CreateBranchRequest) -> Result<Branch, StoreError> {
        let branch = Branch {
            id: Uuid::new_v4(),
            name: request.name,
            location: request.location,
            created_at: Utc::now(),
        };
        self.branches.lock().unwrap().insert(branch.id, branch.clone());
        Ok(branch)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Branch>, StoreError> {
        self.branch_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.branches.lock().unwrap().get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Branch>, StoreError> {
        let mut branches: Vec<Branch> = self.branches.lock().unwrap().values().cloned().collect();
        branches.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(branches)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.branches.lock().unwrap().remove(&id).is_some())
    }
}

#[async_trait]
impl ProductRepository for InMemoryStore {
    async fn create(&self, request: CreateProductRequest) -> Result<Product, StoreError> {
        let product = Product {
            id: Uuid::new_v4(),
            name: request.name,
            unit_price: request.unit_price,
            created_at: Utc::now(),
            updated_at: None,
        };
        self.products.lock().unwrap().insert(product.id, product.clone());
        Ok(product)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        self.product_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.products.lock().unwrap().get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let mut products: Vec<Product> = self.products.lock().unwrap().values().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn update(&self, id: Uuid, request: UpdateProductRequest) -> Result<Option<Product>, StoreError> {
        let mut products = self.products.lock().unwrap();
        let Some(product) = products.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = request.name {
            product.name = name;
        }
        if let Some(unit_price) = request.unit_price {
            product.unit_price = unit_price;
        }
        product.updated_at = Some(Utc::now());
        Ok(Some(product.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.products.lock().unwrap().remove(&id).is_some())
    }
}

#[async_trait]
impl SaleStore for InMemoryStore {
    async fn create(&self, sale: &Sale) -> Result<Sale, StoreError> {
        self.check_writable()?;
        self.sales.lock().unwrap().insert(sale.id, sale.clone());
        Ok(sale.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Sale>, StoreError> {
        Ok(self.sales.lock().unwrap().get(&id).cloned())
    }

    async fn list(&self, branch_id: Option<Uuid>) -> Result<Vec<Sale>, StoreError> {
        let mut sales: Vec<Sale> = self
            .sales
            .lock()
            .unwrap()
            .values()
            .filter(|sale| branch_id.map_or(true, |id| sale.branch_id == id))
            .cloned()
            .collect();
        sales.sort_by(|a, b| b.sale_date.cmp(&a.sale_date));
        Ok(sales)
    }

    async fn cancel_sale(&self, id: Uuid) -> Result<bool, StoreError> {
        self.check_writable()?;
        let mut sales = self.sales.lock().unwrap();
        Ok(sales.get_mut(&id).map_or(false, |sale| sale.cancel().is_ok()))
    }

    async fn cancel_item(&self, sale_id: Uuid, item_id: Uuid) -> Result<bool, StoreError> {
        self.check_writable()?;
        let mut sales = self.sales.lock().unwrap();
        Ok(sales
            .get_mut(&sale_id)
            .map_or(false, |sale| sale.cancel_item(item_id).is_ok()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        self.check_writable()?;
        Ok(self.sales.lock().unwrap().remove(&id).is_some())
    }
}

/// Keeps every published event for later inspection
#[derive(Default)]
pub struct RecordingAuditPublisher {
    events: Mutex<Vec<SaleEvent>>,
}

impl RecordingAuditPublisher {
    pub fn events(&self) -> Vec<SaleEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditPublisher for RecordingAuditPublisher {
    async fn publish(&self, event: &SaleEvent) -> Result<(), AuditError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Rejects every event
pub struct FailingAuditPublisher;

#[async_trait]
impl AuditPublisher for FailingAuditPublisher {
    async fn publish(&self, _event: &SaleEvent) -> Result<(), AuditError> {
        Err(AuditError::Unavailable("audit sink offline".to_string()))
    }
}

/// Application state backed entirely by one in-memory store
pub fn in_memory_state() -> (AppState, Arc<InMemoryStore>, Arc<RecordingAuditPublisher>) {
    let store = Arc::new(InMemoryStore::default());
    let audit = Arc::new(RecordingAuditPublisher::default());
    let state = AppState {
        branches: store.clone(),
        products: store.clone(),
        sale_service: SaleService::new(store.clone(), store.clone(), store.clone(), audit.clone()),
    };
    (state, store, audit)
}
