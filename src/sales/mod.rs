pub mod audit;
pub mod error;
pub mod handlers;
pub mod models;
pub mod pricing;
pub mod repository;
pub mod service;

pub use audit::*;
pub use error::*;
pub use handlers::*;
pub use models::*;
pub use pricing::*;
pub use repository::*;
pub use service::*;
