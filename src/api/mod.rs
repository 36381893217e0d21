// ============================================================================
// HTTP API - actix-web boundary over the domain services
// ============================================================================
//
// Routes:
// - /orders    place, list, fetch, change status, delete
// - /products  catalog management
// - /stats     dashboard analytics
//
// Every response uses the `{ data, message }` envelope, errors included.
//
// ============================================================================

mod error;
mod orders;
mod products;
mod response;
mod stats;

use actix_web::{error::InternalError, web, HttpResponse};
use std::sync::Arc;

use crate::domain::order::OrderCommandHandler;
use crate::domain::product::ProductCatalog;
use crate::domain::stats::StatsService;
use crate::metrics::Metrics;
use crate::storage::Stores;

pub use error::ApiError;
pub use response::ApiResponse;

/// Services shared by every worker
#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<OrderCommandHandler>,
    pub products: Arc<ProductCatalog>,
    pub stats: Arc<StatsService>,
}

impl AppState {
    pub fn new(stores: &Stores, metrics: Arc<Metrics>) -> Self {
        Self {
            orders: Arc::new(OrderCommandHandler::new(stores, metrics)),
            products: Arc::new(ProductCatalog::new(stores)),
            stats: Arc::new(StatsService::new(stores)),
        }
    }
}

/// Register state, extractor error handlers and all routes
pub fn configure(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::Data::new(state))
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                let message = err.to_string();
                bad_request(err, message)
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                let message = err.to_string();
                bad_request(err, message)
            }))
            .app_data(web::PathConfig::default().error_handler(|err, _req| {
                let message = err.to_string();
                bad_request(err, message)
            }))
            .configure(orders::routes)
            .configure(products::routes)
            .configure(stats::routes);
    }
}

/// Malformed payloads answer 400 inside the usual envelope
fn bad_request<E>(err: E, message: String) -> actix_web::Error
where
    E: std::fmt::Debug + std::fmt::Display + 'static,
{
    tracing::debug!(error = %message, "Rejected malformed request");
    InternalError::from_response(
        err,
        HttpResponse::BadRequest().json(ApiResponse::empty(&message)),
    )
    .into()
}
