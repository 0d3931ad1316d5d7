mod health;
pub mod models;
mod supply;
mod valuation;

use actix_web::HttpResponse;
use actix_web::web::{self, ServiceConfig};

use crate::valuation::MarketReading;
pub use models::AppState;
use models::ErrorResponse;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(health::health_check)
            .service(supply::get_config)
            .service(supply::get_supply)
            .service(supply::get_horizon)
            .service(valuation::get_valuation)
            .service(valuation::compute_valuation)
            .service(valuation::compute_model),
    );
}

/// Latest reading from the feed, or a 502 ready to return.
async fn live_reading(state: &AppState) -> Result<MarketReading, HttpResponse> {
    state.feed.reading().await.map_err(|e| {
        HttpResponse::BadGateway().json(ErrorResponse {
            error: format!("{e:#}"),
        })
    })
}
