mod api;
mod market;
mod valuation;

use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::{info, warn};
use std::env;

use api::AppState;
use market::{MarketConfig, MarketFeed};
use valuation::{SupplyValuationEngine, ValuationConfig};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8080);

    let valuation = ValuationConfig::from_env();
    let weight_sum = valuation.weights.sum();
    if (weight_sum - 1.0).abs() > 1e-9 {
        warn!("composite weights sum to {weight_sum}, not 1.0; results are not renormalized");
    }
    info!(
        "assumptions: lost={} dormant={} reward={} cap={}",
        valuation.lost_estimate,
        valuation.dormant_estimate,
        valuation.block_reward,
        valuation.total_supply
    );

    let market = MarketConfig::from_env();
    let feed = MarketFeed::new(&market).map_err(std::io::Error::other)?;

    println!("₿ Starting BITCOUNTER API at http://{host}:{port}");

    let state = web::Data::new(AppState {
        engine: SupplyValuationEngine::new(valuation),
        feed,
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
