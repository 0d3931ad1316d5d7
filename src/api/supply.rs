use actix_web::{HttpResponse, Responder, get, web};
use chrono::Utc;
use log::debug;

use super::live_reading;
use super::models::{AppState, HorizonResponse, SupplyResponse};

/// Supply partition for the latest reading.
#[get("/supply/")]
pub async fn get_supply(state: web::Data<AppState>) -> impl Responder {
    let reading = match live_reading(&state).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    let supply = state.engine.supply(reading.emitted_supply_btc);
    let distribution = supply.distribution();
    debug!(
        "SUPPLY circulating={} liquid={} consistent={}",
        supply.circulating,
        supply.liquid,
        supply.is_consistent()
    );

    HttpResponse::Ok().json(SupplyResponse {
        reading,
        supply,
        consistent: supply.is_consistent(),
        distribution,
        shares: distribution.shares(),
        remaining_btc: state.engine.remaining(reading.emitted_supply_btc),
    })
}

/// When the last coin gets mined, with and without halvings.
#[get("/mining/horizon/")]
pub async fn get_horizon(state: web::Data<AppState>) -> impl Responder {
    let reading = match live_reading(&state).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    let now = Utc::now();
    let emitted = reading.emitted_supply_btc;
    HttpResponse::Ok().json(HorizonResponse {
        reading,
        remaining_btc: state.engine.remaining(emitted),
        constant_reward: state.engine.horizon(emitted, now).ok(),
        halving_schedule: state.engine.halving_horizon(emitted, now).ok(),
    })
}

/// Active assumptions and model constants.
#[get("/config/")]
pub async fn get_config(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.engine.config())
}
