use actix_web::{HttpResponse, Responder, get, post, web};
use chrono::Utc;
use log::{debug, info};

use super::live_reading;
use super::models::{AppState, ComputeRequest, ErrorResponse};
use crate::valuation::supply::days_since_genesis;
use crate::valuation::{ModelOutput, NetworkSignals, ValuationModel};

/// Full report for the latest reading. Network signals come from the query
/// string since no upstream feed provides them.
#[get("/valuation/")]
pub async fn get_valuation(
    state: web::Data<AppState>,
    signals: web::Query<NetworkSignals>,
) -> impl Responder {
    let reading = match live_reading(&state).await {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    let report = state.engine.report(&reading, &signals, Utc::now());
    let available = report.models.iter().filter(|o| o.usd().is_some()).count();
    let skipped: Vec<_> = report
        .models
        .iter()
        .filter(|o| o.usd().is_none())
        .map(|o| o.model().as_str())
        .collect();
    if !skipped.is_empty() {
        debug!("VALUATION unavailable: {}", skipped.join(","));
    }
    info!(
        "VALUATION price={} emitted={} models={}/{}",
        reading.price_usd,
        reading.emitted_supply_btc,
        available,
        report.models.len()
    );
    HttpResponse::Ok().json(report)
}

/// Report for a caller-supplied reading; touches no upstream API.
#[post("/valuation/")]
pub async fn compute_valuation(
    state: web::Data<AppState>,
    req: web::Json<ComputeRequest>,
) -> impl Responder {
    let now = Utc::now();
    let days = req.days_since_genesis.unwrap_or_else(|| days_since_genesis(now));
    let report = state
        .engine
        .report_with_days(&req.reading, &req.signals, now, days);
    HttpResponse::Ok().json(report)
}

/// One model for a caller-supplied reading.
#[post("/valuation/{model}/")]
pub async fn compute_model(
    state: web::Data<AppState>,
    path: web::Path<(String,)>,
    req: web::Json<ComputeRequest>,
) -> impl Responder {
    let name = path.into_inner().0;
    let model: ValuationModel = match name.parse() {
        Ok(m) => m,
        Err(e) => {
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: format!("{e}: {name}"),
            });
        }
    };

    let days = req
        .days_since_genesis
        .unwrap_or_else(|| days_since_genesis(Utc::now()));
    let estimate = state
        .engine
        .price(model, &req.reading, &req.signals, days)
        .map(|p| p.usd);
    debug!("MODEL {model} -> {estimate:?}");
    HttpResponse::Ok().json(ModelOutput::new(model, estimate))
}
