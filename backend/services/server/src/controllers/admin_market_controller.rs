use actix_web::{http::StatusCode, patch, post, put, web, HttpMessage, HttpRequest, Responder};
use engine::types::market_types::{MarketPatch, MarketRecord, NewMarket};
use engine::MarketStore;
use log::{info, warn};
use validator::Validate;

use crate::middleware::wallet::WalletAddress;
use crate::types::market_types::{CreateMarketInput, ResolutionView, ResolveMarketInput};
use crate::utils::responses::{
    created, error_response, store_error_response, success, validation_error_response,
};

fn admin_of(req: &HttpRequest) -> String {
    req.extensions()
        .get::<WalletAddress>()
        .map(|w| w.0.clone())
        .unwrap_or_default()
}

#[post("/markets")]
pub async fn create_market(
    req: HttpRequest,
    store: web::Data<MarketStore>,
    body: web::Json<CreateMarketInput>,
) -> impl Responder {
    if let Err(e) = body.validate() {
        return validation_error_response(&e);
    }
    let input = body.into_inner();

    let result = match (input.days_until_resolution, input.resolution_date) {
        (Some(days), None) => {
            store
                .create_market_in_days(&input.question, &input.category, days)
                .await
        }
        (None, Some(resolution_date)) => {
            store
                .create_market(NewMarket::new(input.question, input.category, resolution_date))
                .await
        }
        _ => {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Provide exactly one of daysUntilResolution or resolutionDate",
            )
        }
    };

    match result {
        Ok(market) => {
            info!("Admin {} created market {}", admin_of(&req), market.id);
            created("Market created", market)
        }
        Err(e) => store_error_response(&e),
    }
}

/// Creates a market under the id in the path.
#[put("/markets/{market_id}")]
pub async fn insert_market(
    req: HttpRequest,
    store: web::Data<MarketStore>,
    path: web::Path<String>,
    body: web::Json<MarketRecord>,
) -> impl Responder {
    let market_id = path.into_inner();
    match store.insert_market(&market_id, body.into_inner()).await {
        Ok(market) => {
            info!("Admin {} created market {}", admin_of(&req), market.id);
            created("Market created", market)
        }
        Err(e) => store_error_response(&e),
    }
}

#[patch("/markets/{market_id}")]
pub async fn update_market(
    store: web::Data<MarketStore>,
    path: web::Path<String>,
    body: web::Json<MarketPatch>,
) -> impl Responder {
    let market_id = path.into_inner();
    match store.update_market(&market_id, body.into_inner()).await {
        Ok(market) => success("Market updated", market),
        Err(e) => store_error_response(&e),
    }
}

/// Resolves the market, then settles it in the same request.
#[post("/markets/{market_id}/resolve")]
pub async fn resolve_market(
    req: HttpRequest,
    store: web::Data<MarketStore>,
    path: web::Path<String>,
    body: web::Json<ResolveMarketInput>,
) -> impl Responder {
    let market_id = path.into_inner();
    let market = match store.resolve_market(&market_id, body.outcome).await {
        Ok(market) => market,
        Err(e) => return store_error_response(&e),
    };
    info!(
        "Admin {} resolved market {} as {}",
        admin_of(&req),
        market.id,
        market.outcome
    );

    match store.settle_market(&market_id).await {
        Ok(settlement) => {
            if !settlement.is_complete() {
                warn!(
                    "Market {} settled with {} failed payouts",
                    market_id,
                    settlement.failed.len()
                );
            }
            success("Market resolved", ResolutionView { market, settlement })
        }
        Err(e) => store_error_response(&e),
    }
}

/// Re-runs settlement; bets already paid are skipped.
#[post("/markets/{market_id}/settle")]
pub async fn settle_market(
    store: web::Data<MarketStore>,
    path: web::Path<String>,
) -> impl Responder {
    let market_id = path.into_inner();
    match store.settle_market(&market_id).await {
        Ok(settlement) => success("Market settled", settlement),
        Err(e) => store_error_response(&e),
    }
}
