use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use engine::MarketStore;
use futures_util::StreamExt;
use log::debug;
use serde_json::json;

use crate::types::market_types::{MarketQueryParams, MarketStreamParams, MarketView};
use crate::utils::responses::{sse_response, store_error_response, success};

#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "Ok" }))
}

#[get("/markets")]
pub async fn get_markets(
    store: web::Data<MarketStore>,
    params: web::Query<MarketQueryParams>,
) -> impl Responder {
    let expression = params.q.as_deref().unwrap_or("*");
    let markets = match store.query_markets(expression).await {
        Ok(markets) => markets,
        Err(e) => return store_error_response(&e),
    };

    let now = Utc::now().timestamp();
    let views: Vec<MarketView> = markets
        .into_iter()
        .map(|market| MarketView::new(market, now))
        .collect();
    success("Markets fetched", views)
}

/// Server-sent market snapshots; `live=false` sends the current result and closes.
#[get("/markets/stream")]
pub async fn stream_markets(
    store: web::Data<MarketStore>,
    params: web::Query<MarketStreamParams>,
) -> impl Responder {
    let expression = params.q.as_deref().unwrap_or("*");
    let live = params.live.unwrap_or(true);
    let subscription = match store.subscribe_markets(live, expression).await {
        Ok(subscription) => subscription,
        Err(e) => return store_error_response(&e),
    };
    debug!("Opened market stream for '{}' (live: {})", expression, live);

    sse_response(subscription.into_stream().map(|markets| {
        let now = Utc::now().timestamp();
        markets
            .into_iter()
            .map(|market| MarketView::new(market, now))
            .collect::<Vec<_>>()
    }))
}

#[get("/markets/{market_id}")]
pub async fn get_market(store: web::Data<MarketStore>, path: web::Path<String>) -> impl Responder {
    let market_id = path.into_inner();
    match store.get_market(&market_id).await {
        Ok(market) => success("Market fetched", MarketView::new(market, Utc::now().timestamp())),
        Err(e) => store_error_response(&e),
    }
}
