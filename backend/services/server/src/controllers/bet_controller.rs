use actix_web::{
    get, http::StatusCode, post, web, HttpMessage, HttpRequest, HttpResponse, Responder,
};
use engine::display::format_sol;
use engine::types::bet_types::NewBet;
use engine::MarketStore;
use log::{debug, info};
use validator::Validate;

use crate::config::ServerConfig;
use crate::middleware::wallet::WalletAddress;
use crate::types::bet_types::{BetQueryParams, BetStreamParams, PlaceBetInput};
use crate::utils::responses::{
    created, error_response, sse_response, store_error_response, success,
    validation_error_response,
};

/// Mounted under `/markets/{market_id}/bets` behind `WalletMiddleware`.
#[post("")]
pub async fn place_bet(
    req: HttpRequest,
    store: web::Data<MarketStore>,
    config: web::Data<ServerConfig>,
    path: web::Path<String>,
    body: web::Json<PlaceBetInput>,
) -> impl Responder {
    if let Err(e) = body.validate() {
        return validation_error_response(&e);
    }

    let bettor = match req.extensions().get::<WalletAddress>() {
        Some(wallet) => wallet.0.clone(),
        None => return error_response(StatusCode::UNAUTHORIZED, "Missing wallet address"),
    };

    let amount = body.amount as u64;
    if amount < config.min_bet_lamports {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("Minimum bet is {}", format_sol(config.min_bet_lamports)),
        );
    }

    let market_id = path.into_inner();
    let new_bet = NewBet::new(market_id, bettor, body.position, amount);
    match store.place_bet(new_bet).await {
        Ok(bet) => {
            info!(
                "Bet {} placed: {} {} on {}",
                bet.id,
                format_sol(bet.amount),
                bet.position,
                bet.market_id
            );
            created("Bet placed", bet)
        }
        Err(e) => store_error_response(&e),
    }
}

#[get("/bets")]
pub async fn get_bets(
    store: web::Data<MarketStore>,
    params: web::Query<BetQueryParams>,
) -> HttpResponse {
    let scope = params.scope.as_deref().unwrap_or("*");
    let expression = params.q.as_deref().unwrap_or("*");
    match store.query_bets(scope, expression).await {
        Ok(bets) => success("Bets fetched", bets),
        Err(e) => store_error_response(&e),
    }
}

/// Server-sent bet snapshots; `enabled=false` closes without sending anything.
#[get("/bets/stream")]
pub async fn stream_bets(
    store: web::Data<MarketStore>,
    params: web::Query<BetStreamParams>,
) -> HttpResponse {
    let scope = params.scope.as_deref().unwrap_or("*");
    let expression = params.q.as_deref().unwrap_or("*");
    let enabled = params.enabled.unwrap_or(true);
    match store.subscribe_bets(enabled, scope, expression).await {
        Ok(subscription) => {
            debug!("Opened bet stream for '{}' in {}", expression, scope);
            sse_response(subscription.into_stream())
        }
        Err(e) => store_error_response(&e),
    }
}
