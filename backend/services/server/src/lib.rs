pub mod config;
pub mod controllers;
pub mod middleware;
pub mod types;
pub mod utils;

use actix_web::web;

use crate::controllers::admin_market_controller::{
    create_market, insert_market, resolve_market, settle_market, update_market,
};
use crate::controllers::bet_controller::{get_bets, place_bet, stream_bets};
use crate::controllers::market_controller::{get_market, get_markets, health, stream_markets};
use crate::middleware::admin::AdminMiddleware;
use crate::middleware::wallet::WalletMiddleware;

/// Registers every route. Expects `web::Data<MarketStore>` and
/// `web::Data<ServerConfig>` on the app.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    // The last `wrap` runs first, so the wallet is known before the admin check.
    let admin_scope = web::scope("/admin")
        .wrap(AdminMiddleware)
        .wrap(WalletMiddleware)
        .service(create_market)
        .service(insert_market)
        .service(update_market)
        .service(resolve_market)
        .service(settle_market);

    let bet_scope = web::scope("/markets/{market_id}/bets")
        .wrap(WalletMiddleware)
        .service(place_bet);

    cfg.service(health)
        .service(get_markets)
        .service(stream_markets)
        .service(bet_scope)
        .service(get_market)
        .service(stream_bets)
        .service(get_bets)
        .service(admin_scope);
}
