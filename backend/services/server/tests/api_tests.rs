use actix_web::body::MessageBody;
use actix_web::{http::StatusCode, test, web, App};
use std::future::poll_fn;
use engine::{spawn_market_actor, MarketStore};
use serde_json::{json, Value};

use server::config::ServerConfig;
use server::configure_routes;
use server::middleware::wallet::WALLET_HEADER;

const ADMIN: &str = "AdminWallet111";
const ALICE: &str = "AliceWallet222";
const BOB: &str = "BobWallet333";

fn app_data() -> (web::Data<MarketStore>, web::Data<ServerConfig>) {
    let config = ServerConfig {
        admin_addresses: [ADMIN.to_string()].into_iter().collect(),
        ..ServerConfig::default()
    };
    (
        web::Data::new(spawn_market_actor(64)),
        web::Data::new(config),
    )
}

macro_rules! init_app {
    () => {{
        let (store, config) = app_data();
        test::init_service(
            App::new()
                .app_data(store)
                .app_data(config)
                .configure(configure_routes),
        )
        .await
    }};
}

#[actix_web::test]
async fn health_is_ok() {
    let app = init_app!();
    let req = test::TestRequest::get().uri("/health").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn admin_routes_require_an_admin_wallet() {
    let app = init_app!();
    let body = json!({ "question": "Ship v2?", "daysUntilResolution": 7 });

    let req = test::TestRequest::post()
        .uri("/admin/markets")
        .set_json(&body)
        .to_request();
    let err = test::try_call_service(&app, req).await.err().unwrap();
    assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/admin/markets")
        .insert_header((WALLET_HEADER, ALICE))
        .set_json(&body)
        .to_request();
    let err = test::try_call_service(&app, req).await.err().unwrap();
    assert_eq!(err.as_response_error().status_code(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn market_lifecycle_over_http() {
    let app = init_app!();

    let req = test::TestRequest::post()
        .uri("/admin/markets")
        .insert_header((WALLET_HEADER, ADMIN))
        .set_json(json!({
            "question": "Will the creator hit 1M followers?",
            "category": "Performance",
            "daysUntilResolution": 7
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(res).await;
    let market_id = created["data"]["id"].as_str().unwrap().to_string();
    assert!(market_id.starts_with("market-"));

    let req = test::TestRequest::get()
        .uri(&format!("/markets/{}", market_id))
        .to_request();
    let fetched: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched["data"]["odds"]["yesPercent"], 50);
    assert_eq!(fetched["data"]["summary"]["endsIn"], "7 days");

    let stakes = [(ALICE, "yes", 3_000_000_000u64), (BOB, "no", 1_000_000_000)];
    for (wallet, position, amount) in stakes {
        let req = test::TestRequest::post()
            .uri(&format!("/markets/{}/bets", market_id))
            .insert_header((WALLET_HEADER, wallet))
            .set_json(json!({ "position": position, "amount": amount }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::get()
        .uri(&format!("/markets/{}", market_id))
        .to_request();
    let fetched: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched["data"]["totalYesBets"], 3_000_000_000u64);
    assert_eq!(fetched["data"]["odds"]["yesPercent"], 75);
    assert_eq!(fetched["data"]["summary"]["volume"], "4.00 SOL");

    let req = test::TestRequest::get()
        .uri(&format!("/bets?scope=*&q=bettor={}", ALICE))
        .to_request();
    let bets: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(bets["data"].as_array().unwrap().len(), 1);

    let req = test::TestRequest::post()
        .uri(&format!("/admin/markets/{}/resolve", market_id))
        .insert_header((WALLET_HEADER, ADMIN))
        .set_json(json!({ "outcome": "yes" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let resolved: Value = test::read_body_json(res).await;
    assert_eq!(resolved["data"]["market"]["status"], "resolved");
    assert_eq!(resolved["data"]["settlement"]["newlySettled"], 2);
    let payouts = resolved["data"]["settlement"]["payouts"].as_array().unwrap();
    assert_eq!(payouts[0]["amount"], 4_000_000_000u64);
    assert_eq!(payouts[1]["amount"], 0);

    let req = test::TestRequest::post()
        .uri(&format!("/admin/markets/{}/resolve", market_id))
        .insert_header((WALLET_HEADER, ADMIN))
        .set_json(json!({ "outcome": "no" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri(&format!("/admin/markets/{}/settle", market_id))
        .insert_header((WALLET_HEADER, ADMIN))
        .to_request();
    let settled: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(settled["data"]["newlySettled"], 0);
}

#[actix_web::test]
async fn bets_enforce_wallet_and_minimum() {
    let app = init_app!();

    let req = test::TestRequest::put()
        .uri("/admin/markets/creator-collab")
        .insert_header((WALLET_HEADER, ADMIN))
        .set_json(json!({
            "question": "Collab announced this month?",
            "category": "Collaborations",
            "resolutionDate": chrono::Utc::now().timestamp() + 86_400
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/markets/creator-collab/bets")
        .set_json(json!({ "position": "yes", "amount": 20_000_000 }))
        .to_request();
    let err = test::try_call_service(&app, req).await.err().unwrap();
    assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);

    for amount in [-5i64, 0, 1_000] {
        let req = test::TestRequest::post()
            .uri("/markets/creator-collab/bets")
            .insert_header((WALLET_HEADER, ALICE))
            .set_json(json!({ "position": "yes", "amount": amount }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "amount {}", amount);
    }

    let req = test::TestRequest::post()
        .uri("/markets/missing-market/bets")
        .insert_header((WALLET_HEADER, ALICE))
        .set_json(json!({ "position": "no", "amount": 20_000_000 }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::put()
        .uri("/admin/markets/creator-collab")
        .insert_header((WALLET_HEADER, ADMIN))
        .set_json(json!({
            "question": "Duplicate",
            "category": "Content",
            "resolutionDate": chrono::Utc::now().timestamp() + 86_400
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn queries_and_lookups_report_store_errors() {
    let app = init_app!();

    let req = test::TestRequest::get().uri("/markets/nope").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri("/markets?q=colour%3Dred")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get().uri("/markets").to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed["data"], json!([]));
}

#[actix_web::test]
async fn one_shot_stream_sends_a_single_snapshot() {
    let app = init_app!();

    let req = test::TestRequest::post()
        .uri("/admin/markets")
        .insert_header((WALLET_HEADER, ADMIN))
        .set_json(json!({ "question": "New merch drop?", "daysUntilResolution": 3 }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let req = test::TestRequest::get()
        .uri("/markets/stream?q=status%3Dactive&live=false")
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = test::read_body(res).await;
    let text = std::str::from_utf8(&body).unwrap();
    assert!(text.starts_with("data: "));
    assert_eq!(text.matches("data: ").count(), 1);
    assert!(text.contains("New merch drop?"));
}

#[actix_web::test]
async fn bet_stream_pushes_a_bettors_bets() {
    let app = init_app!();

    let req = test::TestRequest::put()
        .uri("/admin/markets/speed-40m")
        .insert_header((WALLET_HEADER, ADMIN))
        .set_json(json!({
            "question": "40M subscribers by year end?",
            "category": "Performance",
            "resolutionDate": chrono::Utc::now().timestamp() + 86_400
        }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/markets/speed-40m/bets")
        .insert_header((WALLET_HEADER, ALICE))
        .set_json(json!({ "position": "yes", "amount": 50_000_000 }))
        .to_request();
    let placed: Value = test::call_and_read_body_json(&app, req).await;
    let bet_id = placed["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri(&format!("/bets/stream?scope=speed-40m&q=bettor%3D{}&enabled=false", ALICE))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(test::read_body(res).await.is_empty());

    let req = test::TestRequest::get()
        .uri(&format!("/bets/stream?scope=speed-40m&q=bettor%3D{}", ALICE))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    // the live stream never ends, so read just the first frame
    let body = res.into_body();
    let mut body = std::pin::pin!(body);
    let frame = match poll_fn(|cx| body.as_mut().poll_next(cx)).await {
        Some(Ok(bytes)) => bytes,
        _ => panic!("bet stream closed before its first frame"),
    };
    let text = std::str::from_utf8(&frame).unwrap();
    assert!(text.starts_with("data: "));
    assert!(text.contains(&bet_id));
}
