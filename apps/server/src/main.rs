#![warn(clippy::all, clippy::pedantic)]

use std::net::{SocketAddr, ToSocketAddrs};

use actix_web::rt::task::JoinHandle;
use actix_web::{App, HttpServer, web};
use netpulse::config::ServerConfig;
use netpulse::{AppContext, Config, QueryService, shutdown};
use tracing::{error, info};

mod error;
mod routes;

use error::AppError;
use logger::init_tracing;

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::load(std::env::var_os("NETPULSE_CONFIG"))?;
    let addrs = listen_addrs(&config.server)?;
    let context = AppContext::from_config(config)?;

    // Probes run on this thread's runtime, requests on the worker threads
    let scheduler = context.scheduler();
    let ticker = actix_web::rt::spawn(scheduler.clone().start());

    let result = run_server(&addrs, context.query()).await;

    scheduler.shutdown();
    join_scheduler(ticker).await;
    result
}

/// Resolve `bind`/`port`, accepting IPv4, IPv6 and host names
fn listen_addrs(server: &ServerConfig) -> Result<Vec<SocketAddr>, AppError> {
    Ok((server.bind.as_str(), server.port).to_socket_addrs()?.collect())
}

/// Wait for the probe loop, logging it if it died instead of stopping
async fn join_scheduler(ticker: JoinHandle<()>) -> bool {
    match ticker.await {
        Ok(()) => true,
        Err(e) => {
            error!("Probe scheduler task failed: {e}");
            false
        }
    }
}

async fn run_server(addrs: &[SocketAddr], query: QueryService) -> Result<(), AppError> {
    let query = web::Data::new(query);

    info!("Starting dashboard API on {addrs:?}");

    let server = HttpServer::new(move || App::new().app_data(query.clone()).configure(routes::routes))
        .bind(addrs)?
        .disable_signals()
        .run();

    let handle = server.handle();
    actix_web::rt::spawn(async move {
        shutdown::shutdown_signal().await;
        handle.stop(true).await;
    });

    server.await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test};
    use chrono::{DateTime, FixedOffset};
    use chrono_tz::Tz;
    use netpulse::{FileStore, Measurement, RecordStore};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn at(raw: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(raw).unwrap()
    }

    macro_rules! app {
        ($store:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(QueryService::new($store, Tz::UTC)))
                    .configure(routes::routes),
            )
            .await
        };
    }

    #[::core::prelude::v1::test]
    fn test_listen_addrs_accepts_ipv4_and_ipv6() {
        let v4 = listen_addrs(&ServerConfig { bind: "0.0.0.0".into(), port: 5000 }).unwrap();
        assert_eq!(v4, vec!["0.0.0.0:5000".parse::<SocketAddr>().unwrap()]);

        let v6 = listen_addrs(&ServerConfig { bind: "::".into(), port: 5000 }).unwrap();
        assert_eq!(v6, vec!["[::]:5000".parse::<SocketAddr>().unwrap()]);
    }

    #[actix_web::test]
    async fn test_join_scheduler_reports_panicked_loop() {
        assert!(join_scheduler(actix_web::rt::spawn(async {})).await);
        assert!(!join_scheduler(actix_web::rt::spawn(async { panic!("scheduler crashed"); })).await);
    }

    #[actix_web::test]
    async fn test_health_route() {
        let dir = tempdir().unwrap();
        let app = app!(Arc::new(FileStore::open(dir.path(), Tz::UTC).unwrap()));

        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn test_empty_store_serves_empty_data_and_zero_stats() {
        let dir = tempdir().unwrap();
        let app = app!(Arc::new(FileStore::open(dir.path(), Tz::UTC).unwrap()));

        let data: serde_json::Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/data").to_request()).await;
        assert_eq!(data, serde_json::json!([]));

        let stats: serde_json::Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/stats").to_request()).await;
        assert_eq!(stats["total_pings"], 0);
        assert_eq!(stats["success_rate"], 0.0);
        assert!(stats["avg_response_time"].is_null());
    }

    #[actix_web::test]
    async fn test_day_routes() {
        let dir = tempdir().unwrap();
        let store = Arc::new(FileStore::open(dir.path(), Tz::UTC).unwrap());
        store.append(&Measurement::success(at("2026-10-15T09:00:00+00:00"), 10.0)).await.unwrap();
        store.append(&Measurement::success(at("2026-10-15T09:01:00+00:00"), 20.0)).await.unwrap();
        store.append(&Measurement::failure(at("2026-10-15T09:02:00+00:00"), "timeout")).await.unwrap();
        let app = app!(store);

        let data: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/data/2026-10-15").to_request(),
        )
        .await;
        assert_eq!(data.as_array().map(Vec::len), Some(3));
        assert_eq!(data[0]["timestamp"], "2026-10-15T09:00:00+00:00");
        assert!(data[2]["response_time"].is_null());

        let stats: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/api/stats/2026-10-15").to_request(),
        )
        .await;
        assert_eq!(stats["total_pings"], 3);
        assert_eq!(stats["successful_pings"], 2);
        assert_eq!(stats["failed_pings"], 1);
        assert_eq!(stats["avg_response_time"], 15.0);
    }

    #[actix_web::test]
    async fn test_bad_date_is_bad_request() {
        let dir = tempdir().unwrap();
        let app = app!(Arc::new(FileStore::open(dir.path(), Tz::UTC).unwrap()));

        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/api/stats/yesterday").to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
