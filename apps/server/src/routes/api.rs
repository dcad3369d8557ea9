use actix_web::{HttpResponse, get, web};
use netpulse::QueryService;
use netpulse::database::partition;

use crate::error::AppError;

macros_utils::routes! {
    route today_data,
    route today_stats,
    route day_data,
    route day_stats,
}

fn parse_date(raw: &str) -> Result<chrono::NaiveDate, AppError> {
    partition::parse_date(raw).ok_or_else(|| AppError::InvalidDate(raw.to_string()))
}

/// Today's measurements, oldest first
#[get("/api/data")]
pub async fn today_data(query: web::Data<QueryService>) -> HttpResponse {
    HttpResponse::Ok().json(query.today().await)
}

/// Statistics over today's measurements
#[get("/api/stats")]
pub async fn today_stats(query: web::Data<QueryService>) -> HttpResponse {
    HttpResponse::Ok().json(query.today_stats().await)
}

#[get("/api/data/{date}")]
pub async fn day_data(
    query: web::Data<QueryService>,
    date: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let date = parse_date(&date)?;
    Ok(HttpResponse::Ok().json(query.day(date).await))
}

#[get("/api/stats/{date}")]
pub async fn day_stats(
    query: web::Data<QueryService>,
    date: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let date = parse_date(&date)?;
    Ok(HttpResponse::Ok().json(query.day_stats(date).await))
}
