use actix_web::{get, web, HttpResponse};
use serde::Serialize;

use crate::{db::repository::Database, error::Result};

#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub database: String,
}

#[get("/health")]
pub async fn health_check(db: web::Data<Database>) -> Result<HttpResponse> {
    // Round trip to storage so the check fails when the database is gone.
    db.ping().await?;

    let response = HealthCheckResponse {
        status: "healthy".to_string(),
        database: "reachable".to_string(),
    };

    Ok(HttpResponse::Ok().json(response))
}
