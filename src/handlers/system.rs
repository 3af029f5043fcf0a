use crate::models::HealthResponse;
use actix_web::{HttpResponse, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        message: "Server is running".to_string(),
    }))
}

/// Service banner with the endpoint map
pub async fn index() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "message": "Raffle API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/api/health",
            "raffles": "/api/raffles",
            "purchases": "/api/purchases",
            "docs": "/swagger-ui/"
        }
    })))
}

pub fn system_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health));
}
