use crate::models::*;
use crate::services::{PurchaseService, RaffleService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

use super::admin_name;

#[utoipa::path(
    get,
    path = "/raffles",
    tag = "raffle",
    params(
        ("status" = Option<String>, Query, description = "active / closed / cancelled")
    ),
    responses(
        (status = 200, description = "Raffles, newest first", body = RaffleListResponse)
    )
)]
pub async fn list_raffles(
    service: web::Data<RaffleService>,
    query: web::Query<RaffleListQuery>,
) -> Result<HttpResponse> {
    match service.list_raffles(query.status.as_deref()).await {
        Ok(raffles) => Ok(HttpResponse::Ok().json(RaffleListResponse { raffles })),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/raffles/{id}",
    tag = "raffle",
    params(("id" = i64, Path, description = "Raffle id")),
    responses(
        (status = 200, description = "Raffle with its sold numbers", body = RaffleDetailResponse),
        (status = 404, description = "Raffle not found", body = ErrorResponse)
    )
)]
pub async fn get_raffle(
    raffles: web::Data<RaffleService>,
    purchases: web::Data<PurchaseService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    let raffle = match raffles.get_raffle(id).await {
        Ok(raffle) => raffle,
        Err(e) => return Ok(e.error_response()),
    };
    match purchases.purchased_numbers(id).await {
        Ok(purchased_numbers) => Ok(HttpResponse::Ok().json(RaffleDetailResponse {
            raffle,
            purchased_numbers,
        })),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/raffles",
    tag = "raffle",
    request_body = CreateRaffleRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Raffle created", body = RaffleEnvelope),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn create_raffle(
    service: web::Data<RaffleService>,
    request: web::Json<CreateRaffleRequest>,
) -> Result<HttpResponse> {
    match service.create_raffle(request.into_inner()).await {
        Ok(raffle) => Ok(HttpResponse::Created().json(RaffleEnvelope { raffle })),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/raffles/{id}",
    tag = "raffle",
    params(("id" = i64, Path, description = "Raffle id")),
    request_body = UpdateRaffleRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Raffle updated", body = RaffleEnvelope),
        (status = 400, description = "Invalid field value", body = ErrorResponse),
        (status = 404, description = "Raffle not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn update_raffle(
    service: web::Data<RaffleService>,
    path: web::Path<i64>,
    request: web::Json<UpdateRaffleRequest>,
) -> Result<HttpResponse> {
    match service
        .update_raffle(path.into_inner(), request.into_inner())
        .await
    {
        Ok(raffle) => Ok(HttpResponse::Ok().json(RaffleEnvelope { raffle })),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/raffles/{id}",
    tag = "raffle",
    params(("id" = i64, Path, description = "Raffle id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Raffle and its purchases deleted", body = MessageResponse),
        (status = 404, description = "Raffle not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn delete_raffle(
    service: web::Data<RaffleService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    match service.delete_raffle(id).await {
        Ok(()) => {
            log::info!("Raffle {id} removed by {}", admin_name(&req));
            Ok(HttpResponse::Ok().json(MessageResponse::new("Raffle deleted successfully")))
        }
        Err(e) => Ok(e.error_response()),
    }
}

pub fn raffle_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/raffles")
            .route("", web::get().to(list_raffles))
            .route("", web::post().to(create_raffle))
            .route("/{id}", web::get().to(get_raffle))
            .route("/{id}", web::put().to(update_raffle))
            .route("/{id}", web::delete().to(delete_raffle)),
    );
}
