use crate::models::*;
use crate::services::PurchaseService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

use super::admin_name;

#[utoipa::path(
    get,
    path = "/purchases/raffle/{raffle_id}",
    tag = "purchase",
    params(("raffle_id" = i64, Path, description = "Raffle id")),
    responses(
        (status = 200, description = "Purchases of the raffle ordered by number", body = PurchaseListResponse)
    )
)]
pub async fn list_raffle_purchases(
    service: web::Data<PurchaseService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match service.list_purchases(path.into_inner()).await {
        Ok(purchases) => Ok(HttpResponse::Ok().json(PurchaseListResponse { purchases })),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/purchases",
    tag = "purchase",
    request_body = CreatePurchaseRequest,
    responses(
        (status = 201, description = "Number claimed", body = PurchaseEnvelope),
        (status = 400, description = "Missing fields, inactive raffle or invalid number", body = ErrorResponse),
        (status = 404, description = "Raffle not found", body = ErrorResponse),
        (status = 409, description = "Number already purchased", body = ErrorResponse)
    )
)]
/// Claims one number of a raffle:
/// 1. validate required fields
/// 2. raffle must exist and be active
/// 3. number must be within 1..=total_numbers
/// 4. number must be free (enforced by the store's unique index)
pub async fn create_purchase(
    service: web::Data<PurchaseService>,
    request: web::Json<CreatePurchaseRequest>,
) -> Result<HttpResponse> {
    match service.claim_number(request.into_inner()).await {
        Ok(purchase) => Ok(HttpResponse::Created().json(PurchaseEnvelope { purchase })),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/purchases/{id}",
    tag = "purchase",
    params(("id" = i64, Path, description = "Purchase id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Purchase", body = PurchaseEnvelope),
        (status = 404, description = "Purchase not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_purchase(
    service: web::Data<PurchaseService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match service.get_purchase(path.into_inner()).await {
        Ok(purchase) => Ok(HttpResponse::Ok().json(PurchaseEnvelope { purchase })),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/purchases/{id}",
    tag = "purchase",
    params(("id" = i64, Path, description = "Purchase id")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Purchase deleted, number available again", body = MessageResponse),
        (status = 404, description = "Purchase not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn delete_purchase(
    service: web::Data<PurchaseService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let id = path.into_inner();
    match service.delete_purchase(id).await {
        Ok(()) => {
            log::info!("Purchase {id} removed by {}", admin_name(&req));
            Ok(HttpResponse::Ok().json(MessageResponse::new("Purchase deleted successfully")))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/purchases",
    tag = "purchase",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "All purchases with raffle title, newest first", body = AdminPurchaseListResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_all_purchases(service: web::Data<PurchaseService>) -> Result<HttpResponse> {
    match service.list_all_purchases().await {
        Ok(purchases) => Ok(HttpResponse::Ok().json(AdminPurchaseListResponse { purchases })),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn purchase_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/purchases")
            .route("", web::get().to(list_all_purchases))
            .route("", web::post().to(create_purchase))
            .route("/raffle/{raffle_id}", web::get().to(list_raffle_purchases))
            .route("/{id}", web::get().to(get_purchase))
            .route("/{id}", web::delete().to(delete_purchase)),
    );
}
