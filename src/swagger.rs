use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::RaffleStatus;
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::system::health,
        handlers::raffle::list_raffles,
        handlers::raffle::get_raffle,
        handlers::raffle::create_raffle,
        handlers::raffle::update_raffle,
        handlers::raffle::delete_raffle,
        handlers::purchase::list_raffle_purchases,
        handlers::purchase::create_purchase,
        handlers::purchase::get_purchase,
        handlers::purchase::delete_purchase,
        handlers::purchase::list_all_purchases,
    ),
    components(
        schemas(
            RaffleStatus,
            RaffleListQuery,
            CreateRaffleRequest,
            UpdateRaffleRequest,
            RaffleResponse,
            RaffleListResponse,
            RaffleEnvelope,
            RaffleDetailResponse,
            CreatePurchaseRequest,
            PurchaseResponse,
            PurchaseWithRaffleResponse,
            PurchaseEnvelope,
            PurchaseListResponse,
            AdminPurchaseListResponse,
            MessageResponse,
            HealthResponse,
            ErrorResponse,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "raffle", description = "Raffle registry API"),
        (name = "purchase", description = "Number allocation API"),
        (name = "system", description = "Health check"),
    ),
    info(
        title = "Raffle Backend API",
        version = "1.0.0",
        description = "Raffle management REST API documentation"
    ),
    servers(
        (url = "/api", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_claim_route() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json["paths"]["/purchases"]["post"].is_object());
        assert!(json["paths"]["/raffles/{id}"]["get"].is_object());
        assert!(json["components"]["securitySchemes"]["bearer_auth"].is_object());
    }
}
