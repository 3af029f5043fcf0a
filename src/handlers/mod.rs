pub mod purchase;
pub mod raffle;
pub mod system;

pub use purchase::purchase_config;
pub use raffle::raffle_config;
pub use system::system_config;

use crate::error::AppError;
use crate::middlewares::AdminIdentity;
use actix_web::{HttpMessage, HttpRequest, web};

/// Username of the authenticated admin (set by the auth middleware)
fn admin_name(req: &HttpRequest) -> String {
    req.extensions()
        .get::<AdminIdentity>()
        .map(|admin| admin.username.clone())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Malformed JSON bodies are reported like any other validation failure
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(10 * 1024 * 1024)
        .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into())
}

/// Routes served under `/api`, plus the root banner
pub fn routes_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(system::index)).service(
        web::scope("/api")
            .configure(system_config)
            .configure(raffle_config)
            .configure(purchase_config),
    );
}
