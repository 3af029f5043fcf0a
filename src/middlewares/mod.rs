pub mod auth;
pub mod cors;

pub use auth::{AdminIdentity, AuthMiddleware};
pub use cors::create_cors;
