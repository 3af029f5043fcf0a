use crate::error::AppError;
use crate::utils::{Claims, JwtService};
use actix_web::http::Method;
use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

enum PathRule {
    Exact(&'static str),
    Prefix(&'static str),
}

impl PathRule {
    fn matches(&self, path: &str) -> bool {
        match self {
            PathRule::Exact(p) => path == *p || path.strip_suffix('/') == Some(*p),
            PathRule::Prefix(p) => path.starts_with(p),
        }
    }
}

/// Routes reachable without an admin token. Everything else requires one.
struct PublicRoutes {
    rules: Vec<(Method, PathRule)>,
}

impl PublicRoutes {
    fn new() -> Self {
        Self {
            rules: vec![
                (Method::GET, PathRule::Exact("/")),
                (Method::GET, PathRule::Exact("/api/health")),
                (Method::GET, PathRule::Exact("/swagger-ui")),
                (Method::GET, PathRule::Prefix("/swagger-ui/")),
                (Method::GET, PathRule::Prefix("/api-docs/")),
                // raffle catalogue and detail
                (Method::GET, PathRule::Exact("/api/raffles")),
                (Method::GET, PathRule::Prefix("/api/raffles/")),
                // sold numbers of a raffle
                (Method::GET, PathRule::Prefix("/api/purchases/raffle/")),
                // claiming a number
                (Method::POST, PathRule::Exact("/api/purchases")),
            ],
        }
    }

    fn is_public(&self, method: &Method, path: &str) -> bool {
        self.rules
            .iter()
            .any(|(m, rule)| m == method && rule.matches(path))
    }
}

/// Admin identity attached to authenticated requests
#[derive(Debug, Clone)]
pub struct AdminIdentity {
    pub username: String,
}

impl From<Claims> for AdminIdentity {
    fn from(claims: Claims) -> Self {
        Self {
            username: claims.sub,
        }
    }
}

pub struct AuthMiddleware {
    jwt_service: JwtService,
}

impl AuthMiddleware {
    pub fn new(jwt_service: JwtService) -> Self {
        Self { jwt_service }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            jwt_service: self.jwt_service.clone(),
            public_routes: PublicRoutes::new(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    jwt_service: JwtService,
    public_routes: PublicRoutes,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // CORS preflight always passes
        if req.method() == Method::OPTIONS {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        if self.public_routes.is_public(req.method(), req.path()) {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        let token = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        let Some(token) = token else {
            let error = AppError::AuthError("Missing access token".to_string());
            return Box::pin(async move { Err(error.into()) });
        };

        match self.jwt_service.verify_admin_token(token) {
            Ok(claims) => {
                req.extensions_mut().insert(AdminIdentity::from(claims));
                let fut = self.service.call(req);
                Box::pin(fut)
            }
            Err(e) => Box::pin(async move { Err(e.into()) }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_routes() {
        let routes = PublicRoutes::new();
        assert!(routes.is_public(&Method::GET, "/api/raffles"));
        assert!(routes.is_public(&Method::GET, "/api/raffles/"));
        assert!(routes.is_public(&Method::GET, "/api/raffles/12"));
        assert!(routes.is_public(&Method::GET, "/api/purchases/raffle/12"));
        assert!(routes.is_public(&Method::POST, "/api/purchases"));
        assert!(routes.is_public(&Method::GET, "/api/health"));
        assert!(routes.is_public(&Method::GET, "/swagger-ui/index.html"));
    }

    #[test]
    fn test_admin_routes() {
        let routes = PublicRoutes::new();
        assert!(!routes.is_public(&Method::POST, "/api/raffles"));
        assert!(!routes.is_public(&Method::PUT, "/api/raffles/12"));
        assert!(!routes.is_public(&Method::DELETE, "/api/raffles/12"));
        assert!(!routes.is_public(&Method::GET, "/api/purchases"));
        assert!(!routes.is_public(&Method::GET, "/api/purchases/5"));
        assert!(!routes.is_public(&Method::DELETE, "/api/purchases/5"));
        assert!(!routes.is_public(&Method::POST, "/api/purchases/5"));
    }
}
