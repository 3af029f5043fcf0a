use crate::error::{AppError, AppResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // admin username
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// Verifies (and, for the session collaborator, issues) HS256 admin tokens.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expires_in: i64,
}

impl JwtService {
    pub fn new(secret: &str, access_expires_in: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_expires_in: access_expires_in,
        }
    }

    pub fn generate_admin_token(&self, username: &str) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.access_token_expires_in);

        let claims = Claims {
            sub: username.to_string(),
            role: ADMIN_ROLE.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(AppError::JwtError)
    }

    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(AppError::JwtError)
    }

    pub fn verify_admin_token(&self, token: &str) -> AppResult<Claims> {
        let claims = self.verify_token(token)?;

        if claims.role != ADMIN_ROLE {
            return Err(AppError::AuthError("Admin privileges required".to_string()));
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_token_roundtrip() {
        let jwt = JwtService::new("secret", 3600);
        let token = jwt.generate_admin_token("admin").unwrap();
        let claims = jwt.verify_admin_token(&token).unwrap();
        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.role, ADMIN_ROLE);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let issuer = JwtService::new("secret-a", 3600);
        let verifier = JwtService::new("secret-b", 3600);
        let token = issuer.generate_admin_token("admin").unwrap();
        assert!(matches!(
            verifier.verify_admin_token(&token),
            Err(AppError::JwtError(_))
        ));
    }

    #[test]
    fn test_non_admin_role_is_rejected() {
        let jwt = JwtService::new("secret", 3600);
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "guest".into(),
            role: "viewer".into(),
            exp: now + 60,
            iat: now,
        };
        let token = encode(&Header::default(), &claims, &jwt.encoding_key).unwrap();
        assert!(matches!(
            jwt.verify_admin_token(&token),
            Err(AppError::AuthError(_))
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let jwt = JwtService::new("secret", -3600);
        let token = jwt.generate_admin_token("admin").unwrap();
        assert!(jwt.verify_admin_token(&token).is_err());
    }
}
