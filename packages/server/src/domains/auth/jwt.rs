use anyhow::Result;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::common::UserId;

/// JWT Claims issued by the identity provider
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // Identity-provider user id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> UserId {
        UserId::new(self.sub.clone())
    }
}

/// JWT Service - verifies identity tokens (HS256)
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl JwtService {
    pub fn new(secret: &str, issuer: String) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
        }
    }

    /// Mint a token for a user. Used by tests and local tooling.
    ///
    /// Token expires after 24 hours
    pub fn create_token(&self, user_id: &UserId, email: Option<&str>) -> Result<String> {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::hours(24);

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.map(str::to_string),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(Into::into)
    }

    /// Verify and decode a token. Rejects bad signatures, expiry, and foreign issuers.
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_verify_token() {
        let service = JwtService::new("test_secret_key", "recipe-finder".to_string());
        let user_id = UserId::from("firebase-uid-123");

        let token = service
            .create_token(&user_id, Some("cook@example.com"))
            .unwrap();

        let claims = service.verify_token(&token).unwrap();
        assert_eq!(claims.user_id(), user_id);
        assert_eq!(claims.email.as_deref(), Some("cook@example.com"));
        assert_eq!(claims.iss, "recipe-finder");
    }

    #[test]
    fn test_invalid_token() {
        let service = JwtService::new("test_secret_key", "recipe-finder".to_string());
        assert!(service.verify_token("invalid_token").is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let service1 = JwtService::new("secret1", "recipe-finder".to_string());
        let service2 = JwtService::new("secret2", "recipe-finder".to_string());

        let token = service1.create_token(&UserId::from("u1"), None).unwrap();
        assert!(service2.verify_token(&token).is_err());
    }

    #[test]
    fn test_wrong_issuer() {
        let issuer_a = JwtService::new("shared", "issuer-a".to_string());
        let issuer_b = JwtService::new("shared", "issuer-b".to_string());

        let token = issuer_a.create_token(&UserId::from("u1"), None).unwrap();
        assert!(issuer_b.verify_token(&token).is_err());
    }

    #[test]
    fn test_expiry_is_a_day_out() {
        let service = JwtService::new("test_secret_key", "recipe-finder".to_string());
        let token = service.create_token(&UserId::from("u1"), None).unwrap();
        let claims = service.verify_token(&token).unwrap();

        let expires_in = claims.exp - chrono::Utc::now().timestamp();
        assert!(expires_in > 23 * 3600);
        assert!(expires_in <= 24 * 3600);
    }
}
