use crate::error::{AppError, Result};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Access-token claims issued by the identity platform. `sub` is the caller.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: u64,
}

impl Claims {
    #[must_use]
    pub fn new(user_id: Uuid, ttl_secs: u64) -> Self {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs());
        Self { sub: user_id, exp: now + ttl_secs }
    }

    /// Signs the claims with HS256.
    ///
    /// # Errors
    /// Returns `AppError::Internal` if signing fails.
    pub fn encode(&self, secret: &str) -> Result<String> {
        encode(&Header::default(), self, &EncodingKey::from_secret(secret.as_bytes())).map_err(|_| AppError::Internal)
    }

    /// Verifies signature and expiry.
    ///
    /// # Errors
    /// Returns `AppError::AuthError` if the token is invalid or expired.
    pub fn decode(token: &str, secret: &str) -> Result<Self> {
        let token_data = decode::<Self>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
            .map_err(|_| AppError::AuthError)?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_roundtrip() {
        let user_id = Uuid::new_v4();
        let secret = "test_secret";
        let claims = Claims::new(user_id, 3600);

        let token = claims.encode(secret).unwrap();
        let decoded = Claims::decode(&token, secret).unwrap();

        assert_eq!(claims, decoded);
    }

    #[test]
    fn test_claims_invalid_secret() {
        let claims = Claims::new(Uuid::new_v4(), 3600);
        let token = claims.encode("secret1").unwrap();

        let result = Claims::decode(&token, "secret2");
        assert!(matches!(result, Err(AppError::AuthError)));
    }

    #[test]
    fn test_claims_expired() {
        let claims = Claims { sub: Uuid::new_v4(), exp: 1 };
        let token = claims.encode("secret").unwrap();

        assert!(matches!(Claims::decode(&token, "secret"), Err(AppError::AuthError)));
    }
}
