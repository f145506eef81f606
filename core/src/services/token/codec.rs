//! Token codec abstraction over the JWT signing library
//!
//! The rest of the system never imports a signing library directly;
//! swapping implementations touches this module only.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, TokenError};

/// Raw JWT payload as it appears on the wire
///
/// `sub` is the decimal user id in canonical tokens; legacy tokens carry
/// a username there and are resolved downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireClaims {
    /// Subject (user id, or a username in legacy tokens)
    pub sub: String,

    /// Role string
    pub role: String,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// Issuer
    pub iss: String,

    /// JWT ID (unique identifier for the token)
    pub jti: String,
}

/// Seam for JWT creation and validation
pub trait TokenCodec: Send + Sync {
    /// Sign claims into a compact token
    fn encode(&self, claims: &WireClaims) -> Result<String, DomainError>;

    /// Verify signature and expiry, returning the claims
    fn decode(&self, token: &str) -> Result<WireClaims, DomainError>;
}

/// HS256 codec backed by the `jsonwebtoken` crate
pub struct JwtCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtCodec {
    pub fn new(secret: &str, issuer: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[issuer]);
        validation.validate_exp = true;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

impl TokenCodec for JwtCodec {
    fn encode(&self, claims: &WireClaims) -> Result<String, DomainError> {
        let header = Header::new(Algorithm::HS256);
        encode(&header, claims, &self.encoding_key)
            .map_err(|_| DomainError::Internal {
                message: "Token generation failed".to_string(),
            })
    }

    fn decode(&self, token: &str) -> Result<WireClaims, DomainError> {
        let token_data = decode::<WireClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                if e.kind() == &jsonwebtoken::errors::ErrorKind::ExpiredSignature {
                    DomainError::Token(TokenError::TokenExpired)
                } else {
                    DomainError::Token(TokenError::TokenInvalid)
                }
            })?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn claims(exp_offset: i64) -> WireClaims {
        let now = Utc::now().timestamp();
        WireClaims {
            sub: "42".to_string(),
            role: "user".to_string(),
            iat: now,
            exp: now + exp_offset,
            iss: "partshub".to_string(),
            jti: "test-jti".to_string(),
        }
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let codec = JwtCodec::new("test-secret", "partshub");
        let original = claims(600);
        let token = codec.encode(&original).unwrap();
        let decoded = codec.decode(&token).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let codec = JwtCodec::new("secret-a", "partshub");
        let other = JwtCodec::new("secret-b", "partshub");
        let token = codec.encode(&claims(600)).unwrap();

        match other.decode(&token) {
            Err(DomainError::Token(TokenError::TokenInvalid)) => {}
            other => panic!("expected TokenInvalid, got {:?}", other),
        }
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = JwtCodec::new("test-secret", "partshub");
        // jsonwebtoken applies default leeway, so expire well in the past
        let token = codec.encode(&claims(-600)).unwrap();

        match codec.decode(&token) {
            Err(DomainError::Token(TokenError::TokenExpired)) => {}
            other => panic!("expected TokenExpired, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let codec = JwtCodec::new("test-secret", "partshub");
        let other = JwtCodec::new("test-secret", "someone-else");
        let token = codec.encode(&claims(600)).unwrap();
        assert!(other.decode(&token).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        let codec = JwtCodec::new("test-secret", "partshub");
        match codec.decode("not.a.jwt") {
            Err(DomainError::Token(TokenError::TokenInvalid)) => {}
            other => panic!("expected TokenInvalid, got {:?}", other),
        }
    }
}
