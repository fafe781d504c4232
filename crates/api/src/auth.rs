//! Bearer-token validation.
//!
//! Credential issuance lives in the identity collaborator; this module only
//! validates the JWTs it mints and recovers the stable user identity.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use quorum_common::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Claims quorum cares about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// The user id.
    pub sub: String,
    /// Expiry (seconds since epoch).
    pub exp: usize,
    /// Issuer, when the deployment pins one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// The identity a validated token resolves to.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// User id (the token's `sub`).
    pub id: String,
}

/// HS256 token verifier.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Create a verifier for the given shared secret.
    #[must_use]
    pub fn new(secret: &str, issuer: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(iss) = issuer {
            validation.set_issuer(&[iss]);
        }
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Validate a token and extract the user identity.
    pub fn verify(&self, token: &str) -> AppResult<AuthenticatedUser> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| AppError::Unauthorized)?;
        Ok(AuthenticatedUser {
            id: data.claims.sub,
        })
    }
}
