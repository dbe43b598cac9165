//! Identity service.
//!
//! Turns a bearer token into a [`Principal`]. Every core operation takes the
//! principal explicitly; nothing reads identity from ambient request state.

use chrono::Utc;
use circle_common::{AppError, AppResult, config::AuthConfig};
use circle_db::repositories::UserRepository;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// A verified caller identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Principal {
    user_id: i64,
}

impl Principal {
    /// Wrap an already verified user id.
    #[must_use]
    pub const fn new(user_id: i64) -> Self {
        Self { user_id }
    }

    /// The caller's user id.
    #[must_use]
    pub const fn user_id(&self) -> i64 {
        self.user_id
    }
}

/// Token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub id: i64,
    /// Expiry (seconds since the epoch).
    pub exp: u64,
}

/// Identity service for token issuing and verification.
#[derive(Clone)]
pub struct IdentityService {
    user_repo: UserRepository,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl_secs: u64,
}

impl IdentityService {
    /// Create a new identity service.
    #[must_use]
    pub fn new(user_repo: UserRepository, config: &AuthConfig) -> Self {
        Self {
            user_repo,
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            token_ttl_secs: config.token_ttl_secs,
        }
    }

    /// Issue a token for a user.
    pub fn issue(&self, user_id: i64) -> AppResult<String> {
        let now = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
        let claims = Claims {
            id: user_id,
            exp: now + self.token_ttl_secs,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))
    }

    /// Verify a token and resolve the caller.
    ///
    /// The user the token names must still exist.
    pub async fn verify(&self, token: &str) -> AppResult<Principal> {
        let data = decode::<Claims>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            AppError::Unauthorized
        })?;

        let user_id = data.claims.id;
        if user_id < 1 {
            return Err(AppError::Unauthorized);
        }

        if !self.user_repo.exists(user_id).await? {
            return Err(AppError::UserNotFound(user_id.to_string()));
        }

        Ok(Principal::new(user_id))
    }
}
