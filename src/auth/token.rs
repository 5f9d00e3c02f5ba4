//! Defines the claims carried by access tokens and how to sign and verify them.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, User, UserID};

/// How long an access token is valid for unless configured otherwise.
pub const DEFAULT_TOKEN_DURATION: Duration = Duration::minutes(60);

/// The contents of a JSON Web Token.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// The username of the user the token was issued to.
    pub sub: String,
    /// The ID of the user the token was issued to.
    pub user_id: UserID,
    /// The time the token was issued, in seconds since the Unix epoch.
    pub iat: i64,
    /// The expiry time of the token, in seconds since the Unix epoch.
    pub exp: i64,
}

/// The keys used to sign and verify access tokens.
#[derive(Clone)]
pub struct TokenKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenKeys {
    /// Create HMAC keys from a shared `secret`.
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Create a signed token for `user` that expires `duration` after `issued_at`.
///
/// # Errors
///
/// Returns an [Error::TokenCreation] if the token could not be signed.
pub fn encode_token(
    user: &User,
    issued_at: OffsetDateTime,
    duration: Duration,
    keys: &TokenKeys,
) -> Result<String, Error> {
    let claims = Claims {
        sub: user.username.clone(),
        user_id: user.id,
        iat: issued_at.unix_timestamp(),
        exp: (issued_at + duration).unix_timestamp(),
    };

    encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding_key)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Verify the signature and expiry of `token` and return its claims.
///
/// # Errors
///
/// Returns an [Error::InvalidToken] if the token is malformed, was signed
/// with a different key, or has expired.
pub fn decode_token(token: &str, keys: &TokenKeys) -> Result<Claims, Error> {
    decode::<Claims>(token, &keys.decoding_key, &Validation::new(Algorithm::HS256))
        .map(|token_data| token_data.claims)
        .map_err(|error| {
            tracing::debug!("Rejected access token: {error}");
            Error::InvalidToken
        })
}
