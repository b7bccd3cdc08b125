use jsonwebtoken::{decode, encode, errors as JError, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;

use core_types::token::CallbackClaims;
use xerror::api::*;

/// Claims as they are signed, the callback state plus the validity window.
#[derive(Debug, Serialize)]
struct SignedClaims<'a> {
    /// Timestamp when the token was issued.
    iat: i64,
    /// Timestamp when the token expires.
    exp: i64,
    #[serde(flatten)]
    claims: &'a CallbackClaims,
}

#[inline]
fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn encode_claims(claims: &CallbackClaims, secret: &[u8], iat: i64, exp: i64) -> Result<String, ApiError> {
    let payload = SignedClaims { iat, exp, claims };
    encode(&Header::new(Algorithm::HS256), &payload, &EncodingKey::from_secret(secret)).map_err(|_| ApiError::Internal)
}

/// Function signs the callback claims with the bridge secret.
/// # Arguments
/// * `claims` - Callback state the zap endpoint needs later on.
/// * `secret` - Shared HMAC secret.
/// * `lifetime` - Seconds until the token expires.
#[inline]
pub fn sign_claims(claims: &CallbackClaims, secret: &[u8], lifetime: i64) -> Result<String, ApiError> {
    let now = now();
    encode_claims(claims, secret, now, now + lifetime)
}

/// Function checks the signature, audience and expiry of a token and returns its claims.
/// Expired tokens are reported apart from any other failure.
#[inline]
pub fn verify_claims(token: &str, secret: &[u8], audience: &str) -> Result<CallbackClaims, ApiError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_audience(&[audience]);
    validation.set_required_spec_claims(&["exp", "aud"]);

    decode::<CallbackClaims>(token, &DecodingKey::from_secret(secret), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.into_kind() {
            JError::ErrorKind::ExpiredSignature => ApiError::Integrity(IntegrityError::TokenExpired),
            _ => ApiError::Integrity(IntegrityError::TokenInvalid),
        })
}
