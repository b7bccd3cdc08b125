use err_derive::Error;
use serde::Serialize;
use serde_json::json;

use actix_web::{error, http::StatusCode, HttpResponse};

/// The caller supplied invalid input.
#[derive(Debug, Error, Serialize, Clone, Copy, PartialEq, Eq)]
#[error(display = "The request is invalid.")]
pub enum RequestError {
    #[error(display = "Invalid public key")]
    InvalidPubkey,
    #[error(display = "No relays provided")]
    NoRelays,
    #[error(display = "Invalid relay url")]
    InvalidRelay,
    #[error(display = "Invalid zap trigger id")]
    InvalidTriggerId,
    #[error(display = "Invalid price")]
    InvalidPrice,
    #[error(display = "Invalid price unit")]
    InvalidPriceUnit,
    #[error(display = "Amount query-parameter is required")]
    AmountMissing,
    #[error(display = "Amount must be a valid positive integer")]
    InvalidAmount,
}

impl RequestError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPubkey => "INVALID_PUBKEY",
            Self::NoRelays => "NO_RELAYS",
            Self::InvalidRelay => "INVALID_RELAY",
            Self::InvalidTriggerId => "INVALID_TRIGGER_ID",
            Self::InvalidPrice => "INVALID_PRICE",
            Self::InvalidPriceUnit => "INVALID_PRICE_UNIT",
            Self::AmountMissing => "AMOUNT_MISSING",
            Self::InvalidAmount => "INVALID_AMOUNT",
        }
    }
}

/// The recipient's profile or wallet is misconfigured, or a service we depend on
/// could not be reached.
#[derive(Debug, Error, Serialize, Clone, Copy, PartialEq, Eq)]
#[error(display = "Failed to resolve the recipient.")]
pub enum UpstreamError {
    #[error(display = "Failed to find nostr profile")]
    ProfileNotFound,
    #[error(display = "Nostr profile content is not valid json")]
    ProfileMalformed,
    #[error(display = "No lud16 or lud06 found in nostr profile")]
    LightningAddressMissing,
    #[error(display = "Nostr profile has an invalid lightning address")]
    LightningAddressInvalid,
    #[error(display = "Lnurlp endpoint responded with an error status")]
    LnurlBadStatus,
    #[error(display = "Lnurlp endpoint responded with malformed metadata")]
    LnurlMalformed,
    #[error(display = "Nostr profile's lightning-wallet responded with unexpected tag")]
    LnurlUnexpectedTag,
    #[error(display = "Nostr profile has a lightning-wallet that does not support zaps")]
    ZapsUnsupported,
    #[error(display = "Nostr profile has a wallet with invalid min/max sendable")]
    InvalidSendable,
    #[error(display = "Nostr profile has a wallet that does not allow zap comments")]
    ZapCommentUnsupported,
    #[error(display = "Nostr relays are unavailable")]
    RelayUnavailable,
    #[error(display = "Failed to call lnurlp endpoint")]
    LnurlUnavailable,
    #[error(display = "Failed to fetch bitcoin price")]
    PriceUnavailable,
    #[error(display = "Failed to parse bitcoin price")]
    PriceMalformed,
}

impl UpstreamError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ProfileNotFound => "PROFILE_NOT_FOUND",
            Self::ProfileMalformed => "PROFILE_MALFORMED",
            Self::LightningAddressMissing => "LIGHTNING_ADDRESS_MISSING",
            Self::LightningAddressInvalid => "LIGHTNING_ADDRESS_INVALID",
            Self::LnurlBadStatus => "LNURL_BAD_STATUS",
            Self::LnurlMalformed => "LNURL_MALFORMED",
            Self::LnurlUnexpectedTag => "LNURL_UNEXPECTED_TAG",
            Self::ZapsUnsupported => "ZAPS_UNSUPPORTED",
            Self::InvalidSendable => "LNURL_INVALID_SENDABLE",
            Self::ZapCommentUnsupported => "ZAP_COMMENT_UNSUPPORTED",
            Self::RelayUnavailable => "RELAY_UNAVAILABLE",
            Self::LnurlUnavailable => "LNURL_UNAVAILABLE",
            Self::PriceUnavailable => "PRICE_UNAVAILABLE",
            Self::PriceMalformed => "PRICE_MALFORMED",
        }
    }

    /// A dependency could not be reached, as opposed to answering with bad data.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::RelayUnavailable | Self::LnurlUnavailable | Self::PriceUnavailable
        )
    }
}

/// Token, amount or price failed a protocol check.
#[derive(Debug, Error, Serialize, Clone, Copy, PartialEq, Eq)]
#[error(display = "Protocol check failed.")]
pub enum IntegrityError {
    #[error(display = "Invalid or expired token")]
    TokenInvalid,
    #[error(display = "Invalid or expired token")]
    TokenExpired,
    #[error(display = "Amount does not match the token")]
    AmountMismatch,
    #[error(display = "Your wallet does not support millisats")]
    AmountUnitMismatch,
    #[error(display = "Price is out of range of wallet support")]
    PriceOutOfRange,
}

impl IntegrityError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::TokenInvalid => "TOKEN_INVALID",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::AmountMismatch => "AMOUNT_MISMATCH",
            Self::AmountUnitMismatch => "AMOUNT_UNIT_MISMATCH",
            Self::PriceOutOfRange => "PRICE_OUT_OF_RANGE",
        }
    }
}

/// Deployment problems. These are not caused by the request.
#[derive(Debug, Error, Serialize, Clone, Copy, PartialEq, Eq)]
#[error(display = "Server is misconfigured.")]
pub enum ConfigError {
    #[error(display = "Nostr signing key is not configured")]
    SigningKeyMissing,
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::SigningKeyMissing => "SIGNING_KEY_MISSING",
        }
    }
}

#[derive(Debug, Error, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    #[error(display = "{}", _0)]
    Request(RequestError),
    #[error(display = "{}", _0)]
    Upstream(UpstreamError),
    #[error(display = "{}", _0)]
    Integrity(IntegrityError),
    #[error(display = "{}", _0)]
    Config(ConfigError),
    #[error(display = "Internal server error")]
    Internal,
}

impl ApiError {
    /// Stable, machine readable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Request(err) => err.code(),
            ApiError::Upstream(err) => err.code(),
            ApiError::Integrity(err) => err.code(),
            ApiError::Config(err) => err.code(),
            ApiError::Internal => "INTERNAL_ERROR",
        }
    }
}

impl error::ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "status": "ERROR",
            "code": self.code(),
            "reason": self.to_string(),
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Request(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(upstream) => {
                if upstream.is_unavailable() {
                    StatusCode::FAILED_DEPENDENCY
                } else {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
            }
            ApiError::Integrity(integrity) => match integrity {
                IntegrityError::TokenInvalid => StatusCode::UNAUTHORIZED,
                IntegrityError::TokenExpired => StatusCode::UNAUTHORIZED,
                IntegrityError::AmountMismatch => StatusCode::BAD_REQUEST,
                IntegrityError::AmountUnitMismatch => StatusCode::BAD_REQUEST,
                IntegrityError::PriceOutOfRange => StatusCode::BAD_REQUEST,
            },
            ApiError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use actix_web::ResponseError;
    use std::collections::HashSet;

    fn all_errors() -> Vec<ApiError> {
        let mut errors = vec![];
        errors.extend(
            [
                RequestError::InvalidPubkey,
                RequestError::NoRelays,
                RequestError::InvalidRelay,
                RequestError::InvalidTriggerId,
                RequestError::InvalidPrice,
                RequestError::InvalidPriceUnit,
                RequestError::AmountMissing,
                RequestError::InvalidAmount,
            ]
            .into_iter()
            .map(ApiError::Request),
        );
        errors.extend(
            [
                UpstreamError::ProfileNotFound,
                UpstreamError::ProfileMalformed,
                UpstreamError::LightningAddressMissing,
                UpstreamError::LightningAddressInvalid,
                UpstreamError::LnurlBadStatus,
                UpstreamError::LnurlMalformed,
                UpstreamError::LnurlUnexpectedTag,
                UpstreamError::ZapsUnsupported,
                UpstreamError::InvalidSendable,
                UpstreamError::ZapCommentUnsupported,
                UpstreamError::RelayUnavailable,
                UpstreamError::LnurlUnavailable,
                UpstreamError::PriceUnavailable,
                UpstreamError::PriceMalformed,
            ]
            .into_iter()
            .map(ApiError::Upstream),
        );
        errors.extend(
            [
                IntegrityError::TokenInvalid,
                IntegrityError::TokenExpired,
                IntegrityError::AmountMismatch,
                IntegrityError::AmountUnitMismatch,
                IntegrityError::PriceOutOfRange,
            ]
            .into_iter()
            .map(ApiError::Integrity),
        );
        errors.push(ApiError::Config(ConfigError::SigningKeyMissing));
        errors.push(ApiError::Internal);
        errors
    }

    #[test]
    fn test_codes_are_unique() {
        let errors = all_errors();
        let codes = errors.iter().map(|e| e.code()).collect::<HashSet<_>>();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_status_codes_by_category() {
        for err in all_errors() {
            let status = err.status_code();
            match err {
                ApiError::Request(_) | ApiError::Integrity(_) => assert!(status.is_client_error(), "{:?}", err),
                ApiError::Upstream(_) => assert!(status.is_client_error(), "{:?}", err),
                ApiError::Config(_) | ApiError::Internal => assert!(status.is_server_error(), "{:?}", err),
            }
        }
        assert_eq!(
            ApiError::Upstream(UpstreamError::PriceUnavailable).status_code(),
            StatusCode::FAILED_DEPENDENCY
        );
        assert_eq!(
            ApiError::Upstream(UpstreamError::ZapsUnsupported).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::Integrity(IntegrityError::TokenExpired).status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[actix_web::test]
    async fn test_error_body() {
        let response = ApiError::Integrity(IntegrityError::AmountUnitMismatch).error_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["status"], "ERROR");
        assert_eq!(body["code"], "AMOUNT_UNIT_MISMATCH");
        assert_eq!(body["reason"], "Your wallet does not support millisats");
    }
}
