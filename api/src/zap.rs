use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use nostr_sdk::prelude::JsonUtil;
use serde_json::Value;
use slog as log;
use slog::Logger;
use url::Url;

use core_types::token::{CallbackClaims, CALLBACK_AUDIENCE};
use core_types::{check_amount, is_safe_integer, AmountCheck, Msats};
use utils::nostr::{sign_zap_request, ZapContent, ZapRequest};
use xerror::api::*;

use crate::jwt;
use crate::Bridge;

/// Query parameters the bridge sets on the recipient's callback.
const RESERVED_PARAMS: [&str; 3] = ["amount", "nostr", "lnurl"];

/// The `amount` query parameter: a positive integer a javascript wallet can represent.
pub fn parse_amount(amount: Option<&str>) -> Result<Msats, ApiError> {
    let amount = amount.ok_or(ApiError::Request(RequestError::AmountMissing))?;
    match amount.parse::<Msats>() {
        Ok(msats) if msats > 0 && is_safe_integer(msats) && !amount.starts_with('+') => Ok(msats),
        _ => Err(ApiError::Request(RequestError::InvalidAmount)),
    }
}

/// Checks the requested amount against the price committed in the token, if any.
pub fn reconcile_amount(claims: &CallbackClaims, amount: Msats) -> Result<(), ApiError> {
    let committed = match claims.msats {
        Some(committed) => committed,
        None => return Ok(()),
    };
    match check_amount(committed, amount) {
        AmountCheck::Match => Ok(()),
        AmountCheck::UnitMismatch => Err(ApiError::Integrity(IntegrityError::AmountUnitMismatch)),
        AmountCheck::Mismatch => Err(ApiError::Integrity(IntegrityError::AmountMismatch)),
    }
}

pub fn zap_content(claims: &CallbackClaims) -> ZapContent {
    ZapContent::new(claims.trigger_id.clone(), claims.price.clone(), claims.unit.clone())
}

/// The recipient's callback with `amount`, `nostr` and `lnurl` set, replacing any
/// values of the same name it already carried.
pub fn callback_url(callback: &str, amount: Msats, zap_request: &str, lnurl: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(callback)?;
    let kept = url
        .query_pairs()
        .filter(|(key, _)| !RESERVED_PARAMS.contains(&key.as_ref()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect::<Vec<_>>();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("amount", &amount.to_string())
        .append_pair("nostr", zap_request)
        .append_pair("lnurl", lnurl);
    Ok(url)
}

/// Verifies the token and amount, signs the zap request and hands the payment request
/// on to the recipient's wallet. Its answer is relayed as is.
pub async fn relay_zap(
    bridge: &Bridge,
    token: &str,
    amount: Option<&str>,
    logger: &Logger,
) -> Result<HttpResponse, ApiError> {
    let keys = bridge.nostr_keys.as_ref().ok_or_else(|| {
        log::crit!(logger, "Refusing zap, nostr signing key is not configured");
        ApiError::Config(ConfigError::SigningKeyMissing)
    })?;

    let amount = parse_amount(amount)?;
    let claims = jwt::verify_claims(token, &bridge.jwt_secret, CALLBACK_AUDIENCE)?;
    if let Err(err) = reconcile_amount(&claims, amount) {
        log::info!(logger, "Wallet asked for {} msats, offer committed to {:?}", amount, claims.msats);
        return Err(err);
    }

    let content = zap_content(&claims);
    let request = ZapRequest {
        recipient: &claims.pubkey,
        relays: &claims.relays,
        amount_msats: amount,
        lnurl: &claims.lnurl,
        content: &content,
    };
    let event = sign_zap_request(keys, &request).map_err(|err| {
        log::error!(logger, "Failed to sign zap request: {:?}", err);
        ApiError::Internal
    })?;
    log::info!(logger, "Signed zap request {} for {}", event.id.to_hex(), claims.pubkey);

    let url = callback_url(&claims.callback, amount, &event.as_json(), &claims.lnurl).map_err(|err| {
        log::error!(logger, "Token carries invalid callback {}: {}", claims.callback, err);
        ApiError::Internal
    })?;

    let response = match bridge.http.get(url).timeout(bridge.http_timeout).send().await {
        Ok(r) => r,
        Err(err) => {
            log::error!(logger, "Failed to call wallet callback: {}", err);
            return Err(ApiError::Internal);
        }
    };

    let status = StatusCode::from_u16(response.status().as_u16()).map_err(|_| ApiError::Internal)?;
    let body = match response.text().await {
        Ok(b) => b,
        Err(err) => {
            log::error!(logger, "Failed to read wallet callback response: {}", err);
            return Err(ApiError::Internal);
        }
    };
    let body: Value = serde_json::from_str(&body).map_err(|_| {
        log::error!(logger, "Wallet callback responded with {} and a non json body: {}", status, body);
        ApiError::Internal
    })?;

    Ok(HttpResponse::build(status).json(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(msats: Option<Msats>) -> CallbackClaims {
        CallbackClaims {
            aud: CALLBACK_AUDIENCE.to_string(),
            callback: "https://example.com/cb".to_string(),
            msats,
            price: None,
            unit: None,
            trigger_id: Some("3".to_string()),
            lnurl: "lnurl1dp68gurn8ghj7".to_string(),
            relays: vec!["wss://nos.lol".to_string()],
            pubkey: "ab".repeat(32),
        }
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(Some("1000")), Ok(1000));
        assert_eq!(parse_amount(Some("9007199254740991")), Ok(9_007_199_254_740_991));
        assert_eq!(parse_amount(None), Err(ApiError::Request(RequestError::AmountMissing)));
        for amount in ["", "0", "-1", "+5", "1.5", "abc", "9007199254740992", "99999999999999999999999"] {
            assert_eq!(
                parse_amount(Some(amount)),
                Err(ApiError::Request(RequestError::InvalidAmount)),
                "{}",
                amount
            );
        }
    }

    #[test]
    fn test_reconcile_amount() {
        assert_eq!(reconcile_amount(&claims(None), 12_345), Ok(()));
        assert_eq!(reconcile_amount(&claims(Some(10_000_000)), 10_000_000), Ok(()));
        assert_eq!(
            reconcile_amount(&claims(Some(10_000_000)), 10_000),
            Err(ApiError::Integrity(IntegrityError::AmountMismatch))
        );
        assert_eq!(
            reconcile_amount(&claims(Some(1_500)), 2_000),
            Err(ApiError::Integrity(IntegrityError::AmountUnitMismatch))
        );
        assert_eq!(
            reconcile_amount(&claims(Some(10_000_000)), 9_999_999),
            Err(ApiError::Integrity(IntegrityError::AmountMismatch))
        );
    }

    #[test]
    fn test_zap_content_from_claims() {
        let mut claims = claims(Some(10_000_000));
        assert_eq!(zap_content(&claims).to_json(), r#"{"triggerId":"3"}"#);
        claims.price = Some("5".to_string());
        claims.unit = Some("USD".to_string());
        assert_eq!(zap_content(&claims).to_json(), r#"{"triggerId":"3","price":"5","unit":"USD"}"#);
    }

    #[test]
    fn test_callback_url() {
        let url = callback_url("https://example.com/cb", 1000, r#"{"kind":9734}"#, "lnurl1x").unwrap();
        let pairs = url.query_pairs().into_owned().collect::<Vec<_>>();
        assert_eq!(
            pairs,
            vec![
                ("amount".to_string(), "1000".to_string()),
                ("nostr".to_string(), r#"{"kind":9734}"#.to_string()),
                ("lnurl".to_string(), "lnurl1x".to_string()),
            ]
        );
        assert_eq!(url.path(), "/cb");
    }

    #[test]
    fn test_callback_url_replaces_existing_params() {
        let url = callback_url(
            "https://example.com/cb?id=7&amount=1&nostr=old&lnurl=old&amount=2",
            5000,
            "{}",
            "lnurl1x",
        )
        .unwrap();
        let pairs = url.query_pairs().into_owned().collect::<Vec<_>>();
        assert_eq!(
            pairs,
            vec![
                ("id".to_string(), "7".to_string()),
                ("amount".to_string(), "5000".to_string()),
                ("nostr".to_string(), "{}".to_string()),
                ("lnurl".to_string(), "lnurl1x".to_string()),
            ]
        );
    }
}
