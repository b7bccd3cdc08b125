use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::prelude::*;
use serde_json::Value;
use slog as log;
use slog::Logger;
use url::{form_urlencoded, Url};

use core_types::lnurl::{PayRequest, PayRequestError};
use core_types::nostr::NostrProfile;
use core_types::token::{CallbackClaims, CALLBACK_AUDIENCE, CALLBACK_TOKEN_LIFETIME};
use core_types::{fiat_to_msats, sats_to_msats, ConversionError, Msats, PriceUnit};
use utils::lightning_address::LightningAddress;
use utils::nostr::ZapContent;
use xerror::api::*;

use crate::jwt;
use crate::price::PriceError;
use crate::Bridge;

const MAX_PRICE_LEN: usize = 20;

lazy_static! {
    static ref PRICE_PATTERN: Regex = Regex::new(r"^[0-9]+(\.[0-9]{1,2})?$").unwrap();
    static ref TRIGGER_ID_PATTERN: Regex = Regex::new(r"^[0-9]{0,25}$").unwrap();
}

/// Price the payer asked for, as written and as a number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferPrice {
    pub amount: String,
    pub value: Decimal,
    /// Absent unit means sats.
    pub unit: Option<PriceUnit>,
}

impl OfferPrice {
    pub fn unit_or_sats(&self) -> PriceUnit {
        self.unit.unwrap_or(PriceUnit::Sats)
    }
}

/// Validated query of an offer request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferParams {
    /// Recipient public key, lowercase hex.
    pub pubkey: String,
    pub relays: Vec<String>,
    pub trigger_id: Option<String>,
    pub price: Option<OfferPrice>,
}

impl OfferParams {
    pub fn from_query(query: &str) -> Result<Self, RequestError> {
        let mut pk = None;
        let mut hosts = Vec::new();
        let mut urls = Vec::new();
        let mut trigger_id = None;
        let mut price = None;
        let mut unit = None;

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let slot = match key.as_ref() {
                "w" => {
                    hosts.push(format!("wss://{}", value));
                    continue;
                }
                "r" => {
                    urls.push(value.into_owned());
                    continue;
                }
                "pk" => &mut pk,
                "i" => &mut trigger_id,
                "p" => &mut price,
                "u" => &mut unit,
                _ => continue,
            };
            // first occurrence wins
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }

        let pubkey = decode_pubkey(pk.as_deref().unwrap_or_default())?;

        let mut relays = hosts;
        relays.extend(urls);
        if relays.is_empty() {
            return Err(RequestError::NoRelays);
        }
        if !relays.iter().all(|relay| is_relay_url(relay)) {
            return Err(RequestError::InvalidRelay);
        }

        let trigger_id = trigger_id.filter(|i| !i.is_empty());
        if let Some(i) = &trigger_id {
            if !TRIGGER_ID_PATTERN.is_match(i) {
                return Err(RequestError::InvalidTriggerId);
            }
        }

        let price = price.filter(|p| !p.is_empty()).map(parse_price).transpose()?;

        let unit = match unit.filter(|u| !u.is_empty()) {
            Some(u) => Some(PriceUnit::from_str(&u).map_err(|_| RequestError::InvalidPriceUnit)?),
            None => None,
        };

        Ok(Self {
            pubkey,
            relays,
            trigger_id,
            price: price.map(|(amount, value)| OfferPrice { amount, value, unit }),
        })
    }

    /// Fiat price and currency as echoed to the recipient.
    pub fn quoted_price(&self) -> (Option<String>, Option<String>) {
        match &self.price {
            Some(OfferPrice {
                amount,
                unit: Some(PriceUnit::Fiat(currency)),
                ..
            }) => (Some(amount.clone()), Some(currency.to_string())),
            _ => (None, None),
        }
    }

    /// What the zap request will say about this offer.
    pub fn zap_content(&self) -> ZapContent {
        let (price, unit) = self.quoted_price();
        ZapContent::new(self.trigger_id.clone(), price, unit)
    }
}

/// Accepts unpadded base64url, tolerating the standard alphabet and trailing padding.
fn decode_pubkey(encoded: &str) -> Result<String, RequestError> {
    let encoded = encoded.trim().trim_end_matches('=').replace('+', "-").replace('/', "_");
    if encoded.is_empty() {
        return Err(RequestError::InvalidPubkey);
    }
    let bytes = URL_SAFE_NO_PAD.decode(encoded).map_err(|_| RequestError::InvalidPubkey)?;
    if bytes.len() != 32 {
        return Err(RequestError::InvalidPubkey);
    }
    Ok(hex::encode(bytes))
}

fn is_relay_url(relay: &str) -> bool {
    match Url::parse(relay) {
        Ok(url) => matches!(url.scheme(), "ws" | "wss") && url.host_str().map_or(false, |h| !h.is_empty()),
        Err(_) => false,
    }
}

fn parse_price(price: String) -> Result<(String, Decimal), RequestError> {
    if price.len() > MAX_PRICE_LEN || !PRICE_PATTERN.is_match(&price) {
        return Err(RequestError::InvalidPrice);
    }
    let value = Decimal::from_str(&price).map_err(|_| RequestError::InvalidPrice)?;
    Ok((price, value))
}

/// Resolves the recipient's wallet and returns its LNURL-pay metadata with the callback
/// pointing back at the bridge.
pub async fn resolve_offer(
    bridge: &Bridge,
    params: &OfferParams,
    base_url: &str,
    logger: &Logger,
) -> Result<Value, ApiError> {
    log::info!(
        logger,
        "Searching for nostr profile {} in relays: {:?}",
        params.pubkey,
        params.relays
    );
    let event = match bridge
        .profiles
        .latest_metadata(&params.pubkey, &params.relays, bridge.relay_timeout)
        .await
    {
        Ok(Some(event)) => event,
        Ok(None) => return Err(ApiError::Upstream(UpstreamError::ProfileNotFound)),
        Err(err) => {
            log::warn!(logger, "Relay query failed: {:?}", err);
            return Err(ApiError::Upstream(UpstreamError::RelayUnavailable));
        }
    };
    log::info!(logger, "Found profile of {} created at {}", event.pubkey, event.created_at);

    let profile = NostrProfile::from_content(&event.content).map_err(|err| {
        log::warn!(logger, "Failed to deserialize {} into nostr profile: {}", event.content, err);
        ApiError::Upstream(UpstreamError::ProfileMalformed)
    })?;
    let lnurlp_url = lnurlp_url(&profile, &bridge.lightning_address_scheme)?;
    log::info!(logger, "lnurlp url: {}", lnurlp_url);

    let pay_request = fetch_pay_request(bridge, &lnurlp_url, logger).await?;
    let content = params.zap_content();
    if !pay_request.accepts_comment(content.comment_len()) {
        return Err(ApiError::Upstream(UpstreamError::ZapCommentUnsupported));
    }

    let msats = match &params.price {
        Some(price) => Some(commit_price(bridge, price, logger).await?),
        None => None,
    };
    if let Some(msats) = msats {
        if !pay_request.accepts(msats) {
            log::info!(
                logger,
                "Price of {} msats outside of [{}, {}]",
                msats,
                pay_request.min_sendable(),
                pay_request.max_sendable()
            );
            return Err(ApiError::Integrity(IntegrityError::PriceOutOfRange));
        }
    }

    let lnurl = utils::lnurl::encode(&lnurlp_url).map_err(|err| {
        log::error!(logger, "Failed to encode {} as lnurl: {:?}", lnurlp_url, err);
        ApiError::Internal
    })?;
    let (price, unit) = params.quoted_price();
    let claims = CallbackClaims {
        aud: CALLBACK_AUDIENCE.to_string(),
        callback: pay_request.callback().to_string(),
        msats,
        price,
        unit,
        trigger_id: params.trigger_id.clone(),
        lnurl,
        relays: params.relays.clone(),
        pubkey: params.pubkey.clone(),
    };
    let token = jwt::sign_claims(&claims, &bridge.jwt_secret, CALLBACK_TOKEN_LIFETIME)?;
    let callback = format!("{}/api/c/{}", base_url.trim_end_matches('/'), token);

    Ok(pay_request.into_offer(&callback, msats))
}

/// Well-known LNURL-pay endpoint of the profile's wallet, from `lud16` or else `lud06`.
pub fn lnurlp_url(profile: &NostrProfile, scheme: &str) -> Result<Url, ApiError> {
    if let Some(lud16) = profile.lud16() {
        return LightningAddress::parse(lud16)
            .ok()
            .and_then(|address| address.well_known_url(scheme).ok())
            .ok_or(ApiError::Upstream(UpstreamError::LightningAddressInvalid));
    }
    if let Some(lud06) = profile.lud06() {
        return utils::lnurl::decode(lud06)
            .ok()
            .filter(|url| matches!(url.scheme(), "https" | "http"))
            .ok_or(ApiError::Upstream(UpstreamError::LightningAddressInvalid));
    }
    Err(ApiError::Upstream(UpstreamError::LightningAddressMissing))
}

async fn fetch_pay_request(bridge: &Bridge, url: &Url, logger: &Logger) -> Result<PayRequest, ApiError> {
    let response = match bridge.http.get(url.clone()).timeout(bridge.http_timeout).send().await {
        Ok(r) => r,
        Err(err) => {
            log::warn!(logger, "Failed to call {}: {}", url, err);
            return Err(ApiError::Upstream(UpstreamError::LnurlUnavailable));
        }
    };

    if !response.status().is_success() {
        log::warn!(logger, "{} responded with {}", url, response.status());
        return Err(ApiError::Upstream(UpstreamError::LnurlBadStatus));
    }

    let body = match response.text().await {
        Ok(b) => b,
        Err(_) => return Err(ApiError::Upstream(UpstreamError::LnurlUnavailable)),
    };
    log::debug!(logger, "lnurlp response: {}", body);

    let metadata: Value =
        serde_json::from_str(&body).map_err(|_| ApiError::Upstream(UpstreamError::LnurlMalformed))?;

    PayRequest::from_json(metadata).map_err(|err| {
        log::info!(logger, "Rejected lnurlp metadata of {}: {:?}", url, err);
        ApiError::Upstream(match err {
            PayRequestError::NotAnObject => UpstreamError::LnurlMalformed,
            PayRequestError::UnexpectedTag => UpstreamError::LnurlUnexpectedTag,
            PayRequestError::ZapsUnsupported => UpstreamError::ZapsUnsupported,
            PayRequestError::InvalidSendable => UpstreamError::InvalidSendable,
            PayRequestError::InvalidCallback => UpstreamError::LnurlMalformed,
            PayRequestError::InvalidCommentAllowed => UpstreamError::LnurlMalformed,
        })
    })
}

/// Converts the requested price into the millisat amount the offer commits to.
async fn commit_price(bridge: &Bridge, price: &OfferPrice, logger: &Logger) -> Result<Msats, ApiError> {
    let converted = match price.unit_or_sats() {
        PriceUnit::Sats => sats_to_msats(price.value),
        PriceUnit::Fiat(currency) => {
            let quote = bridge
                .prices
                .spot_price(currency.instrument(), bridge.http_timeout)
                .await
                .map_err(|err| {
                    log::warn!(logger, "Failed to fetch {} price: {:?}", currency.instrument(), err);
                    ApiError::Upstream(match err {
                        PriceError::Unavailable => UpstreamError::PriceUnavailable,
                        PriceError::Malformed => UpstreamError::PriceMalformed,
                    })
                })?;
            let quote = Decimal::from_f64(quote).ok_or(ApiError::Upstream(UpstreamError::PriceMalformed))?;
            fiat_to_msats(price.value, quote)
        }
    };

    converted.map_err(|err| match err {
        ConversionError::NonPositiveQuote => ApiError::Upstream(UpstreamError::PriceMalformed),
        ConversionError::Overflow => ApiError::Integrity(IntegrityError::PriceOutOfRange),
    })
}
