use nostr_sdk::prelude::{Event, EventBuilder, Keys, Kind, PublicKey, Tag};
use serde::Serialize;

pub const ZAP_REQUEST_KIND: u16 = 9734;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZapError {
    InvalidSecretKey,
    InvalidRecipient,
    InvalidTag,
    CouldNotSignZapRequest,
}

/// Parses the bridge's signing key, given either as hex or as a NIP-19 `nsec`.
pub fn keys_from_secret(secret: &str) -> Result<Keys, ZapError> {
    Keys::parse(secret.trim()).map_err(|_| ZapError::InvalidSecretKey)
}

/// Content of the zap request. It echoes what the payer was originally asked for,
/// never the converted millisat amount.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ZapContent {
    #[serde(rename = "triggerId", skip_serializing_if = "Option::is_none")]
    trigger_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit: Option<String>,
}

impl ZapContent {
    /// Price and unit are only carried together.
    pub fn new(trigger_id: Option<String>, price: Option<String>, unit: Option<String>) -> Self {
        let (price, unit) = match (price, unit) {
            (Some(price), Some(unit)) => (Some(price), Some(unit)),
            _ => (None, None),
        };
        Self {
            trigger_id,
            price,
            unit,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.trigger_id.is_none() && self.price.is_none()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }

    /// Length a wallet's comment allowance has to cover, zero when there is nothing to say.
    pub fn comment_len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.to_json().chars().count()
        }
    }
}

/// Fields of a NIP-57 zap request for a profile.
#[derive(Debug, Clone)]
pub struct ZapRequest<'a> {
    pub recipient: &'a str,
    pub relays: &'a [String],
    pub amount_msats: u64,
    pub lnurl: &'a str,
    pub content: &'a ZapContent,
}

pub fn sign_zap_request(keys: &Keys, request: &ZapRequest) -> Result<Event, ZapError> {
    let recipient = PublicKey::from_hex(request.recipient).map_err(|_| ZapError::InvalidRecipient)?;

    let mut relays_tag = Vec::with_capacity(request.relays.len() + 1);
    relays_tag.push(String::from("relays"));
    relays_tag.extend(request.relays.iter().cloned());

    let tags = vec![
        Tag::public_key(recipient),
        Tag::parse(&relays_tag).map_err(|_| ZapError::InvalidTag)?,
        Tag::parse(&[String::from("amount"), request.amount_msats.to_string()]).map_err(|_| ZapError::InvalidTag)?,
        Tag::parse(&[String::from("lnurl"), request.lnurl.to_string()]).map_err(|_| ZapError::InvalidTag)?,
    ];

    EventBuilder::new(Kind::ZapRequest, request.content.to_json())
        .tags(tags)
        .sign_with_keys(keys)
        .map_err(|_| ZapError::CouldNotSignZapRequest)
}
