use serde_json::{Map, Value};
use url::Url;

use crate::{is_safe_integer, Msats};

pub const PAY_REQUEST_TAG: &str = "payRequest";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayRequestError {
    NotAnObject,
    UnexpectedTag,
    ZapsUnsupported,
    InvalidSendable,
    InvalidCallback,
    InvalidCommentAllowed,
}

/// LNURL-pay metadata of the recipient's wallet, checked for zap support.
///
/// The raw object is kept so that every field the bridge does not touch is
/// passed through to the paying wallet unchanged.
#[derive(Debug, Clone)]
pub struct PayRequest {
    callback: Url,
    min_sendable: Msats,
    max_sendable: Msats,
    nostr_pubkey: String,
    comment_allowed: Option<u64>,
    raw: Map<String, Value>,
}

impl PayRequest {
    pub fn from_json(value: Value) -> Result<Self, PayRequestError> {
        let raw = match value {
            Value::Object(map) => map,
            _ => return Err(PayRequestError::NotAnObject),
        };

        if raw.get("tag").and_then(Value::as_str) != Some(PAY_REQUEST_TAG) {
            return Err(PayRequestError::UnexpectedTag);
        }

        let allows_nostr = raw.get("allowsNostr").and_then(Value::as_bool).unwrap_or(false);
        let nostr_pubkey = match raw.get("nostrPubkey").and_then(Value::as_str) {
            Some(key) if allows_nostr && is_hex_pubkey(key) => key.to_lowercase(),
            _ => return Err(PayRequestError::ZapsUnsupported),
        };

        let min_sendable = safe_integer(raw.get("minSendable")).ok_or(PayRequestError::InvalidSendable)?;
        let max_sendable = safe_integer(raw.get("maxSendable")).ok_or(PayRequestError::InvalidSendable)?;
        if min_sendable > max_sendable {
            return Err(PayRequestError::InvalidSendable);
        }

        let callback = raw
            .get("callback")
            .and_then(Value::as_str)
            .and_then(|c| Url::parse(c).ok())
            .filter(|c| matches!(c.scheme(), "https" | "http"))
            .ok_or(PayRequestError::InvalidCallback)?;

        let comment_allowed = match raw.get("commentAllowed") {
            None | Some(Value::Null) => None,
            Some(value) => Some(value.as_u64().ok_or(PayRequestError::InvalidCommentAllowed)?),
        };

        Ok(Self {
            callback,
            min_sendable,
            max_sendable,
            nostr_pubkey,
            comment_allowed,
            raw,
        })
    }

    pub fn callback(&self) -> &Url {
        &self.callback
    }

    pub fn min_sendable(&self) -> Msats {
        self.min_sendable
    }

    pub fn max_sendable(&self) -> Msats {
        self.max_sendable
    }

    pub fn nostr_pubkey(&self) -> &str {
        &self.nostr_pubkey
    }

    pub fn comment_allowed(&self) -> Option<u64> {
        self.comment_allowed
    }

    pub fn accepts(&self, msats: Msats) -> bool {
        self.min_sendable <= msats && msats <= self.max_sendable
    }

    /// Whether a zap message of `len` characters fits the advertised comment allowance.
    /// Wallets that do not advertise `commentAllowed` accept any zap content.
    pub fn accepts_comment(&self, len: usize) -> bool {
        match self.comment_allowed {
            Some(allowed) => len == 0 || allowed >= len as u64,
            None => true,
        }
    }

    /// The offer handed to the paying wallet: same metadata, bridged callback and,
    /// when a price is committed, both bounds pinned to it.
    pub fn into_offer(self, callback: &str, price: Option<Msats>) -> Value {
        let mut offer = self.raw;
        if let Some(msats) = price {
            offer.insert("minSendable".to_string(), Value::from(msats));
            offer.insert("maxSendable".to_string(), Value::from(msats));
        }
        offer.insert("callback".to_string(), Value::from(callback));
        Value::Object(offer)
    }
}

fn safe_integer(value: Option<&Value>) -> Option<u64> {
    value.and_then(Value::as_u64).filter(|v| is_safe_integer(*v))
}

pub fn is_hex_pubkey(key: &str) -> bool {
    key.len() == 64 && key.chars().all(|c| c.is_ascii_hexdigit())
}
