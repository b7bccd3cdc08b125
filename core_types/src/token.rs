use serde::{Deserialize, Serialize};

use crate::Msats;

/// Audience of tokens consumed by the zap callback endpoint.
pub const CALLBACK_AUDIENCE: &str = "c";

/// Lifetime of a callback token in seconds.
pub const CALLBACK_TOKEN_LIFETIME: i64 = 30 * 60;

/// State the offer endpoint hands over to the zap callback through the token.
/// Claim names are kept short as the token travels inside the callback url.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackClaims {
    pub aud: String,
    /// Callback of the recipient's own LNURL-pay endpoint.
    #[serde(rename = "c")]
    pub callback: String,
    /// Committed price, the zap callback only accepts exactly this amount.
    #[serde(rename = "ms", default, skip_serializing_if = "Option::is_none")]
    pub msats: Option<Msats>,
    /// Fiat price as the payer wrote it, echoed in the zap request content.
    #[serde(rename = "p", default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(rename = "u", default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(rename = "i", default, skip_serializing_if = "Option::is_none")]
    pub trigger_id: Option<String>,
    /// Bech32 encoded LNURL of the recipient's endpoint.
    #[serde(rename = "l")]
    pub lnurl: String,
    #[serde(rename = "r")]
    pub relays: Vec<String>,
    #[serde(rename = "pk")]
    pub pubkey: String,
}
