use bech32::{Bech32, Hrp};
use url::Url;

static HRP_LNURL: Hrp = Hrp::parse_unchecked("lnurl");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LnurlError {
    Encode(String),
    Decode(String),
    InvalidUrl,
}

/// Bech32 encodes `url` with the `lnurl` prefix (LUD-01).
pub fn encode(url: &Url) -> Result<String, LnurlError> {
    bech32::encode::<Bech32>(HRP_LNURL, url.as_str().as_bytes()).map_err(|e| LnurlError::Encode(e.to_string()))
}

/// Decodes a bech32 `lnurl` string (either case) back into the url it carries.
pub fn decode(encoded: &str) -> Result<Url, LnurlError> {
    let encoded = encoded.trim();
    let encoded = encoded
        .strip_prefix("lightning:")
        .or_else(|| encoded.strip_prefix("LIGHTNING:"))
        .unwrap_or(encoded);
    let (hrp, data) = bech32::decode(encoded).map_err(|e| LnurlError::Decode(e.to_string()))?;
    if hrp.to_lowercase() != HRP_LNURL.to_lowercase() {
        return Err(LnurlError::Decode(format!("unexpected prefix {hrp}")));
    }
    let url = std::str::from_utf8(&data).map_err(|_| LnurlError::InvalidUrl)?;
    Url::parse(url).map_err(|_| LnurlError::InvalidUrl)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let url = Url::parse("https://example.com/.well-known/lnurlp/alice").unwrap();
        let encoded = encode(&url).unwrap();
        assert!(encoded.starts_with("lnurl1"));
        assert_eq!(decode(&encoded).unwrap(), url);
        assert_eq!(decode(&encoded.to_uppercase()).unwrap(), url);
    }

    #[test]
    fn test_decode_keeps_query() {
        let url = Url::parse("https://service.com/api?q=3fc3645b439ce8e7").unwrap();
        let encoded = encode(&url).unwrap().to_uppercase();
        assert_eq!(decode(&format!("lightning:{encoded}")).unwrap(), url);
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded.host_str(), Some("service.com"));
        assert_eq!(decoded.path(), "/api");
        assert_eq!(decoded.query(), Some("q=3fc3645b439ce8e7"));
    }

    #[test]
    fn test_decode_rejects_other_prefix() {
        let url = Url::parse("https://example.com").unwrap();
        let other = bech32::encode::<Bech32>(Hrp::parse_unchecked("lnbc"), url.as_str().as_bytes()).unwrap();
        assert!(matches!(decode(&other), Err(LnurlError::Decode(_))));
        assert!(matches!(decode("lnurl1qqqq"), Err(LnurlError::Decode(_))));
    }
}
