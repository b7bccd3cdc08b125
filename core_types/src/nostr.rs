use serde::{Deserialize, Serialize};

/// Content of a kind 0 metadata event. Only the payment addresses are typed,
/// every other field is ignored whatever its type.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct NostrProfile {
    #[serde(default)]
    lud06: Option<String>,
    #[serde(default)]
    lud16: Option<String>,
}

impl NostrProfile {
    pub fn from_content(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn lud06(&self) -> Option<&str> {
        non_blank(&self.lud06)
    }

    pub fn lud16(&self) -> Option<&str> {
        non_blank(&self.lud16)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Latest metadata event found for a public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileEvent {
    pub pubkey: String,
    pub created_at: u64,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_lud16() {
        let profile = NostrProfile::from_content(r#"{"name":"alice","lud16":" alice@example.com "}"#).unwrap();
        assert_eq!(profile.lud16(), Some("alice@example.com"));
        assert_eq!(profile.lud06(), None);
    }

    #[test]
    fn test_profile_other_fields_of_any_type() {
        let profile = NostrProfile::from_content(r#"{"name":123,"nip05":false,"lud16":"alice@example.com"}"#).unwrap();
        assert_eq!(profile.lud16(), Some("alice@example.com"));

        let profile = NostrProfile::from_content(r#"{"display_name":null,"about":{"a":[1]},"lud06":"lnurl1dp"}"#).unwrap();
        assert_eq!(profile.lud06(), Some("lnurl1dp"));
    }

    #[test]
    fn test_profile_blank_addresses() {
        let profile = NostrProfile::from_content(r#"{"lud16":"","lud06":"   "}"#).unwrap();
        assert_eq!(profile.lud16(), None);
        assert_eq!(profile.lud06(), None);
    }

    #[test]
    fn test_profile_ignores_unknown_fields() {
        let profile = NostrProfile::from_content(r#"{"banner":"x","website":"y","lud16":"a@b.c"}"#).unwrap();
        assert_eq!(profile.lud16(), Some("a@b.c"));
    }

    #[test]
    fn test_profile_rejects_bad_content() {
        assert!(NostrProfile::from_content("not json").is_err());
        assert!(NostrProfile::from_content(r#"{"lud16": 42}"#).is_err());
        assert!(NostrProfile::from_content(r#""alice@example.com""#).is_err());
    }
}
