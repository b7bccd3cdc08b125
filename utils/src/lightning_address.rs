use url::Url;

const MAX_USERNAME_LEN: usize = 128;

trait AllowedUsernameCharacters {
    fn is_username_alphanumeric(&self) -> bool;
    fn is_username_punctuation(&self) -> bool;
    fn is_username_char(&self) -> bool {
        self.is_username_alphanumeric() || self.is_username_punctuation()
    }
}

impl AllowedUsernameCharacters for char {
    fn is_username_alphanumeric(&self) -> bool {
        let c = *self;
        c.is_ascii_lowercase() || c.is_ascii_digit()
    }

    fn is_username_punctuation(&self) -> bool {
        let c = *self;
        c == '-' || c == '.' || c == '_' || c == '+'
    }
}

pub fn check_username_valid(username: &str) -> bool {
    !username.is_empty() && username.len() <= MAX_USERNAME_LEN && username.chars().all(|c| c.is_username_char())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LightningAddressError {
    MissingSeparator,
    InvalidUsername,
    InvalidDomain,
}

/// A LUD-16 `user@domain` identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightningAddress {
    username: String,
    domain: String,
}

impl LightningAddress {
    pub fn parse(address: &str) -> Result<Self, LightningAddressError> {
        let address = address.trim().to_lowercase();
        let (username, domain) = address
            .split_once('@')
            .ok_or(LightningAddressError::MissingSeparator)?;

        if !check_username_valid(username) {
            return Err(LightningAddressError::InvalidUsername);
        }

        if domain.is_empty() || domain.contains(['/', '?', '#', '@']) || domain.chars().any(char::is_whitespace) {
            return Err(LightningAddressError::InvalidDomain);
        }

        let address = Self {
            username: username.to_string(),
            domain: domain.to_string(),
        };
        // the domain has to survive being used as an url authority
        address
            .well_known_url("https")
            .map_err(|_| LightningAddressError::InvalidDomain)?;
        Ok(address)
    }

    /// `{scheme}://{domain}/.well-known/lnurlp/{username}`
    pub fn well_known_url(&self, scheme: &str) -> Result<Url, url::ParseError> {
        let url = Url::parse(&format!("{}://{}/.well-known/lnurlp/{}", scheme, self.domain, self.username))?;
        if url.host_str().is_none() {
            return Err(url::ParseError::EmptyHost);
        }
        Ok(url)
    }
}
