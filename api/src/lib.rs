use actix_cors::Cors;
use actix_web::web::Data;
use actix_web::{web, App, HttpServer};
use nostr_sdk::prelude::Keys;
use serde::{Deserialize, Serialize};
use slog as log;
use slog::Logger;
use std::io::{Error, ErrorKind};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use utils::xlogging::LoggingSettings;

pub mod jwt;
pub mod price;
pub mod relay_pool;
pub mod resolver;
pub mod routes;
pub mod zap;

use price::{CoindeskPriceSource, PriceSource};
use relay_pool::{NostrRelayPool, ProfileSource};

#[derive(Serialize, Deserialize, Clone)]
pub struct ApiSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    pub jwt_secret: String,
    /// Hex or `nsec` secret key zap requests are signed with.
    #[serde(default)]
    pub nostr_private_key: Option<String>,
    /// Base of the callback urls handed to wallets. Derived from the request when unset.
    #[serde(default)]
    pub public_base_url: Option<String>,
    #[serde(default = "default_relay_timeout_ms")]
    pub relay_timeout_ms: u64,
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,
    #[serde(default = "default_price_api_url")]
    pub price_api_url: String,
    #[serde(default = "default_price_market")]
    pub price_market: String,
    #[serde(default = "default_lightning_address_scheme")]
    pub lightning_address_scheme: String,
    #[serde(default)]
    pub logging_settings: LoggingSettings,
}

fn default_endpoint() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_relay_timeout_ms() -> u64 {
    5000
}

fn default_http_timeout_ms() -> u64 {
    10000
}

fn default_price_api_url() -> String {
    "https://data-api.coindesk.com/spot/v1/latest/tick".to_string()
}

fn default_price_market() -> String {
    "coinbase".to_string()
}

fn default_lightning_address_scheme() -> String {
    "https".to_string()
}

/// Immutable state shared by all workers.
pub struct Bridge {
    pub jwt_secret: Vec<u8>,
    pub nostr_keys: Option<Keys>,
    pub public_base_url: Option<String>,
    pub relay_timeout: Duration,
    pub http_timeout: Duration,
    pub lightning_address_scheme: String,
    pub profiles: Arc<dyn ProfileSource>,
    pub prices: Arc<dyn PriceSource>,
    pub http: reqwest::Client,
    pub logger: Logger,
}

impl Bridge {
    pub fn new(
        settings: &ApiSettings,
        profiles: Arc<dyn ProfileSource>,
        prices: Arc<dyn PriceSource>,
        http: reqwest::Client,
        logger: Logger,
    ) -> std::io::Result<Self> {
        if settings.jwt_secret.is_empty() {
            return Err(Error::new(ErrorKind::InvalidInput, "jwt_secret must not be empty"));
        }

        let nostr_keys = match settings.nostr_private_key.as_deref().map(str::trim) {
            Some(secret) if !secret.is_empty() => Some(
                utils::nostr::keys_from_secret(secret)
                    .map_err(|_| Error::new(ErrorKind::InvalidInput, "nostr_private_key is not a valid secret key"))?,
            ),
            _ => None,
        };

        let public_base_url = match settings.public_base_url.as_deref().map(str::trim) {
            Some(base) if !base.is_empty() => {
                let url = Url::parse(base)
                    .map_err(|e| Error::new(ErrorKind::InvalidInput, format!("public_base_url: {}", e)))?;
                if !matches!(url.scheme(), "https" | "http") {
                    return Err(Error::new(ErrorKind::InvalidInput, "public_base_url must be an http(s) url"));
                }
                Some(base.trim_end_matches('/').to_string())
            }
            _ => None,
        };

        if !matches!(settings.lightning_address_scheme.as_str(), "https" | "http") {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "lightning_address_scheme must be https or http",
            ));
        }

        Ok(Self {
            jwt_secret: settings.jwt_secret.as_bytes().to_vec(),
            nostr_keys,
            public_base_url,
            relay_timeout: Duration::from_millis(settings.relay_timeout_ms),
            http_timeout: Duration::from_millis(settings.http_timeout_ms),
            lightning_address_scheme: settings.lightning_address_scheme.clone(),
            profiles,
            prices,
            http,
            logger,
        })
    }
}

pub type WebBridge = web::Data<Bridge>;

pub fn http_client() -> std::io::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("zap-bridge/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::new(ErrorKind::Other, e))
}

pub async fn start(settings: ApiSettings, logger: Logger) -> std::io::Result<()> {
    let http = http_client()?;
    let profiles = Arc::new(NostrRelayPool::new(logger.clone()));
    let prices = Arc::new(CoindeskPriceSource::new(
        http.clone(),
        &settings.price_api_url,
        &settings.price_market,
    ));
    let bridge = Data::new(Bridge::new(&settings, profiles, prices, http, logger.clone())?);

    match &bridge.nostr_keys {
        Some(keys) => log::info!(logger, "Signing zap requests as {}", keys.public_key().to_hex()),
        None => log::crit!(logger, "nostr_private_key is not set, every zap callback will fail"),
    }
    log::info!(logger, "Listening on {}", settings.endpoint);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(bridge.clone())
            .configure(routes::configure)
    })
    .bind(&settings.endpoint)?
    .run()
    .await
}
