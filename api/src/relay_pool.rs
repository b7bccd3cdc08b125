use async_trait::async_trait;
use nostr_sdk::prelude::{Filter, Kind, PublicKey};
use nostr_sdk::Client;
use slog as log;
use slog::Logger;
use std::time::Duration;

use core_types::nostr::ProfileEvent;

/// Time granted on top of the fetch timeout for connecting and tearing the client down.
pub const CONNECT_GRACE_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    InvalidPubkey,
    /// None of the given relays could be added to the pool.
    NoUsableRelay,
    Timeout,
    Client(String),
}

/// Looks up the most recent kind 0 event of a public key.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn latest_metadata(
        &self,
        pubkey: &str,
        relays: &[String],
        timeout: Duration,
    ) -> Result<Option<ProfileEvent>, SourceError>;
}

/// Queries the relays named in the offer through a short lived nostr client.
pub struct NostrRelayPool {
    logger: Logger,
}

impl NostrRelayPool {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    async fn fetch(&self, client: &Client, author: PublicKey, timeout: Duration) -> Result<Option<ProfileEvent>, SourceError> {
        client.connect().await;

        let filter = Filter::new().author(author).kind(Kind::Metadata).limit(1);
        let events = client
            .fetch_events(filter, timeout)
            .await
            .map_err(|e| SourceError::Client(e.to_string()))?;

        let latest = events
            .into_iter()
            .filter(|event| event.pubkey == author && event.kind == Kind::Metadata)
            .max_by_key(|event| event.created_at)
            .map(|event| ProfileEvent {
                pubkey: event.pubkey.to_hex(),
                created_at: event.created_at.as_u64(),
                content: event.content,
            });
        Ok(latest)
    }
}

#[async_trait]
impl ProfileSource for NostrRelayPool {
    async fn latest_metadata(
        &self,
        pubkey: &str,
        relays: &[String],
        timeout: Duration,
    ) -> Result<Option<ProfileEvent>, SourceError> {
        let author = PublicKey::from_hex(pubkey).map_err(|_| SourceError::InvalidPubkey)?;

        let client = Client::default();
        let mut added = 0;
        for relay in relays {
            match client.add_relay(relay.as_str()).await {
                Ok(_) => added += 1,
                Err(err) => log::warn!(self.logger, "Failed to add relay {}: {}", relay, err),
            }
        }
        if added == 0 {
            return Err(SourceError::NoUsableRelay);
        }

        let deadline = timeout + Duration::from_millis(CONNECT_GRACE_MS);
        let result = match tokio::time::timeout(deadline, self.fetch(&client, author, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout),
        };

        client.disconnect().await;
        result
    }
}
