//! # Remote Sync Client
//!
//! One timed JSON-RPC request per fetch. No retry: the caller decides what
//! a failed attempt means (the session keeps its previous ledger state).
//!
//! ```text
//! ┌──────────────┐  eth_call   ┌──────────────┐  decode   ┌──────────────┐
//! │  identity    │ ──────────▶ │  RPC node    │ ────────▶ │  records     │
//! └──────────────┘  (timeout)  └──────────────┘  (batch)  └──────────────┘
//! ```

use alloy_primitives::Address;
use backpack_economy::EntitlementRecord;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::contracts::encode_items_query;
use crate::error::{SyncError, SyncResult};
use crate::rpc::{decode_items, RpcRequest};

/// Configuration for the sync client and worker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,
    /// Usage-rights contract to query.
    pub contract_address: Address,
    /// Upper bound on one request, connect included.
    pub timeout_ms: u64,
    /// Pause between background fetches.
    pub refresh_interval_ms: u64,
    /// Channel buffer size for sync events.
    pub channel_buffer: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://sepolia.era.zksync.dev".to_string(),
            contract_address: Address::ZERO,
            timeout_ms: 5_000,
            refresh_interval_ms: 30_000,
            channel_buffer: 16,
        }
    }
}

impl SyncConfig {
    /// Sets a custom endpoint URL.
    #[must_use]
    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = url.into();
        self
    }

    /// Sets the contract to query.
    #[must_use]
    pub const fn with_contract(mut self, address: Address) -> Self {
        self.contract_address = address;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Sets the background refresh interval.
    #[must_use]
    pub const fn with_refresh_interval_ms(mut self, interval_ms: u64) -> Self {
        self.refresh_interval_ms = interval_ms;
        self
    }

    /// Request timeout as a duration.
    #[inline]
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Refresh interval as a duration.
    #[inline]
    #[must_use]
    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    /// Parses a `SyncConfig` table from TOML text.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the text is malformed or fails validation.
    pub fn from_toml_str(text: &str) -> SyncResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| SyncError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` on an empty URL, a zero timeout or a zero buffer.
    pub fn validate(&self) -> SyncResult<()> {
        if self.rpc_url.is_empty() {
            return Err(SyncError::InvalidConfig("rpc_url is empty".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(SyncError::InvalidConfig(
                "timeout_ms must be positive".to_string(),
            ));
        }
        if self.channel_buffer == 0 {
            return Err(SyncError::InvalidConfig(
                "channel_buffer must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// JSON-RPC client for a holder's entitlements.
#[derive(Debug)]
pub struct RemoteSyncClient {
    http: reqwest::Client,
    config: SyncConfig,
    /// Next JSON-RPC request id.
    next_id: AtomicU64,
}

impl RemoteSyncClient {
    /// Creates a client whose requests are bounded by `config.timeout_ms`.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if the configuration fails validation
    /// - `Network` if the HTTP client can't be built
    pub fn new(config: SyncConfig) -> SyncResult<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.timeout())
            .build()
            .map_err(|e| SyncError::from_reqwest(&e))?;

        Ok(Self {
            http,
            config,
            next_id: AtomicU64::new(1),
        })
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Fetches every record currently held by `identity`.
    ///
    /// # Errors
    ///
    /// - `InvalidIdentity` if `identity` is not an address
    /// - `Network` on connect, timeout, status or transport failure
    /// - `Format` / `Remote` if the response can't be turned into records
    pub async fn fetch(&self, identity: &str) -> SyncResult<Vec<EntitlementRecord>> {
        let calldata = encode_items_query(identity)?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::items_query(self.config.contract_address, &calldata, id);

        let started = Instant::now();
        let response = self
            .http
            .post(&self.config.rpc_url)
            .json(&request)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| SyncError::from_reqwest(&e))?;

        let body = response
            .text()
            .await
            .map_err(|e| SyncError::from_reqwest(&e))?;

        let records = decode_items(&body, identity)?;

        tracing::debug!(
            identity,
            request_id = id,
            records = records.len(),
            latency_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
            "entitlements fetched"
        );
        Ok(records)
    }
}
