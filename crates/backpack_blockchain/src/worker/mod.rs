//! # Sync Worker
//!
//! Background refresh of one holder's entitlements.
//!
//! The worker never touches the ledger. It publishes each fetch result as a
//! [`SyncEvent`] and the game loop applies it, so the ledger keeps a single
//! writer.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  RPC node    │ ──▶ │  SyncWorker  │ ──▶ │   Channel    │ ──▶ Game
//! │              │     │ (tokio task) │     │  (Bounded)   │
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```

use backpack_economy::EntitlementRecord;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::client::{RemoteSyncClient, SyncConfig};
use crate::error::{SyncError, SyncResult};

/// Result of one background fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncEvent {
    /// Authoritative record set for `holder`.
    Snapshot {
        /// Identity the records were fetched for.
        holder: String,
        /// Every record the endpoint reported.
        records: Vec<EntitlementRecord>,
        /// Round trip of the request.
        latency: Duration,
    },
    /// The fetch failed; previous state stays in place.
    Failed {
        /// Identity the fetch was for.
        holder: String,
        /// What went wrong.
        error: SyncError,
    },
}

impl SyncEvent {
    /// Identity this event concerns.
    #[must_use]
    pub fn holder(&self) -> &str {
        match self {
            Self::Snapshot { holder, .. } | Self::Failed { holder, .. } => holder,
        }
    }
}

/// Counters for the sync worker.
#[derive(Debug, Default)]
pub struct SyncStats {
    /// Fetches started.
    pub attempted: AtomicU64,
    /// Fetches that produced a snapshot.
    pub succeeded: AtomicU64,
    /// Fetches that failed.
    pub failed: AtomicU64,
    /// Events dropped because the channel was full.
    pub dropped: AtomicU64,
    /// Latency of the last successful fetch in microseconds.
    pub last_latency_us: AtomicU64,
}

/// Periodic entitlement refresher.
pub struct SyncWorker {
    client: Arc<RemoteSyncClient>,
    sender: Sender<SyncEvent>,
    receiver: Receiver<SyncEvent>,
    /// Generation of the loop allowed to run; zero when stopped.
    active: Arc<AtomicU64>,
    /// Generation handed to the next spawn.
    next_generation: AtomicU64,
    stats: Arc<SyncStats>,
}

impl SyncWorker {
    /// Creates a worker with its own client.
    ///
    /// # Errors
    ///
    /// Whatever [`RemoteSyncClient::new`] rejects.
    pub fn new(config: SyncConfig) -> SyncResult<Self> {
        Ok(Self::from_client(RemoteSyncClient::new(config)?))
    }

    /// Wraps an existing client.
    #[must_use]
    pub fn from_client(client: RemoteSyncClient) -> Self {
        let (sender, receiver) = bounded(client.config().channel_buffer);

        Self {
            client: Arc::new(client),
            sender,
            receiver,
            active: Arc::new(AtomicU64::new(0)),
            next_generation: AtomicU64::new(1),
            stats: Arc::new(SyncStats::default()),
        }
    }

    /// Returns a clone of the event receiver.
    ///
    /// The game loop should drain this receiver between frames.
    #[must_use]
    pub fn receiver(&self) -> Receiver<SyncEvent> {
        self.receiver.clone()
    }

    /// Returns a reference to the statistics.
    #[must_use]
    pub fn stats(&self) -> Arc<SyncStats> {
        Arc::clone(&self.stats)
    }

    /// Checks if the background loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.active.load(Ordering::SeqCst) != 0
    }

    /// Stops the background loop after its current iteration.
    pub fn stop(&self) {
        self.active.store(0, Ordering::SeqCst);
    }

    /// Runs one fetch and returns its event without publishing it.
    pub async fn sync_once(&self, identity: &str) -> SyncEvent {
        fetch_event(&self.client, &self.stats, identity).await
    }

    /// Spawns the refresh loop on `handle`.
    ///
    /// The first fetch runs immediately, then once per refresh interval until
    /// [`stop`](Self::stop) is called, every receiver is dropped, or `spawn`
    /// is called again. Only the most recently spawned loop publishes.
    pub fn spawn(&self, handle: &Handle, identity: impl Into<String>) -> JoinHandle<()> {
        let identity = identity.into();
        let client = Arc::clone(&self.client);
        let sender = self.sender.clone();
        let active = Arc::clone(&self.active);
        let stats = Arc::clone(&self.stats);
        let interval = client.config().refresh_interval();

        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        active.store(generation, Ordering::SeqCst);

        handle.spawn(async move {
            tracing::info!(
                identity = %identity,
                generation,
                interval_ms = client.config().refresh_interval_ms,
                "sync worker started"
            );

            while active.load(Ordering::SeqCst) == generation {
                let event = fetch_event(&client, &stats, &identity).await;

                match sender.try_send(event) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        stats.dropped.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(identity = %identity, "sync channel full, event dropped");
                    }
                    Err(TrySendError::Disconnected(_)) => break,
                }

                tokio::time::sleep(interval).await;
            }

            // A newer spawn owns the flag once the generation moved on
            let _ = active.compare_exchange(generation, 0, Ordering::SeqCst, Ordering::SeqCst);
            tracing::info!(identity = %identity, generation, "sync worker stopped");
        })
    }
}

async fn fetch_event(client: &RemoteSyncClient, stats: &SyncStats, identity: &str) -> SyncEvent {
    stats.attempted.fetch_add(1, Ordering::Relaxed);
    let started = Instant::now();

    match client.fetch(identity).await {
        Ok(records) => {
            let latency = started.elapsed();
            stats.succeeded.fetch_add(1, Ordering::Relaxed);
            stats.last_latency_us.store(
                u64::try_from(latency.as_micros()).unwrap_or(u64::MAX),
                Ordering::Relaxed,
            );
            SyncEvent::Snapshot {
                holder: identity.to_string(),
                records,
                latency,
            }
        }
        Err(error) => {
            stats.failed.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(identity, %error, "entitlement sync failed");
            SyncEvent::Failed {
                holder: identity.to_string(),
                error,
            }
        }
    }
}
