use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::errors::StoreError;
use crate::object_store::{CreateOutcome, ObjectStore};

// @module: Work-unit claiming over the shared catalog

/// Extensions that identify a claimable media object
const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".avi", ".mov", ".mkv", ".webm"];

/// Lifecycle states of a claimed work unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    /// Known but not yet picked up
    Pending,
    /// Exclusively claimed by a worker
    Processing,
    /// Finished successfully
    Done,
    /// Finished with an error
    Failed,
}

/// One unit's entry in the claim catalog.
///
/// The catalog document maps object paths to these records; a record is
/// created on first claim and overwritten in place with the latest status,
/// never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimRecord {
    /// Current lifecycle state
    pub status: ClaimStatus,

    /// Arbitrary structured metadata accompanying the status
    #[serde(flatten)]
    pub detail: Map<String, Value>,
}

impl ClaimRecord {
    /// Record marking a unit as just claimed
    pub fn processing() -> Self {
        let mut detail = Map::new();
        detail.insert(
            "claimed_at".to_string(),
            Value::String(Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()),
        );
        ClaimRecord {
            status: ClaimStatus::Processing,
            detail,
        }
    }

    /// Terminal record for a finished unit
    pub fn finished(success: bool, detail: Map<String, Value>) -> Self {
        ClaimRecord {
            status: if success { ClaimStatus::Done } else { ClaimStatus::Failed },
            detail,
        }
    }
}

/// Outcome of one claim attempt on one candidate
enum ClaimAttempt {
    /// This worker now owns the unit
    Claimed,
    /// Another worker holds the catalog lock
    Contended,
    /// The unit was already claimed by the time we looked under the lock
    AlreadyClaimed,
}

/// Hands out exactly one unclaimed work unit per call across workers that
/// share nothing but the object store.
///
/// The claim transition is a critical section guarded by an exclusive lock
/// object; the lock carries a lease expiry so a crashed holder cannot wedge
/// the catalog forever.
#[derive(Debug)]
pub struct JobCoordinator {
    /// Shared object store
    store: Arc<dyn ObjectStore>,
    /// Path of the claim catalog document
    catalog_path: String,
    /// Path of the lock object guarding catalog updates
    lock_path: String,
    /// Lock lease duration
    lease: Duration,
}

impl JobCoordinator {
    /// Create a coordinator over the catalog under the given metadata prefix
    pub fn new(store: Arc<dyn ObjectStore>, metadata_prefix: &str, lease_secs: i64) -> Self {
        let prefix = metadata_prefix.trim_end_matches('/');
        JobCoordinator {
            store,
            catalog_path: format!("{}/processed.json", prefix),
            lock_path: format!("{}/update.lock", prefix),
            lease: Duration::seconds(lease_secs.max(1)),
        }
    }

    /// Path of the claim catalog document
    pub fn catalog_path(&self) -> &str {
        &self.catalog_path
    }

    /// Enumerate claimable media objects under the input prefix
    pub async fn list_candidates(&self, input_prefix: &str) -> Result<Vec<String>, StoreError> {
        let objects = self.store.list(input_prefix).await?;
        Ok(objects
            .into_iter()
            .filter(|path| {
                let lower = path.to_lowercase();
                VIDEO_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
            })
            .collect())
    }

    /// Claim the next unprocessed work unit, or `None` when everything under
    /// the prefix is already claimed.
    ///
    /// The claimed-set read happens outside the critical section and may be
    /// stale; the claim itself re-validates under the lock. Candidates whose
    /// claim attempt hits contention or an I/O error are skipped this round.
    pub async fn claim_next(&self, input_prefix: &str) -> Result<Option<String>, StoreError> {
        let candidates = self.list_candidates(input_prefix).await?;
        let claimed = self.store.read_json(&self.catalog_path).await?;

        for candidate in candidates {
            if claimed.contains_key(&candidate) {
                continue;
            }

            match self.try_claim(&candidate).await {
                Ok(ClaimAttempt::Claimed) => return Ok(Some(candidate)),
                Ok(ClaimAttempt::Contended) => {
                    // Expected under concurrency - not an error, just move on
                    debug!("Catalog lock contended, skipping {} this round", candidate);
                    continue;
                }
                Ok(ClaimAttempt::AlreadyClaimed) => continue,
                Err(e) => {
                    warn!("Failed to claim {}: {}", candidate, e);
                    continue;
                }
            }
        }

        Ok(None)
    }

    /// Unconditionally overwrite a unit's record with terminal metadata.
    ///
    /// Uses the same lock-guarded read-modify-write as the claim; errors
    /// propagate to the caller.
    pub async fn finalize(&self, unit: &str, record: ClaimRecord) -> Result<(), StoreError> {
        if !self.acquire_lock().await? {
            return Err(StoreError::Io(format!(
                "Catalog lock is held, cannot finalize {}",
                unit
            )));
        }

        let result = self.write_record(unit, &record).await;
        self.release_lock().await;
        result
    }

    /// Attempt the pending -> processing transition for one candidate
    async fn try_claim(&self, unit: &str) -> Result<ClaimAttempt, StoreError> {
        if !self.acquire_lock().await? {
            return Ok(ClaimAttempt::Contended);
        }

        // Re-validate under the lock: a peer may have claimed this unit
        // after our stale read
        let result = async {
            let catalog = self.store.read_json(&self.catalog_path).await?;
            if catalog.contains_key(unit) {
                return Ok(ClaimAttempt::AlreadyClaimed);
            }
            self.write_record(unit, &ClaimRecord::processing()).await?;
            Ok(ClaimAttempt::Claimed)
        }
        .await;

        self.release_lock().await;
        result
    }

    /// Read-modify-write one record into the catalog document
    async fn write_record(&self, unit: &str, record: &ClaimRecord) -> Result<(), StoreError> {
        let mut catalog = self.store.read_json(&self.catalog_path).await?;
        let encoded = serde_json::to_value(record).map_err(|e| StoreError::InvalidDocument {
            path: self.catalog_path.clone(),
            message: e.to_string(),
        })?;
        catalog.insert(unit.to_string(), encoded);
        self.store
            .write_json(&Value::Object(catalog), &self.catalog_path)
            .await
    }

    /// Acquire the catalog lock, breaking an expired lease if needed.
    ///
    /// Returns false when a live contender holds the lock.
    async fn acquire_lock(&self) -> Result<bool, StoreError> {
        let body = (Utc::now() + self.lease).to_rfc3339();
        match self.store.create_if_absent(&self.lock_path, &body).await? {
            CreateOutcome::Created => return Ok(true),
            CreateOutcome::AlreadyExists => {}
        }

        // Lock is present - only break it if its lease has expired.
        // An unreadable body is treated as held; never break what we
        // cannot interpret.
        match self.store.read_to_string(&self.lock_path).await {
            Ok(existing) => {
                let expired = DateTime::parse_from_rfc3339(existing.trim())
                    .map(|expiry| Utc::now() > expiry.with_timezone(&Utc))
                    .unwrap_or(false);
                if !expired {
                    return Ok(false);
                }
                warn!("Breaking expired catalog lock (lease ran out at {})", existing.trim());
                self.store.delete(&self.lock_path).await?;
            }
            // Holder released between our create attempt and the read
            Err(StoreError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        let body = (Utc::now() + self.lease).to_rfc3339();
        Ok(matches!(
            self.store.create_if_absent(&self.lock_path, &body).await?,
            CreateOutcome::Created
        ))
    }

    /// Release the catalog lock. Best-effort: a failed delete only means
    /// the lease will expire on its own.
    async fn release_lock(&self) {
        if let Err(e) = self.store.delete(&self.lock_path).await {
            warn!("Failed to release catalog lock: {}", e);
        }
    }
}
