/*!
 * Claim-to-finalize workflow tests over a shared store
 */

use anyhow::Result;
use serde_json::{Map, Value};
use std::sync::Arc;

use vidscribe::job_coordinator::{ClaimRecord, ClaimStatus, JobCoordinator};
use vidscribe::object_store::{FsStore, ObjectStore};
use vidscribe::stats::RunStatistics;
use vidscribe::transcription::TranscriptionReport;
use crate::common;

const INPUT_PREFIX: &str = "transcription_workplace/input_directory/";
const METADATA_PREFIX: &str = "transcription_workplace/metadata_directory/";

async fn seed_store(store: &FsStore, names: &[&str]) -> Result<()> {
    let temp = common::create_temp_dir()?;
    for name in names {
        let local = common::create_test_file(&temp.path().to_path_buf(), name, "fake video bytes")?;
        store.upload(&local, &format!("{}{}", INPUT_PREFIX, name)).await?;
    }
    Ok(())
}

/// Test a full drain: every candidate is claimed exactly once, finalized,
/// and a later worker finds nothing left
#[tokio::test]
async fn test_workflow_withThreeVideos_shouldDrainCatalogExactlyOnce() -> Result<()> {
    common::init_test_logging();
    let temp = common::create_temp_dir()?;
    let store = Arc::new(FsStore::new(temp.path().join("store"))?);
    seed_store(&store, &["a.mp4", "b.mkv", "c.webm"]).await?;

    let coordinator = JobCoordinator::new(store.clone(), METADATA_PREFIX, 120);

    let mut drained = Vec::new();
    while let Some(unit) = coordinator.claim_next(INPUT_PREFIX).await? {
        let mut detail = Map::new();
        detail.insert("success".to_string(), Value::Bool(true));
        coordinator.finalize(&unit, ClaimRecord::finished(true, detail)).await?;
        drained.push(unit);
    }

    assert_eq!(drained.len(), 3);

    // A second worker joining late sees a fully claimed catalog
    let late_worker = JobCoordinator::new(store.clone(), METADATA_PREFIX, 120);
    assert_eq!(late_worker.claim_next(INPUT_PREFIX).await?, None);

    let catalog = store.read_json(coordinator.catalog_path()).await?;
    assert_eq!(catalog.len(), 3);
    for unit in &drained {
        let record: ClaimRecord = serde_json::from_value(catalog[unit].clone())?;
        assert_eq!(record.status, ClaimStatus::Done);
    }
    Ok(())
}

/// Test two workers interleaving claims never hand out the same unit
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_workflow_withTwoWorkers_shouldPartitionUnits() -> Result<()> {
    let temp = common::create_temp_dir()?;
    let store = Arc::new(FsStore::new(temp.path().join("store"))?);
    seed_store(&store, &["a.mp4", "b.mp4", "c.mp4", "d.mp4"]).await?;

    let worker = |store: Arc<FsStore>| async move {
        let coordinator = JobCoordinator::new(store, METADATA_PREFIX, 120);
        let mut mine = Vec::new();
        while let Some(unit) = coordinator.claim_next(INPUT_PREFIX).await.unwrap() {
            mine.push(unit.clone());
            coordinator
                .finalize(&unit, ClaimRecord::finished(true, Map::new()))
                .await
                .unwrap();
        }
        mine
    };

    let (first, second) = tokio::join!(
        tokio::spawn(worker(Arc::clone(&store))),
        tokio::spawn(worker(Arc::clone(&store)))
    );
    let first = first?;
    let second = second?;

    let mut all: Vec<String> = first.iter().chain(second.iter()).cloned().collect();
    all.sort();
    all.dedup();
    // No unit was processed twice and none was lost
    assert_eq!(all.len(), 4);
    assert_eq!(first.len() + second.len(), 4);
    Ok(())
}

/// Test a failed job leaves a failed record and the unit is not retried
#[tokio::test]
async fn test_workflow_withFailedJob_shouldRecordFailureAndNotRetry() -> Result<()> {
    let temp = common::create_temp_dir()?;
    let store = Arc::new(FsStore::new(temp.path().join("store"))?);
    seed_store(&store, &["broken.mp4"]).await?;

    let coordinator = JobCoordinator::new(store.clone(), METADATA_PREFIX, 120);
    let unit = coordinator.claim_next(INPUT_PREFIX).await?.expect("one candidate");

    let mut detail = Map::new();
    detail.insert("error".to_string(), Value::String("extraction failed".to_string()));
    coordinator.finalize(&unit, ClaimRecord::finished(false, detail)).await?;

    // Failed units stay claimed; the outer loop never hands them out again
    assert_eq!(coordinator.claim_next(INPUT_PREFIX).await?, None);

    let catalog = store.read_json(coordinator.catalog_path()).await?;
    let record: ClaimRecord = serde_json::from_value(catalog[&unit].clone())?;
    assert_eq!(record.status, ClaimStatus::Failed);
    Ok(())
}

/// Test run statistics land in the same metadata prefix as the catalog
#[tokio::test]
async fn test_workflow_withStatsFlush_shouldPersistRunLogNextToCatalog() -> Result<()> {
    let temp = common::create_temp_dir()?;
    let store = Arc::new(FsStore::new(temp.path().join("store"))?);

    let mut stats = RunStatistics::new(METADATA_PREFIX, "whisper-large-v3-turbo");
    stats.record_success(
        "transcription_workplace/input_directory/a.mp4",
        12.0,
        &TranscriptionReport {
            detected_language: "en".to_string(),
            chunks_processed: 2,
            chunk_size_seconds: 60,
            duration_seconds: 90.0,
        },
    );
    stats.flush(store.as_ref()).await?;

    let logs = store.list("transcription_workplace/metadata_directory/logs/").await?;
    assert_eq!(logs.len(), 1);

    let cumulative = store.read_json(&stats.cumulative_stats_path()).await?;
    assert_eq!(cumulative["total_processed"], 1);
    Ok(())
}
