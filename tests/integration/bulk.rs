//! Bulk API integration tests against a live org.

use futures::TryStreamExt;
use serde_json::json;
use std::time::Duration;

use super::common::{require_client, run_tag};
use sfbulk_jobs::{JobOptions, Record};

fn account(name: String) -> Record {
    let mut record = Record::new();
    record.insert("Name".to_string(), json!(name));
    record
}

#[tokio::test]
async fn test_bulk_insert_and_delete_lifecycle() {
    let Some(client) = require_client().await else { return; };
    let tag = run_tag();
    let rows: Vec<Record> = (0..3).map(|i| account(format!("{tag} {i}"))).collect();

    let job = client
        .create_insert_job("Account", JobOptions::default())
        .await
        .expect("insert job should be created");

    let results: Vec<Record> = job
        .scoped(|job| async move {
            let batches = job.post(&rows, 2).await?;
            assert_eq!(batches.len(), 2, "3 rows at 2 per batch");
            job.wait(Duration::from_secs(300), Duration::from_secs(2)).await?;
            job.results().try_collect().await
        })
        .await
        .expect("insert should succeed");

    assert_eq!(results.len(), 3);
    let ids: Vec<Record> = results
        .iter()
        .inspect(|r| assert_eq!(r["success"], true, "row failed: {r:?}"))
        .filter_map(|r| r["id"].as_str())
        .map(|id| {
            let mut record = Record::new();
            record.insert("Id".to_string(), json!(id));
            record
        })
        .collect();

    let cleanup = client
        .create_delete_job("Account", JobOptions::default())
        .await
        .expect("delete job should be created");
    cleanup
        .scoped(|job| async move {
            job.post_rows(&ids).await?;
            job.wait_default().await
        })
        .await
        .expect("cleanup should succeed");
}

#[tokio::test]
async fn test_bulk_query() {
    let Some(client) = require_client().await else { return; };

    let job = client
        .create_query_job("Account", JobOptions::default())
        .await
        .expect("query job should be created");
    let batch = job
        .query("SELECT Id, Name FROM Account LIMIT 10")
        .await
        .expect("query batch should be created");
    job.close().await.expect("close should succeed");

    batch
        .wait(Duration::from_secs(300), Duration::from_secs(2))
        .await
        .expect("wait should succeed");
    assert!(batch.is_done(false).await.expect("status should load"));

    let records: Vec<Record> = batch.results().try_collect().await.expect("results should stream");
    assert!(records.len() <= 10);
    for record in &records {
        assert!(record.contains_key("Id"));
    }
}

#[tokio::test]
async fn test_bulk_job_info_and_abort() {
    let Some(client) = require_client().await else { return; };

    let job = client
        .create_update_job("Account", JobOptions::default())
        .await
        .expect("update job should be created");

    let info = job.info().await.expect("info should load");
    assert_eq!(info.id, job.id());

    job.abort().await.expect("abort should succeed");
    let err = job.info().await.expect_err("aborted job should be reported");
    assert!(err.is_job_aborted());
}
