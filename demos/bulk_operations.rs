//! Bulk API examples
//!
//! This example demonstrates large-scale data operations using the Bulk API:
//! - Bulk insert inside a scoped job
//! - Bulk query with streamed results
//! - Manual job control and batch monitoring
//!
//! Run with: cargo run --example bulk_operations
//! Set RUST_LOG=sfbulk_jobs=debug to watch the polling.

use std::time::Duration;

use futures::{StreamExt, TryStreamExt};
use serde_json::json;
use sfbulk::{BulkClient, JobOptions, Record, SessionCredentials};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Salesforce Bulk API Examples ===\n");

    let client = get_client().await?;

    let ids = example_bulk_insert(&client).await?;
    example_bulk_query(&client).await?;
    example_manual_job_control(&client, ids).await?;

    println!("\n✓ All Bulk API examples completed successfully!");

    Ok(())
}

/// Example 1: Insert rows inside a scoped job
async fn example_bulk_insert(
    client: &BulkClient,
) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    println!("Example 1: Bulk Insert");
    println!("----------------------");

    let rows: Vec<Record> = [
        ("Acme Corp", "Technology"),
        ("Global Industries", "Manufacturing"),
        ("Tech Startup", "Technology"),
        ("Retail Giant", "Retail"),
        ("Finance Corp", "Finance"),
    ]
    .into_iter()
    .map(|(name, industry)| record(json!({"Name": name, "Industry": industry})))
    .collect();

    println!("Inserting {} records...", rows.len());

    let job = client.create_insert_job("Account", JobOptions::default()).await?;
    let results: Vec<Record> = job
        .scoped(|job| async move {
            let batches = job.post(&rows, 2).await?;
            println!("  Created {} batches", batches.len());
            job.results().try_collect().await
        })
        .await?;

    let ids: Vec<String> = results
        .iter()
        .filter(|r| r.get("success") == Some(&json!(true)))
        .filter_map(|r| r.get("id").and_then(|id| id.as_str()).map(str::to_string))
        .collect();

    println!("\n✓ Bulk insert completed!");
    println!("  Job ID: {}", job.id());
    println!("  Records Inserted: {}", ids.len());
    println!("  Records Failed: {}", results.len() - ids.len());

    Ok(ids)
}

/// Example 2: Query and stream the records
async fn example_bulk_query(client: &BulkClient) -> Result<(), Box<dyn std::error::Error>> {
    println!("\nExample 2: Bulk Query");
    println!("---------------------");

    let job = client.create_query_job("Account", JobOptions::default()).await?;
    let batch = job
        .query("SELECT Id, Name, Industry FROM Account WHERE Industry = 'Technology' LIMIT 100")
        .await?;
    job.close().await?;

    let mut records = batch.results().take(5);
    while let Some(record) = records.next().await {
        let record = record?;
        println!(
            "  {} - {}",
            record.get("Id").and_then(|v| v.as_str()).unwrap_or("?"),
            record.get("Name").and_then(|v| v.as_str()).unwrap_or("?")
        );
    }

    Ok(())
}

/// Example 3: Drive a job by hand: post, monitor, close
async fn example_manual_job_control(
    client: &BulkClient,
    ids: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("\nExample 3: Manual Job Control");
    println!("-----------------------------");

    let rows: Vec<Record> = ids.into_iter().map(|id| record(json!({"Id": id}))).collect();

    let job = client.create_delete_job("Account", JobOptions::default()).await?;
    println!("✓ Created delete job: {}", job.id());

    let batches = job.post_rows(&rows).await?;
    job.close().await?;

    for batch in &batches {
        batch.wait(Duration::from_secs(120), Duration::from_secs(2)).await?;
        let status = batch.status(false).await?;
        println!(
            "  Batch {}: {} ({} processed, {} failed)",
            batch.id(),
            status.state.map(|s| s.to_string()).unwrap_or_default(),
            status.number_records_processed,
            status.number_records_failed
        );
    }

    let info = job.info().await?;
    println!("✓ Job {} processed {} records", info.id, info.number_records_processed);

    Ok(())
}

fn record(value: serde_json::Value) -> Record {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Record::new(),
    }
}

/// Helper function to get credentials
async fn get_client() -> Result<BulkClient, Box<dyn std::error::Error>> {
    if let Ok(creds) = SessionCredentials::from_env() {
        println!("✓ Using session from environment\n");
        return Ok(BulkClient::from_credentials(&creds)?);
    }

    let client = BulkClient::builder()
        .username(std::env::var("SF_USERNAME")?)
        .password(std::env::var("SF_PASSWORD")?)
        .login_url(
            std::env::var("SF_LOGIN_URL")
                .unwrap_or_else(|_| "https://login.salesforce.com".to_string()),
        )
        .build()
        .await?;
    println!("✓ Logged in\n");
    Ok(client)
}
