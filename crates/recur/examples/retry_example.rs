//! Example: Retrying a flaky service with recur
//!
//! This example demonstrates:
//! 1. Exponential backoff capped by a retry limit
//! 2. A classifier that stops on client errors but retries 429
//! 3. An overall deadline pre-empting a slow retry loop
//! 4. Loading the same policy from TOML
//!
//! Run with:
//! ```bash
//! RUST_LOG=recur=debug cargo run -p recur --example retry_example
//! ```

use recur::prelude::*;
use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// A simulated service that answers with a scripted list of status codes
struct FlakyService {
    calls: Arc<AtomicU32>,
    script: Vec<u16>,
}

impl FlakyService {
    fn new(script: Vec<u16>) -> Self {
        Self {
            calls: Arc::new(AtomicU32::new(0)),
            script,
        }
    }

    async fn call(&self) -> Result<String, Failure> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
        match self.script.get(call).copied().unwrap_or(200) {
            200 => {
                println!("  Call {}: 200 OK", call + 1);
                Ok("payload".to_string())
            }
            code => {
                println!("  Call {}: {}", call + 1, code);
                Err(Failure::status(code))
            }
        }
    }

    fn total_calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Example 1: Exponential backoff with a retry limit
async fn example_backoff() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 1: Exponential Backoff ===\n");

    let retry = Retry::new(exponential(Duration::from_millis(100), 2.0).intersect(recurs(3)));
    let service = FlakyService::new(vec![503, 502]);

    let start = Instant::now();
    let body = retry.run(|| service.call()).await?;

    println!("\nResult: {body}");
    println!("Total calls: {}", service.total_calls());
    println!("Total time: {:?}", start.elapsed());
    println!("Expected delays: 100ms + 200ms = ~300ms");

    Ok(())
}

/// Example 2: Classifying failures
async fn example_classifier() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 2: Terminal vs Retryable Failures ===\n");

    let retry = Retry::new(spaced(Duration::from_millis(20)).intersect(recurs(5)))
        .classifier(FailurePolicy::default().retryable_code(429));

    println!("Test 1: 404 is terminal");
    let service = FlakyService::new(vec![404]);
    let err = retry.run(|| service.call()).await.unwrap_err();
    println!("  -> {err}");
    assert!(err.is_terminal());

    println!("\nTest 2: 429 is retried");
    let service = FlakyService::new(vec![429, 429]);
    let body = retry.run(|| service.call()).await?;
    println!("  -> {body} after {} calls", service.total_calls());

    Ok(())
}

/// Example 3: Overall deadline
async fn example_timeout() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 3: Deadline ===\n");

    let retry = Retry::new(exponential(Duration::from_millis(100), 2.0))
        .timeout(Duration::from_millis(450));
    let service = FlakyService::new(vec![503, 503, 503]);

    let start = Instant::now();
    match retry.run(|| service.call()).await {
        Err(err) if err.is_timeout() => {
            println!("  -> {err} (after {:?})", start.elapsed());
        }
        other => println!("  -> unexpected: {other:?}"),
    }

    Ok(())
}

/// Example 4: Policy from configuration
async fn example_config() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 4: Policy from TOML ===\n");

    let config = RetryConfig::from_toml_str(
        r#"
        max_retries = 4
        timeout_ms = 2000

        [cadence]
        kind = "fixed"
        interval_ms = 50

        [classify]
        retryable_codes = [429]
        "#,
    )?;
    println!("{}", config.to_toml_string()?);

    let retry = config.executor()?;
    let service = FlakyService::new(vec![429, 500, 503]);
    let body = retry.run(|| service.call()).await?;
    println!("  -> {body} after {} calls", service.total_calls());

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    example_backoff().await?;
    example_classifier().await?;
    example_timeout().await?;
    example_config().await?;

    println!("\n=== All examples completed ===\n");
    Ok(())
}
