//! postbox demo: a burst of storefront emails through the dispatch queue,
//! against a simulated (flaky) delivery API.

mod simulated;
mod templates;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use postbox_core::{DeliveryOutcome, EmailQueue, EmailTemplate, QueueConfig, RetryPolicy};
use tracing::info;
use tracing_subscriber::EnvFilter;

use simulated::SimulatedDelivery;
use templates::{CartReminder, OrderConfirmation, ShipmentNotice, WorkshopResponse, priority_for};

#[derive(Debug, Parser)]
#[command(name = "postbox", about = "Run a burst of emails through the dispatch queue")]
struct Args {
    /// JSON config file (otherwise POSTBOX_* environment variables).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the concurrency ceiling.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Override the default max attempts per email.
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Number of emails to enqueue.
    #[arg(long, default_value_t = 40)]
    emails: usize,

    /// Probability that one simulated delivery call fails.
    #[arg(long, default_value_t = 0.3)]
    fail_rate: f64,

    /// Mean simulated latency per call, in milliseconds.
    #[arg(long, default_value_t = 80)]
    latency_ms: u64,

    /// Exponential backoff base in milliseconds (0 = retry immediately).
    #[arg(long)]
    backoff_ms: Option<u64>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn load_config(args: &Args) -> Result<QueueConfig> {
    let mut config = match &args.config {
        Some(path) => QueueConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => QueueConfig::from_env().context("loading POSTBOX_* environment")?,
    };
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(max_attempts) = args.max_attempts {
        config.default_max_attempts = max_attempts;
    }
    if let Some(ms) = args.backoff_ms
        && ms > 0
    {
        config.retry = RetryPolicy::exponential(Duration::from_millis(ms)).with_jitter(0.3);
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = load_config(&args)?;
    info!(
        concurrency = config.concurrency,
        max_attempts = config.default_max_attempts,
        emails = args.emails,
        "starting postbox demo"
    );

    let delivery = Arc::new(SimulatedDelivery::new(
        args.fail_rate,
        Duration::from_millis(args.latency_ms),
    ));
    let queue = EmailQueue::builder(delivery).config(config).build()?;

    let mut receipts = Vec::with_capacity(args.emails);
    for i in 0..args.emails {
        let to = format!("customer{i}@example.com");
        let receipt = match i % 4 {
            0 => queue.enqueue_template(
                &OrderConfirmation {
                    to,
                    order_id: format!("ORD-{i:05}"),
                    total: format!("{}.00", 20 + i),
                },
                priority_for(OrderConfirmation::TEMPLATE_ID),
            )?,
            1 => queue.enqueue_template(
                &ShipmentNotice {
                    to,
                    order_id: format!("ORD-{i:05}"),
                    tracking_url: format!("https://track.example.com/{i}"),
                },
                priority_for(ShipmentNotice::TEMPLATE_ID),
            )?,
            2 => queue.enqueue_template(
                &WorkshopResponse {
                    to,
                    workshop: "Intro to pottery".to_string(),
                    accepted: i % 3 != 0,
                },
                priority_for(WorkshopResponse::TEMPLATE_ID),
            )?,
            _ => queue.enqueue_template(
                &CartReminder {
                    to,
                    items: vec!["glaze kit".to_string(), "apron".to_string()],
                },
                priority_for(CartReminder::TEMPLATE_ID),
            )?,
        };
        receipts.push(receipt);
    }
    info!(status = ?queue.status(), "burst enqueued");

    let mut failed = Vec::new();
    for receipt in receipts {
        let task_id = receipt.task_id();
        if let DeliveryOutcome::Exhausted {
            attempts,
            last_error,
        } = receipt.outcome().await
        {
            failed.push(serde_json::json!({
                "task_id": task_id,
                "attempts": attempts,
                "last_error": last_error,
            }));
        }
    }
    queue.wait_idle().await;
    queue.shutdown();

    let report = serde_json::json!({
        "stats": queue.stats(),
        "permanently_failed": failed,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
