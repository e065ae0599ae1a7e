//! JSONL processing front-end: reads one email record per line from
//! stdin, runs classification and todo extraction, and writes one
//! merged outcome per line to stdout. Stands in for the upstream
//! orchestrator during local runs.

use std::io::{self, BufRead, Write};

use engine::{BatchCoordinator, EmailMessage, SharedConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "engine=info".into()
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let mut emails: Vec<EmailMessage> = Vec::new();
    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<EmailMessage>(&line) {
            Ok(email) => emails.push(email),
            Err(e) => tracing::warn!("skipping malformed input line: {e}"),
        }
    }
    tracing::info!("processing {} email(s)", emails.len());

    let coordinator = BatchCoordinator::new(SharedConfig::default());
    let outcomes = coordinator.process_batch(&emails).await;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for outcome in outcomes {
        serde_json::to_writer(&mut out, &outcome)?;
        out.write_all(b"\n")?;
    }

    Ok(())
}
