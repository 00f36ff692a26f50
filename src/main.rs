use alert_policy::{
    config::Config, db::init_db, BatchSummary, ChainKey, ClassifiedEvent, Decision, Recipient,
    RecipientEvaluator, RecipientOutcome, Repository, StaticAddressBook, UsdContext,
};
use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// One line of stdin: an event to evaluate for a set of recipients.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EvaluationRequest {
    recipients: Vec<Recipient>,
    event: ClassifiedEvent,
    chain_key: ChainKey,
    #[serde(default)]
    usd: UsdContext,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutcomeLine<'a> {
    recipient: &'a Recipient,
    #[serde(skip_serializing_if = "Option::is_none")]
    decision: Option<&'a Decision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct EvaluationResponse<'a> {
    outcomes: Vec<OutcomeLine<'a>>,
    summary: BatchSummary,
}

impl<'a> EvaluationResponse<'a> {
    fn from_outcomes(outcomes: &'a [RecipientOutcome]) -> Self {
        EvaluationResponse {
            outcomes: outcomes
                .iter()
                .map(|o| OutcomeLine {
                    recipient: &o.recipient,
                    decision: o.result.as_ref().ok(),
                    error: o.result.as_ref().err().map(|e| e.to_string()),
                })
                .collect(),
            summary: BatchSummary::from_outcomes(outcomes),
        }
    }
}

fn build_address_book(config: &Config) -> anyhow::Result<StaticAddressBook> {
    let mut book = if config.cex_builtin_table {
        StaticAddressBook::builtin()
    } else {
        StaticAddressBook::empty()
    };

    if let Some(path) = &config.cex_address_book_path {
        let added = book
            .load_csv(path)
            .with_context(|| format!("failed to load CEX address book {}", path))?;
        tracing::info!("Loaded {} CEX tags from {}", added, path);
    }

    tracing::info!("CEX address book ready with {} entries", book.len());
    Ok(book)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = Config::from_env().context("configuration error")?;

    let pool = init_db(&config.database_path)
        .await
        .context("failed to initialize snapshot store")?;
    let repo = Repository::new(pool).with_default_timezone(config.default_timezone.clone());
    let address_book = build_address_book(&config)?;

    let evaluator = RecipientEvaluator::new(Arc::new(repo), Arc::new(address_book))
        .with_concurrency(config.fanout_concurrency);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }

        let request: EvaluationRequest = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("skipping malformed request: {}", e);
                continue;
            }
        };

        let outcomes = evaluator
            .evaluate_batch(
                &request.recipients,
                &request.event,
                &request.chain_key,
                &request.usd,
                Utc::now(),
            )
            .await;
        let mut out = serde_json::to_vec(&EvaluationResponse::from_outcomes(&outcomes))?;
        out.push(b'\n');
        stdout.write_all(&out).await?;
        stdout.flush().await?;
    }

    Ok(())
}
