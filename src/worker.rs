use crate::issuer::Issuer;
use crate::model::UnitReport;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// One dispatch unit: wait, send a single request, report it.
pub async fn worker(
    rank: usize,
    delay: Duration,
    url: Arc<str>,
    issuer: Issuer,
    tx: mpsc::Sender<UnitReport>,
) {
    // initial delay
    tokio::time::sleep(delay).await;

    let begin = Utc::now();
    debug!(rank, "request sent");
    let outcome = issuer.issue(&url).await;
    let end = Utc::now();
    debug!(
        rank,
        elapsed_ms = (end - begin).num_milliseconds(),
        success = outcome.is_success(),
        "request finished"
    );

    let report = UnitReport {
        rank,
        begin,
        end,
        outcome,
    };
    if let Err(e) = tx.send(report).await {
        warn!(rank, outcome = %e.0.outcome, "report receiver closed, outcome dropped");
    }
}
