//! Concurrent CSV importer
//!
//! Rows are parsed on the calling task and grouped into batches. A fixed pool
//! of workers drains a bounded batch channel, posts each batch to the
//! location service and reports a [`BatchOutcome`] to an aggregating task.

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use dispatch_core::models::{ApiResponse, BatchData, NewDriver, Point};
use indicatif::ProgressBar;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

const BATCH_PATH: &str = "/api/v1/drivers/batch";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid record format: expected at least 2 fields (latitude,longitude), got {0}")]
    MissingFields(usize),

    #[error("invalid latitude '{0}'")]
    InvalidLatitude(String),

    #[error("invalid longitude '{0}'")]
    InvalidLongitude(String),

    #[error("coordinates out of range: {0}")]
    OutOfRange(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    drivers: &'a [NewDriver],
}

#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub batch_size: usize,
    pub workers: usize,
    /// Upper bound on one batch request; a batch that exceeds it fails
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

/// Result of posting one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub requested: usize,
    pub created: usize,
    pub errors: usize,
}

impl BatchOutcome {
    /// Every driver in the batch failed
    pub fn failed(requested: usize) -> Self {
        Self {
            requested,
            created: 0,
            errors: requested,
        }
    }

    /// The service created `created` of `requested` drivers; the rest are errors
    pub fn completed(requested: usize, created: usize) -> Self {
        Self {
            requested,
            created,
            errors: requested.saturating_sub(created),
        }
    }
}

/// Totals across an import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub rows: usize,
    pub skipped: usize,
    pub requested: usize,
    pub created: usize,
    pub errors: usize,
}

impl ImportSummary {
    fn merge(&mut self, outcome: BatchOutcome) {
        self.requested += outcome.requested;
        self.created += outcome.created;
        self.errors += outcome.errors;
    }
}

/// Parse a `latitude,longitude` record into a create request
pub fn parse_record(record: &csv::StringRecord) -> Result<NewDriver, ImportError> {
    if record.len() < 2 {
        return Err(ImportError::MissingFields(record.len()));
    }

    let lat_raw = record[0].trim();
    let lon_raw = record[1].trim();
    let latitude: f64 = lat_raw
        .parse()
        .map_err(|_| ImportError::InvalidLatitude(lat_raw.to_string()))?;
    let longitude: f64 = lon_raw
        .parse()
        .map_err(|_| ImportError::InvalidLongitude(lon_raw.to_string()))?;

    let location = Point::new(longitude, latitude);
    location
        .validate()
        .map_err(|e| ImportError::OutOfRange(e.to_string()))?;

    Ok(NewDriver::new(location))
}

#[derive(Clone)]
pub struct Importer {
    http: reqwest::Client,
    config: Arc<ImportConfig>,
}

impl Importer {
    pub fn new(config: ImportConfig) -> Result<Self, ImportError> {
        Ok(Self {
            http: reqwest::Client::builder()
                .timeout(config.request_timeout)
                .connect_timeout(config.connect_timeout)
                .build()?,
            config: Arc::new(ImportConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                batch_size: config.batch_size.max(1),
                workers: config.workers.max(1),
                ..config
            }),
        })
    }

    /// Import every row of `reader`. Unparsable rows are logged and skipped.
    pub async fn run<R: Read>(
        &self,
        mut reader: csv::Reader<R>,
        progress: Option<ProgressBar>,
    ) -> Result<ImportSummary, ImportError> {
        reader.headers()?;

        let workers = self.config.workers;
        let (batch_tx, batch_rx) = mpsc::channel::<Vec<NewDriver>>(workers * 2);
        let (result_tx, mut result_rx) = mpsc::channel::<BatchOutcome>(workers * 10);
        let batch_rx = Arc::new(Mutex::new(batch_rx));

        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let importer = self.clone();
            let batch_rx = batch_rx.clone();
            let result_tx = result_tx.clone();
            handles.push(tokio::spawn(async move {
                loop {
                    let next = batch_rx.lock().await.recv().await;
                    let Some(batch) = next else { break };
                    let outcome = importer.post_batch(worker_id, batch).await;
                    if result_tx.send(outcome).await.is_err() {
                        break;
                    }
                }
                debug!(worker_id, "Import worker finished");
            }));
        }
        drop(result_tx);

        let aggregator = tokio::spawn(async move {
            let mut summary = ImportSummary::default();
            while let Some(outcome) = result_rx.recv().await {
                summary.merge(outcome);
                if let Some(pb) = &progress {
                    pb.inc(outcome.created as u64);
                }
            }
            summary
        });

        let mut rows = 0;
        let mut skipped = 0;
        let mut batch = Vec::with_capacity(self.config.batch_size);
        for (index, record) in reader.records().enumerate() {
            // +2 for the header and 1-based numbering
            let line = index + 2;
            rows += 1;

            let parsed = record
                .map_err(ImportError::from)
                .and_then(|record| parse_record(&record));
            match parsed {
                Ok(driver) => batch.push(driver),
                Err(e) => {
                    warn!(line, error = %e, "Skipping CSV record");
                    skipped += 1;
                    continue;
                }
            }

            if batch.len() >= self.config.batch_size {
                let full =
                    std::mem::replace(&mut batch, Vec::with_capacity(self.config.batch_size));
                if batch_tx.send(full).await.is_err() {
                    break;
                }
            }
        }
        if !batch.is_empty() {
            let _ = batch_tx.send(batch).await;
        }

        drop(batch_tx);
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Import worker panicked");
            }
        }

        let mut summary = aggregator.await.unwrap_or_default();
        summary.rows = rows;
        summary.skipped = skipped;

        info!(
            rows = summary.rows,
            requested = summary.requested,
            created = summary.created,
            errors = summary.errors,
            skipped = summary.skipped,
            "Import completed"
        );
        Ok(summary)
    }

    async fn post_batch(&self, worker_id: usize, batch: Vec<NewDriver>) -> BatchOutcome {
        let requested = batch.len();
        let url = format!("{}{}", self.config.base_url, BATCH_PATH);

        let mut request = self.http.post(&url).json(&BatchRequest { drivers: &batch });
        if let Some(key) = &self.config.api_key {
            request = request.header("X-API-Key", key);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(worker_id, error = %e, "Batch request failed");
                return BatchOutcome::failed(requested);
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(worker_id, error = %e, "Failed to read batch response");
                return BatchOutcome::failed(requested);
            }
        };

        let data = match serde_json::from_str::<ApiResponse<BatchData>>(&body) {
            Ok(ApiResponse::Success(data)) if status.is_success() => data,
            Ok(ApiResponse::Failure { code, message }) => {
                warn!(
                    worker_id,
                    status = %status,
                    code = %code,
                    message = %message,
                    "Batch rejected"
                );
                return BatchOutcome::failed(requested);
            }
            _ => {
                warn!(
                    worker_id,
                    status = %status,
                    body = %body.trim(),
                    "Unexpected batch response"
                );
                return BatchOutcome::failed(requested);
            }
        };

        if data.count != requested {
            warn!(
                worker_id,
                requested,
                created = data.count,
                failed = data.failed.len(),
                "Batch partially created"
            );
        }
        debug!(worker_id, requested, created = data.count, "Batch completed");

        BatchOutcome::completed(requested, data.count)
    }
}
