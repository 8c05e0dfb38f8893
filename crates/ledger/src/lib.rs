use anyhow::{Context, Result};
use shared::{domain::GameInput, protocol::LedgerRecord};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{
    fs::OpenOptions,
    io::AsyncWriteExt,
    sync::{mpsc, oneshot},
};
use tracing::debug;

enum LedgerJob {
    Append(LedgerRecord),
    Flush(oneshot::Sender<()>),
}

/// Append-only JSON-lines log of accepted inputs.
///
/// A single writer task owns the file, so lines land in the order
/// [`Ledger::record`] was called. Write failures are dropped after a
/// debug log; the ledger is never on the critical path of an input.
#[derive(Clone)]
pub struct Ledger {
    path: Arc<PathBuf>,
    jobs: mpsc::UnboundedSender<LedgerJob>,
}

impl Ledger {
    /// Starts the writer task. Must be called from within a Tokio runtime.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = Arc::new(path.into());
        let (jobs, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(Arc::clone(&path), rx));
        Self { path, jobs }
    }

    /// Queues a record for appending and returns immediately.
    pub fn record(&self, record: LedgerRecord) {
        if self.jobs.send(LedgerJob::Append(record)).is_err() {
            debug!(path = %self.path.display(), "ledger writer stopped; record dropped");
        }
    }

    /// Resolves once every record queued before this call has been handled.
    pub async fn flush(&self) {
        let (reply, done) = oneshot::channel();
        if self.jobs.send(LedgerJob::Flush(reply)).is_ok() {
            let _ = done.await;
        }
    }
}

async fn run_writer(path: Arc<PathBuf>, mut rx: mpsc::UnboundedReceiver<LedgerJob>) {
    while let Some(job) = rx.recv().await {
        match job {
            LedgerJob::Append(record) => {
                if let Err(error) = append_line(&path, &record).await {
                    debug!(
                        path = %path.display(),
                        error = %format!("{error:#}"),
                        "ledger append failed"
                    );
                }
            }
            LedgerJob::Flush(reply) => {
                let _ = reply.send(());
            }
        }
    }
}

async fn append_line(path: &Path, record: &LedgerRecord) -> Result<()> {
    let mut line = serde_json::to_string(record)?;
    line.push('\n');
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .with_context(|| format!("failed to open ledger '{}'", path.display()))?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

/// Creates the ledger's parent directory if it does not exist yet.
pub fn ensure_parent_dir_exists(path: &Path) -> Result<()> {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for ledger '{}'",
            parent.display(),
            path.display()
        )
    })?;

    Ok(())
}

/// Parses ledger text, skipping lines that are not valid records.
pub fn parse_records(raw: &str) -> Vec<LedgerRecord> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect()
}

pub fn read_records(path: &Path) -> Result<Vec<LedgerRecord>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read ledger '{}'", path.display()))?;
    Ok(parse_records(&raw))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerSummary {
    pub total: u64,
    pub per_input: BTreeMap<GameInput, u64>,
    pub per_user: BTreeMap<String, u64>,
}

pub fn summarize(records: &[LedgerRecord]) -> LedgerSummary {
    let mut summary = LedgerSummary::default();
    for record in records {
        summary.total += 1;
        *summary.per_input.entry(record.input).or_default() += 1;
        *summary.per_user.entry(record.username.clone()).or_default() += 1;
    }
    summary
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
