//! Output sink
//!
//! Records are appended as JSON Lines. Each record is serialized in full
//! and written with a single write + flush under a mutex, so concurrent
//! entities never interleave partial lines.

use crate::error::{Error, Result, ResultExt};
use crate::record::PlaceholderRecord;
use crate::seed::SeedRow;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Append-only record destination
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Append one record
    async fn append(&self, record: &Value) -> Result<()>;

    /// Row ids of every record written so far, including earlier runs
    async fn row_ids(&self) -> Result<HashSet<String>>;
}

/// Serialize a record and append it
pub async fn push<T: Serialize + Sync>(sink: &dyn RecordSink, record: &T) -> Result<()> {
    let value = serde_json::to_value(record)?;
    sink.append(&value).await
}

/// JSON Lines file sink
#[derive(Debug)]
pub struct JsonlSink {
    path: PathBuf,
    file: Mutex<tokio::fs::File>,
}

impl JsonlSink {
    /// Open (or create) a sink file in append mode
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| Error::output(format!("Failed to open {}: {e}", path.display())))?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record back, skipping corrupt lines
    pub async fn read_all(&self) -> Result<Vec<Value>> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let mut records = Vec::new();
        let mut corrupt = 0;

        for (line_num, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(value) => records.push(value),
                Err(e) => {
                    corrupt += 1;
                    if corrupt <= 3 {
                        warn!(
                            "Skipping corrupt line {} in {}: {e}",
                            line_num + 1,
                            self.path.display()
                        );
                    }
                }
            }
        }

        if corrupt > 3 {
            warn!("{corrupt} corrupt lines skipped in {}", self.path.display());
        }
        Ok(records)
    }
}

#[async_trait]
impl RecordSink for JsonlSink {
    async fn append(&self, record: &Value) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn row_ids(&self) -> Result<HashSet<String>> {
        Ok(self.read_all().await?.iter().filter_map(row_id_of).collect())
    }
}

/// In-memory sink
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<Value>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every record appended so far
    pub async fn records(&self) -> Vec<Value> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn append(&self, record: &Value) -> Result<()> {
        self.records.lock().await.push(record.clone());
        Ok(())
    }

    async fn row_ids(&self) -> Result<HashSet<String>> {
        Ok(self.records.lock().await.iter().filter_map(row_id_of).collect())
    }
}

fn row_id_of(record: &Value) -> Option<String> {
    match record.get("rowId")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Append a `{rowId}` placeholder for every seed row with no record in the
/// sink, in seed order. Returns the number of placeholders written.
pub async fn complete_missing(seeds: &[SeedRow], sink: &dyn RecordSink) -> Result<usize> {
    let mut present = sink.row_ids().await?;
    let mut written = 0;

    for row_id in seeds.iter().filter_map(|s| s.row_id.as_ref()) {
        if present.insert(row_id.clone()) {
            push(
                sink,
                &PlaceholderRecord {
                    row_id: row_id.clone(),
                },
            )
            .await?;
            written += 1;
        }
    }

    if written > 0 {
        info!(placeholders = written, "Completed missing seed rows");
    }
    Ok(written)
}
