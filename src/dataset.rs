//! Dataset items and the storage seams around the pipeline.
//!
//! The pipeline itself never touches storage directly: it pulls items from
//! an [`ItemSource`] and hands finished records to an [`ItemSink`]. Both are
//! thin collaborators — in-memory implementations for tests and embedding,
//! JSON file implementations for the `augment` binary.

use crate::error::{AugmentError, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// A single dataset record: an open-ended mapping from field name to value.
///
/// Identity is positional — an item is "item 3" because it was fetched
/// third. Items are only ever replaced wholesale (preprocessing) or grown
/// (response attachment); the pipeline never emits a partially written one.
pub type Item = Map<String, Value>;

/// Source of input items, fetched once at the start of a run.
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Fetch all items. A failure here is fatal before any item is processed.
    async fn fetch(&self) -> Result<Vec<Item>>;
}

/// Sink for augmented output records.
#[async_trait]
pub trait ItemSink: Send + Sync {
    /// Commit one finished record. Records already pushed stay committed
    /// even if the run later aborts.
    async fn push(&mut self, item: Item) -> Result<()>;
}

/// In-memory source over a fixed set of items.
#[derive(Debug, Default)]
pub struct MemorySource {
    items: Vec<Item>,
}

impl MemorySource {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl ItemSource for MemorySource {
    async fn fetch(&self) -> Result<Vec<Item>> {
        Ok(self.items.clone())
    }
}

/// In-memory sink that collects pushed records for inspection.
#[derive(Debug, Default)]
pub struct MemorySink {
    items: Vec<Item>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records pushed so far, in push order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }
}

#[async_trait]
impl ItemSink for MemorySink {
    async fn push(&mut self, item: Item) -> Result<()> {
        self.items.push(item);
        Ok(())
    }
}

/// File-backed source reading a JSON array of objects, or JSON Lines.
///
/// The whole file is parsed up front; a top-level array is preferred and a
/// line-per-object fallback covers `.jsonl` exports.
#[derive(Debug)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl ItemSource for JsonFileSource {
    async fn fetch(&self) -> Result<Vec<Item>> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            AugmentError::Source(format!("{}: {}", self.path.display(), e))
        })?;

        if let Ok(items) = serde_json::from_str::<Vec<Item>>(&text) {
            return Ok(items);
        }

        // JSON Lines fallback: one object per non-blank line.
        let mut items = Vec::new();
        for (number, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let item: Item = serde_json::from_str(line).map_err(|e| {
                AugmentError::Source(format!(
                    "{}:{}: not a JSON object: {}",
                    self.path.display(),
                    number + 1,
                    e
                ))
            })?;
            items.push(item);
        }
        Ok(items)
    }
}

/// File-backed sink appending one JSON object per line.
#[derive(Debug)]
pub struct JsonFileSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl JsonFileSink {
    /// Create (or truncate) the output file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| AugmentError::Output(format!("{}: {}", path.display(), e)))?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }
}

#[async_trait]
impl ItemSink for JsonFileSink {
    async fn push(&mut self, item: Item) -> Result<()> {
        let line = serde_json::to_string(&item)
            .map_err(|e| AugmentError::Output(e.to_string()))?;
        writeln!(self.writer, "{}", line)
            .and_then(|_| self.writer.flush())
            .map_err(|e| AugmentError::Output(format!("{}: {}", self.path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(value: Value) -> Item {
        value.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn test_memory_source_roundtrip() {
        let source = MemorySource::new(vec![item(json!({"a": 1}))]);
        let items = source.fetch().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["a"], 1);
    }

    #[tokio::test]
    async fn test_memory_sink_collects_in_order() {
        let mut sink = MemorySink::new();
        sink.push(item(json!({"i": 0}))).await.unwrap();
        sink.push(item(json!({"i": 1}))).await.unwrap();
        assert_eq!(sink.items()[0]["i"], 0);
        assert_eq!(sink.items()[1]["i"], 1);
    }

    #[tokio::test]
    async fn test_json_file_source_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.json");
        std::fs::write(&path, r#"[{"a": 1}, {"a": 2}]"#).unwrap();

        let items = JsonFileSource::new(&path).fetch().await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1]["a"], 2);
    }

    #[tokio::test]
    async fn test_json_file_source_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.jsonl");
        std::fs::write(&path, "{\"a\": 1}\n\n{\"a\": 2}\n").unwrap();

        let items = JsonFileSource::new(&path).fetch().await.unwrap();
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn test_json_file_source_missing_is_source_error() {
        let err = JsonFileSource::new("/nonexistent/input.json")
            .fetch()
            .await
            .unwrap_err();
        assert!(matches!(err, AugmentError::Source(_)));
    }

    #[tokio::test]
    async fn test_json_file_sink_writes_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");

        let mut sink = JsonFileSink::create(&path).unwrap();
        sink.push(item(json!({"a": 1}))).await.unwrap();
        sink.push(item(json!({"b": 2}))).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"a":1}"#);
    }
}
