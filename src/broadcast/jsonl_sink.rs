//! JSONL sink - appends every payload as one line

use super::payload::BroadcastPayload;
use super::sink::BroadcastSink;
use crate::error::SinkError;
use async_trait::async_trait;
use std::path::Path;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;

pub struct JsonlSink {
    writer: Mutex<BufWriter<File>>,
}

impl JsonlSink {
    /// Open (or create) the output file in append mode
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, SinkError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;

        log::info!("📝 Writing broadcast payloads to: {}", path.display());
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

#[async_trait]
impl BroadcastSink for JsonlSink {
    async fn deliver(&self, payload: &BroadcastPayload) -> Result<(), SinkError> {
        let mut line = serde_json::to_string(payload)?;
        line.push('\n');

        let mut writer = self.writer.lock().await;
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "jsonl"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::payload::PayloadKind;
    use crate::hype::GlobalStats;
    use chrono::Utc;

    #[tokio::test]
    async fn test_jsonl_sink_appends_lines() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("out").join("broadcast.jsonl");
        let sink = JsonlSink::open(&path).await.unwrap();

        let payload = BroadcastPayload::new(
            PayloadKind::Update,
            &[],
            GlobalStats::default(),
            None,
            Utc::now(),
        );
        sink.deliver(&payload).await.unwrap();
        sink.deliver(&payload).await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed["type"], "update");
    }
}
