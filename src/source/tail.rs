//! Asynchronous JSONL tail reader with rotation and truncation detection

use crate::mention::RawFragment;
use std::io::SeekFrom;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

/// Where the first open begins reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPosition {
    /// Only lines appended after start-up
    End,
    /// Replay the whole file first
    Beginning,
}

pub struct FragmentTailReader {
    path: PathBuf,
    file: Option<BufReader<File>>,
    inode: Option<u64>,
    /// Bytes consumed from the current file
    offset: u64,
    /// Line read so far, waiting for its newline
    partial: String,
    start: StartPosition,
    poll_interval: Duration,
}

impl FragmentTailReader {
    pub fn new(path: PathBuf, start: StartPosition) -> Self {
        Self {
            path,
            file: None,
            inode: None,
            offset: 0,
            partial: String::new(),
            start,
            poll_interval: Duration::from_millis(100),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Open the file at the configured start position
    pub async fn start(&mut self) -> std::io::Result<()> {
        self.open(self.start).await?;
        log::info!("📖 Started tailing fragments: {}", self.path.display());
        Ok(())
    }

    async fn open(&mut self, position: StartPosition) -> std::io::Result<()> {
        let file = File::open(&self.path).await?;
        let metadata = file.metadata().await?;

        #[cfg(unix)]
        {
            self.inode = Some(metadata.ino());
        }

        let mut reader = BufReader::new(file);
        self.offset = match position {
            StartPosition::End => reader.seek(SeekFrom::End(0)).await?,
            StartPosition::Beginning => 0,
        };
        self.file = Some(reader);
        self.partial.clear();
        Ok(())
    }

    /// Read the next complete non-empty line, waiting if necessary
    ///
    /// A line still being written is held back until its newline arrives.
    pub async fn read_line(&mut self) -> std::io::Result<String> {
        loop {
            if self.detect_rotation().await? {
                log::info!("🔄 File rotation detected, reopening: {}", self.path.display());
                // A rotated file is new data, read it from the top
                self.open(StartPosition::Beginning).await?;
            }

            let Some(ref mut reader) = self.file else {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "fragment file not opened",
                ));
            };

            let read = reader.read_line(&mut self.partial).await?;
            if read == 0 {
                sleep(self.poll_interval).await;
                continue;
            }
            self.offset += read as u64;
            if !self.partial.ends_with('\n') {
                continue;
            }

            let line = std::mem::take(&mut self.partial);
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                return Ok(trimmed.to_string());
            }
        }
    }

    /// Read and parse the next fragment, skipping malformed lines
    pub async fn next_fragment(&mut self) -> std::io::Result<RawFragment> {
        loop {
            let line = self.read_line().await?;
            match serde_json::from_str::<RawFragment>(&line) {
                Ok(fragment) => return Ok(fragment),
                Err(e) => log::warn!("⚠️  Skipping malformed fragment line: {}", e),
            }
        }
    }

    /// Inode changed or the file shrank below what was already read
    async fn detect_rotation(&self) -> std::io::Result<bool> {
        let metadata = match tokio::fs::metadata(&self.path).await {
            Ok(metadata) => metadata,
            // Mid-rotation: keep reading the old handle until the new file appears
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };

        #[cfg(unix)]
        {
            if self.inode.map_or(false, |old| old != metadata.ino()) {
                return Ok(true);
            }
        }

        Ok(metadata.len() < self.offset)
    }
}

/// Tail `path` and forward every parsed fragment into `tx`
///
/// Stops when the receiver is dropped, `shutdown` flips to `true`, or the
/// file cannot be read.
pub async fn run_fragment_source(
    mut reader: FragmentTailReader,
    tx: mpsc::Sender<RawFragment>,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<()> {
    reader.start().await?;

    loop {
        tokio::select! {
            fragment = reader.next_fragment() => {
                if tx.send(fragment?).await.is_err() {
                    log::warn!("⚠️  Ingestion channel closed, stopping fragment source");
                    break;
                }
            }

            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    log::info!("🛑 Shutdown requested, stopping fragment source");
                    break;
                }
            }
        }
    }
    Ok(())
}
