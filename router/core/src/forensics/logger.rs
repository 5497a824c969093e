//! Interaction Log
//!
//! Append-only JSONL record of answered queries and the user's verdict on
//! them. One JSON object per line:
//!
//! ```text
//! {"id":"…","timestamp":"2026-10-19T09:14:03.120+02:00","prompt":"…",
//!  "model":"professor","response":"…","feedback":1,"latency_ms":0.42}
//! ```
//!
//! Reading is lazy and forward-only; lines that fail to parse are skipped
//! so a torn final write never poisons the log.

use std::path::{Path, PathBuf};
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tokio_stream::wrappers::LinesStream;
use tokio_stream::{Stream, StreamExt};
use uuid::Uuid;

/// Default location of the interaction log, relative to the working directory
pub const DEFAULT_LOG_PATH: &str = "data/logs/routing_events.jsonl";

/// Lazy stream of interaction records
pub type RecordStream = Pin<Box<dyn Stream<Item = InteractionRecord> + Send>>;

/// User verdict on a response, stored as an integer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Feedback {
    /// Thumbs down (0)
    Dislike,
    /// Thumbs up (1)
    Like,
}

impl From<Feedback> for u8 {
    fn from(feedback: Feedback) -> Self {
        match feedback {
            Feedback::Dislike => 0,
            Feedback::Like => 1,
        }
    }
}

impl TryFrom<u8> for Feedback {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Dislike),
            1 => Ok(Self::Like),
            other => Err(format!("feedback must be 0 or 1, got {other}")),
        }
    }
}

impl std::str::FromStr for Feedback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "like" | "up" | "1" => Ok(Self::Like),
            "dislike" | "down" | "0" => Ok(Self::Dislike),
            other => Err(format!("unknown feedback '{other}' (expected like or dislike)")),
        }
    }
}

/// One line of the interaction log
///
/// Only `prompt` and `response` are required when reading, so logs written
/// by other tools (free-form ids, no timing) still load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// Record identifier (UUID v4 when written by this logger)
    #[serde(default)]
    pub id: String,
    /// Local time of the interaction, RFC 3339
    #[serde(default)]
    pub timestamp: String,
    /// The user's query
    pub prompt: String,
    /// Expert the query was routed to
    #[serde(default)]
    pub model: String,
    /// Text returned to the user
    pub response: String,
    /// User verdict; absent in records written by other tools
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
    /// Routing latency in milliseconds
    #[serde(default)]
    pub latency_ms: f64,
}

impl InteractionRecord {
    /// Create a record stamped with a fresh id and the current time
    pub fn new(
        prompt: impl Into<String>,
        model: impl Into<String>,
        response: impl Into<String>,
        feedback: Feedback,
        latency_ms: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: chrono::Local::now().to_rfc3339(),
            prompt: prompt.into(),
            model: model.into(),
            response: response.into(),
            feedback: Some(feedback),
            latency_ms,
        }
    }
}

/// Interaction log failures
#[derive(Debug, Error)]
pub enum LogError {
    /// Filesystem failure on the log file or its directory
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The record could not be encoded
    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl LogError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Append-only JSONL interaction logger
///
/// Appends from concurrent tasks are serialised, so lines never interleave.
#[derive(Debug)]
pub struct InteractionLogger {
    path: PathBuf,
    file: Mutex<File>,
}

impl InteractionLogger {
    /// Open (or create) the log, creating parent directories as needed
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, LogError> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| LogError::io(parent, e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| LogError::io(&path, e))?;

        tracing::debug!(path = %path.display(), "Interaction log opened");

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Location of the log file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record one answered query
    pub async fn log_interaction(
        &self,
        prompt: &str,
        routed_expert: &str,
        response: &str,
        feedback: Feedback,
        latency_ms: f64,
    ) -> Result<InteractionRecord, LogError> {
        let record = InteractionRecord::new(prompt, routed_expert, response, feedback, latency_ms);
        self.append(&record).await?;
        Ok(record)
    }

    /// Append an already-built record
    pub async fn append(&self, record: &InteractionRecord) -> Result<(), LogError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| LogError::io(&self.path, e))?;
        file.flush().await.map_err(|e| LogError::io(&self.path, e))?;

        tracing::debug!(id = %record.id, model = %record.model, "Interaction logged");
        Ok(())
    }

    /// Stream every readable record currently in the log
    pub async fn read_logs(&self) -> Result<RecordStream, LogError> {
        read_records(&self.path).await
    }
}

/// Stream the records of a JSONL interaction log
///
/// A missing file yields an empty stream. Blank and malformed lines are
/// skipped, including lines that are not valid UTF-8; reading stops at the
/// first other I/O error.
pub async fn read_records(path: &Path) -> Result<RecordStream, LogError> {
    let file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Box::pin(tokio_stream::empty()));
        }
        Err(e) => return Err(LogError::io(path, e)),
    };

    let lines = LinesStream::new(BufReader::new(file).lines());
    let records = lines
        .take_while(|line| match line {
            Ok(_) => true,
            Err(e) => e.kind() == std::io::ErrorKind::InvalidData,
        })
        .filter_map(|line| match line {
            Ok(line) => Some(line),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping undecodable log line");
                None
            }
        })
        .filter_map(|line| parse_line(&line));

    Ok(Box::pin(records))
}

fn parse_line(line: &str) -> Option<InteractionRecord> {
    if line.trim().is_empty() {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::debug!(error = %e, "Skipping malformed log line");
            None
        }
    }
}
