//! Preference Pair Export
//!
//! Converts the interaction log into `(prompt, chosen, rejected)` triplets
//! for preference optimisation. Only one side of each pair is real; the
//! other is a placeholder to be filled by an offline generation pass.
//!
//! | feedback | chosen                              | rejected                           |
//! |----------|-------------------------------------|------------------------------------|
//! | 1 (like) | logged response                     | `[Offline Generated Bad Response]` |
//! | 0        | `[Offline Generated Good Response]` | logged response                    |
//!
//! Records without feedback are skipped.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_stream::StreamExt;

use super::logger::{read_records, Feedback, InteractionRecord, LogError};

/// Placeholder for the missing rejected side of a liked response
pub const PLACEHOLDER_REJECTED: &str = "[Offline Generated Bad Response]";

/// Placeholder for the missing chosen side of a disliked response
pub const PLACEHOLDER_CHOSEN: &str = "[Offline Generated Good Response]";

/// Provenance tag of a pair
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairSource {
    /// Built from a liked response
    UserFeedbackPositive,
    /// Built from a disliked response
    UserFeedbackNegative,
}

/// Pair metadata
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairMetadata {
    /// Which kind of feedback produced the pair
    pub source: PairSource,
}

/// One preference-optimisation training example
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferencePair {
    /// Original query
    pub prompt: String,
    /// Preferred response
    pub chosen: String,
    /// Dispreferred response
    pub rejected: String,
    /// Provenance
    pub metadata: PairMetadata,
}

/// Build the pair for a logged interaction, if it carries feedback
#[must_use]
pub fn pair_from_record(record: &InteractionRecord) -> Option<PreferencePair> {
    let pair = match record.feedback? {
        Feedback::Like => PreferencePair {
            prompt: record.prompt.clone(),
            chosen: record.response.clone(),
            rejected: PLACEHOLDER_REJECTED.to_string(),
            metadata: PairMetadata {
                source: PairSource::UserFeedbackPositive,
            },
        },
        Feedback::Dislike => PreferencePair {
            prompt: record.prompt.clone(),
            chosen: PLACEHOLDER_CHOSEN.to_string(),
            rejected: record.response.clone(),
            metadata: PairMetadata {
                source: PairSource::UserFeedbackNegative,
            },
        },
    };
    Some(pair)
}

/// Export failures
#[derive(Debug, Error)]
pub enum ExportError {
    /// The input log could not be read
    #[error(transparent)]
    Log(#[from] LogError),

    /// The output file could not be written
    #[error("Failed to write {path}: {source}")]
    Write {
        /// Output file or directory
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A pair could not be encoded
    #[error("Failed to serialize pair: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Convert an interaction log into a JSONL file of preference pairs
///
/// Returns the number of pairs written. A missing input log is not an error:
/// a warning is logged, nothing is written, and the count is zero.
pub async fn export_preference_pairs(input: &Path, output: &Path) -> Result<usize, ExportError> {
    if !fs::try_exists(input).await.unwrap_or(false) {
        tracing::warn!(path = %input.display(), "No interaction log found, nothing to export");
        return Ok(0);
    }

    let write_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| ExportError::Write { path, source }
    };

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(write_err(parent))?;
    }

    let file = File::create(output).await.map_err(write_err(output))?;
    let mut writer = BufWriter::new(file);

    let mut records = read_records(input).await?;
    let mut written = 0usize;
    let mut positive = 0usize;

    while let Some(record) = records.next().await {
        let Some(pair) = pair_from_record(&record) else {
            continue;
        };
        if pair.metadata.source == PairSource::UserFeedbackPositive {
            positive += 1;
        }

        let mut line = serde_json::to_string(&pair)?;
        line.push('\n');
        writer
            .write_all(line.as_bytes())
            .await
            .map_err(write_err(output))?;
        written += 1;
    }

    writer.flush().await.map_err(write_err(output))?;

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        pairs = written,
        positive,
        negative = written - positive,
        "Preference pairs exported"
    );

    Ok(written)
}
