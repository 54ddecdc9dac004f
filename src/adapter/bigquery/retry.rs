//! BigQuery Retry Policy and Error Classification
//!
//! リトライポリシーとエラー分類

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

// Retry configuration based on Google Cloud streaming insert guidance
// See: https://cloud.google.com/bigquery/docs/streaming-data-into-bigquery
pub const MAX_RETRIES: u32 = 5;
pub const MAX_CONNECTION_RESETS: u32 = 3;
pub const INITIAL_RETRY_DELAY_MS: u64 = 1000;
pub const MAX_RETRY_DELAY_MS: u64 = 32000;
pub const BATCH_DELAY_MS: u64 = 200;
/// Batches at or below this size are not split further on 413
pub const MIN_SPLIT_BATCH_SIZE: usize = 10;

// Markers match whole words only ("eof" must not hit "thereof")
const CONNECTION_MARKERS: &[&str] = &[
    "broken pipe",
    "connection reset",
    "connection refused",
    "connection error",
    "eof",
    "unexpected end of file",
];

const TRANSIENT_MARKERS: &[&str] = &[
    "not found",
    "deleted",
    "500",
    "503",
    "403",
    "429",
    "rate limit",
    "rate limits",
    "ratelimitexceeded",
    "quota",
    "quotaexceeded",
    "timeout",
    "timed out",
];

const TOO_LARGE_MARKERS: &[&str] = &["413", "request entity too large"];

/// How a failed insert should be handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Split the batch in half and retry each half
    RequestTooLarge,
    /// Recreate the client, then retry
    Connection,
    /// Retry with the same client after backoff
    Transient,
    /// Give up
    Fatal,
}

struct MarkerSet {
    too_large: Regex,
    connection: Regex,
    transient: Regex,
}

fn word_regex(markers: &[&str]) -> Option<Regex> {
    let alternatives = markers
        .iter()
        .map(|m| regex::escape(m))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{})\b", alternatives)).ok()
}

fn marker_set() -> Option<&'static MarkerSet> {
    static SET: OnceLock<Option<MarkerSet>> = OnceLock::new();
    SET.get_or_init(|| {
        Some(MarkerSet {
            too_large: word_regex(TOO_LARGE_MARKERS)?,
            connection: word_regex(CONNECTION_MARKERS)?,
            transient: word_regex(TRANSIENT_MARKERS)?,
        })
    })
    .as_ref()
}

/// Classify an error message (checked in order: too large, connection, transient)
pub fn classify_error(error_msg: &str) -> ErrorKind {
    let Some(markers) = marker_set() else {
        return ErrorKind::Fatal;
    };
    let msg = error_msg.to_ascii_lowercase();
    if markers.too_large.is_match(&msg) {
        ErrorKind::RequestTooLarge
    } else if markers.connection.is_match(&msg) {
        ErrorKind::Connection
    } else if markers.transient.is_match(&msg) {
        ErrorKind::Transient
    } else {
        ErrorKind::Fatal
    }
}

/// Convert error chain to string including all causes
pub fn error_chain_to_string(e: &anyhow::Error) -> String {
    e.chain()
        .map(|cause| cause.to_string())
        .collect::<Vec<_>>()
        .join(" | ")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub max_connection_resets: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub batch_delay: Duration,
    pub min_split_batch_size: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            max_connection_resets: MAX_CONNECTION_RESETS,
            initial_delay: Duration::from_millis(INITIAL_RETRY_DELAY_MS),
            max_delay: Duration::from_millis(MAX_RETRY_DELAY_MS),
            batch_delay: Duration::from_millis(BATCH_DELAY_MS),
            min_split_batch_size: MIN_SPLIT_BATCH_SIZE,
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff for the given attempt (1-based), capped at `max_delay`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.initial_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }

    /// Same limits, no waiting
    #[cfg(test)]
    pub fn without_delays() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            batch_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}
