//! Persisted classification results.

use serde::Serialize;

use crate::models::SentimentLabel;

/// One immutable row of the `sentiments` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentRecord {
    pub id: i64,
    pub text: String,
    pub sentiment: SentimentLabel,
    /// `YYYY-MM-DD HH:MM:SS`, local time.
    pub timestamp: String,
}

/// Projection used by the history panel: (Time, Text, Sentiment).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub timestamp: String,
    pub text: String,
    pub sentiment: SentimentLabel,
}
