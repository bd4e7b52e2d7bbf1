//! Operations the front-end invokes. Errors reach it as display strings.

use serde::Serialize;

use crate::{
    classifier::{classify, ClassificationOutcome},
    db::{HistoryEntry, SentimentRecord},
    AppState,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SubmitOutcome {
    /// Nothing was typed; the classifier was not consulted.
    EmptyInput,
    Rejected { message: String },
    Saved { record: SentimentRecord, score: f32 },
}

/// Classify `input` and store it when classification succeeds.
pub fn submit_text(state: &AppState<'_>, input: &str) -> Result<SubmitOutcome, String> {
    if input.is_empty() {
        return Ok(SubmitOutcome::EmptyInput);
    }

    match classify(state.model, input) {
        ClassificationOutcome::Error { message } => Ok(SubmitOutcome::Rejected { message }),
        ClassificationOutcome::Success(result) => {
            let record = state
                .db
                .append_sentiment(&result.text, result.sentiment)
                .map_err(|e| format!("{e:#}"))?;
            Ok(SubmitOutcome::Saved {
                record,
                score: result.score,
            })
        }
    }
}

pub fn get_history(state: &AppState<'_>, limit: usize) -> Result<Vec<HistoryEntry>, String> {
    state.db.recent_history(limit).map_err(|e| format!("{e:#}"))
}
