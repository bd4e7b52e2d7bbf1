use super::error::ModelError;

/// Top label and confidence as reported by the underlying model.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPrediction {
    /// Model vocabulary, e.g. `POS`. Not guaranteed to be from a fixed set.
    pub label: String,
    /// Confidence in `[0, 1]`.
    pub score: f32,
}

impl RawPrediction {
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// A pretrained sentiment classifier, loaded once and shared read-only.
pub trait SentimentModel: Send + Sync {
    fn predict(&self, text: &str) -> Result<RawPrediction, ModelError>;
}
