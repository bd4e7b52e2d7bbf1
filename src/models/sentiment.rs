//! Sentiment label vocabulary shared by the classifier and the store.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// The closed set of labels this tool reports and persists.
///
/// The underlying model speaks its own vocabulary (`POS`, `NEG`, `NEU`, and
/// possibly others); [`SentimentLabel::from_model_label`] folds it into this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
    Unknown,
}

impl SentimentLabel {
    pub const ALL: [SentimentLabel; 4] = [
        SentimentLabel::Positive,
        SentimentLabel::Negative,
        SentimentLabel::Neutral,
        SentimentLabel::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "POSITIVE",
            SentimentLabel::Negative => "NEGATIVE",
            SentimentLabel::Neutral => "NEUTRAL",
            SentimentLabel::Unknown => "UNKNOWN",
        }
    }

    /// Map a raw model label onto the closed set. Never fails.
    pub fn from_model_label(raw: &str) -> Self {
        match raw {
            "POS" => SentimentLabel::Positive,
            "NEG" => SentimentLabel::Negative,
            "NEU" => SentimentLabel::Neutral,
            _ => SentimentLabel::Unknown,
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        SentimentLabel::ALL
            .into_iter()
            .find(|label| label.as_str() == value)
            .ok_or_else(|| format!("unknown sentiment label '{value}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_labels_fold_into_closed_set() {
        assert_eq!(SentimentLabel::from_model_label("POS"), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_model_label("NEG"), SentimentLabel::Negative);
        assert_eq!(SentimentLabel::from_model_label("NEU"), SentimentLabel::Neutral);
    }

    #[test]
    fn unexpected_model_labels_become_unknown() {
        for raw in ["", "pos", "POSITIVE", "LABEL_3", "MIXED", " POS"] {
            assert_eq!(SentimentLabel::from_model_label(raw), SentimentLabel::Unknown);
        }
    }

    #[test]
    fn mapping_is_deterministic() {
        for raw in ["POS", "NEG", "NEU", "???"] {
            let first = SentimentLabel::from_model_label(raw);
            for _ in 0..10 {
                assert_eq!(SentimentLabel::from_model_label(raw), first);
            }
        }
    }

    #[test]
    fn stored_names_parse_back() {
        for label in SentimentLabel::ALL {
            assert_eq!(label.as_str().parse::<SentimentLabel>(), Ok(label));
        }
        assert!("POS".parse::<SentimentLabel>().is_err());
    }

    #[test]
    fn serializes_as_uppercase_name() {
        let json = serde_json::to_string(&SentimentLabel::Neutral).unwrap();
        assert_eq!(json, "\"NEUTRAL\"");
    }
}
