//! Text classification contract.
//!
//! [`classify`] turns raw user input into a [`ClassificationOutcome`]. It
//! validates the input, calls the model, and normalizes the model's label
//! vocabulary. It never returns an error and never panics: every model
//! failure becomes the system-error outcome.

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
};

use serde::Serialize;

pub mod device;
pub mod error;
pub mod model;
pub mod shared;
mod tokenizer;
pub mod transformer;

pub use device::DeviceSetting;
pub use error::ModelError;
pub use model::{RawPrediction, SentimentModel};
pub use shared::shared_model;
pub use transformer::RobertaSentimentModel;

use crate::models::SentimentLabel;

const ENABLE_LOGS: bool = true;

/// Inputs shorter than this (in characters, after trimming) are rejected
/// before inference.
pub const MIN_TEXT_CHARS: usize = 5;

pub const INVALID_SENTENCE_MESSAGE: &str = "Invalid sentence, try again";
pub const SYSTEM_ERROR_MESSAGE: &str = "Invalid sentence, try again (system error)";

/// A successful, normalized classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedText {
    /// Trimmed input.
    pub text: String,
    pub sentiment: SentimentLabel,
    /// Confidence in `[0, 1]`.
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ClassificationOutcome {
    Error { message: String },
    Success(ClassifiedText),
}

impl ClassificationOutcome {
    fn invalid_sentence() -> Self {
        ClassificationOutcome::Error {
            message: INVALID_SENTENCE_MESSAGE.to_string(),
        }
    }

    fn system_error() -> Self {
        ClassificationOutcome::Error {
            message: SYSTEM_ERROR_MESSAGE.to_string(),
        }
    }
}

/// Trim surrounding whitespace.
pub fn preprocess(raw_text: &str) -> &str {
    raw_text.trim()
}

/// Classify one snippet of text.
pub fn classify<M>(model: &M, raw_text: &str) -> ClassificationOutcome
where
    M: SentimentModel + ?Sized,
{
    let clean_text = preprocess(raw_text);
    let char_count = clean_text.chars().count();

    if char_count < MIN_TEXT_CHARS {
        crate::log_debug!("Rejected input of {char_count} chars");
        return ClassificationOutcome::invalid_sentence();
    }

    match run_model(model, clean_text) {
        Ok(prediction) => {
            let sentiment = SentimentLabel::from_model_label(&prediction.label);
            if sentiment == SentimentLabel::Unknown {
                crate::log_warn!("Model returned unmapped label '{}'", prediction.label);
            }
            crate::log_debug!(
                "Classified {char_count} chars as {sentiment} ({:.3})",
                prediction.score
            );
            ClassificationOutcome::Success(ClassifiedText {
                text: clean_text.to_string(),
                sentiment,
                score: prediction.score,
            })
        }
        Err(err) => {
            crate::log_error!("Sentiment model failed: {err}");
            ClassificationOutcome::system_error()
        }
    }
}

fn run_model<M>(model: &M, text: &str) -> Result<RawPrediction, ModelError>
where
    M: SentimentModel + ?Sized,
{
    let prediction = panic::catch_unwind(AssertUnwindSafe(|| model.predict(text)))
        .map_err(|payload| ModelError::Inference(panic_message(payload.as_ref())))??;

    if !prediction.score.is_finite() || !(0.0..=1.0).contains(&prediction.score) {
        return Err(ModelError::Inference(format!(
            "score {} outside [0, 1]",
            prediction.score
        )));
    }

    Ok(prediction)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("model panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("model panicked: {message}")
    } else {
        "model panicked".to_string()
    }
}
