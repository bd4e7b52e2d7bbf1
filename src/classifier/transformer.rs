//! RoBERTa-family sequence classifier running on candle.
//!
//! PhoBERT checkpoints (the default Vietnamese sentiment model) share the
//! RoBERTa weight layout, so the XLM-RoBERTa implementation from
//! `candle-transformers` runs them. Their tokenizer comes from the fastBPE
//! files.

use std::{collections::HashMap, path::PathBuf, time::Instant};

use candle_core::{DType, Device, Tensor, D};
use candle_nn::{ops::softmax, VarBuilder};
use candle_transformers::models::xlm_roberta::{
    Config, XLMRobertaForSequenceClassification,
};
use hf_hub::{api::sync::Api, Repo, RepoType};
use serde::Deserialize;

use super::error::ModelError;
use super::model::{RawPrediction, SentimentModel};
use super::tokenizer::{
    SentenceEncoder, TokenizerSource, BPE_CODES_FILE, BPE_VOCAB_FILE, FAST_TOKENIZER_FILE,
};
use crate::settings::ModelSettings;

const ENABLE_LOGS: bool = true;

/// RoBERTa reserves the first positions after the padding index.
const POSITION_OFFSET: usize = 2;

const CONFIG_FILE: &str = "config.json";
const SAFETENSORS_FILE: &str = "model.safetensors";
const PTH_WEIGHTS_FILE: &str = "pytorch_model.bin";

#[derive(Deserialize)]
struct ClassifierConfigJson {
    #[serde(default)]
    id2label: HashMap<String, String>,
}

#[derive(Debug, PartialEq)]
struct ModelFiles {
    config: PathBuf,
    tokenizer: TokenizerSource,
    weights: PathBuf,
}

pub struct RobertaSentimentModel {
    model: XLMRobertaForSequenceClassification,
    encoder: SentenceEncoder,
    device: Device,
    id2label: HashMap<u32, String>,
}

impl RobertaSentimentModel {
    /// Download (or reuse from the Hugging Face cache) and load the model.
    pub fn load(settings: &ModelSettings) -> Result<Self, ModelError> {
        let started = Instant::now();
        let device = settings.device.resolve()?;
        let files = fetch_model_files(&settings.repo_id, settings.revision.as_deref())?;

        let config_str = std::fs::read_to_string(&files.config)?;
        let config: Config = serde_json::from_str(&config_str)?;
        let id2label = parse_id2label(serde_json::from_str::<ClassifierConfigJson>(&config_str)?)?;

        let vb = if files.weights.extension().is_some_and(|e| e == "safetensors") {
            unsafe { VarBuilder::from_mmaped_safetensors(&[files.weights], DType::F32, &device)? }
        } else {
            VarBuilder::from_pth(&files.weights, DType::F32, &device)?
        };
        let model = XLMRobertaForSequenceClassification::new(id2label.len(), &config, vb)?;

        let encoder = SentenceEncoder::load(
            &files.tokenizer,
            config.max_position_embeddings.saturating_sub(POSITION_OFFSET),
            config.vocab_size,
        )?;

        crate::log_info!(
            "Loaded {} ({} labels) on {} in {:.1}s",
            settings.repo_id,
            id2label.len(),
            settings.device,
            started.elapsed().as_secs_f32()
        );

        Ok(Self {
            model,
            encoder,
            device,
            id2label,
        })
    }
}

impl SentimentModel for RobertaSentimentModel {
    fn predict(&self, text: &str) -> Result<RawPrediction, ModelError> {
        let encoded = self.encoder.encode(text)?;

        let input_ids = Tensor::new(encoded.ids.as_slice(), &self.device)?.unsqueeze(0)?;
        let attention_mask =
            Tensor::new(encoded.attention_mask.as_slice(), &self.device)?.unsqueeze(0)?;
        let token_type_ids = input_ids.zeros_like()?;

        let logits = self
            .model
            .forward(&input_ids, &attention_mask, &token_type_ids)?;
        let probs = softmax(&logits, D::Minus1)?.squeeze(0)?.to_vec1::<f32>()?;

        top_prediction(&probs, &self.id2label)
    }
}

/// Highest-probability class. An id outside `id2label` still yields a label
/// (`LABEL_<id>`); normalization maps it to UNKNOWN.
fn top_prediction(
    probs: &[f32],
    id2label: &HashMap<u32, String>,
) -> Result<RawPrediction, ModelError> {
    let (pred_id, score) = probs
        .iter()
        .copied()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .ok_or_else(|| ModelError::Inference("model produced no logits".into()))?;

    let label = u32::try_from(pred_id)
        .ok()
        .and_then(|id| id2label.get(&id).cloned())
        .unwrap_or_else(|| format!("LABEL_{pred_id}"));

    Ok(RawPrediction { label, score })
}

fn fetch_model_files(repo_id: &str, revision: Option<&str>) -> Result<ModelFiles, ModelError> {
    crate::log_info!("Fetching model files for {repo_id}");

    let api = Api::new()?;
    let repo = match revision {
        Some(rev) => Repo::with_revision(repo_id.to_string(), RepoType::Model, rev.to_string()),
        None => Repo::new(repo_id.to_string(), RepoType::Model),
    };
    let repo = api.repo(repo);

    let files = select_model_files(|name| Ok(repo.get(name)?))?;
    if let TokenizerSource::FastBpe { .. } = files.tokenizer {
        crate::log_info!(
            "{repo_id} has no {FAST_TOKENIZER_FILE}; using {BPE_VOCAB_FILE} + {BPE_CODES_FILE}"
        );
    }
    Ok(files)
}

/// Decide which repository files make up the model. `fetch` resolves one
/// file name to a local path and fails when the repository lacks it.
///
/// A fast tokenizer wins over the fastBPE pair; safetensors win over the
/// pickled weights.
fn select_model_files<F>(mut fetch: F) -> Result<ModelFiles, ModelError>
where
    F: FnMut(&str) -> Result<PathBuf, ModelError>,
{
    let config = fetch(CONFIG_FILE)?;

    let tokenizer = match fetch(FAST_TOKENIZER_FILE) {
        Ok(path) => TokenizerSource::Fast(path),
        Err(fast_err) => match (fetch(BPE_VOCAB_FILE), fetch(BPE_CODES_FILE)) {
            (Ok(vocab), Ok(codes)) => TokenizerSource::FastBpe { vocab, codes },
            _ => {
                return Err(ModelError::Download(format!(
                    "no usable tokenizer ({fast_err}; {BPE_VOCAB_FILE} + {BPE_CODES_FILE} unavailable)"
                )))
            }
        },
    };

    let weights = match fetch(SAFETENSORS_FILE) {
        Ok(path) => path,
        Err(_) => fetch(PTH_WEIGHTS_FILE)?,
    };

    Ok(ModelFiles {
        config,
        tokenizer,
        weights,
    })
}

fn parse_id2label(raw: ClassifierConfigJson) -> Result<HashMap<u32, String>, ModelError> {
    if raw.id2label.is_empty() {
        return Err(ModelError::Config(
            "config.json has no id2label; not a classification checkpoint".into(),
        ));
    }

    raw.id2label
        .into_iter()
        .map(|(id, label)| {
            id.parse::<u32>()
                .map(|id| (id, label))
                .map_err(|_| ModelError::Config(format!("non-numeric id2label key '{id}'")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SentimentLabel;

    fn labels(json: &str) -> Result<HashMap<u32, String>, ModelError> {
        parse_id2label(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn reads_phobert_label_table() {
        let table = labels(r#"{"id2label": {"0": "NEG", "1": "POS", "2": "NEU"}, "hidden_size": 768}"#)
            .unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table[&0], "NEG");
        assert_eq!(table[&1], "POS");
        assert_eq!(table[&2], "NEU");
    }

    #[test]
    fn missing_label_table_is_a_config_error() {
        assert!(matches!(labels(r#"{"hidden_size": 768}"#), Err(ModelError::Config(_))));
    }

    #[test]
    fn non_numeric_ids_are_rejected() {
        assert!(matches!(
            labels(r#"{"id2label": {"first": "POS"}}"#),
            Err(ModelError::Config(_))
        ));
    }

    fn label_table() -> HashMap<u32, String> {
        HashMap::from([
            (0, "NEG".to_string()),
            (1, "POS".to_string()),
            (2, "NEU".to_string()),
        ])
    }

    #[test]
    fn top_prediction_picks_highest_probability() {
        let prediction = top_prediction(&[0.1, 0.7, 0.2], &label_table()).unwrap();

        assert_eq!(prediction.label, "POS");
        assert_eq!(prediction.score, 0.7);
    }

    #[test]
    fn unlisted_class_id_falls_back_to_generic_label() {
        let prediction = top_prediction(&[0.1, 0.1, 0.1, 0.7], &label_table()).unwrap();

        assert_eq!(prediction.label, "LABEL_3");
        assert_eq!(
            SentimentLabel::from_model_label(&prediction.label),
            SentimentLabel::Unknown
        );
    }

    #[test]
    fn empty_logits_are_an_inference_error() {
        assert!(matches!(
            top_prediction(&[], &label_table()),
            Err(ModelError::Inference(_))
        ));
    }

    fn hub_with<'a>(
        files: &'a [&'a str],
    ) -> impl FnMut(&str) -> Result<PathBuf, ModelError> + 'a {
        move |name| {
            if files.iter().any(|file| *file == name) {
                Ok(PathBuf::from("/hub").join(name))
            } else {
                Err(ModelError::Download(format!("{name} not found")))
            }
        }
    }

    #[test]
    fn fast_tokenizer_and_safetensors_are_preferred() {
        let files = select_model_files(hub_with(&[
            "config.json",
            "tokenizer.json",
            "vocab.txt",
            "bpe.codes",
            "model.safetensors",
            "pytorch_model.bin",
        ]))
        .unwrap();

        assert_eq!(
            files,
            ModelFiles {
                config: PathBuf::from("/hub/config.json"),
                tokenizer: TokenizerSource::Fast(PathBuf::from("/hub/tokenizer.json")),
                weights: PathBuf::from("/hub/model.safetensors"),
            }
        );
    }

    #[test]
    fn phobert_layout_uses_fastbpe_files() {
        let files = select_model_files(hub_with(&[
            "config.json",
            "vocab.txt",
            "bpe.codes",
            "pytorch_model.bin",
        ]))
        .unwrap();

        assert_eq!(
            files.tokenizer,
            TokenizerSource::FastBpe {
                vocab: PathBuf::from("/hub/vocab.txt"),
                codes: PathBuf::from("/hub/bpe.codes"),
            }
        );
        assert_eq!(files.weights, PathBuf::from("/hub/pytorch_model.bin"));
    }

    #[test]
    fn repository_without_any_tokenizer_is_rejected() {
        let result = select_model_files(hub_with(&["config.json", "vocab.txt", "pytorch_model.bin"]));

        assert!(matches!(result, Err(ModelError::Download(_))));
    }

    #[test]
    fn repository_without_weights_is_rejected() {
        let result = select_model_files(hub_with(&["config.json", "tokenizer.json"]));

        assert!(matches!(result, Err(ModelError::Download(_))));
    }
}
