use std::sync::OnceLock;

use super::error::ModelError;
use super::transformer::RobertaSentimentModel;
use crate::settings::ModelSettings;

static SHARED_MODEL: OnceLock<RobertaSentimentModel> = OnceLock::new();

/// The process-wide model, loaded on first call and reused afterwards.
///
/// Settings passed after the first successful load are ignored.
pub fn shared_model(settings: &ModelSettings) -> Result<&'static RobertaSentimentModel, ModelError> {
    if let Some(model) = SHARED_MODEL.get() {
        return Ok(model);
    }

    let model = RobertaSentimentModel::load(settings)?;
    Ok(SHARED_MODEL.get_or_init(|| model))
}
