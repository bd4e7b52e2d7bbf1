use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::classifier::DeviceSetting;

const ENABLE_LOGS: bool = true;

pub const DEFAULT_MODEL_REPO: &str = "wonrax/phobert-base-vietnamese-sentiment";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelSettings {
    /// Hugging Face repository holding `config.json`, a tokenizer and weights.
    pub repo_id: String,
    pub revision: Option<String>,
    pub device: DeviceSetting,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            repo_id: DEFAULT_MODEL_REPO.into(),
            revision: None,
            device: DeviceSetting::Cpu,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct UserSettings {
    model: ModelSettings,
}

/// `settings.json` in the data directory.
pub struct SettingsStore {
    path: PathBuf,
    data: UserSettings,
}

impl SettingsStore {
    /// Read settings, writing defaults first if the file does not exist yet.
    pub fn new(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            let store = Self {
                path,
                data: UserSettings::default(),
            };
            store.persist()?;
            crate::log_info!("Wrote default settings to {}", store.path.display());
            return Ok(store);
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let data = match serde_json::from_str(&contents) {
            Ok(data) => data,
            Err(err) => {
                crate::log_warn!(
                    "Ignoring unreadable settings in {}: {err}; using defaults",
                    path.display()
                );
                UserSettings::default()
            }
        };

        Ok(Self { path, data })
    }

    pub fn model(&self) -> ModelSettings {
        self.data.model.clone()
    }

    pub fn update_model(&mut self, settings: ModelSettings) -> Result<()> {
        self.data.model = settings;
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        let serialized = serde_json::to_string_pretty(&self.data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
