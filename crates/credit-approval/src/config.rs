//! Classifier server configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub host: String,
    pub port: u16,
    /// JSON export of the trained ensemble
    pub model_path: PathBuf,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
            model_path: PathBuf::from("./model/et_model.json"),
        }
    }
}

impl ClassifierConfig {
    /// Defaults overlaid with `HOST`, `PORT` and `MODEL_PATH`
    pub fn load() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("HOST") {
            self.host = v;
        }
        if let Some(v) = var("PORT") {
            self.port = v
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("Invalid value for PORT: {}", v)))?;
        }
        if let Some(v) = var("MODEL_PATH") {
            self.model_path = PathBuf::from(v);
        }
        Ok(())
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
