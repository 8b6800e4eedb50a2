//! Layered configuration and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` +
//! `config.<env>.toml` + `APP_*` env vars (`__` separates nested keys, e.g.
//! `APP_PATHS__MODEL`). Every file is optional; with nothing present the
//! defaults reproduce the fixed model/input/output paths.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::types::Pooling;

pub const DEFAULT_MODEL_PATH: &str = "bge-base-en-v1.5-f32.gguf";
pub const DEFAULT_INPUT_PATH: &str = "documents.json";
pub const DEFAULT_OUTPUT_PATH: &str = "preprocessed_documents.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub paths: PathsConfig,
    pub encoder: EncoderConfig,
    /// Swap the real model for the deterministic hashed embedder.
    pub use_fake_embeddings: bool,
    /// Emit a progress line every N documents.
    pub progress_every: usize,
    /// Draw an interactive progress bar on stderr as well.
    pub progress_bar: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    pub model: String,
    pub input: String,
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Upper bound on tokens per forward pass.
    pub context_size: usize,
    /// Width the model is expected to produce; a mismatch only warns.
    pub expected_dim: usize,
    /// Overrides the pooling type recorded in the model file.
    pub pooling: Option<Pooling>,
    pub normalize: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig {
                model: DEFAULT_MODEL_PATH.to_string(),
                input: DEFAULT_INPUT_PATH.to_string(),
                output: DEFAULT_OUTPUT_PATH.to_string(),
            },
            encoder: EncoderConfig::default(),
            use_fake_embeddings: false,
            progress_every: 100,
            progress_bar: false,
        }
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self { context_size: 512, expected_dim: 768, pooling: None, normalize: false }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::from_figment(Self::figment(&env_name))
    }

    /// The merged provider stack for a given environment name.
    pub fn figment(env_name: &str) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment.merge(Env::prefixed("APP_").split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract().map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.encoder.context_size == 0 {
            return Err(Error::InvalidConfig("encoder.context_size must be positive".into()));
        }
        if self.encoder.expected_dim == 0 {
            return Err(Error::InvalidConfig("encoder.expected_dim must be positive".into()));
        }
        if self.progress_every == 0 {
            return Err(Error::InvalidConfig("progress_every must be positive".into()));
        }
        Ok(())
    }

    pub fn model_path(&self) -> PathBuf { expand_path(&self.paths.model) }
    pub fn input_path(&self) -> PathBuf { expand_path(&self.paths.input) }
    pub fn output_path(&self) -> PathBuf { expand_path(&self.paths.output) }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
