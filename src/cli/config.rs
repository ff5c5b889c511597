use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::error::ForgeError;
use crate::generation::model_client::{
    DEFAULT_ENDPOINT, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE,
    DEFAULT_TIMEOUT_SECS, ModelConfig,
};

pub const DEFAULT_CONFIG_FILE: &str = "scenario-forge.yaml";
pub const DEFAULT_LOG_PATH: &str = "logs/runs.jsonl";
pub const DEFAULT_OUTPUT_DIR: &str = "generated";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const ENDPOINT_ENV: &str = "SCENARIO_FORGE_ENDPOINT";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "scenario-forge",
    version,
    about = "Turn plain-English test scenarios into validated test documents"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Chat-completions endpoint
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Model identifier
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Sampling temperature
    #[arg(long, global = true)]
    pub temperature: Option<f32>,

    /// Path to config file (default: scenario-forge.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Run log path (JSON lines)
    #[arg(long, global = true)]
    pub log_path: Option<String>,

    /// Do not append run records to the run log
    #[arg(long, global = true)]
    pub no_log: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate one test document from a scenario
    Generate {
        /// Plain-English scenario
        scenario: String,

        /// Output format (see `formats`)
        #[arg(short, long, default_value = "native")]
        format: String,

        /// Force environment.base_url on the generated document
        #[arg(long)]
        base_url: Option<String>,

        /// Comma-separated tags to request
        #[arg(long)]
        tags: Option<String>,

        /// Variable offered to the model, as name=value (repeatable)
        #[arg(long = "var")]
        vars: Vec<String>,

        /// Reject unknown fields
        #[arg(long)]
        strict: bool,

        /// Also write the rendered output to this file
        #[arg(short, long)]
        output: Option<String>,

        /// Use this file's content as the model response instead of calling the endpoint
        #[arg(long)]
        replay: Option<String>,
    },

    /// Generate one file per scenario listed in a text file
    Batch {
        /// File with one scenario per line (blank lines and # comments skipped)
        file: String,

        #[arg(short, long, default_value = "native")]
        format: String,

        /// Output directory (default: output.dir from config)
        #[arg(short, long)]
        output_dir: Option<String>,

        #[arg(long)]
        base_url: Option<String>,

        #[arg(long)]
        tags: Option<String>,

        #[arg(long = "var")]
        vars: Vec<String>,

        #[arg(long)]
        strict: bool,

        #[arg(long)]
        replay: Option<String>,
    },

    /// Validate an existing native JSON document
    Validate {
        file: String,

        #[arg(long)]
        strict: bool,
    },

    /// Render an existing native JSON document in another format
    Convert {
        file: String,

        #[arg(short, long)]
        format: String,

        #[arg(short, long)]
        output: Option<String>,

        #[arg(long)]
        strict: bool,
    },

    /// List supported output formats
    Formats,
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `scenario-forge.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub model: ModelSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelSection {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: Option<u64>,
    /// Name of the environment variable holding the API key
    pub api_key_env: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSection {
    #[serde(default = "default_log_path")]
    pub log_path: String,

    #[serde(default = "default_true")]
    pub log_runs: bool,

    #[serde(default = "default_output_dir")]
    pub dir: String,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            log_path: default_log_path(),
            log_runs: true,
            dir: default_output_dir(),
        }
    }
}

// Serde default helpers
fn default_log_path() -> String { DEFAULT_LOG_PATH.to_string() }
fn default_output_dir() -> String { DEFAULT_OUTPUT_DIR.to_string() }
fn default_true() -> bool { true }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file.
///
/// A missing default file yields defaults. A missing file that was named
/// explicitly, or a malformed one, is a `Config` error.
pub fn load_config(path: Option<&str>) -> Result<AppConfig, ForgeError> {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_FILE);
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content)
            .map_err(|e| ForgeError::Config(format!("{}: {}", config_path, e))),
        Err(e) if path.is_none() && e.kind() == std::io::ErrorKind::NotFound => {
            Ok(AppConfig::default())
        }
        Err(e) => Err(ForgeError::Config(format!("{}: {}", config_path, e))),
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// Resolve model settings: CLI > config file > environment > defaults.
pub fn resolve_model_config(cli: &Cli, config: &AppConfig) -> ModelConfig {
    resolve_model_config_with(cli, config, |key| std::env::var(key).ok())
}

/// Same as [`resolve_model_config`] with an injectable environment lookup.
pub fn resolve_model_config_with<F>(cli: &Cli, config: &AppConfig, env: F) -> ModelConfig
where
    F: Fn(&str) -> Option<String>,
{
    let section = &config.model;

    let endpoint = cli
        .endpoint
        .clone()
        .or_else(|| section.endpoint.clone())
        .or_else(|| env(ENDPOINT_ENV))
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

    let model = cli
        .model
        .clone()
        .or_else(|| section.model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let temperature = cli
        .temperature
        .or(section.temperature)
        .unwrap_or(DEFAULT_TEMPERATURE);

    let key_env = section.api_key_env.as_deref().unwrap_or(DEFAULT_API_KEY_ENV);

    ModelConfig {
        endpoint,
        model,
        temperature,
        max_tokens: section.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        timeout: Duration::from_secs(section.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        api_key: env(key_env).filter(|k| !k.is_empty()),
    }
}

/// Where run records go, or `None` when run logging is off.
pub fn resolve_log_path(cli: &Cli, config: &AppConfig) -> Option<String> {
    if cli.no_log || !config.output.log_runs {
        return None;
    }
    Some(
        cli.log_path
            .clone()
            .unwrap_or_else(|| config.output.log_path.clone()),
    )
}
