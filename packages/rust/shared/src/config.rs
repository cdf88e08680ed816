//! Application configuration for PitchLens.
//!
//! User config lives at `~/.pitchlens/pitchlens.toml`.
//! CLI flags override config file values, which override defaults.
//! API keys are never stored here, only the names of the environment
//! variables that hold them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PitchLensError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "pitchlens.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".pitchlens";

// ---------------------------------------------------------------------------
// Config structs (matching pitchlens.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub deep_research: DeepResearchConfig,

    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub platform: PlatformConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Where rendered reports are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Where uploaded pitch decks are saved.
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            uploads_dir: default_uploads_dir(),
        }
    }
}

fn default_output_dir() -> String {
    "./outputs".into()
}
fn default_uploads_dir() -> String {
    "./uploads".into()
}

/// `[llm]` section. Any OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_llm_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_llm_key_env(),
            base_url: default_llm_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

fn default_llm_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_llm_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_model() -> String {
    "openai/gpt-4o".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_llm_timeout() -> u64 {
    120
}

/// Which web search backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchProvider {
    #[default]
    Serper,
    Serpapi,
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub provider: SearchProvider,

    #[serde(default = "default_serper_key_env")]
    pub serper_api_key_env: String,

    #[serde(default = "default_serpapi_key_env")]
    pub serpapi_api_key_env: String,

    /// Override the provider's endpoint (tests, proxies).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_results_per_query")]
    pub results_per_query: u32,

    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: SearchProvider::default(),
            serper_api_key_env: default_serper_key_env(),
            serpapi_api_key_env: default_serpapi_key_env(),
            base_url: None,
            results_per_query: default_results_per_query(),
            timeout_secs: default_search_timeout(),
        }
    }
}

impl SearchConfig {
    /// Env var name for the selected provider's key.
    pub fn api_key_env(&self) -> &str {
        match self.provider {
            SearchProvider::Serper => &self.serper_api_key_env,
            SearchProvider::Serpapi => &self.serpapi_api_key_env,
        }
    }
}

fn default_serper_key_env() -> String {
    "SERPER_API_KEY".into()
}
fn default_serpapi_key_env() -> String {
    "SERPAPI_API_KEY".into()
}
fn default_results_per_query() -> u32 {
    5
}
fn default_search_timeout() -> u64 {
    60
}

/// `[deep_research]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeepResearchConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_tavily_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_tavily_base_url")]
    pub base_url: String,

    /// Seconds between status polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Polls before giving up.
    #[serde(default = "default_max_polls")]
    pub max_polls: u32,

    /// Per-request HTTP timeout.
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

impl Default for DeepResearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key_env: default_tavily_key_env(),
            base_url: default_tavily_base_url(),
            poll_interval_secs: default_poll_interval(),
            max_polls: default_max_polls(),
            timeout_secs: default_search_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_tavily_key_env() -> String {
    "TAVILY_API_KEY".into()
}
fn default_tavily_base_url() -> String {
    "https://api.tavily.com".into()
}
fn default_poll_interval() -> u64 {
    40
}
fn default_max_polls() -> u32 {
    18
}

/// `[site]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_site_timeout")]
    pub timeout_secs: u64,

    /// Main content is truncated to this many characters.
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,

    /// Allow fetching loopback/private addresses.
    #[serde(default)]
    pub allow_private_hosts: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_site_timeout(),
            max_content_chars: default_max_content_chars(),
            allow_private_hosts: false,
        }
    }
}

fn default_site_timeout() -> u64 {
    30
}
fn default_max_content_chars() -> usize {
    15_000
}

/// `[platform]` section. The platform is disabled while `base_url` is unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// API root, e.g. `https://platform.example.com/v1/api`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_platform_key_env")]
    pub api_key_env: String,

    #[serde(default)]
    pub organization_id: String,

    #[serde(default)]
    pub program_id: String,

    #[serde(default)]
    pub evaluation_stage_id: String,

    /// Thesis name (e.g. `HEALTHCARE`) → platform thesis UUID.
    #[serde(default)]
    pub thesis_ids: BTreeMap<String, String>,

    #[serde(default = "default_site_timeout")]
    pub timeout_secs: u64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key_env: default_platform_key_env(),
            organization_id: String::new(),
            program_id: String::new(),
            evaluation_stage_id: String::new(),
            thesis_ids: BTreeMap::new(),
            timeout_secs: default_site_timeout(),
        }
    }
}

fn default_platform_key_env() -> String {
    "PLATFORM_API_KEY".into()
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8000".into()
}
fn default_max_upload_bytes() -> usize {
    25 * 1024 * 1024
}

// ---------------------------------------------------------------------------
// Secrets
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Read a non-empty secret from the named env var.
    pub fn api_key(env_name: &str) -> Option<String> {
        std::env::var(env_name).ok().filter(|v| !v.trim().is_empty())
    }
}

/// Read the LLM API key or explain which variable to set.
pub fn validate_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.llm.api_key_env;
    AppConfig::api_key(var_name).ok_or_else(|| {
        PitchLensError::config(format!(
            "LLM API key not found. Set the {var_name} environment variable."
        ))
    })
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.pitchlens/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PitchLensError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.pitchlens/pitchlens.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PitchLensError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| PitchLensError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file. An existing file is left alone.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    init_config_in(&dir)
}

fn init_config_in(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| PitchLensError::io(dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    if path.exists() {
        return Err(PitchLensError::config(format!(
            "{} already exists",
            path.display()
        )));
    }

    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| PitchLensError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PitchLensError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
