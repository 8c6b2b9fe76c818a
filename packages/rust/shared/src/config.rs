//! Application configuration for knowledgepack.
//!
//! User config lives at `~/.knowledgepack/knowledgepack.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{KnowledgePackError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "knowledgepack.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".knowledgepack";

// ---------------------------------------------------------------------------
// Config structs (matching knowledgepack.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Consolidation engine sizing.
    #[serde(default)]
    pub consolidation: ConsolidationConfig,

    /// Output location.
    #[serde(default)]
    pub output: OutputConfig,

    /// Framework isolation switches.
    #[serde(default)]
    pub isolation: IsolationConfig,

    /// Known framework catalog.
    #[serde(default = "default_frameworks")]
    pub frameworks: Vec<FrameworkEntry>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            consolidation: ConsolidationConfig::default(),
            output: OutputConfig::default(),
            isolation: IsolationConfig::default(),
            frameworks: default_frameworks(),
        }
    }
}

/// `[consolidation]` section, consumed directly by the core.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsolidationConfig {
    /// Desired total number of output documents.
    #[serde(default = "default_target_file_count")]
    pub target_file_count: usize,

    /// Token floor below which a document counts as small.
    #[serde(default = "default_min_tokens")]
    pub min_tokens: usize,

    /// Advisory sweet spot; not enforced as a boundary.
    #[serde(default = "default_target_tokens")]
    pub target_tokens: usize,

    /// Token ceiling for greedy fills.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Similarity at or above which a hash match counts as a duplicate.
    #[serde(default = "default_dedup_threshold")]
    pub dedup_threshold: f64,

    /// Keep framework-captured fragments out of ordinary grouping.
    #[serde(default)]
    pub exclude_framework_fragments: bool,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            target_file_count: default_target_file_count(),
            min_tokens: default_min_tokens(),
            target_tokens: default_target_tokens(),
            max_tokens: default_max_tokens(),
            dedup_threshold: default_dedup_threshold(),
            exclude_framework_fragments: false,
        }
    }
}

impl ConsolidationConfig {
    /// Reject sizing combinations the mergers cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.target_file_count == 0 {
            return Err(KnowledgePackError::config(
                "target_file_count must be greater than zero",
            ));
        }
        if self.min_tokens == 0 {
            return Err(KnowledgePackError::config(
                "min_tokens must be greater than zero",
            ));
        }
        if self.min_tokens > self.target_tokens || self.target_tokens > self.max_tokens {
            return Err(KnowledgePackError::config(format!(
                "token band must satisfy min <= target <= max (got {} / {} / {})",
                self.min_tokens, self.target_tokens, self.max_tokens
            )));
        }
        if !(self.dedup_threshold > 0.0 && self.dedup_threshold <= 1.0) {
            return Err(KnowledgePackError::config(format!(
                "dedup_threshold must be in (0, 1], got {}",
                self.dedup_threshold
            )));
        }
        Ok(())
    }
}

fn default_target_file_count() -> usize {
    75
}
fn default_min_tokens() -> usize {
    2000
}
fn default_target_tokens() -> usize {
    3500
}
fn default_max_tokens() -> usize {
    5000
}
fn default_dedup_threshold() -> f64 {
    0.95
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output root for emitted files.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> String {
    "./output".into()
}

/// `[isolation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsolationConfig {
    /// Run framework isolation before consolidation.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Also name frameworks from textual patterns, not just the catalog.
    #[serde(default)]
    pub discover_patterns: bool,
}

impl Default for IsolationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            discover_patterns: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// `[[frameworks]]` entry: a known framework in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkEntry {
    /// Canonical name.
    pub name: String,
    /// Component names, in presentation order.
    #[serde(default)]
    pub components: Vec<String>,
    /// Alternate spellings that also identify the framework.
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl FrameworkEntry {
    fn new(name: &str, components: &[&str], aliases: &[&str]) -> Self {
        Self {
            name: name.into(),
            components: components.iter().map(|c| (*c).to_string()).collect(),
            aliases: aliases.iter().map(|a| (*a).to_string()).collect(),
        }
    }
}

fn default_frameworks() -> Vec<FrameworkEntry> {
    vec![
        FrameworkEntry::new(
            "3 E's",
            &["Energy", "Earnings", "Experience"],
            &["3Es", "Three E's", "The 3 E's Framework"],
        ),
        FrameworkEntry::new(
            "Daily Client Machine",
            &["Daily", "Consistent", "Pipeline"],
            &["DCM", "Client Machine"],
        ),
        FrameworkEntry::new(
            "Hybrid Offer",
            &["High-ticket", "Low-ticket", "Middle-ticket"],
            &["Hybrid Offer Framework"],
        ),
        FrameworkEntry::new(
            "Sovereign Consultant",
            &["Independence", "Expertise", "Positioning"],
            &["The Sovereign Consultant"],
        ),
        FrameworkEntry::new(
            "$100 Workshop",
            &["Entry", "Value", "Upsell"],
            &["100 Dollar Workshop", "Low-ticket Workshop"],
        ),
    ]
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.knowledgepack/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| KnowledgePackError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.knowledgepack/knowledgepack.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| KnowledgePackError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        KnowledgePackError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.consolidation.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| KnowledgePackError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| KnowledgePackError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| KnowledgePackError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
