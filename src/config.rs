// src/config.rs
use crate::constants::{DEFAULT_MACRO_TIMEOUT, MAX_CONCURRENT_MACROS, MAX_INCLUDE_DEPTH};
use crate::engine::{FallbackStrategy, ProcessingContext, RegistrationPolicy};
use crate::error::ConversionError;
use crate::types::{PageId, SpaceKey};
use clap::Parser;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Parsed and validated command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// Storage-format file to convert; omit when fetching via --page-id
    pub input_file: Option<PathBuf>,

    /// Convert a live page by id instead of a local file
    #[arg(long)]
    pub page_id: Option<String>,

    /// Confluence base URL; defaults to $CONFLUENCE_BASE_URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// API token for the Confluence REST API; defaults to $CONFLUENCE_API_TOKEN
    #[arg(long)]
    pub api_token: Option<String>,

    /// Space key recorded in the processing context
    #[arg(long)]
    pub space: Option<String>,

    /// Output file for the converted Markdown (defaults to stdout)
    #[arg(short, long)]
    pub output_file: Option<PathBuf>,

    /// Pipe mode - print only the converted document, no report
    #[arg(short = 'p', long, default_value_t = false)]
    pub pipe: bool,

    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// JSON config file with engine settings
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Maximum include recursion depth
    #[arg(long)]
    pub depth: Option<u8>,

    /// Per-macro timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Process sibling macros concurrently
    #[arg(long, default_value_t = false)]
    pub concurrent: bool,

    /// Drop unknown macros instead of preserving their markup
    #[arg(long, default_value_t = false)]
    pub drop_unknown: bool,
}

/// Engine configuration: validated and ready to drive conversions.
///
/// Loaded from a JSON file, then overridden by CLI flags. Every field
/// has a working default so the engine runs with no configuration at
/// all.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ConversionConfig {
    /// When set, only these macro types may register.
    pub enabled_macros: Option<Vec<String>>,
    /// Types that may not register; wins over `enabled_macros`.
    pub disabled_macros: Vec<String>,
    /// Types rejected outright, before any other policy.
    pub blacklisted_macros: Vec<String>,
    /// Strategy for macros with no per-type override.
    pub default_fallback: FallbackStrategy,
    /// Per-macro fallback strategy overrides.
    pub per_macro_fallback: HashMap<String, FallbackStrategy>,
    /// Include expansion depth bound.
    pub max_recursion_depth: u8,
    /// Per-macro wall-clock budget in milliseconds.
    pub macro_timeout_ms: u64,
    /// Dispatch sibling macros concurrently.
    pub enable_concurrency: bool,
    /// Bound on concurrently processed siblings.
    pub max_concurrency: usize,
    /// Keep unknown macros' markup verbatim instead of degrading them.
    pub preserve_unknown_macros: bool,
    /// Free-form per-processor settings, keyed by macro type.
    pub processor_settings: HashMap<String, serde_json::Value>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        // Includes default to add-comment so depth/cycle/fetch failures
        // leave a visible placeholder naming the page, not a dead macro.
        let mut per_macro_fallback = HashMap::new();
        per_macro_fallback.insert("include".to_string(), FallbackStrategy::AddComment);

        Self {
            enabled_macros: None,
            disabled_macros: Vec::new(),
            blacklisted_macros: Vec::new(),
            default_fallback: FallbackStrategy::PreserveHtml,
            per_macro_fallback,
            max_recursion_depth: MAX_INCLUDE_DEPTH,
            macro_timeout_ms: DEFAULT_MACRO_TIMEOUT.as_millis() as u64,
            enable_concurrency: false,
            max_concurrency: num_cpus::get().clamp(2, MAX_CONCURRENT_MACROS),
            preserve_unknown_macros: true,
            processor_settings: HashMap::new(),
        }
    }
}

impl ConversionConfig {
    /// Load engine settings from a JSON file.
    pub fn load_file(path: &std::path::Path) -> Result<Self, ConversionError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Apply CLI overrides on top of file/default settings.
    pub fn apply_cli(mut self, cli: &CommandLineInput) -> Self {
        if let Some(depth) = cli.depth {
            self.max_recursion_depth = depth;
        }
        if let Some(timeout_ms) = cli.timeout_ms {
            self.macro_timeout_ms = timeout_ms;
        }
        if cli.concurrent {
            self.enable_concurrency = true;
        }
        if cli.drop_unknown {
            self.preserve_unknown_macros = false;
        }
        self
    }

    pub fn macro_timeout(&self) -> Duration {
        Duration::from_millis(self.macro_timeout_ms)
    }

    /// The registration policy slice of this configuration.
    pub fn registration_policy(&self) -> RegistrationPolicy {
        RegistrationPolicy {
            blacklist: self.blacklisted_macros.clone(),
            enabled: self.enabled_macros.clone(),
            disabled: self.disabled_macros.clone(),
        }
    }

    /// Root processing context for a page under this configuration.
    pub fn make_context(&self, page_id: PageId, space_key: Option<SpaceKey>) -> ProcessingContext {
        let mut ctx = ProcessingContext::new(page_id)
            .with_timeout(self.macro_timeout())
            .with_concurrency(self.enable_concurrency);
        if let Some(space_key) = space_key {
            ctx = ctx.with_space_key(space_key);
        }
        ctx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_usable_without_configuration() {
        let config = ConversionConfig::default();
        assert_eq!(config.max_recursion_depth, MAX_INCLUDE_DEPTH);
        assert!(config.preserve_unknown_macros);
        assert_eq!(
            config.per_macro_fallback.get("include"),
            Some(&FallbackStrategy::AddComment)
        );
    }

    #[test]
    fn deserializes_kebab_case_settings() {
        let json = r#"{
            "disabled-macros": ["chart"],
            "default-fallback": "add-comment",
            "max-recursion-depth": 3,
            "enable-concurrency": true
        }"#;
        let config: ConversionConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.disabled_macros, vec!["chart"]);
        assert_eq!(config.default_fallback, FallbackStrategy::AddComment);
        assert_eq!(config.max_recursion_depth, 3);
        assert!(config.enable_concurrency);
        // Unspecified fields keep their defaults.
        assert!(config.preserve_unknown_macros);
    }

    #[test]
    fn context_carries_timeout_and_concurrency() {
        let mut config = ConversionConfig::default();
        config.macro_timeout_ms = 1234;
        config.enable_concurrency = true;

        let ctx = config.make_context(PageId::parse("1").unwrap(), None);
        assert_eq!(ctx.timeout, Duration::from_millis(1234));
        assert!(ctx.concurrency_enabled);
    }
}
