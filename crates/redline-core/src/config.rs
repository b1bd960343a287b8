//! Redline Configuration Management
//!
//! Handles configuration from environment variables and TOML files with
//! defaults that work without any LLM provider.

use crate::{Perspective, RiskLevel};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Risk engine and report configuration
    pub risk: RiskConfig,

    /// Clause segmentation tuning
    pub segmentation: SegmentationConfig,

    /// Concurrency and caching
    pub pipeline: PipelineConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        self.apply_env()?;
        Ok(self)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        // LLM
        if let Ok(enabled) = std::env::var("LLM_ENABLED") {
            self.llm.enabled = parse_bool("LLM_ENABLED", &enabled)?;
        }
        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            self.llm.provider = provider.parse()?;
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.llm.openai_api_key = Some(key);
        }
        if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
            self.llm.openai_base_url = Some(url);
        }
        if let Ok(url) = std::env::var("OLLAMA_URL") {
            self.llm.ollama_url = url;
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(secs) = env_parse("LLM_TIMEOUT_SECS")? {
            self.llm.timeout_secs = secs;
        }

        // Risk
        if let Some(threshold) = env_parse("HIGH_RISK_THRESHOLD")? {
            self.risk.high_risk_threshold = threshold;
        }
        if let Some(threshold) = env_parse("MEDIUM_RISK_THRESHOLD")? {
            self.risk.medium_risk_threshold = threshold;
        }
        if let Ok(perspective) = std::env::var("DEFAULT_PERSPECTIVE") {
            self.risk.default_perspective =
                perspective
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: "DEFAULT_PERSPECTIVE".to_string(),
                        value: perspective.clone(),
                    })?;
        }
        if let Ok(level) = std::env::var("EXPLANATION_THRESHOLD") {
            self.risk.explanation_threshold =
                level.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "EXPLANATION_THRESHOLD".to_string(),
                    value: level.clone(),
                })?;
        }

        // Segmentation and pipeline
        if let Some(min) = env_parse("MIN_ALNUM_CHARS")? {
            self.segmentation.min_alnum_chars = min;
        }
        if let Some(max) = env_parse("MAX_CONCURRENCY")? {
            self.pipeline.max_concurrency = max;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(json) = std::env::var("LOG_JSON") {
            self.logging.json_format = parse_bool("LOG_JSON", &json)?;
        }

        Ok(())
    }

    /// Check cross-field consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.risk.medium_risk_threshold >= self.risk.high_risk_threshold {
            return Err(ConfigError::InvalidValue {
                key: "MEDIUM_RISK_THRESHOLD".to_string(),
                value: format!(
                    "{} (must be below HIGH_RISK_THRESHOLD {})",
                    self.risk.medium_risk_threshold, self.risk.high_risk_threshold
                ),
            });
        }
        if self.risk.high_risk_threshold > 100 {
            return Err(ConfigError::InvalidValue {
                key: "HIGH_RISK_THRESHOLD".to_string(),
                value: self.risk.high_risk_threshold.to_string(),
            });
        }
        if self.pipeline.max_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                key: "MAX_CONCURRENCY".to_string(),
                value: "0".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.segmentation.max_non_printable_ratio) {
            return Err(ConfigError::InvalidValue {
                key: "segmentation.max_non_printable_ratio".to_string(),
                value: self.segmentation.max_non_printable_ratio.to_string(),
            });
        }
        if self.llm.enabled {
            if self.llm.timeout_secs == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "LLM_TIMEOUT_SECS".to_string(),
                    value: "0".to_string(),
                });
            }
            if matches!(self.llm.provider, LlmProvider::OpenAI | LlmProvider::Azure)
                && self.llm.openai_api_key.is_none()
            {
                return Err(ConfigError::MissingRequired("OPENAI_API_KEY".to_string()));
            }
        }
        Ok(())
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Use the LLM for explanations; template fallback otherwise
    pub enabled: bool,

    /// LLM provider to use
    pub provider: LlmProvider,

    /// OpenAI API key
    pub openai_api_key: Option<String>,

    /// OpenAI API base URL (for Azure or compatible APIs)
    pub openai_base_url: Option<String>,

    /// Ollama server URL
    pub ollama_url: String,

    /// Model name to use
    pub model: String,

    /// Maximum tokens for completion
    pub max_tokens: u32,

    /// Temperature for generation
    pub temperature: f32,

    /// Per-call timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: LlmProvider::OpenAI,
            openai_api_key: None,
            openai_base_url: None,
            ollama_url: "http://localhost:11434".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 512,
            temperature: 0.1,
            timeout_secs: 20,
        }
    }
}

/// Supported LLM providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAI,
    Ollama,
    Azure,
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            "azure" => Ok(Self::Azure),
            _ => Err(ConfigError::InvalidValue {
                key: "LLM_PROVIDER".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Numeric limits read by threshold predicates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClauseThresholds {
    /// Notice periods shorter than this are flagged
    pub min_notice_days: u32,

    /// Liability caps below this amount are flagged
    pub min_liability_cap: f64,

    /// Non-compete durations longer than this are flagged
    pub max_non_compete_months: u32,

    /// Confidentiality terms longer than this are flagged
    pub max_confidentiality_years: u32,
}

impl Default for ClauseThresholds {
    fn default() -> Self {
        Self {
            min_notice_days: 30,
            min_liability_cap: 50_000.0,
            max_non_compete_months: 12,
            max_confidentiality_years: 5,
        }
    }
}

/// Selects one field of [`ClauseThresholds`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdKey {
    NoticeDays,
    LiabilityCap,
    NonCompeteMonths,
    ConfidentialityYears,
}

impl ClauseThresholds {
    /// Amount limit for `AmountBelow` predicates
    pub fn amount(&self, key: ThresholdKey) -> Option<f64> {
        match key {
            ThresholdKey::LiabilityCap => Some(self.min_liability_cap),
            _ => None,
        }
    }

    /// Limit in days for duration predicates
    pub fn days(&self, key: ThresholdKey) -> Option<u32> {
        match key {
            ThresholdKey::NoticeDays => Some(self.min_notice_days),
            ThresholdKey::NonCompeteMonths => Some(self.max_non_compete_months.saturating_mul(30)),
            ThresholdKey::ConfidentialityYears => {
                Some(self.max_confidentiality_years.saturating_mul(365))
            }
            ThresholdKey::LiabilityCap => None,
        }
    }
}

/// Per-perspective threshold overrides (`[risk.perspective_thresholds.vendor]`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PerspectiveThresholds {
    pub vendor: Option<ClauseThresholds>,
    pub buyer: Option<ClauseThresholds>,
    pub employer: Option<ClauseThresholds>,
    pub employee: Option<ClauseThresholds>,
    pub disclosing: Option<ClauseThresholds>,
    pub receiving: Option<ClauseThresholds>,
}

impl PerspectiveThresholds {
    pub fn get(&self, perspective: Perspective) -> Option<&ClauseThresholds> {
        match perspective {
            Perspective::Vendor => self.vendor.as_ref(),
            Perspective::Buyer => self.buyer.as_ref(),
            Perspective::Employer => self.employer.as_ref(),
            Perspective::Employee => self.employee.as_ref(),
            Perspective::Disclosing => self.disclosing.as_ref(),
            Perspective::Receiving => self.receiving.as_ref(),
        }
    }

    fn standard() -> Self {
        let base = ClauseThresholds::default();
        Self {
            vendor: Some(ClauseThresholds {
                min_notice_days: 60,
                ..base
            }),
            buyer: Some(ClauseThresholds {
                min_liability_cap: 100_000.0,
                ..base
            }),
            employee: Some(ClauseThresholds {
                max_non_compete_months: 6,
                ..base
            }),
            ..Self::default()
        }
    }
}

/// Risk engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Contract score at or above which `score_level` is HIGH
    pub high_risk_threshold: u32,

    /// Contract score at or above which `score_level` is MEDIUM
    pub medium_risk_threshold: u32,

    /// Score points per HIGH clause
    pub high_clause_points: u32,

    /// Score points per MEDIUM clause
    pub medium_clause_points: u32,

    /// Clauses at or above this level get an explanation
    pub explanation_threshold: RiskLevel,

    /// Perspective used when a request does not name one
    pub default_perspective: Perspective,

    /// Default numeric thresholds
    pub thresholds: ClauseThresholds,

    /// Perspective overrides of `thresholds`
    pub perspective_thresholds: PerspectiveThresholds,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            high_risk_threshold: 75,
            medium_risk_threshold: 40,
            high_clause_points: 25,
            medium_clause_points: 10,
            explanation_threshold: RiskLevel::Medium,
            default_perspective: Perspective::Receiving,
            thresholds: ClauseThresholds::default(),
            perspective_thresholds: PerspectiveThresholds::standard(),
        }
    }
}

impl RiskConfig {
    /// Thresholds in effect for a perspective
    pub fn thresholds_for(&self, perspective: Perspective) -> ClauseThresholds {
        self.perspective_thresholds
            .get(perspective)
            .copied()
            .unwrap_or(self.thresholds)
    }
}

/// Segmentation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Minimum alphanumeric characters in a document
    pub min_alnum_chars: usize,

    /// Minimum heading hits for a heading strategy
    pub min_heading_hits: usize,

    /// Minimum heading hits per non-empty line
    pub min_heading_hit_rate: f64,

    /// Spans above this non-printable ratio become unreadable
    pub max_non_printable_ratio: f64,

    /// Fragments below this word count attach to a neighbour
    pub min_fragment_words: usize,

    /// Highest accepted top-level clause number
    pub max_clause_number: u32,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            min_alnum_chars: 50,
            min_heading_hits: 2,
            min_heading_hit_rate: 0.05,
            max_non_printable_ratio: 0.8,
            min_fragment_words: 3,
            max_clause_number: 99,
        }
    }
}

/// Pipeline concurrency configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Concurrent per-clause tasks
    pub max_concurrency: usize,

    /// Cached LLM explanations
    pub cache_capacity: u64,

    /// Cache entry time-to-live in seconds
    pub cache_ttl_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            cache_capacity: 1000,
            cache_ttl_secs: 3600,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,

    /// Include file/line in logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_location: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(!config.llm.enabled);
        assert_eq!(config.risk.high_risk_threshold, 75);
        assert_eq!(config.risk.medium_risk_threshold, 40);
        assert_eq!(config.risk.explanation_threshold, RiskLevel::Medium);
        assert_eq!(config.segmentation.min_alnum_chars, 50);
        assert_eq!(config.pipeline.max_concurrency, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_llm_provider_parse() {
        assert_eq!(
            "openai".parse::<LlmProvider>().unwrap(),
            LlmProvider::OpenAI
        );
        assert_eq!(
            "ollama".parse::<LlmProvider>().unwrap(),
            LlmProvider::Ollama
        );
        assert!("invalid".parse::<LlmProvider>().is_err());
    }

    #[test]
    fn test_perspective_thresholds() {
        let risk = RiskConfig::default();
        assert_eq!(risk.thresholds_for(Perspective::Vendor).min_notice_days, 60);
        assert_eq!(
            risk.thresholds_for(Perspective::Buyer).min_liability_cap,
            100_000.0
        );
        assert_eq!(
            risk.thresholds_for(Perspective::Receiving),
            ClauseThresholds::default()
        );
    }

    #[test]
    fn test_threshold_keys() {
        let thresholds = ClauseThresholds::default();
        assert_eq!(thresholds.days(ThresholdKey::NoticeDays), Some(30));
        assert_eq!(thresholds.days(ThresholdKey::NonCompeteMonths), Some(360));
        assert_eq!(thresholds.days(ThresholdKey::LiabilityCap), None);
        assert_eq!(thresholds.amount(ThresholdKey::LiabilityCap), Some(50_000.0));
    }

    #[test]
    fn test_validate_rejects_inverted_thresholds() {
        let mut config = AppConfig::default();
        config.risk.medium_risk_threshold = 80;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_validate_requires_api_key() {
        let mut config = AppConfig::default();
        config.llm.enabled = true;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired(_))
        ));

        config.llm.provider = LlmProvider::Ollama;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[risk]
explanation_threshold = "HIGH"
default_perspective = "vendor"

[risk.thresholds]
min_notice_days = 45

[pipeline]
max_concurrency = 2
"#
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.risk.explanation_threshold, RiskLevel::High);
        assert_eq!(config.risk.default_perspective, Perspective::Vendor);
        assert_eq!(config.risk.thresholds.min_notice_days, 45);
        assert_eq!(config.risk.thresholds.min_liability_cap, 50_000.0);
        assert_eq!(config.pipeline.max_concurrency, 2);
        assert_eq!(config.segmentation.min_alnum_chars, 50);
    }

    #[test]
    fn test_from_file_missing() {
        let result = AppConfig::from_file("/nonexistent/redline.toml");
        assert!(matches!(result, Err(ConfigError::FileReadError { .. })));
    }
}
