use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::aggregator::ScoreAggregator;
use crate::core::evaluators::{DistanceEvaluator, PriceBands, PriceEvaluator};
use crate::core::membership::ConfigurationError;
use crate::core::pipeline::RankingPipeline;
use crate::core::transport::{ModeBands, TransportAccessibilityEvaluator};
use crate::models::{ScoringWeights, TransportMode};

/// Environment variable naming a configuration file to load instead of `config/`
pub const CONFIG_PATH_ENV: &str = "CASA_CONFIG";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub ranking: RankingSettings,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub history: HistorySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingSettings {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Drop listings outside the stated location, budget or room count before scoring
    #[serde(default)]
    pub hard_filters: bool,
    pub fetch_limit: Option<usize>,
}

impl Default for RankingSettings {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            timeout_ms: default_timeout_ms(),
            hard_filters: false,
            fetch_limit: None,
        }
    }
}

fn default_limit() -> usize { 10 }
fn default_max_limit() -> usize { 50 }
fn default_timeout_ms() -> u64 { 2000 }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightsConfig,
    #[serde(default = "default_budget_tolerance")]
    pub budget_tolerance: f64,
    #[serde(default)]
    pub price_bands: PriceBands,
    /// Per-mode overrides of the accessibility band upper bounds, in metres
    #[serde(default)]
    pub transport_bands: Vec<TransportBandsConfig>,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            weights: WeightsConfig::default(),
            budget_tolerance: default_budget_tolerance(),
            price_bands: PriceBands::default(),
            transport_bands: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportBandsConfig {
    pub mode: TransportMode,
    pub upper_bounds_m: [f64; 4],
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_price_weight")]
    pub price: f64,
    #[serde(default = "default_rooms_weight")]
    pub rooms: f64,
    #[serde(default = "default_amenities_weight")]
    pub amenities: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            price: default_price_weight(),
            rooms: default_rooms_weight(),
            amenities: default_amenities_weight(),
        }
    }
}

impl From<WeightsConfig> for ScoringWeights {
    fn from(weights: WeightsConfig) -> Self {
        ScoringWeights {
            price: weights.price,
            rooms: weights.rooms,
            amenities: weights.amenities,
        }
    }
}

fn default_price_weight() -> f64 { 0.30 }
fn default_rooms_weight() -> f64 { 0.20 }
fn default_amenities_weight() -> f64 { 0.50 }
fn default_budget_tolerance() -> f64 { PriceEvaluator::DEFAULT_TOLERANCE }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySettings {
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,
    #[serde(default = "default_snapshot_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_favorite_locations")]
    pub favorite_locations: usize,
    #[serde(default = "default_max_users")]
    pub max_users: u64,
    #[serde(default = "default_user_idle")]
    pub idle_secs: u64,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            capacity: default_history_capacity(),
            ttl_secs: default_snapshot_ttl(),
            refresh_interval_secs: default_refresh_interval(),
            favorite_locations: default_favorite_locations(),
            max_users: default_max_users(),
            idle_secs: default_user_idle(),
        }
    }
}

fn default_history_capacity() -> usize { 500 }
fn default_snapshot_ttl() -> u64 { 600 }
fn default_refresh_interval() -> u64 { 60 }
fn default_favorite_locations() -> usize { 3 }
fn default_max_users() -> u64 { crate::services::history::DEFAULT_MAX_USERS }
fn default_user_idle() -> u64 { crate::services::history::DEFAULT_USER_IDLE_SECS }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration files (config/default.toml, config/local.toml)
    /// 3. Environment variables (prefixed with CASA__)
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("config/default").required(false))
            // Development overrides
            .add_source(File::with_name("config/local").required(false))
            // e.g., CASA__SCORING__WEIGHTS__PRICE -> scoring.weights.price
            .add_source(environment())
            .build()?
            .try_deserialize()
    }

    /// Load from the file named by `CASA_CONFIG` when set, otherwise as [`load`](Self::load)
    pub fn load_configured() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::load_from(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?
            .try_deserialize()
    }

    /// Parse settings from TOML text, without environment overrides
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Check that the scoring configuration can build a working engine
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.build_pipeline().map(|_| ())
    }

    /// Build the ranking pipeline described by the scoring and ranking sections
    pub fn build_pipeline(&self) -> Result<RankingPipeline, ConfigurationError> {
        let weights = &self.scoring.weights;
        for (name, value) in [
            ("price", weights.price),
            ("rooms", weights.rooms),
            ("amenities", weights.amenities),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigurationError::InvalidWeight { name, value });
            }
        }

        for (name, value) in [
            ("default_limit", self.ranking.default_limit),
            ("max_limit", self.ranking.max_limit),
        ] {
            if value == 0 {
                return Err(ConfigurationError::InvalidParameter { name, value: 0.0 });
            }
        }

        let price = PriceEvaluator::new(&self.scoring.price_bands, self.scoring.budget_tolerance)?;
        let bands = self
            .scoring
            .transport_bands
            .iter()
            .map(|b| ModeBands::new(b.mode, b.upper_bounds_m))
            .collect::<Result<Vec<_>, _>>()?;
        let transport = TransportAccessibilityEvaluator::with_bands(bands);

        Ok(RankingPipeline::new(
            ScoreAggregator::new(price),
            DistanceEvaluator::new(transport),
            (*weights).into(),
        )
        .with_default_limit(self.ranking.default_limit.min(self.ranking.max_limit)))
    }
}

fn environment() -> Environment {
    Environment::with_prefix("CASA")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
