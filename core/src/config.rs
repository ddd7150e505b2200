use serde::{Deserialize, Serialize};
use std::path::Path;

/// Gradient-boosted regressor hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegressorConfig {
    pub n_estimators:      usize,
    pub learning_rate:     f64,
    pub max_depth:         usize,
    pub min_samples_split: usize,
    pub min_samples_leaf:  usize,
}

impl Default for RegressorConfig {
    fn default() -> Self {
        Self {
            n_estimators:      100,
            learning_rate:     0.1,
            max_depth:         3,
            min_samples_split: 2,
            min_samples_leaf:  1,
        }
    }
}

/// Isolation forest hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnomalyConfig {
    pub n_trees:       usize,
    pub max_samples:   usize,
    /// Expected share of outliers in the training population.
    pub contamination: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            n_trees:       100,
            max_samples:   256,
            contamination: 0.03,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrendConfig {
    /// Profiles sampled per domain.
    pub sample_cap:         usize,
    /// Trailing trajectory points used for the slope.
    pub window:             usize,
    pub emerging_threshold: f64,
    /// Slope is per month; growth rate is reported per year.
    pub periods_per_year:   f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            sample_cap:         100,
            window:             6,
            emerging_threshold: 0.5,
            periods_per_year:   12.0,
        }
    }
}

/// Demand index for one domain in the market-intelligence report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DomainDemand {
    pub domain: String,
    pub demand: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    pub seed:                      u64,
    /// Rows generated when no dataset file exists.
    pub synthetic_population:      usize,
    /// Months of trajectory generated per synthetic profile.
    pub synthetic_history_months:  usize,
    /// Below this many profiles the alerts report a low data volume.
    pub low_data_volume_threshold: usize,
    pub regions:                   Vec<String>,
    pub domains:                   Vec<String>,
    pub regressor:                 RegressorConfig,
    pub anomaly:                   AnomalyConfig,
    pub trend:                     TrendConfig,
    pub market_demand:             Vec<DomainDemand>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed:                      42,
            synthetic_population:      1000,
            synthetic_history_months:  24,
            low_data_volume_threshold: 1000,
            regions: [
                "Maharashtra", "Karnataka", "Punjab", "Bihar",
                "Tamil Nadu", "Gujarat", "Kerala", "Uttar Pradesh",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            domains: ["Technology", "Agriculture", "Business"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            regressor: RegressorConfig::default(),
            anomaly:   AnomalyConfig::default(),
            trend:     TrendConfig::default(),
            market_demand: [
                ("Technology", 90.0),
                ("Data & Research", 85.0),
                ("Skilled Trades", 80.0),
                ("Agriculture", 75.0),
                ("Business", 70.0),
                ("Creative", 65.0),
                ("Social Impact", 60.0),
                ("Healthcare", 88.0),
                ("Education", 72.0),
                ("Craft & Artisan", 50.0),
            ]
            .iter()
            .map(|(domain, demand)| DomainDemand { domain: domain.to_string(), demand: *demand })
            .collect(),
        }
    }
}

impl EngineConfig {
    /// Load from the data/ directory.
    /// In tests, use EngineConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/engine/engine_config.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: EngineConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Load when the config file exists, otherwise fall back to defaults.
    pub fn load_or_default(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/engine/engine_config.json");
        if Path::new(&path).exists() {
            Self::load(data_dir)
        } else {
            log::warn!("No engine config at {path}; using built-in defaults");
            Ok(Self::default())
        }
    }

    /// Small, fast configuration for unit and integration tests.
    pub fn default_test() -> Self {
        Self {
            seed:                      7,
            synthetic_population:      200,
            synthetic_history_months:  12,
            low_data_volume_threshold: 1000,
            regressor: RegressorConfig {
                n_estimators: 30,
                ..RegressorConfig::default()
            },
            anomaly: AnomalyConfig {
                n_trees: 50,
                ..AnomalyConfig::default()
            },
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Checked by `load`, by every profile source and by engine start-up.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.regions.is_empty() {
            anyhow::bail!("config must list at least one region");
        }
        if self.domains.is_empty() {
            anyhow::bail!("config must list at least one domain");
        }
        if !(0.0..0.5).contains(&self.anomaly.contamination) {
            anyhow::bail!(
                "anomaly.contamination must be in [0, 0.5), got {}",
                self.anomaly.contamination
            );
        }
        if self.trend.window == 0 {
            anyhow::bail!("trend.window must be positive");
        }
        Ok(())
    }
}
