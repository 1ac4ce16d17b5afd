use crate::{Error, Result};
use chrono::Duration;
use dumpscope_engine::{BucketWidths, Thresholds, ViewOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "DUMPSCOPE_CONFIG";

/// Resolve the config file path based on priority:
/// 1. Explicit path (with tilde expansion)
/// 2. DUMPSCOPE_CONFIG environment variable (with tilde expansion)
/// 3. Platform config directory, e.g. ~/.config/dumpscope/config.toml
pub fn resolve_config_path(explicit_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(expand_tilde(path));
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        return Ok(expand_tilde(&env_path));
    }

    if let Some(config_dir) = dirs::config_dir() {
        return Ok(config_dir.join("dumpscope").join("config.toml"));
    }

    Err(Error::Config(
        "Could not determine config path: no platform config directory found".to_string(),
    ))
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    PathBuf::from(path)
}

/// Trend bucket widths in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketSecs {
    pub thread: u64,
    pub heap: u64,
    pub log: u64,
    pub query: u64,
}

impl Default for BucketSecs {
    fn default() -> Self {
        Self {
            thread: 300,
            heap: 300,
            log: 900,
            query: 900,
        }
    }
}

/// `[views.utilization]`: heap regions and thread pools. Missing keys fall
/// back to the built-in 60/80 split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UtilizationThresholds {
    pub warning_percent: f64,
    pub critical_percent: f64,
}

impl Default for UtilizationThresholds {
    fn default() -> Self {
        let t = ViewOptions::default().utilization;
        Self {
            warning_percent: t.warning_percent,
            critical_percent: t.critical_percent,
        }
    }
}

/// `[views.error_rate]`: share of ERROR log entries. Missing keys fall back
/// to the built-in 1/5 split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorRateThresholds {
    pub warning_percent: f64,
    pub critical_percent: f64,
}

impl Default for ErrorRateThresholds {
    fn default() -> Self {
        let t = ViewOptions::default().error_rate;
        Self {
            warning_percent: t.warning_percent,
            critical_percent: t.critical_percent,
        }
    }
}

impl From<UtilizationThresholds> for Thresholds {
    fn from(t: UtilizationThresholds) -> Self {
        Thresholds {
            warning_percent: t.warning_percent,
            critical_percent: t.critical_percent,
        }
    }
}

impl From<ErrorRateThresholds> for Thresholds {
    fn from(t: ErrorRateThresholds) -> Self {
        Thresholds {
            warning_percent: t.warning_percent,
            critical_percent: t.critical_percent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewsConfig {
    pub top_n: usize,
    pub max_trend_buckets: usize,
    pub slow_query_ms: f64,
    pub bucket_secs: BucketSecs,
    pub utilization: UtilizationThresholds,
    pub error_rate: ErrorRateThresholds,
}

impl Default for ViewsConfig {
    fn default() -> Self {
        let defaults = ViewOptions::default();
        Self {
            top_n: defaults.top_n,
            max_trend_buckets: defaults.max_trend_buckets,
            slow_query_ms: defaults.slow_query_ms,
            bucket_secs: BucketSecs::default(),
            utilization: UtilizationThresholds::default(),
            error_rate: ErrorRateThresholds::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub views: ViewsConfig,
}

impl Config {
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.check()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn default_path() -> Result<PathBuf> {
        resolve_config_path(None)
    }

    /// Reject settings the composer cannot work with
    pub fn check(&self) -> Result<()> {
        let views = &self.views;
        if views.top_n == 0 {
            return Err(Error::Config("views.top_n must be at least 1".to_string()));
        }
        if views.max_trend_buckets == 0 {
            return Err(Error::Config(
                "views.max_trend_buckets must be at least 1".to_string(),
            ));
        }
        if !views.slow_query_ms.is_finite() || views.slow_query_ms < 0.0 {
            return Err(Error::Config(
                "views.slow_query_ms must be a non-negative number".to_string(),
            ));
        }
        let b = views.bucket_secs;
        if [b.thread, b.heap, b.log, b.query].contains(&0) {
            return Err(Error::Config(
                "views.bucket_secs entries must be at least 1".to_string(),
            ));
        }
        for (name, t) in [
            ("utilization", Thresholds::from(views.utilization)),
            ("error_rate", Thresholds::from(views.error_rate)),
        ] {
            if t.warning_percent > t.critical_percent {
                return Err(Error::Config(format!(
                    "views.{}: warning_percent exceeds critical_percent",
                    name
                )));
            }
        }
        Ok(())
    }

    pub fn to_view_options(&self) -> ViewOptions {
        let views = &self.views;
        let secs = |s: u64| {
            Duration::seconds(i64::try_from(s).unwrap_or(i64::MAX).min(i64::MAX / 1000))
        };
        ViewOptions {
            top_n: views.top_n,
            bucket_widths: BucketWidths {
                thread: secs(views.bucket_secs.thread),
                heap: secs(views.bucket_secs.heap),
                log: secs(views.bucket_secs.log),
                query: secs(views.bucket_secs.query),
            },
            max_trend_buckets: views.max_trend_buckets,
            slow_query_ms: views.slow_query_ms,
            utilization: views.utilization.into(),
            error_rate: views.error_rate.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_matches_view_options() {
        assert_eq!(Config::default().to_view_options(), ViewOptions::default());
    }

    #[test]
    fn test_config_save_and_load() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.views.top_n = 10;
        config.views.bucket_secs.log = 60;
        config.save_to(&config_path)?;
        assert!(config_path.exists());

        let loaded = Config::load_from(&config_path)?;
        assert_eq!(loaded, config);
        assert_eq!(
            loaded.to_view_options().bucket_widths.log,
            Duration::minutes(1)
        );
        Ok(())
    }

    #[test]
    fn test_partial_file_keeps_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, "[views]\nslow_query_ms = 250.0\n")?;

        let loaded = Config::load_from(&config_path)?;
        assert_eq!(loaded.views.slow_query_ms, 250.0);
        assert_eq!(loaded.views.top_n, 5);
        assert_eq!(loaded.views.bucket_secs, BucketSecs::default());
        Ok(())
    }

    #[test]
    fn test_partial_threshold_table_keeps_other_bound() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(&config_path, "[views.utilization]\nwarning_percent = 70.0\n")?;

        let options = Config::load_from(&config_path)?.to_view_options();
        assert_eq!(options.utilization.warning_percent, 70.0);
        assert_eq!(
            options.utilization.critical_percent,
            ViewOptions::default().utilization.critical_percent
        );
        assert_eq!(options.error_rate, ViewOptions::default().error_rate);

        std::fs::write(&config_path, "[views.error_rate]\ncritical_percent = 10.0\n")?;
        let options = Config::load_from(&config_path)?.to_view_options();
        assert_eq!(options.error_rate.warning_percent, 1.0);
        assert_eq!(options.error_rate.critical_percent, 10.0);
        assert_eq!(options.utilization, ViewOptions::default().utilization);
        Ok(())
    }

    #[test]
    fn test_load_nonexistent_returns_default() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config = Config::load_from(&temp_dir.path().join("missing.toml"))?;
        assert_eq!(config, Config::default());
        Ok(())
    }

    #[test]
    fn test_inverted_thresholds_rejected() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            "[views.utilization]\nwarning_percent = 90.0\ncritical_percent = 80.0\n",
        )?;

        let err = Config::load_from(&config_path).unwrap_err();
        assert!(err.to_string().contains("views.utilization"));
        Ok(())
    }

    #[test]
    fn test_explicit_path_wins() -> Result<()> {
        let path = resolve_config_path(Some("/tmp/custom.toml"))?;
        assert_eq!(path, PathBuf::from("/tmp/custom.toml"));
        Ok(())
    }
}
