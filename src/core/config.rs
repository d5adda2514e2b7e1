use super::quote::Quote;
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PairConfig {
    /// Pair identifier as understood by the provider, e.g. "CAD-BRL"
    pub pair: String,
    /// Title shown before the first quote arrives
    pub title: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            base_url: "https://economia.awesomeapi.com.br".to_string(),
            api_key: None,
        }
    }
}

fn default_pairs() -> Vec<PairConfig> {
    [
        ("CAD-BRL", "Dólar Canadense"),
        ("ARS-BRL", "Peso Argentino"),
        ("GBP-BRL", "Libra Esterlina"),
    ]
    .into_iter()
    .map(|(pair, title)| PairConfig {
        pair: pair.to_string(),
        title: title.to_string(),
    })
    .collect()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    /// Lifetime of the cached quotes, also the polling period
    pub cache_ttl_secs: u64,
    pub data_path: Option<String>,
    pub provider: ProviderConfig,
    pub pairs: Vec<PairConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            cache_ttl_secs: 180,
            data_path: None,
            provider: ProviderConfig::default(),
            pairs: default_pairs(),
        }
    }
}

impl AppConfig {
    /// Loads the config from its default location, falling back to built-in defaults
    /// when no config file has been created yet.
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("br", "quotewatch", "quotewatch")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("br", "quotewatch", "quotewatch")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache_ttl_secs == 0 {
            bail!("cache_ttl_secs must be greater than zero");
        }
        if self.pairs.is_empty() {
            bail!("At least one currency pair must be configured");
        }
        if let Some(pair) = self.pairs.iter().find(|p| p.pair.trim().is_empty()) {
            bail!("Currency pair for '{}' is empty", pair.title);
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Title-only quotes, one per configured pair, in configured order.
    pub fn initial_quotes(&self) -> Vec<Quote> {
        self.pairs
            .iter()
            .map(|p| Quote::placeholder(&p.title))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").expect("Failed to deserialize");

        assert_eq!(config.cache_ttl(), Duration::from_millis(180_000));
        assert_eq!(
            config.provider.base_url,
            "https://economia.awesomeapi.com.br"
        );
        assert!(config.provider.api_key.is_none());
        assert!(config.data_path.is_none());

        let titles: Vec<String> = config.initial_quotes().into_iter().map(|q| q.title).collect();
        assert_eq!(
            titles,
            vec!["Dólar Canadense", "Peso Argentino", "Libra Esterlina"]
        );
        assert!(config.initial_quotes().iter().all(|q| q.code.is_none()
            && q.current_value.is_none()
            && q.variation.is_none()
            && q.updated.is_none()));
    }

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
cache_ttl_secs: 60
data_path: "/tmp/quotewatch"
provider:
  base_url: "http://example.com/quotes"
  api_key: "secret"
pairs:
  - pair: "USD-BRL"
    title: "Dólar Americano"
  - pair: "EUR-BRL"
    title: "Euro"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");

        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
        assert_eq!(
            config.default_data_path().unwrap(),
            PathBuf::from("/tmp/quotewatch")
        );
        assert_eq!(config.provider.base_url, "http://example.com/quotes");
        assert_eq!(config.provider.api_key.as_deref(), Some("secret"));
        assert_eq!(config.pairs.len(), 2);
        assert_eq!(config.pairs[1].pair, "EUR-BRL");
        assert_eq!(config.initial_quotes()[0].title, "Dólar Americano");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_ttl_and_empty_pairs() {
        let zero_ttl = AppConfig {
            cache_ttl_secs: 0,
            ..AppConfig::default()
        };
        assert!(zero_ttl.validate().is_err());

        let no_pairs = AppConfig {
            pairs: vec![],
            ..AppConfig::default()
        };
        assert!(no_pairs.validate().is_err());

        let blank_pair = AppConfig {
            pairs: vec![PairConfig {
                pair: " ".to_string(),
                title: "Nada".to_string(),
            }],
            ..AppConfig::default()
        };
        assert!(blank_pair.validate().is_err());
    }

    #[test]
    fn test_load_from_path_reports_invalid_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::write(file.path(), "cache_ttl_secs: 0\n").unwrap();

        let err = AppConfig::load_from_path(file.path()).unwrap_err();

        assert!(err.to_string().contains("Invalid config file"));
    }
}
