//! Configuration for the engine

use crate::math;
use serde::{Deserialize, Serialize};

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Account that holds deposited collateral and pulled synthetic tokens
    pub custody_account: String,

    /// Solvency and liquidation parameters
    pub risk: RiskConfig,

    /// Oracle configuration
    pub oracle: OracleConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "collateral-engine".to_string(),
            custody_account: "collateral-engine".to_string(),
            risk: RiskConfig::default(),
            oracle: OracleConfig::default(),
        }
    }
}

/// Solvency and liquidation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Share of collateral value counted towards solvency
    pub liquidation_threshold: u64,

    /// Bonus share of seized collateral paid to the liquidator
    pub liquidation_bonus: u64,

    /// Denominator for threshold and bonus
    pub liquidation_precision: u64,

    /// Minimum solvent health factor (18 decimals)
    pub min_health_factor: u128,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            liquidation_threshold: math::LIQUIDATION_THRESHOLD, // 200% overcollateralized
            liquidation_bonus: math::LIQUIDATION_BONUS,         // 10% bonus
            liquidation_precision: math::LIQUIDATION_PRECISION,
            min_health_factor: math::MIN_HEALTH_FACTOR,
        }
    }
}

/// Oracle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Maximum age of a price round (seconds)
    pub stale_after_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            stale_after_secs: math::STALE_AFTER_SECS,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(account) = std::env::var("ENGINE_CUSTODY_ACCOUNT") {
            config.custody_account = account;
        }

        if let Ok(secs) = std::env::var("ENGINE_STALE_AFTER_SECS") {
            config.oracle.stale_after_secs = parse_env("ENGINE_STALE_AFTER_SECS", &secs)?;
        }

        if let Ok(threshold) = std::env::var("ENGINE_LIQUIDATION_THRESHOLD") {
            config.risk.liquidation_threshold =
                parse_env("ENGINE_LIQUIDATION_THRESHOLD", &threshold)?;
        }

        if let Ok(bonus) = std::env::var("ENGINE_LIQUIDATION_BONUS") {
            config.risk.liquidation_bonus = parse_env("ENGINE_LIQUIDATION_BONUS", &bonus)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check parameter consistency
    pub fn validate(&self) -> crate::Result<()> {
        let risk = &self.risk;
        if risk.liquidation_precision == 0 {
            return Err(crate::Error::Config(
                "liquidation_precision must be non-zero".to_string(),
            ));
        }
        if risk.liquidation_threshold == 0
            || risk.liquidation_threshold > risk.liquidation_precision
        {
            return Err(crate::Error::Config(format!(
                "liquidation_threshold {} must be in 1..={}",
                risk.liquidation_threshold, risk.liquidation_precision
            )));
        }
        if risk.min_health_factor == 0 {
            return Err(crate::Error::Config(
                "min_health_factor must be non-zero".to_string(),
            ));
        }
        if self.oracle.stale_after_secs == 0 {
            return Err(crate::Error::Config(
                "stale_after_secs must be non-zero".to_string(),
            ));
        }
        if self.custody_account.is_empty() {
            return Err(crate::Error::Config("custody_account is empty".to_string()));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> crate::Result<T> {
    value
        .parse()
        .map_err(|_| crate::Error::Config(format!("Invalid value for {}: {}", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "collateral-engine");
        assert_eq!(config.risk.liquidation_threshold, 50);
        assert_eq!(config.risk.liquidation_bonus, 10);
        assert_eq!(config.risk.liquidation_precision, 100);
        assert_eq!(config.oracle.stale_after_secs, 10_800);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let mut config = Config::default();
        config.risk.liquidation_threshold = 150;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.risk.liquidation_precision = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_env() {
        std::env::set_var("ENGINE_CUSTODY_ACCOUNT", "env-vault");
        std::env::set_var("ENGINE_STALE_AFTER_SECS", "120");
        std::env::set_var("ENGINE_LIQUIDATION_BONUS", "7");

        let config = Config::from_env().unwrap();
        assert_eq!(config.custody_account, "env-vault");
        assert_eq!(config.oracle.stale_after_secs, 120);
        assert_eq!(config.risk.liquidation_bonus, 7);
        assert_eq!(config.risk.liquidation_threshold, 50);

        std::env::set_var("ENGINE_LIQUIDATION_THRESHOLD", "fifty");
        assert!(matches!(Config::from_env(), Err(crate::Error::Config(_))));

        std::env::set_var("ENGINE_LIQUIDATION_THRESHOLD", "101");
        assert!(matches!(Config::from_env(), Err(crate::Error::Config(_))));

        for name in [
            "ENGINE_CUSTODY_ACCOUNT",
            "ENGINE_STALE_AFTER_SECS",
            "ENGINE_LIQUIDATION_BONUS",
            "ENGINE_LIQUIDATION_THRESHOLD",
        ] {
            std::env::remove_var(name);
        }
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
service_name = "engine-test"
custody_account = "vault"

[risk]
liquidation_threshold = 50
liquidation_bonus = 5
liquidation_precision = 100
min_health_factor = 1000000000000000000

[oracle]
stale_after_secs = 60
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.custody_account, "vault");
        assert_eq!(config.risk.liquidation_bonus, 5);
        assert_eq!(config.oracle.stale_after_secs, 60);
    }
}
