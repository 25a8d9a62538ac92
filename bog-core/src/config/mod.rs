//! Configuration System
//!
//! The YAML document (§6) is the single runtime source for everything the
//! spec names as configurable: which quote generator runs, which venues to
//! connect to, and the generator's own parameters (`total_orders`,
//! `max_position`, `minimum_spread`, `take_profit`, `liquidation_timer`,
//! `generation_interval`). [`profiles`] layers a handful of pre-built
//! [`Config`] values (development/staging/production) on top for the common
//! deployer cases, following the teacher's own `ConfigProfile` convenience
//! pattern.
//!
//! ## Runtime document
//!
//! ```yaml
//! quote_generator: sandbox
//! exchanges:
//!   hyperliquid:
//!     symbol: BTC-PERP
//!     type: trading
//! parameters:
//!   sandbox:
//!     total_orders: 10
//!     max_position: 5000
//!     minimum_spread: 5
//!     take_profit: 10
//!     liquidation_timer: 60000
//!     generation_interval: 250
//! ```
//!
//! `max_position` and `total_orders` are the only keys with no default; a
//! document missing either is a fatal load error (§6).

pub mod profiles;
pub mod types;

pub use profiles::{ConfigProfile, ProfileName};
pub use types::*;

use crate::core::errors::ConfigError;
use std::path::Path;

impl Config {
    /// Load and validate a YAML configuration document from `path` (§6).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))?;
        Self::from_yaml(&raw)
    }

    /// Parse and validate a YAML document already read into memory.
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load("config/default.yaml")
    }

    /// Validate configuration values: the matching `parameters.<qg>` section
    /// is present, and `max_position`/`total_orders` (the only keys the spec
    /// names as unconditionally required) are positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.exchanges.is_empty() {
            return Err(ConfigError::MissingRequired("exchanges"));
        }

        let (max_position, total_orders) = match self.quote_generator {
            QuoteGeneratorKind::Sandbox => {
                let p = self
                    .parameters
                    .sandbox
                    .as_ref()
                    .ok_or(ConfigError::MissingRequired("parameters.sandbox"))?;
                (p.max_position, Some(p.total_orders))
            }
            QuoteGeneratorKind::Plain => {
                let p = self
                    .parameters
                    .plain
                    .as_ref()
                    .ok_or(ConfigError::MissingRequired("parameters.plain"))?;
                (p.max_position, None)
            }
            QuoteGeneratorKind::Stinky => {
                let p = self
                    .parameters
                    .stinky
                    .as_ref()
                    .ok_or(ConfigError::MissingRequired("parameters.stinky"))?;
                (p.max_position, None)
            }
        };

        if max_position <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "max_position",
                reason: "must be positive".into(),
            });
        }
        if let Some(total_orders) = total_orders {
            if total_orders == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "total_orders",
                    reason: "must be positive".into(),
                });
            }
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.metrics.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "metrics.log_level",
                reason: format!("must be one of {valid_log_levels:?}"),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
quote_generator: sandbox
exchanges:
  hyperliquid:
    symbol: BTC-PERP
    type: trading
parameters:
  sandbox:
    total_orders: 10
    max_position: 5000
"#;

    #[test]
    fn minimal_document_loads_with_defaults() {
        let config = Config::from_yaml(MINIMAL).unwrap();
        assert_eq!(config.quote_generator, QuoteGeneratorKind::Sandbox);
        let sandbox = config.parameters.sandbox.unwrap();
        assert_eq!(sandbox.total_orders, 10);
        assert_eq!(sandbox.minimum_spread, 5.0); // default
        assert_eq!(sandbox.liquidation_timer, 60_000); // default
    }

    #[test]
    fn missing_parameters_section_is_fatal() {
        let raw = r#"
quote_generator: plain
exchanges:
  hyperliquid:
    symbol: BTC-PERP
    type: trading
parameters: {}
"#;
        let err = Config::from_yaml(raw).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired("parameters.plain")));
    }

    #[test]
    fn zero_max_position_is_rejected() {
        let raw = r#"
quote_generator: sandbox
exchanges:
  hyperliquid:
    symbol: BTC-PERP
    type: trading
parameters:
  sandbox:
    total_orders: 10
    max_position: 0
"#;
        let err = Config::from_yaml(raw).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "max_position", .. }));
    }

    #[test]
    fn no_exchanges_is_fatal() {
        let raw = r#"
quote_generator: sandbox
exchanges: {}
parameters:
  sandbox:
    total_orders: 10
    max_position: 5000
"#;
        let err = Config::from_yaml(raw).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired("exchanges")));
    }
}
