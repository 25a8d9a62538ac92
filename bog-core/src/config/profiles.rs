//! Configuration profiles for different environments
//!
//! Provides pre-built [`Config`] values for the cases a deployer commonly
//! wants without hand-writing a YAML document: local development against
//! [`crate::venue::simulated::SimulatedVenueClient`], a staging-sized sandbox
//! run, and a tighter production profile. All three still validate via
//! [`Config::validate`].

use super::types::*;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileName {
    Development,
    Staging,
    Production,
}

impl ProfileName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Some(Self::Development),
            "staging" | "stage" => Some(Self::Staging),
            "prod" | "production" => Some(Self::Production),
            _ => None,
        }
    }
}

pub struct ConfigProfile;

impl ConfigProfile {
    fn exchanges(symbol: &str) -> HashMap<String, ExchangeConfig> {
        let mut map = HashMap::new();
        map.insert(
            "simulated".to_string(),
            ExchangeConfig {
                symbol: symbol.to_string(),
                kind: ExchangeKind::Trading,
            },
        );
        map
    }

    /// Relaxed limits, verbose logging, the sandbox generator against the
    /// simulated venue.
    pub fn development() -> Config {
        Config {
            quote_generator: QuoteGeneratorKind::Sandbox,
            exchanges: Self::exchanges("BTC-PERP"),
            parameters: ParametersConfig {
                sandbox: Some(SandboxParameters {
                    total_orders: 4,
                    max_position: 0.1,
                    minimum_spread: 10.0,
                    take_profit: 15.0,
                    liquidation_timer: 120_000,
                    generation_interval: 250,
                    tick_size: 0.01,
                }),
                plain: None,
                stinky: None,
            },
            metrics: MetricsConfig {
                log_level: "debug".to_string(),
                ..MetricsConfig::default()
            },
            monitoring: MonitoringConfig::default(),
            alerts: AlertConfig {
                console_min_severity: "Info".to_string(),
                rate_limit_secs: 10,
                ..AlertConfig::default()
            },
        }
    }

    /// Production-sized limits with the sandbox generator's full ladder.
    pub fn staging() -> Config {
        Config {
            quote_generator: QuoteGeneratorKind::Sandbox,
            exchanges: Self::exchanges("BTC-PERP"),
            parameters: ParametersConfig {
                sandbox: Some(SandboxParameters {
                    total_orders: 10,
                    max_position: 0.5,
                    minimum_spread: 5.0,
                    take_profit: 10.0,
                    liquidation_timer: 60_000,
                    generation_interval: 250,
                    tick_size: 0.01,
                }),
                plain: None,
                stinky: None,
            },
            metrics: MetricsConfig {
                json_logs: true,
                ..MetricsConfig::default()
            },
            monitoring: MonitoringConfig {
                metrics_addr: "0.0.0.0:9090".to_string(),
                ..MonitoringConfig::default()
            },
            alerts: AlertConfig::default(),
        }
    }

    /// Strict limits, `warn`-level logging, the full alert set.
    pub fn production() -> Config {
        Config {
            quote_generator: QuoteGeneratorKind::Sandbox,
            exchanges: Self::exchanges("BTC-PERP"),
            parameters: ParametersConfig {
                sandbox: Some(SandboxParameters {
                    total_orders: 20,
                    max_position: 1.0,
                    minimum_spread: 3.0,
                    take_profit: 8.0,
                    liquidation_timer: 60_000,
                    generation_interval: 200,
                    tick_size: 0.01,
                }),
                plain: None,
                stinky: None,
            },
            metrics: MetricsConfig {
                log_level: "warn".to_string(),
                json_logs: true,
                ..MetricsConfig::default()
            },
            monitoring: MonitoringConfig {
                metrics_addr: "0.0.0.0:9090".to_string(),
                journal_path: "/var/lib/bog/execution.jsonl".into(),
                ..MonitoringConfig::default()
            },
            alerts: AlertConfig {
                console_min_severity: "Error".to_string(),
                alert_log_path: "/var/log/bog/alerts.log".into(),
                webhook_output: true,
                webhook_url: Some("https://hooks.pagerduty.com/production-critical".to_string()),
                ..AlertConfig::default()
            },
        }
    }

    pub fn load(profile: ProfileName) -> Config {
        match profile {
            ProfileName::Development => Self::development(),
            ProfileName::Staging => Self::staging(),
            ProfileName::Production => Self::production(),
        }
    }

    /// Load profile from environment variable `BOG_PROFILE`.
    pub fn from_env() -> Config {
        let profile = std::env::var("BOG_PROFILE")
            .ok()
            .and_then(|s| ProfileName::from_str(&s))
            .unwrap_or(ProfileName::Development);
        Self::load(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_name_from_str() {
        assert_eq!(ProfileName::from_str("dev"), Some(ProfileName::Development));
        assert_eq!(ProfileName::from_str("production"), Some(ProfileName::Production));
        assert_eq!(ProfileName::from_str("invalid"), None);
    }

    #[test]
    fn all_profiles_validate() {
        assert!(ConfigProfile::development().validate().is_ok());
        assert!(ConfigProfile::staging().validate().is_ok());
        assert!(ConfigProfile::production().validate().is_ok());
    }

    #[test]
    fn development_profile_is_verbose() {
        let config = ConfigProfile::development();
        assert_eq!(config.metrics.log_level, "debug");
        assert_eq!(config.alerts.console_min_severity, "Info");
    }

    #[test]
    fn production_profile_is_strict() {
        let config = ConfigProfile::production();
        assert_eq!(config.metrics.log_level, "warn");
        assert!(config.alerts.webhook_output);
    }
}
