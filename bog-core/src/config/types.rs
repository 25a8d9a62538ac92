//! Runtime (YAML) configuration types (§6).
//!
//! Grounded on `bog-core/src/config/types.rs`'s own `MetricsConfig` /
//! `MonitoringConfig` / `AlertConfig` / `AlertRulesConfig` shapes (kept near
//! verbatim — they never carried `rust_decimal` and remain exactly the
//! ambient cold-path document the teacher already wrote) and on the teacher's
//! `HuginnConfig`/`ExecutionConfig`/`StrategyConfig`/`RiskConfig` *shape*,
//! re-keyed to the `quote_generator`/`exchanges`/`parameters` document this
//! spec requires in place of the Huginn/Lighter-specific fields.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Top-level YAML document (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub quote_generator: QuoteGeneratorKind,
    pub exchanges: HashMap<String, ExchangeConfig>,
    pub parameters: ParametersConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub alerts: AlertConfig,
}

/// Which quote generator this instance runs (§4.5, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteGeneratorKind {
    Sandbox,
    Plain,
    Stinky,
}

/// One venue connection (§6: `exchanges: { <name>: { symbol, type } }`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    pub symbol: String,
    #[serde(rename = "type")]
    pub kind: ExchangeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeKind {
    Trading,
    Data,
}

/// `parameters.<qg>` (§6). Only the section matching `quote_generator` is
/// required; the others may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParametersConfig {
    #[serde(default)]
    pub sandbox: Option<SandboxParameters>,
    #[serde(default)]
    pub plain: Option<PlainParameters>,
    #[serde(default)]
    pub stinky: Option<StinkyParameters>,
}

/// Shared fields every `parameters.<qg>` section carries, independent of the
/// quote generator chosen (§6: `total_orders`, `max_position` required;
/// `minimum_spread`, `take_profit`, `liquidation_timer`, `generation_interval`
/// have sane defaults so a minimal document still loads).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxParameters {
    pub total_orders: usize,
    pub max_position: f64,
    #[serde(default = "default_minimum_spread_bps")]
    pub minimum_spread: f64,
    #[serde(default = "default_take_profit_bps")]
    pub take_profit: f64,
    #[serde(default = "default_liquidation_timer_ms")]
    pub liquidation_timer: u64,
    #[serde(default = "default_generation_interval_ms")]
    pub generation_interval: u64,
    #[serde(default = "default_tick_size")]
    pub tick_size: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlainParameters {
    pub max_position: f64,
    #[serde(default = "default_minimum_spread_bps")]
    pub minimum_spread: f64,
    #[serde(default = "default_take_profit_bps")]
    pub take_profit: f64,
    #[serde(default = "default_liquidation_timer_ms")]
    pub liquidation_timer: u64,
    #[serde(default = "default_generation_interval_ms")]
    pub generation_interval: u64,
    #[serde(default = "default_tick_size")]
    pub tick_size: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StinkyParameters {
    pub max_position: f64,
    #[serde(default = "default_minimum_spread_bps")]
    pub minimum_spread: f64,
    #[serde(default = "default_risk_aversion")]
    pub risk_aversion: f64,
    #[serde(default = "default_take_profit_bps")]
    pub take_profit: f64,
    #[serde(default = "default_liquidation_timer_ms")]
    pub liquidation_timer: u64,
    #[serde(default = "default_generation_interval_ms")]
    pub generation_interval: u64,
    #[serde(default = "default_tick_size")]
    pub tick_size: f64,
}

fn default_minimum_spread_bps() -> f64 {
    5.0
}
fn default_take_profit_bps() -> f64 {
    10.0
}
fn default_liquidation_timer_ms() -> u64 {
    60_000
}
fn default_generation_interval_ms() -> u64 {
    250
}
fn default_tick_size() -> f64 {
    0.01
}
fn default_risk_aversion() -> f64 {
    0.5
}

/// Metrics and monitoring configuration. Unchanged from the teacher's own
/// cold-path document — never depended on `rust_decimal`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_prometheus_port")]
    pub prometheus_port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            prometheus_port: default_prometheus_port(),
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

fn default_prometheus_port() -> u16 {
    9090
}
fn default_log_level() -> String {
    "info".to_string()
}

/// Monitoring and observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default = "default_true")]
    pub enable_prometheus: bool,
    #[serde(default = "default_metrics_addr")]
    pub metrics_addr: String,
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
    #[serde(default = "default_true")]
    pub enable_journal: bool,
    #[serde(default = "default_journal_path")]
    pub journal_path: PathBuf,
    #[serde(default = "default_true")]
    pub recover_on_startup: bool,
    #[serde(default = "default_true")]
    pub validate_recovery: bool,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enable_prometheus: true,
            metrics_addr: default_metrics_addr(),
            metrics_path: default_metrics_path(),
            enable_journal: true,
            journal_path: default_journal_path(),
            recover_on_startup: true,
            validate_recovery: true,
        }
    }
}

/// Alert configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    #[serde(default = "default_true")]
    pub enable_alerts: bool,
    #[serde(default = "default_true")]
    pub console_output: bool,
    #[serde(default = "default_console_severity")]
    pub console_min_severity: String,
    #[serde(default = "default_true")]
    pub file_output: bool,
    #[serde(default = "default_alert_log_path")]
    pub alert_log_path: PathBuf,
    #[serde(default = "default_file_severity")]
    pub file_min_severity: String,
    #[serde(default)]
    pub webhook_output: bool,
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default = "default_webhook_severity")]
    pub webhook_min_severity: String,
    #[serde(default = "default_rate_limit")]
    pub rate_limit_secs: u64,
    #[serde(default = "default_auto_resolve")]
    pub auto_resolve_secs: u64,
    #[serde(default)]
    pub rules: AlertRulesConfig,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            enable_alerts: true,
            console_output: true,
            console_min_severity: default_console_severity(),
            file_output: true,
            alert_log_path: default_alert_log_path(),
            file_min_severity: default_file_severity(),
            webhook_output: false,
            webhook_url: None,
            webhook_min_severity: default_webhook_severity(),
            rate_limit_secs: default_rate_limit(),
            auto_resolve_secs: default_auto_resolve(),
            rules: AlertRulesConfig::default(),
        }
    }
}

/// Alert rules configuration. `huginn_connection`/`huginn_grace_period_secs`
/// generalized to the venue websocket connection rule every venue (not just
/// Huginn) needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRulesConfig {
    #[serde(default = "default_true")]
    pub position_limit: bool,
    #[serde(default)]
    pub position_limit_override: Option<f64>,
    #[serde(default = "default_true")]
    pub daily_loss_limit: bool,
    #[serde(default)]
    pub daily_loss_limit_override: Option<f64>,
    #[serde(default = "default_true")]
    pub connection_health: bool,
    #[serde(default = "default_connection_grace")]
    pub connection_grace_period_secs: u64,
    #[serde(default = "default_true")]
    pub rejection_rate: bool,
    #[serde(default = "default_rejection_threshold")]
    pub rejection_threshold: f64,
    #[serde(default = "default_true")]
    pub latency: bool,
    #[serde(default = "default_latency_threshold")]
    pub latency_threshold_us: f64,
}

impl Default for AlertRulesConfig {
    fn default() -> Self {
        Self {
            position_limit: true,
            position_limit_override: None,
            daily_loss_limit: true,
            daily_loss_limit_override: None,
            connection_health: true,
            connection_grace_period_secs: default_connection_grace(),
            rejection_rate: true,
            rejection_threshold: default_rejection_threshold(),
            latency: true,
            latency_threshold_us: default_latency_threshold(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_metrics_addr() -> String {
    "127.0.0.1:9090".to_string()
}
fn default_metrics_path() -> String {
    "/metrics".to_string()
}
fn default_journal_path() -> PathBuf {
    PathBuf::from("./data/execution.jsonl")
}
fn default_alert_log_path() -> PathBuf {
    PathBuf::from("./data/alerts.log")
}
fn default_console_severity() -> String {
    "Warning".to_string()
}
fn default_file_severity() -> String {
    "Info".to_string()
}
fn default_webhook_severity() -> String {
    "Critical".to_string()
}
fn default_rate_limit() -> u64 {
    60
}
fn default_auto_resolve() -> u64 {
    300
}
fn default_connection_grace() -> u64 {
    5
}
fn default_rejection_threshold() -> f64 {
    0.1
}
fn default_latency_threshold() -> f64 {
    1000.0
}
