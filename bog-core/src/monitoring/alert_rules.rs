//! Alert rules engine for automatic alert triggering
//!
//! Defines rules that monitor system state and trigger alerts when
//! thresholds are exceeded or conditions are met (§6 `alerts.rules`).

use super::alerts::{Alert, AlertCategory, AlertManager, AlertSeverity};
use super::MetricsRegistry;
use crate::core::Position;
use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::debug;

/// Rule evaluation context
pub struct RuleContext {
    /// Current position (if available)
    pub position: Option<Arc<Position>>,
    /// Prometheus metrics registry
    pub metrics: Arc<MetricsRegistry>,
    /// Current timestamp
    pub timestamp: SystemTime,
}

/// Alert rule trait
pub trait AlertRule: Send + Sync {
    /// Rule name for identification
    fn name(&self) -> &str;

    /// Rule category
    fn category(&self) -> AlertCategory;

    /// Evaluate rule and return alert if triggered
    fn evaluate(&self, context: &RuleContext) -> Option<Alert>;

    /// Check if rule is enabled
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Position limit rule (§6 `alerts.rules.position_limit`).
pub struct PositionLimitRule {
    /// Maximum allowed absolute position size, in base units.
    pub max_position: f64,
    pub severity: AlertSeverity,
}

impl PositionLimitRule {
    pub fn new(max_position: f64, severity: AlertSeverity) -> Self {
        Self {
            max_position,
            severity,
        }
    }
}

impl AlertRule for PositionLimitRule {
    fn name(&self) -> &str {
        "position_limit_exceeded"
    }

    fn category(&self) -> AlertCategory {
        AlertCategory::Risk
    }

    fn evaluate(&self, context: &RuleContext) -> Option<Alert> {
        let position = context.position.as_ref()?;
        let abs_position = position.size.abs();

        if abs_position > self.max_position {
            let alert = Alert::new(
                self.category(),
                self.name(),
                self.severity,
                format!("position limit exceeded: {abs_position} > {}", self.max_position),
            )
            .with_detail("current_position", abs_position.to_string())
            .with_detail("limit", self.max_position.to_string())
            .with_detail("excess", (abs_position - self.max_position).to_string());

            return Some(alert);
        }

        None
    }
}

/// Unrealized-PnL drawdown rule (§6 `alerts.rules.daily_loss_limit`). Tracks
/// `Position::u_pnl` as the loss signal — the spec defines no separate
/// daily-realized-PnL ledger, so the open position's mark-to-market
/// unrealized loss is the closest available proxy.
pub struct DailyLossLimitRule {
    pub max_loss: f64,
    pub severity: AlertSeverity,
}

impl DailyLossLimitRule {
    pub fn new(max_loss: f64, severity: AlertSeverity) -> Self {
        Self { max_loss, severity }
    }
}

impl AlertRule for DailyLossLimitRule {
    fn name(&self) -> &str {
        "daily_loss_limit_exceeded"
    }

    fn category(&self) -> AlertCategory {
        AlertCategory::Risk
    }

    fn evaluate(&self, context: &RuleContext) -> Option<Alert> {
        let position = context.position.as_ref()?;
        let u_pnl = position.u_pnl;

        if u_pnl < 0.0 && u_pnl.abs() > self.max_loss {
            let alert = Alert::new(
                self.category(),
                self.name(),
                self.severity,
                format!("unrealized loss limit exceeded: {u_pnl} < -{}", self.max_loss),
            )
            .with_detail("unrealized_pnl", u_pnl.to_string())
            .with_detail("limit", self.max_loss.to_string())
            .with_detail("excess_loss", (u_pnl.abs() - self.max_loss).to_string());

            return Some(alert);
        }

        None
    }
}

/// High rejection rate rule (§6 `alerts.rules.rejection_rate`).
pub struct HighRejectionRateRule {
    /// Rejection rate threshold (0.0 to 1.0)
    pub threshold: f64,
    /// Minimum orders required to evaluate
    pub min_orders: u64,
    pub severity: AlertSeverity,
}

impl HighRejectionRateRule {
    pub fn new(threshold: f64, min_orders: u64, severity: AlertSeverity) -> Self {
        Self {
            threshold,
            min_orders,
            severity,
        }
    }
}

impl AlertRule for HighRejectionRateRule {
    fn name(&self) -> &str {
        "high_rejection_rate"
    }

    fn category(&self) -> AlertCategory {
        AlertCategory::Trading
    }

    fn evaluate(&self, _context: &RuleContext) -> Option<Alert> {
        // TODO: Prometheus counters are cumulative; computing a rate needs a
        // windowed aggregation this crate doesn't do yet (would need to
        // sample `orders_total`/`rejections_total` at an interval and diff).
        let _ = (self.threshold, self.min_orders);
        None
    }
}

/// Venue connection health rule (§6 `alerts.rules.connection_health`).
pub struct ConnectionHealthRule {
    /// How long the connection can be down before alerting
    pub grace_period: Duration,
    pub severity: AlertSeverity,
}

impl ConnectionHealthRule {
    pub fn new(grace_period: Duration, severity: AlertSeverity) -> Self {
        Self {
            grace_period,
            severity,
        }
    }
}

impl AlertRule for ConnectionHealthRule {
    fn name(&self) -> &str {
        "venue_connection_lost"
    }

    fn category(&self) -> AlertCategory {
        AlertCategory::System
    }

    fn evaluate(&self, context: &RuleContext) -> Option<Alert> {
        let exchange_connected = context.metrics.system().exchange_connected.get();

        if exchange_connected == 0 {
            let alert = Alert::new(
                self.category(),
                self.name(),
                self.severity,
                "venue connection lost",
            )
            .with_detail("grace_period_secs", self.grace_period.as_secs().to_string())
            .with_detail("action", "check venue websocket transport");

            return Some(alert);
        }

        None
    }
}

/// High tick-to-trade latency rule (§6 `alerts.rules.latency`).
pub struct HighLatencyRule {
    pub threshold_us: f64,
    pub severity: AlertSeverity,
}

impl HighLatencyRule {
    pub fn new(threshold_us: f64, severity: AlertSeverity) -> Self {
        Self {
            threshold_us,
            severity,
        }
    }
}

impl AlertRule for HighLatencyRule {
    fn name(&self) -> &str {
        "high_tick_to_trade_latency"
    }

    fn category(&self) -> AlertCategory {
        AlertCategory::Performance
    }

    fn evaluate(&self, _context: &RuleContext) -> Option<Alert> {
        // TODO: needs a percentile reader over the latency histogram's
        // samples; the `prometheus` crate's `Histogram` only exposes sum/count.
        let _ = self.threshold_us;
        None
    }
}

/// Rule engine that evaluates all rules periodically
pub struct RuleEngine {
    rules: Vec<Box<dyn AlertRule>>,
    alert_manager: Arc<AlertManager>,
}

impl RuleEngine {
    pub fn new(alert_manager: Arc<AlertManager>) -> Self {
        Self {
            rules: Vec::new(),
            alert_manager,
        }
    }

    pub fn add_rule(&mut self, rule: Box<dyn AlertRule>) {
        debug!("adding alert rule: {}", rule.name());
        self.rules.push(rule);
    }

    /// Build the rule set named by §6 `alerts.rules`, using
    /// [`crate::config::AlertRulesConfig`]'s defaults.
    pub fn with_default_rules(mut self) -> Self {
        self.add_rule(Box::new(PositionLimitRule::new(1.0, AlertSeverity::Critical)));
        self.add_rule(Box::new(DailyLossLimitRule::new(1_000.0, AlertSeverity::Critical)));
        self.add_rule(Box::new(ConnectionHealthRule::new(
            Duration::from_secs(5),
            AlertSeverity::Critical,
        )));
        self.add_rule(Box::new(HighRejectionRateRule::new(0.1, 10, AlertSeverity::Warning)));
        self.add_rule(Box::new(HighLatencyRule::new(1_000.0, AlertSeverity::Warning)));
        self
    }

    pub fn evaluate_all(&self, context: &RuleContext) -> Result<()> {
        for rule in &self.rules {
            if !rule.is_enabled() {
                continue;
            }

            if let Some(alert) = rule.evaluate(context) {
                debug!("alert triggered: {}", alert.id.to_string());
                self.alert_manager.send(alert)?;
            }
        }

        Ok(())
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitoring::alerts::AlertManagerConfig;
    use crate::core::order::Side;

    fn create_test_context() -> RuleContext {
        let position = Arc::new(Position::flat("BTC-PERP", 0));
        let metrics = Arc::new(MetricsRegistry::new().unwrap());

        RuleContext {
            position: Some(position),
            metrics,
            timestamp: SystemTime::now(),
        }
    }

    #[test]
    fn position_within_limit_does_not_alert() {
        let rule = PositionLimitRule::new(1.0, AlertSeverity::Critical);
        let context = create_test_context();
        assert!(rule.evaluate(&context).is_none());
    }

    #[test]
    fn position_limit_rule_fires_once_size_exceeds_limit() {
        let rule = PositionLimitRule::new(1.0, AlertSeverity::Critical);
        let mut position = Position::flat("BTC-PERP", 0);
        position.apply_fill(Side::Buy, 100.0, 1.5, 0);
        let context = RuleContext {
            position: Some(Arc::new(position)),
            metrics: Arc::new(MetricsRegistry::new().unwrap()),
            timestamp: SystemTime::now(),
        };

        let alert = rule.evaluate(&context).unwrap();
        assert_eq!(alert.severity, AlertSeverity::Critical);
        assert_eq!(alert.id.name, "position_limit_exceeded");
        assert!(alert.details.contains_key("current_position"));
    }

    #[test]
    fn daily_loss_limit_rule_fires_on_large_unrealized_loss() {
        let rule = DailyLossLimitRule::new(1_000.0, AlertSeverity::Critical);
        let mut position = Position::flat("BTC-PERP", 0);
        position.apply_fill(Side::Buy, 100.0, 1.0, 0);
        position.update_upnl(50.0); // entry 100 -> mark 50, 1.0 size: -50 unrealized
        let context = RuleContext {
            position: Some(Arc::new(position)),
            metrics: Arc::new(MetricsRegistry::new().unwrap()),
            timestamp: SystemTime::now(),
        };
        assert!(rule.evaluate(&context).is_none());

        let rule = DailyLossLimitRule::new(10.0, AlertSeverity::Critical);
        let alert = rule.evaluate(&context);
        assert!(alert.is_some());
        assert_eq!(alert.unwrap().id.name, "daily_loss_limit_exceeded");
    }

    #[test]
    fn connection_health_rule_fires_when_exchange_disconnected() {
        let rule = ConnectionHealthRule::new(Duration::from_secs(5), AlertSeverity::Critical);
        let context = create_test_context();
        assert!(rule.evaluate(&context).is_none());

        context.metrics.system().exchange_connected.set(0);
        let alert = rule.evaluate(&context);
        assert!(alert.is_some());
        assert_eq!(alert.unwrap().id.name, "venue_connection_lost");
    }

    #[test]
    fn default_rule_set_has_one_rule_per_configured_category() {
        let alert_config = AlertManagerConfig::default();
        let alert_manager = Arc::new(AlertManager::new(alert_config));
        let engine = RuleEngine::new(alert_manager).with_default_rules();
        assert_eq!(engine.rule_count(), 5);
    }

    #[test]
    fn evaluate_all_sends_through_the_alert_manager() {
        let alert_config = AlertManagerConfig::default();
        let alert_manager = Arc::new(AlertManager::new(alert_config));
        let mut engine = RuleEngine::new(alert_manager);
        engine.add_rule(Box::new(PositionLimitRule::new(0.5, AlertSeverity::Warning)));

        let mut position = Position::flat("BTC-PERP", 0);
        position.apply_fill(Side::Buy, 100.0, 1.0, 0);
        let context = RuleContext {
            position: Some(Arc::new(position)),
            metrics: Arc::new(MetricsRegistry::new().unwrap()),
            timestamp: SystemTime::now(),
        };

        engine.evaluate_all(&context).unwrap();
    }
}
