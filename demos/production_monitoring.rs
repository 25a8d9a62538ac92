//! Production monitoring setup example.
//!
//! Demonstrates wiring the ambient observability stack (§10) a deployed
//! `bog` process carries: the Prometheus metrics registry, the HTTP
//! scrape endpoint, and the alert rule engine evaluated against a live
//! `Position`.

use bog_core::core::order::Side;
use bog_core::core::Position;
use bog_core::monitoring::{
    Alert, AlertCategory, AlertManager, AlertManagerConfig, AlertOutput, AlertSeverity,
    MetricsRegistry, MetricsServer, MetricsServerConfig, RuleContext, RuleEngine,
};
use bog_core::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    println!("=== Production monitoring setup ===\n");

    // Prometheus metrics registry (§10.5).
    let metrics = Arc::new(MetricsRegistry::new()?);
    metrics
        .trading()
        .orders_total
        .with_label_values(&["BTC-PERP", "buy", "limit"])
        .inc();
    metrics.trading().volume_total.inc_by(50_000.0);
    metrics.risk().position_btc.set(0.5);
    metrics.system().exchange_connected.set(1);
    println!("metrics registry initialized");

    // HTTP scrape endpoint (run via `tokio::spawn(server.serve())` in a real process).
    let server_config = MetricsServerConfig {
        listen_addr: "127.0.0.1:9090".parse().unwrap(),
        metrics_path: "/metrics".to_string(),
    };
    let _metrics_server = MetricsServer::new(server_config, metrics.clone());
    println!("metrics server configured on http://127.0.0.1:9090/metrics");

    // Alert manager with console + file outputs (§6 `alerts`).
    let alert_config = AlertManagerConfig {
        outputs: vec![
            AlertOutput::Console {
                min_severity: AlertSeverity::Error,
            },
            AlertOutput::File {
                path: PathBuf::from("/tmp/bog_alerts.log"),
                min_severity: AlertSeverity::Info,
            },
        ],
        rate_limit_secs: 60,
        auto_resolve_secs: 300,
        enable_aggregation: false,
    };
    let alert_manager = Arc::new(AlertManager::new(alert_config));
    println!("alert manager ready (console Error+, file all levels)");

    // §6 `alerts.rules` default set, evaluated against a position that
    // exceeds the 1.0 BTC position-limit default.
    let rule_engine = RuleEngine::new(alert_manager.clone()).with_default_rules();
    println!("{} alert rules registered", rule_engine.rule_count());

    let mut position = Position::flat("BTC-PERP", 0);
    position.apply_fill(Side::Buy, 100.0, 1.5, 0);

    let context = RuleContext {
        position: Some(Arc::new(position)),
        metrics: metrics.clone(),
        timestamp: SystemTime::now(),
    };
    rule_engine.evaluate_all(&context)?;
    println!("rule evaluation complete, check console and /tmp/bog_alerts.log");

    let manual_alert = Alert::new(
        AlertCategory::Trading,
        "high_slippage",
        AlertSeverity::Warning,
        "unusual slippage detected on BTC-PERP",
    )
    .with_detail("market", "BTC-PERP")
    .with_detail("slippage_bps", "25")
    .with_detail("threshold_bps", "10");
    alert_manager.send(manual_alert)?;
    println!("manual alert sent, active alerts: {}", alert_manager.active_count());

    Ok(())
}
