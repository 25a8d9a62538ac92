//! `bog`: the market-making process (§1, §5).
//!
//! Loads the YAML parameter document, builds the per-symbol supervisor and
//! its quote generator/OMS/PE collaborators, spawns the cooperative task
//! group, and runs until Ctrl-C triggers the §4.8 shutdown sequence.
//!
//! Only `SimulatedVenueClient` is wired up here (§6: a live venue's wire
//! format is out of scope) — this binary is the paper-trading loop the spec
//! names as the deliverable example.

use anyhow::{Context, Result};
use bog_bins::common::{init_logging, CommonArgs};
use bog_core::book::OrderBookReplica;
use bog_core::config::{Config, QuoteGeneratorKind};
use bog_core::engine::run::{market_data_loop, oms_drain_loop, position_executor_loop, tick_loop};
use bog_core::engine::SymbolSupervisor;
use bog_core::oms::{Oms, OmsParams};
use bog_core::pe::{PositionExecutor, PositionExecutorParams};
use bog_core::qg::{
    PlainParams, PlainQuoteGenerator, QuoteGenerator, SandboxParams, SandboxQuoteGenerator, StinkyParams,
    StinkyQuoteGenerator,
};
use bog_core::venue::simulated::SimulatedVenueClient;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const DEPTH: usize = 20;

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Build the boxed quote generator the config names, from whichever
/// `parameters.<kind>` section `Config::validate` already confirmed is
/// present (§6).
fn build_quote_generator(config: &Config, symbol: &str) -> Result<Box<dyn QuoteGenerator + Send>> {
    let generator: Box<dyn QuoteGenerator + Send> = match config.quote_generator {
        QuoteGeneratorKind::Sandbox => {
            let p = config
                .parameters
                .sandbox
                .as_ref()
                .context("parameters.sandbox missing")?;
            Box::new(SandboxQuoteGenerator::new(SandboxParams {
                total_orders: p.total_orders,
                max_position: p.max_position,
                minimum_spread_bps: p.minimum_spread,
                tick_size: p.tick_size,
                symbol: symbol.to_string(),
            }))
        }
        QuoteGeneratorKind::Plain => {
            let p = config.parameters.plain.as_ref().context("parameters.plain missing")?;
            Box::new(PlainQuoteGenerator::new(PlainParams {
                max_position: p.max_position,
                minimum_spread_bps: p.minimum_spread,
                tick_size: p.tick_size,
                symbol: symbol.to_string(),
            }))
        }
        QuoteGeneratorKind::Stinky => {
            let p = config
                .parameters
                .stinky
                .as_ref()
                .context("parameters.stinky missing")?;
            Box::new(StinkyQuoteGenerator::new(StinkyParams {
                max_position: p.max_position,
                minimum_spread_bps: p.minimum_spread,
                risk_aversion: p.risk_aversion,
                tick_size: p.tick_size,
                symbol: symbol.to_string(),
            }))
        }
    };
    Ok(generator)
}

#[derive(Clone, Copy)]
struct SharedParams {
    total_orders: usize,
    max_position: f64,
    take_profit: f64,
    liquidation_timer: u64,
    generation_interval: u64,
}

fn shared_params(config: &Config) -> Result<SharedParams> {
    Ok(match config.quote_generator {
        QuoteGeneratorKind::Sandbox => {
            let p = config.parameters.sandbox.as_ref().context("parameters.sandbox missing")?;
            SharedParams {
                total_orders: p.total_orders,
                max_position: p.max_position,
                take_profit: p.take_profit,
                liquidation_timer: p.liquidation_timer,
                generation_interval: p.generation_interval,
            }
        }
        QuoteGeneratorKind::Plain => {
            let p = config.parameters.plain.as_ref().context("parameters.plain missing")?;
            // Plain has no inventory skew, but the OMS still needs a target
            // book depth; mirror the teacher's default of two-sided quoting.
            SharedParams {
                total_orders: 2,
                max_position: p.max_position,
                take_profit: p.take_profit,
                liquidation_timer: p.liquidation_timer,
                generation_interval: p.generation_interval,
            }
        }
        QuoteGeneratorKind::Stinky => {
            let p = config.parameters.stinky.as_ref().context("parameters.stinky missing")?;
            SharedParams {
                total_orders: 2,
                max_position: p.max_position,
                take_profit: p.take_profit,
                liquidation_timer: p.liquidation_timer,
                generation_interval: p.generation_interval,
            }
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CommonArgs::parse();
    init_logging(&args.log_level)?;

    let config = Config::load(&args.config).with_context(|| format!("loading {}", args.config))?;
    let (exchange_name, exchange) = config
        .exchanges
        .iter()
        .next()
        .context("config has no exchanges entries")?;
    let symbol = exchange.symbol.clone();
    info!(exchange = %exchange_name, symbol = %symbol, qg = ?config.quote_generator, "starting bog");

    let params = shared_params(&config)?;
    let now = now_ms();

    let supervisor = Arc::new(SymbolSupervisor::new(symbol.clone(), DEPTH, now));
    let venue = Arc::new(SimulatedVenueClient::new());

    // Seed the simulated venue with a plausible starting book so the first
    // tick has something to quote against.
    let seed_mid = 100.0;
    venue.set_book(seed_book(&symbol, seed_mid));

    let qg = build_quote_generator(&config, &symbol)?;
    let oms = Oms::new(OmsParams {
        sensitivity: 0.2,
        max_position: params.max_position,
        total_orders: params.total_orders,
        lost_in_flight_ms: 3_000,
    });
    let pe = PositionExecutor::new(PositionExecutorParams {
        take_profit_bps: params.take_profit,
        liquidation_timer_ms: params.liquidation_timer,
    });

    supervisor.install_ctrlc_handler();
    let shutdown = supervisor.shutdown_signal();

    let handles = vec![
        tokio::spawn(market_data_loop(supervisor.clone(), venue.clone(), DEPTH, Duration::from_secs(5))),
        tokio::spawn(tick_loop(
            supervisor.clone(),
            qg,
            oms,
            Duration::from_millis(params.generation_interval),
        )),
        tokio::spawn(position_executor_loop(supervisor.clone(), pe)),
        tokio::spawn(oms_drain_loop(supervisor.clone(), venue.clone())),
    ];

    while !shutdown.load(std::sync::atomic::Ordering::Acquire) {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    for handle in handles {
        let _ = tokio::time::timeout(Duration::from_secs(2), handle).await;
    }

    supervisor.shutdown(venue.as_ref()).await?;
    info!("bog exited cleanly");
    Ok(())
}

fn seed_book(symbol: &str, mid: f64) -> bog_core::venue::BookSnapshot {
    let mut book = OrderBookReplica::new(symbol, DEPTH);
    let bids: Vec<(f64, f64)> = (0..DEPTH).map(|i| (mid - 0.1 - i as f64 * 0.1, 1.0)).collect();
    let asks: Vec<(f64, f64)> = (0..DEPTH).map(|i| (mid + 0.1 + i as f64 * 0.1, 1.0)).collect();
    book.refresh(&bids, &asks, 0, 0).ok();
    bog_core::venue::BookSnapshot {
        bids,
        asks,
        ts: 0,
        seq_id: 0,
    }
}
