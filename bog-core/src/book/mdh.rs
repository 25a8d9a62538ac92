//! Market-Data Handlers (MDH) — §4.2.
//!
//! Drives [`OrderBookReplica`] updates from snapshot/delta messages and
//! maintains the trade ring buffer, candle ring buffer, and ticker record.
//! The dispatcher is an exhaustive match over [`ChannelKind`]: a message for
//! an unregistered channel is an `Err`, not a silent no-op (DESIGN.md Open
//! Question: the source occasionally routes a `refresh` through a handler
//! table that was never registered for that channel — this spec treats that
//! as a bug and fails fast rather than reproducing it).

use crate::book::replica::OrderBookReplica;
use crate::book::ring::RingBuffer;
use crate::core::errors::{BookError, OssError};
use crate::core::order::Side;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Default capacity for the trade ring buffer (§4.2: "size >= 1000").
pub const DEFAULT_TRADE_CAPACITY: usize = 1000;
/// Default capacity for the candle ring buffer.
pub const DEFAULT_CANDLE_CAPACITY: usize = 500;
/// Default periodic resync interval (§4.2).
pub const DEFAULT_RESYNC_INTERVAL_SECS: u64 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Snapshot,
    DepthUpdate,
    Trade,
    Candle,
    Ticker,
}

#[derive(Debug, Clone, Copy)]
pub struct Trade {
    pub ts: u64,
    pub side: Side,
    pub price: f64,
    pub size: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct Candle {
    pub open_ts: u64,
    pub close_ts: Option<u64>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub count: Option<u64>,
}

#[derive(Debug, Clone, Copy)]
pub struct Ticker {
    pub timestamp: u64,
    pub mark_price: f64,
    pub index_price: f64,
    pub funding_rate: f64,
    pub funding_time: u64,
}

/// A normalized market-data message, tagged with the channel it arrived on.
pub enum MarketDataMessage {
    Snapshot {
        bids: Vec<(f64, f64)>,
        asks: Vec<(f64, f64)>,
        ts: u64,
        seq_id: u64,
    },
    /// `last_update_id` of `0` means the venue did not supply one.
    Delta {
        bids: Vec<(f64, f64)>,
        asks: Vec<(f64, f64)>,
        ts: u64,
        last_update_id: u64,
    },
    Trade(Trade),
    Candle(Candle),
    Ticker(Ticker),
}

impl MarketDataMessage {
    pub fn channel(&self) -> ChannelKind {
        match self {
            MarketDataMessage::Snapshot { .. } => ChannelKind::Snapshot,
            MarketDataMessage::Delta { .. } => ChannelKind::DepthUpdate,
            MarketDataMessage::Trade(_) => ChannelKind::Trade,
            MarketDataMessage::Candle(_) => ChannelKind::Candle,
            MarketDataMessage::Ticker(_) => ChannelKind::Ticker,
        }
    }
}

pub struct MarketDataHandlers {
    pub book: OrderBookReplica,
    trades: RingBuffer<Trade>,
    candles: RingBuffer<Candle>,
    ticker: Option<Ticker>,
    registered: HashSet<ChannelKind>,
}

impl MarketDataHandlers {
    pub fn new(symbol: impl Into<String>, depth: usize, registered: HashSet<ChannelKind>) -> Self {
        Self {
            book: OrderBookReplica::new(symbol, depth),
            trades: RingBuffer::new(DEFAULT_TRADE_CAPACITY),
            candles: RingBuffer::new(DEFAULT_CANDLE_CAPACITY),
            ticker: None,
            registered,
        }
    }

    pub fn trades_snapshot(&self) -> Vec<Trade> {
        self.trades.snapshot()
    }

    pub fn candles_snapshot(&self) -> Vec<Candle> {
        self.candles.snapshot()
    }

    pub fn ticker(&self) -> Option<Ticker> {
        self.ticker
    }

    /// Dispatch one message. Fails fast (`Err(OssError::UnregisteredChannel)`)
    /// if the message's channel was never registered — per the Open Question
    /// resolution, a mis-dispatch is a bug, not a thing to route around.
    pub fn dispatch(&mut self, msg: MarketDataMessage) -> Result<(), OssError> {
        let channel = msg.channel();
        if !self.registered.contains(&channel) {
            return Err(OssError::UnregisteredChannel(format!("{channel:?}")));
        }

        match msg {
            MarketDataMessage::Snapshot {
                bids,
                asks,
                ts,
                seq_id,
            } => {
                if let Err(e) = self.book.refresh(&bids, &asks, ts, seq_id) {
                    warn!(error = %e, "dropping malformed snapshot");
                }
            }
            MarketDataMessage::Delta {
                bids,
                asks,
                ts,
                last_update_id,
            } => {
                if last_update_id != 0 && last_update_id <= self.book.seq_id() {
                    debug!(last_update_id, current = self.book.seq_id(), "dropping stale delta");
                    return Ok(());
                }
                if !bids.is_empty() {
                    if let Err(e) = self.book.update_bids(&bids, ts, last_update_id) {
                        Self::log_book_error(e);
                    }
                }
                if !asks.is_empty() {
                    if let Err(e) = self.book.update_asks(&asks, ts, last_update_id) {
                        Self::log_book_error(e);
                    }
                }
            }
            MarketDataMessage::Trade(trade) => self.trades.push(trade),
            MarketDataMessage::Candle(candle) => self.ingest_candle(candle),
            MarketDataMessage::Ticker(ticker) => self.ingest_ticker(ticker),
        }
        Ok(())
    }

    fn log_book_error(e: BookError) {
        match e {
            BookError::StaleSequence { .. } => debug!(error = %e, "stale delta dropped"),
            _ => warn!(error = %e, "dropping malformed delta"),
        }
    }

    /// If the incoming candle has a strictly greater `open_ts` than the last
    /// stored one, append; otherwise pop-and-append (in-place update of the
    /// still-open candle), per §4.2.
    fn ingest_candle(&mut self, candle: Candle) {
        match self.candles.last() {
            Some(last) if candle.open_ts > last.open_ts => self.candles.push(candle),
            Some(_) => self.candles.replace_last(candle),
            None => self.candles.push(candle),
        }
    }

    /// Atomically replace the ticker when the message timestamp is `>=` stored.
    fn ingest_ticker(&mut self, ticker: Ticker) {
        let should_replace = match self.ticker {
            Some(existing) => ticker.timestamp >= existing.timestamp,
            None => true,
        };
        if should_replace {
            self.ticker = Some(ticker);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mdh_with_all_channels() -> MarketDataHandlers {
        let mut chans = HashSet::new();
        chans.insert(ChannelKind::Snapshot);
        chans.insert(ChannelKind::DepthUpdate);
        chans.insert(ChannelKind::Trade);
        chans.insert(ChannelKind::Candle);
        chans.insert(ChannelKind::Ticker);
        MarketDataHandlers::new("BTC-PERP", 10, chans)
    }

    #[test]
    fn mis_dispatch_to_unregistered_channel_fails_fast() {
        let mut chans = HashSet::new();
        chans.insert(ChannelKind::Snapshot);
        let mut mdh = MarketDataHandlers::new("BTC-PERP", 10, chans);
        let err = mdh
            .dispatch(MarketDataMessage::Delta {
                bids: vec![(100.0, 1.0)],
                asks: vec![],
                ts: 1,
                last_update_id: 1,
            })
            .unwrap_err();
        assert!(matches!(err, OssError::UnregisteredChannel(_)));
    }

    #[test]
    fn stale_delta_last_update_id_is_dropped_silently() {
        let mut mdh = mdh_with_all_channels();
        mdh.dispatch(MarketDataMessage::Snapshot {
            bids: vec![(100.0, 1.0)],
            asks: vec![(101.0, 1.0)],
            ts: 1,
            seq_id: 10,
        })
        .unwrap();
        mdh.dispatch(MarketDataMessage::Delta {
            bids: vec![(99.0, 1.0)],
            asks: vec![],
            ts: 2,
            last_update_id: 5,
        })
        .unwrap();
        assert_eq!(mdh.book.best_bid().unwrap().price, 100.0);
    }

    #[test]
    fn trade_ring_overwrites_oldest_when_full() {
        let mut chans = HashSet::new();
        chans.insert(ChannelKind::Trade);
        let mut mdh = MarketDataHandlers::new("BTC-PERP", 10, chans);
        for i in 0..(DEFAULT_TRADE_CAPACITY + 10) {
            mdh.dispatch(MarketDataMessage::Trade(Trade {
                ts: i as u64,
                side: Side::Buy,
                price: 100.0,
                size: 1.0,
            }))
            .unwrap();
        }
        let snap = mdh.trades_snapshot();
        assert_eq!(snap.len(), DEFAULT_TRADE_CAPACITY);
        assert_eq!(snap.first().unwrap().ts, 10);
    }

    #[test]
    fn candle_with_same_open_ts_updates_in_place() {
        let mut mdh = mdh_with_all_channels();
        mdh.dispatch(MarketDataMessage::Candle(Candle {
            open_ts: 100,
            close_ts: None,
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 1.0,
            count: None,
        }))
        .unwrap();
        mdh.dispatch(MarketDataMessage::Candle(Candle {
            open_ts: 100,
            close_ts: None,
            open: 1.0,
            high: 1.5,
            low: 0.9,
            close: 1.2,
            volume: 5.0,
            count: None,
        }))
        .unwrap();
        let snap = mdh.candles_snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].close, 1.2);
    }

    #[test]
    fn candle_with_greater_open_ts_appends() {
        let mut mdh = mdh_with_all_channels();
        mdh.dispatch(MarketDataMessage::Candle(Candle {
            open_ts: 100,
            close_ts: None,
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 1.0,
            count: None,
        }))
        .unwrap();
        mdh.dispatch(MarketDataMessage::Candle(Candle {
            open_ts: 200,
            close_ts: None,
            open: 1.2,
            high: 1.2,
            low: 1.2,
            close: 1.2,
            volume: 1.0,
            count: None,
        }))
        .unwrap();
        assert_eq!(mdh.candles_snapshot().len(), 2);
    }

    #[test]
    fn ticker_replaced_only_when_not_older() {
        let mut mdh = mdh_with_all_channels();
        mdh.dispatch(MarketDataMessage::Ticker(Ticker {
            timestamp: 10,
            mark_price: 100.0,
            index_price: 100.0,
            funding_rate: 0.0001,
            funding_time: 1000,
        }))
        .unwrap();
        mdh.dispatch(MarketDataMessage::Ticker(Ticker {
            timestamp: 5,
            mark_price: 90.0,
            index_price: 90.0,
            funding_rate: 0.0002,
            funding_time: 2000,
        }))
        .unwrap();
        assert_eq!(mdh.ticker().unwrap().mark_price, 100.0);
    }
}
