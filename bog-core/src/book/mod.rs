//! Order Book Replica and Market-Data Handlers (§4.1, §4.2).

pub mod mdh;
pub mod replica;
pub mod ring;

pub use mdh::{Candle, ChannelKind, MarketDataHandlers, MarketDataMessage, Ticker, Trade};
pub use replica::{Level, OrderBookReplica};
pub use ring::RingBuffer;
