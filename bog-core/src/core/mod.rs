//! Core domain types shared by every subsystem: orders, client ids, position,
//! and the hand-written domain error enums.

pub mod errors;
pub mod order;
pub mod position;

pub use errors::{BookError, ConfigError, OssError};
pub use order::{ClientOrderId, Order, OrderStatus, OrderType, Side, TimeInForce};
pub use position::{Position, PositionSide, POSITION_EPS};
