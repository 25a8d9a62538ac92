//! Order State Store (§4.3) and its edge-triggered event flags.

pub mod event;
pub mod store;

pub use event::Event;
pub use store::{EventFlags, OrderStateStore, Partition, TerminalKind};
