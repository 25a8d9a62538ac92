//! Supervision and per-symbol task-group orchestration (§5, §4.8).
//!
//! `supervisor` owns the shared per-venue state (`OrderBookReplica`,
//! `OrderStateStore`, `Position`) and the shutdown sequence. `run` spawns the
//! cooperative task group the control-flow diagram in §2 describes: a
//! tick-driven QG/OMS-reconcile loop, a PE loop parked on the `position`
//! flag, and an OMS monitored-drain loop parked on the `to_create`/
//! `to_amend`/`to_cancel` flags. Feeding the book and the user-event stream
//! themselves is the venue codec's job (§1, §6) — `run` takes those as
//! externally-driven inputs (a `UserEvent` receiver and direct mutation of
//! `SymbolSupervisor::book` by the caller's MDH loop) rather than owning a
//! websocket connection.

pub mod run;
pub mod supervisor;

pub use supervisor::SymbolSupervisor;
