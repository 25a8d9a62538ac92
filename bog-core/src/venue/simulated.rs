//! Deterministic in-memory [`VenueClient`] for tests and the paper-trading
//! binary. Acks every create/amend instantly and assigns a synthetic venue
//! order id; grounded on `execution/simulated.rs`'s "instant fill, no
//! network" idiom, stripped of the object-pool/fill-queue machinery that
//! existed there purely for the teacher's sub-microsecond hot path.

use super::{BatchResponse, BookSnapshot, OrderResult, PositionSnapshot, VenueClient, VenueError};
use crate::core::order::Order;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

pub struct SimulatedVenueClient {
    next_venue_id: AtomicU64,
    book: Mutex<BookSnapshot>,
    position: Mutex<Option<PositionSnapshot>>,
    /// When set, every batch call returns this rejection reason instead of acking.
    pub reject_all: Mutex<Option<String>>,
}

impl Default for SimulatedVenueClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedVenueClient {
    pub fn new() -> Self {
        Self {
            next_venue_id: AtomicU64::new(1),
            book: Mutex::new(BookSnapshot::default()),
            position: Mutex::new(None),
            reject_all: Mutex::new(None),
        }
    }

    pub fn set_book(&self, snapshot: BookSnapshot) {
        *self.book.lock().unwrap() = snapshot;
    }

    pub fn set_position(&self, snapshot: Option<PositionSnapshot>) {
        *self.position.lock().unwrap() = snapshot;
    }

    fn ack_or_reject(&self, orders: &[Order]) -> BatchResponse {
        let mut out = BatchResponse::new();
        let reject = self.reject_all.lock().unwrap().clone();
        for order in orders {
            let result = match &reject {
                Some(reason) => OrderResult::Rejected {
                    reason: reason.clone(),
                },
                None => {
                    let id = self.next_venue_id.fetch_add(1, Ordering::SeqCst);
                    OrderResult::Acked {
                        venue_order_id: format!("sim-{id}"),
                    }
                }
            };
            out.insert(order.client_order_id, result);
        }
        out
    }
}

impl VenueClient for SimulatedVenueClient {
    async fn batch_create(&self, orders: Vec<Order>) -> Result<BatchResponse, VenueError> {
        Ok(self.ack_or_reject(&orders))
    }

    async fn batch_amend(&self, orders: Vec<Order>) -> Result<BatchResponse, VenueError> {
        Ok(self.ack_or_reject(&orders))
    }

    async fn batch_cancel(&self, orders: Vec<Order>) -> Result<BatchResponse, VenueError> {
        let mut out = BatchResponse::new();
        for order in orders {
            out.insert(
                order.client_order_id,
                OrderResult::Acked {
                    venue_order_id: order.venue_order_id.clone().unwrap_or_default(),
                },
            );
        }
        Ok(out)
    }

    async fn cancel_all_orders(&self, _symbol: &str) -> Result<(), VenueError> {
        Ok(())
    }

    async fn market_close(
        &self,
        _symbol: &str,
        _side: crate::core::order::Side,
        _size: f64,
    ) -> Result<(), VenueError> {
        *self.position.lock().unwrap() = None;
        Ok(())
    }

    async fn get_orderbook(&self, _symbol: &str, _depth: usize) -> Result<BookSnapshot, VenueError> {
        Ok(self.book.lock().unwrap().clone())
    }

    async fn get_position(&self, _symbol: &str) -> Result<Option<PositionSnapshot>, VenueError> {
        Ok(*self.position.lock().unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::order::{ClientOrderId, Side, TimeInForce};

    fn order(id: i32) -> Order {
        Order::new_limit("BTC-PERP", Side::Buy, 1.0, 100.0, TimeInForce::Gtc, ClientOrderId::encode(id, 1), 1)
    }

    #[tokio::test]
    async fn batch_create_acks_every_order() {
        let venue = SimulatedVenueClient::new();
        let resp = venue.batch_create(vec![order(1), order(2)]).await.unwrap();
        assert_eq!(resp.len(), 2);
        assert!(resp
            .values()
            .all(|r| matches!(r, OrderResult::Acked { .. })));
    }

    #[tokio::test]
    async fn reject_all_rejects_every_order() {
        let venue = SimulatedVenueClient::new();
        *venue.reject_all.lock().unwrap() = Some("insufficient margin".into());
        let resp = venue.batch_create(vec![order(1)]).await.unwrap();
        assert!(matches!(
            resp.values().next().unwrap(),
            OrderResult::Rejected { .. }
        ));
    }
}
