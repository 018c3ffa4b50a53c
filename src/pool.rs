// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Outstanding ticket pool: immature purchases plus the ordered live set.
//!
//! The retarget engine only reads the pool through [`TicketPoolView`]. The
//! write path (`purchase`, `mature`, `remove_live`) belongs to whoever drives
//! the chain and keeps the invariants: ticket ids are unique, and a ticket is
//! either immature or live, never both.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::amount::{Amount, TicketId};

/// Errors raised by the pool write path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("ticket {0} already outstanding")]
    DuplicateTicket(TicketId),

    #[error("ticket {0} is not immature")]
    NotImmature(TicketId),

    #[error("ticket {0} is not live")]
    NotLive(TicketId),
}

/// Purchased ticket that is not yet eligible to vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImmatureTicket {
    pub id: TicketId,
    pub price: Amount,
    /// Height of the block that included the purchase.
    pub purchase_height: u32,
}

/// Ticket eligible to vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveTicket {
    pub purchase_price: Amount,
    pub purchase_height: u32,
}

/// Sum and count over every outstanding ticket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolAggregate {
    pub count: u64,
    pub total_spent: i128,
}

impl PoolAggregate {
    /// Mean purchase price with truncating division; zero for an empty pool.
    pub fn mean_price(&self) -> Amount {
        if self.count == 0 {
            return Amount::ZERO;
        }
        let mean = self.total_spent / i128::from(self.count);
        Amount(i64::try_from(mean).unwrap_or(if mean < 0 { i64::MIN } else { i64::MAX }))
    }
}

/// Read-only pool access required by the retarget engine.
pub trait TicketPoolView {
    fn immature_tickets(&self) -> &[ImmatureTicket];

    /// Live tickets in key order.
    fn live_tickets(&self) -> Box<dyn Iterator<Item = (&TicketId, &LiveTicket)> + '_>;

    fn live_count(&self) -> usize;

    /// Aggregate purchase prices across immature and live tickets.
    fn aggregate(&self) -> PoolAggregate {
        let mut agg = PoolAggregate::default();
        for ticket in self.immature_tickets() {
            agg.count += 1;
            agg.total_spent += i128::from(ticket.price.0);
        }
        for (_, ticket) in self.live_tickets() {
            agg.count += 1;
            agg.total_spent += i128::from(ticket.purchase_price.0);
        }
        agg
    }
}

/// Owned pool backed by a `Vec` of immature tickets and a `BTreeMap` of
/// live tickets keyed by id.
#[derive(Debug, Clone, Default)]
pub struct TicketPool {
    immature: Vec<ImmatureTicket>,
    live: BTreeMap<TicketId, LiveTicket>,
}

impl TicketPool {
    pub fn new() -> Self {
        Self::default()
    }

    fn contains(&self, id: &TicketId) -> bool {
        self.live.contains_key(id) || self.immature.iter().any(|t| t.id == *id)
    }

    /// Record a new purchase as immature.
    pub fn purchase(&mut self, ticket: ImmatureTicket) -> Result<(), PoolError> {
        if self.contains(&ticket.id) {
            return Err(PoolError::DuplicateTicket(ticket.id));
        }
        self.immature.push(ticket);
        Ok(())
    }

    /// Insert a ticket directly into the live set (e.g. when seeding a pool).
    pub fn insert_live(&mut self, id: TicketId, ticket: LiveTicket) -> Result<(), PoolError> {
        if self.contains(&id) {
            return Err(PoolError::DuplicateTicket(id));
        }
        self.live.insert(id, ticket);
        Ok(())
    }

    /// Move an immature ticket into the live set, keeping its price.
    pub fn mature(&mut self, id: &TicketId) -> Result<(), PoolError> {
        let idx = self
            .immature
            .iter()
            .position(|t| t.id == *id)
            .ok_or(PoolError::NotImmature(*id))?;
        let ticket = self.immature.remove(idx);
        self.live.insert(
            ticket.id,
            LiveTicket {
                purchase_price: ticket.price,
                purchase_height: ticket.purchase_height,
            },
        );
        Ok(())
    }

    /// Mature every immature ticket purchased at or below `height`.
    /// Returns the number of tickets moved.
    pub fn mature_through(&mut self, height: u32) -> usize {
        let (ready, pending): (Vec<_>, Vec<_>) = self
            .immature
            .drain(..)
            .partition(|t| t.purchase_height <= height);
        self.immature = pending;
        for ticket in &ready {
            self.live.insert(
                ticket.id,
                LiveTicket {
                    purchase_price: ticket.price,
                    purchase_height: ticket.purchase_height,
                },
            );
        }
        ready.len()
    }

    /// Remove a live ticket (voted, missed or expired).
    pub fn remove_live(&mut self, id: &TicketId) -> Result<LiveTicket, PoolError> {
        self.live.remove(id).ok_or(PoolError::NotLive(*id))
    }

    /// Remove and return the first live ticket in key order.
    pub fn pop_first_live(&mut self) -> Option<(TicketId, LiveTicket)> {
        self.live.pop_first()
    }

    pub fn immature_count(&self) -> usize {
        self.immature.len()
    }

    /// Total value locked in live tickets.
    pub fn live_value(&self) -> Amount {
        self.live.values().map(|t| t.purchase_price).sum()
    }
}

impl TicketPoolView for TicketPool {
    fn immature_tickets(&self) -> &[ImmatureTicket] {
        &self.immature
    }

    fn live_tickets(&self) -> Box<dyn Iterator<Item = (&TicketId, &LiveTicket)> + '_> {
        Box::new(self.live.iter())
    }

    fn live_count(&self) -> usize {
        self.live.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn immature(seq: u64, price: i64, height: u32) -> ImmatureTicket {
        ImmatureTicket { id: TicketId::from_sequence(seq), price: Amount(price), purchase_height: height }
    }

    #[test]
    fn empty_pool_mean_is_zero() {
        let pool = TicketPool::new();
        let agg = pool.aggregate();
        assert_eq!(agg.count, 0);
        assert_eq!(agg.mean_price(), Amount::ZERO);
    }

    #[test]
    fn aggregate_spans_immature_and_live() {
        let mut pool = TicketPool::new();
        pool.purchase(immature(1, 100, 10)).expect("test: purchase");
        pool.purchase(immature(2, 200, 10)).expect("test: purchase");
        pool.insert_live(
            TicketId::from_sequence(3),
            LiveTicket { purchase_price: Amount(301), purchase_height: 1 },
        )
        .expect("test: live insert");

        let agg = pool.aggregate();
        assert_eq!(agg.count, 3);
        assert_eq!(agg.total_spent, 601);
        // 601 / 3 truncates to 200
        assert_eq!(agg.mean_price(), Amount(200));
    }

    #[test]
    fn maturing_preserves_price_and_exclusivity() {
        let mut pool = TicketPool::new();
        let t = immature(7, 5_000, 3);
        pool.purchase(t).expect("test: purchase");
        pool.mature(&t.id).expect("test: mature");

        assert_eq!(pool.immature_count(), 0);
        assert_eq!(pool.live_count(), 1);
        assert_eq!(pool.live_value(), Amount(5_000));
        assert_eq!(pool.mature(&t.id), Err(PoolError::NotImmature(t.id)));
        assert_eq!(pool.purchase(t), Err(PoolError::DuplicateTicket(t.id)));
    }

    #[test]
    fn live_value_saturates() {
        let mut pool = TicketPool::new();
        for seq in 0..3 {
            pool.insert_live(
                TicketId::from_sequence(seq),
                LiveTicket { purchase_price: Amount(i64::MAX / 2), purchase_height: 1 },
            )
            .expect("test: live insert");
        }
        assert_eq!(pool.live_value(), Amount(i64::MAX));
    }

    #[test]
    fn mature_through_height() {
        let mut pool = TicketPool::new();
        pool.purchase(immature(1, 10, 5)).expect("test: purchase");
        pool.purchase(immature(2, 10, 6)).expect("test: purchase");
        pool.purchase(immature(3, 10, 9)).expect("test: purchase");

        assert_eq!(pool.mature_through(6), 2);
        assert_eq!(pool.immature_count(), 1);
        assert_eq!(pool.live_count(), 2);
    }

    #[test]
    fn live_enumeration_is_key_ordered() {
        let mut pool = TicketPool::new();
        for seq in [9u64, 2, 5] {
            pool.insert_live(
                TicketId::from_sequence(seq),
                LiveTicket { purchase_price: Amount(1), purchase_height: 0 },
            )
            .expect("test: live insert");
        }
        let order: Vec<TicketId> = pool.live_tickets().map(|(id, _)| *id).collect();
        assert_eq!(
            order,
            vec![TicketId::from_sequence(2), TicketId::from_sequence(5), TicketId::from_sequence(9)]
        );
    }

    #[test]
    fn removing_unknown_live_ticket_fails() {
        let mut pool = TicketPool::new();
        let id = TicketId::from_sequence(4);
        assert_eq!(pool.remove_live(&id), Err(PoolError::NotLive(id)));
    }
}
