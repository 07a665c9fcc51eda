//! Pending limit-sell orders.
//!
//! Orders fill whole or not at all, always at their own target price. When
//! several fill on one bar they come back in ascending target order, ties
//! broken by id. Nothing is cancelled implicitly.

use chrono::NaiveDateTime;
use std::collections::BTreeMap;

use super::ohlcv::Bar;
use super::order::{Order, OrderId, OrderStatus, ladder_sizes, ladder_targets};

#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    next_id: u64,
    active: BTreeMap<OrderId, Order>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn get(&self, id: OrderId) -> Option<&Order> {
        self.active.get(&id)
    }

    /// Shares committed to active orders.
    pub fn active_shares(&self) -> i64 {
        self.active.values().map(|o| o.shares).sum()
    }

    pub fn place(
        &mut self,
        shares: i64,
        target_price: f64,
        buy_price: f64,
        created_at: NaiveDateTime,
    ) -> OrderId {
        self.next_id += 1;
        let id = OrderId(self.next_id);
        self.active.insert(
            id,
            Order {
                id,
                shares,
                target_price,
                buy_price,
                created_at,
                status: OrderStatus::Active,
            },
        );
        id
    }

    /// Places the ten-rung ladder for one buy. Rungs that would carry zero
    /// shares are not placed.
    pub fn place_ladder(
        &mut self,
        shares_bought: i64,
        buy_price: f64,
        increment: f64,
        created_at: NaiveDateTime,
    ) -> Vec<OrderId> {
        ladder_sizes(shares_bought)
            .into_iter()
            .zip(ladder_targets(buy_price, increment))
            .filter(|(shares, _)| *shares > 0)
            .map(|(shares, target)| self.place(shares, target, buy_price, created_at))
            .collect()
    }

    /// Removes and returns every order the bar fills, marked filled.
    pub fn match_bar(&mut self, bar: &Bar) -> Vec<Order> {
        let ids: Vec<OrderId> = self
            .active
            .values()
            .filter(|o| o.fills_on(bar))
            .map(|o| o.id)
            .collect();

        let mut filled: Vec<Order> = ids
            .into_iter()
            .filter_map(|id| self.active.remove(&id))
            .map(|mut o| {
                o.status = OrderStatus::Filled { at: bar.timestamp };
                o
            })
            .collect();
        filled.sort_by(|a, b| {
            a.target_price
                .total_cmp(&b.target_price)
                .then(a.id.cmp(&b.id))
        });
        filled
    }

    /// Active orders by ascending target price.
    pub fn pending(&self) -> Vec<Order> {
        let mut pending: Vec<Order> = self.active.values().cloned().collect();
        pending.sort_by(|a, b| {
            a.target_price
                .total_cmp(&b.target_price)
                .then(a.id.cmp(&b.id))
        });
        pending
    }
}
