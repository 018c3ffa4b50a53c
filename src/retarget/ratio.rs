// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Proportional retarget: `cur * (poolSize / prevWindowPoolSize)`.

use serde::Serialize;

use super::WindowInputs;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatioDiagnostics {
    pub pool_size: i64,
    pub prev_pool_size: i64,
    pub ratio: f64,
    pub candidate: i64,
}

/// The preamble guarantees a non-empty previous pool, so the ratio is
/// always finite.
pub(crate) fn candidate(inputs: &WindowInputs<'_>) -> (i64, RatioDiagnostics) {
    let cur = inputs.tip.ticket_price.0;
    let pool_size = i64::from(inputs.tip.pool_size);
    let prev_pool_size = i64::from(inputs.prev.pool_size);

    let ratio = pool_size as f64 / prev_pool_size as f64;
    let candidate = (cur as f64 * ratio) as i64;

    (candidate, RatioDiagnostics { pool_size, prev_pool_size, ratio, candidate })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::Amount;
    use crate::chain::ChainNode;

    fn node(height: u32, pool_size: u32, price: i64) -> ChainNode {
        ChainNode { height, pool_size, ticket_price: Amount(price), staked_coins: Amount::ZERO }
    }

    #[test]
    fn equal_pools_keep_price() {
        let tip = node(143, 40_000, 312_345_678);
        let prev = node(0, 40_000, 200_000_000);
        let (price, diag) = candidate(&WindowInputs { next_height: 144, tip: &tip, prev: &prev });
        assert_eq!(diag.ratio, 1.0);
        assert_eq!(price, 312_345_678);
    }

    #[test]
    fn growth_scales_price() {
        let tip = node(143, 44_000, 200_000_000);
        let prev = node(0, 40_000, 200_000_000);
        let (price, _) = candidate(&WindowInputs { next_height: 144, tip: &tip, prev: &prev });
        assert_eq!(price, (200_000_000f64 * (44_000f64 / 40_000f64)) as i64);
        assert_eq!(price, 220_000_000);
    }

    #[test]
    fn shrinking_pool_truncates() {
        let tip = node(143, 2, 100);
        let prev = node(0, 3, 100);
        let (price, _) = candidate(&WindowInputs { next_height: 144, tip: &tip, prev: &prev });
        // 100 * 0.666.. = 66.66.. -> 66
        assert_eq!(price, 66);
    }
}
