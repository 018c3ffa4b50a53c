// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Damped pool-force controller.
//!
//! Pool: `p, c, t` (previous window, current, target).
//! Price: `q, cur, n` (previous window, current, next).
//!
//! ```text
//! del   = (c - t) / t [/ maxFreshStakePerBlock]
//! m     = gain * e^(-|cur - q| / q)
//! n     = cur * (1 + m * del)
//! ```
//!
//! The damper shrinks the step when the price already moved a lot over the
//! previous window.

use serde::{Deserialize, Serialize};

use super::{truncate_price, RetargetError, WindowInputs};
use crate::params::{ConfigError, ParameterSet};

/// Tunables of the adaptive controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveConfig {
    /// Scale applied to the damper.
    pub gain: f64,
    /// Divide the pool force by `maxFreshStakePerBlock`.
    pub normalize_by_max_fresh_stake: bool,
    /// Reject pool deltas outside the range reachable in one window.
    pub strict: bool,
}

impl AdaptiveConfig {
    pub fn name(&self) -> &'static str {
        match (self.strict, self.normalize_by_max_fresh_stake) {
            (true, _) => "adaptive-strict",
            (false, true) => "adaptive",
            (false, false) => "adaptive-raw",
        }
    }
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self { gain: 1.0, normalize_by_max_fresh_stake: true, strict: false }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveDiagnostics {
    pub pool_size: i64,
    pub target_pool_size: i64,
    pub prev_pool_size: i64,
    pub prev_price: i64,
    pub pool_force: f64,
    pub damper: f64,
    pub pct_change: f64,
    /// `m * del * cur`, the absolute step before truncation.
    pub adjustment: f64,
    /// Normalised pool velocity, strict mode only.
    pub velocity: Option<f64>,
    pub candidate: i64,
}

/// Bounds `[A, B]` on the pool delta over one window: at most every ticket
/// votes and none is bought, at most `maxFreshStakePerBlock` are bought.
pub fn pool_delta_bounds(params: &ParameterSet) -> (i64, i64) {
    let window = params.window_size();
    let per_block = i64::from(params.tickets_per_block);
    let fresh = i64::from(params.max_fresh_stake_per_block);
    (-per_block * window, (fresh - per_block) * window)
}

pub(crate) fn candidate(
    cfg: &AdaptiveConfig,
    inputs: &WindowInputs<'_>,
    params: &ParameterSet,
) -> Result<(i64, AdaptiveDiagnostics), RetargetError> {
    let cur = inputs.tip.ticket_price.0;
    let c = i64::from(inputs.tip.pool_size);
    let t = params.target_pool_size();
    let p = i64::from(inputs.prev.pool_size);
    let q = inputs.prev.ticket_price.0;

    if q <= 0 {
        return Err(RetargetError::NonPositivePreviousPrice {
            height: inputs.next_height,
            ancestor_height: inputs.prev.height,
            price: inputs.prev.ticket_price,
        });
    }

    if (cfg.normalize_by_max_fresh_stake || cfg.strict) && params.max_fresh_stake_per_block == 0 {
        return Err(ConfigError::ZeroMaxFreshStake { algorithm: cfg.name() }.into());
    }

    let velocity = if cfg.strict {
        let (lower, upper) = pool_delta_bounds(params);
        let delta = c - p;
        if delta < lower || delta > upper {
            return Err(RetargetError::PoolDeltaOutOfBounds {
                height: inputs.next_height,
                pool_size: c,
                prev_pool_size: p,
                delta,
                lower,
                upper,
            });
        }
        Some((delta - lower).abs() as f64 / (upper - lower).abs() as f64)
    } else {
        None
    };

    let mut del = (c - t) as f64 / t as f64;
    if cfg.normalize_by_max_fresh_stake {
        del /= f64::from(params.max_fresh_stake_per_block);
    }

    let abs_price_delta = ((cur - q) as f64 / q as f64).abs();
    let m = cfg.gain * (-abs_price_delta).exp();
    let pct_change = m * del;
    let n = cur as f64 * (1.0 + pct_change);
    let candidate = truncate_price(n, inputs.next_height, "adaptive")?;

    Ok((
        candidate,
        AdaptiveDiagnostics {
            pool_size: c,
            target_pool_size: t,
            prev_pool_size: p,
            prev_price: q,
            pool_force: del,
            damper: m,
            pct_change,
            adjustment: pct_change * cur as f64,
            velocity,
            candidate,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::Amount;
    use crate::chain::ChainNode;

    fn node(height: u32, pool_size: u32, price: i64) -> ChainNode {
        ChainNode { height, pool_size, ticket_price: Amount(price), staked_coins: Amount::ZERO }
    }

    fn run(
        cfg: AdaptiveConfig,
        tip: ChainNode,
        prev: ChainNode,
        params: &ParameterSet,
    ) -> Result<(i64, AdaptiveDiagnostics), RetargetError> {
        let inputs = WindowInputs { next_height: i64::from(tip.height) + 1, tip: &tip, prev: &prev };
        candidate(&cfg, &inputs, params)
    }

    #[test]
    fn pool_at_target_keeps_price() {
        let params = ParameterSet::mainnet();
        let tip = node(431, 40_960, 300_000_000);
        let prev = node(287, 40_000, 250_000_000);
        let (price, diag) = run(AdaptiveConfig::default(), tip, prev, &params).expect("test: candidate");
        assert_eq!(diag.pool_force, 0.0);
        assert_eq!(price, 300_000_000);
    }

    #[test]
    fn oversized_pool_raises_price() {
        let params = ParameterSet::mainnet();
        let tip = node(431, 45_056, 200_000_000);
        let prev = node(287, 44_000, 200_000_000);
        let cfg = AdaptiveConfig { gain: 1.0, normalize_by_max_fresh_stake: false, strict: false };
        let (price, diag) = run(cfg, tip, prev, &params).expect("test: candidate");
        // del = 4096 / 40960 = 0.1, no prior move so damper = 1
        assert!((diag.pool_force - 0.1).abs() < 1e-12);
        assert_eq!(diag.damper, 1.0);
        assert_eq!(price, (200_000_000f64 * 1.1) as i64);
    }

    #[test]
    fn normalisation_divides_force() {
        let params = ParameterSet::mainnet();
        let tip = node(431, 45_056, 200_000_000);
        let prev = node(287, 44_000, 200_000_000);
        let (_, raw) = run(
            AdaptiveConfig { normalize_by_max_fresh_stake: false, ..AdaptiveConfig::default() },
            tip,
            prev,
            &params,
        )
        .expect("test: candidate");
        let (_, normed) = run(AdaptiveConfig::default(), tip, prev, &params).expect("test: candidate");
        assert!((normed.pool_force * 20.0 - raw.pool_force).abs() < 1e-12);
    }

    #[test]
    fn damper_shrinks_after_large_move() {
        let params = ParameterSet::mainnet();
        let prev_still = node(287, 44_000, 400_000_000);
        let prev_moved = node(287, 44_000, 200_000_000);
        let tip = node(431, 45_056, 400_000_000);
        let (_, still) = run(AdaptiveConfig::default(), tip, prev_still, &params).expect("test: candidate");
        let (_, moved) = run(AdaptiveConfig::default(), tip, prev_moved, &params).expect("test: candidate");
        assert_eq!(still.damper, 1.0);
        // |400 - 200| / 200 = 1 -> e^-1
        assert!((moved.damper - (-1.0f64).exp()).abs() < 1e-12);
        assert!(moved.candidate < still.candidate);
    }

    #[test]
    fn gain_scales_damper() {
        let params = ParameterSet::mainnet();
        let tip = node(431, 45_056, 200_000_000);
        let prev = node(287, 44_000, 200_000_000);
        let cfg = AdaptiveConfig { gain: 3.0, ..AdaptiveConfig::default() };
        let (_, diag) = run(cfg, tip, prev, &params).expect("test: candidate");
        assert_eq!(diag.damper, 3.0);
    }

    #[test]
    fn strict_mode_reports_velocity() {
        let params = ParameterSet::mainnet();
        let (lower, upper) = pool_delta_bounds(&params);
        assert_eq!((lower, upper), (-720, 2_160));

        let tip = node(431, 40_000, 200_000_000);
        let prev = node(287, 40_000, 200_000_000);
        let cfg = AdaptiveConfig { strict: true, ..AdaptiveConfig::default() };
        let (_, diag) = run(cfg, tip, prev, &params).expect("test: candidate");
        // D = 0 -> |0 + 720| / 2880
        assert_eq!(diag.velocity, Some(0.25));
    }

    #[test]
    fn strict_mode_rejects_impossible_delta() {
        let params = ParameterSet::mainnet();
        let tip = node(431, 43_000, 200_000_000);
        let prev = node(287, 40_000, 200_000_000);
        let cfg = AdaptiveConfig { strict: true, ..AdaptiveConfig::default() };
        let err = run(cfg, tip, prev, &params).expect_err("test: delta beyond bound");
        assert_eq!(
            err,
            RetargetError::PoolDeltaOutOfBounds {
                height: 432,
                pool_size: 43_000,
                prev_pool_size: 40_000,
                delta: 3_000,
                lower: -720,
                upper: 2_160,
            }
        );

        // the lenient variant prices the same state
        assert!(run(AdaptiveConfig::default(), tip, prev, &params).is_ok());
    }

    #[test]
    fn zero_previous_price_is_a_fault() {
        let params = ParameterSet::mainnet();
        let tip = node(431, 40_000, 200_000_000);
        let prev = node(287, 40_000, 0);
        let err = run(AdaptiveConfig::default(), tip, prev, &params).expect_err("test: zero q");
        assert!(matches!(err, RetargetError::NonPositivePreviousPrice { ancestor_height: 287, .. }));
    }

    #[test]
    fn zero_fresh_stake_only_blocks_variants_that_read_it() {
        let params = ParameterSet { max_fresh_stake_per_block: 0, ..ParameterSet::mainnet() };
        let tip = node(431, 45_056, 200_000_000);
        let prev = node(287, 44_000, 200_000_000);

        let err = run(AdaptiveConfig::default(), tip, prev, &params).expect_err("test: zero fresh");
        assert_eq!(err, RetargetError::Config(ConfigError::ZeroMaxFreshStake { algorithm: "adaptive" }));

        let strict = AdaptiveConfig { strict: true, ..AdaptiveConfig::default() };
        assert!(matches!(run(strict, tip, prev, &params), Err(RetargetError::Config(_))));

        let raw = AdaptiveConfig { normalize_by_max_fresh_stake: false, ..AdaptiveConfig::default() };
        assert!(run(raw, tip, prev, &params).is_ok());
    }

    #[test]
    fn strict_bounds_with_fresh_below_votes() {
        let params = ParameterSet { max_fresh_stake_per_block: 3, ..ParameterSet::mainnet() };
        // the pool can only shrink: [-720, -288]
        assert_eq!(pool_delta_bounds(&params), (-720, -288));
        let tip = node(431, 39_500, 200_000_000);
        let prev = node(287, 40_000, 200_000_000);
        let cfg = AdaptiveConfig { strict: true, ..AdaptiveConfig::default() };
        let (_, diag) = run(cfg, tip, prev, &params).expect("test: candidate");
        // |-500 + 720| / 432
        assert_eq!(diag.velocity, Some(220.0 / 432.0));
    }
}
