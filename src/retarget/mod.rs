// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Ticket price retargeting.
//!
//! Every [`Algorithm`] shares the same gating before its own formula runs:
//!
//! ```text
//! next < coinbaseMaturity + 1          -> minimumStakeDiff
//! next % stakeDiffWindowSize != 0      -> tip price (constant within a window)
//! no prior window / prior pool empty   -> tip price
//! otherwise                            -> max(formula, minimumStakeDiff)
//! ```
//!
//! Computation is pure: the chain and pool views are only read, and the
//! returned [`Diagnostics`] are advisory.

pub mod adaptive;
pub mod linear;
pub mod ratio;
pub mod rational;

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::amount::Amount;
use crate::chain::{ChainNode, ChainView};
use crate::params::{ConfigError, ParameterSet};
use crate::pool::TicketPoolView;

pub use adaptive::{AdaptiveConfig, AdaptiveDiagnostics};
pub use linear::LinearDiagnostics;
pub use ratio::RatioDiagnostics;
pub use rational::{RationalDiagnostics, RationalShape};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Faults local to a single retarget call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RetargetError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("adaptive gain must be finite, got {0}")]
    NonFiniteGain(f64),

    #[error("previous window price at height {ancestor_height} is {price:?} (retargeting height {height})")]
    NonPositivePreviousPrice { height: i64, ancestor_height: u32, price: Amount },

    #[error(
        "pool delta {delta} at height {height} outside [{lower}, {upper}] \
         (pool size {pool_size}, previous window {prev_pool_size})"
    )]
    PoolDeltaOutOfBounds {
        height: i64,
        pool_size: i64,
        prev_pool_size: i64,
        delta: i64,
        lower: i64,
        upper: i64,
    },

    #[error(
        "rational pole at height {height}: pool size {pool_size}, deviation {deviation} \
         with shape b={b} c={c}"
    )]
    RationalPole { height: i64, pool_size: i64, deviation: i64, b: i64, c: i64 },

    #[error("non-finite candidate price {value} at height {height} ({algorithm})")]
    NonFinitePrice { height: i64, algorithm: &'static str, value: f64 },
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Why a particular price was returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RetargetReason {
    /// Tickets cannot exist yet; minimum price.
    PreActivation,
    /// Not on a window boundary; tip price carried forward.
    WithinWindow,
    /// Boundary with no usable prior window; tip price carried forward.
    FirstWindow,
    /// Formula applied; `clamped` when the floor was hit.
    Retargeted { clamped: bool },
}

/// Intermediate values of the formula that produced a price.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "algorithm", rename_all = "camelCase")]
pub enum Diagnostics {
    Adaptive(AdaptiveDiagnostics),
    Ratio(RatioDiagnostics),
    Rational(RationalDiagnostics),
    LinearBlend(LinearDiagnostics),
}

/// Result of one retarget evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Retarget {
    pub next_height: i64,
    pub price: Amount,
    pub reason: RetargetReason,
    /// Present only when a formula ran.
    pub diagnostics: Option<Diagnostics>,
}

impl Retarget {
    fn carried(next_height: i64, price: Amount, reason: RetargetReason) -> Self {
        Self { next_height, price, reason, diagnostics: None }
    }
}

/// Boundary inputs handed to each formula.
#[derive(Debug, Clone, Copy)]
pub struct WindowInputs<'a> {
    pub next_height: i64,
    pub tip: &'a ChainNode,
    /// Node one window back; guaranteed to have a non-empty pool.
    pub prev: &'a ChainNode,
}

// ---------------------------------------------------------------------------
// Algorithm
// ---------------------------------------------------------------------------

/// Selectable price formula with its tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Algorithm {
    /// Damped pool-force controller.
    Adaptive(AdaptiveConfig),
    /// Price scaled by the pool growth over the last window.
    Ratio,
    /// Mean outstanding price shifted by a rational function of pool deviation.
    Rational(RationalShape),
    /// Locked value divided between target and actual pool sizes.
    LinearBlend { weight: i64 },
}

impl Algorithm {
    /// Adaptive controller with the pool force normalised by
    /// `maxFreshStakePerBlock`.
    pub fn adaptive(gain: f64) -> Self {
        Self::Adaptive(AdaptiveConfig { gain, normalize_by_max_fresh_stake: true, strict: false })
    }

    /// Adaptive controller without normalisation.
    pub fn adaptive_unnormalized(gain: f64) -> Self {
        Self::Adaptive(AdaptiveConfig { gain, normalize_by_max_fresh_stake: false, strict: false })
    }

    /// Normalised adaptive controller that rejects out-of-model pool deltas.
    pub fn adaptive_strict(gain: f64) -> Self {
        Self::Adaptive(AdaptiveConfig { gain, normalize_by_max_fresh_stake: true, strict: true })
    }

    pub fn rational() -> Self {
        Self::Rational(RationalShape::default())
    }

    pub fn linear_blend() -> Self {
        Self::LinearBlend { weight: 1 }
    }

    /// One of each named variant with reference tunables.
    pub fn catalog(gain: f64) -> Vec<Algorithm> {
        vec![
            Self::adaptive(gain),
            Self::adaptive_unnormalized(gain),
            Self::adaptive_strict(gain),
            Self::Ratio,
            Self::rational(),
            Self::linear_blend(),
        ]
    }

    /// Short stable name for reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Adaptive(cfg) => cfg.name(),
            Self::Ratio => "ratio",
            Self::Rational(_) => "rational",
            Self::LinearBlend { .. } => "linear-blend",
        }
    }

    /// Compute the ticket price for the block after the chain tip.
    pub fn next_price<C, P>(
        &self,
        chain: &C,
        pool: &P,
        params: &ParameterSet,
    ) -> Result<Retarget, RetargetError>
    where
        C: ChainView + ?Sized,
        P: TicketPoolView + ?Sized,
    {
        params.validate()?;
        if let Self::Adaptive(cfg) = self {
            if !cfg.gain.is_finite() {
                return Err(RetargetError::NonFiniteGain(cfg.gain));
            }
        }

        let tip = chain.tip();
        let next_height = tip.map_or(0, |t| i64::from(t.height) + 1);
        let tip = match tip {
            Some(tip) if next_height >= params.stake_diff_start_height() => tip,
            _ => {
                trace!("height {} before stake activation", next_height);
                return Ok(Retarget::carried(
                    next_height,
                    params.minimum_stake_diff,
                    RetargetReason::PreActivation,
                ));
            }
        };

        let cur_diff = tip.ticket_price;
        let window = params.window_size();
        if next_height % window != 0 {
            return Ok(Retarget::carried(next_height, cur_diff, RetargetReason::WithinWindow));
        }

        let prev = chain
            .ancestor_at_height(next_height - window)
            .filter(|node| node.pool_size > 0);
        let Some(prev) = prev else {
            trace!("height {} has no prior window, keeping {}", next_height, cur_diff);
            return Ok(Retarget::carried(next_height, cur_diff, RetargetReason::FirstWindow));
        };

        let inputs = WindowInputs { next_height, tip, prev };
        let (candidate, diagnostics) = match self {
            Self::Adaptive(cfg) => {
                let (c, d) = adaptive::candidate(cfg, &inputs, params)?;
                (c, Diagnostics::Adaptive(d))
            }
            Self::Ratio => {
                let (c, d) = ratio::candidate(&inputs);
                (c, Diagnostics::Ratio(d))
            }
            Self::Rational(shape) => {
                let (c, d) = rational::candidate(shape, &inputs, pool, params)?;
                (c, Diagnostics::Rational(d))
            }
            Self::LinearBlend { weight } => {
                let (c, d) = linear::candidate(*weight, &inputs, params);
                (c, Diagnostics::LinearBlend(d))
            }
        };

        let floor = params.minimum_stake_diff;
        let clamped = candidate < floor.0;
        let price = if clamped { floor } else { Amount(candidate) };
        debug!(
            "{} retarget at height {}: {} -> {} (candidate {}, clamped {}) {:?}",
            self.name(),
            next_height,
            cur_diff.0,
            price.0,
            candidate,
            clamped,
            diagnostics
        );

        Ok(Retarget {
            next_height,
            price,
            reason: RetargetReason::Retargeted { clamped },
            diagnostics: Some(diagnostics),
        })
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Adaptive(cfg) => write!(f, "{} (gain {})", self.name(), cfg.gain),
            Self::LinearBlend { weight } => write!(f, "{} (weight {})", self.name(), weight),
            _ => f.write_str(self.name()),
        }
    }
}

/// Truncate a fractional price toward zero, rejecting NaN and infinities.
pub(crate) fn truncate_price(
    value: f64,
    height: i64,
    algorithm: &'static str,
) -> Result<i64, RetargetError> {
    if !value.is_finite() {
        return Err(RetargetError::NonFinitePrice { height, algorithm, value });
    }
    Ok(value as i64)
}
