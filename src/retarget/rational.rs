// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Rational-function retarget around the mean outstanding ticket price.
//!
//! ```text
//!                    a x
//! f(x) = d - k * ----------------
//!                (x - b)(x + c)
//! ```
//!
//! `x` is the deviation of the pool from its target, `d` the mean purchase
//! price over immature and live tickets, `b` and `c` the upper and lower
//! boundaries where the function has its poles.

use serde::{Deserialize, Serialize};

use super::{truncate_price, RetargetError, WindowInputs};
use crate::params::ParameterSet;
use crate::pool::TicketPoolView;

/// Shape constants of the rational curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RationalShape {
    /// Slope modifier.
    pub a: i64,
    /// Upper pole (deviation above target).
    pub b: i64,
    /// Lower pole (deviation below target).
    pub c: i64,
    /// Scale applied to the rational term, in atoms.
    pub k: f64,
}

impl Default for RationalShape {
    fn default() -> Self {
        Self { a: 100_000, b: 2_880, c: 2_880, k: 1e8 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RationalDiagnostics {
    pub pool_size: i64,
    pub deviation: i64,
    pub outstanding_tickets: u64,
    pub mean_price: i64,
    pub rational_term: f64,
    pub candidate: i64,
}

pub(crate) fn candidate<P>(
    shape: &RationalShape,
    inputs: &WindowInputs<'_>,
    pool: &P,
    params: &ParameterSet,
) -> Result<(i64, RationalDiagnostics), RetargetError>
where
    P: TicketPoolView + ?Sized,
{
    let pool_size = i64::from(inputs.tip.pool_size);
    let x = pool_size - params.target_pool_size();
    if x == shape.b || i128::from(x) == -i128::from(shape.c) {
        return Err(RetargetError::RationalPole {
            height: inputs.next_height,
            pool_size,
            deviation: x,
            b: shape.b,
            c: shape.c,
        });
    }

    let agg = pool.aggregate();
    let d = agg.mean_price().0;

    let numerator = i128::from(shape.a) * i128::from(x);
    let denominator = (i128::from(x) - i128::from(shape.b))
        .checked_mul(i128::from(x) + i128::from(shape.c))
        .ok_or(RetargetError::NonFinitePrice {
            height: inputs.next_height,
            algorithm: "rational",
            value: f64::INFINITY,
        })?;
    let term = numerator as f64 / denominator as f64;
    let candidate = truncate_price(d as f64 - shape.k * term, inputs.next_height, "rational")?;

    Ok((
        candidate,
        RationalDiagnostics {
            pool_size,
            deviation: x,
            outstanding_tickets: agg.count,
            mean_price: d,
            rational_term: term,
            candidate,
        },
    ))
}
