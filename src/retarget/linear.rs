// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Locked-value blend:
//! `x * (locked / target) + (1 - x) * (locked / poolSize)`.
//!
//! Each term is truncated independently before the sum. With the reference
//! weight of 1 the second term vanishes.

use serde::Serialize;

use super::WindowInputs;
use crate::params::ParameterSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinearDiagnostics {
    pub weight: i64,
    pub locked: i64,
    pub target_pool_size: i64,
    pub pool_size: i64,
    pub candidate: i64,
}

fn saturate(v: i128) -> i64 {
    i64::try_from(v).unwrap_or(if v < 0 { i64::MIN } else { i64::MAX })
}

pub(crate) fn candidate(
    weight: i64,
    inputs: &WindowInputs<'_>,
    params: &ParameterSet,
) -> (i64, LinearDiagnostics) {
    let target = i128::from(params.target_pool_size());
    let locked = i128::from(inputs.tip.staked_coins.0);
    let pool_size = i128::from(inputs.tip.pool_size);
    let x = i128::from(weight);

    let price = if pool_size == 0 {
        locked / target
    } else {
        x * locked / target + (1 - x) * (locked / pool_size)
    };
    let candidate = saturate(price);

    (
        candidate,
        LinearDiagnostics {
            weight,
            locked: inputs.tip.staked_coins.0,
            target_pool_size: params.target_pool_size(),
            pool_size: i64::from(inputs.tip.pool_size),
            candidate,
        },
    )
}
