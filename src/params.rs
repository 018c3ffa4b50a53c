// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Consensus constants read by the retarget algorithms.
//!
//! A [`ParameterSet`] is loaded once per run (from a preset or JSON) and must
//! pass [`ParameterSet::validate`] before any price is computed. The
//! algorithms assume positive window and target sizes afterwards. A zero
//! `maxFreshStakePerBlock` is only a fault for the adaptive variants that
//! divide by it.

use serde::{Deserialize, Serialize};

use crate::amount::Amount;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Configuration faults. Not recoverable inside the engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("stake difficulty window size must be positive")]
    ZeroWindowSize,

    #[error("tickets per block must be positive")]
    ZeroTicketsPerBlock,

    #[error("target pool size is zero ({tickets_per_block} tickets/block x {ticket_pool_size} blocks)")]
    ZeroTargetPoolSize { tickets_per_block: u32, ticket_pool_size: u32 },

    #[error("target pool size overflows ({tickets_per_block} x {ticket_pool_size})")]
    TargetPoolSizeOverflow { tickets_per_block: u32, ticket_pool_size: u32 },

    #[error("max fresh stake per block must be positive for {algorithm}")]
    ZeroMaxFreshStake { algorithm: &'static str },

    #[error("minimum stake difficulty must be positive, got {0}")]
    NonPositiveMinimumStakeDiff(i64),

    #[error("invalid parameter set: {0}")]
    Parse(String),
}

// ---------------------------------------------------------------------------
// ParameterSet
// ---------------------------------------------------------------------------

/// Fixed consensus constants for one simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSet {
    /// Blocks before a coinbase (and therefore any ticket) can be spent.
    pub coinbase_maturity: u32,
    /// Retarget interval in blocks.
    pub stake_diff_window_size: u32,
    /// Votes per block.
    pub tickets_per_block: u32,
    /// Target pool size in blocks-worth of tickets.
    pub ticket_pool_size: u32,
    /// Upper bound on new tickets per block.
    pub max_fresh_stake_per_block: u32,
    /// Price floor.
    pub minimum_stake_diff: Amount,
}

impl ParameterSet {
    /// Main network constants.
    pub fn mainnet() -> Self {
        Self {
            coinbase_maturity: 256,
            stake_diff_window_size: 144,
            tickets_per_block: 5,
            ticket_pool_size: 8192,
            max_fresh_stake_per_block: 20,
            minimum_stake_diff: Amount(200_000_000),
        }
    }

    /// Test network constants.
    pub fn testnet() -> Self {
        Self {
            coinbase_maturity: 16,
            stake_diff_window_size: 144,
            tickets_per_block: 5,
            ticket_pool_size: 1024,
            max_fresh_stake_per_block: 20,
            minimum_stake_diff: Amount(20_000_000),
        }
    }

    /// Simulation network constants: short windows and a small pool.
    pub fn simnet() -> Self {
        Self {
            coinbase_maturity: 16,
            stake_diff_window_size: 8,
            tickets_per_block: 5,
            ticket_pool_size: 64,
            max_fresh_stake_per_block: 20,
            minimum_stake_diff: Amount(20_000),
        }
    }

    /// Parse and validate a JSON parameter set.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let params: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    /// Fail-fast startup validation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stake_diff_window_size == 0 {
            return Err(ConfigError::ZeroWindowSize);
        }
        if self.tickets_per_block == 0 {
            return Err(ConfigError::ZeroTicketsPerBlock);
        }
        match i64::from(self.tickets_per_block).checked_mul(i64::from(self.ticket_pool_size)) {
            Some(0) => {
                return Err(ConfigError::ZeroTargetPoolSize {
                    tickets_per_block: self.tickets_per_block,
                    ticket_pool_size: self.ticket_pool_size,
                })
            }
            None => {
                return Err(ConfigError::TargetPoolSizeOverflow {
                    tickets_per_block: self.tickets_per_block,
                    ticket_pool_size: self.ticket_pool_size,
                })
            }
            Some(_) => {}
        }
        if self.minimum_stake_diff.0 <= 0 {
            return Err(ConfigError::NonPositiveMinimumStakeDiff(self.minimum_stake_diff.0));
        }
        Ok(())
    }

    /// First height at which tickets could exist.
    pub fn stake_diff_start_height(&self) -> i64 {
        i64::from(self.coinbase_maturity) + 1
    }

    /// Target number of live tickets: `ticketsPerBlock x ticketPoolSize`.
    pub fn target_pool_size(&self) -> i64 {
        i64::from(self.tickets_per_block).saturating_mul(i64::from(self.ticket_pool_size))
    }

    pub fn window_size(&self) -> i64 {
        i64::from(self.stake_diff_window_size)
    }
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self::mainnet()
    }
}
