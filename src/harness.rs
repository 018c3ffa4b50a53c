// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Replay harness: owns a chain and ticket pool and records the engine's
//! price on every appended block.
//!
//! The harness does not decide how tickets are bought, vote or expire. The
//! caller mutates [`ReplayHarness::pool_mut`] and supplies the pool size and
//! locked value of each block it appends.

use log::info;
use serde::Serialize;

use crate::amount::Amount;
use crate::chain::{Chain, ChainError, ChainNode, ChainView};
use crate::params::{ConfigError, ParameterSet};
use crate::pool::TicketPool;
use crate::retarget::{Algorithm, Retarget, RetargetError, RetargetReason};

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("retarget failed at height {height}: {source}")]
    Retarget {
        height: i64,
        #[source]
        source: RetargetError,
    },
}

/// One appended block and the retarget result that priced it.
#[derive(Debug, Clone, Serialize)]
pub struct BlockRecord {
    pub node: ChainNode,
    pub retarget: Retarget,
}

pub struct ReplayHarness {
    params: ParameterSet,
    algorithm: Algorithm,
    chain: Chain,
    pool: TicketPool,
    retarget_count: u64,
    clamp_count: u64,
}

impl ReplayHarness {
    /// Create a harness after validating the parameters.
    pub fn new(params: ParameterSet, algorithm: Algorithm) -> Result<Self, HarnessError> {
        params.validate()?;
        info!("replay harness using {} with {:?}", algorithm, params);
        Ok(Self {
            params,
            algorithm,
            chain: Chain::new(),
            pool: TicketPool::new(),
            retarget_count: 0,
            clamp_count: 0,
        })
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn algorithm(&self) -> &Algorithm {
        &self.algorithm
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn pool(&self) -> &TicketPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut TicketPool {
        &mut self.pool
    }

    /// Price of a ticket in the next block.
    pub fn next_price(&self) -> Result<Retarget, HarnessError> {
        self.algorithm
            .next_price(&self.chain, &self.pool, &self.params)
            .map_err(|source| HarnessError::Retarget {
                height: self.chain.tip().map_or(0, |t| i64::from(t.height) + 1),
                source,
            })
    }

    /// Price the next block, then append it with the given pool state.
    pub fn append_block(
        &mut self,
        pool_size: u32,
        staked_coins: Amount,
    ) -> Result<BlockRecord, HarnessError> {
        let retarget = self.next_price()?;
        let height = u32::try_from(retarget.next_height)
            .map_err(|_| ChainError::HeightOverflow(u32::MAX))?;
        let node = ChainNode { height, pool_size, ticket_price: retarget.price, staked_coins };
        self.chain.append(node)?;

        if let RetargetReason::Retargeted { clamped } = retarget.reason {
            self.retarget_count += 1;
            if clamped {
                self.clamp_count += 1;
            }
        }
        Ok(BlockRecord { node, retarget })
    }

    /// Number of window boundaries where a formula ran.
    pub fn retarget_count(&self) -> u64 {
        self.retarget_count
    }

    /// Number of those where the floor was applied.
    pub fn clamp_count(&self) -> u64 {
        self.clamp_count
    }
}
