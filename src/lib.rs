// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Stake Retarget Lab - ticket price algorithm evaluator

pub mod amount;
pub mod params;
pub mod chain;
pub mod pool;
pub mod retarget;
pub mod harness;

pub use amount::{Amount, TicketId};
pub use chain::{Chain, ChainError, ChainNode, ChainView};
pub use harness::{BlockRecord, HarnessError, ReplayHarness};
pub use params::{ConfigError, ParameterSet};
pub use pool::{ImmatureTicket, LiveTicket, PoolAggregate, PoolError, TicketPool, TicketPoolView};
pub use retarget::{AdaptiveConfig, Algorithm, Diagnostics, RationalShape, Retarget, RetargetError, RetargetReason};

use wasm_bindgen::prelude::*;

// ─── WASM Interface ──────────────────────────────────────────────────────────

fn to_js<E: std::fmt::Display>(e: E) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Browser-facing wrapper around [`ReplayHarness`].
#[wasm_bindgen]
pub struct WasmHarness {
    inner: ReplayHarness,
    ticket_seq: u64,
}

#[wasm_bindgen]
impl WasmHarness {
    /// `params_json` is a camelCase [`ParameterSet`]; `algorithm_json` a
    /// tagged [`Algorithm`], e.g. `{"kind":"ratio"}`.
    #[wasm_bindgen(constructor)]
    pub fn new(params_json: &str, algorithm_json: &str) -> Result<WasmHarness, JsValue> {
        #[cfg(target_arch = "wasm32")]
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));

        let params = ParameterSet::from_json(params_json).map_err(to_js)?;
        let algorithm: Algorithm = serde_json::from_str(algorithm_json).map_err(to_js)?;
        let inner = ReplayHarness::new(params, algorithm).map_err(to_js)?;
        Ok(Self { inner, ticket_seq: 0 })
    }

    /// Price the next block and append it. Returns the block record.
    pub fn append_block(&mut self, pool_size: u32, staked_atoms: i64) -> Result<JsValue, JsValue> {
        let record = self.inner.append_block(pool_size, Amount(staked_atoms)).map_err(to_js)?;
        serde_wasm_bindgen::to_value(&record).map_err(JsValue::from)
    }

    /// Retarget result for the next block without appending.
    pub fn next_price(&self) -> Result<JsValue, JsValue> {
        let retarget = self.inner.next_price().map_err(to_js)?;
        serde_wasm_bindgen::to_value(&retarget).map_err(JsValue::from)
    }

    /// Record an immature purchase; returns the assigned ticket id.
    pub fn purchase_ticket(&mut self, price: i64, purchase_height: u32) -> Result<String, JsValue> {
        let id = TicketId::from_sequence(self.ticket_seq);
        self.ticket_seq += 1;
        self.inner
            .pool_mut()
            .purchase(ImmatureTicket { id, price: Amount(price), purchase_height })
            .map_err(to_js)?;
        Ok(id.to_string())
    }

    /// Mature all purchases at or below `height`.
    pub fn mature_through(&mut self, height: u32) -> u32 {
        self.inner.pool_mut().mature_through(height) as u32
    }

    /// Remove the oldest live ticket. Returns false when none is live.
    pub fn retire_oldest(&mut self) -> bool {
        self.inner.pool_mut().pop_first_live().is_some()
    }

    pub fn live_count(&self) -> u32 {
        self.inner.pool().live_count() as u32
    }

    pub fn tip_price(&self) -> i64 {
        self.inner.chain().tip().map_or(0, |n| n.ticket_price.0)
    }

    pub fn chain_length(&self) -> u32 {
        self.inner.chain().len() as u32
    }
}
