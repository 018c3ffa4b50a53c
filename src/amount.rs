// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Licensed under the Business Source License 1.1.
// See the LICENSE file in the repository root for full license text.

//! Currency amounts and ticket identifiers shared by the chain and pool views.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

/// Atoms per whole coin.
pub const ATOMS_PER_COIN: i64 = 100_000_000;

// ---------------------------------------------------------------------------
// Amount
// ---------------------------------------------------------------------------

/// Integer amount in atoms, the smallest currency unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(pub i64);

impl Amount {
    /// Zero atoms.
    pub const ZERO: Amount = Amount(0);

    pub fn from_atoms(atoms: i64) -> Self {
        Self(atoms)
    }

    /// Whole coins, saturating on overflow.
    pub fn from_coins(coins: i64) -> Self {
        Self(coins.saturating_mul(ATOMS_PER_COIN))
    }

    pub fn atoms(&self) -> i64 {
        self.0
    }

    /// Exact coin value with eight decimal places.
    pub fn to_coins(&self) -> Decimal {
        Decimal::new(self.0, 8)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

/// Saturates at the `i64` range, like [`Amount::from_coins`].
impl Add for Amount {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Amount {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Add::add)
    }
}

impl From<i64> for Amount {
    fn from(atoms: i64) -> Self {
        Self(atoms)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} coins", self.to_coins())
    }
}

// ---------------------------------------------------------------------------
// TicketId
// ---------------------------------------------------------------------------

/// Unique ticket identifier (32-byte purchase transaction hash).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TicketId(pub [u8; 32]);

impl TicketId {
    pub fn new(data: [u8; 32]) -> Self {
        Self(data)
    }

    /// Deterministic identifier derived from a sequence number, big-endian in
    /// the leading bytes so ordering follows the sequence.
    pub fn from_sequence(seq: u64) -> Self {
        let mut data = [0u8; 32];
        data[..8].copy_from_slice(&seq.to_be_bytes());
        Self(data)
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..8] {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, "...")
    }
}
