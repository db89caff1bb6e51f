// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! KYC tier spending limits.
//!
//! Each tier maps to a fixed pair of daily and monthly limits, expressed in
//! the smallest currency unit. Tier 3 doubles as the fallback branch: any
//! tier other than 1 or 2 resolves to the enhanced limits. Callers validate
//! the tier with [`KycTier::try_from`] before relying on the table.

use crate::LedgerError;
use serde::{Deserialize, Serialize};

pub const BASIC_DAILY_LIMIT: u64 = 100_000_000;
pub const BASIC_MONTHLY_LIMIT: u64 = 1_000_000_000;

pub const STANDARD_DAILY_LIMIT: u64 = 500_000_000;
pub const STANDARD_MONTHLY_LIMIT: u64 = 5_000_000_000;

pub const ENHANCED_DAILY_LIMIT: u64 = 2_500_000_000;
pub const ENHANCED_MONTHLY_LIMIT: u64 = 25_000_000_000;

/// KYC classification of a card holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KycTier {
    Basic = 1,
    Standard = 2,
    Enhanced = 3,
}

impl KycTier {
    pub fn value(self) -> u64 {
        self as u64
    }

    pub fn limits(self) -> TierLimits {
        limits_for_tier(self.value())
    }
}

impl TryFrom<u64> for KycTier {
    type Error = LedgerError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(KycTier::Basic),
            2 => Ok(KycTier::Standard),
            3 => Ok(KycTier::Enhanced),
            other => Err(LedgerError::InvalidTier(other)),
        }
    }
}

/// Daily and monthly limits for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierLimits {
    pub daily: u64,
    pub monthly: u64,
}

/// Looks up the limits for a raw tier value.
pub fn limits_for_tier(tier: u64) -> TierLimits {
    match tier {
        1 => TierLimits {
            daily: BASIC_DAILY_LIMIT,
            monthly: BASIC_MONTHLY_LIMIT,
        },
        2 => TierLimits {
            daily: STANDARD_DAILY_LIMIT,
            monthly: STANDARD_MONTHLY_LIMIT,
        },
        _ => TierLimits {
            daily: ENHANCED_DAILY_LIMIT,
            monthly: ENHANCED_MONTHLY_LIMIT,
        },
    }
}

pub fn daily_limit(tier: u64) -> u64 {
    limits_for_tier(tier).daily
}

pub fn monthly_limit(tier: u64) -> u64 {
    limits_for_tier(tier).monthly
}
