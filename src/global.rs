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

//! Ledger-wide shared state.

use crate::base::Identity;
use crate::config::LedgerConfig;
use serde::{Deserialize, Serialize};

/// Shared record written once at creation and updated by owner calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalLedger {
    pub owner: Identity,
    pub base_currency: String,
    pub total_cards: u64,
    pub contract_version: String,
    pub price_feed_id: u64,
    /// Set by `emergency_pause`. No operation consults it.
    pub paused: bool,
}

impl GlobalLedger {
    pub fn new(owner: Identity, config: &LedgerConfig) -> Self {
        Self {
            owner,
            base_currency: config.base_currency.clone(),
            total_cards: 0,
            contract_version: config.contract_version.clone(),
            price_feed_id: 0,
            paused: false,
        }
    }

    pub fn caller_is_owner(&self, caller: &Identity) -> bool {
        &self.owner == caller
    }
}
