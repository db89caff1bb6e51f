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

//! Ledger configuration.

use crate::base::Identity;
use serde::Deserialize;

/// Settings applied when the ledger is created and by the hosting runtime.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Currency tag stored in the global record at creation.
    pub base_currency: String,
    /// Version tag stored in the global record at creation.
    pub contract_version: String,
    /// Address that linked payments must be sent to.
    pub custody_address: Identity,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            base_currency: "ALGO".to_string(),
            contract_version: "1.0.0".to_string(),
            custody_address: Identity::from("card-ledger-custody"),
        }
    }
}
