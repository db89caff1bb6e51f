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

//! Core identifier and value types shared by the ledger.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of the party that submitted a call.
///
/// Identities are opaque byte strings supplied by the hosting runtime. They
/// key the per-account records. `Display` renders them as UTF-8, replacing
/// invalid sequences with U+FFFD, so the rendering is lossy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Identity(Vec<u8>);

impl Identity {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl From<String> for Identity {
    fn from(value: String) -> Self {
        Self(value.into_bytes())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// Wall-clock time in whole seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Card identifier, assigned once when a card is created.
///
/// Rendered as `card_<creation timestamp>_<owner identity>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct CardId(Vec<u8>);

impl CardId {
    pub fn generate(created_at: Timestamp, owner: &Identity) -> Self {
        let mut bytes = format!("card_{}_", created_at).into_bytes();
        bytes.extend_from_slice(owner.as_bytes());
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// An opted-in record that never had a card carries an empty id.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// Number of decimal places between the smallest unit and one whole unit.
pub const DISPLAY_DECIMALS: u32 = 6;

/// Converts an amount in smallest units into whole currency units.
///
/// ```
/// use card_ledger_rs::base::to_display_amount;
///
/// assert_eq!(to_display_amount(1_500_000).to_string(), "1.500000");
/// ```
pub fn to_display_amount(units: u64) -> Decimal {
    Decimal::from_i128_with_scale(i128::from(units), DISPLAY_DECIMALS)
}
