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

//! Per-caller card account.
//!
//! A record exists from the moment its owner opts in to the ledger. Until a
//! card is created it is empty and inactive; `create_card` populates it.
//!
//! ```text
//!  opted in (empty, inactive) ──create_card──► active ──deactivate_card──► inactive
//!        │                                       ▲                             │
//!        └────────────activate_card──────────────┴───────activate_card─────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use card_ledger_rs::{CardAccount, Identity, KycTier, Timestamp};
//!
//! let account = CardAccount::open(
//!     &Identity::from("ALICE"),
//!     KycTier::Standard,
//!     b"samoa".to_vec(),
//!     b"ALGO".to_vec(),
//!     Timestamp(1_700_000_000),
//! );
//! assert_eq!(account.balance(), 0);
//! assert_eq!(account.daily_limit(), 500_000_000);
//! assert!(account.is_active());
//! ```

use crate::LedgerError;
use crate::base::{CardId, Identity, Timestamp, to_display_amount};
use crate::limits::KycTier;
use crate::window::{self, SpendWindow};
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Card account state stored under the owner's identity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CardAccount {
    balance: u64,
    daily: SpendWindow,
    monthly: SpendWindow,
    kyc_tier: u64,
    region: Vec<u8>,
    currency: Vec<u8>,
    active: bool,
    daily_limit: u64,
    monthly_limit: u64,
    card_id: CardId,
}

impl CardAccount {
    /// Empty record allocated when a caller opts in.
    pub fn opted_in() -> Self {
        Self::default()
    }

    /// Fresh active card with limits taken from the tier table.
    pub fn open(
        owner: &Identity,
        tier: KycTier,
        region: Vec<u8>,
        currency: Vec<u8>,
        now: Timestamp,
    ) -> Self {
        let limits = tier.limits();
        Self {
            balance: 0,
            daily: SpendWindow::starting_at(window::day_bucket(now)),
            monthly: SpendWindow::starting_at(window::month_bucket(now)),
            kyc_tier: tier.value(),
            region,
            currency,
            active: true,
            daily_limit: limits.daily,
            monthly_limit: limits.monthly,
            card_id: CardId::generate(now, owner),
        }
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn daily_spent(&self) -> u64 {
        self.daily.spent
    }

    pub fn monthly_spent(&self) -> u64 {
        self.monthly.spent
    }

    pub fn last_reset_day(&self) -> u64 {
        self.daily.last_reset
    }

    pub fn last_reset_month(&self) -> u64 {
        self.monthly.last_reset
    }

    pub fn kyc_tier(&self) -> u64 {
        self.kyc_tier
    }

    pub fn region(&self) -> &[u8] {
        &self.region
    }

    pub fn currency(&self) -> &[u8] {
        &self.currency
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn daily_limit(&self) -> u64 {
        self.daily_limit
    }

    pub fn monthly_limit(&self) -> u64 {
        self.monthly_limit
    }

    pub fn card_id(&self) -> &CardId {
        &self.card_id
    }

    pub fn daily_window(&self) -> &SpendWindow {
        &self.daily
    }

    pub fn monthly_window(&self) -> &SpendWindow {
        &self.monthly
    }

    pub(crate) fn windows_mut(&mut self) -> (&mut SpendWindow, &mut SpendWindow) {
        (&mut self.daily, &mut self.monthly)
    }

    fn assert_spend_invariants(&self) {
        debug_assert!(
            self.daily.spent <= self.daily_limit,
            "Invariant violated: daily spend {} above limit {}",
            self.daily.spent,
            self.daily_limit
        );
        debug_assert!(
            self.monthly.spent <= self.monthly_limit,
            "Invariant violated: monthly spend {} above limit {}",
            self.monthly.spent,
            self.monthly_limit
        );
    }

    /// Credits a linked payment. Returns the new balance.
    pub fn fund(&mut self, amount: u64) -> Result<u64, LedgerError> {
        if !self.active {
            return Err(LedgerError::CardInactive);
        }
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        Ok(self.balance)
    }

    /// Debits a card payment. Returns the new balance.
    ///
    /// Windows are not rolled here; the caller rolls them first so the
    /// limits are checked against the current bucket.
    pub fn spend(&mut self, amount: u64) -> Result<u64, LedgerError> {
        if !self.active {
            return Err(LedgerError::CardInactive);
        }
        if self.balance < amount {
            return Err(LedgerError::InsufficientBalance);
        }
        let daily_spent = self
            .daily
            .spent
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        if daily_spent > self.daily_limit {
            return Err(LedgerError::DailyLimitExceeded);
        }
        let monthly_spent = self
            .monthly
            .spent
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        if monthly_spent > self.monthly_limit {
            return Err(LedgerError::MonthlyLimitExceeded);
        }
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }

        self.balance -= amount;
        self.daily.spent = daily_spent;
        self.monthly.spent = monthly_spent;
        self.assert_spend_invariants();
        Ok(self.balance)
    }

    pub fn deactivate(&mut self) -> Result<(), LedgerError> {
        if !self.active {
            return Err(LedgerError::CardInactive);
        }
        self.active = false;
        Ok(())
    }

    pub fn activate(&mut self) -> Result<(), LedgerError> {
        if self.active {
            return Err(LedgerError::CardActive);
        }
        self.active = true;
        Ok(())
    }

    /// Replaces both limits outright. No check against the tier table.
    pub fn override_limits(&mut self, daily: u64, monthly: u64) {
        self.daily_limit = daily;
        self.monthly_limit = monthly;
    }
}

/// Serializable view of an account together with its holder.
#[derive(Debug, Clone, Copy)]
pub struct AccountSnapshot<'a> {
    pub holder: &'a Identity,
    pub account: &'a CardAccount,
}

impl Serialize for AccountSnapshot<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let account = self.account;
        let mut state = serializer.serialize_struct("AccountSnapshot", 11)?;
        state.serialize_field("holder", &self.holder.to_string())?;
        state.serialize_field("card_id", &account.card_id.to_string())?;
        state.serialize_field("kyc_tier", &account.kyc_tier)?;
        state.serialize_field("region", &String::from_utf8_lossy(&account.region))?;
        state.serialize_field("currency", &String::from_utf8_lossy(&account.currency))?;
        state.serialize_field("balance", &to_display_amount(account.balance))?;
        state.serialize_field("daily_spent", &to_display_amount(account.daily.spent))?;
        state.serialize_field("monthly_spent", &to_display_amount(account.monthly.spent))?;
        state.serialize_field("daily_limit", &to_display_amount(account.daily_limit))?;
        state.serialize_field("monthly_limit", &to_display_amount(account.monthly_limit))?;
        state.serialize_field("active", &account.active)?;
        state.end()
    }
}
