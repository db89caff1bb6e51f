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

//! Error types for ledger transitions.
//!
//! Every variant means the same thing to the caller: the call was rejected
//! and nothing it tried to write was committed. The variant only records which
//! precondition failed, for diagnostics.

use thiserror::Error;

/// Reasons a call can be rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The ledger has not been created yet
    #[error("ledger has not been created")]
    NotCreated,

    /// A create call arrived for a ledger that already exists
    #[error("ledger already created")]
    AlreadyCreated,

    /// A no-op call did not carry an operation tag
    #[error("missing operation tag")]
    MissingOperation,

    /// Operation tag did not match any known method
    #[error("unknown operation `{0}`")]
    UnknownOperation(String),

    /// Wrong number of application arguments
    #[error("expected {expected} arguments, got {actual}")]
    ArgumentCount { expected: usize, actual: usize },

    /// Integer argument wider than eight bytes
    #[error("integer argument is {0} bytes wide (max 8)")]
    IntegerTooWide(usize),

    /// Caller has not opted in to the ledger
    #[error("caller is not opted in")]
    NotOptedIn,

    /// Target of an administrative call has not opted in
    #[error("target account is not opted in")]
    TargetNotOptedIn,

    /// Caller already holds an active card
    #[error("card is already active")]
    CardActive,

    /// Card is deactivated or was never created
    #[error("card is not active")]
    CardInactive,

    /// KYC tier outside 1..=3
    #[error("invalid kyc tier {0}")]
    InvalidTier(u64),

    /// Funding call is not grouped with exactly one companion transfer
    #[error("expected a group of 2 transactions, got {0}")]
    GroupSize(usize),

    /// Companion transfer is not a payment into the ledger custody address
    #[error("linked transfer is not a payment to the ledger")]
    InvalidPayment,

    /// Amount is zero
    #[error("invalid amount (must be positive)")]
    InvalidAmount,

    /// Spend exceeds the card balance
    #[error("insufficient balance")]
    InsufficientBalance,

    /// Spend would push the daily total past the daily limit
    #[error("daily limit exceeded")]
    DailyLimitExceeded,

    /// Spend would push the monthly total past the monthly limit
    #[error("monthly limit exceeded")]
    MonthlyLimitExceeded,

    /// Caller is not the ledger owner
    #[error("caller is not the ledger owner")]
    NotOwner,

    /// Arithmetic overflow
    #[error("arithmetic overflow")]
    Overflow,
}

#[cfg(test)]
mod tests {
    use super::LedgerError;

    #[test]
    fn error_display_messages() {
        assert_eq!(LedgerError::NotCreated.to_string(), "ledger has not been created");
        assert_eq!(
            LedgerError::UnknownOperation("mint".into()).to_string(),
            "unknown operation `mint`"
        );
        assert_eq!(
            LedgerError::ArgumentCount {
                expected: 4,
                actual: 2
            }
            .to_string(),
            "expected 4 arguments, got 2"
        );
        assert_eq!(
            LedgerError::IntegerTooWide(9).to_string(),
            "integer argument is 9 bytes wide (max 8)"
        );
        assert_eq!(LedgerError::InvalidTier(4).to_string(), "invalid kyc tier 4");
        assert_eq!(
            LedgerError::GroupSize(1).to_string(),
            "expected a group of 2 transactions, got 1"
        );
        assert_eq!(
            LedgerError::InvalidAmount.to_string(),
            "invalid amount (must be positive)"
        );
        assert_eq!(LedgerError::DailyLimitExceeded.to_string(), "daily limit exceeded");
        assert_eq!(LedgerError::NotOwner.to_string(), "caller is not the ledger owner");
    }

    #[test]
    fn errors_are_cloneable() {
        let error = LedgerError::InsufficientBalance;
        let cloned = error.clone();
        assert_eq!(error, cloned);
    }
}
