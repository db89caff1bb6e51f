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

//! Property-based tests for the card ledger.
//!
//! These tests verify invariants that should hold for any sequence of
//! calls, accepted or rejected.

use card_ledger_rs::call::decode_uint;
use card_ledger_rs::limits::limits_for_tier;
use card_ledger_rs::{
    Call, Identity, InMemoryLedger, KycTier, LedgerConfig, LedgerError, LinkedTransfer,
    ManualClock, Timestamp,
};
use proptest::prelude::*;

const T0: u64 = 1_700_000_000;

// =============================================================================
// Arbitrary Strategies
// =============================================================================

#[derive(Debug, Clone)]
enum Op {
    Fund(u64),
    Use(u64),
    Advance(u64),
    Reset,
    Deactivate,
    Activate,
}

fn arb_amount() -> impl Strategy<Value = u64> {
    prop_oneof![
        0u64..=1_000,
        1_000u64..=200_000_000,
        200_000_000u64..=3_000_000_000,
    ]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => arb_amount().prop_map(Op::Fund),
        6 => arb_amount().prop_map(Op::Use),
        2 => (0u64..=3 * 86_400).prop_map(Op::Advance),
        1 => Just(Op::Reset),
        1 => Just(Op::Deactivate),
        1 => Just(Op::Activate),
    ]
}

fn arb_identity() -> impl Strategy<Value = Identity> {
    prop::collection::vec(any::<u8>(), 0..40).prop_map(Identity::new)
}

// =============================================================================
// Helpers
// =============================================================================

fn owner() -> Identity {
    Identity::from("OWNER")
}

fn holder() -> Identity {
    Identity::from("HOLDER")
}

fn ledger_with_card(tier: u64) -> InMemoryLedger<ManualClock> {
    let ledger =
        InMemoryLedger::with_clock(LedgerConfig::default(), ManualClock::new(Timestamp(T0)));
    ledger.submit(Call::create(owner())).unwrap();
    ledger.submit(Call::opt_in(holder())).unwrap();
    ledger
        .submit(Call::create_card(holder(), tier, "samoa", "ALGO"))
        .unwrap();
    ledger
}

fn to_call(ledger: &InMemoryLedger<ManualClock>, op: &Op) -> Option<Call> {
    match *op {
        Op::Fund(amount) => {
            let payment = LinkedTransfer::payment(ledger.custody_address().clone(), amount);
            Some(Call::fund_card(holder(), payment))
        }
        Op::Use(amount) => Some(Call::use_card(holder(), amount)),
        Op::Advance(secs) => {
            ledger.clock().advance(secs);
            None
        }
        Op::Reset => Some(Call::reset_limits(holder())),
        Op::Deactivate => Some(Call::deactivate_card(holder())),
        Op::Activate => Some(Call::activate_card(holder())),
    }
}

// =============================================================================
// Balance Invariant Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Balance equals accepted funding minus accepted spending.
    #[test]
    fn balance_is_conserved(
        tier in 1u64..=3,
        ops in prop::collection::vec(arb_op(), 1..40),
    ) {
        let ledger = ledger_with_card(tier);
        let mut expected: u64 = 0;

        for op in &ops {
            let Some(call) = to_call(&ledger, op) else { continue };
            if ledger.submit(call).is_ok() {
                match *op {
                    Op::Fund(amount) => expected += amount,
                    Op::Use(amount) => expected -= amount,
                    _ => {}
                }
            }
        }

        prop_assert_eq!(ledger.account(&holder()).unwrap().balance(), expected);
    }

    /// A spend larger than the balance is always rejected.
    #[test]
    fn cannot_overdraw(
        funded in 1u64..=100_000_000,
        extra in 1u64..=1_000_000,
    ) {
        let ledger = ledger_with_card(3);
        let payment = LinkedTransfer::payment(ledger.custody_address().clone(), funded);
        ledger.submit(Call::fund_card(holder(), payment)).unwrap();

        prop_assert_eq!(
            ledger.submit(Call::use_card(holder(), funded + extra)),
            Err(LedgerError::InsufficientBalance)
        );
        prop_assert_eq!(ledger.account(&holder()).unwrap().balance(), funded);
    }
}

// =============================================================================
// Limit Invariant Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Window spend never exceeds the card's limits.
    #[test]
    fn spend_stays_within_limits(
        tier in 1u64..=3,
        ops in prop::collection::vec(arb_op(), 1..60),
    ) {
        let ledger = ledger_with_card(tier);

        for op in &ops {
            if let Some(call) = to_call(&ledger, op) {
                let _ = ledger.submit(call);
            }
            let account = ledger.account(&holder()).unwrap();
            prop_assert!(account.daily_spent() <= account.daily_limit());
            prop_assert!(account.monthly_spent() <= account.monthly_limit());
            prop_assert!(account.daily_spent() <= account.monthly_spent());
        }
    }

    /// Total accepted spend within one day never exceeds the daily limit.
    #[test]
    fn single_day_total_is_capped(
        tier in 1u64..=3,
        amounts in prop::collection::vec(arb_amount(), 1..30),
    ) {
        let ledger = ledger_with_card(tier);
        let payment = LinkedTransfer::payment(ledger.custody_address().clone(), u64::MAX / 2);
        ledger.submit(Call::fund_card(holder(), payment)).unwrap();

        let mut accepted = 0u64;
        for amount in amounts {
            if ledger.submit(Call::use_card(holder(), amount)).is_ok() {
                accepted += amount;
            }
        }
        prop_assert!(accepted <= limits_for_tier(tier).daily);
    }

    /// Tier values map onto the table; anything else is refused.
    #[test]
    fn tier_table_is_total_over_valid_tiers(tier in any::<u64>()) {
        let ledger = ledger_with_card(1);
        ledger.submit(Call::deactivate_card(holder())).unwrap();

        let result = ledger.submit(Call::create_card(holder(), tier, "fiji", "ALGO"));
        match KycTier::try_from(tier) {
            Ok(kyc) => {
                prop_assert!(result.is_ok());
                let account = ledger.account(&holder()).unwrap();
                prop_assert_eq!(account.daily_limit(), kyc.limits().daily);
                prop_assert_eq!(account.monthly_limit(), kyc.limits().monthly);
            }
            Err(_) => prop_assert_eq!(result, Err(LedgerError::InvalidTier(tier))),
        }
    }
}

// =============================================================================
// Atomicity Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Rejected calls change neither state nor the event log.
    #[test]
    fn rejected_calls_leave_no_trace(
        ops in prop::collection::vec(arb_op(), 1..40),
    ) {
        let ledger = ledger_with_card(2);
        let _ = ledger.drain_events();

        for op in &ops {
            let Some(call) = to_call(&ledger, op) else { continue };
            let account = ledger.account(&holder());
            let global = ledger.global();
            if ledger.submit(call).is_err() {
                prop_assert_eq!(ledger.account(&holder()), account);
                prop_assert_eq!(ledger.global(), global);
                prop_assert!(ledger.drain_events().is_empty());
            } else {
                prop_assert_eq!(ledger.drain_events().len(), 1);
            }
        }
    }

    /// A second reset at the same instant changes nothing.
    #[test]
    fn reset_is_idempotent(
        spend in 1u64..=100_000_000,
        later in 0u64..=90 * 86_400,
    ) {
        let ledger = ledger_with_card(1);
        let payment = LinkedTransfer::payment(ledger.custody_address().clone(), spend);
        ledger.submit(Call::fund_card(holder(), payment)).unwrap();
        ledger.submit(Call::use_card(holder(), spend)).unwrap();

        ledger.clock().advance(later);
        ledger.submit(Call::reset_limits(holder())).unwrap();
        let once = ledger.account(&holder()).unwrap();
        ledger.submit(Call::reset_limits(holder())).unwrap();
        prop_assert_eq!(ledger.account(&holder()).unwrap(), once);
    }
}

// =============================================================================
// Authorization Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Only the creator may run owner operations.
    #[test]
    fn owner_operations_are_gated(
        caller in arb_identity(),
        daily in any::<u64>(),
        monthly in any::<u64>(),
        feed in any::<u64>(),
    ) {
        prop_assume!(caller != owner());
        let ledger = ledger_with_card(2);
        let global = ledger.global();

        prop_assert_eq!(
            ledger.submit(Call::update_limits(caller.clone(), &holder(), daily, monthly)),
            Err(LedgerError::NotOwner)
        );
        prop_assert_eq!(
            ledger.submit(Call::emergency_pause(caller.clone())),
            Err(LedgerError::NotOwner)
        );
        prop_assert_eq!(
            ledger.submit(Call::update_chainlink_feed(caller.clone(), feed)),
            Err(LedgerError::NotOwner)
        );
        prop_assert_eq!(
            ledger.submit(Call::delete_application(caller)),
            Err(LedgerError::NotOwner)
        );
        prop_assert_eq!(ledger.global(), global);

        ledger.submit(Call::update_limits(owner(), &holder(), daily, monthly)).unwrap();
        let account = ledger.account(&holder()).unwrap();
        prop_assert_eq!(account.daily_limit(), daily);
        prop_assert_eq!(account.monthly_limit(), monthly);
    }

    /// Integer arguments wider than eight bytes are refused.
    #[test]
    fn wide_integers_are_rejected(bytes in prop::collection::vec(any::<u8>(), 9..32)) {
        prop_assert_eq!(decode_uint(&bytes), Err(LedgerError::IntegerTooWide(bytes.len())));
    }
}
