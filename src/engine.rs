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

//! Card ledger state machine.
//!
//! The [`Engine`] evaluates one call against a read-only view of the ledger
//! and returns the writes and events the call produces. It keeps no state of
//! its own between calls.
//!
//! # Dispatch
//!
//! 1. No shared record yet: only a create call is accepted.
//! 2. Lifecycle calls: opt-in, close-out and clear-state are approved;
//!    update and delete are approved for the owner only.
//! 3. No-op calls dispatch on argument 0:
//!
//! | Tag | Requires | Effect |
//! |-----|----------|--------|
//! | `create_card` | 4 args, opted in, no active card, tier 1..=3 | Opens a card, bumps `total_cards` |
//! | `fund_card` | opted in, active, one linked payment to custody | Credits the payment |
//! | `use_card` | 2 args, active, balance and both limits cover the amount | Debits the amount |
//! | `reset_limits` | opted in | Rolls expired windows |
//! | `deactivate_card` | opted in, active | Deactivates |
//! | `activate_card` | opted in, inactive | Activates |
//! | `update_limits` | owner, 4 args, target opted in | Overrides the target's limits |
//! | `emergency_pause` | owner | Sets `paused` |
//! | `update_chainlink_feed` | owner, 2 args | Sets `price_feed_id` |
//!
//! `use_card` rolls expired spending windows before checking limits, so a
//! spend landing just past a day or month boundary is measured against
//! zeroed counters.

use crate::LedgerError;
use crate::account::CardAccount;
use crate::base::{Identity, Timestamp};
use crate::call::{Call, CallKind, Method, TransferKind};
use crate::config::LedgerConfig;
use crate::event::Event;
use crate::global::GlobalLedger;
use crate::limits::KycTier;
use crate::store::{Effects, LedgerStore};
use crate::window;

/// Values supplied by the hosting runtime for a single call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub now: Timestamp,
    /// Address linked payments must be sent to.
    pub custody: Identity,
}

/// Stateless evaluator for ledger calls.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: LedgerConfig,
}

impl Engine {
    pub fn new(config: LedgerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Evaluates `call` and returns the effects to commit.
    ///
    /// # Errors
    ///
    /// Any unmet precondition rejects the whole call; see [`LedgerError`].
    pub fn execute<S>(
        &self,
        store: &S,
        env: &Environment,
        call: &Call,
    ) -> Result<Effects, LedgerError>
    where
        S: LedgerStore + ?Sized,
    {
        let Some(global) = store.global() else {
            return match call.kind {
                CallKind::Create => Ok(self.create(call)),
                _ => Err(LedgerError::NotCreated),
            };
        };

        match call.kind {
            CallKind::Create => Err(LedgerError::AlreadyCreated),
            CallKind::OptIn | CallKind::CloseOut | CallKind::ClearState => Ok(Effects::default()),
            CallKind::UpdateApplication | CallKind::DeleteApplication => {
                require_owner(&global, &call.sender)?;
                Ok(Effects::default())
            }
            CallKind::NoOp => {
                let tag = call.tag().ok_or(LedgerError::MissingOperation)?;
                let method = Method::from_tag(tag).ok_or_else(|| {
                    LedgerError::UnknownOperation(String::from_utf8_lossy(tag).into_owned())
                })?;
                let mut transition = Transition {
                    store,
                    env,
                    call,
                    global,
                    effects: Effects::default(),
                };
                transition.run(method)?;
                Ok(transition.effects)
            }
        }
    }

    fn create(&self, call: &Call) -> Effects {
        let mut effects = Effects::default();
        effects.put_global(GlobalLedger::new(call.sender.clone(), &self.config));
        effects
    }
}

fn require_owner(global: &GlobalLedger, caller: &Identity) -> Result<(), LedgerError> {
    if global.caller_is_owner(caller) {
        Ok(())
    } else {
        Err(LedgerError::NotOwner)
    }
}

/// Working state for one no-op call.
struct Transition<'a, S: ?Sized> {
    store: &'a S,
    env: &'a Environment,
    call: &'a Call,
    global: GlobalLedger,
    effects: Effects,
}

impl<'a, S> Transition<'a, S>
where
    S: LedgerStore + ?Sized,
{
    fn run(&mut self, method: Method) -> Result<(), LedgerError> {
        match method {
            Method::CreateCard => self.create_card(),
            Method::FundCard => self.fund_card(),
            Method::UseCard => self.use_card(),
            Method::ResetLimits => self.reset_limits(),
            Method::DeactivateCard => self.deactivate_card(),
            Method::ActivateCard => self.activate_card(),
            Method::UpdateLimits => self.update_limits(),
            Method::EmergencyPause => self.emergency_pause(),
            Method::UpdateChainlinkFeed => self.update_chainlink_feed(),
        }
    }

    fn sender(&self) -> &'a Identity {
        &self.call.sender
    }

    /// Local record of `identity`, failing with `missing` unless it has opted in.
    fn opted_in_account(
        &self,
        identity: &Identity,
        missing: LedgerError,
    ) -> Result<CardAccount, LedgerError> {
        if !self.store.is_opted_in(identity) {
            return Err(missing);
        }
        self.store.local(identity).ok_or(missing)
    }

    fn sender_account(&self) -> Result<CardAccount, LedgerError> {
        self.opted_in_account(self.sender(), LedgerError::NotOptedIn)
    }

    fn require_owner(&self) -> Result<(), LedgerError> {
        require_owner(&self.global, self.sender())
    }

    fn roll_windows(&self, account: &mut CardAccount) -> bool {
        let rolled = window::apply_window_resets(account, self.env.now);
        if rolled.any() {
            tracing::trace!(
                caller = %self.sender(),
                daily = rolled.daily,
                monthly = rolled.monthly,
                "spending windows rolled"
            );
        }
        rolled.any()
    }

    fn create_card(&mut self) -> Result<(), LedgerError> {
        self.call.require_args(4)?;
        let existing = self.sender_account()?;
        if existing.is_active() {
            return Err(LedgerError::CardActive);
        }

        let tier = KycTier::try_from(self.call.uint_arg(1)?)?;
        let region = self.call.bytes_arg(2)?.to_vec();
        let currency = self.call.bytes_arg(3)?.to_vec();

        let account = CardAccount::open(
            self.sender(),
            tier,
            region.clone(),
            currency.clone(),
            self.env.now,
        );
        self.global.total_cards = self
            .global
            .total_cards
            .checked_add(1)
            .ok_or(LedgerError::Overflow)?;

        self.effects.emit(Event::CardCreated {
            card_id: account.card_id().clone(),
            owner: self.sender().clone(),
            tier: tier.value(),
            region,
            currency,
        });
        self.effects.put_global(self.global.clone());
        self.effects.put_local(self.sender().clone(), account);
        Ok(())
    }

    fn fund_card(&mut self) -> Result<(), LedgerError> {
        let mut account = self.sender_account()?;
        if !account.is_active() {
            return Err(LedgerError::CardInactive);
        }

        if self.call.group_size() != 2 {
            return Err(LedgerError::GroupSize(self.call.group_size()));
        }
        let transfer = &self.call.group[0];
        if transfer.kind != TransferKind::Payment || transfer.receiver != self.env.custody {
            return Err(LedgerError::InvalidPayment);
        }
        if transfer.amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }

        account.fund(transfer.amount)?;
        self.effects.emit(Event::CardFunded {
            card_id: account.card_id().clone(),
            owner: self.sender().clone(),
            amount: transfer.amount,
            currency: account.currency().to_vec(),
        });
        self.effects.put_local(self.sender().clone(), account);
        Ok(())
    }

    fn use_card(&mut self) -> Result<(), LedgerError> {
        self.call.require_args(2)?;
        let amount = self.call.uint_arg(1)?;
        let mut account = self.sender_account()?;

        self.roll_windows(&mut account);
        let new_balance = account.spend(amount)?;

        self.effects.emit(Event::CardUsed {
            card_id: account.card_id().clone(),
            owner: self.sender().clone(),
            amount,
            currency: account.currency().to_vec(),
            new_balance,
        });
        self.effects.put_local(self.sender().clone(), account);
        Ok(())
    }

    fn reset_limits(&mut self) -> Result<(), LedgerError> {
        let mut account = self.sender_account()?;
        if self.roll_windows(&mut account) {
            self.effects.put_local(self.sender().clone(), account);
        }
        self.effects.emit(Event::LimitsReset {
            caller: self.sender().clone(),
            timestamp: self.env.now,
        });
        Ok(())
    }

    fn deactivate_card(&mut self) -> Result<(), LedgerError> {
        let mut account = self.sender_account()?;
        account.deactivate()?;
        self.effects.emit(Event::CardDeactivated {
            card_id: account.card_id().clone(),
            owner: self.sender().clone(),
        });
        self.effects.put_local(self.sender().clone(), account);
        Ok(())
    }

    fn activate_card(&mut self) -> Result<(), LedgerError> {
        let mut account = self.sender_account()?;
        account.activate()?;
        self.effects.emit(Event::CardActivated {
            card_id: account.card_id().clone(),
            owner: self.sender().clone(),
        });
        self.effects.put_local(self.sender().clone(), account);
        Ok(())
    }

    fn update_limits(&mut self) -> Result<(), LedgerError> {
        self.require_owner()?;
        self.call.require_args(4)?;

        let target = Identity::new(self.call.bytes_arg(1)?);
        let daily_limit = self.call.uint_arg(2)?;
        let monthly_limit = self.call.uint_arg(3)?;

        let mut account = self.opted_in_account(&target, LedgerError::TargetNotOptedIn)?;
        account.override_limits(daily_limit, monthly_limit);

        self.effects.emit(Event::LimitsUpdated {
            target: target.clone(),
            daily_limit,
            monthly_limit,
        });
        self.effects.put_local(target, account);
        Ok(())
    }

    fn emergency_pause(&mut self) -> Result<(), LedgerError> {
        self.require_owner()?;
        self.global.paused = true;
        self.effects.emit(Event::EmergencyPause {
            caller: self.sender().clone(),
            timestamp: self.env.now,
        });
        self.effects.put_global(self.global.clone());
        Ok(())
    }

    fn update_chainlink_feed(&mut self) -> Result<(), LedgerError> {
        self.require_owner()?;
        self.call.require_args(2)?;
        let feed_id = self.call.uint_arg(1)?;

        self.global.price_feed_id = feed_id;
        self.effects.emit(Event::ChainlinkFeedUpdated { feed_id });
        self.effects.put_global(self.global.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::LinkedTransfer;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MapStore {
        global: Option<GlobalLedger>,
        locals: HashMap<Identity, CardAccount>,
    }

    impl LedgerStore for MapStore {
        fn global(&self) -> Option<GlobalLedger> {
            self.global.clone()
        }

        fn local(&self, identity: &Identity) -> Option<CardAccount> {
            self.locals.get(identity).cloned()
        }
    }

    impl MapStore {
        fn commit(&mut self, effects: Effects) {
            if let Some(global) = effects.global {
                self.global = Some(global);
            }
            self.locals.extend(effects.locals);
        }
    }

    fn env(now: u64) -> Environment {
        Environment {
            now: Timestamp(now),
            custody: Identity::from("CUSTODY"),
        }
    }

    fn owner() -> Identity {
        Identity::from("OWNER")
    }

    fn alice() -> Identity {
        Identity::from("ALICE")
    }

    fn ledger_with_alice() -> (Engine, MapStore) {
        let engine = Engine::default();
        let mut store = MapStore::default();
        let effects = engine
            .execute(&store, &env(0), &Call::create(owner()))
            .unwrap();
        store.commit(effects);
        store.locals.insert(alice(), CardAccount::opted_in());
        (engine, store)
    }

    #[test]
    fn create_initializes_global() {
        let (_, store) = ledger_with_alice();
        let global = store.global.unwrap();
        assert_eq!(global.owner, owner());
        assert_eq!(global.total_cards, 0);
    }

    #[test]
    fn calls_before_create_are_rejected() {
        let engine = Engine::default();
        let store = MapStore::default();
        assert_eq!(
            engine.execute(&store, &env(0), &Call::opt_in(alice())),
            Err(LedgerError::NotCreated)
        );
    }

    #[test]
    fn second_create_is_rejected() {
        let (engine, store) = ledger_with_alice();
        assert_eq!(
            engine.execute(&store, &env(0), &Call::create(alice())),
            Err(LedgerError::AlreadyCreated)
        );
    }

    #[test]
    fn create_card_stages_account_global_and_event() {
        let (engine, store) = ledger_with_alice();
        let call = Call::create_card(alice(), 2, "samoa", "ALGO");
        let effects = engine.execute(&store, &env(86_400), &call).unwrap();

        assert_eq!(effects.global.unwrap().total_cards, 1);
        assert_eq!(effects.locals.len(), 1);
        assert_eq!(
            effects.events[0].to_string(),
            "CardCreated:card_86400_ALICE:ALICE:2:samoa:ALGO"
        );
    }

    #[test]
    fn rejected_call_stages_nothing() {
        let (engine, store) = ledger_with_alice();
        let call = Call::create_card(alice(), 4, "samoa", "ALGO");
        assert_eq!(
            engine.execute(&store, &env(0), &call),
            Err(LedgerError::InvalidTier(4))
        );
        assert!(store.locals[&alice()] == CardAccount::opted_in());
    }

    #[test]
    fn fund_rejects_asset_transfer() {
        let (engine, mut store) = ledger_with_alice();
        let effects = engine
            .execute(&store, &env(0), &Call::create_card(alice(), 1, "fiji", "ALGO"))
            .unwrap();
        store.commit(effects);

        let mut transfer = LinkedTransfer::payment(Identity::from("CUSTODY"), 10);
        transfer.kind = TransferKind::AssetTransfer;
        assert_eq!(
            engine.execute(&store, &env(0), &Call::fund_card(alice(), transfer)),
            Err(LedgerError::InvalidPayment)
        );
    }

    #[test]
    fn owner_check_precedes_argument_count() {
        let (engine, store) = ledger_with_alice();
        let call = Call::no_op(alice(), "update_limits", Vec::new());
        assert_eq!(
            engine.execute(&store, &env(0), &call),
            Err(LedgerError::NotOwner)
        );
    }

    #[test]
    fn missing_and_unknown_tags() {
        let (engine, store) = ledger_with_alice();
        let mut call = Call::reset_limits(alice());
        call.args.clear();
        assert_eq!(
            engine.execute(&store, &env(0), &call),
            Err(LedgerError::MissingOperation)
        );
        assert_eq!(
            engine.execute(&store, &env(0), &Call::no_op(alice(), "mint", Vec::new())),
            Err(LedgerError::UnknownOperation("mint".into()))
        );
    }

    /// Store whose opt-in registry has dropped `closed` while its record lingers.
    struct ClosedOut<'a> {
        inner: &'a MapStore,
        closed: Identity,
    }

    impl LedgerStore for ClosedOut<'_> {
        fn global(&self) -> Option<GlobalLedger> {
            self.inner.global()
        }

        fn local(&self, identity: &Identity) -> Option<CardAccount> {
            self.inner.local(identity)
        }

        fn is_opted_in(&self, identity: &Identity) -> bool {
            *identity != self.closed && self.inner.is_opted_in(identity)
        }
    }

    #[test]
    fn opt_in_guards_consult_the_registry() {
        let (engine, store) = ledger_with_alice();
        let store = ClosedOut {
            inner: &store,
            closed: alice(),
        };
        assert_eq!(
            engine.execute(&store, &env(0), &Call::reset_limits(alice())),
            Err(LedgerError::NotOptedIn)
        );
        assert_eq!(
            engine.execute(&store, &env(0), &Call::update_limits(owner(), &alice(), 1, 1)),
            Err(LedgerError::TargetNotOptedIn)
        );
    }
}
