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

//! In-memory hosting runtime.
//!
//! [`InMemoryLedger`] plays the part of the ledger runtime around the
//! [`Engine`]: it supplies the clock and custody address, keeps the opt-in
//! registry and both kinds of storage, and commits a call's [`Effects`]
//! only when the engine accepts it.
//!
//! # Thread Safety
//!
//! Local records live in a [`DashMap`] and the shared record behind a
//! [`Mutex`]. The mutex is held from the moment a call is evaluated until its
//! effects are committed, so calls are applied one at a time and no two of
//! them interleave a read-modify-write on the same record.

use crate::LedgerError;
use crate::account::CardAccount;
use crate::base::{Identity, Timestamp};
use crate::call::{Call, CallKind};
use crate::config::LedgerConfig;
use crate::engine::{Engine, Environment};
use crate::event::Event;
use crate::global::GlobalLedger;
use crate::store::{Effects, LedgerStore};
use crossbeam::queue::SegQueue;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the timestamp handed to each call.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        Timestamp(secs)
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: AtomicU64::new(now.0),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.store(now.0, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.now.load(Ordering::SeqCst))
    }
}

/// Outcome of a committed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub now: Timestamp,
    pub events: Vec<Event>,
}

/// Read view handed to the engine while the commit lock is held.
struct Snapshot<'a> {
    global: &'a Option<GlobalLedger>,
    locals: &'a DashMap<Identity, CardAccount>,
}

impl LedgerStore for Snapshot<'_> {
    fn global(&self) -> Option<GlobalLedger> {
        self.global.clone()
    }

    fn local(&self, identity: &Identity) -> Option<CardAccount> {
        self.locals.get(identity).map(|entry| entry.value().clone())
    }

    fn is_opted_in(&self, identity: &Identity) -> bool {
        self.locals.contains_key(identity)
    }
}

pub struct InMemoryLedger<C = SystemClock> {
    engine: Engine,
    clock: C,
    global: Mutex<Option<GlobalLedger>>,
    locals: DashMap<Identity, CardAccount>,
    /// Every committed event, in commit order.
    events: SegQueue<Event>,
}

impl InMemoryLedger<SystemClock> {
    pub fn new(config: LedgerConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> InMemoryLedger<C> {
    pub fn with_clock(config: LedgerConfig, clock: C) -> Self {
        Self {
            engine: Engine::new(config),
            clock,
            global: Mutex::new(None),
            locals: DashMap::new(),
            events: SegQueue::new(),
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn custody_address(&self) -> &Identity {
        &self.engine.config().custody_address
    }

    /// Evaluates a call and commits its effects if it is accepted.
    ///
    /// # Errors
    ///
    /// Returns the engine's [`LedgerError`] when the call is rejected; in
    /// that case no state changes and no event is logged.
    pub fn submit(&self, call: Call) -> Result<Receipt, LedgerError> {
        let mut global = self.global.lock();
        let env = Environment {
            now: self.clock.now(),
            custody: self.custody_address().clone(),
        };

        let snapshot = Snapshot {
            global: &global,
            locals: &self.locals,
        };
        let effects = match self.engine.execute(&snapshot, &env, &call) {
            Ok(effects) => effects,
            Err(err) => {
                tracing::debug!(
                    caller = %call.sender,
                    kind = ?call.kind,
                    reason = %err,
                    "call rejected"
                );
                return Err(err);
            }
        };

        match call.kind {
            CallKind::OptIn => {
                self.locals
                    .entry(call.sender.clone())
                    .or_insert_with(CardAccount::opted_in);
            }
            CallKind::CloseOut | CallKind::ClearState => {
                self.locals.remove(&call.sender);
            }
            _ => {}
        }

        let Effects {
            global: staged_global,
            locals,
            events,
        } = effects;
        if let Some(staged) = staged_global {
            *global = Some(staged);
        }
        for (identity, account) in locals {
            self.locals.insert(identity, account);
        }
        for event in &events {
            self.events.push(event.clone());
        }

        tracing::debug!(
            caller = %call.sender,
            kind = ?call.kind,
            events = events.len(),
            "call committed"
        );
        Ok(Receipt {
            now: env.now,
            events,
        })
    }

    pub fn global(&self) -> Option<GlobalLedger> {
        self.global.lock().clone()
    }

    pub fn account(&self, identity: &Identity) -> Option<CardAccount> {
        self.locals.get(identity).map(|entry| entry.value().clone())
    }

    pub fn is_opted_in(&self, identity: &Identity) -> bool {
        self.locals.contains_key(identity)
    }

    /// All local records, ordered by identity.
    pub fn accounts(&self) -> Vec<(Identity, CardAccount)> {
        let mut accounts: Vec<_> = self
            .locals
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        accounts.sort_by(|a, b| a.0.cmp(&b.0));
        accounts
    }

    /// Removes and returns the logged events, oldest first.
    pub fn drain_events(&self) -> Vec<Event> {
        std::iter::from_fn(|| self.events.pop()).collect()
    }
}
