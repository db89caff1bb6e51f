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

//! Storage seam between the state machine and its host.
//!
//! The engine reads through a [`LedgerStore`] and never writes to it. What a
//! call wants to change comes back as [`Effects`], which the host applies
//! in one step once the whole call has succeeded. A rejected call returns no
//! effects, so nothing it touched is ever visible.

use crate::account::CardAccount;
use crate::base::Identity;
use crate::event::Event;
use crate::global::GlobalLedger;

/// Read access to the ledger's persisted state.
pub trait LedgerStore {
    /// Shared record, `None` before the ledger is created.
    fn global(&self) -> Option<GlobalLedger>;

    /// Local record of `identity`, `None` if it has not opted in.
    fn local(&self, identity: &Identity) -> Option<CardAccount>;

    fn is_opted_in(&self, identity: &Identity) -> bool {
        self.local(identity).is_some()
    }
}

/// Writes and events produced by one successful call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Effects {
    pub global: Option<GlobalLedger>,
    pub locals: Vec<(Identity, CardAccount)>,
    pub events: Vec<Event>,
}

impl Effects {
    pub fn put_global(&mut self, global: GlobalLedger) {
        self.global = Some(global);
    }

    /// Stages a local write; a later write to the same identity wins.
    pub fn put_local(&mut self, identity: Identity, account: CardAccount) {
        match self.locals.iter_mut().find(|(id, _)| *id == identity) {
            Some((_, staged)) => *staged = account,
            None => self.locals.push((identity, account)),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn is_empty(&self) -> bool {
        self.global.is_none() && self.locals.is_empty() && self.events.is_empty()
    }
}
