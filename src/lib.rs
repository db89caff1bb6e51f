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

//! # Card Ledger
//!
//! This library implements the state machine behind a multi-tenant virtual
//! card ledger: per-holder balances, KYC-tiered spending limits, and daily and
//! monthly spending windows that roll over on fixed time buckets.
//!
//! ## Core Components
//!
//! - [`Engine`]: Evaluates one call against a read-only [`LedgerStore`] and returns [`Effects`]
//! - [`CardAccount`]: Per-holder record with balance, limits and spend windows
//! - [`GlobalLedger`]: Shared record (owner, card counter, price feed, pause flag)
//! - [`Call`]: Incoming call, dispatched on its [`CallKind`] and [`Method`] tag
//! - [`Event`]: Colon-delimited event lines emitted by committed calls
//! - [`InMemoryLedger`]: Hosting runtime with atomic commit and an ordered event log
//! - [`LedgerError`]: Reasons a call is rejected
//!
//! ## Example
//!
//! ```
//! use card_ledger_rs::{
//!     Call, Identity, InMemoryLedger, LedgerConfig, LinkedTransfer, ManualClock, Timestamp,
//! };
//!
//! let ledger = InMemoryLedger::with_clock(
//!     LedgerConfig::default(),
//!     ManualClock::new(Timestamp(1_700_000_000)),
//! );
//! let owner = Identity::from("OWNER");
//! let alice = Identity::from("ALICE");
//!
//! ledger.submit(Call::create(owner)).unwrap();
//! ledger.submit(Call::opt_in(alice.clone())).unwrap();
//! ledger.submit(Call::create_card(alice.clone(), 2, "samoa", "ALGO")).unwrap();
//!
//! let payment = LinkedTransfer::payment(ledger.custody_address().clone(), 2_000_000);
//! ledger.submit(Call::fund_card(alice.clone(), payment)).unwrap();
//! let receipt = ledger.submit(Call::use_card(alice.clone(), 500_000)).unwrap();
//!
//! assert_eq!(
//!     receipt.events[0].to_string(),
//!     "CardUsed:card_1700000000_ALICE:ALICE:500000:ALGO:1500000"
//! );
//! assert_eq!(ledger.account(&alice).unwrap().balance(), 1_500_000);
//! ```
//!
//! ## Atomicity
//!
//! The engine never writes. A call either yields the complete set of writes
//! and events, which the runtime then commits, or an error and nothing else.

pub mod account;
pub mod base;
pub mod call;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod global;
pub mod limits;
pub mod runtime;
pub mod scheduler;
pub mod store;
pub mod window;

pub use account::{AccountSnapshot, CardAccount};
pub use base::{CardId, Identity, Timestamp};
pub use call::{Call, CallKind, LinkedTransfer, Method, TransferKind};
pub use config::LedgerConfig;
pub use engine::{Engine, Environment};
pub use error::LedgerError;
pub use event::{Event, LogLine};
pub use global::GlobalLedger;
pub use limits::{KycTier, TierLimits};
pub use runtime::{Clock, InMemoryLedger, ManualClock, Receipt, SystemClock};
pub use scheduler::{ResetReport, ResetScheduler};
pub use store::{Effects, LedgerStore};
pub use window::{SpendWindow, WindowReset};
