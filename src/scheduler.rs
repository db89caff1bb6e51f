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

//! Periodic limit-reset driver.
//!
//! `reset_limits` is open to any caller so that an outside scheduler can roll
//! spending windows without waiting for the next card payment. The
//! [`ResetScheduler`] fires within a short grace period after UTC midnight and
//! submits one `reset_limits` call per card holder.

use crate::base::{Identity, Timestamp};
use crate::call::Call;
use crate::runtime::{Clock, InMemoryLedger};
use crate::window::SECONDS_PER_DAY;

/// Seconds after UTC midnight during which a run is due.
pub const DEFAULT_GRACE_SECS: u64 = 5 * 60;

/// Tally of one scheduler run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResetReport {
    pub submitted: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetScheduler {
    grace_secs: u64,
}

impl Default for ResetScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_GRACE_SECS)
    }
}

impl ResetScheduler {
    pub fn new(grace_secs: u64) -> Self {
        Self { grace_secs }
    }

    /// True during the first `grace_secs` seconds of a UTC day.
    pub fn is_due(&self, now: Timestamp) -> bool {
        now.0 % SECONDS_PER_DAY < self.grace_secs
    }

    /// Submits `reset_limits` for each holder. Failures are counted, not fatal.
    pub fn run<C, I>(&self, ledger: &InMemoryLedger<C>, holders: I) -> ResetReport
    where
        C: Clock,
        I: IntoIterator<Item = Identity>,
    {
        let mut report = ResetReport::default();
        for holder in holders {
            match ledger.submit(Call::reset_limits(holder.clone())) {
                Ok(_) => report.submitted += 1,
                Err(err) => {
                    tracing::warn!(holder = %holder, reason = %err, "limit reset rejected");
                    report.failed += 1;
                }
            }
        }
        tracing::info!(
            submitted = report.submitted,
            failed = report.failed,
            "limit reset run finished"
        );
        report
    }

    /// Runs only if the ledger clock is inside the due window.
    pub fn tick<C, I>(&self, ledger: &InMemoryLedger<C>, holders: I) -> Option<ResetReport>
    where
        C: Clock,
        I: IntoIterator<Item = Identity>,
    {
        if !self.is_due(ledger.clock().now()) {
            return None;
        }
        Some(self.run(ledger, holders))
    }
}
