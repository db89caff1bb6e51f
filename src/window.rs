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

//! Daily and monthly spending windows.
//!
//! Time is cut into fixed-length buckets: a day is 86 400 seconds and a
//! "month" is a flat 30 days (2 592 000 seconds), not a calendar month.
//! A window whose stored bucket is behind the current bucket has expired;
//! rolling it zeroes the spent counter and moves the bucket forward.

use crate::account::CardAccount;
use crate::base::Timestamp;
use serde::{Deserialize, Serialize};

pub const SECONDS_PER_DAY: u64 = 86_400;
pub const SECONDS_PER_MONTH: u64 = 2_592_000;

/// Length of a spending window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day,
    Month,
}

impl Period {
    pub fn seconds(self) -> u64 {
        match self {
            Period::Day => SECONDS_PER_DAY,
            Period::Month => SECONDS_PER_MONTH,
        }
    }

    /// Index of the bucket `now` falls into.
    pub fn bucket(self, now: Timestamp) -> u64 {
        now.0 / self.seconds()
    }
}

pub fn day_bucket(now: Timestamp) -> u64 {
    Period::Day.bucket(now)
}

pub fn month_bucket(now: Timestamp) -> u64 {
    Period::Month.bucket(now)
}

/// Cumulative spend within one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpendWindow {
    pub spent: u64,
    pub last_reset: u64,
}

impl SpendWindow {
    pub fn starting_at(bucket: u64) -> Self {
        Self {
            spent: 0,
            last_reset: bucket,
        }
    }

    pub fn needs_reset(&self, current_bucket: u64) -> bool {
        current_bucket > self.last_reset
    }

    /// Zeroes the window if it has expired. Returns whether it rolled.
    pub fn roll(&mut self, current_bucket: u64) -> bool {
        if !self.needs_reset(current_bucket) {
            return false;
        }
        self.spent = 0;
        self.last_reset = current_bucket;
        true
    }
}

/// Which windows were rolled by [`apply_window_resets`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowReset {
    pub daily: bool,
    pub monthly: bool,
}

impl WindowReset {
    pub fn any(&self) -> bool {
        self.daily || self.monthly
    }
}

pub fn needs_daily_reset(account: &CardAccount, now: Timestamp) -> bool {
    account.daily_window().needs_reset(day_bucket(now))
}

pub fn needs_monthly_reset(account: &CardAccount, now: Timestamp) -> bool {
    account.monthly_window().needs_reset(month_bucket(now))
}

/// Rolls whichever of the account's windows have expired at `now`.
pub fn apply_window_resets(account: &mut CardAccount, now: Timestamp) -> WindowReset {
    let (daily, monthly) = account.windows_mut();
    WindowReset {
        daily: daily.roll(day_bucket(now)),
        monthly: monthly.roll(month_bucket(now)),
    }
}
