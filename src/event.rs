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

//! Events emitted by committed calls.
//!
//! Each event renders as a single colon-delimited line, `Name:field:field…`.
//! Byte-string fields (card id, identities, region, currency) are written as
//! they are, so a `:` inside one of them makes the line ambiguous to split.
//! Bytes that are not valid UTF-8 are rendered lossily as U+FFFD, so two
//! distinct non-UTF-8 identities can produce the same line.

use crate::base::{CardId, Identity, Timestamp};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Event {
    CardCreated {
        card_id: CardId,
        owner: Identity,
        tier: u64,
        region: Vec<u8>,
        currency: Vec<u8>,
    },
    CardFunded {
        card_id: CardId,
        owner: Identity,
        amount: u64,
        currency: Vec<u8>,
    },
    CardUsed {
        card_id: CardId,
        owner: Identity,
        amount: u64,
        currency: Vec<u8>,
        new_balance: u64,
    },
    LimitsReset {
        caller: Identity,
        timestamp: Timestamp,
    },
    CardDeactivated {
        card_id: CardId,
        owner: Identity,
    },
    CardActivated {
        card_id: CardId,
        owner: Identity,
    },
    LimitsUpdated {
        target: Identity,
        daily_limit: u64,
        monthly_limit: u64,
    },
    EmergencyPause {
        caller: Identity,
        timestamp: Timestamp,
    },
    ChainlinkFeedUpdated {
        feed_id: u64,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::CardCreated { .. } => "CardCreated",
            Event::CardFunded { .. } => "CardFunded",
            Event::CardUsed { .. } => "CardUsed",
            Event::LimitsReset { .. } => "LimitsReset",
            Event::CardDeactivated { .. } => "CardDeactivated",
            Event::CardActivated { .. } => "CardActivated",
            Event::LimitsUpdated { .. } => "LimitsUpdated",
            Event::EmergencyPause { .. } => "EmergencyPause",
            Event::ChainlinkFeedUpdated { .. } => "ChainlinkFeedUpdated",
        }
    }
}

struct Raw<'a>(&'a [u8]);

impl fmt::Display for Raw<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.0))
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.name())?;
        match self {
            Event::CardCreated {
                card_id,
                owner,
                tier,
                region,
                currency,
            } => write!(
                f,
                "{card_id}:{owner}:{tier}:{}:{}",
                Raw(region),
                Raw(currency)
            ),
            Event::CardFunded {
                card_id,
                owner,
                amount,
                currency,
            } => write!(f, "{card_id}:{owner}:{amount}:{}", Raw(currency)),
            Event::CardUsed {
                card_id,
                owner,
                amount,
                currency,
                new_balance,
            } => write!(
                f,
                "{card_id}:{owner}:{amount}:{}:{new_balance}",
                Raw(currency)
            ),
            Event::LimitsReset { caller, timestamp } => write!(f, "{caller}:{timestamp}"),
            Event::CardDeactivated { card_id, owner } | Event::CardActivated { card_id, owner } => {
                write!(f, "{card_id}:{owner}")
            }
            Event::LimitsUpdated {
                target,
                daily_limit,
                monthly_limit,
            } => write!(f, "{target}:{daily_limit}:{monthly_limit}"),
            Event::EmergencyPause { caller, timestamp } => write!(f, "{caller}:{timestamp}"),
            Event::ChainlinkFeedUpdated { feed_id } => write!(f, "{feed_id}"),
        }
    }
}

/// An event line split the way downstream consumers split it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine<'a> {
    pub event: &'a str,
    pub fields: Vec<&'a str>,
}

impl<'a> LogLine<'a> {
    /// Splits on every `:`. No unescaping is attempted.
    pub fn parse(line: &'a str) -> Option<Self> {
        let mut parts = line.split(':');
        let event = parts.next().filter(|name| !name.is_empty())?;
        Some(Self {
            event,
            fields: parts.collect(),
        })
    }
}
