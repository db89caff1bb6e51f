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

//! Incoming calls.
//!
//! A call is what the hosting runtime hands the state machine: who sent it,
//! which lifecycle action it performs, its raw application arguments, and the
//! transfers grouped atomically with it.
//!
//! Argument 0 of a no-op call is the operation tag. Integer arguments are
//! big-endian and at most eight bytes wide; an empty argument reads as zero.

use crate::LedgerError;
use crate::base::Identity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle action carried by a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallKind {
    /// First call; initializes the ledger.
    Create,
    OptIn,
    CloseOut,
    ClearState,
    UpdateApplication,
    DeleteApplication,
    /// Regular call dispatched on its operation tag.
    NoOp,
}

/// Operation tags understood by a no-op call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    CreateCard,
    FundCard,
    UseCard,
    ResetLimits,
    DeactivateCard,
    ActivateCard,
    UpdateLimits,
    EmergencyPause,
    UpdateChainlinkFeed,
}

impl Method {
    pub const ALL: [Method; 9] = [
        Method::CreateCard,
        Method::FundCard,
        Method::UseCard,
        Method::ResetLimits,
        Method::DeactivateCard,
        Method::ActivateCard,
        Method::UpdateLimits,
        Method::EmergencyPause,
        Method::UpdateChainlinkFeed,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Method::CreateCard => "create_card",
            Method::FundCard => "fund_card",
            Method::UseCard => "use_card",
            Method::ResetLimits => "reset_limits",
            Method::DeactivateCard => "deactivate_card",
            Method::ActivateCard => "activate_card",
            Method::UpdateLimits => "update_limits",
            Method::EmergencyPause => "emergency_pause",
            Method::UpdateChainlinkFeed => "update_chainlink_feed",
        }
    }

    /// Exact byte match against the known tags.
    pub fn from_tag(tag: &[u8]) -> Option<Method> {
        Method::ALL
            .into_iter()
            .find(|method| method.tag().as_bytes() == tag)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferKind {
    Payment,
    AssetTransfer,
}

/// A transfer submitted in the same atomic group as the call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedTransfer {
    pub kind: TransferKind,
    pub receiver: Identity,
    pub amount: u64,
}

impl LinkedTransfer {
    pub fn payment(receiver: Identity, amount: u64) -> Self {
        Self {
            kind: TransferKind::Payment,
            receiver,
            amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub sender: Identity,
    pub kind: CallKind,
    pub args: Vec<Vec<u8>>,
    /// Companion transfers, in group order, not counting the call itself.
    pub group: Vec<LinkedTransfer>,
}

impl Call {
    fn lifecycle(sender: Identity, kind: CallKind) -> Self {
        Self {
            sender,
            kind,
            args: Vec::new(),
            group: Vec::new(),
        }
    }

    pub fn create(sender: Identity) -> Self {
        Self::lifecycle(sender, CallKind::Create)
    }

    pub fn opt_in(sender: Identity) -> Self {
        Self::lifecycle(sender, CallKind::OptIn)
    }

    pub fn close_out(sender: Identity) -> Self {
        Self::lifecycle(sender, CallKind::CloseOut)
    }

    pub fn clear_state(sender: Identity) -> Self {
        Self::lifecycle(sender, CallKind::ClearState)
    }

    pub fn update_application(sender: Identity) -> Self {
        Self::lifecycle(sender, CallKind::UpdateApplication)
    }

    pub fn delete_application(sender: Identity) -> Self {
        Self::lifecycle(sender, CallKind::DeleteApplication)
    }

    /// No-op call with a raw tag and raw trailing arguments.
    pub fn no_op(sender: Identity, tag: impl Into<Vec<u8>>, args: Vec<Vec<u8>>) -> Self {
        let mut all = Vec::with_capacity(args.len() + 1);
        all.push(tag.into());
        all.extend(args);
        Self {
            sender,
            kind: CallKind::NoOp,
            args: all,
            group: Vec::new(),
        }
    }

    fn method(sender: Identity, method: Method, args: Vec<Vec<u8>>) -> Self {
        Self::no_op(sender, method.tag(), args)
    }

    pub fn create_card(
        sender: Identity,
        tier: u64,
        region: impl Into<Vec<u8>>,
        currency: impl Into<Vec<u8>>,
    ) -> Self {
        Self::method(
            sender,
            Method::CreateCard,
            vec![encode_uint(tier), region.into(), currency.into()],
        )
    }

    pub fn fund_card(sender: Identity, transfer: LinkedTransfer) -> Self {
        let mut call = Self::method(sender, Method::FundCard, Vec::new());
        call.group.push(transfer);
        call
    }

    pub fn use_card(sender: Identity, amount: u64) -> Self {
        Self::method(sender, Method::UseCard, vec![encode_uint(amount)])
    }

    pub fn reset_limits(sender: Identity) -> Self {
        Self::method(sender, Method::ResetLimits, Vec::new())
    }

    pub fn deactivate_card(sender: Identity) -> Self {
        Self::method(sender, Method::DeactivateCard, Vec::new())
    }

    pub fn activate_card(sender: Identity) -> Self {
        Self::method(sender, Method::ActivateCard, Vec::new())
    }

    pub fn update_limits(sender: Identity, target: &Identity, daily: u64, monthly: u64) -> Self {
        Self::method(
            sender,
            Method::UpdateLimits,
            vec![
                target.as_bytes().to_vec(),
                encode_uint(daily),
                encode_uint(monthly),
            ],
        )
    }

    pub fn emergency_pause(sender: Identity) -> Self {
        Self::method(sender, Method::EmergencyPause, Vec::new())
    }

    pub fn update_chainlink_feed(sender: Identity, feed_id: u64) -> Self {
        Self::method(sender, Method::UpdateChainlinkFeed, vec![encode_uint(feed_id)])
    }

    /// Number of transactions in the atomic group, this call included.
    pub fn group_size(&self) -> usize {
        self.group.len() + 1
    }

    pub fn tag(&self) -> Option<&[u8]> {
        self.args.first().map(Vec::as_slice)
    }

    pub fn require_args(&self, expected: usize) -> Result<(), LedgerError> {
        if self.args.len() != expected {
            return Err(LedgerError::ArgumentCount {
                expected,
                actual: self.args.len(),
            });
        }
        Ok(())
    }

    pub fn bytes_arg(&self, index: usize) -> Result<&[u8], LedgerError> {
        self.args
            .get(index)
            .map(Vec::as_slice)
            .ok_or(LedgerError::ArgumentCount {
                expected: index + 1,
                actual: self.args.len(),
            })
    }

    pub fn uint_arg(&self, index: usize) -> Result<u64, LedgerError> {
        decode_uint(self.bytes_arg(index)?)
    }
}

/// Encodes an integer argument as eight big-endian bytes.
pub fn encode_uint(value: u64) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

/// Decodes a big-endian integer argument of up to eight bytes.
pub fn decode_uint(bytes: &[u8]) -> Result<u64, LedgerError> {
    if bytes.len() > 8 {
        return Err(LedgerError::IntegerTooWide(bytes.len()));
    }
    Ok(bytes
        .iter()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_accepts_short_and_empty_arguments() {
        assert_eq!(decode_uint(&[]), Ok(0));
        assert_eq!(decode_uint(&[0x01, 0x00]), Ok(256));
        assert_eq!(decode_uint(&encode_uint(500_000)), Ok(500_000));
        assert_eq!(decode_uint(&[0xff; 8]), Ok(u64::MAX));
    }

    #[test]
    fn decode_rejects_wide_arguments() {
        assert_eq!(decode_uint(&[0; 9]), Err(LedgerError::IntegerTooWide(9)));
    }

    #[test]
    fn tags_match_exact_bytes() {
        for method in Method::ALL {
            assert_eq!(Method::from_tag(method.tag().as_bytes()), Some(method));
        }
        assert_eq!(Method::from_tag(b"use_card "), None);
        assert_eq!(Method::from_tag(b"USE_CARD"), None);
        assert_eq!(Method::from_tag(b"update_price_feed"), None);
    }

    #[test]
    fn constructors_count_the_tag_as_argument_zero() {
        let sender = Identity::from("ALICE");
        let call = Call::create_card(sender.clone(), 2, "samoa", "ALGO");
        assert_eq!(call.args.len(), 4);
        assert_eq!(call.tag(), Some(b"create_card".as_slice()));
        assert_eq!(call.uint_arg(1), Ok(2));

        let call = Call::use_card(sender, 7);
        assert!(call.require_args(2).is_ok());
        assert_eq!(
            call.require_args(4),
            Err(LedgerError::ArgumentCount {
                expected: 4,
                actual: 2
            })
        );
    }

    #[test]
    fn fund_call_groups_one_transfer() {
        let call = Call::fund_card(
            Identity::from("ALICE"),
            LinkedTransfer::payment(Identity::from("CUSTODY"), 10),
        );
        assert_eq!(call.group_size(), 2);
        assert_eq!(call.args.len(), 1);
    }
}
