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

use card_ledger_rs::call::encode_uint;
use card_ledger_rs::{
    AccountSnapshot, Call, Identity, InMemoryLedger, LedgerConfig, LinkedTransfer,
    ManualClock, Method, Timestamp,
};
use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// Card Ledger - Replay a CSV of ledger calls
///
/// Reads calls from a CSV file, applies them in order to an in-memory ledger,
/// and writes the resulting card accounts to stdout.
#[derive(Parser, Debug)]
#[command(name = "card-ledger-rs")]
#[command(about = "Replays virtual card ledger calls from a CSV file", long_about = None)]
struct Args {
    /// Path to CSV file with calls
    ///
    /// Expected format: timestamp,sender,call,arg1,arg2,arg3,payment
    /// Example: cargo run -- calls.csv > accounts.csv
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Currency tag recorded when the ledger is created
    #[arg(long, default_value = "ALGO")]
    base_currency: String,

    /// Version tag recorded when the ledger is created
    #[arg(long, default_value = "1.0.0")]
    contract_version: String,

    /// Address that funding payments are sent to
    #[arg(long, default_value = "card-ledger-custody")]
    custody_address: String,
}

impl Args {
    fn config(&self) -> LedgerConfig {
        LedgerConfig {
            base_currency: self.base_currency.clone(),
            contract_version: self.contract_version.clone(),
            custody_address: Identity::from(self.custody_address.as_str()),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let file = match File::open(&args.input) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening file '{}': {}", args.input.display(), e);
            process::exit(1);
        }
    };

    let ledger = match replay_calls(BufReader::new(file), args.config()) {
        Ok(ledger) => ledger,
        Err(e) => {
            eprintln!("Error processing calls: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = write_accounts(&ledger, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

/// Raw CSV record matching the input format.
///
/// Fields: `timestamp, sender, call, arg1, arg2, arg3, payment`
#[derive(Debug, Deserialize)]
struct CsvRecord {
    timestamp: u64,
    sender: String,
    call: String,
    arg1: Option<String>,
    arg2: Option<String>,
    arg3: Option<String>,
    #[serde(deserialize_with = "csv::invalid_option")]
    payment: Option<u64>,
}

/// Whether the argument at `index` (tag is 0) is an integer for `method`.
fn is_integer_arg(method: Method, index: usize) -> bool {
    matches!(
        (method, index),
        (Method::CreateCard, 1)
            | (Method::UseCard, 1)
            | (Method::UpdateLimits, 2 | 3)
            | (Method::UpdateChainlinkFeed, 1)
    )
}

/// Number of arguments after the tag that `method` takes.
fn argument_count(method: Method) -> usize {
    match method {
        Method::CreateCard | Method::UpdateLimits => 3,
        Method::UseCard | Method::UpdateChainlinkFeed => 1,
        Method::FundCard
        | Method::ResetLimits
        | Method::DeactivateCard
        | Method::ActivateCard
        | Method::EmergencyPause => 0,
    }
}

impl CsvRecord {
    /// Converts the record into a call.
    ///
    /// Returns `None` when an integer argument does not parse.
    fn into_call(self, custody: &Identity) -> Option<Call> {
        let sender = Identity::from(self.sender);
        let lifecycle: Option<fn(Identity) -> Call> = match self.call.as_str() {
            "create" => Some(Call::create),
            "opt_in" => Some(Call::opt_in),
            "close_out" => Some(Call::close_out),
            "clear_state" => Some(Call::clear_state),
            "update" => Some(Call::update_application),
            "delete" => Some(Call::delete_application),
            _ => None,
        };
        if let Some(build) = lifecycle {
            return Some(build(sender));
        }

        let method = Method::from_tag(self.call.as_bytes());
        let keep = method.map_or(0, argument_count);
        let mut cells = vec![self.arg1, self.arg2, self.arg3];
        while cells.len() > keep && matches!(cells.last(), Some(None)) {
            cells.pop();
        }

        // Kept empty cells become empty arguments; the codec reads an empty
        // integer as zero.
        let mut args = Vec::with_capacity(cells.len());
        for (offset, cell) in cells.into_iter().enumerate() {
            let index = offset + 1;
            let cell = cell.unwrap_or_default();
            match method {
                Some(method) if is_integer_arg(method, index) && !cell.is_empty() => {
                    args.push(encode_uint(cell.parse().ok()?));
                }
                _ => args.push(cell.into_bytes()),
            }
        }

        let mut call = Call::no_op(sender, self.call, args);
        if let Some(amount) = self.payment {
            call.group.push(LinkedTransfer::payment(custody.clone(), amount));
        }
        Some(call)
    }
}

/// Replays calls from a CSV reader against a fresh ledger.
///
/// The ledger clock is set to each record's timestamp before its call is
/// submitted. Malformed rows and rejected calls are logged and skipped.
///
/// # CSV Format
///
/// Expected columns: `timestamp, sender, call, arg1, arg2, arg3, payment`
/// - `call`: a lifecycle action (`create`, `opt_in`, `close_out`,
///   `clear_state`, `update`, `delete`) or an operation tag
/// - `arg1..arg3`: operation arguments, integers written in decimal
/// - `payment`: amount of a payment to the custody address grouped with the call
///
/// # Example
///
/// ```csv
/// timestamp,sender,call,arg1,arg2,arg3,payment
/// 1700000000,OWNER,create,,,,
/// 1700000000,ALICE,opt_in,,,,
/// 1700000000,ALICE,create_card,2,samoa,ALGO,
/// 1700000060,ALICE,fund_card,,,,2000000
/// 1700000120,ALICE,use_card,500000,,,
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the CSV structure is invalid.
pub fn replay_calls<R: Read>(
    reader: R,
    config: LedgerConfig,
) -> Result<InMemoryLedger<ManualClock>, csv::Error> {
    let ledger = InMemoryLedger::with_clock(config, ManualClock::default());

    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    for (row, result) in rdr.deserialize::<CsvRecord>().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(row, error = %e, "skipping malformed row");
                continue;
            }
        };

        let now = Timestamp(record.timestamp);
        let Some(call) = record.into_call(ledger.custody_address()) else {
            tracing::warn!(row, "skipping row with a non-integer argument");
            continue;
        };

        ledger.clock().set(now);
        if let Err(e) = ledger.submit(call) {
            tracing::info!(row, reason = %e, "call rejected");
        }
    }

    Ok(ledger)
}

/// Writes every account as a CSV row.
///
/// # CSV Format
///
/// Columns: `holder, card_id, kyc_tier, region, currency, balance,
/// daily_spent, monthly_spent, daily_limit, monthly_limit, active`, with
/// amounts in whole currency units to six decimal places.
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_accounts<W: Write>(
    ledger: &InMemoryLedger<ManualClock>,
    writer: W,
) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    for (holder, account) in ledger.accounts() {
        wtr.serialize(AccountSnapshot {
            holder: &holder,
            account: &account,
        })?;
    }

    wtr.flush()?;
    Ok(())
}
