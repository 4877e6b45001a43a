use crate::domain::transaction::{PaymentKind, PaymentMethod};
use crate::error::{LoanError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Open,
    Approve,
    Reject,
    Pay,
    Claim,
}

/// One timestamped loan-ledger event.
///
/// Columns that do not apply to an event kind are left empty; which fields
/// are required is validated when the event is applied, not at parse time.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct LoanEvent {
    pub event: EventKind,
    pub loan: u64,
    pub client: Option<u64>,
    pub collateral: Option<u64>,
    pub amount: Option<Decimal>,
    pub kind: Option<PaymentKind>,
    pub method: Option<PaymentMethod>,
    pub reference: Option<String>,
    pub date: DateTime<Utc>,
}

/// Reads loan events from a CSV source.
///
/// Wraps `csv::Reader` and provides an iterator over `Result<LoanEvent>`,
/// handling whitespace trimming and flexible record lengths so large event
/// files can be processed in a streaming fashion.
pub struct EventReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> EventReader<R> {
    /// Creates a new `EventReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes events.
    pub fn events(self) -> impl Iterator<Item = Result<LoanEvent>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LoanError::from))
    }
}
