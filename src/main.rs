use chrono::{DateTime, Utc};
use clap::Parser;
use mifugo::application::engine::LoanEngine;
use mifugo::domain::money::Amount;
use mifugo::domain::ports::{Clock, LoanStoreBox, PaymentStoreBox, TransactionStoreBox};
use mifugo::domain::transaction::PaymentMethod;
use mifugo::error::LoanError;
use mifugo::infrastructure::clock::SystemClock;
use mifugo::infrastructure::in_memory::{
    InMemoryLoanStore, InMemoryPaymentStore, InMemoryTransactionStore,
};
use mifugo::interfaces::csv::event_reader::{EventKind, EventReader, LoanEvent};
use mifugo::interfaces::csv::loan_writer::LoanWriter;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input loan events CSV file
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Report loan state as of this instant (RFC 3339). Defaults to the
    /// timestamp of the last event.
    #[arg(long)]
    as_of: Option<DateTime<Utc>>,
}

fn build_engine(db_path: Option<PathBuf>) -> Result<LoanEngine> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let store =
                mifugo::infrastructure::rocksdb::RocksDBStore::open(path).into_diagnostic()?;
            let loans: LoanStoreBox = Box::new(store.clone());
            let transactions: TransactionStoreBox = Box::new(store.clone());
            let payments: PaymentStoreBox = Box::new(store);
            Ok(LoanEngine::new(loans, transactions, payments))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => Err(miette::miette!(
            "persistent storage requires the storage-rocksdb feature"
        )),
        None => {
            let loans: LoanStoreBox = Box::new(InMemoryLoanStore::new());
            let transactions: TransactionStoreBox = Box::new(InMemoryTransactionStore::new());
            let payments: PaymentStoreBox = Box::new(InMemoryPaymentStore::new());
            Ok(LoanEngine::new(loans, transactions, payments))
        }
    }
}

fn required_amount(event: &LoanEvent) -> mifugo::error::Result<Amount> {
    let value = event
        .amount
        .ok_or_else(|| LoanError::InvalidEvent("event requires an amount".to_string()))?;
    Amount::new(value)
}

async fn apply_event(engine: &LoanEngine, event: LoanEvent) -> mifugo::error::Result<()> {
    match event.event {
        EventKind::Open => {
            let client = event
                .client
                .ok_or_else(|| LoanError::InvalidEvent("open requires a client".to_string()))?;
            let amount = required_amount(&event)?;
            engine
                .open_application(event.loan, client, event.collateral, amount)
                .await?;
        }
        EventKind::Approve => {
            engine.approve(event.loan, event.date).await?;
        }
        EventKind::Reject => {
            engine.reject(event.loan).await?;
        }
        EventKind::Pay => {
            let amount = required_amount(&event)?;
            let kind = event
                .kind
                .ok_or_else(|| LoanError::InvalidEvent("pay requires a payment kind".to_string()))?;
            let method = event.method.unwrap_or(PaymentMethod::Cash);
            engine
                .record_payment(
                    event.loan,
                    amount,
                    kind,
                    method,
                    event.reference,
                    None,
                    event.date,
                )
                .await?;
        }
        EventKind::Claim => {
            engine.claim_collateral(event.loan, event.date).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let engine = build_engine(cli.db_path)?;

    // Replay events; a bad row or a rejected operation is reported and
    // skipped, the rest of the ledger still applies.
    let file = File::open(cli.input).into_diagnostic()?;
    let reader = EventReader::new(file);
    let mut last_event_at: Option<DateTime<Utc>> = None;
    for event_result in reader.events() {
        match event_result {
            Ok(event) => {
                last_event_at = Some(match last_event_at {
                    Some(seen) => seen.max(event.date),
                    None => event.date,
                });
                if let Err(e) = apply_event(&engine, event).await {
                    eprintln!("Error applying event: {e}");
                }
            }
            Err(e) => {
                eprintln!("Error reading event: {e}");
            }
        }
    }

    // Bring every loan up to the reporting instant before output.
    let as_of = cli
        .as_of
        .or(last_event_at)
        .unwrap_or_else(|| SystemClock.now());
    engine.recalculate_all(as_of).await.into_diagnostic()?;

    let loans = engine.into_loans().await.into_diagnostic()?;

    let stdout = io::stdout();
    let mut writer = LoanWriter::new(stdout.lock());
    writer.write_loans(loans).into_diagnostic()?;

    Ok(())
}
