use crate::domain::loan::Loan;
use crate::domain::payment::GatewayPayment;
use crate::domain::transaction::TransactionRecord;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Storage port for loans.
///
/// Implementations must serialize read-modify-write cycles per loan: the
/// engine validates a payment against a snapshot and writes the result back,
/// so two writers racing on the same loan could both spend the same period's
/// interest allowance.
#[async_trait]
pub trait LoanStore: Send + Sync {
    async fn store(&self, loan: Loan) -> Result<()>;
    async fn get(&self, loan_id: u64) -> Result<Option<Loan>>;
    async fn all(&self) -> Result<Vec<Loan>>;
}

/// Append-only storage port for the transaction audit trail.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn append(&self, tx: TransactionRecord) -> Result<()>;
    async fn for_loan(&self, loan_id: u64) -> Result<Vec<TransactionRecord>>;
}

/// Storage port for in-flight gateway payments, keyed by the gateway's
/// checkout request id.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn store(&self, payment: GatewayPayment) -> Result<()>;
    async fn by_checkout_id(&self, checkout_request_id: &str) -> Result<Option<GatewayPayment>>;
}

/// Supplies the current instant. The engine itself is pure given inputs; the
/// clock only feeds the boundary that invokes it.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub type LoanStoreBox = Box<dyn LoanStore>;
pub type TransactionStoreBox = Box<dyn TransactionStore>;
pub type PaymentStoreBox = Box<dyn PaymentStore>;
