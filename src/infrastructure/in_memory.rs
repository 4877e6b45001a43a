use crate::domain::loan::Loan;
use crate::domain::payment::GatewayPayment;
use crate::domain::ports::{LoanStore, PaymentStore, TransactionStore};
use crate::domain::transaction::TransactionRecord;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for loans.
///
/// Uses `Arc<RwLock<HashMap<u64, Loan>>>` for shared concurrent access. The
/// write lock serializes read-modify-write cycles, satisfying the one
/// concurrent writer per loan requirement of the port. Ideal for tests and
/// replay runs where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryLoanStore {
    loans: Arc<RwLock<HashMap<u64, Loan>>>,
}

impl InMemoryLoanStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LoanStore for InMemoryLoanStore {
    async fn store(&self, loan: Loan) -> Result<()> {
        let mut loans = self.loans.write().await;
        loans.insert(loan.id, loan);
        Ok(())
    }

    async fn get(&self, loan_id: u64) -> Result<Option<Loan>> {
        let loans = self.loans.read().await;
        Ok(loans.get(&loan_id).cloned())
    }

    async fn all(&self) -> Result<Vec<Loan>> {
        let loans = self.loans.read().await;
        Ok(loans.values().cloned().collect())
    }
}

/// An append-only in-memory transaction log.
#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    transactions: Arc<RwLock<Vec<TransactionRecord>>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn append(&self, tx: TransactionRecord) -> Result<()> {
        let mut transactions = self.transactions.write().await;
        transactions.push(tx);
        Ok(())
    }

    async fn for_loan(&self, loan_id: u64) -> Result<Vec<TransactionRecord>> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .iter()
            .filter(|tx| tx.loan_id == loan_id)
            .cloned()
            .collect())
    }
}

/// In-memory store for in-flight gateway payments, keyed by checkout
/// request id.
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    payments: Arc<RwLock<HashMap<String, GatewayPayment>>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn store(&self, payment: GatewayPayment) -> Result<()> {
        let mut payments = self.payments.write().await;
        payments.insert(payment.checkout_request_id.clone(), payment);
        Ok(())
    }

    async fn by_checkout_id(&self, checkout_request_id: &str) -> Result<Option<GatewayPayment>> {
        let payments = self.payments.read().await;
        Ok(payments.get(checkout_request_id).cloned())
    }
}
