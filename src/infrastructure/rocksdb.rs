use crate::domain::loan::Loan;
use crate::domain::payment::GatewayPayment;
use crate::domain::ports::{LoanStore, PaymentStore, TransactionStore};
use crate::domain::transaction::TransactionRecord;
use crate::error::{LoanError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Column Family for loan state.
pub const CF_LOANS: &str = "loans";
/// Column Family for the transaction audit trail.
pub const CF_TRANSACTIONS: &str = "transactions";
/// Column Family for in-flight gateway payments.
pub const CF_PAYMENTS: &str = "payments";

fn internal(msg: String) -> LoanError {
    LoanError::InternalError(Box::new(std::io::Error::other(msg)))
}

/// A persistent store implementation using RocksDB.
///
/// Loans are keyed by big-endian loan id, transactions by an append
/// sequence number (preserving insertion order under iteration), and
/// gateway payments by checkout request id. Values are serialized with
/// `serde_json`, which round-trips the fixed-point money fields exactly.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    tx_seq: Arc<AtomicU64>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path, ensuring
    /// the required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = vec![
            ColumnFamilyDescriptor::new(CF_LOANS, Options::default()),
            ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Options::default()),
            ColumnFamilyDescriptor::new(CF_PAYMENTS, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&opts, path, cfs)
            .map_err(|e| internal(format!("failed to open database: {e}")))?;

        // Resume the transaction sequence from what is already on disk.
        let next_seq = {
            let cf = db
                .cf_handle(CF_TRANSACTIONS)
                .ok_or_else(|| internal("transactions column family not found".to_string()))?;
            let mut iter = db.iterator_cf(cf, rocksdb::IteratorMode::End);
            match iter.next() {
                Some(Ok((key, _))) => {
                    let bytes: [u8; 8] = key
                        .as_ref()
                        .try_into()
                        .map_err(|_| internal("malformed transaction key".to_string()))?;
                    u64::from_be_bytes(bytes) + 1
                }
                _ => 0,
            }
        };

        Ok(Self {
            db: Arc::new(db),
            tx_seq: Arc::new(AtomicU64::new(next_seq)),
        })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| internal(format!("{name} column family not found")))
    }

    fn put<V: serde::Serialize>(&self, cf_name: &str, key: &[u8], value: &V) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let bytes = serde_json::to_vec(value)
            .map_err(|e| internal(format!("serialization error: {e}")))?;
        self.db
            .put_cf(cf, key, bytes)
            .map_err(|e| internal(format!("write error: {e}")))?;
        Ok(())
    }

    fn read<V: serde::de::DeserializeOwned>(
        &self,
        cf_name: &str,
        key: &[u8],
    ) -> Result<Option<V>> {
        let cf = self.cf(cf_name)?;
        let result = self
            .db
            .get_cf(cf, key)
            .map_err(|e| internal(format!("read error: {e}")))?;
        match result {
            Some(bytes) => {
                let value = serde_json::from_slice(&bytes)
                    .map_err(|e| internal(format!("deserialization error: {e}")))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl LoanStore for RocksDBStore {
    async fn store(&self, loan: Loan) -> Result<()> {
        self.put(CF_LOANS, &loan.id.to_be_bytes(), &loan)
    }

    async fn get(&self, loan_id: u64) -> Result<Option<Loan>> {
        self.read(CF_LOANS, &loan_id.to_be_bytes())
    }

    async fn all(&self) -> Result<Vec<Loan>> {
        let cf = self.cf(CF_LOANS)?;
        let mut loans = Vec::new();
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, value) =
                item.map_err(|e| internal(format!("iteration error: {e}")))?;
            let loan: Loan = serde_json::from_slice(&value)
                .map_err(|e| internal(format!("failed to deserialize loan: {e}")))?;
            loans.push(loan);
        }
        Ok(loans)
    }
}

#[async_trait]
impl TransactionStore for RocksDBStore {
    async fn append(&self, tx: TransactionRecord) -> Result<()> {
        let seq = self.tx_seq.fetch_add(1, Ordering::SeqCst);
        self.put(CF_TRANSACTIONS, &seq.to_be_bytes(), &tx)
    }

    async fn for_loan(&self, loan_id: u64) -> Result<Vec<TransactionRecord>> {
        let cf = self.cf(CF_TRANSACTIONS)?;
        let mut transactions = Vec::new();
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, value) =
                item.map_err(|e| internal(format!("iteration error: {e}")))?;
            let tx: TransactionRecord = serde_json::from_slice(&value)
                .map_err(|e| internal(format!("failed to deserialize transaction: {e}")))?;
            if tx.loan_id == loan_id {
                transactions.push(tx);
            }
        }
        Ok(transactions)
    }
}

#[async_trait]
impl PaymentStore for RocksDBStore {
    async fn store(&self, payment: GatewayPayment) -> Result<()> {
        let key = payment.checkout_request_id.as_bytes().to_vec();
        self.put(CF_PAYMENTS, &key, &payment)
    }

    async fn by_checkout_id(&self, checkout_request_id: &str) -> Result<Option<GatewayPayment>> {
        self.read(CF_PAYMENTS, checkout_request_id.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::{Amount, Money};
    use crate::domain::transaction::{PaymentKind, PaymentMethod};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).expect("failed to open RocksDB");

        assert!(store.db.cf_handle(CF_LOANS).is_some());
        assert!(store.db.cf_handle(CF_TRANSACTIONS).is_some());
        assert!(store.db.cf_handle(CF_PAYMENTS).is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_loan_roundtrip() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let mut loan = Loan::new(1, 100, Some(7), Amount::new(dec!(30000)).unwrap());
        loan.approve("2026-01-05T00:00:00Z".parse().unwrap()).unwrap();

        LoanStore::store(&store, loan.clone()).await.unwrap();
        let retrieved = LoanStore::get(&store, 1).await.unwrap().unwrap();
        assert_eq!(retrieved, loan);
        assert_eq!(retrieved.balance, Money::new(dec!(39000)));

        assert!(LoanStore::get(&store, 2).await.unwrap().is_none());
        assert_eq!(LoanStore::all(&store).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rocksdb_transaction_sequence_survives_reopen() {
        let dir = tempdir().unwrap();
        let now = "2026-01-05T00:00:00Z".parse().unwrap();

        {
            let store = RocksDBStore::open(dir.path()).unwrap();
            for _ in 0..3 {
                store
                    .append(TransactionRecord::payment(
                        1,
                        PaymentKind::Interest,
                        Money::new(dec!(10)),
                        PaymentMethod::Cash,
                        None,
                        None,
                        now,
                    ))
                    .await
                    .unwrap();
            }
        }

        let store = RocksDBStore::open(dir.path()).unwrap();
        store
            .append(TransactionRecord::payment(
                1,
                PaymentKind::Principal,
                Money::new(dec!(20)),
                PaymentMethod::Cash,
                None,
                None,
                now,
            ))
            .await
            .unwrap();

        let txs = store.for_loan(1).await.unwrap();
        assert_eq!(txs.len(), 4);
        assert_eq!(txs[3].amount, Money::new(dec!(20)));
    }

    #[tokio::test]
    async fn test_rocksdb_payment_roundtrip() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let payment = GatewayPayment::new(
            1,
            "254700000001".to_string(),
            Money::new(dec!(9000)),
            PaymentKind::Interest,
            Some("29115-34620561-1".to_string()),
            "ws_CO_42".to_string(),
            "2026-01-05T00:00:00Z".parse().unwrap(),
        );

        PaymentStore::store(&store, payment.clone()).await.unwrap();
        let retrieved = store.by_checkout_id("ws_CO_42").await.unwrap().unwrap();
        assert_eq!(retrieved, payment);
    }
}
