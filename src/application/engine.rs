use crate::domain::loan::{Loan, LoanStatus};
use crate::domain::money::{Amount, Money};
use crate::domain::payment::GatewayPayment;
use crate::domain::ports::{LoanStoreBox, PaymentStoreBox, TransactionStoreBox};
use crate::domain::transaction::{PaymentKind, PaymentMethod, TransactionRecord};
use crate::error::{LoanError, Result};
use chrono::{DateTime, Utc};

/// Result of a successfully applied payment.
#[derive(Debug)]
pub struct PaymentOutcome {
    pub loan: Loan,
    pub transaction: TransactionRecord,
    /// True when this payment settled the loan; the caller is responsible
    /// for releasing the pledged collateral.
    pub collateral_released: bool,
}

/// Final disposition of a gateway charge as reported by the callback.
pub enum GatewayResult {
    Success {
        settled_amount: Amount,
        receipt_number: String,
        result_desc: Option<String>,
    },
    Failure {
        result_code: String,
        result_desc: Option<String>,
    },
}

/// The entry point for loan lifecycle operations.
///
/// `LoanEngine` owns the storage backends and applies every operation to a
/// single recalculated snapshot of the loan. Validation happens before any
/// mutation and nothing is persisted on a rejected operation, so a caller
/// can wrap each invocation in one storage transaction and discard all
/// changes on error.
pub struct LoanEngine {
    loan_store: LoanStoreBox,
    transaction_store: TransactionStoreBox,
    payment_store: PaymentStoreBox,
}

impl LoanEngine {
    pub fn new(
        loan_store: LoanStoreBox,
        transaction_store: TransactionStoreBox,
        payment_store: PaymentStoreBox,
    ) -> Self {
        Self {
            loan_store,
            transaction_store,
            payment_store,
        }
    }

    async fn load(&self, loan_id: u64) -> Result<Loan> {
        self.loan_store
            .get(loan_id)
            .await?
            .ok_or(LoanError::LoanNotFound(loan_id))
    }

    /// Registers a new loan application in `pending` status.
    pub async fn open_application(
        &self,
        loan_id: u64,
        client_id: u64,
        collateral_id: Option<u64>,
        principal: Amount,
    ) -> Result<Loan> {
        if self.loan_store.get(loan_id).await?.is_some() {
            return Err(LoanError::LoanAlreadyExists(loan_id));
        }
        let loan = Loan::new(loan_id, client_id, collateral_id, principal);
        self.loan_store.store(loan.clone()).await?;
        Ok(loan)
    }

    /// Approves a pending application and disburses the principal.
    pub async fn approve(
        &self,
        loan_id: u64,
        now: DateTime<Utc>,
    ) -> Result<(Loan, TransactionRecord)> {
        let mut loan = self.load(loan_id).await?;
        loan.approve(now)?;

        let tx = TransactionRecord::disbursement(loan_id, loan.principal_amount, now);
        self.transaction_store.append(tx.clone()).await?;
        self.loan_store.store(loan.clone()).await?;
        Ok((loan, tx))
    }

    /// Rejects a pending application.
    pub async fn reject(&self, loan_id: u64) -> Result<Loan> {
        let mut loan = self.load(loan_id).await?;
        loan.reject()?;
        self.loan_store.store(loan.clone()).await?;
        Ok(loan)
    }

    /// Brings a loan's compounding state up to `now` and persists it.
    pub async fn recalculate(&self, loan_id: u64, now: DateTime<Utc>) -> Result<Loan> {
        let mut loan = self.load(loan_id).await?;
        loan.recalculate(now);
        self.loan_store.store(loan.clone()).await?;
        Ok(loan)
    }

    /// Validates and applies one payment against a loan.
    ///
    /// The loan is recalculated before validation so the payment is judged
    /// against current state, and again after application so the persisted
    /// balance is consistent. A loan whose outstanding amounts reach zero
    /// transitions to `completed` and the outcome signals that the pledged
    /// collateral should be released.
    pub async fn record_payment(
        &self,
        loan_id: u64,
        amount: Amount,
        kind: PaymentKind,
        method: PaymentMethod,
        reference: Option<String>,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<PaymentOutcome> {
        let mut loan = self.load(loan_id).await?;
        if loan.status != LoanStatus::Active {
            return Err(LoanError::InvalidLoanState {
                expected: LoanStatus::Active,
                actual: loan.status,
            });
        }

        loan.recalculate(now);
        match kind {
            PaymentKind::Interest => loan.apply_interest(amount, now)?,
            PaymentKind::Principal => loan.apply_principal(amount)?,
        }
        loan.recalculate(now);

        let mut collateral_released = false;
        if loan.is_settled() {
            loan.status = LoanStatus::Completed;
            collateral_released = loan.collateral_id.is_some();
        }

        let tx = TransactionRecord::payment(
            loan_id,
            kind,
            amount.into(),
            method,
            reference,
            notes,
            now,
        );
        self.transaction_store.append(tx.clone()).await?;
        self.loan_store.store(loan.clone()).await?;

        Ok(PaymentOutcome {
            loan,
            transaction: tx,
            collateral_released,
        })
    }

    /// Seizes the collateral of an overdue loan and writes off the debt.
    ///
    /// Overdue is judged against the stored due date, before any
    /// recalculation: at least one billing period has closed without its
    /// interest being paid.
    pub async fn claim_collateral(
        &self,
        loan_id: u64,
        now: DateTime<Utc>,
    ) -> Result<(Loan, TransactionRecord)> {
        let mut loan = self.load(loan_id).await?;
        if loan.status != LoanStatus::Active {
            return Err(LoanError::InvalidLoanState {
                expected: LoanStatus::Active,
                actual: loan.status,
            });
        }
        if !loan.is_overdue(now) {
            return Err(LoanError::LoanNotOverdue(loan_id));
        }

        loan.mark_claimed()?;
        loan.recalculate(now);

        let notes = loan
            .collateral_id
            .map(|id| format!("collateral {id} seized after missed due date"));
        let tx = TransactionRecord::claim(loan_id, notes, now);
        self.transaction_store.append(tx.clone()).await?;
        self.loan_store.store(loan.clone()).await?;
        Ok((loan, tx))
    }

    /// Registers an in-flight mobile-money charge.
    ///
    /// Validates the requested amount against a recalculated snapshot but
    /// does not touch loan state; the loan is only mutated when the gateway
    /// confirms settlement.
    pub async fn initiate_gateway_payment(
        &self,
        loan_id: u64,
        amount: Amount,
        kind: PaymentKind,
        phone_number: String,
        merchant_request_id: Option<String>,
        checkout_request_id: String,
        now: DateTime<Utc>,
    ) -> Result<GatewayPayment> {
        let mut loan = self.load(loan_id).await?;
        if loan.status != LoanStatus::Active {
            return Err(LoanError::InvalidLoanState {
                expected: LoanStatus::Active,
                actual: loan.status,
            });
        }
        loan.recalculate(now);
        match kind {
            PaymentKind::Interest => {
                let unpaid = loan.unpaid_period_interest();
                if Money::from(amount) > unpaid {
                    return Err(LoanError::AmountExceedsDue {
                        amount: amount.value(),
                        unpaid: unpaid.value(),
                    });
                }
            }
            PaymentKind::Principal => {
                if Money::from(amount) > loan.current_principal {
                    return Err(LoanError::AmountExceedsPrincipal {
                        amount: amount.value(),
                        outstanding: loan.current_principal.value(),
                    });
                }
            }
        }

        let payment = GatewayPayment::new(
            loan_id,
            phone_number,
            amount.into(),
            kind,
            merchant_request_id,
            checkout_request_id,
            now,
        );
        self.payment_store.store(payment.clone()).await?;
        Ok(payment)
    }

    /// Settles an in-flight gateway charge from its confirmation callback.
    ///
    /// On success the settled amount (which may differ from the requested
    /// amount) is applied to the loan; only if that application succeeds is
    /// the payment marked completed. A payment the loan cannot absorb stays
    /// pending for manual reconciliation. Failures record the gateway's
    /// result and touch no loan state.
    pub async fn confirm_gateway_payment(
        &self,
        checkout_request_id: &str,
        result: GatewayResult,
        now: DateTime<Utc>,
    ) -> Result<Option<PaymentOutcome>> {
        let mut payment = self
            .payment_store
            .by_checkout_id(checkout_request_id)
            .await?
            .ok_or_else(|| LoanError::PaymentNotFound(checkout_request_id.to_string()))?;

        match result {
            GatewayResult::Success {
                settled_amount,
                receipt_number,
                result_desc,
            } => {
                // Reject duplicate callbacks before applying anything.
                payment.complete(
                    settled_amount.into(),
                    receipt_number.clone(),
                    result_desc,
                    now,
                )?;

                let outcome = self
                    .record_payment(
                        payment.loan_id,
                        settled_amount,
                        payment.kind,
                        PaymentMethod::Mpesa,
                        Some(receipt_number),
                        None,
                        now,
                    )
                    .await?;
                self.payment_store.store(payment).await?;
                Ok(Some(outcome))
            }
            GatewayResult::Failure {
                result_code,
                result_desc,
            } => {
                payment.fail(result_code, result_desc, now)?;
                self.payment_store.store(payment).await?;
                Ok(None)
            }
        }
    }

    pub async fn loan(&self, loan_id: u64) -> Result<Loan> {
        self.load(loan_id).await
    }

    pub async fn transactions_for(&self, loan_id: u64) -> Result<Vec<TransactionRecord>> {
        self.transaction_store.for_loan(loan_id).await
    }

    /// Recalculates every stored loan as of `now`.
    pub async fn recalculate_all(&self, now: DateTime<Utc>) -> Result<()> {
        for mut loan in self.loan_store.all().await? {
            loan.recalculate(now);
            self.loan_store.store(loan).await?;
        }
        Ok(())
    }

    /// Consumes the engine and returns the final state of all loans.
    pub async fn into_loans(self) -> Result<Vec<Loan>> {
        let mut loans = self.loan_store.all().await?;
        loans.sort_by_key(|loan| loan.id);
        Ok(loans)
    }
}
