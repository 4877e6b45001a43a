use crate::domain::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Disbursement,
    Payment,
    Topup,
    Adjustment,
    Claim,
}

/// Whether a payment retires principal or covers period interest.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    Principal,
    Interest,
}

impl fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentKind::Principal => f.write_str("principal"),
            PaymentKind::Interest => f.write_str("interest"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Mpesa,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Completed,
}

/// Immutable audit record of one money movement against a loan.
///
/// Created once per accepted payment or lifecycle event and never mutated or
/// deleted afterwards; it is the single source of truth for what happened.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TransactionRecord {
    pub loan_id: u64,
    pub kind: TransactionKind,
    pub payment_kind: Option<PaymentKind>,
    pub amount: Money,
    pub method: Option<PaymentMethod>,
    /// Gateway receipt number for mobile-money payments.
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    pub fn disbursement(loan_id: u64, amount: Money, now: DateTime<Utc>) -> Self {
        Self {
            loan_id,
            kind: TransactionKind::Disbursement,
            payment_kind: None,
            amount,
            method: Some(PaymentMethod::Cash),
            reference: None,
            notes: Some("loan approved and disbursed".to_string()),
            status: TransactionStatus::Completed,
            created_at: now,
        }
    }

    pub fn payment(
        loan_id: u64,
        payment_kind: PaymentKind,
        amount: Money,
        method: PaymentMethod,
        reference: Option<String>,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            loan_id,
            kind: TransactionKind::Payment,
            payment_kind: Some(payment_kind),
            amount,
            method: Some(method),
            reference,
            notes,
            status: TransactionStatus::Completed,
            created_at: now,
        }
    }

    pub fn claim(loan_id: u64, notes: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            loan_id,
            kind: TransactionKind::Claim,
            payment_kind: None,
            amount: Money::ZERO,
            method: None,
            reference: None,
            notes,
            status: TransactionStatus::Completed,
            created_at: now,
        }
    }
}
