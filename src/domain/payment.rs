use crate::domain::money::Money;
use crate::domain::transaction::PaymentKind;
use crate::error::LoanError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum GatewayPaymentStatus {
    Pending,
    Completed,
    Failed,
}

/// An in-flight mobile-money charge awaiting asynchronous confirmation.
///
/// Settles at most once: `pending -> completed` or `pending -> failed`.
/// Cash payments never create one of these; they go straight to a
/// transaction record.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct GatewayPayment {
    pub loan_id: u64,
    pub phone_number: String,
    /// Amount requested from the gateway. The settled amount reported at
    /// confirmation is what actually gets applied to the loan.
    pub amount: Money,
    pub kind: PaymentKind,
    pub merchant_request_id: Option<String>,
    pub checkout_request_id: String,
    pub receipt_number: Option<String>,
    pub status: GatewayPaymentStatus,
    pub result_code: Option<String>,
    pub result_desc: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GatewayPayment {
    pub fn new(
        loan_id: u64,
        phone_number: String,
        amount: Money,
        kind: PaymentKind,
        merchant_request_id: Option<String>,
        checkout_request_id: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            loan_id,
            phone_number,
            amount,
            kind,
            merchant_request_id,
            checkout_request_id,
            receipt_number: None,
            status: GatewayPaymentStatus::Pending,
            result_code: None,
            result_desc: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn expect_pending(&self) -> Result<(), LoanError> {
        if self.status == GatewayPaymentStatus::Pending {
            Ok(())
        } else {
            Err(LoanError::PaymentAlreadySettled(
                self.checkout_request_id.clone(),
            ))
        }
    }

    /// Marks the charge as settled successfully with the amount the gateway
    /// actually collected.
    pub fn complete(
        &mut self,
        settled_amount: Money,
        receipt_number: String,
        result_desc: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), LoanError> {
        self.expect_pending()?;
        self.status = GatewayPaymentStatus::Completed;
        self.amount = settled_amount;
        self.receipt_number = Some(receipt_number);
        self.result_code = Some("0".to_string());
        self.result_desc = result_desc;
        self.updated_at = now;
        Ok(())
    }

    /// Marks the charge as failed. No loan state is touched by a failure.
    pub fn fail(
        &mut self,
        result_code: String,
        result_desc: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), LoanError> {
        self.expect_pending()?;
        self.status = GatewayPaymentStatus::Failed;
        self.result_code = Some(result_code);
        self.result_desc = result_desc;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        "2026-03-01T09:00:00Z".parse().unwrap()
    }

    fn pending_payment() -> GatewayPayment {
        GatewayPayment::new(
            1,
            "254700000001".to_string(),
            Money::new(dec!(9000)),
            PaymentKind::Interest,
            Some("29115-34620561-1".to_string()),
            "ws_CO_191220191020363925".to_string(),
            now(),
        )
    }

    #[test]
    fn test_complete_records_settled_amount() {
        let mut payment = pending_payment();
        payment
            .complete(Money::new(dec!(9000)), "NLJ7RT61SV".to_string(), None, now())
            .unwrap();
        assert_eq!(payment.status, GatewayPaymentStatus::Completed);
        assert_eq!(payment.receipt_number.as_deref(), Some("NLJ7RT61SV"));
        assert_eq!(payment.result_code.as_deref(), Some("0"));
    }

    #[test]
    fn test_settlement_is_at_most_once() {
        let mut payment = pending_payment();
        payment
            .complete(Money::new(dec!(9000)), "NLJ7RT61SV".to_string(), None, now())
            .unwrap();

        let err = payment
            .fail("1032".to_string(), Some("cancelled".to_string()), now())
            .unwrap_err();
        assert!(matches!(err, LoanError::PaymentAlreadySettled(_)));
        assert_eq!(payment.status, GatewayPaymentStatus::Completed);
    }

    #[test]
    fn test_failure_keeps_result_details() {
        let mut payment = pending_payment();
        payment
            .fail(
                "1032".to_string(),
                Some("Request cancelled by user".to_string()),
                now(),
            )
            .unwrap();
        assert_eq!(payment.status, GatewayPaymentStatus::Failed);
        assert_eq!(payment.result_code.as_deref(), Some("1032"));
        assert!(payment.complete(Money::new(dec!(1)), "X".to_string(), None, now()).is_err());
    }
}
