use crate::domain::money::{Amount, Money};
use crate::error::LoanError;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of one billing period.
pub const PERIOD_DAYS: i64 = 7;

/// Flat interest rate charged per period on the principal outstanding at the
/// start of that period.
pub const PERIOD_RATE: Decimal = dec!(0.30);

/// A loan whose outstanding amounts are within this distance of zero is
/// considered settled.
pub const SETTLEMENT_TOLERANCE: Decimal = dec!(0.01);

fn period() -> Duration {
    Duration::days(PERIOD_DAYS)
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Pending,
    Active,
    Completed,
    Rejected,
    Claimed,
    Defaulted,
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoanStatus::Pending => "pending",
            LoanStatus::Active => "active",
            LoanStatus::Completed => "completed",
            LoanStatus::Rejected => "rejected",
            LoanStatus::Claimed => "claimed",
            LoanStatus::Defaulted => "defaulted",
        };
        f.write_str(s)
    }
}

/// A livestock-collateralized loan.
///
/// Interest compounds per fixed-length billing period: whatever interest is
/// left unpaid when a period closes is folded into the principal, so the next
/// period charges interest on it too. `balance` is always derived from the
/// other fields, never assigned by callers.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Loan {
    pub id: u64,
    pub client_id: u64,
    /// Livestock pledged against this loan, if any.
    pub collateral_id: Option<u64>,
    /// Amount disbursed at origination. Never mutated afterwards.
    pub principal_amount: Money,
    /// Per-period rate, fixed at approval.
    pub interest_rate: Decimal,
    /// Advisory running total: principal + lifetime interest paid + interest
    /// due this period. Display only, never drives balance logic.
    pub total_amount: Money,
    /// Lifetime principal repaid.
    pub principal_paid: Money,
    /// Lifetime interest paid.
    pub interest_paid: Money,
    /// Principal outstanding right now. Decreases through principal payments,
    /// increases when unpaid interest compounds in.
    pub current_principal: Money,
    /// Interest paid against the current open period.
    pub current_period_interest_paid: Money,
    /// Derived: current_principal + unpaid interest for the open period.
    pub balance: Money,
    pub disbursement_date: Option<DateTime<Utc>>,
    /// End of the current open billing period.
    pub due_date: Option<DateTime<Utc>>,
    pub last_interest_payment_date: Option<DateTime<Utc>>,
    pub status: LoanStatus,
}

impl Loan {
    /// Creates a pending loan application.
    pub fn new(id: u64, client_id: u64, collateral_id: Option<u64>, principal: Amount) -> Self {
        let principal = Money::from(principal).rounded();
        let interest = Money::new(principal.value() * PERIOD_RATE).rounded();
        Self {
            id,
            client_id,
            collateral_id,
            principal_amount: principal,
            interest_rate: PERIOD_RATE,
            total_amount: principal + interest,
            principal_paid: Money::ZERO,
            interest_paid: Money::ZERO,
            current_principal: principal,
            current_period_interest_paid: Money::ZERO,
            balance: principal + interest,
            disbursement_date: None,
            due_date: None,
            last_interest_payment_date: None,
            status: LoanStatus::Pending,
        }
    }

    /// Interest due for the current period: rate applied to the principal
    /// outstanding at the period's start.
    pub fn period_interest_due(&self) -> Money {
        Money::new(self.current_principal.value() * self.interest_rate).rounded()
    }

    /// Unpaid interest remaining in the current period.
    pub fn unpaid_period_interest(&self) -> Money {
        let unpaid = self.period_interest_due() - self.current_period_interest_paid;
        unpaid.max(Money::ZERO)
    }

    fn expect_status(&self, expected: LoanStatus) -> Result<(), LoanError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(LoanError::InvalidLoanState {
                expected,
                actual: self.status,
            })
        }
    }

    /// Approves a pending application: fixes the rate, initializes the
    /// repayment anchors and opens the first billing period.
    pub fn approve(&mut self, now: DateTime<Utc>) -> Result<(), LoanError> {
        self.expect_status(LoanStatus::Pending)?;

        self.status = LoanStatus::Active;
        self.interest_rate = PERIOD_RATE;
        self.current_principal = self.principal_amount;
        self.principal_paid = Money::ZERO;
        self.interest_paid = Money::ZERO;
        self.current_period_interest_paid = Money::ZERO;
        self.disbursement_date = Some(now);
        self.due_date = Some(now + period());
        self.last_interest_payment_date = None;

        let interest = Money::new(self.principal_amount.value() * self.interest_rate).rounded();
        self.total_amount = (self.principal_amount + interest).rounded();
        self.balance = self.total_amount;
        Ok(())
    }

    /// Rejects a pending application. Rejected loans are never disbursed.
    pub fn reject(&mut self) -> Result<(), LoanError> {
        self.expect_status(LoanStatus::Pending)?;
        self.status = LoanStatus::Rejected;
        Ok(())
    }

    /// Brings the compounding state up to `now`.
    ///
    /// Closes every billing period that has elapsed since the last
    /// recalculation, one period at a time: interest left unpaid at a period
    /// boundary is folded into the principal before the next period's
    /// interest is computed. A period closes at its due instant, so a loan
    /// untouched for exactly two periods compounds twice.
    ///
    /// Idempotent: recalculating twice at the same instant changes nothing.
    pub fn recalculate(&mut self, now: DateTime<Utc>) {
        if self.status == LoanStatus::Active {
            let anchor = match self.disbursement_date {
                Some(d) => d,
                None => {
                    self.disbursement_date = Some(now);
                    now
                }
            };
            let mut due = self.due_date.unwrap_or(anchor + period());

            while now >= due {
                let period_due = self.period_interest_due();
                let unpaid = period_due - self.current_period_interest_paid;
                if unpaid > Money::ZERO {
                    self.current_principal = (self.current_principal + unpaid).rounded();
                }
                self.current_period_interest_paid = Money::ZERO;
                due = due + period();
            }
            self.due_date = Some(due);
        }

        let period_due = self.period_interest_due();
        let remaining = self.unpaid_period_interest();
        self.balance = (self.current_principal + remaining).rounded();
        self.total_amount = (self.principal_amount + self.interest_paid + period_due).rounded();
    }

    /// Applies an interest payment against the current period.
    ///
    /// The payment may not exceed the period's unpaid interest. Once the
    /// period is fully covered the due date advances by one period length;
    /// the paid interest stays on the counter and covers the advanced period,
    /// so nothing further is owed until it closes.
    pub fn apply_interest(&mut self, amount: Amount, now: DateTime<Utc>) -> Result<(), LoanError> {
        let amount = Money::from(amount);
        let period_due = self.period_interest_due();
        let unpaid = self.unpaid_period_interest();
        if amount > unpaid {
            return Err(LoanError::AmountExceedsDue {
                amount: amount.value(),
                unpaid: unpaid.value(),
            });
        }

        self.current_period_interest_paid =
            (self.current_period_interest_paid + amount).rounded();
        self.interest_paid = (self.interest_paid + amount).rounded();
        self.last_interest_payment_date = Some(now);

        if self.current_period_interest_paid >= period_due
            && let Some(due) = self.due_date
        {
            self.due_date = Some(due + period());
        }
        Ok(())
    }

    /// Applies a principal payment. The payment may not exceed the principal
    /// outstanding.
    pub fn apply_principal(&mut self, amount: Amount) -> Result<(), LoanError> {
        let amount = Money::from(amount);
        if amount > self.current_principal {
            return Err(LoanError::AmountExceedsPrincipal {
                amount: amount.value(),
                outstanding: self.current_principal.value(),
            });
        }
        self.principal_paid = (self.principal_paid + amount).rounded();
        self.current_principal = (self.current_principal - amount).rounded();
        Ok(())
    }

    /// True when both outstanding principal and balance are within rounding
    /// tolerance of zero.
    pub fn is_settled(&self) -> bool {
        self.current_principal.is_settled(SETTLEMENT_TOLERANCE)
            && self.balance.is_settled(SETTLEMENT_TOLERANCE)
    }

    /// True when an active loan is past the end of its open billing period,
    /// judged against the stored due date without recalculating.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == LoanStatus::Active && self.due_date.is_some_and(|due| now > due)
    }

    /// Closes the loan by seizing its collateral: outstanding amounts are
    /// written off and no further payments are accepted.
    pub fn mark_claimed(&mut self) -> Result<(), LoanError> {
        self.expect_status(LoanStatus::Active)?;
        self.status = LoanStatus::Claimed;
        self.current_principal = Money::ZERO;
        self.current_period_interest_paid = Money::ZERO;
        self.balance = Money::ZERO;
        Ok(())
    }
}
