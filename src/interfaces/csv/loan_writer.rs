use crate::domain::loan::Loan;
use crate::error::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct LoanRow {
    loan: u64,
    status: String,
    principal: Decimal,
    current_principal: Decimal,
    principal_paid: Decimal,
    interest_paid: Decimal,
    period_interest_paid: Decimal,
    balance: Decimal,
    due_date: Option<DateTime<Utc>>,
}

impl From<&Loan> for LoanRow {
    fn from(loan: &Loan) -> Self {
        Self {
            loan: loan.id,
            status: loan.status.to_string(),
            principal: loan.principal_amount.value(),
            current_principal: loan.current_principal.value(),
            principal_paid: loan.principal_paid.value(),
            interest_paid: loan.interest_paid.value(),
            period_interest_paid: loan.current_period_interest_paid.value(),
            balance: loan.balance.value(),
            due_date: loan.due_date,
        }
    }
}

/// Writes loan state rows as CSV to any `Write` sink.
pub struct LoanWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> LoanWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_loans(&mut self, loans: Vec<Loan>) -> Result<()> {
        for loan in &loans {
            self.writer.serialize(LoanRow::from(loan))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
