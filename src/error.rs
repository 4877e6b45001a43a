use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::loan::LoanStatus;

pub type Result<T> = std::result::Result<T, LoanError>;

#[derive(Error, Debug)]
pub enum LoanError {
    #[error("loan is {actual}, operation requires {expected}")]
    InvalidLoanState {
        expected: LoanStatus,
        actual: LoanStatus,
    },
    #[error(
        "interest payment of {amount} exceeds unpaid interest of {unpaid} for the current period"
    )]
    AmountExceedsDue { amount: Decimal, unpaid: Decimal },
    #[error("principal payment of {amount} exceeds outstanding principal of {outstanding}")]
    AmountExceedsPrincipal {
        amount: Decimal,
        outstanding: Decimal,
    },
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("loan {0} not found")]
    LoanNotFound(u64),
    #[error("loan {0} already exists")]
    LoanAlreadyExists(u64),
    #[error("loan {0} is not past its due date")]
    LoanNotOverdue(u64),
    #[error("gateway payment {0} not found")]
    PaymentNotFound(String),
    #[error("gateway payment {0} has already been settled")]
    PaymentAlreadySettled(String),
    #[error("invalid event: {0}")]
    InvalidEvent(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}
