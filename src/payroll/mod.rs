//! Payroll computation engine: statutory insurance, personal income tax and
//! net pay derived from a compensation snapshot and a wage region.
//!
//! Everything in here is pure. Persistence and rendering live in `crate::api`.

pub mod calculator;
pub mod currency;
pub mod input;
pub mod policy;
pub mod region;
pub mod submission;
pub mod validation;

use derive_more::Display;

pub use calculator::{PayrollInput, PayrollResult, compute};
pub use input::PayPeriod;
pub use policy::PayrollPolicy;
pub use region::Region;
pub use validation::{PayrollSubmission, ValidationError, validate};

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum PayrollError {
    #[display(fmt = "unknown region code '{}'", _0)]
    UnknownRegion(String),

    #[display(fmt = "invalid payroll policy: {}", _0)]
    InvalidPolicy(String),

    #[display(fmt = "amounts are too large to compute")]
    AmountOutOfRange,

    #[display(fmt = "{}", _0)]
    Rejected(ValidationError),
}

impl std::error::Error for PayrollError {}

impl From<ValidationError> for PayrollError {
    fn from(err: ValidationError) -> Self {
        PayrollError::Rejected(err)
    }
}
