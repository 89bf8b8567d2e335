use derive_more::Display;
use rust_decimal::Decimal;

use super::{PayrollInput, PayrollPolicy, Region, currency::format_vnd};

/// What the submit action hands over: who is being paid and on what terms.
#[derive(Debug, Clone, PartialEq)]
pub struct PayrollSubmission {
    pub employee_id: Option<u64>,
    pub input: PayrollInput,
}

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ValidationError {
    #[display(fmt = "Please select an employee")]
    MissingEmployee,

    #[display(fmt = "Base salary must be a positive number")]
    NonPositiveSalary,

    #[display(
        fmt = "Base salary must be at least the {} minimum wage of {}",
        "region.label()",
        "format_vnd(*floor)"
    )]
    BelowMinimumWage { region: Region, floor: Decimal },
}

impl std::error::Error for ValidationError {}

/// Precondition check run once per submit. First failing rule wins.
pub fn validate(
    submission: &PayrollSubmission,
    policy: &PayrollPolicy,
) -> Result<(), ValidationError> {
    if submission.employee_id.is_none() {
        return Err(ValidationError::MissingEmployee);
    }

    let input = &submission.input;
    if input.base_salary <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveSalary);
    }

    let floor = policy.floor_for(input.region);
    if input.base_salary < floor {
        return Err(ValidationError::BelowMinimumWage {
            region: input.region,
            floor,
        });
    }

    Ok(())
}
