use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use super::{
    PayPeriod, PayrollError, PayrollInput, PayrollPolicy, PayrollResult, PayrollSubmission,
    Region, ValidationError, compute, currency::to_units, validate,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, EnumString, AsRefStr, Display)]
pub enum PayrollStatus {
    Pending,
    Completed,
    Cancelled,
}

/// Row-shaped payload handed to storage. Amounts are whole dong.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PayrollPayload {
    #[schema(example = 1001)]
    pub employee_id: u64,
    pub region: Region,
    pub pay_period: PayPeriod,
    #[schema(example = 20000000)]
    pub base_salary: i64,
    pub allowances: i64,
    pub other_deductions: i64,
    pub social_insurance: i64,
    pub health_insurance: i64,
    pub unemployment_insurance: i64,
    pub personal_income_tax: i64,
    pub total_deductions: i64,
    #[schema(example = 35210000)]
    pub net_salary: i64,
    #[schema(example = "Completed")]
    pub status: String,
}

impl PayrollPayload {
    fn from_parts(employee_id: u64, input: &PayrollInput, result: &PayrollResult, status: String) -> Self {
        Self {
            employee_id,
            region: input.region,
            pay_period: input.pay_period,
            base_salary: to_units(input.base_salary),
            allowances: to_units(input.allowances),
            other_deductions: to_units(input.other_deductions),
            social_insurance: to_units(result.social_insurance),
            health_insurance: to_units(result.health_insurance),
            unemployment_insurance: to_units(result.unemployment_insurance),
            personal_income_tax: to_units(result.personal_income_tax),
            total_deductions: to_units(result.total_deductions),
            net_salary: to_units(result.net_salary),
            status,
        }
    }
}

/// Validates, computes and rounds a submission for storage.
///
/// New records get `Completed`; edits pass the stored status through untouched.
pub fn prepare(
    submission: &PayrollSubmission,
    prior_status: Option<&str>,
    policy: &PayrollPolicy,
) -> Result<PayrollPayload, PayrollError> {
    validate(submission, policy)?;

    let employee_id = submission
        .employee_id
        .ok_or(ValidationError::MissingEmployee)?;
    let result =
        compute(&submission.input, policy)?.ok_or(ValidationError::NonPositiveSalary)?;

    let status = prior_status
        .map(str::to_string)
        .unwrap_or_else(|| PayrollStatus::Completed.to_string());

    Ok(PayrollPayload::from_parts(
        employee_id,
        &submission.input,
        &result,
        status,
    ))
}
