use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::payroll::{
    PayPeriod, PayrollError, PayrollInput, PayrollPolicy, PayrollResult, Region, compute,
};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct PayrollRecord {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1001)]
    pub employee_id: u64,
    #[schema(example = "2026-01-01", value_type = String, format = "date")]
    pub month: NaiveDate,
    #[schema(example = "I")]
    pub region: String,
    #[schema(example = "Monthly")]
    pub pay_period: String,
    pub base_salary: Decimal,
    pub allowances: Decimal,
    pub other_deductions: Decimal,
    pub social_insurance: Decimal,
    pub health_insurance: Decimal,
    pub unemployment_insurance: Decimal,
    pub personal_income_tax: Decimal,
    pub total_deductions: Decimal,
    pub net_salary: Decimal,
    #[schema(example = "Completed")]
    pub status: String,
}

impl PayrollRecord {
    /// Rebuilds the engine input from stored columns.
    pub fn input(&self) -> Result<PayrollInput, PayrollError> {
        Ok(PayrollInput {
            base_salary: self.base_salary,
            allowances: self.allowances,
            other_deductions: self.other_deductions,
            region: Region::from_code(&self.region)?,
            pay_period: self.pay_period(),
        })
    }

    /// Derived figures as stored, with insurance base and taxable income
    /// recomputed under `policy` since they are not persisted.
    pub fn result(&self, policy: &PayrollPolicy) -> Result<PayrollResult, PayrollError> {
        let input = self.input()?;
        let derived = compute(&input, policy)?;

        let total_insurance =
            self.social_insurance + self.health_insurance + self.unemployment_insurance;
        Ok(PayrollResult {
            insurance_base: derived
                .as_ref()
                .map(|r| r.insurance_base)
                .unwrap_or(Decimal::ZERO),
            social_insurance: self.social_insurance,
            health_insurance: self.health_insurance,
            unemployment_insurance: self.unemployment_insurance,
            total_insurance,
            taxable_income: derived
                .as_ref()
                .map(|r| r.taxable_income)
                .unwrap_or(Decimal::ZERO),
            personal_income_tax: self.personal_income_tax,
            total_deductions: self.total_deductions,
            net_salary: self.net_salary,
        })
    }

    /// Unrecognised labels fall back to monthly.
    pub fn pay_period(&self) -> PayPeriod {
        self.pay_period.parse().unwrap_or_default()
    }
}
