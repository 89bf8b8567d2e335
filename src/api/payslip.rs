//! Human-readable payslip data for summary tables and PDF export.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::{employee::EmployeeProfile, payroll::PayrollRecord};
use crate::payroll::{PayrollError, PayrollPolicy, currency::format_vnd};

#[derive(Debug, Serialize, ToSchema)]
pub struct PayslipLine {
    #[schema(example = "Social insurance (8%)")]
    pub label: String,
    pub amount: Decimal,
    #[schema(example = "374.400 ₫")]
    pub display: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PayslipEmployee {
    pub id: u64,
    pub code: String,
    #[schema(example = "Lan Nguyen")]
    pub name: String,
    pub email: String,
    #[schema(example = "Accountant", nullable = true)]
    pub position: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Payslip {
    pub payroll_id: u64,
    #[schema(value_type = String, format = "date")]
    pub month: NaiveDate,
    pub status: String,
    pub pay_period: String,
    #[schema(example = "Region I")]
    pub region: String,
    #[schema(example = "VND")]
    pub currency: String,
    pub employee: PayslipEmployee,
    pub earnings: Vec<PayslipLine>,
    pub deductions: Vec<PayslipLine>,
    pub total_deductions: PayslipLine,
    pub net_salary: PayslipLine,
}

fn line(label: impl Into<String>, amount: Decimal) -> PayslipLine {
    PayslipLine {
        label: label.into(),
        display: format_vnd(amount),
        amount,
    }
}

fn percent(rate: Decimal) -> String {
    format!("{}%", (rate * Decimal::ONE_HUNDRED).normalize())
}

pub fn build_payslip(
    record: &PayrollRecord,
    employee: &EmployeeProfile,
    policy: &PayrollPolicy,
) -> Result<Payslip, PayrollError> {
    let input = record.input()?;
    let result = record.result(policy)?;
    let rates = &policy.rates;

    let mut deductions = vec![
        line(
            format!("Social insurance ({})", percent(rates.social_insurance)),
            result.social_insurance,
        ),
        line(
            format!("Health insurance ({})", percent(rates.health_insurance)),
            result.health_insurance,
        ),
        line(
            format!("Unemployment insurance ({})", percent(rates.unemployment_insurance)),
            result.unemployment_insurance,
        ),
        line(
            format!("Personal income tax ({})", percent(rates.personal_income_tax)),
            result.personal_income_tax,
        ),
    ];
    if !record.other_deductions.is_zero() {
        deductions.push(line("Other deductions", record.other_deductions));
    }

    Ok(Payslip {
        payroll_id: record.id,
        month: record.month,
        status: record.status.clone(),
        pay_period: input.pay_period.to_string(),
        region: input.region.label().to_string(),
        currency: "VND".to_string(),
        employee: PayslipEmployee {
            id: employee.id,
            code: employee.employee_code.clone(),
            name: employee.display_name(),
            email: employee.email.clone(),
            position: employee.position.clone(),
        },
        earnings: vec![
            line("Base salary", record.base_salary),
            line("Allowances", record.allowances),
        ],
        deductions,
        total_deductions: line("Total deductions", result.total_deductions),
        net_salary: line("Net salary", result.net_salary),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(other_deductions: Decimal) -> PayrollRecord {
        PayrollRecord {
            id: 77,
            employee_id: 1001,
            month: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            region: "I".into(),
            pay_period: "Monthly".into(),
            base_salary: dec!(20000000),
            allowances: dec!(20000000),
            other_deductions,
            social_insurance: dec!(1600000),
            health_insurance: dec!(300000),
            unemployment_insurance: dec!(200000),
            personal_income_tax: dec!(2690000),
            total_deductions: dec!(4790000) + other_deductions,
            net_salary: dec!(35210000) - other_deductions,
            status: "Completed".into(),
        }
    }

    fn employee() -> EmployeeProfile {
        EmployeeProfile {
            id: 1001,
            employee_code: "EMP-1001".into(),
            first_name: "Lan".into(),
            last_name: "Nguyen".into(),
            email: "lan.nguyen@company.com".into(),
            position: Some("Accountant".into()),
        }
    }

    #[test]
    fn formats_every_amount_in_dong() {
        let slip = build_payslip(&record(Decimal::ZERO), &employee(), &PayrollPolicy::statutory())
            .unwrap();

        assert_eq!(slip.employee.name, "Lan Nguyen");
        assert_eq!(slip.region, "Region I");
        assert_eq!(slip.net_salary.display, "35.210.000 ₫");
        assert_eq!(slip.total_deductions.display, "4.790.000 ₫");
        assert_eq!(slip.deductions.len(), 4);
        assert_eq!(slip.deductions[0].label, "Social insurance (8%)");
        assert_eq!(slip.deductions[1].label, "Health insurance (1.5%)");
        assert_eq!(slip.deductions[3].display, "2.690.000 ₫");
    }

    #[test]
    fn other_deductions_listed_when_present() {
        let slip = build_payslip(&record(dec!(250000)), &employee(), &PayrollPolicy::statutory())
            .unwrap();

        let last = slip.deductions.last().unwrap();
        assert_eq!(last.label, "Other deductions");
        assert_eq!(last.display, "250.000 ₫");
        assert_eq!(slip.net_salary.display, "34.960.000 ₫");
    }
}
