use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{PayPeriod, PayrollError, PayrollPolicy, Region};

/// Compensation snapshot for one computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PayrollInput {
    pub base_salary: Decimal,
    pub allowances: Decimal,
    pub other_deductions: Decimal,
    pub region: Region,
    #[serde(default)]
    pub pay_period: PayPeriod,
}

/// Derived payroll figures. Nothing is rounded here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PayrollResult {
    pub insurance_base: Decimal,
    pub social_insurance: Decimal,
    pub health_insurance: Decimal,
    pub unemployment_insurance: Decimal,
    pub total_insurance: Decimal,
    pub taxable_income: Decimal,
    pub personal_income_tax: Decimal,
    pub total_deductions: Decimal,
    pub net_salary: Decimal,
}

fn checked(amount: Option<Decimal>) -> Result<Decimal, PayrollError> {
    amount.ok_or(PayrollError::AmountOutOfRange)
}

/// Computes statutory deductions and net pay.
///
/// Returns `Ok(None)` while the base salary is missing or non-positive; a salary
/// below the regional floor still computes so callers can preview it, the
/// rejection happens in [`super::validate`]. Amounts whose sums leave the
/// `Decimal` range fail with [`PayrollError::AmountOutOfRange`].
pub fn compute(
    input: &PayrollInput,
    policy: &PayrollPolicy,
) -> Result<Option<PayrollResult>, PayrollError> {
    if input.base_salary <= Decimal::ZERO {
        return Ok(None);
    }

    let rates = &policy.rates;

    let insurance_base = input.base_salary.min(policy.insurance_cap(input.region));
    let social_insurance = checked(insurance_base.checked_mul(rates.social_insurance))?;
    let health_insurance = checked(insurance_base.checked_mul(rates.health_insurance))?;
    let unemployment_insurance =
        checked(insurance_base.checked_mul(rates.unemployment_insurance))?;
    let total_insurance = checked(
        social_insurance
            .checked_add(health_insurance)
            .and_then(|sum| sum.checked_add(unemployment_insurance)),
    )?;

    let gross = checked(input.base_salary.checked_add(input.allowances))?;
    let taxable_income = checked(
        gross
            .checked_sub(total_insurance)
            .and_then(|rest| rest.checked_sub(rates.personal_deduction)),
    )?
    .max(Decimal::ZERO);
    let personal_income_tax = checked(taxable_income.checked_mul(rates.personal_income_tax))?;

    let total_deductions = checked(
        total_insurance
            .checked_add(personal_income_tax)
            .and_then(|sum| sum.checked_add(input.other_deductions)),
    )?;
    let net_salary = checked(gross.checked_sub(total_deductions))?;

    Ok(Some(PayrollResult {
        insurance_base,
        social_insurance,
        health_insurance,
        unemployment_insurance,
        total_insurance,
        taxable_income,
        personal_income_tax,
        total_deductions,
        net_salary,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn input(base_salary: Decimal, allowances: Decimal, region: Region) -> PayrollInput {
        PayrollInput {
            base_salary,
            allowances,
            other_deductions: Decimal::ZERO,
            region,
            pay_period: PayPeriod::Monthly,
        }
    }

    #[test]
    fn salary_at_region_i_floor() {
        let policy = PayrollPolicy::statutory();
        let result = compute(&input(dec!(4680000), Decimal::ZERO, Region::I), &policy)
            .unwrap()
            .unwrap();

        assert_eq!(result.insurance_base, dec!(4680000));
        assert_eq!(result.social_insurance, dec!(374400));
        assert_eq!(result.health_insurance, dec!(70200));
        assert_eq!(result.unemployment_insurance, dec!(46800));
        assert_eq!(result.total_insurance, dec!(491400));
        assert_eq!(result.taxable_income, Decimal::ZERO);
        assert_eq!(result.personal_income_tax, Decimal::ZERO);
        assert_eq!(result.total_deductions, dec!(491400));
        assert_eq!(result.net_salary, dec!(4188600));
    }

    #[test]
    fn taxable_salary_with_allowances() {
        let policy = PayrollPolicy::statutory();
        let result = compute(&input(dec!(20000000), dec!(20000000), Region::I), &policy)
            .unwrap()
            .unwrap();

        assert_eq!(result.insurance_base, dec!(20000000));
        assert_eq!(result.total_insurance, dec!(2100000));
        assert_eq!(result.taxable_income, dec!(26900000));
        assert_eq!(result.personal_income_tax, dec!(2690000));
        assert_eq!(result.total_deductions, dec!(4790000));
        assert_eq!(result.net_salary, dec!(35210000));
    }

    #[test]
    fn insurance_base_is_capped() {
        let policy = PayrollPolicy::statutory();
        let result = compute(&input(dec!(150000000), Decimal::ZERO, Region::I), &policy)
            .unwrap()
            .unwrap();

        assert_eq!(result.insurance_base, dec!(93600000));
        assert_eq!(result.social_insurance, dec!(7488000));
    }

    #[test]
    fn other_deductions_reduce_net_only() {
        let policy = PayrollPolicy::statutory();
        let mut with_other = input(dec!(20000000), Decimal::ZERO, Region::II);
        with_other.other_deductions = dec!(500000);

        let base = compute(&input(dec!(20000000), Decimal::ZERO, Region::II), &policy)
            .unwrap()
            .unwrap();
        let result = compute(&with_other, &policy).unwrap().unwrap();

        assert_eq!(result.personal_income_tax, base.personal_income_tax);
        assert_eq!(result.total_deductions, base.total_deductions + dec!(500000));
        assert_eq!(result.net_salary, base.net_salary - dec!(500000));
    }

    #[test]
    fn below_floor_still_computes() {
        let policy = PayrollPolicy::statutory();
        let result = compute(&input(dec!(4000000), Decimal::ZERO, Region::I), &policy);
        assert!(matches!(result, Ok(Some(_))));
    }

    #[test]
    fn non_positive_salary_is_skipped() {
        let policy = PayrollPolicy::statutory();
        assert_eq!(compute(&input(Decimal::ZERO, dec!(1000000), Region::I), &policy), Ok(None));
        assert_eq!(compute(&input(dec!(-1), Decimal::ZERO, Region::I), &policy), Ok(None));
    }

    #[test]
    fn oversized_amounts_are_an_error() {
        let policy = PayrollPolicy::statutory();
        let huge = crate::payroll::input::parse_amount("7e28");

        assert_eq!(
            compute(&input(huge, huge, Region::I), &policy),
            Err(PayrollError::AmountOutOfRange)
        );
        assert_eq!(
            compute(&input(Decimal::MAX, Decimal::MAX, Region::IV), &policy),
            Err(PayrollError::AmountOutOfRange)
        );

        let mut heavy = input(dec!(5000000), Decimal::ZERO, Region::I);
        heavy.other_deductions = Decimal::MAX;
        assert_eq!(compute(&heavy, &policy), Err(PayrollError::AmountOutOfRange));
    }

    #[test]
    fn largest_base_salary_still_computes() {
        let policy = PayrollPolicy::statutory();
        let result = compute(&input(Decimal::MAX, Decimal::ZERO, Region::I), &policy)
            .unwrap()
            .unwrap();

        assert_eq!(result.insurance_base, dec!(93600000));
        assert_eq!(result.net_salary, Decimal::MAX - result.total_deductions);
    }

    #[test]
    fn pay_period_does_not_scale() {
        let policy = PayrollPolicy::statutory();
        let monthly = input(dec!(12000000), dec!(1000000), Region::III);
        let mut weekly = monthly.clone();
        weekly.pay_period = PayPeriod::Weekly;

        assert_eq!(compute(&monthly, &policy), compute(&weekly, &policy));
    }

    fn region_strategy() -> impl Strategy<Value = Region> {
        prop_oneof![
            Just(Region::I),
            Just(Region::II),
            Just(Region::III),
            Just(Region::IV),
        ]
    }

    fn input_strategy() -> impl Strategy<Value = PayrollInput> {
        (
            1u64..500_000_000,
            0u64..100_000_000,
            0u64..10_000_000,
            region_strategy(),
        )
            .prop_map(|(base, allowances, other, region)| PayrollInput {
                base_salary: Decimal::from(base),
                allowances: Decimal::from(allowances),
                other_deductions: Decimal::from(other),
                region,
                pay_period: PayPeriod::Monthly,
            })
    }

    proptest! {
        #[test]
        fn deterministic(input in input_strategy()) {
            let policy = PayrollPolicy::statutory();
            prop_assert_eq!(compute(&input, &policy), compute(&input, &policy));
        }

        #[test]
        fn insurance_base_never_exceeds_cap(input in input_strategy()) {
            let policy = PayrollPolicy::statutory();
            let cap = policy.insurance_cap(input.region);
            let result = compute(&input, &policy).unwrap().unwrap();

            prop_assert!(result.insurance_base <= cap);
            if input.base_salary > cap {
                prop_assert_eq!(result.insurance_base, cap);
            } else {
                prop_assert_eq!(result.insurance_base, input.base_salary);
            }
        }

        #[test]
        fn taxable_income_non_negative(input in input_strategy()) {
            let policy = PayrollPolicy::statutory();
            let result = compute(&input, &policy).unwrap().unwrap();
            prop_assert!(result.taxable_income >= Decimal::ZERO);
            prop_assert!(result.personal_income_tax >= Decimal::ZERO);
        }

        #[test]
        fn net_conserves_gross(input in input_strategy()) {
            let policy = PayrollPolicy::statutory();
            let result = compute(&input, &policy).unwrap().unwrap();
            prop_assert_eq!(
                result.net_salary,
                input.base_salary + input.allowances - result.total_deductions
            );
            prop_assert_eq!(
                result.total_deductions,
                result.social_insurance
                    + result.health_insurance
                    + result.unemployment_insurance
                    + result.personal_income_tax
                    + input.other_deductions
            );
        }
    }
}
