//! Coercion of raw form values into amounts.
//!
//! Form controls hand over strings ("", "5000000", "4.5e6") or JSON numbers.
//! Anything that does not parse counts as zero so that live recomputation
//! never fails on a half-typed value.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Pay frequency. Stored and displayed only; amounts are not prorated by it.
#[derive(
    Debug,
    Copy,
    Clone,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    ToSchema,
    EnumString,
    EnumIter,
    AsRefStr,
    Display,
)]
pub enum PayPeriod {
    #[default]
    Monthly,
    #[serde(rename = "Bi-Weekly")]
    #[strum(serialize = "Bi-Weekly")]
    BiWeekly,
    Weekly,
}

/// Parses a free-text amount, returning zero when it is not a number.
pub fn parse_amount(raw: &str) -> Decimal {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Decimal::ZERO;
    }

    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .unwrap_or(Decimal::ZERO)
}

/// Coerces any JSON value into an amount. Booleans, arrays, objects and null are zero.
pub fn amount_from_value(value: &Value) -> Decimal {
    match value {
        Value::Number(n) => parse_amount(&n.to_string()),
        Value::String(s) => parse_amount(s),
        _ => Decimal::ZERO,
    }
}

/// Amount that must never go below zero (allowances, ad-hoc deductions).
pub fn non_negative(amount: Decimal) -> Decimal {
    amount.max(Decimal::ZERO)
}

/// `deserialize_with` helper for lenient amount fields.
pub fn lenient_amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(amount_from_value).unwrap_or(Decimal::ZERO))
}

/// `deserialize_with` helper for an identifier picked from a select box,
/// where "" means nothing was picked.
pub fn lenient_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64().filter(|id| *id > 0),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok().filter(|id| *id > 0),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn unparsable_text_is_zero() {
        assert_eq!(parse_amount(""), Decimal::ZERO);
        assert_eq!(parse_amount("   "), Decimal::ZERO);
        assert_eq!(parse_amount("abc"), Decimal::ZERO);
        assert_eq!(parse_amount("12abc"), Decimal::ZERO);
    }

    #[test]
    fn parses_plain_and_scientific_numbers() {
        assert_eq!(parse_amount(" 4680000 "), dec!(4680000));
        assert_eq!(parse_amount("1500.5"), dec!(1500.5));
        assert_eq!(parse_amount("4.68e6"), dec!(4680000));
    }

    #[test]
    fn json_values_coerce() {
        assert_eq!(amount_from_value(&json!(20000000)), dec!(20000000));
        assert_eq!(amount_from_value(&json!("250000")), dec!(250000));
        assert_eq!(amount_from_value(&json!(null)), Decimal::ZERO);
        assert_eq!(amount_from_value(&json!(true)), Decimal::ZERO);
    }

    #[test]
    fn negative_amounts_clamp() {
        assert_eq!(non_negative(dec!(-5)), Decimal::ZERO);
        assert_eq!(non_negative(dec!(5)), dec!(5));
    }

    #[derive(Deserialize)]
    struct Form {
        #[serde(default, deserialize_with = "lenient_amount")]
        base_salary: Decimal,
        #[serde(default, deserialize_with = "lenient_id")]
        employee_id: Option<u64>,
    }

    #[test]
    fn form_fields_deserialize_leniently() {
        let form: Form = serde_json::from_value(json!({
            "base_salary": "oops",
            "employee_id": ""
        }))
        .unwrap();
        assert_eq!(form.base_salary, Decimal::ZERO);
        assert_eq!(form.employee_id, None);

        let form: Form = serde_json::from_value(json!({
            "base_salary": 4680000,
            "employee_id": "42"
        }))
        .unwrap();
        assert_eq!(form.base_salary, dec!(4680000));
        assert_eq!(form.employee_id, Some(42));

        let form: Form = serde_json::from_value(json!({})).unwrap();
        assert_eq!(form.base_salary, Decimal::ZERO);
        assert_eq!(form.employee_id, None);
    }

    #[test]
    fn pay_period_labels() {
        assert_eq!(PayPeriod::BiWeekly.to_string(), "Bi-Weekly");
        assert_eq!(PayPeriod::from_str("Weekly").unwrap(), PayPeriod::Weekly);
        assert_eq!(PayPeriod::default(), PayPeriod::Monthly);

        let parsed: PayPeriod = serde_json::from_value(json!("Bi-Weekly")).unwrap();
        assert_eq!(parsed, PayPeriod::BiWeekly);
    }
}
