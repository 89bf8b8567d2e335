use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds to the nearest whole dong, halves going up (2.5 -> 3, -2.5 -> -2).
pub fn round_to_unit(amount: Decimal) -> Decimal {
    let strategy = if amount.is_sign_negative() {
        RoundingStrategy::MidpointTowardZero
    } else {
        RoundingStrategy::MidpointAwayFromZero
    };
    amount.round_dp_with_strategy(0, strategy)
}

/// Whole-dong amount as an integer, saturating at the i64 range.
pub fn to_units(amount: Decimal) -> i64 {
    use rust_decimal::prelude::ToPrimitive;

    let rounded = round_to_unit(amount);
    rounded.to_i64().unwrap_or(if rounded.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}

/// Formats like the vi-VN locale does for VND: `4.680.000 ₫`.
pub fn format_vnd(amount: Decimal) -> String {
    let units = round_to_unit(amount);
    let negative = units.is_sign_negative() && !units.is_zero();
    let digits = units.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-{} ₫", grouped)
    } else {
        format!("{} ₫", grouped)
    }
}
