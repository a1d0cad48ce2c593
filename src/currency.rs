use anyhow::{bail, Result};

/// Formats a dollar amount with thousands separators and two decimals, e.g. `$123,456.70`.
///
/// Negative amounts keep the leading dollar sign: `$-1,234.50`. The sign follows the
/// input, so a small negative amount that rounds to zero prints as `$-0.00`.
pub fn format_currency(value: f64) -> Result<String> {
    if !value.is_finite() {
        bail!("Cannot format {} as a currency amount", value);
    }

    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((&fixed, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value.is_sign_negative() { "-" } else { "" };
    Ok(format!("${}{}.{}", sign, grouped, cents))
}
