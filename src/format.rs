//! Display formatting for money and land area (en-GB conventions).

pub const CURRENCY_SYMBOL: &str = "£";
pub const AREA_UNIT: &str = "m²";

/// Format a money amount as pounds with two decimals.
///
/// The sign is dropped: callers that care about direction convey it
/// through a label instead.
pub fn format_currency(value: Option<f64>) -> String {
    match value {
        None => format!("{CURRENCY_SYMBOL}0.00"),
        Some(v) => format!("{CURRENCY_SYMBOL}{}", group_thousands(finite_or_zero(v).abs())),
    }
}

/// Format an area in square metres with two decimals.
pub fn format_area(value: Option<f64>) -> String {
    match value {
        None => format!("0 {AREA_UNIT}"),
        Some(v) => {
            let v = finite_or_zero(v);
            let sign = if v < 0.0 { "-" } else { "" };
            format!("{sign}{} {AREA_UNIT}", group_thousands(v.abs()))
        }
    }
}

#[inline]
fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

/// Two fixed decimals with comma separated thousands. Expects `v >= 0`.
fn group_thousands(v: f64) -> String {
    let fixed = format!("{v:.2}");
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let digits = int_part.as_bytes();
    let mut out = String::with_capacity(fixed.len() + digits.len() / 3);
    for (i, &d) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(d as char);
    }
    out.push('.');
    out.push_str(frac_part);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_absent() {
        assert_eq!(format_currency(None), "£0.00");
    }

    #[test]
    fn test_currency_drops_sign() {
        assert_eq!(format_currency(Some(-5.0)), format_currency(Some(5.0)));
        assert_eq!(format_currency(Some(-5.0)), "£5.00");
    }

    #[test]
    fn test_currency_grouping() {
        assert_eq!(format_currency(Some(0.0)), "£0.00");
        assert_eq!(format_currency(Some(999.999)), "£1,000.00");
        assert_eq!(format_currency(Some(1234.5)), "£1,234.50");
        assert_eq!(format_currency(Some(1_234_567.891)), "£1,234,567.89");
    }

    #[test]
    fn test_currency_non_finite() {
        assert_eq!(format_currency(Some(f64::NAN)), "£0.00");
    }

    #[test]
    fn test_area() {
        assert_eq!(format_area(Some(0.0)), "0.00 m²");
        assert_eq!(format_area(None), "0 m²");
        assert_eq!(format_area(Some(12_345.678)), "12,345.68 m²");
    }
}
