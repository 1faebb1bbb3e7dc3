//! Current tax versus land value tax comparison.

use crate::data::ParcelProperties;
use crate::error::ValidationError;
use crate::format::format_currency;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaxKind {
    CouncilTax,
    Lbtt,
}

impl TaxKind {
    pub fn label(self) -> &'static str {
        match self {
            TaxKind::CouncilTax => "Council Tax",
            TaxKind::Lbtt => "LBTT",
        }
    }
}

/// What the user entered in the comparison form
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaxInputs {
    pub include_council_tax: bool,
    pub include_lbtt: bool,
    pub actual_council_tax: Option<f64>,
    pub actual_lbtt: Option<f64>,
}

/// Parse a typed amount from its leading number, ignoring anything after it
/// ("1.2.3" reads as 1.2). Text with no leading number counts as nothing
/// entered.
pub fn parse_amount(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let b = s.as_bytes();
    let digit_at = |i: usize| b.get(i).is_some_and(u8::is_ascii_digit);

    let mut end = usize::from(matches!(b.first(), Some(b'+' | b'-')));
    let mut digits = 0;
    while digit_at(end) {
        end += 1;
        digits += 1;
    }
    if b.get(end) == Some(&b'.') {
        end += 1;
        while digit_at(end) {
            end += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return None;
    }

    // Exponent only counts when at least one digit follows it
    if matches!(b.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(b.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        if digit_at(exp) {
            while digit_at(exp) {
                exp += 1;
            }
            end = exp;
        }
    }

    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Which way the difference points, from the taxpayer's side
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Paying more now than under LVT
    Save,
    PayMore,
    Even,
}

impl Outcome {
    pub fn label(self) -> &'static str {
        match self {
            Outcome::Save => "You would SAVE:",
            Outcome::PayMore => "You would PAY MORE:",
            Outcome::Even => "Difference:",
        }
    }

    /// Style class carried by the difference figure, none when even
    pub fn class(self) -> Option<&'static str> {
        match self {
            Outcome::Save => Some("positive"),
            Outcome::PayMore => Some("negative"),
            Outcome::Even => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BreakdownRow {
    pub tax: TaxKind,
    pub actual: f64,
    pub lvt: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Comparison {
    pub total_current: f64,
    pub total_lvt: f64,
    /// `total_current - total_lvt`; positive means LVT is cheaper
    pub difference: f64,
    /// One row per included tax, council tax first
    pub breakdown: Vec<BreakdownRow>,
}

impl Comparison {
    pub fn outcome(&self) -> Outcome {
        if self.difference > 0.0 {
            Outcome::Save
        } else if self.difference < 0.0 {
            Outcome::PayMore
        } else {
            Outcome::Even
        }
    }

    /// Difference as shown: always unsigned, direction lives in the label
    pub fn magnitude(&self) -> String {
        format_currency(Some(self.difference.abs()))
    }
}

/// Compare what the user pays against the parcel's LVT equivalents.
///
/// Returns `Ok(None)` when nothing is selected. Excluded taxes and missing
/// amounts contribute zero on both sides.
pub fn calculate(
    selection: Option<&ParcelProperties>,
    inputs: &TaxInputs,
) -> Result<Option<Comparison>, ValidationError> {
    let Some(parcel) = selection else {
        return Ok(None);
    };
    if !inputs.include_council_tax && !inputs.include_lbtt {
        return Err(ValidationError::NoTaxSelected);
    }

    let term = |included: bool, amount: Option<f64>| {
        if included {
            amount.filter(|v| v.is_finite()).unwrap_or(0.0)
        } else {
            0.0
        }
    };

    let actual_council_tax = term(inputs.include_council_tax, inputs.actual_council_tax);
    let actual_lbtt = term(inputs.include_lbtt, inputs.actual_lbtt);
    let lvt_council_tax = term(inputs.include_council_tax, parcel.council_tax_amount);
    let lvt_lbtt = term(inputs.include_lbtt, parcel.lbtt_amount);

    let total_current = actual_council_tax + actual_lbtt;
    let total_lvt = lvt_council_tax + lvt_lbtt;

    let mut breakdown = Vec::with_capacity(2);
    if inputs.include_council_tax {
        breakdown.push(BreakdownRow {
            tax: TaxKind::CouncilTax,
            actual: actual_council_tax,
            lvt: lvt_council_tax,
        });
    }
    if inputs.include_lbtt {
        breakdown.push(BreakdownRow {
            tax: TaxKind::Lbtt,
            actual: actual_lbtt,
            lvt: lvt_lbtt,
        });
    }

    Ok(Some(Comparison {
        total_current,
        total_lvt,
        difference: total_current - total_lvt,
        breakdown,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parcel() -> ParcelProperties {
        ParcelProperties {
            label: "SCT0000001".into(),
            council_tax_amount: Some(1000.0),
            lbtt_amount: Some(500.0),
            ..Default::default()
        }
    }

    fn inputs(ct: bool, lbtt: bool, actual_ct: Option<f64>, actual_lbtt: Option<f64>) -> TaxInputs {
        TaxInputs {
            include_council_tax: ct,
            include_lbtt: lbtt,
            actual_council_tax: actual_ct,
            actual_lbtt,
        }
    }

    #[test]
    fn test_council_tax_only_saves() {
        let p = parcel();
        let c = calculate(Some(&p), &inputs(true, false, Some(1200.0), Some(999.0)))
            .unwrap()
            .unwrap();
        assert_eq!(c.total_current, 1200.0);
        assert_eq!(c.total_lvt, 1000.0);
        assert_eq!(c.difference, 200.0);
        assert_eq!(c.outcome().label(), "You would SAVE:");
        assert_eq!(c.outcome().class(), Some("positive"));
        assert_eq!(c.magnitude(), "£200.00");
        assert_eq!(
            c.breakdown,
            vec![BreakdownRow { tax: TaxKind::CouncilTax, actual: 1200.0, lvt: 1000.0 }]
        );
    }

    #[test]
    fn test_both_taxes_pay_more() {
        let p = parcel();
        let c = calculate(Some(&p), &inputs(true, true, Some(800.0), Some(400.0)))
            .unwrap()
            .unwrap();
        assert_eq!(c.total_current, 1200.0);
        assert_eq!(c.total_lvt, 1500.0);
        assert_eq!(c.difference, -300.0);
        assert_eq!(c.outcome().label(), "You would PAY MORE:");
        assert_eq!(c.outcome().class(), Some("negative"));
        assert_eq!(c.magnitude(), "£300.00");
        let order: Vec<_> = c.breakdown.iter().map(|r| r.tax).collect();
        assert_eq!(order, vec![TaxKind::CouncilTax, TaxKind::Lbtt]);
    }

    #[test]
    fn test_even_is_neutral() {
        let p = parcel();
        let c = calculate(Some(&p), &inputs(false, true, None, Some(500.0)))
            .unwrap()
            .unwrap();
        assert_eq!(c.difference, 0.0);
        assert_eq!(c.outcome(), Outcome::Even);
        assert_eq!(c.outcome().label(), "Difference:");
        assert_eq!(c.outcome().class(), None);
        assert_eq!(c.magnitude(), "£0.00");
    }

    #[test]
    fn test_no_tax_selected() {
        let p = parcel();
        assert_eq!(
            calculate(Some(&p), &inputs(false, false, Some(1.0), Some(1.0))),
            Err(ValidationError::NoTaxSelected)
        );
    }

    #[test]
    fn test_no_selection_is_noop() {
        assert_eq!(calculate(None, &inputs(false, false, None, None)), Ok(None));
        assert_eq!(calculate(None, &inputs(true, true, Some(1.0), None)), Ok(None));
    }

    #[test]
    fn test_missing_amounts_are_zero() {
        let p = ParcelProperties::default();
        let c = calculate(Some(&p), &inputs(true, true, None, None)).unwrap().unwrap();
        assert_eq!((c.total_current, c.total_lvt, c.difference), (0.0, 0.0, 0.0));
        assert_eq!(c.breakdown.len(), 2);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(" 1200.50 "), Some(1200.5));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount("inf"), None);
        assert_eq!(parse_amount("-3"), Some(-3.0));
        assert_eq!(parse_amount(".5"), Some(0.5));
        assert_eq!(parse_amount("-"), None);
        assert_eq!(parse_amount("."), None);
    }

    #[test]
    fn test_parse_amount_reads_leading_number() {
        assert_eq!(parse_amount("1.2.3"), Some(1.2));
        assert_eq!(parse_amount("12-"), Some(12.0));
        assert_eq!(parse_amount("12-5"), Some(12.0));
        assert_eq!(parse_amount("5."), Some(5.0));
        assert_eq!(parse_amount("1e3x"), Some(1000.0));
        assert_eq!(parse_amount("1e"), Some(1.0));
        assert_eq!(parse_amount("1e999"), None);
    }
}
