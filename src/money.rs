//! Currency formatting for report output.
//!
//! Amounts are carried as [`Decimal`] everywhere and only turned into text at the edge, when a
//! table cell or metric card is emitted.

use rust_decimal::{Decimal, RoundingStrategy};

/// Formats monetary amounts with a currency symbol and thousands separators.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoneyFormat {
    symbol: String,
    separator: char,
}

impl Default for MoneyFormat {
    fn default() -> Self {
        Self::new("R")
    }
}

impl MoneyFormat {
    /// Creates a formatter using `symbol` and a space as the thousands separator.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            separator: ' ',
        }
    }

    /// Overrides the thousands separator.
    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// Returns the configured currency symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Renders `amount` rounded half-up to cents, e.g. `R 1 234 567.89` or `-R 12.00`.
    pub fn format(&self, amount: Decimal) -> String {
        let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let digits = format!("{:.2}", rounded.abs());
        let (whole, cents) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

        let grouped = group_thousands(whole, self.separator);
        let sign = if negative { "-" } else { "" };
        if self.symbol.is_empty() {
            format!("{sign}{grouped}.{cents}")
        } else {
            format!("{sign}{} {grouped}.{cents}", self.symbol)
        }
    }

    /// Renders a signed amount with an explicit `+` for increases.
    pub fn format_signed(&self, amount: Decimal) -> String {
        if amount > Decimal::ZERO {
            format!("+{}", self.format(amount))
        } else {
            self.format(amount)
        }
    }
}

fn group_thousands(whole: &str, separator: char) -> String {
    let len = whole.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (index, ch) in whole.chars().enumerate() {
        if index > 0 && (len - index) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(ch);
    }
    grouped
}

/// Formats a percentage with one decimal place, or `n/a` when undefined.
pub fn format_percent(value: Option<Decimal>) -> String {
    match value {
        Some(value) => {
            let rounded = value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
            format!("{rounded:.1}%")
        }
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn groups_thousands() {
        let format = MoneyFormat::new("R");
        assert_eq!(format.format(dec!(1234567.891)), "R 1 234 567.89");
        assert_eq!(format.format(dec!(999)), "R 999.00");
        assert_eq!(format.format(dec!(0)), "R 0.00");
    }

    #[test]
    fn negative_amounts_carry_a_leading_sign() {
        let format = MoneyFormat::new("$").with_separator(',');
        assert_eq!(format.format(dec!(-12500.5)), "-$ 12,500.50");
        assert_eq!(format.format(dec!(-0.001)), "$ 0.00");
    }

    #[test]
    fn signed_format_marks_increases() {
        let format = MoneyFormat::default();
        assert_eq!(format.format_signed(dec!(10)), "+R 10.00");
        assert_eq!(format.format_signed(dec!(-10)), "-R 10.00");
    }

    #[test]
    fn percent_formatting() {
        assert_eq!(format_percent(Some(dec!(12.345))), "12.3%");
        assert_eq!(format_percent(Some(dec!(-4.25))), "-4.3%");
        assert_eq!(format_percent(None), "n/a");
    }
}
