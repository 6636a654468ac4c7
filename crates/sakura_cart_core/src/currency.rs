//! Display formatting for dollar amounts.

/// Formats an amount as en-US dollars: `$1,234.50`, `-$3.00`.
///
/// Non-finite amounts render as `$0.00`.
pub fn format_usd(amount: f64) -> String {
    if !amount.is_finite() {
        return "$0.00".to_string();
    }

    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = group_thousands(cents / 100);
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${whole}.{:02}", cents % 100)
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::format_usd;

    #[test]
    fn formats_cents_and_grouping() {
        assert_eq!(format_usd(0.0), "$0.00");
        assert_eq!(format_usd(14.5), "$14.50");
        assert_eq!(format_usd(1234.5), "$1,234.50");
        assert_eq!(format_usd(1_000_000.0), "$1,000,000.00");
        assert_eq!(format_usd(999.999), "$1,000.00");
    }

    #[test]
    fn formats_negative_and_invalid_amounts() {
        assert_eq!(format_usd(-3.0), "-$3.00");
        assert_eq!(format_usd(-0.001), "$0.00");
        assert_eq!(format_usd(f64::NAN), "$0.00");
    }
}
