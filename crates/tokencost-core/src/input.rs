//! Sanitizing free-form user input.

/// Token count from free text such as "1,000,000" or "2 500 tokens".
///
/// Every non-digit is dropped. An empty result is 0; a count too large for
/// u64 saturates at `u64::MAX`.
pub fn sanitize_tokens(raw: &str) -> u64 {
    raw.chars()
        .filter_map(|c| c.to_digit(10))
        .fold(0u64, |acc, d| acc.saturating_mul(10).saturating_add(u64::from(d)))
}

/// Discount percent from free text, clamped to at most 100.
///
/// Keeps digits and the first decimal point, so "12.5%" is 12.5.
pub fn sanitize_percent(raw: &str) -> f64 {
    let mut seen_dot = false;
    let cleaned: String = raw
        .chars()
        .filter(|c| match *c {
            '0'..='9' => true,
            '.' if !seen_dot => {
                seen_dot = true;
                true
            }
            _ => false,
        })
        .collect();
    let v: f64 = cleaned.parse().unwrap_or(0.0);
    if v.is_finite() {
        v.min(100.0)
    } else {
        0.0
    }
}

/// Group digits in threes: 7000000 -> "7,000,000".
pub fn fmt_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Reformat a token field as the user types: keep digits, regroup them.
/// Returns an empty string when there are no digits.
pub fn format_token_input(raw: &str) -> String {
    if !raw.chars().any(|c| c.is_ascii_digit()) {
        return String::new();
    }
    fmt_thousands(sanitize_tokens(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_strip_noise() {
        assert_eq!(sanitize_tokens("1,000,000"), 1_000_000);
        assert_eq!(sanitize_tokens(" 2 500 tokens"), 2500);
        assert_eq!(sanitize_tokens("-42"), 42);
        assert_eq!(sanitize_tokens("1.5"), 15);
        assert_eq!(sanitize_tokens("abc"), 0);
        assert_eq!(sanitize_tokens(""), 0);
    }

    #[test]
    fn tokens_overflow_saturates() {
        assert_eq!(sanitize_tokens("99999999999999999999999"), u64::MAX);
        assert_eq!(sanitize_tokens("18,446,744,073,709,551,615"), u64::MAX);
        assert_eq!(sanitize_tokens("18446744073709551614"), u64::MAX - 1);
        assert_eq!(sanitize_tokens("000000000000000000000000012"), 12);
    }

    #[test]
    fn percent_clamps_and_floors() {
        assert_eq!(sanitize_percent("20"), 20.0);
        assert_eq!(sanitize_percent("12.5%"), 12.5);
        assert_eq!(sanitize_percent("150"), 100.0);
        assert_eq!(sanitize_percent("-5"), 5.0);
        assert_eq!(sanitize_percent(""), 0.0);
        assert_eq!(sanitize_percent("."), 0.0);
        assert_eq!(sanitize_percent("1.2.3"), 1.23);
    }

    #[test]
    fn thousands() {
        assert_eq!(fmt_thousands(0), "0");
        assert_eq!(fmt_thousands(999), "999");
        assert_eq!(fmt_thousands(1000), "1,000");
        assert_eq!(fmt_thousands(500_000), "500,000");
        assert_eq!(fmt_thousands(7_000_000), "7,000,000");
        assert_eq!(fmt_thousands(u64::MAX), "18,446,744,073,709,551,615");
    }

    #[test]
    fn token_input_formatter() {
        assert_eq!(format_token_input("1000000"), "1,000,000");
        assert_eq!(format_token_input("12,34"), "1,234");
        assert_eq!(format_token_input("abc"), "");
        assert_eq!(format_token_input("007"), "7");
    }
}
