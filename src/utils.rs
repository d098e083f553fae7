// Utility functions

/// Maps Arabic-Indic and Eastern Arabic-Indic digits to ASCII digits.
pub fn fold_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{0660}'..='\u{0669}' => char::from(b'0' + (c as u32 - 0x0660) as u8),
            '\u{06F0}'..='\u{06F9}' => char::from(b'0' + (c as u32 - 0x06F0) as u8),
            '\u{066B}' => '.',
            _ => c,
        })
        .collect()
}

/// Parses the leading number of a price string, the way a lenient float parser would.
///
/// Returns `None` for blank, non-numeric, non-finite and non-positive values:
/// those fields count as "no price", never as zero.
pub fn parse_price(raw: &str) -> Option<f64> {
    let folded = fold_digits(raw.trim());
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (i, c) in folded.char_indices() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            '-' | '+' if i == 0 => {}
            _ => break,
        }
        end = i + c.len_utf8();
    }
    if !seen_digit {
        return None;
    }
    let mantissa = folded[..end].trim_end_matches('.');
    let exponent = exponent_suffix(&folded[end..]);
    format!("{}{}", mantissa, exponent)
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p > 0.0)
}

/// The `e`/`E` exponent at the start of `rest`, with optional sign and at
/// least one digit; empty when there is none.
fn exponent_suffix(rest: &str) -> &str {
    let bytes = rest.as_bytes();
    if !matches!(bytes.first(), Some(b'e' | b'E')) {
        return "";
    }
    let mut end = 1;
    if matches!(bytes.get(end), Some(b'+' | b'-')) {
        end += 1;
    }
    let digits = bytes[end..].iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return "";
    }
    &rest[..end + digits]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_decorated_prices() {
        assert_eq!(parse_price("500"), Some(500.0));
        assert_eq!(parse_price(" 450.5 "), Some(450.5));
        assert_eq!(parse_price("700 ريال"), Some(700.0));
        assert_eq!(parse_price("300."), Some(300.0));
    }

    #[test]
    fn accepts_exponent_suffix() {
        assert_eq!(parse_price("1e3"), Some(1000.0));
        assert_eq!(parse_price("2.5E+2 ريال"), Some(250.0));
        assert_eq!(parse_price("5e-1"), Some(0.5));
        assert_eq!(parse_price("7e"), Some(7.0));
        assert_eq!(parse_price("7e+x"), Some(7.0));
        assert_eq!(parse_price("١e٣"), Some(1000.0));
    }

    #[test]
    fn rejects_missing_and_non_positive_prices() {
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("ريال"), None);
        assert_eq!(parse_price("0"), None);
        assert_eq!(parse_price("-20"), None);
        assert_eq!(parse_price("."), None);
    }

    #[test]
    fn folds_arabic_indic_digits() {
        assert_eq!(fold_digits("٣٠٠"), "300");
        assert_eq!(parse_price("١٢٠٠"), Some(1200.0));
        assert_eq!(parse_price("۹۰"), Some(90.0));
    }
}
