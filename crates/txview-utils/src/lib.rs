//! Formatting helpers for amounts and timestamps

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;

/// Group the digits of an unsigned integer string with `separator`
pub fn format_number(digits: &str, separator: &str) -> String {
    let mut result = String::new();
    let mut count = 0;
    for c in digits.chars().rev() {
        if count == 3 {
            result.push_str(&separator.chars().rev().collect::<String>());
            count = 0;
        }
        result.push(c);
        count += 1;
    }
    result.chars().rev().collect()
}

/// Format a signed amount with its currency code, e.g. `-1,234.50 EUR`
pub fn format_amount(amount: Decimal, currency: &str, decimal_places: u32, separator: &str) -> String {
    let rounded = amount.round_dp(decimal_places);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let text = format!("{:.*}", decimal_places as usize, rounded.abs());
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut out = format!("{}{}", sign, format_number(int_part, separator));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    if !currency.is_empty() {
        out.push(' ');
        out.push_str(currency);
    }
    out
}

/// Parse a transaction timestamp.
///
/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.f]` (read as UTC) and a
/// bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt);
    }

    let utc = FixedOffset::east_opt(0)?;
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, pattern) {
            return utc.from_local_datetime(&naive).single();
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .and_then(|naive| utc.from_local_datetime(&naive).single())
}

/// Format a transaction timestamp for display, falling back to the raw text
pub fn format_date(value: &str, format: &str) -> String {
    match parse_timestamp(value) {
        Some(dt) => dt.with_timezone(&Utc).format(format).to_string(),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number("1234567", ","), "1,234,567");
        assert_eq!(format_number("123", ","), "123");
        assert_eq!(format_number("1000", "'"), "1'000");
    }

    #[test]
    fn test_format_amount() {
        let amount = Decimal::from_str("-1234.5").unwrap();
        assert_eq!(format_amount(amount, "EUR", 2, ","), "-1,234.50 EUR");

        let amount = Decimal::from_str("200").unwrap();
        assert_eq!(format_amount(amount, "USD", 2, ","), "200.00 USD");

        let amount = Decimal::from_str("10.456").unwrap();
        assert_eq!(format_amount(amount, "", 0, ","), "10");
    }

    #[test]
    fn test_format_amount_negative_zero() {
        let amount = Decimal::from_str("-0.001").unwrap();
        assert_eq!(format_amount(amount, "EUR", 2, ","), "0.00 EUR");
    }

    #[test]
    fn test_parse_timestamp_forms() {
        let rfc = parse_timestamp("2024-05-01T10:00:00Z").unwrap();
        let naive = parse_timestamp("2024-05-01T10:00:00").unwrap();
        assert_eq!(rfc, naive);

        let offset = parse_timestamp("2024-05-01T12:00:00+02:00").unwrap();
        assert_eq!(offset.timestamp(), rfc.timestamp());

        let date_only = parse_timestamp("2024-05-01").unwrap();
        assert_eq!(date_only.timestamp(), rfc.timestamp() - 10 * 3600);

        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2024-05-01T12:30:00+02:00", "%d.%m.%Y %H:%M"), "01.05.2024 10:30");
        assert_eq!(format_date("not a date", "%d.%m.%Y"), "not a date");
    }
}
