//! Display formatters and input sanitizers.
//!
//! Pure conversions between display strings (BRL currency, DD/MM/YYYY
//! dates) and canonical numeric/ISO values.

use chrono::NaiveDate;

/// Trim the ends and collapse internal whitespace runs to a single space,
/// dropping control characters. This is sanitization, not escaping: markup
/// like `<script>` passes through untouched.
pub fn sanitize_text(input: &str) -> String {
    // Tabs and newlines count as whitespace to collapse, not as control
    // characters to drop.
    let cleaned: String = input
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Format a raw digit string representing cents as BRL currency.
/// `"10000"` becomes `"R$ 100,00"`. Non-digit characters are ignored.
pub fn format_currency(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let cents = digits.parse::<u64>().unwrap_or(0);
    format_amount(cents as f64 / 100.0)
}

/// Format a numeric amount as BRL currency with Brazilian grouping:
/// `1234.56` becomes `"R$ 1.234,56"`.
pub fn format_amount(value: f64) -> String {
    let negative = value < 0.0;
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let fraction = cents % 100;

    let mut grouped = String::new();
    for (i, digit) in whole.to_string().chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }
    let grouped: String = grouped.chars().rev().collect();

    format!(
        "{}R$ {},{:02}",
        if negative { "-" } else { "" },
        grouped,
        fraction
    )
}

/// Recover the numeric value from a BRL display string:
/// `"R$ 100,00"` becomes `100.0`. Unparseable input becomes `0.0`.
pub fn currency_to_number(text: &str) -> f64 {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '-')
        .collect();
    cleaned.replace(',', ".").parse().unwrap_or(0.0)
}

/// Format an ISO `YYYY-MM-DD` date for display as `DD/MM/YYYY`, falling
/// back to the input when it does not parse.
pub fn format_date_display(iso_date: &str) -> String {
    match NaiveDate::parse_from_str(iso_date, "%Y-%m-%d") {
        Ok(date) => date.format("%d/%m/%Y").to_string(),
        Err(_) => iso_date.to_string(),
    }
}

/// Parse a `DD/MM/YYYY` display date back into ISO `YYYY-MM-DD`.
pub fn parse_date_display(display: &str) -> Option<String> {
    NaiveDate::parse_from_str(display, "%d/%m/%Y")
        .ok()
        .map(|date| date.format("%Y-%m-%d").to_string())
}
