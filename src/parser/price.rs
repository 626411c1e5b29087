use rust_decimal::Decimal;
use std::str::FromStr;

pub const DEFAULT_CURRENCY: &str = crate::db::DEFAULT_CURRENCY;

const CURRENCY_SYMBOLS: [(char, &str); 5] = [
    ('₹', "INR"),
    ('$', "USD"),
    ('€', "EUR"),
    ('£', "GBP"),
    ('¥', "JPY"),
];

fn is_separator(c: char) -> bool {
    c == ',' || c == '.'
}

/// Decides which of `,` and `.` marks the decimals and drops the other.
fn normalize_separators(digits: &str) -> String {
    match (digits.rfind(','), digits.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => digits.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => digits.replace(',', ""),
        (Some(comma), None) => {
            let decimals = &digits[comma + 1..];
            if digits.matches(',').count() > 1 || decimals.len() == 3 {
                digits.replace(',', "")
            } else {
                digits.replace(',', ".")
            }
        }
        (None, Some(_)) if digits.matches('.').count() > 1 => digits.replace('.', ""),
        _ => digits.to_string(),
    }
}

/// Turns scraped price text into a positive decimal.
/// `None` means the text carried no usable price.
pub fn clean_price(price: &str) -> Option<Decimal> {
    let digits: String = price
        .chars()
        .filter(|c| c.is_ascii_digit() || is_separator(*c))
        .collect();
    let digits = digits.trim_matches(is_separator);
    if digits.is_empty() {
        return None;
    }
    let price = Decimal::from_str(&normalize_separators(digits)).ok()?;
    (price > Decimal::ZERO).then_some(price)
}

/// ISO code of the first currency symbol appearing in the text.
pub fn currency_from_text(text: &str) -> Option<&'static str> {
    text.chars().find_map(|c| {
        CURRENCY_SYMBOLS
            .iter()
            .find(|(symbol, _)| *symbol == c)
            .map(|(_, code)| *code)
    })
}
