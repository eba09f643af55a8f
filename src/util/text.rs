use std::{collections::HashSet, str::FromStr};

use anyhow::{anyhow, Result};
use rust_decimal::Decimal;

/// 證交所數字欄位常見的多餘字元
const NUMBER_ESCAPE_CHAR: &[char] = &['元', '%', ',', ' ', '"', '\n'];

/// Parses a decimal value from a given string.
///
/// This function accepts a string representation of a decimal number,
/// potentially containing commas as thousands separators and other escape characters,
/// and attempts to convert it into a `Decimal`. If the conversion fails, an error is returned.
///
/// # Arguments
///
/// * `s`: A string slice containing the representation of a decimal number.
/// * `escape_chars`: Optional characters to be escaped from the input string.
pub fn parse_decimal(s: &str, escape_chars: Option<Vec<char>>) -> Result<Decimal> {
    let cleaned = clean_escape_chars(s, escape_chars);
    Decimal::from_str(&cleaned)
        .map_err(|why| anyhow!("Failed to parse '{}' as Decimal because {:?}", cleaned, why))
}

/// 將儲存格轉成數值，無法解析 ("N/A"、"--"、空字串) 時回傳 `None`，
/// 讓呼叫端可以分辨「沒有資料」與「0」。
pub fn parse_number(s: &str) -> Option<Decimal> {
    parse_decimal(s, None).ok()
}

/// Removes a set of escape characters from a given string.
///
/// # Example
///
/// ```text
/// let s = "Hello$Wor^ld!@#";
/// let clean_s = clean_escape_chars(s, Some(vec!['$', '^', '@', '#']));
/// assert_eq!(clean_s, "HelloWorld!");
/// ```
pub(crate) fn clean_escape_chars(s: &str, escape_chars: Option<Vec<char>>) -> String {
    let mut combined: Vec<char> = NUMBER_ESCAPE_CHAR.to_vec();
    if let Some(ec) = escape_chars {
        combined.extend(ec);
    }

    let filters = combined.iter().collect::<HashSet<_>>();
    s.chars().filter(|c| !filters.contains(c)).collect()
}

/// 千分位格式，例︰1234567 => "1,234,567"
pub fn format_thousands(value: i128) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if value < 0 {
        grouped.insert(0, '-');
    }

    grouped
}
