// Parsing and formatting helpers.
//
// Cell text is parsed strictly here: unlike a forgiving report loader,
// the panel must reject anything that is not a plain number or an ISO
// date, because a silently dropped cell would then be "imputed".
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a metric cell. Returns `None` for anything that is not a finite
/// decimal number (`inf`, `nan` and thousands separators included).
pub fn parse_f64_strict(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    // `f64::from_str` accepts "inf" and "NaN"; those are not data.
    if s.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn parse_date_strict(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

/// Shortest text that parses back to the same value; missing is empty.
pub fn format_cell(v: Option<f64>) -> String {
    match v {
        Some(v) => v.to_string(),
        None => String::new(),
    }
}

pub fn average(v: &[f64]) -> Option<f64> {
    if v.is_empty() {
        return None;
    }
    let sum: f64 = v.iter().copied().sum();
    Some(sum / v.len() as f64)
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus locale thousands separators, e.g. `1,234,567.89`.
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    // Past u128 there is no grouping to do for a preview; print plain digits.
    let Ok(int_val) = int_part.parse::<u128>() else {
        return format!("{:.*}", decimals, n);
    };
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
