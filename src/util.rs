// Helpers for parsing spreadsheet text and basic statistics.
//
// Source exports come from a Swedish locale, so numbers may use a decimal
// comma and non-breaking spaces as thousands separators.
use num_format::{Locale, ToFormattedString};

/// Parse a rate cell into `f64`.
///
/// - Trims whitespace (including non-breaking spaces used as separators).
/// - Rejects values that contain alphabetic characters or placeholders like `-`.
/// - Treats a lone `,` as the decimal separator, as in the Swedish locale
///   where thousands are grouped with spaces: `1,234` is 1.234 and
///   `1 234,5` is 1234.5. With a `.` present, `,` is a thousands separator.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() || s.chars().any(|c| c.is_alphabetic()) {
        return None;
    }
    let s: String = s
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .collect();
    let s = if !s.contains('.') && s.matches(',').count() == 1 {
        s.replace(',', ".")
    } else {
        s.replace(',', "")
    };
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn parse_i32_safe(s: Option<&str>) -> Option<i32> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    // Workbooks hand numeric headers back as floats, e.g. `2006.0`.
    let s = s.strip_suffix(".0").unwrap_or(s);
    s.parse::<i32>().ok()
}

/// A header names a year column when it is made of digits only.
pub fn is_year_header(s: &str) -> bool {
    let s = s.trim();
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

pub fn round_to(n: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (n * factor).round() / factor
}

pub fn average(v: &[f64]) -> Option<f64> {
    if v.is_empty() {
        return None;
    }
    let sum: f64 = v.iter().copied().sum();
    Some(sum / v.len() as f64)
}

/// Sample standard deviation (n - 1 denominator). Needs two values.
pub fn sample_std(v: &[f64]) -> Option<f64> {
    if v.len() < 2 {
        return None;
    }
    let mean = average(v)?;
    let ss: f64 = v.iter().map(|x| (x - mean).powi(2)).sum();
    Some((ss / (v.len() - 1) as f64).sqrt())
}

pub fn format_number(n: f64, decimals: usize) -> String {
    if !n.is_finite() {
        return "n/a".to_string();
    }
    let s = format!("{:.*}", decimals, n.abs());
    // Values that round to zero print without a sign.
    let neg = n.is_sign_negative() && s.bytes().any(|b| matches!(b, b'1'..=b'9'));
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
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

pub fn format_opt(n: Option<f64>, decimals: usize) -> String {
    n.map(|v| format_number(v, decimals)).unwrap_or_else(|| "n/a".to_string())
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
