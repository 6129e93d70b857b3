//! Unit conversion helpers for consistent formatting across the application

use chrono::NaiveDate;

const BYTE_UNITS: [&str; 9] = ["B", "kB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Placeholder for a value the service reported as null.
pub const NOT_AVAILABLE: &str = "N/A";

/// Format bytes with decimal (1000-based) units, two decimal places.
/// A value that would round to `1000.00` moves up to the next unit.
pub fn format_bytes(value: f64) -> String {
    if value == 0.0 || !value.is_finite() {
        return "0 B".to_string();
    }
    let mut val = value;
    let mut idx = 0;
    while idx + 1 < BYTE_UNITS.len()
        && (val.abs() >= 1000.0 || format!("{:.2}", val.abs()).starts_with("1000."))
    {
        val /= 1000.0;
        idx += 1;
    }
    format!("{val:.2} {}", BYTE_UNITS[idx])
}

/// Format bytes with optional value; a missing count is zero bytes.
pub fn format_opt_bytes(value: Option<f64>) -> String {
    value.map(format_bytes).unwrap_or_else(|| "0 B".to_string())
}

/// Format a value the way an en-US locale would: comma grouping, at most
/// three fraction digits.
pub fn format_grouped(value: f64) -> String {
    let rendered = format!("{:.3}", value.abs());
    let (int_part, frac_part) = rendered.split_once('.').unwrap_or((rendered.as_str(), ""));
    let frac = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 4);
    let negative =
        value.is_sign_negative() && rendered.bytes().any(|b| matches!(b, b'1'..=b'9'));
    if negative {
        grouped.push('-');
    }
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if !frac.is_empty() {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

/// Format a count; millions and above are abbreviated as `MM` with the raw
/// value kept in parentheses.
pub fn format_number(value: f64) -> String {
    format_count(value, &value.to_string())
}

/// Like [`format_number`], but the parenthesized raw value is printed from
/// `raw` verbatim so integers beyond f64 precision keep every digit.
pub fn format_count(value: f64, raw: &str) -> String {
    if value >= 1_000_000.0 {
        let millions = value / 1_000_000.0;
        return format!("{millions:.2}MM ({raw})");
    }
    format_grouped(value)
}

/// Format a count with optional value
pub fn format_opt_number(value: Option<f64>) -> String {
    value
        .map(format_number)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn thousands(value: f64) -> String {
    let k_value = value / 1000.0;
    if k_value < 1.0 {
        format!("{k_value:.3}k")
    } else {
        format!("{k_value:.2}k")
    }
}

/// Format minutes in thousands (`0.500k`, `12.35k`).
pub fn format_minutes_k(minutes: f64) -> String {
    thousands(minutes)
}

/// Format image transformations in thousands with the raw count.
pub fn format_transformations(count: f64) -> String {
    format!("{} ({count})", thousands(count))
}

/// Format Stream minutes in thousands with the grouped raw value.
pub fn format_stream_minutes(minutes: f64) -> String {
    format!("{} ({})", thousands(minutes), format_grouped(minutes))
}

/// Format CPU time given in microseconds as millions of milliseconds.
pub fn format_cpu_time(microseconds: f64) -> String {
    let milliseconds = usecs_to_msecs(microseconds);
    let millions = milliseconds / 1_000_000.0;
    format!("{millions:.2}MM ms ({} ms)", format_grouped(milliseconds))
}

/// Convert microseconds to milliseconds
pub fn usecs_to_msecs(usecs: f64) -> f64 {
    usecs / 1000.0
}

/// Format a calendar date as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
