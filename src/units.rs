// Human-scaled formatting for raw counters (bytes, message counts).
// Thresholds and precision match the monitoring console this engine feeds.

use std::fmt::Display;

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;
const TIB: f64 = 1024.0 * 1024.0 * 1024.0 * 1024.0;

/// Formats a byte count with a binary suffix: two decimal places once a
/// suffix applies, the raw integer below 1024.
pub fn format_bytes(n: f64) -> String {
    if n < KIB {
        format!("{}", n as i64)
    } else if n < MIB {
        format!("{:.2} KB", n / KIB)
    } else if n < GIB {
        format!("{:.2} MB", n / MIB)
    } else if n < TIB {
        format!("{:.2} GB", n / GIB)
    } else {
        format!("{:.2} TB", n / TIB)
    }
}

/// Formats a message count with k/m/b suffixes, one decimal place once a
/// suffix applies. Counts below 100 are left unscaled.
pub fn format_message_count(n: f64) -> String {
    if n < 100.0 {
        format!("{}", n as i64)
    } else if n < MIB {
        format!("{:.1}k", n / KIB)
    } else if n < GIB {
        format!("{:.1}m", n / MIB)
    } else {
        format!("{:.1}b", n / GIB)
    }
}

/// Pie-legend scaling: decimal M/B suffixes at 10^6 and 10^9, one decimal
/// place once a suffix applies.
pub fn format_slice_value(n: f64) -> String {
    if n < 1_000_000.0 {
        format!("{}", n as i64)
    } else if n < 1_000_000_000.0 {
        format!("{:.1}M", n / 1_000_000.0)
    } else {
        format!("{:.1}B", n / 1_000_000_000.0)
    }
}

/// Inserts `,` every three digits from the right of the integer part.
/// Accepts anything displayable; a fractional part and sign pass through.
pub fn add_thousands_separators<T: Display>(n: T) -> String {
    let s = n.to_string();
    let (sign, rest) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.as_str()),
    };
    let (int_part, frac_part) = match rest.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rest, None),
    };

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}
