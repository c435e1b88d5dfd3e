//! String utility functions.
//!
//! Rendered output and error messages have to match the reference engine
//! byte-for-byte, and the reference engine formats values the way Python
//! does. These helpers reproduce Python's `repr()` for strings and floats and
//! Django's `escape()` for HTML.

use std::fmt::Write;

/// Escapes HTML special characters in a string.
///
/// Replaces `&`, `<`, `>`, `"`, and `'` with the same entities Django's
/// `escape()` produces.
///
/// # Examples
///
/// ```
/// use rusty_templates_core::utils::text::escape_html;
///
/// assert_eq!(escape_html("<b>it's</b>"), "&lt;b&gt;it&#x27;s&lt;/b&gt;");
/// ```
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Formats a string the way Python's `repr()` does.
///
/// Single quotes are used unless the string contains a single quote and no
/// double quote.
///
/// # Examples
///
/// ```
/// use rusty_templates_core::utils::text::python_str_repr;
///
/// assert_eq!(python_str_repr("abc"), "'abc'");
/// assert_eq!(python_str_repr("it's"), "\"it's\"");
/// assert_eq!(python_str_repr("a\nb"), "'a\\nb'");
/// ```
pub fn python_str_repr(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if u32::from(c) < 0x20 || u32::from(c) == 0x7f => {
                let _ = write!(out, "\\x{:02x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Formats a float the way Python's `repr()` and `str()` do.
///
/// Uses the shortest round-tripping digits, always shows a fractional part
/// for integral values, and switches to exponent notation outside
/// `1e-4 <= |f| < 1e16`.
///
/// # Examples
///
/// ```
/// use rusty_templates_core::utils::text::python_float_repr;
///
/// assert_eq!(python_float_repr(3.0), "3.0");
/// assert_eq!(python_float_repr(0.1), "0.1");
/// assert_eq!(python_float_repr(1e16), "1e+16");
/// assert_eq!(python_float_repr(1.5e-5), "1.5e-05");
/// ```
pub fn python_float_repr(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if f == 0.0 {
        return if f.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    let scientific = format!("{f:e}");
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or_default();
    let sign = if mantissa.starts_with('-') { "-" } else { "" };
    let digits: String = mantissa
        .trim_start_matches('-')
        .chars()
        .filter(char::is_ascii_digit)
        .collect();

    if (-4..16).contains(&exponent) {
        if exponent >= 0 {
            let point = exponent.unsigned_abs() as usize + 1;
            if digits.len() <= point {
                let zeros = "0".repeat(point - digits.len());
                format!("{sign}{digits}{zeros}.0")
            } else {
                format!("{sign}{}.{}", &digits[..point], &digits[point..])
            }
        } else {
            let zeros = "0".repeat(exponent.unsigned_abs() as usize - 1);
            format!("{sign}0.{zeros}{digits}")
        }
    } else {
        let mantissa = if digits.len() == 1 {
            digits
        } else {
            format!("{}.{}", &digits[..1], &digits[1..])
        };
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        format!("{sign}{mantissa}e{exp_sign}{:02}", exponent.unsigned_abs())
    }
}
