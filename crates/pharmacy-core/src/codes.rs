//! # Formatted Codes
//!
//! Every catalogue entity is keyed by a plain integer in the database but is
//! shown to staff as a prefixed, zero-padded code.
//!
//! ```text
//! ┌──────────────┬────────┬───────┬───────────┐
//! │ Entity       │ Prefix │ Width │ Example   │
//! ├──────────────┼────────┼───────┼───────────┤
//! │ Product/Drug │ P      │ 6     │ P000012   │
//! │ Category     │ C      │ 4     │ C0003     │
//! │ Company      │ S      │ 4     │ S0001     │
//! └──────────────┴────────┴───────┴───────────┘
//! ```
//!
//! Company codes carry `S` (supplier) rather than `C`, so category and
//! company codes can never be confused on screen.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Which family of code is being formatted or parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeKind {
    Product,
    Category,
    Company,
}

impl CodeKind {
    /// Letter shown in front of the number.
    pub const fn prefix(self) -> char {
        match self {
            CodeKind::Product => 'P',
            CodeKind::Category => 'C',
            CodeKind::Company => 'S',
        }
    }

    /// Zero-padding width of the numeric part.
    pub const fn width(self) -> usize {
        match self {
            CodeKind::Product => 6,
            CodeKind::Category | CodeKind::Company => 4,
        }
    }
}

impl fmt::Display for CodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CodeKind::Product => "product",
            CodeKind::Category => "category",
            CodeKind::Company => "company",
        };
        f.write_str(name)
    }
}

/// Formats an integer code for display.
///
/// ## Example
/// ```rust
/// use pharmacy_core::codes::{format_code, CodeKind};
///
/// assert_eq!(format_code(CodeKind::Product, 12), "P000012");
/// assert_eq!(format_code(CodeKind::Company, 1), "S0001");
/// assert_eq!(format_code(CodeKind::Category, 12345), "C12345");
/// ```
pub fn format_code(kind: CodeKind, code: i64) -> String {
    format!("{}{:0width$}", kind.prefix(), code, width = kind.width())
}

/// Derives the integer code from a formatted code string.
///
/// Accepts `"P000012"`, `"p12"` and the bare number `"12"`.
///
/// ## Errors
/// `CoreError::InvalidCode` for empty input, a foreign prefix, non-digit
/// characters, or a value below 1.
pub fn parse_code(kind: CodeKind, input: &str) -> CoreResult<i64> {
    let trimmed = input.trim();
    let invalid = |reason: &str| CoreError::InvalidCode {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    let mut chars = trimmed.chars();
    let digits = match chars.next() {
        None => return Err(invalid("empty")),
        Some(c) if c.eq_ignore_ascii_case(&kind.prefix()) => chars.as_str(),
        Some(c) if c.is_ascii_digit() => trimmed,
        Some(_) => {
            return Err(invalid(&format!(
                "{} codes start with '{}'",
                kind,
                kind.prefix()
            )))
        }
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("expected digits after the prefix"));
    }

    let value: i64 = digits.parse().map_err(|_| invalid("number too large"))?;
    if value < 1 {
        return Err(invalid("codes start at 1"));
    }

    Ok(value)
}

/// Next free code: one past the highest existing code, or 1 when empty.
pub fn next_code<I>(existing: I) -> i64
where
    I: IntoIterator<Item = i64>,
{
    existing.into_iter().max().map_or(1, |max| max + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_code() {
        assert_eq!(format_code(CodeKind::Product, 1), "P000001");
        assert_eq!(format_code(CodeKind::Category, 7), "C0007");
        assert_eq!(format_code(CodeKind::Company, 121), "S0121");
        assert_eq!(format_code(CodeKind::Product, 1_234_567), "P1234567");
    }

    #[test]
    fn test_parse_code() {
        assert_eq!(parse_code(CodeKind::Product, "P000012").unwrap(), 12);
        assert_eq!(parse_code(CodeKind::Product, " p12 ").unwrap(), 12);
        assert_eq!(parse_code(CodeKind::Company, "S0121").unwrap(), 121);
        assert_eq!(parse_code(CodeKind::Category, "3").unwrap(), 3);
    }

    #[test]
    fn test_parse_code_rejects_bad_input() {
        assert!(parse_code(CodeKind::Product, "").is_err());
        assert!(parse_code(CodeKind::Product, "C0001").is_err());
        assert!(parse_code(CodeKind::Company, "S").is_err());
        assert!(parse_code(CodeKind::Company, "S12a").is_err());
        assert!(parse_code(CodeKind::Category, "C0000").is_err());
        assert!(parse_code(CodeKind::Product, "P99999999999999999999").is_err());
    }

    #[test]
    fn test_format_parse_agree() {
        let formatted = format_code(CodeKind::Category, 42);
        assert_eq!(parse_code(CodeKind::Category, &formatted).unwrap(), 42);
    }

    #[test]
    fn test_next_code() {
        assert_eq!(next_code(Vec::<i64>::new()), 1);
        assert_eq!(next_code(vec![3, 9, 4]), 10);
    }
}
