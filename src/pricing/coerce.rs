//! Numeric coercion for loosely typed upstream fields.
//!
//! The provider sends prices as JSON numbers on some days and as localized
//! strings on others ("2.512,40", "-", "N/A"). Everything goes through
//! [`safe_float`] before it reaches any arithmetic.

use serde::Deserialize;
use serde_json::Value;

/// Tokens the provider uses for "no quote".
const PLACEHOLDERS: &[&str] = &["", "-", "—", "–", "n/a", "na"];

/// A scalar as it appears in the upstream JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawScalar {
    Number(f64),
    Text(String),
    Other(Value),
}

impl RawScalar {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawScalar::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// Coerce an upstream value into a finite `f64`, falling back to `default`.
///
/// Never fails: absent values, placeholders, unparseable text and
/// non-finite numbers all yield `default`.
pub fn safe_float(value: Option<&RawScalar>, default: f64) -> f64 {
    let parsed = match value {
        None => None,
        Some(RawScalar::Number(n)) => Some(*n),
        Some(RawScalar::Text(s)) => parse_text(s),
        Some(RawScalar::Other(_)) => None,
    };

    parsed.filter(|n| n.is_finite()).unwrap_or(default)
}

fn parse_text(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let lowered = trimmed.to_lowercase();
    if PLACEHOLDERS.contains(&lowered.as_str()) {
        return None;
    }

    normalize_separators(trimmed).parse::<f64>().ok()
}

/// Rewrite a localized number so `str::parse` understands it.
///
/// A lone comma is the decimal separator. When both separators appear, the
/// last one is the decimal separator and the other groups thousands.
fn normalize_separators(text: &str) -> String {
    let last_comma = text.rfind(',');
    let last_dot = text.rfind('.');

    match (last_comma, last_dot) {
        (Some(comma), Some(dot)) if comma > dot => text.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => text.replace(',', ""),
        (Some(_), None) => text.replace(',', "."),
        _ => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> RawScalar {
        RawScalar::Text(s.to_string())
    }

    #[test]
    fn test_placeholders_yield_default() {
        for token in ["", "-", "—", "–", "N/A", "na", "NA", "n/a", "  -  ", "\tN/A\n", "   "] {
            assert_eq!(safe_float(Some(&text(token)), 7.5), 7.5, "token {token:?}");
        }
    }

    #[test]
    fn test_absent_yields_default() {
        assert_eq!(safe_float(None, 0.0), 0.0);
        assert_eq!(safe_float(None, 3.0), 3.0);
    }

    #[test]
    fn test_localized_text() {
        for input in ["1.234,56", "1234,56", "1,234.56", "1234.56", " 1234.56 "] {
            let value = safe_float(Some(&text(input)), 0.0);
            assert!((value - 1234.56).abs() < 1e-9, "{input:?} -> {value}");
        }
    }

    #[test]
    fn test_numbers_pass_through() {
        assert_eq!(safe_float(Some(&RawScalar::Number(2512.4)), 0.0), 2512.4);
        assert_eq!(safe_float(Some(&RawScalar::Number(-3.0)), 0.0), -3.0);
    }

    #[test]
    fn test_garbage_yields_default() {
        assert_eq!(safe_float(Some(&text("abc")), 1.0), 1.0);
        assert_eq!(safe_float(Some(&text("1.2.3,4,5")), 1.0), 1.0);
        assert_eq!(safe_float(Some(&text("inf")), 1.0), 1.0);
        assert_eq!(safe_float(Some(&text("NaN")), 1.0), 1.0);
        assert_eq!(safe_float(Some(&RawScalar::Other(Value::Bool(true))), 1.0), 1.0);
        assert_eq!(
            safe_float(Some(&RawScalar::Other(serde_json::json!({"v": 1}))), 1.0),
            1.0
        );
    }

    #[test]
    fn test_untagged_deserialization() {
        let n: RawScalar = serde_json::from_str("2512.4").unwrap();
        assert_eq!(n, RawScalar::Number(2512.4));
        let s: RawScalar = serde_json::from_str("\"2.512,40\"").unwrap();
        assert_eq!(s.as_text(), Some("2.512,40"));
        let o: RawScalar = serde_json::from_str("[1, 2]").unwrap();
        assert!(matches!(o, RawScalar::Other(_)));
    }
}
