//! Per-cell type guessing and per-column type resolution

use crate::table::{Cell, ColumnType};

/// Values that can be tested for being numeric.
///
/// A value is numeric when converting the whole of it to a float does not
/// give NaN. Strings accept optional surrounding whitespace, a sign, a
/// decimal mantissa with optional exponent, or `Infinity`. Prefixes do not
/// count: `"2022/23"` is not numeric.
///
/// Radix literals (`"0x10"`, `"0b1"`, `"0o7"`) and the spellings `inf` and
/// `nan` are not numeric, unlike a JavaScript `Number()` conversion.
pub trait Numeric {
    fn is_numeric(&self) -> bool;
}

impl Numeric for str {
    fn is_numeric(&self) -> bool {
        to_number(self).is_some()
    }
}

impl Numeric for String {
    fn is_numeric(&self) -> bool {
        self.as_str().is_numeric()
    }
}

impl Numeric for f64 {
    fn is_numeric(&self) -> bool {
        !self.is_nan()
    }
}

impl Numeric for i64 {
    fn is_numeric(&self) -> bool {
        true
    }
}

impl<T: Numeric + ?Sized> Numeric for &T {
    fn is_numeric(&self) -> bool {
        (**self).is_numeric()
    }
}

/// Tests if a value could be numeric
pub fn is_numeric<T: Numeric + ?Sized>(value: &T) -> bool {
    value.is_numeric()
}

/// Whole-string numeric conversion. Blank strings convert to zero.
fn to_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    match trimmed {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }
    // str::parse also takes "inf" and "nan", which are not numbers here
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Type signal carried by a single cell; `None` for empty or missing cells.
pub fn guess_type(value: Option<&str>) -> Option<ColumnType> {
    match value {
        None | Some("") => None,
        Some(v) if v.is_numeric() => Some(ColumnType::Float),
        Some(_) => Some(ColumnType::String),
    }
}

/// Resolve one column type from the guesses of its cells.
///
/// Any string wins, then any float; a column with no signal is a string.
pub fn type_precedence<I>(guesses: I) -> ColumnType
where
    I: IntoIterator<Item = Option<ColumnType>>,
{
    let mut seen_float = false;
    for guess in guesses {
        match guess {
            Some(ColumnType::String) => return ColumnType::String,
            Some(ColumnType::Float) => seen_float = true,
            None => {}
        }
    }
    if seen_float {
        ColumnType::Float
    } else {
        ColumnType::String
    }
}

/// Parse a float cell. Empty, blank, missing or non-numeric cells give NaN.
pub fn parse_float(value: Option<&str>) -> f64 {
    match value {
        Some(v) if !v.trim().is_empty() => to_number(v).unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// Convert a raw cell according to its column type
pub fn convert(value: Option<&str>, column_type: ColumnType) -> Cell {
    match column_type {
        ColumnType::Float => Cell::Number(parse_float(value)),
        ColumnType::String => value.map_or(Cell::Missing, |v| Cell::Text(v.to_string())),
    }
}

/// Infer the type of each of `width` columns over the data rows
pub fn infer_types(rows: &[Vec<String>], width: usize) -> Vec<ColumnType> {
    (0..width)
        .map(|j| {
            type_precedence(
                rows.iter()
                    .map(|row| guess_type(row.get(j).map(String::as_str))),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_values() {
        assert!(is_numeric(&12i64));
        assert!(is_numeric(&12.0f64));
        assert!(is_numeric(&12.2f64));
        assert!(is_numeric("10"));
        assert!(is_numeric("10.0"));
        assert!(is_numeric("10.2"));
        assert!(is_numeric(&1e3f64));
        assert!(is_numeric("1e3"));
    }

    #[test]
    fn test_non_numeric_values() {
        assert!(!is_numeric("2022/23"));
        assert!(!is_numeric("abc"));
        assert!(!is_numeric("12abc"));
        assert!(!is_numeric("inf"));
        assert!(!is_numeric("NaN"));
        assert!(!is_numeric("--1"));
        assert!(!is_numeric(&f64::NAN));
    }

    #[test]
    fn test_radix_literals_are_not_numeric() {
        assert!(!is_numeric("0x10"));
        assert!(!is_numeric("0b1"));
        assert!(!is_numeric("0o7"));
        assert_eq!(guess_type(Some("0x10")), Some(ColumnType::String));
    }

    #[test]
    fn test_numeric_edge_forms() {
        assert!(is_numeric(" 42 "));
        assert!(is_numeric("-0.5"));
        assert!(is_numeric("+3"));
        assert!(is_numeric(".5"));
        assert!(is_numeric("1E-3"));
        assert!(is_numeric("-Infinity"));
        assert!(is_numeric(&String::from("7")));
    }

    #[test]
    fn test_guess_type() {
        assert_eq!(guess_type(None), None);
        assert_eq!(guess_type(Some("")), None);
        assert_eq!(guess_type(Some("1.5")), Some(ColumnType::Float));
        assert_eq!(guess_type(Some("A")), Some(ColumnType::String));
    }

    #[test]
    fn test_type_precedence() {
        use ColumnType::*;
        assert_eq!(type_precedence([Some(Float), None, Some(Float)]), Float);
        assert_eq!(type_precedence([Some(Float), Some(String)]), String);
        assert_eq!(type_precedence([None, None]), String);
        assert_eq!(type_precedence(std::iter::empty()), String);
    }

    #[test]
    fn test_parse_float() {
        assert_eq!(parse_float(Some("1e3")), 1000.0);
        assert_eq!(parse_float(Some(" 2.5 ")), 2.5);
        assert!(parse_float(Some("")).is_nan());
        assert!(parse_float(Some("  ")).is_nan());
        assert!(parse_float(None).is_nan());
    }

    #[test]
    fn test_convert() {
        assert_eq!(convert(Some("3"), ColumnType::Float), Cell::Number(3.0));
        assert_eq!(convert(Some("3"), ColumnType::String), Cell::from("3"));
        assert_eq!(convert(None, ColumnType::String), Cell::Missing);
        assert!(convert(None, ColumnType::Float).as_f64().unwrap().is_nan());
    }

    #[test]
    fn test_float_round_trip() {
        for text in ["0.1", "12.25", "-7", "1e-7", "123456.789"] {
            let value = parse_float(Some(text));
            assert_eq!(parse_float(Some(&value.to_string())), value);
        }
    }

    #[test]
    fn test_infer_types_mixed_columns() {
        let rows = vec![
            vec!["1".to_string(), "A".to_string(), "0".to_string(), String::new()],
            vec!["3".to_string(), "B".to_string(), "C".to_string(), String::new()],
        ];
        assert_eq!(
            infer_types(&rows, 4),
            vec![
                ColumnType::Float,
                ColumnType::String,
                ColumnType::String,
                ColumnType::String
            ]
        );
    }
}
