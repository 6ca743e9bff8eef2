//! Literal values rendered into statement text.

use chrono::NaiveDateTime;

use crate::{error::ValidationError, syntax};

/// A scalar written literally into SQL.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    DateTime(NaiveDateTime),
}

impl SqlValue {
    /// Renders the value as a SQL literal. Text must pass
    /// [`syntax::check_safe_value`] since it is quoted, not escaped. NaN and
    /// infinities are rejected.
    pub fn to_literal(&self) -> Result<String, ValidationError> {
        Ok(match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Bool(true) => "TRUE".to_string(),
            SqlValue::Bool(false) => "FALSE".to_string(),
            SqlValue::Int(i) => i.to_string(),
            SqlValue::Float(f) if !f.is_finite() => return Err(ValidationError::NonFiniteNumber(f.to_string())),
            SqlValue::Float(f) => f.to_string(),
            SqlValue::Text(s) => {
                syntax::check_safe_value(s)?;
                format!("'{}'", s)
            }
            SqlValue::DateTime(dt) => format!("'{}'", dt.format("%Y-%m-%d %H:%M:%S")),
        })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<&String> for SqlValue {
    fn from(value: &String) -> Self {
        SqlValue::Text(value.clone())
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for SqlValue {
                fn from(value: $t) -> Self {
                    SqlValue::Int(value as i64)
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for SqlValue {
    fn from(value: f32) -> Self {
        SqlValue::Float(value as f64)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(value: NaiveDateTime) -> Self {
        SqlValue::DateTime(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn literals() {
        assert_eq!(SqlValue::from(42).to_literal().unwrap(), "42");
        assert_eq!(SqlValue::from("draft").to_literal().unwrap(), "'draft'");
        assert_eq!(SqlValue::from(None::<i64>).to_literal().unwrap(), "NULL");
        assert_eq!(SqlValue::from(true).to_literal().unwrap(), "TRUE");
        assert_eq!(SqlValue::from(1.5).to_literal().unwrap(), "1.5");

        let dt = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap().and_hms_opt(8, 5, 0).unwrap();
        assert_eq!(SqlValue::from(dt).to_literal().unwrap(), "'2024-03-09 08:05:00'");
    }

    #[test]
    fn quoted_text_is_rejected() {
        assert_eq!(
            SqlValue::from("o'hara").to_literal(),
            Err(ValidationError::UnsafeValue("o'hara".to_string()))
        );
    }

    #[test]
    fn trailing_backslash_is_rejected() {
        assert_eq!(SqlValue::from("x\\").to_literal(), Err(ValidationError::UnsafeValue("x\\".to_string())));
        assert!(SqlValue::from("C:\\themes").to_literal().is_err());
    }

    #[test]
    fn non_finite_floats_are_rejected() {
        for f in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(SqlValue::from(f).to_literal(), Err(ValidationError::NonFiniteNumber(_))), "{f}");
        }
        assert_eq!(SqlValue::from(-0.25).to_literal().unwrap(), "-0.25");
    }
}
