//! Scalar text conversions for leaf attributes.
//!
//! # Responsibility
//! - Convert primitive-like field values to and from the text form used in
//!   inline attributes and element content.
//!
//! # Invariants
//! - `to_text` output is always accepted by `parse_text` of the same type.
//! - A failed parse never mutates anything; callers keep the previous field
//!   value.

use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::link::Identity;

/// Failed conversion from document text into a typed field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueParseError {
    pub text: String,
    pub target: &'static str,
}

impl ValueParseError {
    fn new(text: &str, target: &'static str) -> Self {
        Self {
            text: text.to_string(),
            target,
        }
    }
}

impl Display for ValueParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "cannot read `{}` as {}", self.text, self.target)
    }
}

impl Error for ValueParseError {}

/// A field type that can live in one leaf attribute.
pub trait ScalarValue: 'static {
    fn to_text(&self) -> String;
    fn parse_text(text: &str) -> Result<Self, ValueParseError>
    where
        Self: Sized;
}

impl ScalarValue for String {
    fn to_text(&self) -> String {
        self.clone()
    }

    fn parse_text(text: &str) -> Result<Self, ValueParseError> {
        Ok(text.to_string())
    }
}

impl ScalarValue for bool {
    fn to_text(&self) -> String {
        if *self { "true" } else { "false" }.to_string()
    }

    fn parse_text(text: &str) -> Result<Self, ValueParseError> {
        // Older files write booleans as 0/1.
        match text.trim() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(ValueParseError::new(text, "bool")),
        }
    }
}

macro_rules! integer_scalar {
    ($($ty:ty),+) => {
        $(impl ScalarValue for $ty {
            fn to_text(&self) -> String {
                self.to_string()
            }

            fn parse_text(text: &str) -> Result<Self, ValueParseError> {
                text.trim()
                    .parse()
                    .map_err(|_| ValueParseError::new(text, stringify!($ty)))
            }
        })+
    };
}

integer_scalar!(i32, i64, u32, u64);

impl ScalarValue for f64 {
    fn to_text(&self) -> String {
        self.to_string()
    }

    fn parse_text(text: &str) -> Result<Self, ValueParseError> {
        text.trim()
            .parse()
            .map_err(|_| ValueParseError::new(text, "f64"))
    }
}

impl ScalarValue for Identity {
    fn to_text(&self) -> String {
        self.raw().to_string()
    }

    fn parse_text(text: &str) -> Result<Self, ValueParseError> {
        let raw: i64 = text
            .trim()
            .parse()
            .map_err(|_| ValueParseError::new(text, "identity"))?;
        Ok(Identity::from_raw(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_accepts_legacy_numeric_form() {
        assert_eq!(bool::parse_text("1").unwrap(), true);
        assert_eq!(bool::parse_text("0").unwrap(), false);
        assert_eq!(bool::parse_text("true").unwrap(), true);
        assert!(bool::parse_text("yes").is_err());
    }

    #[test]
    fn numbers_round_trip_through_text() {
        assert_eq!(i64::parse_text(&(-42i64).to_text()).unwrap(), -42);
        assert_eq!(f64::parse_text(&12.5f64.to_text()).unwrap(), 12.5);
        assert_eq!(u32::parse_text(" 7 ").unwrap(), 7);
    }

    #[test]
    fn identity_parses_unassigned_marker() {
        let id = Identity::parse_text("-1").unwrap();
        assert!(!id.is_assigned());
    }

    #[test]
    fn parse_failure_reports_text_and_target() {
        let err = i32::parse_text("abc").unwrap_err();
        assert_eq!(err.text, "abc");
        assert_eq!(err.target, "i32");
    }
}
