//! Value conversion between scalar types.
//!
//! Bound widget properties read and write through this table whenever the
//! widget slot type differs from the object's declared type.

use crate::enums::{BooleanFormat, UiType};
use crate::error::{FarsightError, FarsightResult};
use crate::value::Value;

/// Knobs for conversions that need formatting decisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionOptions {
    /// How booleans render as strings.
    pub boolean_format: BooleanFormat,
}

/// Converts `value` to `target`.
///
/// Identity conversions always succeed. Between integer, number, boolean and
/// string the rules are: numbers round half up into integers, non-zero
/// numerics are `true`, and strings parse. Anything else fails with
/// `UnsupportedConversion`.
pub fn convert_to(value: &Value, target: UiType, options: &ConversionOptions) -> FarsightResult<Value> {
    if value.ty() == target {
        return Ok(value.clone());
    }
    let unsupported = || FarsightError::UnsupportedConversion {
        from: value.ty(),
        to: target,
    };

    let converted = match (value, target) {
        (Value::Boolean(b), UiType::String) => Value::String(format_bool(*b, options.boolean_format).into()),
        (Value::Integer(i), UiType::String) => Value::String(i.to_string()),
        (Value::Number(f), UiType::String) => Value::String(f.to_string()),

        (Value::Boolean(b), UiType::Integer) => Value::Integer(i32::from(*b)),
        (Value::Number(f), UiType::Integer) => Value::Integer((f + 0.5).floor() as i32),
        (Value::String(s), UiType::Integer) => Value::Integer(s.trim().parse().map_err(|_| unsupported())?),

        (Value::Boolean(b), UiType::Number) => Value::Number(if *b { 1.0 } else { 0.0 }),
        (Value::Integer(i), UiType::Number) => Value::Number(*i as f32),
        (Value::String(s), UiType::Number) => Value::Number(s.trim().parse().map_err(|_| unsupported())?),

        (Value::Integer(i), UiType::Boolean) => Value::Boolean(*i != 0),
        (Value::Number(f), UiType::Boolean) => Value::Boolean(*f != 0.0),
        (Value::String(s), UiType::Boolean) => Value::Boolean(parse_bool(s).ok_or_else(unsupported)?),

        _ => return Err(unsupported()),
    };
    Ok(converted)
}

const fn format_bool(value: bool, format: BooleanFormat) -> &'static str {
    match (format, value) {
        (BooleanFormat::TrueFalse, true) => "true",
        (BooleanFormat::TrueFalse, false) => "false",
        (BooleanFormat::YesNo, true) => "yes",
        (BooleanFormat::YesNo, false) => "no",
        (BooleanFormat::OnOff, true) => "on",
        (BooleanFormat::OnOff, false) => "off",
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => Some(true),
        "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Color;

    fn conv(value: Value, target: UiType) -> FarsightResult<Value> {
        convert_to(&value, target, &ConversionOptions::default())
    }

    #[test]
    fn test_identity() {
        let c = Value::Color(Color::rgba(1, 2, 3, 4));
        assert_eq!(conv(c.clone(), UiType::Color).unwrap(), c);
    }

    #[test]
    fn test_boolean_formats() {
        let yes_no = ConversionOptions {
            boolean_format: BooleanFormat::YesNo,
        };
        assert_eq!(
            convert_to(&Value::Boolean(true), UiType::String, &yes_no).unwrap(),
            Value::from("yes")
        );
        let on_off = ConversionOptions {
            boolean_format: BooleanFormat::OnOff,
        };
        assert_eq!(
            convert_to(&Value::Boolean(false), UiType::String, &on_off).unwrap(),
            Value::from("off")
        );
        assert_eq!(conv(Value::Boolean(true), UiType::String).unwrap(), Value::from("true"));
    }

    #[test]
    fn test_numeric_conversions() {
        assert_eq!(conv(Value::Number(2.5), UiType::Integer).unwrap(), Value::Integer(3));
        assert_eq!(conv(Value::Number(2.4), UiType::Integer).unwrap(), Value::Integer(2));
        assert_eq!(conv(Value::Integer(7), UiType::Number).unwrap(), Value::Number(7.0));
        assert_eq!(conv(Value::from(" 42 "), UiType::Integer).unwrap(), Value::Integer(42));
        assert_eq!(conv(Value::Integer(0), UiType::Boolean).unwrap(), Value::Boolean(false));
        assert_eq!(conv(Value::Boolean(true), UiType::Integer).unwrap(), Value::Integer(1));
        assert_eq!(conv(Value::Integer(-3), UiType::String).unwrap(), Value::from("-3"));
        assert_eq!(conv(Value::from("on"), UiType::Boolean).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_unsupported() {
        assert!(matches!(
            conv(Value::Color(Color::default()), UiType::Integer),
            Err(FarsightError::UnsupportedConversion { .. })
        ));
        assert!(conv(Value::from("twelve"), UiType::Integer).is_err());
        assert!(conv(Value::Integer(1), UiType::Resource).is_err());
    }
}
