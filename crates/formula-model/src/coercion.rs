// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Value coercion
//!
//! Two conversion paths exist:
//!
//! - [`Value::try_copy_into`] is the implicit path used for assignments and
//!   argument binding. Integral values are range checked, floats only widen or
//!   narrow to other floats, and integral/floating mixing is rejected.
//! - [`Value::convert_primitive`] and [`Value::try_coerce_to`] are the explicit
//!   path used by conversion expressions. They behave like `as` casts and may
//!   cross between integral, floating, boolean and string values.
//!
//! Both return `None` on incompatibility; callers turn that into a typed error.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};
use formula_engine_core::TypeCode;

use crate::reflection::{ReflectedType, is_child_of};
use crate::types::TypeDescriptor;
use crate::value::{EnumValue, StructValue, Value};

impl Value {
    /// Implicit conversion of the value into a slot of type `dest`
    pub fn try_copy_into(&self, dest: &ReflectedType) -> Option<Value> {
        match dest {
            ReflectedType::Primitive(code) => self.copy_into_primitive(*code),
            ReflectedType::Object(class) => match self {
                Value::Null => Some(Value::Null),
                Value::Object(object) if is_child_of(object.class().as_ref(), class.as_ref()) => {
                    Some(self.clone())
                }
                _ => None,
            },
            ReflectedType::Struct(class) => match self {
                Value::Struct(StructValue::Record { class: actual, .. })
                    if is_child_of(actual.as_ref(), class.as_ref()) =>
                {
                    Some(self.clone())
                }
                _ => None,
            },
            ReflectedType::Enum(host) => match self {
                Value::Enum(value) if value.ty.cpp_name() == host.cpp_name() => Some(self.clone()),
                Value::Enum(_) => None,
                Value::String(s) | Value::Name(s) | Value::Text(s) => host
                    .literal_value(s)
                    .map(|value| Value::Enum(EnumValue::new(host.clone(), value))),
                other => {
                    let raw = other.as_i128()?;
                    Value::integral(host.underlying(), raw)?;
                    Some(Value::Enum(EnumValue::new(host.clone(), i64::try_from(raw).ok()?)))
                }
            },
            ReflectedType::Array(element) => match self {
                Value::Struct(StructValue::Array { items, .. }) => {
                    Some(Value::Struct(StructValue::Array {
                        element: (**element).clone(),
                        items: copy_all(items, element)?,
                    }))
                }
                _ => None,
            },
            ReflectedType::Set(element) => match self {
                Value::Struct(StructValue::Set { items, .. }) => {
                    let mut set = StructValue::Set {
                        element: (**element).clone(),
                        items: copy_all(items, element)?,
                    };
                    set.rehash();
                    Some(Value::Struct(set))
                }
                _ => None,
            },
            ReflectedType::Map(key, value) => match self {
                Value::Struct(StructValue::Map { entries, .. }) => {
                    let mut copied = Vec::with_capacity(entries.len());
                    for (k, v) in entries {
                        copied.push((k.try_copy_into(key)?, v.try_copy_into(value)?));
                    }
                    let mut map = StructValue::Map {
                        key: (**key).clone(),
                        value: (**value).clone(),
                        entries: copied,
                    };
                    map.rehash();
                    Some(Value::Struct(map))
                }
                _ => None,
            },
            ReflectedType::TypeObject => match self {
                Value::Null | Value::Struct(StructValue::Type(_)) => Some(self.clone()),
                _ => None,
            },
        }
    }

    fn copy_into_primitive(&self, code: TypeCode) -> Option<Value> {
        if let Value::Enum(value) = self {
            return match code {
                c if c.is_integral() => value.to_underlying().copy_into_primitive(c),
                c if c.is_string_family() => {
                    string_of(c, value.ty.literal_name(value.value)?.to_string())
                }
                _ => None,
            };
        }

        match code {
            TypeCode::Null => self.is_null().then_some(Value::Null),
            TypeCode::ObjectPtr => match self {
                Value::Null | Value::Object(_) => Some(self.clone()),
                _ => None,
            },
            TypeCode::Boolean => match self {
                Value::Boolean(_) => Some(self.clone()),
                other => other.as_str().and_then(parse_bool).map(Value::Boolean),
            },
            c if c.is_integral() => match self {
                Value::UInt8(_)
                | Value::UInt16(_)
                | Value::UInt32(_)
                | Value::UInt64(_)
                | Value::Int8(_)
                | Value::Int16(_)
                | Value::Int32(_)
                | Value::Int64(_) => Value::integral(c, self.as_i128()?),
                _ => None,
            },
            TypeCode::Float => match self {
                Value::Float(_) => Some(self.clone()),
                Value::Double(d) if !d.is_finite() || d.abs() <= f64::from(f32::MAX) => {
                    Some(Value::Float(*d as f32))
                }
                _ => None,
            },
            TypeCode::Double => match self {
                Value::Float(f) => Some(Value::Double(f64::from(*f))),
                Value::Double(_) => Some(self.clone()),
                _ => None,
            },
            TypeCode::Timespan => matches!(self, Value::Timespan(_)).then(|| self.clone()),
            TypeCode::DateTime => matches!(self, Value::DateTime(_)).then(|| self.clone()),
            c if c.is_string_family() => match self {
                Value::Null => string_of(c, String::new()),
                Value::Boolean(b) => string_of(c, b.to_string()),
                other => string_of(c, other.as_str()?.to_string()),
            },
            TypeCode::Struct => matches!(self, Value::Struct(_)).then(|| self.clone()),
            _ => None,
        }
    }

    /// Explicit primitive conversion with `as`-cast semantics
    ///
    /// With `checked`, integral narrowing and float-to-integral conversion fail
    /// instead of wrapping.
    pub fn convert_primitive(&self, target: TypeCode, checked: bool) -> Option<Value> {
        let source = self.visit();
        if source.type_code() == target {
            return Some(source);
        }

        match target {
            code if code.is_integral() => match &source {
                Value::Boolean(b) => Value::integral(code, i128::from(*b)),
                Value::Float(f) => float_to_integral(code, f64::from(*f), checked),
                Value::Double(d) => float_to_integral(code, *d, checked),
                Value::String(s) | Value::Name(s) | Value::Text(s) => {
                    let text = s.trim();
                    match text.parse::<i128>() {
                        Ok(parsed) => Value::integral(code, parsed),
                        Err(_) => float_to_integral(code, text.parse::<f64>().ok()?, true),
                    }
                }
                other => {
                    let raw = other.as_i128()?;
                    if checked {
                        Value::integral(code, raw)
                    } else {
                        Value::integral_wrapping(code, raw)
                    }
                }
            },
            TypeCode::Float | TypeCode::Double => {
                let widened = match &source {
                    Value::Boolean(b) => {
                        if *b {
                            1.0
                        } else {
                            0.0
                        }
                    }
                    Value::String(s) | Value::Name(s) | Value::Text(s) => s.trim().parse().ok()?,
                    other => other.as_f64()?,
                };
                Some(if target == TypeCode::Float {
                    Value::Float(widened as f32)
                } else {
                    Value::Double(widened)
                })
            }
            TypeCode::Boolean => match &source {
                Value::Float(f) => Some(Value::Boolean(*f != 0.0)),
                Value::Double(d) => Some(Value::Boolean(*d != 0.0)),
                Value::String(s) | Value::Name(s) | Value::Text(s) => {
                    parse_bool(s).map(Value::Boolean)
                }
                other => other.as_i128().map(|raw| Value::Boolean(raw != 0)),
            },
            code if code.is_string_family() => match &source {
                Value::Null | Value::Object(_) | Value::Struct(_) => None,
                other => string_of(code, other.to_string()),
            },
            _ => None,
        }
    }

    /// Explicit conversion to the type described by `target`
    pub fn try_coerce_to(&self, target: &dyn TypeDescriptor, checked: bool) -> Option<Value> {
        if let ReflectedType::Enum(host) = target.reflected_type() {
            if let Value::Enum(value) = self {
                if value.ty.cpp_name() == host.cpp_name() {
                    return Some(self.clone());
                }
            }
            if let Some(name) = self.as_str() {
                return host
                    .literal_value(name)
                    .map(|value| Value::Enum(EnumValue::new(host.clone(), value)));
            }
            let raw = self.convert_primitive(host.underlying(), checked)?.as_i64()?;
            return Some(Value::Enum(EnumValue::new(host.clone(), raw)));
        }

        let code = target.type_code();
        if matches!(target.reflected_type(), ReflectedType::Primitive(_))
            && code.is_coercible()
            && self.type_code().is_coercible()
        {
            return self.convert_primitive(code, checked);
        }
        self.try_copy_into(target.reflected_type())
    }
}

fn copy_all(items: &[Value], element: &ReflectedType) -> Option<Vec<Value>> {
    items.iter().map(|item| item.try_copy_into(element)).collect()
}

fn float_to_integral(code: TypeCode, value: f64, checked: bool) -> Option<Value> {
    if checked {
        if !value.is_finite() {
            return None;
        }
        Value::integral(code, value.trunc() as i128)
    } else {
        Value::integral_wrapping(code, value as i128)
    }
}

fn string_of(code: TypeCode, text: String) -> Option<Value> {
    match code {
        TypeCode::String => Some(Value::String(text.into())),
        TypeCode::Name => Some(Value::Name(text.into())),
        TypeCode::Text => Some(Value::Text(text.into())),
        _ => None,
    }
}

/// Case-insensitive `true` / `false`
pub fn parse_bool(text: &str) -> Option<bool> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Render as `[-][d.]hh:mm:ss[.fffffff]`
pub fn format_timespan(span: TimeDelta) -> String {
    let negative = span < TimeDelta::zero();
    let span = span.abs();
    let total = span.num_seconds();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;
    let nanos = span.subsec_nanos();

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    if days > 0 {
        out.push_str(&format!("{days}."));
    }
    out.push_str(&format!("{hours:02}:{minutes:02}:{seconds:02}"));
    if nanos > 0 {
        out.push_str(&format!(".{:07}", nanos / 100));
    }
    out
}

/// Parse `[-][d.]hh:mm:ss[.fffffff]`
pub fn parse_timespan(text: &str) -> Option<TimeDelta> {
    let text = text.trim();
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let mut parts = body.split(':');
    let head = parts.next()?;
    let minutes: i64 = parts.next()?.parse().ok()?;
    let seconds_part = parts.next()?;
    if parts.next().is_some() || !(0..60).contains(&minutes) {
        return None;
    }

    let (days, hours) = match head.split_once('.') {
        Some((days, hours)) => (days.parse::<i64>().ok()?, hours.parse::<i64>().ok()?),
        None => (0, head.parse::<i64>().ok()?),
    };
    let (whole, fraction) = seconds_part.split_once('.').unwrap_or((seconds_part, ""));
    let seconds: i64 = whole.parse().ok()?;
    if !(0..60).contains(&seconds) {
        return None;
    }
    let nanos: i64 = if fraction.is_empty() {
        0
    } else {
        if fraction.len() > 9 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        format!("{fraction:0<9}").parse().ok()?
    };

    let total = TimeDelta::try_days(days)?
        .checked_add(&TimeDelta::try_hours(hours)?)?
        .checked_add(&TimeDelta::try_minutes(minutes)?)?
        .checked_add(&TimeDelta::try_seconds(seconds)?)?
        .checked_add(&TimeDelta::nanoseconds(nanos))?;
    Some(if negative { -total } else { total })
}

pub fn format_datetime(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

/// RFC 3339 (converted to UTC), `%Y-%m-%dT%H:%M:%S%.f`, or a bare date
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Some(parsed);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(Value::Int32(10), TypeCode::UInt8, Some(Value::UInt8(10)))]
    #[case(Value::Int32(300), TypeCode::UInt8, None)]
    #[case(Value::Int32(-1), TypeCode::UInt32, None)]
    #[case(Value::UInt8(200), TypeCode::Int64, Some(Value::Int64(200)))]
    #[case(Value::Int32(1), TypeCode::Float, None)]
    #[case(Value::Float(1.5), TypeCode::Int32, None)]
    #[case(Value::Float(1.5), TypeCode::Double, Some(Value::Double(1.5)))]
    #[case(Value::Double(1e300), TypeCode::Float, None)]
    #[case(Value::name("a"), TypeCode::String, Some(Value::string("a")))]
    #[case(Value::Boolean(true), TypeCode::Text, Some(Value::text("true")))]
    #[case(Value::string("FALSE"), TypeCode::Boolean, Some(Value::Boolean(false)))]
    #[case(Value::Null, TypeCode::ObjectPtr, Some(Value::Null))]
    #[case(Value::Null, TypeCode::Int32, None)]
    fn test_copy_into_primitive(
        #[case] value: Value,
        #[case] code: TypeCode,
        #[case] expected: Option<Value>,
    ) {
        assert_eq!(value.try_copy_into(&ReflectedType::Primitive(code)), expected);
    }

    #[rstest]
    #[case(Value::Int32(10), TypeCode::UInt8, false, Some(Value::UInt8(10)))]
    #[case(Value::Int32(256), TypeCode::UInt8, false, Some(Value::UInt8(0)))]
    #[case(Value::Int32(256), TypeCode::UInt8, true, None)]
    #[case(Value::Float(-120.0), TypeCode::Int32, false, Some(Value::Int32(-120)))]
    #[case(Value::Double(2.9), TypeCode::Int32, true, Some(Value::Int32(2)))]
    #[case(Value::Int32(10), TypeCode::Boolean, false, Some(Value::Boolean(true)))]
    #[case(Value::Boolean(true), TypeCode::Int16, false, Some(Value::Int16(1)))]
    #[case(Value::Int32(7), TypeCode::Double, false, Some(Value::Double(7.0)))]
    #[case(Value::string("42"), TypeCode::Int64, false, Some(Value::Int64(42)))]
    #[case(Value::string("4.5"), TypeCode::Float, false, Some(Value::Float(4.5)))]
    #[case(Value::Int32(5), TypeCode::String, false, Some(Value::string("5")))]
    #[case(Value::string("abc"), TypeCode::Int32, false, None)]
    fn test_convert_primitive(
        #[case] value: Value,
        #[case] code: TypeCode,
        #[case] checked: bool,
        #[case] expected: Option<Value>,
    ) {
        assert_eq!(value.convert_primitive(code, checked), expected);
    }

    #[test]
    fn test_container_copy_is_element_wise() {
        let source = Value::Struct(StructValue::Array {
            element: ReflectedType::Primitive(TypeCode::UInt8),
            items: vec![Value::UInt8(1), Value::UInt8(2)],
        });
        let copied = source
            .try_copy_into(&ReflectedType::array(TypeCode::Int32.into()))
            .unwrap();
        assert_eq!(copied.type_name(), "TArray<int32>");
        assert_eq!(copied.as_struct().unwrap().get_by_index(1), Some(&Value::Int32(2)));

        assert_eq!(
            source.try_copy_into(&ReflectedType::array(TypeCode::Boolean.into())),
            None
        );
    }

    #[rstest]
    #[case("00:00:01", TimeDelta::seconds(1))]
    #[case("1.02:03:04", TimeDelta::seconds(86_400 + 2 * 3_600 + 3 * 60 + 4))]
    #[case("-00:01:00", TimeDelta::seconds(-60))]
    #[case("00:00:00.5", TimeDelta::milliseconds(500))]
    fn test_timespan_parse(#[case] text: &str, #[case] expected: TimeDelta) {
        assert_eq!(parse_timespan(text), Some(expected));
    }

    #[test]
    fn test_timespan_format() {
        assert_eq!(format_timespan(TimeDelta::seconds(3_661)), "01:01:01");
        assert_eq!(format_timespan(TimeDelta::milliseconds(-1_500)), "-00:00:01.5000000");
        assert_eq!(parse_timespan("00:61:00"), None);
    }

    #[test]
    fn test_datetime_parse() {
        let parsed = parse_datetime("2024-03-01T10:20:30Z").unwrap();
        assert_eq!(format_datetime(parsed), "2024-03-01T10:20:30");
        assert!(parse_datetime("2024-03-01").is_some());
        assert!(parse_datetime("yesterday").is_none());
    }
}
