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

//! Constant folding
//!
//! A constant node carries the literal as written in the serialized tree and
//! the declared type. Folding converts the literal to that type once per
//! evaluation; the node itself is never mutated.

use formula_engine_ast::{ConstantExpression, ConstantLiteral};
use formula_engine_core::{FormulaError, Result, TypeCode};
use formula_engine_model::coercion::{parse_datetime, parse_timespan};
use formula_engine_model::{EnumValue, ReflectedType, TypeDescriptorRef, Value};

use crate::context::ExecutionContext;
use crate::engine::FormulaEngine;

impl FormulaEngine {
    pub(crate) fn evaluate_constant(
        &self,
        constant: &ConstantExpression,
        context: &ExecutionContext,
    ) -> Result<Value> {
        let target = self.resolve_type(&constant.value_type, context)?;
        if let ConstantLiteral::Null = constant.value {
            return if target.can_be_null() {
                Ok(Value::Null)
            } else {
                Err(FormulaError::null_conversion_illegal(target.type_name()))
            };
        }

        fold(&constant.value, &target, context).ok_or_else(|| {
            FormulaError::no_conversion(literal_type(&constant.value).cpp_name(), target.type_name())
        })
    }
}

fn fold(literal: &ConstantLiteral, target: &TypeDescriptorRef, context: &ExecutionContext) -> Option<Value> {
    match target.reflected_type() {
        ReflectedType::Enum(host) => {
            let raw = match literal {
                ConstantLiteral::Integer(value) => *value,
                ConstantLiteral::String(text) => match host.literal_value(text) {
                    Some(value) => i128::from(value),
                    None => text.trim().parse().ok()?,
                },
                _ => return None,
            };
            let value = Value::integral_wrapping(host.underlying(), raw)?.as_i64()?;
            Some(Value::Enum(EnumValue::new(host.clone(), value)))
        }
        ReflectedType::Primitive(TypeCode::Enum) => match literal {
            ConstantLiteral::Integer(value) => {
                Value::integral_wrapping(context.config().default_enum_underlying, *value)
            }
            _ => None,
        },
        ReflectedType::Primitive(code) => fold_primitive(literal, *code),
        _ => None,
    }
}

fn fold_primitive(literal: &ConstantLiteral, code: TypeCode) -> Option<Value> {
    match literal {
        ConstantLiteral::Null => None,
        ConstantLiteral::Boolean(value) => match code {
            TypeCode::Boolean => Some(Value::Boolean(*value)),
            c if c.is_string_family() => string_value(c, if *value { "True" } else { "False" }),
            c if c.is_integral() => Value::integral(c, i128::from(*value)),
            TypeCode::Float => Some(Value::Float(if *value { 1.0 } else { 0.0 })),
            TypeCode::Double => Some(Value::Double(if *value { 1.0 } else { 0.0 })),
            _ => None,
        },
        ConstantLiteral::Integer(value) => match code {
            c if c.is_integral() => Value::integral_wrapping(c, *value),
            TypeCode::Float => Some(Value::Float(*value as f32)),
            TypeCode::Double => Some(Value::Double(*value as f64)),
            TypeCode::Boolean => Some(Value::Boolean(*value != 0)),
            c if c.is_string_family() => string_value(c, &value.to_string()),
            _ => None,
        },
        ConstantLiteral::Float(value) => Value::Double(*value).convert_primitive(code, false),
        ConstantLiteral::String(text) => match code {
            c if c.is_string_family() => string_value(c, text),
            TypeCode::DateTime => parse_datetime(text).map(Value::DateTime),
            TypeCode::Timespan => parse_timespan(text).map(Value::Timespan),
            c if c == TypeCode::Boolean || c.is_numeric() => {
                Value::string(text).convert_primitive(c, false)
            }
            _ => None,
        },
    }
}

fn string_value(code: TypeCode, text: &str) -> Option<Value> {
    match code {
        TypeCode::String => Some(Value::string(text)),
        TypeCode::Name => Some(Value::name(text)),
        TypeCode::Text => Some(Value::text(text)),
        _ => None,
    }
}

fn literal_type(literal: &ConstantLiteral) -> TypeCode {
    match literal {
        ConstantLiteral::Null => TypeCode::Null,
        ConstantLiteral::Boolean(_) => TypeCode::Boolean,
        ConstantLiteral::Integer(_) => TypeCode::Int64,
        ConstantLiteral::Float(_) => TypeCode::Double,
        ConstantLiteral::String(_) => TypeCode::String,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(ConstantLiteral::Integer(300), TypeCode::UInt8, Some(Value::UInt8(44)))]
    #[case(ConstantLiteral::Integer(-1), TypeCode::UInt32, Some(Value::UInt32(u32::MAX)))]
    #[case(ConstantLiteral::Integer(2), TypeCode::Double, Some(Value::Double(2.0)))]
    #[case(ConstantLiteral::Integer(0), TypeCode::Boolean, Some(Value::Boolean(false)))]
    #[case(ConstantLiteral::Integer(12), TypeCode::Name, Some(Value::name("12")))]
    #[case(ConstantLiteral::Float(2.75), TypeCode::Int32, Some(Value::Int32(2)))]
    #[case(ConstantLiteral::Float(0.5), TypeCode::Float, Some(Value::Float(0.5)))]
    #[case(ConstantLiteral::Boolean(true), TypeCode::String, Some(Value::string("True")))]
    #[case(ConstantLiteral::Boolean(true), TypeCode::Int16, Some(Value::Int16(1)))]
    #[case(ConstantLiteral::String("TRUE".into()), TypeCode::Boolean, Some(Value::Boolean(true)))]
    #[case(ConstantLiteral::String(" 42 ".into()), TypeCode::Int64, Some(Value::Int64(42)))]
    #[case(ConstantLiteral::String("1.5".into()), TypeCode::Double, Some(Value::Double(1.5)))]
    #[case(ConstantLiteral::String("abc".into()), TypeCode::Int32, None)]
    #[case(ConstantLiteral::Boolean(false), TypeCode::DateTime, None)]
    fn primitive_folding(
        #[case] literal: ConstantLiteral,
        #[case] code: TypeCode,
        #[case] expected: Option<Value>,
    ) {
        assert_eq!(fold_primitive(&literal, code), expected);
    }

    #[test]
    fn timespan_and_datetime_parse_from_strings() {
        let span = fold_primitive(&ConstantLiteral::String("1.02:03:04".into()), TypeCode::Timespan);
        assert_eq!(
            span,
            Some(Value::Timespan(
                chrono::TimeDelta::days(1)
                    + chrono::TimeDelta::hours(2)
                    + chrono::TimeDelta::minutes(3)
                    + chrono::TimeDelta::seconds(4)
            ))
        );
        let date = fold_primitive(
            &ConstantLiteral::String("2024-05-06T07:08:09".into()),
            TypeCode::DateTime,
        );
        assert!(matches!(date, Some(Value::DateTime(_))));
    }
}
