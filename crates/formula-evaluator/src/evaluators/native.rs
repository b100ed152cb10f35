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

//! Native operators over primitive values
//!
//! Operands are promoted with the usual arithmetic conversions of C-family
//! languages before the operation runs. Every function returns `None` when the
//! operand pair has no native operator, so callers can fall back to custom
//! operators before reporting an error.

use std::cmp::Ordering;

use chrono::{NaiveDateTime, TimeDelta};
use formula_engine_core::{BinaryOperation, TypeCode, UnaryOperation};
use formula_engine_model::Value;

/// Native operator table for primitive values
pub struct NativeOperators;

impl NativeOperators {
    /// Apply `operation` to two non-null operands
    ///
    /// Enum operands take part through their underlying integer.
    pub fn binary(operation: BinaryOperation, left: &Value, right: &Value) -> Option<Value> {
        let (left, right) = (left.visit(), right.visit());
        match (&left, &right) {
            (Value::Boolean(a), Value::Boolean(b)) => Self::boolean(operation, *a, *b),
            (Value::Boolean(_), _) | (_, Value::Boolean(_)) => None,
            (Value::Object(_), Value::Object(_)) => match operation {
                BinaryOperation::Equal => Some(Value::Boolean(left.same_object(&right))),
                BinaryOperation::NotEqual => Some(Value::Boolean(!left.same_object(&right))),
                _ => None,
            },
            (Value::Timespan(a), Value::Timespan(b)) => Self::timespan(operation, *a, *b),
            (Value::DateTime(a), Value::DateTime(b)) => Self::datetime(operation, *a, *b),
            (Value::DateTime(a), Value::Timespan(b)) => match operation.unchecked() {
                BinaryOperation::Add => a.checked_add_signed(*b).map(Value::DateTime),
                BinaryOperation::Subtract => a.checked_sub_signed(*b).map(Value::DateTime),
                _ => None,
            },
            _ => {
                let (lc, rc) = (left.type_code(), right.type_code());
                if lc.is_string_family() && rc.is_string_family() {
                    Self::string(operation, &left, &right)
                } else if (lc.is_floating() && rc.is_numeric()) || (rc.is_floating() && lc.is_numeric())
                {
                    Self::floating(operation, &left, &right)
                } else if lc.is_integral() && rc.is_integral() {
                    Self::integral(operation, &left, &right)
                } else {
                    None
                }
            }
        }
    }

    /// Apply `operation` to a non-null operand
    pub fn unary(operation: UnaryOperation, operand: &Value) -> Option<Value> {
        let operand = operand.visit();
        let code = operand.type_code();
        match (operation, &operand) {
            (UnaryOperation::Not, Value::Boolean(b)) => Some(Value::Boolean(!b)),
            (UnaryOperation::Not, _) => None,
            (UnaryOperation::UnaryPlus, Value::Float(_) | Value::Double(_) | Value::Timespan(_)) => {
                Some(operand.clone())
            }
            (UnaryOperation::Negate | UnaryOperation::NegateChecked, Value::Float(f)) => {
                Some(Value::Float(-f))
            }
            (UnaryOperation::Negate | UnaryOperation::NegateChecked, Value::Double(d)) => {
                Some(Value::Double(-d))
            }
            (UnaryOperation::Negate | UnaryOperation::NegateChecked, Value::Timespan(t)) => {
                Some(Value::Timespan(-*t))
            }
            _ if code.is_integral() => {
                let promoted = promote_integral(code, code);
                let value = integral_as(&operand, promoted)?;
                match operation {
                    UnaryOperation::UnaryPlus => Value::integral_wrapping(promoted, value),
                    UnaryOperation::Negate => Value::integral_wrapping(promoted, value.wrapping_neg()),
                    UnaryOperation::NegateChecked => Value::integral(promoted, -value),
                    UnaryOperation::Complement => Value::integral_wrapping(promoted, !value),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn boolean(operation: BinaryOperation, a: bool, b: bool) -> Option<Value> {
        let result = match operation {
            BinaryOperation::And => a & b,
            BinaryOperation::Or => a | b,
            BinaryOperation::ExclusiveOr => a ^ b,
            BinaryOperation::Equal => a == b,
            BinaryOperation::NotEqual => a != b,
            _ => return None,
        };
        Some(Value::Boolean(result))
    }

    fn integral(operation: BinaryOperation, left: &Value, right: &Value) -> Option<Value> {
        let (lc, rc) = (left.type_code(), right.type_code());

        if operation.is_shift() {
            let promoted = promote_integral(lc, lc);
            let value = integral_as(left, promoted)?;
            let count = (right.as_i128()? as u32) & (promoted.bit_width() - 1);
            let shifted = match operation {
                BinaryOperation::LeftShift => value << count,
                _ => value >> count,
            };
            return Value::integral_wrapping(promoted, shifted);
        }

        if lc.is_signed() != rc.is_signed() {
            if operation.is_relational() {
                return None;
            }
            // Mixed-signedness equality compares mathematical values.
            if matches!(operation, BinaryOperation::Equal | BinaryOperation::NotEqual) {
                return relational(operation, left.as_i128()?.cmp(&right.as_i128()?));
            }
        }

        let promoted = promote_integral(lc, rc);
        let a = integral_as(left, promoted)?;
        let b = integral_as(right, promoted)?;

        if let Some(ordering) = relational(operation, a.cmp(&b)) {
            return Some(ordering);
        }

        let checked = operation.is_checked();
        let result = match operation.unchecked() {
            BinaryOperation::Add => a.checked_add(b),
            BinaryOperation::Subtract => a.checked_sub(b),
            BinaryOperation::Multiply if checked => a.checked_mul(b),
            BinaryOperation::Multiply => Some(a.wrapping_mul(b)),
            BinaryOperation::Divide => a.checked_div(b),
            BinaryOperation::Modulo => a.checked_rem(b),
            BinaryOperation::And => Some(a & b),
            BinaryOperation::Or => Some(a | b),
            BinaryOperation::ExclusiveOr => Some(a ^ b),
            _ => None,
        }?;

        if checked {
            Value::integral(promoted, result)
        } else {
            Value::integral_wrapping(promoted, result)
        }
    }

    fn floating(operation: BinaryOperation, left: &Value, right: &Value) -> Option<Value> {
        let double = left.type_code() == TypeCode::Double || right.type_code() == TypeCode::Double;
        let (a, b) = if double {
            (left.as_f64()?, right.as_f64()?)
        } else {
            (
                f64::from(left.as_f64()? as f32),
                f64::from(right.as_f64()? as f32),
            )
        };

        if let Some(result) = partial_relational(operation, a.partial_cmp(&b)) {
            return Some(result);
        }

        let result = match operation.unchecked() {
            BinaryOperation::Add => a + b,
            BinaryOperation::Subtract => a - b,
            BinaryOperation::Multiply => a * b,
            BinaryOperation::Divide => a / b,
            BinaryOperation::Modulo => a % b,
            _ => return None,
        };
        Some(if double {
            Value::Double(result)
        } else {
            Value::Float(result as f32)
        })
    }

    fn string(operation: BinaryOperation, left: &Value, right: &Value) -> Option<Value> {
        let (a, b) = (left.as_str()?, right.as_str()?);
        match operation {
            BinaryOperation::Add | BinaryOperation::AddChecked => {
                Some(Value::string(format!("{a}{b}")))
            }
            BinaryOperation::Equal => Some(Value::Boolean(a == b)),
            BinaryOperation::NotEqual => Some(Value::Boolean(a != b)),
            op if op.is_relational()
                && left.type_code() == TypeCode::String
                && right.type_code() == TypeCode::String =>
            {
                relational(op, a.cmp(b))
            }
            _ => None,
        }
    }

    fn timespan(operation: BinaryOperation, a: TimeDelta, b: TimeDelta) -> Option<Value> {
        if let Some(result) = relational(operation, a.cmp(&b)) {
            return Some(result);
        }
        match operation.unchecked() {
            BinaryOperation::Add => a.checked_add(&b).map(Value::Timespan),
            BinaryOperation::Subtract => a.checked_sub(&b).map(Value::Timespan),
            _ => None,
        }
    }

    fn datetime(operation: BinaryOperation, a: NaiveDateTime, b: NaiveDateTime) -> Option<Value> {
        if let Some(result) = relational(operation, a.cmp(&b)) {
            return Some(result);
        }
        match operation.unchecked() {
            BinaryOperation::Subtract => Some(Value::Timespan(a.signed_duration_since(b))),
            _ => None,
        }
    }
}

/// Usual arithmetic conversion of two integral codes
pub(crate) fn promote_integral(left: TypeCode, right: TypeCode) -> TypeCode {
    let widen = |code: TypeCode| {
        if code.bit_width() < 32 {
            TypeCode::Int32
        } else {
            code
        }
    };
    let (left, right) = (widen(left), widen(right));

    if left.is_signed() == right.is_signed() {
        if left.bit_width() >= right.bit_width() {
            left
        } else {
            right
        }
    } else {
        let (unsigned, signed) = if left.is_unsigned() {
            (left, right)
        } else {
            (right, left)
        };
        if unsigned.bit_width() >= signed.bit_width() {
            unsigned
        } else {
            signed
        }
    }
}

/// Integral payload reinterpreted in the `code` type
fn integral_as(value: &Value, code: TypeCode) -> Option<i128> {
    Value::integral_wrapping(code, value.as_i128()?)?.as_i128()
}

fn relational(operation: BinaryOperation, ordering: Ordering) -> Option<Value> {
    partial_relational(operation, Some(ordering))
}

/// Comparison outcome; an unordered pair (NaN) compares false except for `!=`
fn partial_relational(operation: BinaryOperation, ordering: Option<Ordering>) -> Option<Value> {
    let result = match operation {
        BinaryOperation::Equal => ordering == Some(Ordering::Equal),
        BinaryOperation::NotEqual => ordering != Some(Ordering::Equal),
        BinaryOperation::GreaterThan => ordering == Some(Ordering::Greater),
        BinaryOperation::GreaterThanOrEqual => {
            matches!(ordering, Some(Ordering::Greater | Ordering::Equal))
        }
        BinaryOperation::LessThan => ordering == Some(Ordering::Less),
        BinaryOperation::LessThanOrEqual => {
            matches!(ordering, Some(Ordering::Less | Ordering::Equal))
        }
        _ => return None,
    };
    Some(Value::Boolean(result))
}
